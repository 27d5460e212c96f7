use crate::domain::ports::SharedWalletStore;
use crate::domain::wallet::{Balance, Wallet, WalletId};
use crate::error::{Result, WalletError};
use chrono::{DateTime, Utc};
use serde::Serialize;
use tracing::debug;

#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct BalanceReceipt {
    pub wallet_id: WalletId,
    pub balance: Balance,
    pub timestamp: DateTime<Utc>,
}

/// Wallet creation, balance reads and soft deletion. Each operation is a
/// single store round-trip with no retry.
#[derive(Clone)]
pub struct WalletService {
    wallets: SharedWalletStore,
}

impl WalletService {
    pub fn new(wallets: SharedWalletStore) -> Self {
        Self { wallets }
    }

    /// Creates an active wallet with a zero balance.
    pub async fn create(&self) -> Result<Wallet> {
        let wallet = Wallet::new();
        self.wallets.insert(wallet.clone()).await?;
        debug!(wallet_id = %wallet.id, "wallet created");
        Ok(wallet)
    }

    pub async fn get_balance(&self, wallet_id: WalletId) -> Result<BalanceReceipt> {
        debug!(%wallet_id, "get wallet balance");
        let wallet = self
            .wallets
            .find_active(wallet_id)
            .await?
            .ok_or(WalletError::WalletNotFound { wallet_id })?;
        Ok(BalanceReceipt {
            wallet_id,
            balance: wallet.balance,
            timestamp: Utc::now(),
        })
    }

    /// Marks the wallet inactive. A missing or already inactive wallet is a
    /// no-op, not an error. Ledger history is left untouched.
    pub async fn soft_delete(&self, wallet_id: WalletId) -> Result<()> {
        if self.wallets.deactivate(wallet_id).await? {
            debug!(%wallet_id, "wallet deactivated");
        } else {
            debug!(%wallet_id, "soft delete skipped: no active wallet");
        }
        Ok(())
    }
}
