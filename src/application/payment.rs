use super::engine::{BalanceEngine, MutationOutcome};
use crate::config::ProcessingConfig;
use crate::domain::ledger::OperationKind;
use crate::domain::ports::SharedWalletStore;
use crate::domain::wallet::{Amount, Balance, WalletId};
use crate::error::{Result, WalletError};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tokio::sync::watch;
use tracing::{debug, warn};

/// A deposit or withdrawal against one wallet. Inputs are already validated
/// by construction of [`Amount`] and [`OperationKind`].
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct TransactionRequest {
    pub wallet_id: WalletId,
    pub kind: OperationKind,
    pub amount: Amount,
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct TransactionReceipt {
    pub wallet_id: WalletId,
    pub kind: OperationKind,
    pub amount: Amount,
    pub balance: Balance,
    pub timestamp: DateTime<Utc>,
    /// Engine calls made, including the successful one.
    pub attempts: u32,
}

/// Processes deposits and withdrawals, re-attempting when an optimistic
/// version check is lost.
///
/// Holds no per-call state: each call counts its own retries, so concurrent
/// calls never share a budget. The retry limit is read from the settings
/// channel at the start of every call.
#[derive(Clone)]
pub struct PaymentService {
    engine: BalanceEngine,
    settings: watch::Receiver<ProcessingConfig>,
}

impl PaymentService {
    pub fn new(wallets: SharedWalletStore, config: ProcessingConfig) -> Self {
        let (_tx, settings) = watch::channel(config);
        Self::with_settings(wallets, settings)
    }

    /// Builds a service that follows a live settings channel.
    pub fn with_settings(
        wallets: SharedWalletStore,
        settings: watch::Receiver<ProcessingConfig>,
    ) -> Self {
        Self {
            engine: BalanceEngine::new(wallets),
            settings,
        }
    }

    pub async fn process_transaction(
        &self,
        request: &TransactionRequest,
    ) -> Result<TransactionReceipt> {
        let max_retries = self.settings.borrow().max_retries;
        self.process(request.wallet_id, request.kind, request.amount, max_retries)
            .await
    }

    pub async fn process(
        &self,
        wallet_id: WalletId,
        kind: OperationKind,
        amount: Amount,
        max_retries: u32,
    ) -> Result<TransactionReceipt> {
        debug!(%wallet_id, %kind, %amount, "transaction processing started");
        let mut retries: u32 = 0;
        loop {
            debug!(%wallet_id, %kind, %amount, attempt = retries, "transaction processing try");
            match self.engine.apply(wallet_id, kind, amount).await? {
                MutationOutcome::Applied(mutation) => {
                    debug!(%wallet_id, %kind, %amount, balance = %mutation.balance, "transaction processing finished");
                    return Ok(TransactionReceipt {
                        wallet_id,
                        kind,
                        amount,
                        balance: mutation.balance,
                        timestamp: mutation.timestamp,
                        attempts: retries + 1,
                    });
                }
                MutationOutcome::NotFound => {
                    warn!(%wallet_id, %kind, %amount, "transaction failed: wallet not found");
                    return Err(WalletError::WalletNotFound { wallet_id });
                }
                MutationOutcome::InsufficientFunds { balance } => {
                    warn!(%wallet_id, %kind, %amount, %balance, "transaction failed: insufficient funds");
                    return Err(WalletError::InsufficientFunds {
                        wallet_id,
                        kind,
                        amount,
                        balance,
                    });
                }
                MutationOutcome::Conflict => {
                    retries += 1;
                    if retries > max_retries {
                        warn!(%wallet_id, %kind, %amount, max_retries, "transaction failed: too many retries");
                        return Err(WalletError::RetryExhausted {
                            wallet_id,
                            kind,
                            amount,
                            attempts: retries,
                        });
                    }
                }
            }
        }
    }
}
