use crate::domain::ledger::{LedgerEntry, OperationKind};
use crate::domain::ports::{BalanceUpdate, CommitOutcome, SharedWalletStore};
use crate::domain::wallet::{Amount, Balance, Version, WalletId};
use crate::error::{Result, WalletError};
use chrono::{DateTime, Utc};
use tracing::debug;

/// A committed balance change.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Mutation {
    pub balance: Balance,
    pub version: Version,
    /// Timestamp of the appended ledger entry.
    pub timestamp: DateTime<Utc>,
}

/// Result of a single read-modify-write attempt.
///
/// Losing the version race is an expected outcome, not an error, so it is a
/// case here rather than a [`WalletError`] variant.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum MutationOutcome {
    Applied(Mutation),
    /// Another writer committed between our read and our write.
    Conflict,
    /// No active wallet with that id.
    NotFound,
    /// A withdrawal exceeded `balance`. Nothing was written.
    InsufficientFunds { balance: Balance },
}

/// Applies one deposit or withdrawal to one wallet.
///
/// Every call reads a fresh snapshot, derives the new balance from it and
/// commits conditioned on the snapshot's version, together with the ledger
/// entry. It never retries; see [`PaymentService`](super::payment::PaymentService).
#[derive(Clone)]
pub struct BalanceEngine {
    wallets: SharedWalletStore,
}

impl BalanceEngine {
    pub fn new(wallets: SharedWalletStore) -> Self {
        Self { wallets }
    }

    pub async fn apply(
        &self,
        wallet_id: WalletId,
        kind: OperationKind,
        amount: Amount,
    ) -> Result<MutationOutcome> {
        let Some(wallet) = self.wallets.find_active(wallet_id).await? else {
            return Ok(MutationOutcome::NotFound);
        };

        let balance = match kind {
            OperationKind::Deposit => wallet.balance.checked_credit(amount).ok_or_else(|| {
                WalletError::ValidationError(format!(
                    "Deposit of {} would overflow balance of wallet {}",
                    amount, wallet_id
                ))
            })?,
            OperationKind::Withdraw => match wallet.balance.checked_debit(amount) {
                Some(balance) => balance,
                None => {
                    return Ok(MutationOutcome::InsufficientFunds {
                        balance: wallet.balance,
                    });
                }
            },
        };

        let update = BalanceUpdate {
            wallet_id,
            expected: wallet.version,
            balance,
        };
        let entry = LedgerEntry::new(wallet_id, kind, amount);

        match self.wallets.commit(update, entry).await? {
            CommitOutcome::Committed { version, timestamp } => {
                debug!(%wallet_id, %kind, %amount, %balance, %version, "balance changed");
                Ok(MutationOutcome::Applied(Mutation {
                    balance,
                    version,
                    timestamp,
                }))
            }
            CommitOutcome::Conflict => {
                debug!(%wallet_id, %kind, %amount, expected = %wallet.version, "version conflict");
                Ok(MutationOutcome::Conflict)
            }
        }
    }
}
