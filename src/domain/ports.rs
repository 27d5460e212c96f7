use super::ledger::LedgerEntry;
use super::wallet::{Balance, Version, Wallet, WalletId};
use chrono::{DateTime, Utc};
use crate::error::Result;
use async_trait::async_trait;
use std::sync::Arc;

/// A balance change conditioned on the version the caller read.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct BalanceUpdate {
    pub wallet_id: WalletId,
    pub expected: Version,
    pub balance: Balance,
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub enum CommitOutcome {
    /// Wallet updated and ledger entry appended; carries the stored version
    /// and the time the entry was appended.
    Committed {
        version: Version,
        timestamp: DateTime<Utc>,
    },
    /// The stored wallet is no longer active at `expected`. Nothing was written.
    Conflict,
}

#[async_trait]
pub trait WalletStore: Send + Sync {
    async fn insert(&self, wallet: Wallet) -> Result<()>;
    /// Point lookup restricted to active wallets.
    async fn find_active(&self, id: WalletId) -> Result<Option<Wallet>>;
    /// Flips an active wallet to inactive and advances its version.
    /// Returns `false` if there was no active wallet with that id.
    async fn deactivate(&self, id: WalletId) -> Result<bool>;
    /// Compare-and-set of the balance plus the ledger append, as one unit.
    /// The entry's timestamp is set at append time.
    async fn commit(&self, update: BalanceUpdate, entry: LedgerEntry) -> Result<CommitOutcome>;
    /// Every stored wallet, active or not, oldest first.
    async fn all(&self) -> Result<Vec<Wallet>>;
}

#[async_trait]
pub trait LedgerStore: Send + Sync {
    /// Entries recorded for `wallet_id`, in append order.
    async fn entries(&self, wallet_id: WalletId) -> Result<Vec<LedgerEntry>>;
}

pub type SharedWalletStore = Arc<dyn WalletStore>;
pub type SharedLedgerStore = Arc<dyn LedgerStore>;
