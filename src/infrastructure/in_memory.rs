use crate::domain::ledger::LedgerEntry;
use crate::domain::ports::{BalanceUpdate, CommitOutcome, LedgerStore, WalletStore};
use crate::domain::wallet::{Wallet, WalletId};
use crate::error::{Result, WalletError};
use async_trait::async_trait;
use chrono::Utc;
use std::collections::HashMap;
use std::sync::Arc;
use tokio::sync::RwLock;

#[derive(Default)]
struct State {
    wallets: HashMap<WalletId, Wallet>,
    ledger: HashMap<WalletId, Vec<LedgerEntry>>,
}

/// A thread-safe in-memory store for wallets and their ledger.
///
/// Both maps sit behind one `RwLock`, so a commit's version check, wallet
/// update and ledger append happen under a single write guard.
/// Clones share the same state.
#[derive(Default, Clone)]
pub struct InMemoryStore {
    state: Arc<RwLock<State>>,
}

impl InMemoryStore {
    /// Creates a new, empty in-memory store.
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl WalletStore for InMemoryStore {
    async fn insert(&self, wallet: Wallet) -> Result<()> {
        let mut state = self.state.write().await;
        if state.wallets.contains_key(&wallet.id) {
            return Err(WalletError::ValidationError(format!(
                "Wallet already exists: {}",
                wallet.id
            )));
        }
        state.wallets.insert(wallet.id, wallet);
        Ok(())
    }

    async fn find_active(&self, id: WalletId) -> Result<Option<Wallet>> {
        let state = self.state.read().await;
        Ok(state.wallets.get(&id).filter(|w| w.active).cloned())
    }

    async fn deactivate(&self, id: WalletId) -> Result<bool> {
        let mut state = self.state.write().await;
        match state.wallets.get_mut(&id) {
            Some(wallet) if wallet.active => {
                wallet.active = false;
                wallet.version = wallet.version.next();
                Ok(true)
            }
            _ => Ok(false),
        }
    }

    async fn commit(&self, update: BalanceUpdate, entry: LedgerEntry) -> Result<CommitOutcome> {
        let mut state = self.state.write().await;
        let version = match state.wallets.get_mut(&update.wallet_id) {
            Some(wallet) if wallet.active && wallet.version == update.expected => {
                wallet.balance = update.balance;
                wallet.version = wallet.version.next();
                wallet.version
            }
            _ => return Ok(CommitOutcome::Conflict),
        };
        let entry = entry.stamped(Utc::now());
        let timestamp = entry.created_at();
        state
            .ledger
            .entry(update.wallet_id)
            .or_default()
            .push(entry);
        Ok(CommitOutcome::Committed { version, timestamp })
    }

    async fn all(&self) -> Result<Vec<Wallet>> {
        let state = self.state.read().await;
        let mut wallets: Vec<Wallet> = state.wallets.values().cloned().collect();
        wallets.sort_by_key(|w| w.created_at);
        Ok(wallets)
    }
}

#[async_trait]
impl LedgerStore for InMemoryStore {
    async fn entries(&self, wallet_id: WalletId) -> Result<Vec<LedgerEntry>> {
        let state = self.state.read().await;
        Ok(state.ledger.get(&wallet_id).cloned().unwrap_or_default())
    }
}
