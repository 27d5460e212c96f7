#![allow(dead_code)]

use async_trait::async_trait;
use std::fs::File;
use std::io::Error;
use std::path::Path;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use tokio::sync::Barrier;
use wallet_ledger::domain::ledger::{LedgerEntry, OperationKind};
use wallet_ledger::domain::ports::{BalanceUpdate, CommitOutcome, LedgerStore, WalletStore};
use wallet_ledger::domain::wallet::{Amount, Balance, Version, Wallet, WalletId};
use wallet_ledger::error::Result;
use wallet_ledger::infrastructure::in_memory::InMemoryStore;

/// Holds the first `parties` reads at a barrier until all of them have taken
/// their snapshot, so their commits are guaranteed to race.
pub struct LockstepStore {
    pub inner: InMemoryStore,
    barrier: Barrier,
    parties: usize,
    reads: AtomicUsize,
    pub conflicts: AtomicUsize,
}

impl LockstepStore {
    pub fn new(inner: InMemoryStore, parties: usize) -> Self {
        Self {
            inner,
            barrier: Barrier::new(parties),
            parties,
            reads: AtomicUsize::new(0),
            conflicts: AtomicUsize::new(0),
        }
    }
}

#[async_trait]
impl WalletStore for LockstepStore {
    async fn insert(&self, wallet: Wallet) -> Result<()> {
        self.inner.insert(wallet).await
    }

    async fn find_active(&self, id: WalletId) -> Result<Option<Wallet>> {
        let n = self.reads.fetch_add(1, Ordering::SeqCst);
        let wallet = self.inner.find_active(id).await?;
        if n < self.parties {
            self.barrier.wait().await;
        }
        Ok(wallet)
    }

    async fn deactivate(&self, id: WalletId) -> Result<bool> {
        self.inner.deactivate(id).await
    }

    async fn commit(&self, update: BalanceUpdate, entry: LedgerEntry) -> Result<CommitOutcome> {
        let outcome = self.inner.commit(update, entry).await?;
        if outcome == CommitOutcome::Conflict {
            self.conflicts.fetch_add(1, Ordering::SeqCst);
        }
        Ok(outcome)
    }

    async fn all(&self) -> Result<Vec<Wallet>> {
        self.inner.all().await
    }
}

/// What the rival writer does right before the first commit goes through.
#[derive(Clone, Copy)]
pub enum Rival {
    Deposit(Amount),
    Deactivate,
}

/// Lets a rival writer win the race against the first commit it sees.
pub struct RacingStore {
    pub inner: InMemoryStore,
    rival: Rival,
    raced: AtomicBool,
    pub reads: AtomicUsize,
}

impl RacingStore {
    pub fn new(inner: InMemoryStore, rival: Rival) -> Self {
        Self {
            inner,
            rival,
            raced: AtomicBool::new(false),
            reads: AtomicUsize::new(0),
        }
    }
}

#[async_trait]
impl WalletStore for RacingStore {
    async fn insert(&self, wallet: Wallet) -> Result<()> {
        self.inner.insert(wallet).await
    }

    async fn find_active(&self, id: WalletId) -> Result<Option<Wallet>> {
        self.reads.fetch_add(1, Ordering::SeqCst);
        self.inner.find_active(id).await
    }

    async fn deactivate(&self, id: WalletId) -> Result<bool> {
        self.inner.deactivate(id).await
    }

    async fn commit(&self, update: BalanceUpdate, entry: LedgerEntry) -> Result<CommitOutcome> {
        if !self.raced.swap(true, Ordering::SeqCst) {
            let current = self
                .inner
                .find_active(update.wallet_id)
                .await?
                .expect("rival needs an active wallet");
            match self.rival {
                Rival::Deposit(amount) => {
                    let winner = BalanceUpdate {
                        wallet_id: current.id,
                        expected: current.version,
                        balance: current.balance.checked_credit(amount).unwrap(),
                    };
                    let entry = LedgerEntry::new(current.id, OperationKind::Deposit, amount);
                    let outcome = self.inner.commit(winner, entry).await?;
                    assert!(matches!(outcome, CommitOutcome::Committed { .. }));
                }
                Rival::Deactivate => {
                    assert!(self.inner.deactivate(current.id).await?);
                }
            }
        }
        self.inner.commit(update, entry).await
    }

    async fn all(&self) -> Result<Vec<Wallet>> {
        self.inner.all().await
    }
}

pub async fn funded_wallet(store: &dyn WalletStore, amount: rust_decimal::Decimal) -> WalletId {
    let wallet = Wallet::new();
    let id = wallet.id;
    store.insert(wallet).await.unwrap();
    if amount > rust_decimal::Decimal::ZERO {
        let update = BalanceUpdate {
            wallet_id: id,
            expected: Version::INITIAL,
            balance: Balance::new(amount).unwrap(),
        };
        let entry = LedgerEntry::new(id, OperationKind::Deposit, Amount::new(amount).unwrap());
        store.commit(update, entry).await.unwrap();
    }
    id
}

pub async fn ledger_len(store: &dyn LedgerStore, id: WalletId) -> usize {
    store.entries(id).await.unwrap().len()
}

/// Writes a script that creates `wallets` labelled wallets and spreads
/// `rows` deposits of 1.00 across them round-robin.
pub fn generate_commands(path: &Path, wallets: usize, rows: usize) -> std::result::Result<(), Error> {
    let file = File::create(path)?;
    let mut wtr = csv::WriterBuilder::new().from_writer(file);

    wtr.write_record(["type", "wallet", "amount"])?;
    for w in 0..wallets {
        wtr.write_record(["create", &format!("w{w}"), ""])?;
    }
    for i in 0..rows {
        wtr.write_record(["deposit", &format!("w{}", i % wallets), "1.00"])?;
    }

    wtr.flush()?;
    Ok(())
}
