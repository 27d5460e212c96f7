use crate::domain::ledger::LedgerEntry;
use crate::domain::ports::{BalanceUpdate, CommitOutcome, LedgerStore, WalletStore};
use crate::domain::wallet::{Version, Wallet, WalletId};
use crate::error::{Result, WalletError};
use async_trait::async_trait;
use chrono::Utc;
use rocksdb::{ColumnFamily, ColumnFamilyDescriptor, DB, Direction, IteratorMode, Options, WriteBatch};
use serde::Serialize;
use serde::de::DeserializeOwned;
use std::path::Path;
use std::sync::Arc;
use tokio::sync::Mutex;

/// Column Family for storing wallet records.
pub const CF_WALLETS: &str = "wallets";
/// Column Family for the append-only ledger.
pub const CF_LEDGER: &str = "ledger";

/// A persistent store implementation using RocksDB.
///
/// Wallets are keyed by their UUID bytes. Ledger entries are keyed by the
/// wallet UUID followed by the big-endian wallet version the entry produced,
/// so one wallet's history is a contiguous key range in commit order.
///
/// RocksDB has no conditional put, so read-check-write sequences (commit and
/// deactivate) run under `write_latch` and land as a single `WriteBatch`.
/// Clones share the underlying `Arc<DB>` and latch.
#[derive(Clone)]
pub struct RocksDBStore {
    db: Arc<DB>,
    write_latch: Arc<Mutex<()>>,
}

fn internal(message: String) -> WalletError {
    WalletError::InternalError(Box::new(std::io::Error::other(message)))
}

fn encode<T: Serialize>(value: &T) -> Result<Vec<u8>> {
    serde_json::to_vec(value).map_err(|e| internal(format!("Serialization error: {}", e)))
}

fn decode<T: DeserializeOwned>(bytes: &[u8]) -> Result<T> {
    serde_json::from_slice(bytes).map_err(|e| internal(format!("Deserialization error: {}", e)))
}

fn ledger_key(wallet_id: WalletId, version: Version) -> Vec<u8> {
    let mut key = wallet_id.as_bytes().to_vec();
    key.extend_from_slice(&version.value().to_be_bytes());
    key
}

impl RocksDBStore {
    /// Opens or creates a RocksDB instance at the specified path.
    ///
    /// Ensures that the required column families ("wallets" and "ledger") exist.
    pub fn open<P: AsRef<Path>>(path: P) -> Result<Self> {
        let mut opts = Options::default();
        opts.create_if_missing(true);
        opts.create_missing_column_families(true);

        let cf_wallets = ColumnFamilyDescriptor::new(CF_WALLETS, Options::default());
        let cf_ledger = ColumnFamilyDescriptor::new(CF_LEDGER, Options::default());

        let db = DB::open_cf_descriptors(&opts, path, vec![cf_wallets, cf_ledger])?;

        Ok(Self {
            db: Arc::new(db),
            write_latch: Arc::new(Mutex::new(())),
        })
    }

    fn cf(&self, name: &str) -> Result<&ColumnFamily> {
        self.db
            .cf_handle(name)
            .ok_or_else(|| internal(format!("Column family not found: {}", name)))
    }

    fn load(&self, id: WalletId) -> Result<Option<Wallet>> {
        let cf = self.cf(CF_WALLETS)?;
        match self.db.get_cf(cf, id.as_bytes())? {
            Some(bytes) => Ok(Some(decode(&bytes)?)),
            None => Ok(None),
        }
    }
}

#[async_trait]
impl WalletStore for RocksDBStore {
    async fn insert(&self, wallet: Wallet) -> Result<()> {
        let _guard = self.write_latch.lock().await;
        if self.load(wallet.id)?.is_some() {
            return Err(WalletError::ValidationError(format!(
                "Wallet already exists: {}",
                wallet.id
            )));
        }
        let cf = self.cf(CF_WALLETS)?;
        self.db.put_cf(cf, wallet.id.as_bytes(), encode(&wallet)?)?;
        Ok(())
    }

    async fn find_active(&self, id: WalletId) -> Result<Option<Wallet>> {
        Ok(self.load(id)?.filter(|w| w.active))
    }

    async fn deactivate(&self, id: WalletId) -> Result<bool> {
        let _guard = self.write_latch.lock().await;
        let Some(mut wallet) = self.load(id)?.filter(|w| w.active) else {
            return Ok(false);
        };
        wallet.active = false;
        wallet.version = wallet.version.next();

        let cf = self.cf(CF_WALLETS)?;
        self.db.put_cf(cf, id.as_bytes(), encode(&wallet)?)?;
        Ok(true)
    }

    async fn commit(&self, update: BalanceUpdate, entry: LedgerEntry) -> Result<CommitOutcome> {
        let _guard = self.write_latch.lock().await;
        let Some(mut wallet) = self
            .load(update.wallet_id)?
            .filter(|w| w.active && w.version == update.expected)
        else {
            return Ok(CommitOutcome::Conflict);
        };
        wallet.balance = update.balance;
        wallet.version = wallet.version.next();

        let entry = entry.stamped(Utc::now());
        let timestamp = entry.created_at();

        let mut batch = WriteBatch::default();
        batch.put_cf(self.cf(CF_WALLETS)?, wallet.id.as_bytes(), encode(&wallet)?);
        batch.put_cf(
            self.cf(CF_LEDGER)?,
            ledger_key(wallet.id, wallet.version),
            encode(&entry)?,
        );
        self.db.write(batch)?;

        Ok(CommitOutcome::Committed {
            version: wallet.version,
            timestamp,
        })
    }

    async fn all(&self) -> Result<Vec<Wallet>> {
        let cf = self.cf(CF_WALLETS)?;
        let mut wallets = Vec::new();
        for item in self.db.iterator_cf(cf, IteratorMode::Start) {
            let (_key, value) =
                item.map_err(|e| internal(format!("RocksDB iteration error: {}", e)))?;
            wallets.push(decode::<Wallet>(&value)?);
        }
        wallets.sort_by_key(|w| w.created_at);
        Ok(wallets)
    }
}

#[async_trait]
impl LedgerStore for RocksDBStore {
    async fn entries(&self, wallet_id: WalletId) -> Result<Vec<LedgerEntry>> {
        let cf = self.cf(CF_LEDGER)?;
        let prefix: &[u8] = wallet_id.as_bytes();
        let mut entries = Vec::new();
        for item in self
            .db
            .iterator_cf(cf, IteratorMode::From(prefix, Direction::Forward))
        {
            let (key, value) =
                item.map_err(|e| internal(format!("RocksDB iteration error: {}", e)))?;
            if !key.starts_with(prefix) {
                break;
            }
            entries.push(decode::<LedgerEntry>(&value)?);
        }
        Ok(entries)
    }
}
