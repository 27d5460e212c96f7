use crate::domain::ledger::OperationKind;
use crate::domain::wallet::{Amount, Balance, WalletId};
use thiserror::Error;

#[derive(Error, Debug)]
pub enum WalletError {
    #[error("Wallet not found for id: {wallet_id}")]
    WalletNotFound { wallet_id: WalletId },
    #[error(
        "Insufficient funds for wallet with id: {wallet_id}. Transaction amount: {amount}. Transaction type: {kind}. Balance: {balance}"
    )]
    InsufficientFunds {
        wallet_id: WalletId,
        kind: OperationKind,
        amount: Amount,
        balance: Balance,
    },
    #[error(
        "Too many retries, failed to process transaction after {attempts} attempts. Wallet id: {wallet_id}, operation type: {kind}, amount: {amount}"
    )]
    RetryExhausted {
        wallet_id: WalletId,
        kind: OperationKind,
        amount: Amount,
        attempts: u32,
    },
    #[error("Validation error: {0}")]
    ValidationError(String),
    #[error("CSV error: {0}")]
    CsvError(#[from] csv::Error),
    #[error("IO error: {0}")]
    IoError(#[from] std::io::Error),
    #[cfg(feature = "storage-rocksdb")]
    #[error("RocksDB error: {0}")]
    RocksDBError(#[from] rocksdb::Error),
    #[error("Internal error: {0}")]
    InternalError(Box<dyn std::error::Error + Send + Sync>),
}

pub type Result<T> = std::result::Result<T, WalletError>;
