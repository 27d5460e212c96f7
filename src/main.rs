use clap::Parser;
use miette::{IntoDiagnostic, Result};
use std::fs::File;
use std::io::{self, IsTerminal};
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tracing::warn;
use tracing_subscriber::EnvFilter;
use wallet_ledger::config::ProcessingConfig;
use wallet_ledger::domain::ports::SharedWalletStore;
use wallet_ledger::infrastructure::in_memory::InMemoryStore;
use wallet_ledger::interfaces::csv::command_reader::CommandReader;
use wallet_ledger::interfaces::csv::wallet_writer::WalletWriter;
use wallet_ledger::interfaces::runner::CommandRunner;

#[derive(Parser)]
#[command(author, version, about, long_about = None)]
struct Cli {
    /// Input commands CSV file
    input: PathBuf,

    /// Path to persistent database (optional). If provided, uses RocksDB.
    #[arg(long)]
    db_path: Option<PathBuf>,

    #[command(flatten)]
    processing: ProcessingConfig,
}

#[cfg(feature = "storage-rocksdb")]
fn open_store(db_path: Option<&Path>) -> wallet_ledger::error::Result<SharedWalletStore> {
    use wallet_ledger::infrastructure::rocksdb::RocksDBStore;

    match db_path {
        Some(path) => Ok(Arc::new(RocksDBStore::open(path)?)),
        None => Ok(Arc::new(InMemoryStore::new())),
    }
}

#[cfg(not(feature = "storage-rocksdb"))]
fn open_store(db_path: Option<&Path>) -> wallet_ledger::error::Result<SharedWalletStore> {
    if db_path.is_some() {
        warn!(
            "Persistent storage requested via --db-path, but 'storage-rocksdb' feature is not enabled. Falling back to in-memory storage."
        );
    }
    Ok(Arc::new(InMemoryStore::new()))
}

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| "wallet_ledger=info".into()),
        )
        .with_writer(io::stderr)
        .with_ansi(io::stderr().is_terminal())
        .init();

    let cli = Cli::parse();

    let store = open_store(cli.db_path.as_deref()).into_diagnostic()?;
    let mut runner = CommandRunner::new(store, cli.processing);

    let file = File::open(&cli.input).into_diagnostic()?;
    let reader = CommandReader::new(file);
    for (index, result) in reader.commands().enumerate() {
        let row = index + 1;
        match result {
            Ok(command) => {
                if let Err(e) = runner.run(command).await {
                    warn!(row, error = %e, "Error processing command");
                }
            }
            Err(e) => {
                warn!(row, error = %e, "Error reading command");
            }
        }
    }

    let rows = runner.report().await.into_diagnostic()?;
    let stdout = io::stdout();
    let mut writer = WalletWriter::new(stdout.lock());
    writer.write_wallets(rows).into_diagnostic()?;

    Ok(())
}
