use crate::domain::wallet::Wallet;
use crate::error::Result;
use serde::Serialize;
use std::io::Write;

/// Final state of one wallet as printed by the CLI.
#[derive(Debug, Serialize, PartialEq, Clone)]
pub struct WalletRow {
    pub wallet: String,
    pub label: String,
    pub balance: String,
    pub version: u64,
    pub active: bool,
}

impl WalletRow {
    pub fn new(wallet: &Wallet, label: Option<&str>) -> Self {
        Self {
            wallet: wallet.id.to_string(),
            label: label.unwrap_or_default().to_string(),
            balance: wallet.balance.to_string(),
            version: wallet.version.value(),
            active: wallet.active,
        }
    }
}

/// Writes wallet state as CSV to any `Write` sink.
pub struct WalletWriter<W: Write> {
    writer: csv::Writer<W>,
}

impl<W: Write> WalletWriter<W> {
    pub fn new(sink: W) -> Self {
        Self {
            writer: csv::Writer::from_writer(sink),
        }
    }

    pub fn write_wallets(&mut self, rows: impl IntoIterator<Item = WalletRow>) -> Result<()> {
        for row in rows {
            self.writer.serialize(row)?;
        }
        self.writer.flush()?;
        Ok(())
    }
}
