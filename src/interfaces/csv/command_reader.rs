use crate::error::{Result, WalletError};
use rust_decimal::Decimal;
use serde::Deserialize;
use std::io::Read;

#[derive(Debug, Deserialize, PartialEq, Clone, Copy)]
#[serde(rename_all = "lowercase")]
pub enum CommandType {
    Create,
    Deposit,
    Withdraw,
    Balance,
    Delete,
}

/// One row of a command script.
///
/// `wallet` is either a wallet UUID or a label bound by an earlier `create`
/// row; for `create` it is the optional label to bind.
#[derive(Debug, Deserialize, PartialEq, Clone)]
pub struct Command {
    pub r#type: CommandType,
    #[serde(default)]
    pub wallet: String,
    pub amount: Option<Decimal>,
}

/// Reads commands from a CSV source.
pub struct CommandReader<R: Read> {
    reader: csv::Reader<R>,
}

impl<R: Read> CommandReader<R> {
    /// Creates a new `CommandReader` from any `Read` source (e.g., File, Stdin).
    pub fn new(source: R) -> Self {
        let reader = csv::ReaderBuilder::new()
            .trim(csv::Trim::All)
            .flexible(true)
            .from_reader(source);
        Self { reader }
    }

    /// Returns an iterator that lazily reads and deserializes commands.
    pub fn commands(self) -> impl Iterator<Item = Result<Command>> {
        self.reader
            .into_deserialize()
            .map(|result| result.map_err(WalletError::from))
    }
}
