use super::csv::command_reader::{Command, CommandType};
use super::csv::wallet_writer::WalletRow;
use crate::application::payment::{PaymentService, TransactionRequest};
use crate::application::wallets::WalletService;
use crate::config::ProcessingConfig;
use crate::domain::ledger::OperationKind;
use crate::domain::ports::SharedWalletStore;
use crate::domain::wallet::{Amount, WalletId};
use crate::error::{Result, WalletError};
use std::collections::HashMap;
use tracing::info;

/// Executes script commands against the wallet services, resolving wallet
/// labels to ids along the way.
pub struct CommandRunner {
    store: SharedWalletStore,
    wallets: WalletService,
    payments: PaymentService,
    labels: HashMap<String, WalletId>,
}

impl CommandRunner {
    pub fn new(store: SharedWalletStore, config: ProcessingConfig) -> Self {
        Self {
            wallets: WalletService::new(store.clone()),
            payments: PaymentService::new(store.clone(), config),
            store,
            labels: HashMap::new(),
        }
    }

    pub async fn run(&mut self, command: Command) -> Result<()> {
        match command.r#type {
            CommandType::Create => {
                let label = command.wallet;
                if !label.is_empty() {
                    if label.parse::<WalletId>().is_ok() {
                        return Err(WalletError::ValidationError(format!(
                            "Wallet label must not be a UUID: {label}"
                        )));
                    }
                    if self.labels.contains_key(&label) {
                        return Err(WalletError::ValidationError(format!(
                            "Wallet label already in use: {label}"
                        )));
                    }
                }
                let wallet = self.wallets.create().await?;
                info!(wallet_id = %wallet.id, label = %label, "wallet created");
                if !label.is_empty() {
                    self.labels.insert(label, wallet.id);
                }
            }
            CommandType::Deposit | CommandType::Withdraw => {
                let kind = if command.r#type == CommandType::Deposit {
                    OperationKind::Deposit
                } else {
                    OperationKind::Withdraw
                };
                let amount = command.amount.ok_or_else(|| {
                    WalletError::ValidationError(format!("{kind} requires an amount"))
                })?;
                let request = TransactionRequest {
                    wallet_id: self.resolve(&command.wallet)?,
                    kind,
                    amount: Amount::new(amount)?,
                };
                let receipt = self.payments.process_transaction(&request).await?;
                info!(
                    wallet_id = %receipt.wallet_id,
                    %kind,
                    amount = %receipt.amount,
                    balance = %receipt.balance,
                    attempts = receipt.attempts,
                    "transaction processed"
                );
            }
            CommandType::Balance => {
                let receipt = self.wallets.get_balance(self.resolve(&command.wallet)?).await?;
                info!(wallet_id = %receipt.wallet_id, balance = %receipt.balance, "balance");
            }
            CommandType::Delete => {
                self.wallets.soft_delete(self.resolve(&command.wallet)?).await?;
            }
        }
        Ok(())
    }

    fn resolve(&self, reference: &str) -> Result<WalletId> {
        if let Ok(id) = reference.parse::<WalletId>() {
            return Ok(id);
        }
        self.labels.get(reference).copied().ok_or_else(|| {
            WalletError::ValidationError(format!("Unknown wallet reference: '{reference}'"))
        })
    }

    /// Current state of every stored wallet, oldest first.
    pub async fn report(&self) -> Result<Vec<WalletRow>> {
        let names: HashMap<WalletId, &str> = self
            .labels
            .iter()
            .map(|(label, id)| (*id, label.as_str()))
            .collect();
        Ok(self
            .store
            .all()
            .await?
            .iter()
            .map(|wallet| WalletRow::new(wallet, names.get(&wallet.id).copied()))
            .collect())
    }
}
