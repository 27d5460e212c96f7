use super::wallet::{Amount, WalletId};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use uuid::Uuid;

#[derive(Debug, Serialize, Deserialize, PartialEq, Eq, Hash, Clone, Copy)]
#[serde(rename_all = "UPPERCASE")]
pub enum OperationKind {
    Deposit,
    Withdraw,
}

impl fmt::Display for OperationKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            OperationKind::Deposit => f.write_str("DEPOSIT"),
            OperationKind::Withdraw => f.write_str("WITHDRAW"),
        }
    }
}

/// Immutable record of one committed balance mutation.
///
/// Entries are only ever appended together with the wallet update they
/// describe; nothing edits or removes them afterwards.
#[derive(Debug, Serialize, Deserialize, PartialEq, Clone)]
pub struct LedgerEntry {
    id: Uuid,
    wallet_id: WalletId,
    kind: OperationKind,
    amount: Amount,
    created_at: DateTime<Utc>,
}

impl LedgerEntry {
    pub fn new(wallet_id: WalletId, kind: OperationKind, amount: Amount) -> Self {
        Self {
            id: Uuid::new_v4(),
            wallet_id,
            kind,
            amount,
            created_at: Utc::now(),
        }
    }

    /// Sets the append time. Stores call this while holding their commit
    /// guard, so timestamps follow commit order.
    pub(crate) fn stamped(mut self, at: DateTime<Utc>) -> Self {
        self.created_at = at;
        self
    }

    pub fn id(&self) -> Uuid {
        self.id
    }

    pub fn wallet_id(&self) -> WalletId {
        self.wallet_id
    }

    pub fn kind(&self) -> OperationKind {
        self.kind
    }

    pub fn amount(&self) -> Amount {
        self.amount
    }

    pub fn created_at(&self) -> DateTime<Utc> {
        self.created_at
    }
}
