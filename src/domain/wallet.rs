use crate::error::WalletError;
use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use uuid::Uuid;

/// Number of fractional digits every monetary value is kept at.
pub const SCALE: u32 = 2;

fn at_scale(mut value: Decimal) -> Decimal {
    value.rescale(SCALE);
    value
}

/// Unique, immutable identifier of a wallet.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct WalletId(Uuid);

impl WalletId {
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }

    pub fn as_bytes(&self) -> &[u8; 16] {
        self.0.as_bytes()
    }
}

impl Default for WalletId {
    fn default() -> Self {
        Self::new()
    }
}

impl From<Uuid> for WalletId {
    fn from(value: Uuid) -> Self {
        Self(value)
    }
}

impl FromStr for WalletId {
    type Err = WalletError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Uuid::parse_str(s)
            .map(Self)
            .map_err(|_| WalletError::ValidationError(format!("Invalid UUID format: {s}")))
    }
}

impl fmt::Display for WalletId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.0.fmt(f)
    }
}

/// A non-negative monetary value held by a wallet, kept at two decimal places.
///
/// The only ways to obtain a different `Balance` from an existing one are
/// [`Balance::checked_credit`] and [`Balance::checked_debit`], neither of which
/// can produce a negative value.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(try_from = "Decimal")]
pub struct Balance(Decimal);

impl Balance {
    pub const ZERO: Self = Self(Decimal::ZERO);

    pub fn new(value: Decimal) -> Result<Self, WalletError> {
        if value < Decimal::ZERO {
            return Err(WalletError::ValidationError(
                "Balance must not be negative".to_string(),
            ));
        }
        Ok(Self(at_scale(value)))
    }

    pub fn value(&self) -> Decimal {
        self.0
    }

    /// Returns the balance after adding `amount`, or `None` on overflow.
    pub fn checked_credit(self, amount: Amount) -> Option<Self> {
        self.0.checked_add(amount.0).map(|v| Self(at_scale(v)))
    }

    /// Returns the balance after removing `amount`, or `None` if funds are insufficient.
    pub fn checked_debit(self, amount: Amount) -> Option<Self> {
        if self.0 < amount.0 {
            return None;
        }
        self.0.checked_sub(amount.0).map(|v| Self(at_scale(v)))
    }
}

impl TryFrom<Decimal> for Balance {
    type Error = WalletError;

    fn try_from(value: Decimal) -> Result<Self, Self::Error> {
        Self::new(value)
    }
}

impl Default for Balance {
    fn default() -> Self {
        Self::ZERO
    }
}

impl fmt::Display for Balance {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", at_scale(self.0))
    }
}

/// Represents a positive monetary amount for deposits and withdrawals.
///
/// At most two significant fractional digits are accepted.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(try_from = "Decimal")]
pub struct Amount(Decimal);

impl Amount {
    pub fn new(value: Decimal) -> Result<Self, WalletError> {
        if value <= Decimal::ZERO {
            return Err(WalletError::ValidationError(
                "Amount must be positive".to_string(),
            ));
        }
        if value.normalize().scale() > SCALE {
            return Err(WalletError::ValidationError(format!(
                "Amount must have at most {SCALE} fractional digits: {value}"
            )));
        }
        Ok(Self(at_scale(value)))
    }

    pub fn value(&self) -> Decimal {
        self.0
    }
}

impl TryFrom<Decimal> for Amount {
    type Error = WalletError;

    fn try_from(value: Decimal) -> Result<Self, Self::Error> {
        Self::new(value)
    }
}

impl fmt::Display for Amount {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Optimistic-concurrency token. Read together with a wallet snapshot and
/// handed back on commit; a store only accepts the write if it still matches.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Version(u64);

impl Version {
    pub const INITIAL: Self = Self(0);

    pub fn next(self) -> Self {
        Self(self.0 + 1)
    }

    pub fn value(&self) -> u64 {
        self.0
    }
}

impl fmt::Display for Version {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.0.fmt(f)
    }
}

/// A balance-holding entity.
///
/// `active` only ever goes from `true` to `false`. `version` advances on every
/// committed change so that stale snapshots can be detected at commit time.
#[derive(Debug, Serialize, Deserialize, PartialEq, Clone)]
pub struct Wallet {
    pub id: WalletId,
    pub balance: Balance,
    pub active: bool,
    pub version: Version,
    pub created_at: DateTime<Utc>,
}

impl Wallet {
    pub fn new() -> Self {
        Self {
            id: WalletId::new(),
            balance: Balance::ZERO,
            active: true,
            version: Version::INITIAL,
            created_at: Utc::now(),
        }
    }
}

impl Default for Wallet {
    fn default() -> Self {
        Self::new()
    }
}
