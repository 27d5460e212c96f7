//! Application layer containing the wallet use cases.
//!
//! [`engine::BalanceEngine`] performs one optimistic read-modify-write,
//! [`payment::PaymentService`] retries it on version conflicts, and
//! [`wallets::WalletService`] covers the wallet lifecycle.

pub mod engine;
pub mod payment;
pub mod wallets;
