//! Concurrent wallet balances backed by an append-only ledger.
//!
//! Deposits and withdrawals are applied with optimistic concurrency: each
//! attempt reads a versioned wallet snapshot and commits only if the version
//! is still current, appending one ledger entry in the same unit.

pub mod application;
pub mod config;
pub mod domain;
pub mod error;
pub mod infrastructure;
pub mod interfaces;
