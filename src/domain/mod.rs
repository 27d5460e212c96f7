//! Domain layer: wallet and ledger value types plus the storage ports the
//! application layer is written against.

pub mod ledger;
pub mod ports;
pub mod wallet;
