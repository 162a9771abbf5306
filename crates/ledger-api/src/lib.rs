//! HTTP surface for the subject event analytics ledger.

pub mod server;
