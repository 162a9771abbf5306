//! Core types and traits for the subject event analytics ledger.
//!
//! Records and summaries serialize with camelCase field names so the dashboard can consume them as-is.

mod config;
mod dto;
mod traits;
mod wire;

pub use config::*;
pub use dto::*;
pub use traits::*;
pub use wire::*;
