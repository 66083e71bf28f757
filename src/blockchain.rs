// Thin re-export module: implementation is in `blockchain/core.rs`, split into
// chain management, ledger state, and block validation.

pub mod core;
pub use core::*;
