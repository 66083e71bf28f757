//! RaceChain - a single-process blockchain where parallel workers race to mine each block
//!
//! # Architecture
//!
//! The crate is organized into logical modules:
//!
//! ## Core Blockchain
//! - [`blockchain`] - Blocks, the chain, the user ledger and block validation
//! - [`transaction`] - Transaction type and validation
//! - [`mempool`] - Pending transaction pool
//!
//! ## Mining
//! - [`candidate`] - Candidate selection against private snapshots
//! - [`miner`] - Proof-of-work search with cooperative cancellation
//! - [`worker`] - One full mining attempt
//! - [`committer`] - Critical sections guarding the shared state
//! - [`shared_state`] - The authoritative chain, pool and ledger
//! - [`node`] - Runs rounds of racing workers
//!
//! ## Configuration & Utilities
//! - [`config`] - Configuration management
//! - [`crypto`] - User key material
//! - [`generator`] - Random users and transactions
//! - [`error`] - Error types

#![forbid(unsafe_code)]

// ============================================================================
// Core Blockchain
// ============================================================================
pub mod blockchain;
pub mod mempool;
pub mod transaction;

// ============================================================================
// Mining
// ============================================================================
pub mod candidate;
pub mod committer;
pub mod miner;
pub mod node;
pub mod shared_state;
pub mod worker;

// ============================================================================
// Configuration & Utilities
// ============================================================================
pub mod config;
pub mod crypto;
pub mod error;
pub mod generator;
