//! The authoritative chain, pool and ledger shared by all workers

use crate::blockchain::{Blockchain, Ledger, Sha256Hash, User};
use crate::mempool::TransactionPool;
use crate::transaction::Transaction;
use parking_lot::Mutex;
use std::sync::Arc;

/// Everything workers race over. Always accessed through one coarse lock,
/// see [`SharedState`].
#[derive(Debug, Clone)]
pub struct ChainState {
    pub chain: Blockchain,
    pub pool: TransactionPool,
    pub ledger: Ledger,
    next_nonce: u64,
}

/// Handle shared between workers.
pub type SharedState = Arc<Mutex<ChainState>>;

/// Private copies taken at the start of a mining attempt.
#[derive(Debug, Clone)]
pub struct Snapshot {
    /// Chain length when the copies were taken.
    pub height: usize,
    pub tip: Sha256Hash,
    pub pool: TransactionPool,
    pub ledger: Ledger,
}

impl ChainState {
    pub fn new(difficulty: u32) -> Self {
        Self {
            chain: Blockchain::new(difficulty),
            pool: TransactionPool::new(),
            ledger: Ledger::new(),
            next_nonce: 0,
        }
    }

    pub fn into_shared(self) -> SharedState {
        Arc::new(Mutex::new(self))
    }

    pub fn add_users(&mut self, users: impl IntoIterator<Item = User>) {
        for user in users {
            self.ledger.add_user(user);
        }
    }

    pub fn add_transactions(&mut self, txs: impl IntoIterator<Item = Transaction>) {
        for tx in txs {
            self.pool.add(tx);
        }
    }

    /// Reserves `count` consecutive transaction nonces and returns the first.
    pub fn reserve_nonces(&mut self, count: u64) -> u64 {
        let first = self.next_nonce;
        self.next_nonce += count;
        first
    }

    /// Copies pool and ledger together with the height and tip they belong to.
    pub fn snapshot(&self) -> Snapshot {
        Snapshot {
            height: self.chain.len(),
            tip: self.chain.last_block_hash(),
            pool: self.pool.clone(),
            ledger: self.ledger.clone(),
        }
    }
}
