//! Proof-of-work search with cooperative cancellation

use crate::blockchain::Block;
use std::sync::atomic::{AtomicBool, Ordering};
use tracing::{debug, trace};

/// How many nonces are tried between two reads of the cancellation flag.
pub const CANCEL_POLL_INTERVAL: u64 = 256;

/// Result of a proof-of-work search.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum MineOutcome {
    /// A nonce was found; the block's `hash` satisfies its difficulty.
    Mined(Block),
    /// Another worker set the shared flag before a nonce was found.
    Cancelled,
}

/// The proof-of-work search used by mining workers.
pub trait BlockMiner: Send + Sync {
    /// Searches for a nonce satisfying `block.header.difficulty`.
    ///
    /// Implementations must poll `cancel` and return `Cancelled` soon after it
    /// is set.
    fn mine(&self, block: Block, cancel: &AtomicBool) -> MineOutcome;
}

/// SHA-256 nonce search over the block header.
#[derive(Debug, Clone, Copy)]
pub struct HashMiner {
    poll_interval: u64,
}

impl Default for HashMiner {
    fn default() -> Self {
        Self {
            poll_interval: CANCEL_POLL_INTERVAL,
        }
    }
}

impl HashMiner {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_poll_interval(poll_interval: u64) -> Self {
        Self {
            poll_interval: poll_interval.max(1),
        }
    }
}

impl BlockMiner for HashMiner {
    fn mine(&self, mut block: Block, cancel: &AtomicBool) -> MineOutcome {
        let difficulty = block.header.difficulty;
        let mut attempts: u64 = 0;

        loop {
            if attempts % self.poll_interval == 0 && cancel.load(Ordering::Acquire) {
                debug!(
                    "Search for block {} cancelled after {} attempts",
                    block.header.height, attempts
                );
                return MineOutcome::Cancelled;
            }

            let hash = block.header.hash();
            if Block::meets_difficulty(&hash, difficulty) {
                trace!(
                    "Nonce {} solves block {} after {} attempts",
                    block.header.nonce,
                    block.header.height,
                    attempts + 1
                );
                block.hash = hash;
                return MineOutcome::Mined(block);
            }

            attempts = attempts.wrapping_add(1);
            block.header.nonce = match block.header.nonce.checked_add(1) {
                Some(n) => n,
                None => {
                    // Nonce space exhausted: move the timestamp and start over.
                    block.header.timestamp += 1;
                    0
                }
            };
        }
    }
}
