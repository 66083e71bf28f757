//! Critical sections that mutate the shared chain, pool and ledger

use crate::blockchain::{check_block_hash, validate_no_double_spend, Block};
use crate::config::PoolClearPolicy;
use crate::error::{ChainError, Result};
use crate::shared_state::ChainState;
use crate::transaction::Transaction;
use parking_lot::Mutex;
use std::sync::atomic::{AtomicBool, Ordering};
use tracing::{debug, error, info};

/// Result of a commit attempt that did not hit an integrity failure.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CommitOutcome {
    /// The block was appended; `height` is the new chain length.
    Committed { height: usize },
    /// Another worker already appended a block at this height.
    LostRace { current_height: usize },
}

/// Owner of the two critical sections of a mining attempt.
pub struct ChainCommitter;

impl ChainCommitter {
    /// Selecting-phase decision after an attempt found no affordable
    /// transaction. Prunes the shared pool according to `policy`.
    ///
    /// The attempt ends either way, so nothing is reported back: whatever is
    /// left in the pool is picked up by the next round.
    pub fn prune_unaffordable(
        state: &Mutex<ChainState>,
        policy: PoolClearPolicy,
        invalid: &[Transaction],
    ) {
        let mut state = state.lock();
        match policy {
            PoolClearPolicy::ClearAll => {
                debug!(
                    "Not enough transactions to form a block; clearing {} pooled transactions",
                    state.pool.len()
                );
                state.pool.clear();
            }
            PoolClearPolicy::ClearInvalidOnly => {
                let removed = state.pool.remove_many(invalid);
                debug!(
                    "Not enough transactions to form a block; removed {} unaffordable transactions",
                    removed
                );
            }
        }
    }

    /// Commits a mined block if nobody else has extended the chain since the
    /// attempt began at `initial_height`.
    ///
    /// Either all of {chain append, ledger update, pool prune} happen or none
    /// do. On success the shared `cancel` flag is raised so racing searches
    /// stop.
    pub fn commit(
        state: &Mutex<ChainState>,
        cancel: &AtomicBool,
        block: Block,
        invalid: &[Transaction],
        initial_height: usize,
    ) -> Result<CommitOutcome> {
        let mut state = state.lock();

        if !check_block_hash(&block) {
            error!(
                "Tampering detected. Block hash {} is invalid.",
                block.hash_str()
            );
            return Err(ChainError::TamperedBlock(format!(
                "declared hash {} does not match block contents",
                block.hash_str()
            )));
        }
        if let Err(e) = validate_no_double_spend(&block) {
            error!("Tampering detected. {}", e);
            return Err(ChainError::TamperedBlock(e.to_string()));
        }

        let current_height = state.chain.len();
        if current_height != initial_height {
            debug!(
                "Block {} lost the race: chain is already at height {}",
                block.header.height, current_height
            );
            return Ok(CommitOutcome::LostRace { current_height });
        }

        // Stage balance changes so a failing transfer leaves nothing behind.
        let mut ledger = state.ledger.clone();
        for tx in &block.transactions {
            ledger.apply_transaction(tx).map_err(|e| {
                error!("Mined block carries an inapplicable transaction: {}", e);
                ChainError::InvalidBlock(format!("{}: {}", tx.id_str(), e))
            })?;
        }

        let committed = block.transactions.clone();
        let hash = block.hash_str();
        state.chain.append(block)?;

        cancel.store(true, Ordering::Release);

        state.ledger = ledger;
        let pruned = state.pool.remove_many(&committed);
        let pruned_invalid = state.pool.remove_many(invalid);
        let height = state.chain.len();

        info!(
            "Block {} ({}) committed with {} transactions; pruned {} committed and {} invalid from pool",
            height - 1,
            hash,
            committed.len(),
            pruned,
            pruned_invalid
        );

        Ok(CommitOutcome::Committed { height })
    }
}
