//! One mining attempt: snapshot, select, search, commit

use crate::blockchain::{Block, BLOCK_VERSION};
use crate::candidate::CandidateBuilder;
use crate::committer::{ChainCommitter, CommitOutcome};
use crate::config::MiningConfig;
use crate::error::{ChainError, Result};
use crate::miner::{BlockMiner, MineOutcome};
use crate::shared_state::ChainState;
use parking_lot::Mutex;
use rand::Rng;
use std::sync::atomic::AtomicBool;
use tracing::{debug, info, trace};

/// Phases a mining attempt moves through, in order.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AttemptPhase {
    Snapshotting,
    Selecting,
    Searching,
    Committing,
    Done,
}

/// How an attempt ended when nothing went wrong.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AttemptOutcome {
    /// This worker won the height. `height` is the new chain length.
    Committed {
        height: usize,
        transactions: usize,
        invalid: usize,
    },
    /// Nothing pending.
    EmptyPool,
    /// Pending transactions exist but none is affordable.
    NothingAffordable,
    /// The search was stopped because another worker committed.
    Cancelled,
    /// A block was mined but another worker committed this height first.
    LostRace,
}

impl AttemptOutcome {
    pub fn is_committed(&self) -> bool {
        matches!(self, AttemptOutcome::Committed { .. })
    }
}

/// A single racing worker bound to the shared state.
pub struct MiningWorker<'a> {
    id: usize,
    state: &'a Mutex<ChainState>,
    cancel: &'a AtomicBool,
    miner: &'a dyn BlockMiner,
    config: &'a MiningConfig,
}

impl<'a> MiningWorker<'a> {
    pub fn new(
        id: usize,
        state: &'a Mutex<ChainState>,
        cancel: &'a AtomicBool,
        miner: &'a dyn BlockMiner,
        config: &'a MiningConfig,
    ) -> Self {
        Self {
            id,
            state,
            cancel,
            miner,
            config,
        }
    }

    fn enter(&self, phase: AttemptPhase) {
        trace!("worker {}: {:?}", self.id, phase);
    }

    /// Runs one full attempt.
    ///
    /// Empty pools, unaffordable pools, cancellation and lost races are `Ok`
    /// outcomes. A ledger without users and a block failing its hash check
    /// are errors.
    pub fn attempt<R: Rng + ?Sized>(&self, rng: &mut R) -> Result<AttemptOutcome> {
        self.enter(AttemptPhase::Snapshotting);
        let snapshot = {
            let state = self.state.lock();
            if state.ledger.is_empty() {
                return Err(ChainError::NoUsers);
            }
            state.snapshot()
        };
        debug!("worker {}: mining block {}", self.id, snapshot.height);

        if snapshot.pool.is_empty() {
            debug!("worker {}: the pool is empty, nothing to mine", self.id);
            return Ok(self.done(AttemptOutcome::EmptyPool));
        }

        self.enter(AttemptPhase::Selecting);
        let mut builder = CandidateBuilder::new(snapshot.pool, snapshot.ledger);
        builder.fill(rng, self.config.max_transactions_per_block);
        let set = builder.finish();

        if set.candidates.is_empty() {
            ChainCommitter::prune_unaffordable(
                self.state,
                self.config.pool_clear_policy,
                &set.invalid,
            );
            return Ok(self.done(AttemptOutcome::NothingAffordable));
        }
        debug!(
            "worker {}: {} candidates, {} invalid",
            self.id,
            set.candidates.len(),
            set.invalid.len()
        );

        self.enter(AttemptPhase::Searching);
        let candidate = Block::new(
            snapshot.height as u64,
            snapshot.tip,
            self.config.difficulty,
            BLOCK_VERSION,
            set.candidates,
        );
        let mined = match self.miner.mine(candidate, self.cancel) {
            MineOutcome::Mined(block) => block,
            MineOutcome::Cancelled => {
                debug!(
                    "worker {}: another worker finished block {} first",
                    self.id, snapshot.height
                );
                return Ok(self.done(AttemptOutcome::Cancelled));
            }
        };

        self.enter(AttemptPhase::Committing);
        let transactions = mined.transactions.len();
        let outcome = match ChainCommitter::commit(
            self.state,
            self.cancel,
            mined,
            &set.invalid,
            snapshot.height,
        ) {
            Ok(CommitOutcome::Committed { height }) => {
                info!("Block {} has been mined by worker {}", height - 1, self.id);
                AttemptOutcome::Committed {
                    height,
                    transactions,
                    invalid: set.invalid.len(),
                }
            }
            Ok(CommitOutcome::LostRace { .. }) => AttemptOutcome::LostRace,
            Err(e) => {
                self.enter(AttemptPhase::Done);
                return Err(e);
            }
        };
        Ok(self.done(outcome))
    }

    fn done(&self, outcome: AttemptOutcome) -> AttemptOutcome {
        self.enter(AttemptPhase::Done);
        outcome
    }
}
