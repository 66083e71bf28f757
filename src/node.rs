//! Round driver: runs the racing workers against the shared state

use crate::config::Config;
use crate::crypto::address_to_hex;
use crate::error::{ChainError, Result};
use crate::generator::{create_users, generate_transactions};
use crate::miner::{BlockMiner, HashMiner};
use crate::shared_state::{ChainState, SharedState};
use crate::worker::{AttemptOutcome, MiningWorker};
use serde::Serialize;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use tracing::{error, info, warn};

/// What one worker reported for one round.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct WorkerResult {
    pub worker: usize,
    pub outcome: Result<AttemptOutcome>,
}

#[derive(Debug, Clone)]
pub struct RoundReport {
    pub results: Vec<WorkerResult>,
    /// Chain length after the round.
    pub height: usize,
    pub pool_remaining: usize,
}

impl RoundReport {
    pub fn committed(&self) -> usize {
        self.count(|o| o.is_committed())
    }

    pub fn count(&self, pred: impl Fn(&AttemptOutcome) -> bool) -> usize {
        self.results
            .iter()
            .filter(|r| matches!(&r.outcome, Ok(o) if pred(o)))
            .count()
    }

    pub fn integrity_failures(&self) -> usize {
        self.results
            .iter()
            .filter(|r| matches!(r.outcome, Err(ChainError::TamperedBlock(_))))
            .count()
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct RunSummary {
    pub rounds: usize,
    pub blocks_committed: usize,
    pub lost_races: usize,
    pub cancelled: usize,
    pub integrity_failures: usize,
    pub final_height: usize,
    pub pool_remaining: usize,
}

#[derive(Debug, Clone, Serialize)]
pub struct BlockSummary {
    pub height: u64,
    pub hash: String,
    pub previous_hash: String,
    pub difficulty: u32,
    pub nonce: u64,
    pub transactions: usize,
}

#[derive(Debug, Clone, Serialize)]
pub struct BalanceEntry {
    pub name: String,
    pub public_key: String,
    pub balance: u64,
}

/// Serializable view of the chain and final balances.
#[derive(Debug, Clone, Serialize)]
pub struct ChainReport {
    pub height: usize,
    pub blocks: Vec<BlockSummary>,
    pub balances: Vec<BalanceEntry>,
    pub pending_transactions: usize,
    pub total_supply: u128,
}

pub struct Node {
    pub config: Config,
    pub state: SharedState,
    cancel: Arc<AtomicBool>,
    miner: Arc<dyn BlockMiner>,
    workers: rayon::ThreadPool,
}

impl Node {
    pub fn new(config: Config) -> Result<Self> {
        Self::with_miner(config, Arc::new(HashMiner::new()))
    }

    /// Builds a node around a custom proof-of-work search.
    pub fn with_miner(config: Config, miner: Arc<dyn BlockMiner>) -> Result<Self> {
        config.validate()?;

        let workers = rayon::ThreadPoolBuilder::new()
            .num_threads(config.mining.workers)
            .thread_name(|i| format!("racechain-worker-{}", i))
            .build()
            .map_err(|e| ChainError::InvalidConfig(format!("Failed to start workers: {}", e)))?;

        let state = ChainState::new(config.mining.difficulty).into_shared();

        Ok(Self {
            config,
            state,
            cancel: Arc::new(AtomicBool::new(false)),
            miner,
            workers,
        })
    }

    /// Creates the configured number of users with random balances.
    pub fn create_users(&self) -> Result<usize> {
        let users = create_users(
            &mut rand::thread_rng(),
            self.config.users.count,
            self.config.users.min_balance,
            self.config.users.max_balance,
        )?;
        let created = users.len();
        self.state.lock().add_users(users);
        info!("Created {} users", created);
        Ok(created)
    }

    /// Generates the configured number of transactions into the shared pool.
    pub fn generate_transactions(&self) -> Result<usize> {
        let count = self.config.transactions.count;
        let mut state = self.state.lock();
        let users = state.ledger.users().to_vec();
        if users.len() < 2 {
            warn!(
                "Not enough users to generate transactions. There are only {} users.",
                users.len()
            );
            return Err(ChainError::NotEnoughUsers(users.len()));
        }
        let first_nonce = state.reserve_nonces(count as u64);
        let txs = generate_transactions(
            &mut rand::thread_rng(),
            &users,
            count,
            self.config.transactions.min_amount,
            self.config.transactions.max_amount,
            first_nonce,
        )?;
        state.add_transactions(txs);
        info!("Generated {} transactions", count);
        Ok(count)
    }

    /// Runs one attempt on every worker thread at once and waits for all of them.
    pub fn mine_round(&self) -> RoundReport {
        self.cancel.store(false, Ordering::Release);

        let state: &SharedState = &self.state;
        let cancel: &AtomicBool = &self.cancel;
        let miner: &dyn BlockMiner = self.miner.as_ref();
        let mining = &self.config.mining;

        let mut results = self.workers.broadcast(|ctx| {
            let worker = MiningWorker::new(ctx.index(), state, cancel, miner, mining);
            WorkerResult {
                worker: ctx.index(),
                outcome: worker.attempt(&mut rand::thread_rng()),
            }
        });
        results.sort_by_key(|r| r.worker);

        let s = self.state.lock();
        RoundReport {
            results,
            height: s.chain.len(),
            pool_remaining: s.pool.len(),
        }
    }

    /// Mines rounds until the pool is drained or the round cap is reached.
    ///
    /// Integrity failures are counted and the run continues; a ledger without
    /// users stops the run with an error.
    pub fn run(&self) -> Result<RunSummary> {
        let mut summary = RunSummary::default();

        while summary.rounds < self.config.mining.max_rounds {
            if self.state.lock().pool.is_empty() {
                break;
            }

            let report = self.mine_round();
            summary.rounds += 1;

            for result in &report.results {
                match &result.outcome {
                    Err(ChainError::TamperedBlock(msg)) => {
                        error!("worker {}: {}", result.worker, msg);
                    }
                    Err(e) => return Err(e.clone()),
                    Ok(_) => {}
                }
            }

            summary.blocks_committed += report.committed();
            summary.lost_races += report.count(|o| *o == AttemptOutcome::LostRace);
            summary.cancelled += report.count(|o| *o == AttemptOutcome::Cancelled);
            summary.integrity_failures += report.integrity_failures();
            summary.final_height = report.height;
            summary.pool_remaining = report.pool_remaining;
        }

        let s = self.state.lock();
        summary.final_height = s.chain.len();
        summary.pool_remaining = s.pool.len();
        info!(
            "Run finished after {} rounds: height {}, {} transactions left in pool",
            summary.rounds, summary.final_height, summary.pool_remaining
        );
        Ok(summary)
    }

    pub fn report(&self) -> ChainReport {
        let s = self.state.lock();
        ChainReport {
            height: s.chain.len(),
            blocks: s
                .chain
                .blocks()
                .iter()
                .map(|b| BlockSummary {
                    height: b.header.height,
                    hash: b.hash_str(),
                    previous_hash: hex::encode(b.header.previous_hash),
                    difficulty: b.header.difficulty,
                    nonce: b.header.nonce,
                    transactions: b.transactions.len(),
                })
                .collect(),
            balances: s
                .ledger
                .users()
                .iter()
                .map(|u| BalanceEntry {
                    name: u.name.clone(),
                    public_key: address_to_hex(&u.public_key),
                    balance: u.balance,
                })
                .collect(),
            pending_transactions: s.pool.len(),
            total_supply: s.ledger.total_supply(),
        }
    }
}
