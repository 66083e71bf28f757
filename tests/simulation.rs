//! End-to-end simulation runs

use racechain::config::{Config, MiningConfig, PoolClearPolicy, TransactionsConfig, UsersConfig};
use racechain::error::ChainError;
use racechain::node::Node;
use std::collections::HashSet;

fn small_config(policy: PoolClearPolicy) -> Config {
    Config {
        mining: MiningConfig {
            difficulty: 4,
            max_transactions_per_block: 8,
            workers: 4,
            pool_clear_policy: policy,
            max_rounds: 1_000,
        },
        users: UsersConfig {
            count: 8,
            min_balance: 50,
            max_balance: 500,
        },
        transactions: TransactionsConfig {
            count: 150,
            min_amount: 10,
            max_amount: 300,
        },
    }
}

fn run_and_check(policy: PoolClearPolicy) -> Result<(), Box<dyn std::error::Error>> {
    let node = Node::new(small_config(policy))?;
    node.create_users()?;
    node.generate_transactions()?;
    let initial_ledger = node.state.lock().ledger.clone();

    let summary = node.run()?;

    assert_eq!(summary.pool_remaining, 0);
    assert_eq!(summary.integrity_failures, 0);
    assert_eq!(summary.final_height, summary.blocks_committed + 1);

    let state = node.state.lock();
    assert_eq!(state.ledger.total_supply(), initial_ledger.total_supply());

    // Every transaction is committed at most once, and replaying the chain
    // from the starting balances never overdraws anybody.
    let mut seen = HashSet::new();
    let mut replay = initial_ledger;
    for block in state.chain.blocks().iter().skip(1) {
        assert!(racechain::blockchain::check_block_hash(block));
        for tx in &block.transactions {
            assert!(seen.insert(*tx.id()), "{} committed twice", tx);
            replay.apply_transaction(tx)?;
        }
    }
    assert_eq!(replay.users(), state.ledger.users());
    Ok(())
}

#[test]
fn test_full_run_clear_all() -> Result<(), Box<dyn std::error::Error>> {
    run_and_check(PoolClearPolicy::ClearAll)
}

#[test]
fn test_full_run_clear_invalid_only() -> Result<(), Box<dyn std::error::Error>> {
    run_and_check(PoolClearPolicy::ClearInvalidOnly)
}

#[test]
fn test_generation_without_users_fails() -> Result<(), Box<dyn std::error::Error>> {
    let node = Node::new(small_config(PoolClearPolicy::ClearAll))?;
    assert_eq!(
        node.generate_transactions().unwrap_err(),
        ChainError::NotEnoughUsers(0)
    );

    // An empty pool ends the run before any worker is asked to mine.
    let summary = node.run()?;
    assert_eq!(summary.rounds, 0);
    assert_eq!(summary.final_height, 1);
    Ok(())
}

#[test]
fn test_round_with_no_users_reports_error() -> Result<(), Box<dyn std::error::Error>> {
    let node = Node::new(small_config(PoolClearPolicy::ClearAll))?;
    let report = node.mine_round();
    assert!(report
        .results
        .iter()
        .all(|r| r.outcome == Err(ChainError::NoUsers)));
    Ok(())
}

#[test]
fn test_report_serializes() -> Result<(), Box<dyn std::error::Error>> {
    let node = Node::new(small_config(PoolClearPolicy::ClearAll))?;
    node.create_users()?;
    node.generate_transactions()?;
    node.run()?;

    let report = node.report();
    let json = serde_json::to_value(&report)?;
    assert_eq!(json["height"], report.height);
    assert_eq!(json["balances"].as_array().map(|b| b.len()), Some(8));
    assert_eq!(json["blocks"][0]["height"], 0);
    Ok(())
}
