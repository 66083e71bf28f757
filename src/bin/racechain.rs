#![forbid(unsafe_code)]
//! Runs a mining race simulation and prints the outcome.

use clap::Parser;
use colored::*;
use racechain::config::{load_config, PoolClearPolicy};
use racechain::node::Node;
use std::path::PathBuf;
use std::time::Instant;
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(author, version, about, long_about = None)]
struct Cli {
    /// Path to a TOML config file (defaults to ./racechain.toml if present)
    #[arg(short, long)]
    config: Option<PathBuf>,
    /// Number of racing worker threads
    #[arg(short, long)]
    workers: Option<usize>,
    /// Leading zero bits required in a block hash
    #[arg(short, long)]
    difficulty: Option<u32>,
    /// Maximum transactions per block
    #[arg(long)]
    max_tx: Option<usize>,
    /// Number of users to create
    #[arg(long)]
    users: Option<usize>,
    /// Number of transactions to generate
    #[arg(long)]
    transactions: Option<usize>,
    /// Maximum number of rounds
    #[arg(long)]
    rounds: Option<usize>,
    /// What to do with the pool when no transaction is affordable
    #[arg(long, value_enum)]
    pool_policy: Option<PoolClearPolicy>,
    /// Write a JSON report of the chain and balances to this file
    #[arg(long)]
    report: Option<PathBuf>,
}

fn main() -> Result<(), Box<dyn std::error::Error>> {
    let cli = Cli::parse();

    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .init();

    let mut config = load_config(cli.config.as_deref())?;
    if let Some(workers) = cli.workers {
        config.mining.workers = workers;
    }
    if let Some(difficulty) = cli.difficulty {
        config.mining.difficulty = difficulty;
    }
    if let Some(max_tx) = cli.max_tx {
        config.mining.max_transactions_per_block = max_tx;
    }
    if let Some(users) = cli.users {
        config.users.count = users;
    }
    if let Some(transactions) = cli.transactions {
        config.transactions.count = transactions;
    }
    if let Some(rounds) = cli.rounds {
        config.mining.max_rounds = rounds;
    }
    if let Some(policy) = cli.pool_policy {
        config.mining.pool_clear_policy = policy;
    }

    let node = Node::new(config)?;
    node.create_users()?;
    node.generate_transactions()?;
    let supply_before = node.report().total_supply;

    println!("{}", "RaceChain".bright_cyan().bold());
    println!(
        "{} workers racing at difficulty {} ({} transactions per block)",
        node.config.mining.workers.to_string().bright_white(),
        node.config.mining.difficulty.to_string().bright_white(),
        node.config.mining.max_transactions_per_block
    );

    let start = Instant::now();
    let summary = node.run()?;
    let elapsed = start.elapsed();

    let report = node.report();
    println!();
    println!("{}", "Summary".bright_green().underline());
    println!("  Rounds:              {}", summary.rounds);
    println!("  Blocks committed:    {}", summary.blocks_committed.to_string().bright_green());
    println!("  Searches cancelled:  {}", summary.cancelled);
    println!("  Races lost:          {}", summary.lost_races);
    if summary.integrity_failures > 0 {
        println!(
            "  Integrity failures:  {}",
            summary.integrity_failures.to_string().bright_red()
        );
    }
    println!("  Chain height:        {}", summary.final_height);
    println!("  Pending in pool:     {}", summary.pool_remaining);
    println!("  Elapsed:             {:.3}s", elapsed.as_secs_f64());
    if report.total_supply == supply_before {
        println!("  Total supply:        {} {}", report.total_supply, "(conserved)".green());
    } else {
        println!(
            "  Total supply:        {} {}",
            report.total_supply,
            format!("(was {})", supply_before).bright_red()
        );
    }

    if let Some(path) = cli.report {
        std::fs::write(&path, serde_json::to_string_pretty(&report)?)?;
        println!("  Report written to {}", path.display().to_string().yellow());
    }

    Ok(())
}
