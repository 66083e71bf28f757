//! Configuration management for RaceChain

use crate::error::{ChainError, Result};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::Path;

/// Config file read when no explicit path is given.
pub const DEFAULT_CONFIG_PATH: &str = "racechain.toml";

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Config {
    #[serde(default)]
    pub mining: MiningConfig,
    #[serde(default)]
    pub users: UsersConfig,
    #[serde(default)]
    pub transactions: TransactionsConfig,
}

/// What the selecting phase does to the shared pool when an attempt finds no
/// affordable transaction at all.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize, clap::ValueEnum)]
#[serde(rename_all = "snake_case")]
pub enum PoolClearPolicy {
    /// Drop every pending transaction.
    #[default]
    ClearAll,
    /// Drop only the transactions this attempt proved unaffordable.
    ClearInvalidOnly,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MiningConfig {
    /// Leading zero bits a block hash must have.
    #[serde(default = "default_difficulty")]
    pub difficulty: u32,
    #[serde(default = "default_max_transactions_per_block")]
    pub max_transactions_per_block: usize,
    #[serde(default = "default_workers")]
    pub workers: usize,
    #[serde(default)]
    pub pool_clear_policy: PoolClearPolicy,
    /// Upper bound on rounds in one run.
    #[serde(default = "default_max_rounds")]
    pub max_rounds: usize,
}

impl Default for MiningConfig {
    fn default() -> Self {
        Self {
            difficulty: default_difficulty(),
            max_transactions_per_block: default_max_transactions_per_block(),
            workers: default_workers(),
            pool_clear_policy: PoolClearPolicy::default(),
            max_rounds: default_max_rounds(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct UsersConfig {
    #[serde(default = "default_user_count")]
    pub count: usize,
    #[serde(default = "default_min_balance")]
    pub min_balance: u64,
    #[serde(default = "default_max_balance")]
    pub max_balance: u64,
}

impl Default for UsersConfig {
    fn default() -> Self {
        Self {
            count: default_user_count(),
            min_balance: default_min_balance(),
            max_balance: default_max_balance(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TransactionsConfig {
    #[serde(default = "default_transaction_count")]
    pub count: usize,
    #[serde(default = "default_min_amount")]
    pub min_amount: u64,
    #[serde(default = "default_max_amount")]
    pub max_amount: u64,
}

impl Default for TransactionsConfig {
    fn default() -> Self {
        Self {
            count: default_transaction_count(),
            min_amount: default_min_amount(),
            max_amount: default_max_amount(),
        }
    }
}

fn default_difficulty() -> u32 {
    16
}

fn default_max_transactions_per_block() -> usize {
    100
}

fn default_workers() -> usize {
    4
}

fn default_max_rounds() -> usize {
    10_000
}

fn default_user_count() -> usize {
    100
}

fn default_min_balance() -> u64 {
    100
}

fn default_max_balance() -> u64 {
    1_000_000
}

fn default_transaction_count() -> usize {
    1_000
}

fn default_min_amount() -> u64 {
    10
}

fn default_max_amount() -> u64 {
    1_000_000
}

impl Config {
    pub fn from_toml_str(s: &str) -> Result<Self> {
        let config: Config = toml::from_str(s)?;
        config.validate()?;
        Ok(config)
    }

    /// Checks values the simulation cannot run with.
    pub fn validate(&self) -> Result<()> {
        if self.mining.difficulty > 256 {
            return Err(ChainError::InvalidConfig(format!(
                "mining.difficulty must be at most 256 bits, got {}",
                self.mining.difficulty
            )));
        }
        if self.mining.max_transactions_per_block == 0 {
            return Err(ChainError::InvalidConfig(
                "mining.max_transactions_per_block must be at least 1".to_string(),
            ));
        }
        if self.mining.workers == 0 {
            return Err(ChainError::InvalidConfig(
                "mining.workers must be at least 1".to_string(),
            ));
        }
        if self.users.min_balance > self.users.max_balance {
            return Err(ChainError::InvalidConfig(format!(
                "users.min_balance ({}) exceeds users.max_balance ({})",
                self.users.min_balance, self.users.max_balance
            )));
        }
        if self.transactions.min_amount == 0 {
            return Err(ChainError::InvalidConfig(
                "transactions.min_amount must be greater than zero".to_string(),
            ));
        }
        if self.transactions.min_amount > self.transactions.max_amount {
            return Err(ChainError::InvalidConfig(format!(
                "transactions.min_amount ({}) exceeds transactions.max_amount ({})",
                self.transactions.min_amount, self.transactions.max_amount
            )));
        }
        Ok(())
    }
}

/// Loads the configuration.
///
/// With an explicit `path` the file must exist. Without one,
/// [`DEFAULT_CONFIG_PATH`] is read if present and built-in defaults are used
/// otherwise.
pub fn load_config(path: Option<&Path>) -> Result<Config> {
    let config_str = match path {
        Some(p) => fs::read_to_string(p)?,
        None => fs::read_to_string(DEFAULT_CONFIG_PATH).unwrap_or_default(),
    };

    if config_str.trim().is_empty() {
        let config = Config::default();
        config.validate()?;
        return Ok(config);
    }

    Config::from_toml_str(&config_str)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn test_defaults_are_valid() {
        let config = Config::default();
        assert!(config.validate().is_ok());
        assert_eq!(config.mining.pool_clear_policy, PoolClearPolicy::ClearAll);
    }

    #[test]
    fn test_partial_file_keeps_defaults() {
        let config = Config::from_toml_str(
            r#"
            [mining]
            difficulty = 4
            pool_clear_policy = "clear_invalid_only"

            [users]
            count = 7
            "#,
        )
        .unwrap();

        assert_eq!(config.mining.difficulty, 4);
        assert_eq!(
            config.mining.pool_clear_policy,
            PoolClearPolicy::ClearInvalidOnly
        );
        assert_eq!(config.mining.workers, default_workers());
        assert_eq!(config.users.count, 7);
        assert_eq!(config.users.max_balance, default_max_balance());
        assert_eq!(config.transactions, TransactionsConfig::default());
    }

    #[test]
    fn test_invalid_ranges_rejected() {
        let err = Config::from_toml_str("[transactions]\nmin_amount = 50\nmax_amount = 10\n")
            .unwrap_err();
        assert!(err.to_string().contains("exceeds transactions.max_amount"));

        let err = Config::from_toml_str("[mining]\nworkers = 0\n").unwrap_err();
        assert!(matches!(err, ChainError::InvalidConfig(_)));

        let err = Config::from_toml_str("[mining]\ndifficulty = 300\n").unwrap_err();
        assert!(err.to_string().contains("at most 256"));
    }

    #[test]
    fn test_malformed_toml_rejected() {
        let err = Config::from_toml_str("[mining\ndifficulty = ").unwrap_err();
        assert!(matches!(err, ChainError::InvalidConfig(_)));
    }

    #[test]
    fn test_load_config_from_file() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(file, "[mining]\nmax_transactions_per_block = 3").unwrap();

        let config = load_config(Some(file.path())).unwrap();
        assert_eq!(config.mining.max_transactions_per_block, 3);
    }

    #[test]
    fn test_load_config_missing_explicit_file() {
        let dir = tempfile::TempDir::new().unwrap();
        let result = load_config(Some(&dir.path().join("absent.toml")));
        assert!(matches!(result, Err(ChainError::IoError(_))));
    }
}
