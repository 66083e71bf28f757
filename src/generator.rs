//! Random users and transactions for simulation runs

use crate::blockchain::User;
use crate::crypto::generate_address;
use crate::error::{ChainError, Result};
use crate::transaction::Transaction;
use rand::Rng;
use tracing::trace;

/// Creates `count` users named `user0`, `user1`, ... each with a fresh
/// secp256k1 address and a balance drawn uniformly from `min_balance..=max_balance`.
pub fn create_users<R: Rng + ?Sized>(
    rng: &mut R,
    count: usize,
    min_balance: u64,
    max_balance: u64,
) -> Result<Vec<User>> {
    if min_balance > max_balance {
        return Err(ChainError::InvalidConfig(format!(
            "min_balance ({}) exceeds max_balance ({})",
            min_balance, max_balance
        )));
    }

    Ok((0..count)
        .map(|i| {
            let balance = rng.gen_range(min_balance..=max_balance);
            User::new(format!("user{}", i), generate_address(), balance)
        })
        .collect())
}

/// Creates `count` transfers between distinct random users with amounts drawn
/// uniformly from `min_amount..=max_amount`. Nonces start at `first_nonce`.
///
/// Needs at least two users.
pub fn generate_transactions<R: Rng + ?Sized>(
    rng: &mut R,
    users: &[User],
    count: usize,
    min_amount: u64,
    max_amount: u64,
    first_nonce: u64,
) -> Result<Vec<Transaction>> {
    if users.len() < 2 {
        return Err(ChainError::NotEnoughUsers(users.len()));
    }
    if min_amount == 0 || min_amount > max_amount {
        return Err(ChainError::InvalidConfig(format!(
            "amount range {}..={} is not a positive range",
            min_amount, max_amount
        )));
    }

    let mut txs = Vec::with_capacity(count);
    for i in 0..count {
        let sender = rng.gen_range(0..users.len());
        // Draw from the remaining users so sender and recipient always differ.
        let mut recipient = rng.gen_range(0..users.len() - 1);
        if recipient >= sender {
            recipient += 1;
        }
        let amount = rng.gen_range(min_amount..=max_amount);

        let tx = Transaction::new(
            users[sender].public_key,
            users[recipient].public_key,
            amount,
            first_nonce + i as u64,
        )?;
        trace!("Generated {}", tx);
        txs.push(tx);
    }
    Ok(txs)
}
