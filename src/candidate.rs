//! Candidate block assembly against private pool and ledger snapshots

use crate::blockchain::Ledger;
use crate::mempool::TransactionPool;
use crate::transaction::Transaction;
use rand::Rng;
use tracing::{debug, trace};

/// Transactions chosen for one block plus those rejected along the way.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CandidateSet {
    pub candidates: Vec<Transaction>,
    pub invalid: Vec<Transaction>,
}

/// Draws transactions from a private pool copy and validates them against a
/// private ledger copy. Neither copy is ever written back.
#[derive(Debug, Clone)]
pub struct CandidateBuilder {
    pool: TransactionPool,
    ledger: Ledger,
    set: CandidateSet,
}

impl CandidateBuilder {
    pub fn new(pool: TransactionPool, ledger: Ledger) -> Self {
        Self {
            pool,
            ledger,
            set: CandidateSet::default(),
        }
    }

    /// Adds at most one transaction to the candidates.
    ///
    /// Unaffordable draws are moved to the invalid set and the search goes on.
    /// The first affordable draw is applied to the private ledger, so later
    /// draws from the same sender see the reduced balance. Returns `false`
    /// once the private pool is exhausted without finding one.
    pub fn add_transaction<R: Rng + ?Sized>(&mut self, rng: &mut R) -> bool {
        loop {
            let tx = match self.pool.select_random(rng) {
                Ok(tx) => tx.clone(),
                Err(_) => {
                    trace!("No transactions left in the private pool");
                    return false;
                }
            };
            self.pool.remove(&tx);

            let affordable = match tx.is_affordable(&self.ledger) {
                Ok(affordable) => affordable,
                Err(e) => {
                    debug!("Rejecting {}: {}", tx, e);
                    false
                }
            };

            if !affordable {
                trace!("Sender cannot cover {}", tx);
                self.set.invalid.push(tx);
                continue;
            }

            if let Err(e) = self.ledger.apply_transaction(&tx) {
                debug!("Rejecting {}: {}", tx, e);
                self.set.invalid.push(tx);
                continue;
            }

            self.set.candidates.push(tx);
            return true;
        }
    }

    /// Calls [`add_transaction`](Self::add_transaction) until the private pool
    /// is empty or `max_transactions` candidates have been collected.
    pub fn fill<R: Rng + ?Sized>(&mut self, rng: &mut R, max_transactions: usize) {
        while !self.pool.is_empty() && self.set.candidates.len() < max_transactions {
            self.add_transaction(rng);
        }
    }

    pub fn candidates(&self) -> &[Transaction] {
        &self.set.candidates
    }

    pub fn invalid(&self) -> &[Transaction] {
        &self.set.invalid
    }

    pub fn remaining(&self) -> usize {
        self.pool.len()
    }

    /// The private ledger with every candidate applied.
    pub fn ledger(&self) -> &Ledger {
        &self.ledger
    }

    pub fn finish(self) -> CandidateSet {
        self.set
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::blockchain::User;
    use crate::crypto::address_from_string;
    use rand::rngs::StdRng;
    use rand::SeedableRng;

    fn users() -> (User, User, User) {
        (
            User::new("alice", address_from_string("alice"), 10),
            User::new("bob", address_from_string("bob"), 0),
            User::new("carol", address_from_string("carol"), 50),
        )
    }

    #[test]
    fn test_same_sender_cannot_overdraw_within_block() {
        let (alice, bob, carol) = users();
        let ledger = Ledger::from_users(vec![alice.clone(), bob.clone(), carol]);
        let mut pool = TransactionPool::new();
        pool.add(Transaction::new(alice.public_key, bob.public_key, 6, 0).unwrap());
        pool.add(Transaction::new(alice.public_key, bob.public_key, 6, 1).unwrap());

        for seed in 0..20 {
            let mut builder = CandidateBuilder::new(pool.clone(), ledger.clone());
            builder.fill(&mut StdRng::seed_from_u64(seed), 10);

            assert_eq!(builder.candidates().len(), 1);
            assert_eq!(builder.invalid().len(), 1);
            assert_eq!(builder.ledger().balance_of(&alice.public_key).unwrap(), 4);
            assert_ne!(builder.candidates()[0].id(), builder.invalid()[0].id());
        }
    }

    #[test]
    fn test_add_transaction_adds_at_most_one() {
        let (alice, bob, carol) = users();
        let ledger = Ledger::from_users(vec![alice, bob.clone(), carol.clone()]);
        let mut pool = TransactionPool::new();
        for nonce in 0..3 {
            pool.add(Transaction::new(carol.public_key, bob.public_key, 5, nonce).unwrap());
        }

        let mut builder = CandidateBuilder::new(pool, ledger);
        let mut rng = StdRng::seed_from_u64(3);

        assert!(builder.add_transaction(&mut rng));
        assert_eq!(builder.candidates().len(), 1);
        assert_eq!(builder.remaining(), 2);
    }

    #[test]
    fn test_skips_invalid_until_valid_found() {
        let (alice, bob, carol) = users();
        let ledger = Ledger::from_users(vec![alice.clone(), bob.clone(), carol]);
        let mut pool = TransactionPool::new();
        for nonce in 0..4 {
            pool.add(Transaction::new(bob.public_key, alice.public_key, 1, nonce).unwrap());
        }
        pool.add(Transaction::new(alice.public_key, bob.public_key, 3, 99).unwrap());

        let mut builder = CandidateBuilder::new(pool, ledger);
        assert!(builder.add_transaction(&mut StdRng::seed_from_u64(11)));

        assert_eq!(builder.candidates().len(), 1);
        assert_eq!(builder.candidates()[0].nonce(), 99);
        assert_eq!(builder.invalid().len() + builder.remaining(), 4);
    }

    #[test]
    fn test_nothing_affordable_drains_pool() {
        let (alice, bob, carol) = users();
        let ledger = Ledger::from_users(vec![alice.clone(), bob.clone(), carol]);
        let mut pool = TransactionPool::new();
        pool.add(Transaction::new(bob.public_key, alice.public_key, 1, 0).unwrap());
        pool.add(Transaction::new(alice.public_key, bob.public_key, 11, 1).unwrap());

        let mut builder = CandidateBuilder::new(pool, ledger);
        assert!(!builder.add_transaction(&mut StdRng::seed_from_u64(5)));

        let set = builder.finish();
        assert!(set.candidates.is_empty());
        assert_eq!(set.invalid.len(), 2);
    }

    #[test]
    fn test_fill_respects_block_cap() {
        let (alice, bob, carol) = users();
        let ledger = Ledger::from_users(vec![alice, bob.clone(), carol.clone()]);
        let mut pool = TransactionPool::new();
        for nonce in 0..10 {
            pool.add(Transaction::new(carol.public_key, bob.public_key, 1, nonce).unwrap());
        }

        let mut builder = CandidateBuilder::new(pool, ledger);
        builder.fill(&mut StdRng::seed_from_u64(0), 4);

        assert_eq!(builder.candidates().len(), 4);
        assert_eq!(builder.remaining(), 6);
    }

    #[test]
    fn test_unknown_sender_is_invalid() {
        let (alice, bob, carol) = users();
        let ledger = Ledger::from_users(vec![alice, bob.clone(), carol]);
        let mut pool = TransactionPool::new();
        pool.add(Transaction::new(address_from_string("mallory"), bob.public_key, 1, 0).unwrap());

        let mut builder = CandidateBuilder::new(pool, ledger);
        builder.fill(&mut StdRng::seed_from_u64(0), 4);

        assert!(builder.candidates().is_empty());
        assert_eq!(builder.invalid().len(), 1);
    }
}
