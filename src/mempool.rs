//! Pending transaction pool

use crate::error::{ChainError, Result};
use crate::transaction::{Transaction, TxId};
use rand::Rng;
use std::collections::HashMap;

/// Pending transactions waiting to be mined.
///
/// Order of insertion is kept; duplicates by id are allowed since the pool is
/// a multiset. Cloning produces an independent snapshot.
#[derive(Debug, Clone, Default)]
pub struct TransactionPool {
    transactions: Vec<Transaction>,
}

impl TransactionPool {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add(&mut self, tx: Transaction) {
        self.transactions.push(tx);
    }

    pub fn len(&self) -> usize {
        self.transactions.len()
    }

    pub fn is_empty(&self) -> bool {
        self.transactions.is_empty()
    }

    pub fn contains(&self, id: &TxId) -> bool {
        self.transactions.iter().any(|t| t.id() == id)
    }

    pub fn iter(&self) -> impl Iterator<Item = &Transaction> {
        self.transactions.iter()
    }

    /// Picks a transaction uniformly at random without removing it.
    pub fn select_random<R: Rng + ?Sized>(&self, rng: &mut R) -> Result<&Transaction> {
        if self.transactions.is_empty() {
            return Err(ChainError::EmptyPool);
        }
        let idx = rng.gen_range(0..self.transactions.len());
        Ok(&self.transactions[idx])
    }

    /// Removes one occurrence of `tx`, matched by id. Returns whether anything was removed.
    pub fn remove(&mut self, tx: &Transaction) -> bool {
        match self.transactions.iter().position(|t| t.id() == tx.id()) {
            Some(idx) => {
                self.transactions.remove(idx);
                true
            }
            None => false,
        }
    }

    /// Removes one pooled occurrence per entry of `txs`, earliest first. Ids
    /// that are no longer pooled are ignored. Returns how many entries were
    /// dropped.
    pub fn remove_many(&mut self, txs: &[Transaction]) -> usize {
        if txs.is_empty() {
            return 0;
        }
        let mut pending: HashMap<&TxId, usize> = HashMap::new();
        for tx in txs {
            *pending.entry(tx.id()).or_insert(0) += 1;
        }
        let before = self.transactions.len();
        self.transactions.retain(|t| match pending.get_mut(t.id()) {
            Some(left) if *left > 0 => {
                *left -= 1;
                false
            }
            _ => true,
        });
        before - self.transactions.len()
    }

    pub fn clear(&mut self) {
        self.transactions.clear();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::crypto::address_from_string;
    use rand::rngs::StdRng;
    use rand::SeedableRng;
    use std::collections::HashSet;

    fn tx(nonce: u64) -> Transaction {
        Transaction::new(address_from_string("a"), address_from_string("b"), 1, nonce).unwrap()
    }

    fn pool_of(n: u64) -> TransactionPool {
        let mut pool = TransactionPool::new();
        for i in 0..n {
            pool.add(tx(i));
        }
        pool
    }

    #[test]
    fn test_select_random_empty_pool() {
        let pool = TransactionPool::new();
        let mut rng = StdRng::seed_from_u64(1);
        assert_eq!(pool.select_random(&mut rng).unwrap_err(), ChainError::EmptyPool);
    }

    #[test]
    fn test_select_random_does_not_remove() {
        let pool = pool_of(3);
        let mut rng = StdRng::seed_from_u64(7);
        let picked = pool.select_random(&mut rng).unwrap().clone();
        assert_eq!(pool.len(), 3);
        assert!(pool.contains(picked.id()));
    }

    #[test]
    fn test_select_random_covers_whole_pool() {
        let pool = pool_of(4);
        let mut rng = StdRng::seed_from_u64(42);
        let mut seen = HashSet::new();
        for _ in 0..200 {
            seen.insert(*pool.select_random(&mut rng).unwrap().id());
        }
        assert_eq!(seen.len(), 4);
    }

    #[test]
    fn test_remove_by_identity() {
        let mut pool = pool_of(3);
        assert!(pool.remove(&tx(1)));
        assert!(!pool.contains(tx(1).id()));
        assert_eq!(pool.len(), 2);
        assert!(!pool.remove(&tx(1)));
    }

    #[test]
    fn test_remove_many_is_idempotent() {
        let mut pool = pool_of(5);
        let batch = vec![tx(0), tx(3)];

        assert_eq!(pool.remove_many(&batch), 2);
        assert_eq!(pool.len(), 3);

        // Already gone: no error, nothing else touched.
        assert_eq!(pool.remove_many(&batch), 0);
        assert_eq!(pool.len(), 3);
        for i in [1, 2, 4] {
            assert!(pool.contains(tx(i).id()));
        }
    }

    #[test]
    fn test_remove_many_drops_one_copy_per_entry() {
        let mut pool = pool_of(2);
        pool.add(tx(0));

        assert_eq!(pool.remove_many(&[tx(0)]), 1);
        assert_eq!(pool.len(), 2);
        assert!(pool.contains(tx(0).id()));

        assert_eq!(pool.remove_many(&[tx(0), tx(0)]), 1);
        assert_eq!(pool.len(), 1);
        assert!(!pool.contains(tx(0).id()));
        assert!(pool.contains(tx(1).id()));
    }

    #[test]
    fn test_clear() {
        let mut pool = pool_of(3);
        pool.clear();
        assert!(pool.is_empty());
    }
}
