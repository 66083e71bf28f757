use crate::blockchain::core::chain::Block;
use crate::error::{ChainError, Result};
use std::collections::HashMap;

/// Recomputes the block's hash from its contents and compares it with the
/// declared one. Also requires the merkle root to match the transactions and
/// the hash to satisfy the declared difficulty.
pub fn check_block_hash(block: &Block) -> bool {
    if Block::calculate_merkle_root(&block.transactions) != block.header.merkle_root {
        return false;
    }
    let computed = block.compute_hash();
    computed == block.hash && Block::meets_difficulty(&computed, block.header.difficulty)
}

/// Rejects blocks that carry the same transaction twice.
pub fn validate_no_double_spend(block: &Block) -> Result<()> {
    let mut seen = HashMap::new();
    for (position, tx) in block.transactions.iter().enumerate() {
        if let Some(first) = seen.insert(*tx.id(), position) {
            return Err(ChainError::InvalidBlock(format!(
                "Transaction {} appears twice in block (positions {} and {})",
                tx.id_str(),
                first,
                position
            )));
        }
    }
    Ok(())
}
