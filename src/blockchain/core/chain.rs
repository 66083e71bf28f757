use crate::error::{ChainError, Result};
use crate::transaction::Transaction;
use sha2::{Digest, Sha256};

pub type Sha256Hash = [u8; 32];

/// Version marker written into every block produced by this crate.
pub const BLOCK_VERSION: u32 = 1;

/// Fixed genesis timestamp so every node starts from the same tip.
const GENESIS_TIMESTAMP: u64 = 1672531200000;

#[derive(Debug, Clone, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
pub struct BlockHeader {
    pub height: u64,
    pub version: u32,
    pub timestamp: u64,
    pub previous_hash: Sha256Hash,
    pub merkle_root: Sha256Hash,
    /// Required number of leading zero bits in the block hash.
    pub difficulty: u32,
    pub nonce: u64,
}

impl BlockHeader {
    pub fn hash(&self) -> Sha256Hash {
        let mut hasher = Sha256::new();
        hasher.update(self.height.to_le_bytes());
        hasher.update(self.version.to_le_bytes());
        hasher.update(self.timestamp.to_le_bytes());
        hasher.update(self.previous_hash);
        hasher.update(self.merkle_root);
        hasher.update(self.difficulty.to_le_bytes());
        hasher.update(self.nonce.to_le_bytes());
        hasher.finalize().into()
    }
}

#[derive(Debug, Clone, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
pub struct Block {
    pub header: BlockHeader,
    /// Declared hash, filled in by the miner.
    pub hash: Sha256Hash,
    pub transactions: Vec<Transaction>,
}

impl Block {
    /// Builds an unmined candidate block on top of `previous_hash`.
    pub fn new(
        height: u64,
        previous_hash: Sha256Hash,
        difficulty: u32,
        version: u32,
        transactions: Vec<Transaction>,
    ) -> Self {
        let timestamp = chrono::Utc::now().timestamp_millis() as u64;
        let merkle_root = Block::calculate_merkle_root(&transactions);

        Block {
            header: BlockHeader {
                height,
                version,
                timestamp,
                previous_hash,
                merkle_root,
                difficulty,
                nonce: 0,
            },
            hash: [0u8; 32],
            transactions,
        }
    }

    /// Hash recomputed from the header, independent of the declared `hash`.
    pub fn compute_hash(&self) -> Sha256Hash {
        self.header.hash()
    }

    pub fn hash_str(&self) -> String {
        hex::encode(self.hash)
    }

    pub fn calculate_merkle_root(transactions: &[Transaction]) -> Sha256Hash {
        let mut hasher = Sha256::new();
        for tx in transactions {
            hasher.update(tx.id());
        }
        hasher.finalize().into()
    }

    pub fn hash_to_target(difficulty: &u32) -> [u8; 32] {
        let mut target = [0xFF; 32];
        let leading_zeros = (*difficulty / 8).min(32);
        let partial_bits = *difficulty % 8;

        for item in target.iter_mut().take(leading_zeros as usize) {
            *item = 0;
        }

        if leading_zeros < 32 && partial_bits > 0 {
            target[leading_zeros as usize] = 0xFF >> partial_bits;
        }
        target
    }

    /// Difficulty predicate: the hash, read big-endian, is at most the target.
    pub fn meets_difficulty(hash: &Sha256Hash, difficulty: u32) -> bool {
        *hash <= Block::hash_to_target(&difficulty)
    }
}

/// The authoritative, append-only sequence of committed blocks.
#[derive(Debug, Clone)]
pub struct Blockchain {
    blocks: Vec<Block>,
    difficulty: u32,
}

impl Blockchain {
    /// Creates a chain holding only the genesis block. `difficulty` is the
    /// minimum every later block must declare.
    pub fn new(difficulty: u32) -> Self {
        Blockchain {
            blocks: vec![Self::create_genesis_block()],
            difficulty,
        }
    }

    fn create_genesis_block() -> Block {
        let transactions = vec![];
        let merkle_root = Block::calculate_merkle_root(&transactions);

        let header = BlockHeader {
            height: 0,
            version: BLOCK_VERSION,
            timestamp: GENESIS_TIMESTAMP,
            previous_hash: [0u8; 32],
            merkle_root,
            difficulty: 0,
            nonce: 0,
        };
        let hash = header.hash();

        Block {
            header,
            hash,
            transactions,
        }
    }

    pub fn blocks(&self) -> &[Block] {
        &self.blocks
    }

    /// Number of committed blocks, genesis included.
    pub fn len(&self) -> usize {
        self.blocks.len()
    }

    pub fn is_empty(&self) -> bool {
        self.blocks.is_empty()
    }

    pub fn last_block(&self) -> Option<&Block> {
        self.blocks.last()
    }

    pub fn last_block_hash(&self) -> Sha256Hash {
        self.blocks.last().map(|b| b.hash).unwrap_or([0u8; 32])
    }

    /// Appends a mined block after checking that it links onto the current tip.
    pub fn append(&mut self, block: Block) -> Result<()> {
        let expected_height = self.blocks.len() as u64;
        if block.header.height != expected_height {
            return Err(ChainError::InvalidBlock(format!(
                "Invalid block height. Expected {}, but got {}.",
                expected_height, block.header.height
            )));
        }

        let tip = self.last_block_hash();
        if block.header.previous_hash != tip {
            return Err(ChainError::InvalidBlock(format!(
                "Invalid previous block hash. Expected {}, but got {}.",
                hex::encode(tip),
                hex::encode(block.header.previous_hash)
            )));
        }

        if block.header.difficulty < self.difficulty {
            return Err(ChainError::InvalidBlock(format!(
                "Block difficulty {} is below the chain minimum {}.",
                block.header.difficulty, self.difficulty
            )));
        }

        self.blocks.push(block);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_genesis_block() {
        let chain = Blockchain::new(4);
        assert_eq!(chain.len(), 1);
        let genesis = chain.last_block().unwrap();
        assert_eq!(genesis.header.height, 0);
        assert_eq!(genesis.hash, genesis.compute_hash());
        assert_eq!(chain.last_block_hash(), genesis.hash);
    }

    #[test]
    fn test_hash_to_target() {
        assert_eq!(Block::hash_to_target(&0), [0xFF; 32]);

        let target = Block::hash_to_target(&12);
        assert_eq!(target[0], 0);
        assert_eq!(target[1], 0x0F);
        assert_eq!(target[2], 0xFF);

        assert_eq!(Block::hash_to_target(&256), [0u8; 32]);
    }

    #[test]
    fn test_meets_difficulty() {
        let mut hash = [0xFFu8; 32];
        assert!(Block::meets_difficulty(&hash, 0));
        assert!(!Block::meets_difficulty(&hash, 1));
        hash[0] = 0x00;
        hash[1] = 0x7F;
        assert!(Block::meets_difficulty(&hash, 9));
        assert!(!Block::meets_difficulty(&hash, 10));
    }

    #[test]
    fn test_append_rejects_bad_linkage() {
        let mut chain = Blockchain::new(0);

        let mut wrong_parent = Block::new(1, [7u8; 32], 0, BLOCK_VERSION, vec![]);
        wrong_parent.hash = wrong_parent.compute_hash();
        assert!(matches!(
            chain.append(wrong_parent),
            Err(ChainError::InvalidBlock(_))
        ));

        let mut wrong_height = Block::new(5, chain.last_block_hash(), 0, BLOCK_VERSION, vec![]);
        wrong_height.hash = wrong_height.compute_hash();
        assert!(chain.append(wrong_height).is_err());

        let mut good = Block::new(1, chain.last_block_hash(), 0, BLOCK_VERSION, vec![]);
        good.hash = good.compute_hash();
        chain.append(good.clone()).unwrap();
        assert_eq!(chain.len(), 2);
        assert_eq!(chain.last_block_hash(), good.hash);
    }

    #[test]
    fn test_append_rejects_easier_difficulty() {
        let mut chain = Blockchain::new(8);
        let block = Block::new(1, chain.last_block_hash(), 2, BLOCK_VERSION, vec![]);
        let result = chain.append(block);
        assert!(result.unwrap_err().to_string().contains("below the chain minimum"));
    }
}
