/// Transaction types for RaceChain
use crate::blockchain::Sha256Hash;
use crate::crypto::Address;
use crate::error::Result;
use sha2::{Digest, Sha256};

/// Unique transaction identifier (SHA-256 over the transfer fields).
pub type TxId = Sha256Hash;

/// A transfer of `amount` from `sender` to `recipient`.
///
/// Fields are private so a transaction cannot change after its id is computed.
#[derive(Debug, Clone, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
pub struct Transaction {
    id: TxId,
    sender: Address,
    recipient: Address,
    amount: u64,
    nonce: u64,
}

impl Transaction {
    /// Creates a transaction. `nonce` disambiguates otherwise identical
    /// transfers so every transaction gets its own id.
    pub fn new(
        sender: Address,
        recipient: Address,
        amount: u64,
        nonce: u64,
    ) -> Result<Self> {
        let tx = Transaction {
            id: Self::compute_id(&sender, &recipient, amount, nonce),
            sender,
            recipient,
            amount,
            nonce,
        };
        tx.validate()?;
        Ok(tx)
    }

    pub fn compute_id(sender: &Address, recipient: &Address, amount: u64, nonce: u64) -> TxId {
        let mut hasher = Sha256::new();
        hasher.update("transfer".as_bytes());
        hasher.update(sender);
        hasher.update(recipient);
        hasher.update(amount.to_le_bytes());
        hasher.update(nonce.to_le_bytes());
        hasher.finalize().into()
    }

    pub fn id(&self) -> &TxId {
        &self.id
    }

    pub fn id_str(&self) -> String {
        hex::encode(self.id)
    }

    pub fn sender(&self) -> &Address {
        &self.sender
    }

    pub fn recipient(&self) -> &Address {
        &self.recipient
    }

    pub fn amount(&self) -> u64 {
        self.amount
    }

    pub fn nonce(&self) -> u64 {
        self.nonce
    }
}

impl std::fmt::Display for Transaction {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "tx {} : {} -> {} ({})",
            crate::crypto::short_hex(&self.id),
            crate::crypto::short_hex(&self.sender),
            crate::crypto::short_hex(&self.recipient),
            self.amount
        )
    }
}
