/// Validation logic for transactions separated from type definitions
use crate::blockchain::Ledger;
use crate::error::{ChainError, Result};
use crate::transaction::types::Transaction;

impl Transaction {
    /// Stateless checks: positive amount, distinct parties, id matches contents.
    pub fn validate(&self) -> Result<()> {
        if self.amount() == 0 {
            return Err(ChainError::InvalidTransaction(
                "Transaction amount must be greater than zero".to_string(),
            ));
        }

        if self.sender() == self.recipient() {
            return Err(ChainError::InvalidTransaction(format!(
                "Sender and recipient are the same address {}",
                hex::encode(self.sender())
            )));
        }

        let expected = Transaction::compute_id(
            self.sender(),
            self.recipient(),
            self.amount(),
            self.nonce(),
        );
        if &expected != self.id() {
            return Err(ChainError::InvalidTransaction(format!(
                "Id mismatch. Expected {}, but got {}.",
                hex::encode(expected),
                self.id_str()
            )));
        }

        Ok(())
    }

    /// Whether the sender can pay this transaction under `ledger`.
    ///
    /// Fails with `UserNotFound` when the sender is not registered.
    pub fn is_affordable(&self, ledger: &Ledger) -> Result<bool> {
        let sender = ledger.find_by_identity(self.sender())?;
        Ok(sender.balance >= self.amount())
    }
}
