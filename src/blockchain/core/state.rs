use crate::crypto::{address_to_hex, Address};
use crate::error::{ChainError, Result};
use crate::transaction::Transaction;
use std::collections::HashMap;

/// A ledger participant.
#[derive(Debug, Clone, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
pub struct User {
    pub public_key: Address,
    pub name: String,
    pub balance: u64,
}

impl User {
    pub fn new(name: impl Into<String>, public_key: Address, balance: u64) -> Self {
        Self {
            public_key,
            name: name.into(),
            balance,
        }
    }
}

/// Users and their balances.
///
/// Cloning a ledger yields an independent snapshot; nothing is shared between
/// the copy and the original.
#[derive(Debug, Clone, Default)]
pub struct Ledger {
    users: Vec<User>,
    index: HashMap<Address, usize>,
}

impl Ledger {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn from_users(users: Vec<User>) -> Self {
        let mut ledger = Self::new();
        for user in users {
            ledger.add_user(user);
        }
        ledger
    }

    /// Registers a user. A user with an already known key replaces the old entry.
    pub fn add_user(&mut self, user: User) {
        match self.index.get(&user.public_key) {
            Some(&i) => self.users[i] = user,
            None => {
                self.index.insert(user.public_key, self.users.len());
                self.users.push(user);
            }
        }
    }

    pub fn users(&self) -> &[User] {
        &self.users
    }

    pub fn len(&self) -> usize {
        self.users.len()
    }

    pub fn is_empty(&self) -> bool {
        self.users.is_empty()
    }

    pub fn find_by_identity(&self, public_key: &Address) -> Result<&User> {
        self.index
            .get(public_key)
            .map(|&i| &self.users[i])
            .ok_or_else(|| ChainError::UserNotFound(address_to_hex(public_key)))
    }

    pub fn find_by_name(&self, name: &str) -> Result<&User> {
        self.users
            .iter()
            .find(|u| u.name == name)
            .ok_or_else(|| ChainError::UserNotFound(name.to_string()))
    }

    pub fn balance_of(&self, public_key: &Address) -> Result<u64> {
        self.find_by_identity(public_key).map(|u| u.balance)
    }

    /// Sum of all balances. Transfers never change it.
    pub fn total_supply(&self) -> u128 {
        self.users.iter().map(|u| u.balance as u128).sum()
    }

    /// Moves `tx.amount` from the sender to the recipient.
    ///
    /// Callers are expected to have checked affordability. A transfer the
    /// sender cannot cover is refused and leaves the ledger unchanged.
    pub fn apply_transaction(&mut self, tx: &Transaction) -> Result<()> {
        let sender_idx = self.position(tx.sender())?;
        let recipient_idx = self.position(tx.recipient())?;
        if sender_idx == recipient_idx {
            return Err(ChainError::InvalidTransaction(format!(
                "{} sends to its own sender",
                tx.id_str()
            )));
        }

        let sender = &self.users[sender_idx];
        let debited = sender.balance.checked_sub(tx.amount()).ok_or_else(|| {
            ChainError::InsufficientBalance(format!(
                "{} has {} but {} needs {}",
                sender.name,
                sender.balance,
                tx.id_str(),
                tx.amount()
            ))
        })?;
        let credited = self.users[recipient_idx]
            .balance
            .checked_add(tx.amount())
            .ok_or_else(|| {
                ChainError::InvalidTransaction(format!(
                    "Balance overflow crediting {}",
                    self.users[recipient_idx].name
                ))
            })?;

        self.users[sender_idx].balance = debited;
        self.users[recipient_idx].balance = credited;
        Ok(())
    }

    fn position(&self, public_key: &Address) -> Result<usize> {
        self.index
            .get(public_key)
            .copied()
            .ok_or_else(|| ChainError::UserNotFound(address_to_hex(public_key)))
    }
}
