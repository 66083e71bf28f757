//! Key material for RaceChain users

use once_cell::sync::Lazy;
use rand::rngs::OsRng;
use secp256k1::{constants::PUBLIC_KEY_SIZE, All, PublicKey, Secp256k1, SecretKey};
use sha2::{Digest, Sha256};

/// A thread-safe, lazily initialized Secp256k1 context.
static SECP256K1_CONTEXT: Lazy<Secp256k1<All>> = Lazy::new(Secp256k1::new);

/// A user's identity: the SHA-256 hash of their compressed public key.
pub type Address = [u8; 32];

/// Creates an address by hashing an arbitrary string.
/// Useful for testing and debugging.
pub fn address_from_string(s: &str) -> Address {
    let mut hasher = Sha256::new();
    hasher.update(s.as_bytes());
    hasher.finalize().into()
}

/// Convert an address to a hex string for display.
pub fn address_to_hex(addr: &Address) -> String {
    hex::encode(addr)
}

/// Abbreviated hex form used in log lines.
pub fn short_hex(bytes: &[u8]) -> String {
    let full = hex::encode(bytes);
    if full.len() > 16 {
        format!("{}..{}", &full[..8], &full[full.len() - 8..])
    } else {
        full
    }
}

/// Computes the address of a public key (SHA-256 hash of its compressed form).
pub fn address_of(public_key: &PublicKey) -> Address {
    let pubkey_bytes: [u8; PUBLIC_KEY_SIZE] = public_key.serialize();
    Sha256::digest(pubkey_bytes).into()
}

/// Draws a fresh secret key from the OS random number generator and returns
/// the address of its public key. The secret key is not kept.
pub fn generate_address() -> Address {
    let secret_key = SecretKey::new(&mut OsRng);
    let public_key = PublicKey::from_secret_key(&SECP256K1_CONTEXT, &secret_key);
    address_of(&public_key)
}
