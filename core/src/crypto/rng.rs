//! Random salt and nonce generation.
//!
//! Design notes:
//! - Salts and nonces come straight from the OS CSPRNG.
//! - Nonces are independent random values per chunk, never a counter. A
//!   fresh key is derived per encode (new salt), so random 12-byte nonces
//!   within one file cannot collide across files for the same password.

use rand::rngs::OsRng;
use rand::RngCore;

use crate::constants::{NONCE_LEN, SALT_LEN};

/// 16 cryptographically random bytes for the file header.
pub fn generate_salt() -> [u8; SALT_LEN] {
    let mut salt = [0u8; SALT_LEN];
    OsRng.fill_bytes(&mut salt);
    salt
}

/// 12 cryptographically random bytes, one per chunk.
pub fn generate_nonce() -> [u8; NONCE_LEN] {
    let mut nonce = [0u8; NONCE_LEN];
    OsRng.fill_bytes(&mut nonce);
    nonce
}
