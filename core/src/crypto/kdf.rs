//! Password-to-key derivation.
//!
//! Design notes:
//! - PBKDF2-HMAC-SHA-256 with 600,000 iterations and a 256-bit output. Both
//!   parameters are format constants; changing either is a version bump.
//! - The derived key lives only for one encode or one decode and is wiped
//!   on drop. It is never written anywhere; only the salt goes in the file.

use pbkdf2::pbkdf2_hmac;
use sha2::Sha256;
use zeroize::{Zeroize, ZeroizeOnDrop};

use crate::constants::{KEY_LEN, PBKDF2_ITERATIONS, SALT_LEN};

/// A derived AES-256 key, zeroized when dropped.
#[derive(Zeroize, ZeroizeOnDrop)]
pub struct DerivedKey([u8; KEY_LEN]);

impl DerivedKey {
    pub fn as_bytes(&self) -> &[u8; KEY_LEN] {
        &self.0
    }
}

/// Stretch a password and header salt into the per-file AES-256 key.
///
/// Deterministic: the same `(password, salt)` pair always yields the same
/// key, which is what lets a decoder reconstruct it from the header salt.
pub fn derive_key(password: &str, salt: &[u8; SALT_LEN]) -> DerivedKey {
    let mut key = [0u8; KEY_LEN];
    pbkdf2_hmac::<Sha256>(password.as_bytes(), salt, PBKDF2_ITERATIONS, &mut key);
    DerivedKey(key)
}

#[cfg(test)]
mod tests {
    use super::*;

    // One-iteration variant so the unit tests stay fast; the real iteration
    // count is exercised by the integration round-trips.
    fn derive_fast(password: &str, salt: &[u8; SALT_LEN]) -> [u8; KEY_LEN] {
        let mut key = [0u8; KEY_LEN];
        pbkdf2_hmac::<Sha256>(password.as_bytes(), salt, 1, &mut key);
        key
    }

    #[test]
    fn derivation_is_deterministic() {
        let salt = [7u8; SALT_LEN];
        assert_eq!(derive_fast("pw", &salt), derive_fast("pw", &salt));
    }

    #[test]
    fn password_and_salt_both_matter() {
        let salt_a = [1u8; SALT_LEN];
        let salt_b = [2u8; SALT_LEN];
        assert_ne!(derive_fast("pw", &salt_a), derive_fast("pw", &salt_b));
        assert_ne!(derive_fast("pw", &salt_a), derive_fast("pw2", &salt_a));
    }

    #[test]
    fn empty_password_is_allowed() {
        let salt = [3u8; SALT_LEN];
        // An empty password is weak but valid; the format does not forbid it.
        assert_eq!(derive_fast("", &salt), derive_fast("", &salt));
    }
}
