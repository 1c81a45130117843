//! Key derivation from passphrases
//!
//! Derives AES-256 keys with PBKDF2-HMAC-SHA256. The iteration count and
//! salt size match the wire format spoken by interoperating stores, so they
//! are fixed constants rather than tunable parameters.

use aes_gcm::aead::rand_core::RngCore;
use aes_gcm::aead::OsRng;
use pbkdf2::pbkdf2_hmac;
use sha2::{Digest, Sha256};
use zeroize::{Zeroize, ZeroizeOnDrop};

/// PBKDF2 iteration count
pub const PBKDF2_ITERATIONS: u32 = 100_000;

/// Size of the random salt in bytes
pub const SALT_SIZE: usize = 16;

/// A derived 256-bit encryption key, zeroed on drop
#[derive(Zeroize, ZeroizeOnDrop)]
pub struct DerivedKey {
    key: [u8; 32],
}

impl DerivedKey {
    /// Get the key bytes
    pub fn as_bytes(&self) -> &[u8; 32] {
        &self.key
    }
}

/// Generate a fresh random salt
///
/// Every encryption call must use a new salt; reusing one silently weakens
/// the derived keys across packages.
pub fn generate_salt() -> [u8; SALT_SIZE] {
    let mut salt = [0u8; SALT_SIZE];
    OsRng.fill_bytes(&mut salt);
    salt
}

/// Derive an encryption key from a passphrase and salt
pub fn derive_key(passphrase: &str, salt: &[u8]) -> DerivedKey {
    let mut key = [0u8; 32];
    pbkdf2_hmac::<Sha256>(passphrase.as_bytes(), salt, PBKDF2_ITERATIONS, &mut key);
    DerivedKey { key }
}

/// Derive the PIN wrapping key: a single unsalted SHA-256 pass
///
/// Deliberately weaker than [`derive_key`]: there is no salt and no
/// stretching, trading offline brute-force resistance for a deterministic,
/// compact token format. The wrapped content is short-lived credential
/// material, not ledger data.
pub fn derive_wrapping_key(pin: &str) -> DerivedKey {
    let digest = Sha256::digest(pin.as_bytes());
    let mut key = [0u8; 32];
    key.copy_from_slice(&digest);
    DerivedKey { key }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_derive_key_is_deterministic() {
        let salt = generate_salt();
        let key1 = derive_key("test_passphrase", &salt);
        let key2 = derive_key("test_passphrase", &salt);
        assert_eq!(key1.as_bytes(), key2.as_bytes());
    }

    #[test]
    fn test_different_passphrase_different_key() {
        let salt = generate_salt();
        let key1 = derive_key("passphrase1", &salt);
        let key2 = derive_key("passphrase2", &salt);
        assert_ne!(key1.as_bytes(), key2.as_bytes());
    }

    #[test]
    fn test_different_salt_different_key() {
        let key1 = derive_key("same_passphrase", &generate_salt());
        let key2 = derive_key("same_passphrase", &generate_salt());
        assert_ne!(key1.as_bytes(), key2.as_bytes());
    }

    #[test]
    fn test_salts_are_fresh() {
        assert_ne!(generate_salt(), generate_salt());
    }

    #[test]
    fn test_wrapping_key_needs_no_salt() {
        let key1 = derive_wrapping_key("1234");
        let key2 = derive_wrapping_key("1234");
        assert_eq!(key1.as_bytes(), key2.as_bytes());

        let other = derive_wrapping_key("4321");
        assert_ne!(key1.as_bytes(), other.as_bytes());
    }
}
