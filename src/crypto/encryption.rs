//! Password-based authenticated encryption
//!
//! AES-256-GCM over a PBKDF2-derived key. The output package carries its own
//! salt and nonce, so decryption needs only the package and the passphrase.
//! The `{ "data", "salt", "iv" }` JSON shape is a wire contract with
//! interoperating stores and must not change.

use aes_gcm::aead::rand_core::RngCore;
use aes_gcm::aead::{Aead, KeyInit, OsRng};
use aes_gcm::{Aes256Gcm, Nonce};
use base64::engine::general_purpose::STANDARD;
use base64::Engine;
use serde::{Deserialize, Serialize};

use crate::error::{LedgerError, LedgerResult};

use super::key_derivation::{derive_key, generate_salt, SALT_SIZE};

/// Size of the AES-GCM nonce in bytes (96 bits)
const NONCE_SIZE: usize = 12;

/// An encrypted payload with the metadata needed to decrypt it
///
/// All three fields are independently base64-encoded. Field names are part
/// of the wire format.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EncryptedPackage {
    /// Ciphertext with appended authentication tag
    pub data: String,
    /// Key-derivation salt
    pub salt: String,
    /// AES-GCM nonce
    pub iv: String,
}

impl EncryptedPackage {
    fn decode_field(value: &str) -> LedgerResult<Vec<u8>> {
        // Malformed encoding is indistinguishable from any other corruption.
        STANDARD
            .decode(value)
            .map_err(|_| LedgerError::DecryptionFailed)
    }

    /// Check whether a JSON value is shaped like an encrypted package
    ///
    /// The persistence adapter uses this to tell encrypted records from
    /// plaintext ones without attempting a decode.
    pub fn is_package(value: &serde_json::Value) -> bool {
        value.get("data").map_or(false, serde_json::Value::is_string)
            && value.get("salt").map_or(false, serde_json::Value::is_string)
            && value.get("iv").map_or(false, serde_json::Value::is_string)
    }
}

/// Encrypt a plaintext string under a passphrase
///
/// A fresh salt and nonce are generated on every call; reuse of either is a
/// confidentiality break, not a style concern.
pub fn encrypt(plaintext: &str, passphrase: &str) -> LedgerResult<EncryptedPackage> {
    let salt = generate_salt();
    let key = derive_key(passphrase, &salt);

    let cipher = Aes256Gcm::new_from_slice(key.as_bytes())
        .map_err(|e| LedgerError::Encryption(format!("Failed to create cipher: {}", e)))?;

    let mut nonce_bytes = [0u8; NONCE_SIZE];
    OsRng.fill_bytes(&mut nonce_bytes);
    let nonce = Nonce::from_slice(&nonce_bytes);

    let ciphertext = cipher
        .encrypt(nonce, plaintext.as_bytes())
        .map_err(|e| LedgerError::Encryption(format!("Encryption failed: {}", e)))?;

    Ok(EncryptedPackage {
        data: STANDARD.encode(&ciphertext),
        salt: STANDARD.encode(salt),
        iv: STANDARD.encode(nonce_bytes),
    })
}

/// Decrypt a package with a passphrase
///
/// Every failure mode — wrong passphrase, tampered ciphertext, corrupted
/// salt or nonce, invalid UTF-8 — surfaces as the single uniform
/// [`LedgerError::DecryptionFailed`].
pub fn decrypt(package: &EncryptedPackage, passphrase: &str) -> LedgerResult<String> {
    let salt = EncryptedPackage::decode_field(&package.salt)?;
    if salt.len() != SALT_SIZE {
        return Err(LedgerError::DecryptionFailed);
    }

    let nonce_bytes = EncryptedPackage::decode_field(&package.iv)?;
    if nonce_bytes.len() != NONCE_SIZE {
        return Err(LedgerError::DecryptionFailed);
    }

    let ciphertext = EncryptedPackage::decode_field(&package.data)?;

    let key = derive_key(passphrase, &salt);
    let cipher =
        Aes256Gcm::new_from_slice(key.as_bytes()).map_err(|_| LedgerError::DecryptionFailed)?;

    let plaintext = cipher
        .decrypt(Nonce::from_slice(&nonce_bytes), ciphertext.as_ref())
        .map_err(|_| LedgerError::DecryptionFailed)?;

    String::from_utf8(plaintext).map_err(|_| LedgerError::DecryptionFailed)
}
