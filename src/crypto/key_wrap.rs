//! PIN-based credential wrapping
//!
//! Seals a long-lived credential blob (typically a service-account key)
//! under a key derived from a short PIN, producing a compact dot-separated
//! token that round-trips through a single string field. The token header
//! embeds its algorithm identifiers so the format is self-describing.
//!
//! This path is intentionally weaker than the passphrase path: the wrapping
//! key is a single unsalted SHA-256 of the PIN (see
//! [`super::key_derivation::derive_wrapping_key`]).

use aes_gcm::aead::rand_core::RngCore;
use aes_gcm::aead::{Aead, KeyInit, OsRng};
use aes_gcm::{Aes256Gcm, Nonce};
use base64::engine::general_purpose::URL_SAFE_NO_PAD;
use base64::Engine;
use serde::{Deserialize, Serialize};

use crate::error::{LedgerError, LedgerResult};

use super::key_derivation::derive_wrapping_key;

const NONCE_SIZE: usize = 12;

/// Token header naming the sealing algorithm
#[derive(Debug, PartialEq, Eq, Serialize, Deserialize)]
struct TokenHeader {
    alg: String,
    enc: String,
}

impl TokenHeader {
    fn current() -> Self {
        Self {
            alg: "dir".into(),
            enc: "A256GCM".into(),
        }
    }
}

/// Wrap a credential string under a PIN
///
/// Token format: `base64url(header).base64url(nonce).base64url(ciphertext)`,
/// with the GCM tag appended to the ciphertext segment.
pub fn wrap_credential(credential: &str, pin: &str) -> LedgerResult<String> {
    let key = derive_wrapping_key(pin);
    let cipher = Aes256Gcm::new_from_slice(key.as_bytes())
        .map_err(|e| LedgerError::Encryption(format!("Failed to create cipher: {}", e)))?;

    let mut nonce_bytes = [0u8; NONCE_SIZE];
    OsRng.fill_bytes(&mut nonce_bytes);
    let nonce = Nonce::from_slice(&nonce_bytes);

    let ciphertext = cipher
        .encrypt(nonce, credential.as_bytes())
        .map_err(|e| LedgerError::Encryption(format!("Wrapping failed: {}", e)))?;

    let header = serde_json::to_vec(&TokenHeader::current())
        .map_err(|e| LedgerError::Encryption(format!("Header encoding failed: {}", e)))?;

    Ok(format!(
        "{}.{}.{}",
        URL_SAFE_NO_PAD.encode(header),
        URL_SAFE_NO_PAD.encode(nonce_bytes),
        URL_SAFE_NO_PAD.encode(&ciphertext),
    ))
}

/// Unwrap a credential token with a PIN
///
/// All failure modes — malformed token, unknown algorithm, wrong PIN,
/// tampered ciphertext — collapse into the uniform
/// [`LedgerError::DecryptionFailed`].
pub fn unwrap_credential(token: &str, pin: &str) -> LedgerResult<String> {
    let mut segments = token.split('.');
    let (header_b64, nonce_b64, data_b64) = match (
        segments.next(),
        segments.next(),
        segments.next(),
        segments.next(),
    ) {
        (Some(h), Some(n), Some(d), None) => (h, n, d),
        _ => return Err(LedgerError::DecryptionFailed),
    };

    let decode = |segment: &str| -> LedgerResult<Vec<u8>> {
        URL_SAFE_NO_PAD
            .decode(segment)
            .map_err(|_| LedgerError::DecryptionFailed)
    };

    let header: TokenHeader =
        serde_json::from_slice(&decode(header_b64)?).map_err(|_| LedgerError::DecryptionFailed)?;
    if header != TokenHeader::current() {
        return Err(LedgerError::DecryptionFailed);
    }

    let nonce_bytes = decode(nonce_b64)?;
    if nonce_bytes.len() != NONCE_SIZE {
        return Err(LedgerError::DecryptionFailed);
    }

    let ciphertext = decode(data_b64)?;

    let key = derive_wrapping_key(pin);
    let cipher =
        Aes256Gcm::new_from_slice(key.as_bytes()).map_err(|_| LedgerError::DecryptionFailed)?;

    let plaintext = cipher
        .decrypt(Nonce::from_slice(&nonce_bytes), ciphertext.as_ref())
        .map_err(|_| LedgerError::DecryptionFailed)?;

    String::from_utf8(plaintext).map_err(|_| LedgerError::DecryptionFailed)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_round_trip() {
        let token = wrap_credential("{\"type\":\"service_account\"}", "1234").unwrap();
        let unwrapped = unwrap_credential(&token, "1234").unwrap();
        assert_eq!(unwrapped, "{\"type\":\"service_account\"}");
    }

    #[test]
    fn test_token_is_single_line_string() {
        let token = wrap_credential("blob", "0000").unwrap();
        assert_eq!(token.split('.').count(), 3);
        assert!(!token.contains('\n'));
        assert!(!token.contains('='));
    }

    #[test]
    fn test_header_embeds_algorithm() {
        let token = wrap_credential("blob", "0000").unwrap();
        let header_b64 = token.split('.').next().unwrap();
        let header = URL_SAFE_NO_PAD.decode(header_b64).unwrap();
        let header: serde_json::Value = serde_json::from_slice(&header).unwrap();
        assert_eq!(header["alg"], "dir");
        assert_eq!(header["enc"], "A256GCM");
    }

    #[test]
    fn test_wrong_pin_fails() {
        let token = wrap_credential("blob", "1234").unwrap();
        assert!(unwrap_credential(&token, "4321")
            .unwrap_err()
            .is_decryption_failed());
    }

    #[test]
    fn test_malformed_tokens_fail_uniformly() {
        for bad in ["", "a.b", "a.b.c.d", "!!!.???.###"] {
            assert!(
                unwrap_credential(bad, "1234").unwrap_err().is_decryption_failed(),
                "token {:?} not rejected",
                bad
            );
        }
    }

    #[test]
    fn test_tampered_ciphertext_fails() {
        let token = wrap_credential("blob", "1234").unwrap();
        let mut parts: Vec<&str> = token.split('.').collect();
        let mut data = URL_SAFE_NO_PAD.decode(parts[2]).unwrap();
        data[0] ^= 0xFF;
        let tampered = URL_SAFE_NO_PAD.encode(&data);
        parts[2] = &tampered;
        let token = parts.join(".");

        assert!(unwrap_credential(&token, "1234")
            .unwrap_err()
            .is_decryption_failed());
    }
}
