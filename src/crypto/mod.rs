//! Cryptographic functions for housetab
//!
//! Two independent paths:
//!
//! - Passphrase encryption: PBKDF2-HMAC-SHA256 key derivation into
//!   AES-256-GCM, fresh salt and nonce per call, self-describing
//!   [`EncryptedPackage`] output.
//! - PIN key-wrapping: a deterministic SHA-256 wrapping key sealing a
//!   credential blob into a compact token. Lower security by design.

pub mod encryption;
pub mod key_derivation;
pub mod key_wrap;
pub mod secure_memory;

pub use encryption::{decrypt, encrypt, EncryptedPackage};
pub use key_derivation::{derive_key, derive_wrapping_key, generate_salt, DerivedKey};
pub use key_wrap::{unwrap_credential, wrap_credential};
pub use secure_memory::SecureString;
