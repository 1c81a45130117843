//! Session context
//!
//! An explicit, injectable object holding the per-session secrets the
//! persistence layer needs: the unlock passphrase, the PIN-wrapped
//! service-account credential, and the cached remote access token. Replaces
//! any notion of ambient module-level key or token state; lifecycle is tied
//! to whoever owns the `Arc`.

use std::sync::{Arc, RwLock};

use async_trait::async_trait;

use crate::crypto::{self, EncryptedPackage, SecureString};
use crate::error::{LedgerError, LedgerResult};

/// Exchanges a credential for a fresh access token
///
/// The actual OAuth/service-account token exchange is an external
/// collaborator; implementations live outside this crate (tests use a
/// canned one).
#[async_trait]
pub trait TokenProvider: Send + Sync {
    /// Obtain a fresh access token
    async fn fetch_token(&self) -> LedgerResult<String>;
}

/// Per-session secret holder
pub struct SessionContext {
    passphrase: RwLock<Option<SecureString>>,
    wrapped_credential: RwLock<Option<String>>,
    access_token: RwLock<Option<String>>,
    token_provider: Option<Arc<dyn TokenProvider>>,
}

impl SessionContext {
    /// Create a session with no secrets and no token provider
    pub fn new() -> Self {
        Self {
            passphrase: RwLock::new(None),
            wrapped_credential: RwLock::new(None),
            access_token: RwLock::new(None),
            token_provider: None,
        }
    }

    /// Create a session that can mint access tokens
    pub fn with_token_provider(provider: Arc<dyn TokenProvider>) -> Self {
        Self {
            token_provider: Some(provider),
            ..Self::new()
        }
    }

    // --- passphrase / encryption ---

    /// Whether an encryption passphrase is currently configured
    pub fn is_unlocked(&self) -> bool {
        self.passphrase
            .read()
            .map(|guard| guard.is_some())
            .unwrap_or(false)
    }

    /// Configure the encryption passphrase
    pub fn set_passphrase(&self, passphrase: impl Into<SecureString>) {
        if let Ok(mut guard) = self.passphrase.write() {
            *guard = Some(passphrase.into());
        }
    }

    /// Drop the passphrase, returning the session to the locked state
    pub fn lock(&self) {
        if let Ok(mut guard) = self.passphrase.write() {
            *guard = None;
        }
    }

    /// Encrypt a serialized value with the session passphrase
    ///
    /// Returns `Ok(None)` when no passphrase is configured, in which case
    /// the caller stores plaintext.
    pub fn encrypt_value(&self, plaintext: &str) -> LedgerResult<Option<EncryptedPackage>> {
        let guard = self
            .passphrase
            .read()
            .map_err(|_| LedgerError::Encryption("Session lock poisoned".into()))?;
        match guard.as_ref() {
            Some(passphrase) => crypto::encrypt(plaintext, passphrase.as_str()).map(Some),
            None => Ok(None),
        }
    }

    /// Decrypt a package with the session passphrase
    ///
    /// Errors with [`LedgerError::DecryptionFailed`] on a wrong passphrase
    /// or corrupted package. Calling this while locked is a caller bug; it
    /// also surfaces as `DecryptionFailed`.
    pub fn decrypt_value(&self, package: &EncryptedPackage) -> LedgerResult<String> {
        let guard = self
            .passphrase
            .read()
            .map_err(|_| LedgerError::DecryptionFailed)?;
        let passphrase = guard.as_ref().ok_or(LedgerError::DecryptionFailed)?;
        crypto::decrypt(package, passphrase.as_str())
    }

    // --- wrapped credential ---

    /// Store a PIN-wrapped credential token for later unwrapping
    pub fn store_wrapped_credential(&self, token: impl Into<String>) {
        if let Ok(mut guard) = self.wrapped_credential.write() {
            *guard = Some(token.into());
        }
    }

    /// The stored wrapped credential token, if any
    pub fn wrapped_credential(&self) -> Option<String> {
        self.wrapped_credential
            .read()
            .ok()
            .and_then(|guard| guard.clone())
    }

    /// Unwrap the stored credential with a PIN
    pub fn unwrap_credential(&self, pin: &str) -> LedgerResult<SecureString> {
        let token = self
            .wrapped_credential()
            .ok_or_else(|| LedgerError::Config("No wrapped credential stored".into()))?;
        crypto::unwrap_credential(&token, pin).map(SecureString::from)
    }

    // --- access token ---

    /// The cached access token, if any
    pub fn access_token(&self) -> Option<String> {
        self.access_token.read().ok().and_then(|guard| guard.clone())
    }

    /// Cache an access token obtained out of band
    pub fn set_access_token(&self, token: impl Into<String>) {
        if let Ok(mut guard) = self.access_token.write() {
            *guard = Some(token.into());
        }
    }

    /// Fetch a fresh token from the provider and cache it
    ///
    /// Called by the persistence layer exactly once per auth-expiry before
    /// giving up on the remote store.
    pub async fn refresh_access_token(&self) -> LedgerResult<String> {
        let provider = self
            .token_provider
            .as_ref()
            .ok_or(LedgerError::AuthExpired)?;
        let token = provider.fetch_token().await?;
        self.set_access_token(token.clone());
        Ok(token)
    }
}

impl Default for SessionContext {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Debug for SessionContext {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SessionContext")
            .field("unlocked", &self.is_unlocked())
            .field("has_token", &self.access_token().is_some())
            .finish()
    }
}
