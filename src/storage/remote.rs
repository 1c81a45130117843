//! Remote key-value store
//!
//! The remote side is a tenant-scoped key-value service speaking JSON over
//! authenticated HTTP. A 404 on GET means the key is absent, not an error;
//! a 401 means the access token expired and the caller may refresh it once.

use std::collections::HashMap;
use std::sync::Arc;

use async_trait::async_trait;
use reqwest::StatusCode;
use serde_json::Value;
use tokio::sync::RwLock;
use tracing::debug;

use crate::error::{LedgerError, LedgerResult};
use crate::session::SessionContext;

/// A remote key-value backend
#[async_trait]
pub trait RemoteStore: Send + Sync {
    /// Fetch the record for a key; `None` means absent
    async fn get(&self, key: &str) -> LedgerResult<Option<Value>>;

    /// Write the record for a key
    async fn put(&self, key: &str, value: &Value) -> LedgerResult<()>;
}

/// HTTP implementation of [`RemoteStore`]
///
/// Keys map to `{base_url}/tenants/{tenant}/keys/{key}`; values are arbitrary
/// JSON bodies. The bearer token comes from the session; this type never
/// refreshes it itself (the persistence adapter owns the retry-once policy).
pub struct HttpRemoteStore {
    client: reqwest::Client,
    base_url: String,
    tenant: String,
    session: Arc<SessionContext>,
}

impl HttpRemoteStore {
    /// Create a client for one tenant
    pub fn new(
        base_url: impl Into<String>,
        tenant: impl Into<String>,
        session: Arc<SessionContext>,
    ) -> LedgerResult<Self> {
        let client = reqwest::Client::builder()
            .timeout(std::time::Duration::from_secs(30))
            .build()
            .map_err(|e| LedgerError::Config(format!("Failed to build HTTP client: {}", e)))?;

        Ok(Self {
            client,
            base_url: base_url.into().trim_end_matches('/').to_string(),
            tenant: tenant.into(),
            session,
        })
    }

    fn url_for(&self, key: &str) -> String {
        format!("{}/tenants/{}/keys/{}", self.base_url, self.tenant, key)
    }

    fn bearer_token(&self) -> LedgerResult<String> {
        self.session.access_token().ok_or(LedgerError::AuthExpired)
    }

    fn map_status(status: StatusCode) -> LedgerError {
        if status == StatusCode::UNAUTHORIZED || status == StatusCode::FORBIDDEN {
            LedgerError::AuthExpired
        } else {
            LedgerError::RemoteUnavailable(format!("HTTP {}", status))
        }
    }
}

#[async_trait]
impl RemoteStore for HttpRemoteStore {
    async fn get(&self, key: &str) -> LedgerResult<Option<Value>> {
        let token = self.bearer_token()?;
        debug!(key, "remote get");

        let response = self
            .client
            .get(self.url_for(key))
            .bearer_auth(token)
            .send()
            .await
            .map_err(|e| LedgerError::RemoteUnavailable(e.to_string()))?;

        match response.status() {
            StatusCode::NOT_FOUND => Ok(None),
            status if status.is_success() => {
                let value = response
                    .json::<Value>()
                    .await
                    .map_err(|e| LedgerError::RemoteUnavailable(e.to_string()))?;
                Ok(Some(value))
            }
            status => Err(Self::map_status(status)),
        }
    }

    async fn put(&self, key: &str, value: &Value) -> LedgerResult<()> {
        let token = self.bearer_token()?;
        debug!(key, "remote put");

        let response = self
            .client
            .put(self.url_for(key))
            .bearer_auth(token)
            .json(value)
            .send()
            .await
            .map_err(|e| LedgerError::RemoteUnavailable(e.to_string()))?;

        let status = response.status();
        if status.is_success() {
            Ok(())
        } else {
            Err(Self::map_status(status))
        }
    }
}

/// In-memory implementation of [`RemoteStore`]
///
/// Useful for tests and for embedding without a network dependency.
#[derive(Default)]
pub struct MemoryRemoteStore {
    records: RwLock<HashMap<String, Value>>,
}

impl MemoryRemoteStore {
    /// Create an empty store
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of stored records
    pub async fn len(&self) -> usize {
        self.records.read().await.len()
    }

    /// Whether the store has no records
    pub async fn is_empty(&self) -> bool {
        self.records.read().await.is_empty()
    }
}

#[async_trait]
impl RemoteStore for MemoryRemoteStore {
    async fn get(&self, key: &str) -> LedgerResult<Option<Value>> {
        Ok(self.records.read().await.get(key).cloned())
    }

    async fn put(&self, key: &str, value: &Value) -> LedgerResult<()> {
        self.records
            .write()
            .await
            .insert(key.to_string(), value.clone());
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[tokio::test]
    async fn test_memory_store_round_trip() {
        let store = MemoryRemoteStore::new();
        assert!(store.get("meta").await.unwrap().is_none());

        store.put("meta", &json!({"v": 1})).await.unwrap();
        assert_eq!(store.get("meta").await.unwrap(), Some(json!({"v": 1})));
        assert_eq!(store.len().await, 1);
    }

    #[tokio::test]
    async fn test_memory_store_overwrites() {
        let store = MemoryRemoteStore::new();
        store.put("bills-2025", &json!([1])).await.unwrap();
        store.put("bills-2025", &json!([1, 2])).await.unwrap();
        assert_eq!(
            store.get("bills-2025").await.unwrap(),
            Some(json!([1, 2]))
        );
    }

    #[test]
    fn test_http_store_url_layout() {
        let session = Arc::new(SessionContext::new());
        let store =
            HttpRemoteStore::new("https://kv.example/", "house-1", Arc::clone(&session)).unwrap();
        assert_eq!(
            store.url_for("bills-2025"),
            "https://kv.example/tenants/house-1/keys/bills-2025"
        );
    }

    #[tokio::test]
    async fn test_http_store_without_token_is_auth_expired() {
        let session = Arc::new(SessionContext::new());
        let store = HttpRemoteStore::new("https://kv.example", "house-1", session).unwrap();
        assert!(matches!(
            store.get("meta").await,
            Err(LedgerError::AuthExpired)
        ));
    }
}
