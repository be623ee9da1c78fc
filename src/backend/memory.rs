//! In-memory fake of the Vault backend.
//!
//! Stores decoded JSON values under their full path and answers the five verbs
//! the way Vault would. `LIST` is emulated over the flat key space: stored keys
//! `pki/issue/a` and `pki/roles/x/y` list under `pki` as `issue/` and `roles/`.

use async_trait::async_trait;
use serde_json::{json, Value};
use std::collections::{BTreeMap, HashMap, HashSet};
use std::sync::Arc;
use tokio::sync::RwLock;
use tracing::debug;

use super::{normalize_path, Method, VaultBackend, VaultResponse};
use crate::errors::{Error, Result};

/// Lease reported on every envelope the fake produces (32 days, Vault's default max TTL).
pub const DEFAULT_LEASE_DURATION: u64 = 2_764_800;

#[derive(Debug, Default)]
struct MemoryState {
    /// Ordered so that listings come out in a stable order.
    entries: BTreeMap<String, Value>,
    /// Data returned by PUT/POST at a path, for endpoints that answer writes.
    write_responses: HashMap<String, Value>,
}

/// In-memory [`VaultBackend`] for tests.
///
/// Cloning shares the underlying store. All access is serialized through an
/// async `RwLock`, so concurrent callers observe their own writes and the
/// overwrite / not-found rules hold.
#[derive(Debug, Clone, Default)]
pub struct MemoryBackend {
    state: Arc<RwLock<MemoryState>>,
}

impl MemoryBackend {
    pub fn new() -> Self {
        Self::default()
    }

    /// Seed `value` at `path` without going through a write verb.
    pub async fn insert(&self, path: &str, value: Value) {
        let path = normalize_path(path).to_string();
        self.state.write().await.entries.insert(path, value);
    }

    /// Make PUT/POST at `path` answer with `data` wrapped in the response envelope.
    ///
    /// The request body is still stored. This is how an issuing endpoint such as
    /// `pki/issue/<role>` is faked.
    pub async fn respond_to_writes(&self, path: &str, data: Value) {
        let path = normalize_path(path).to_string();
        self.state.write().await.write_responses.insert(path, data);
    }

    /// Whether a value is stored at exactly `path`.
    pub async fn contains(&self, path: &str) -> bool {
        self.state.read().await.entries.contains_key(normalize_path(path))
    }

    /// Number of stored entries.
    pub async fn len(&self) -> usize {
        self.state.read().await.entries.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.state.read().await.entries.is_empty()
    }

    async fn dispatch(&self, method: Method, path: &str, body: Option<&[u8]>) -> Result<Vec<u8>> {
        let path = normalize_path(path);
        debug!(method = %method, path = %path, "Handling in-memory Vault request");

        match method {
            Method::Get => self.get_entry(path).await,
            Method::List => self.list_entries(path).await,
            Method::Delete => self.remove_entry(path).await,
            Method::Post | Method::Put => self.store_entry(path, body).await,
        }
    }

    async fn get_entry(&self, path: &str) -> Result<Vec<u8>> {
        let state = self.state.read().await;
        let data = state.entries.get(path).ok_or_else(|| Error::not_found(path))?;
        envelope(data.clone())
    }

    async fn list_entries(&self, path: &str) -> Result<Vec<u8>> {
        let prefix = format!("{}/", path);
        let state = self.state.read().await;

        let mut seen = HashSet::new();
        let mut keys = Vec::new();
        for key in state.entries.keys().filter(|k| k.starts_with(&prefix)) {
            let remainder = &key[prefix.len()..];
            let entry = match remainder.split_once('/') {
                Some((segment, _)) => format!("{}/", segment),
                None => remainder.to_string(),
            };
            if seen.insert(entry.clone()) {
                keys.push(entry);
            }
        }

        if keys.is_empty() {
            return Err(Error::not_found(path));
        }
        envelope(json!({ "keys": keys }))
    }

    async fn remove_entry(&self, path: &str) -> Result<Vec<u8>> {
        let mut state = self.state.write().await;
        state.entries.remove(path).ok_or_else(|| Error::not_found(path))?;
        Ok(Vec::new())
    }

    async fn store_entry(&self, path: &str, body: Option<&[u8]>) -> Result<Vec<u8>> {
        let value: Value = body
            .and_then(|bytes| serde_json::from_slice(bytes).ok())
            .ok_or_else(|| Error::bad_request(path))?;

        let mut state = self.state.write().await;
        state.entries.insert(path.to_string(), value);

        match state.write_responses.get(path) {
            Some(data) => envelope(data.clone()),
            None => Ok(Vec::new()),
        }
    }
}

fn envelope(data: Value) -> Result<Vec<u8>> {
    let response = VaultResponse {
        auth: None,
        data: Some(data),
        lease_duration: DEFAULT_LEASE_DURATION,
        lease_id: String::new(),
        renewable: false,
    };
    Ok(serde_json::to_vec(&response)?)
}

#[async_trait]
impl VaultBackend for MemoryBackend {
    async fn get(&self, path: &str) -> Result<Vec<u8>> {
        self.dispatch(Method::Get, path, None).await
    }

    async fn list(&self, path: &str) -> Result<Vec<u8>> {
        self.dispatch(Method::List, path, None).await
    }

    async fn delete(&self, path: &str) -> Result<Vec<u8>> {
        self.dispatch(Method::Delete, path, None).await
    }

    async fn post(&self, path: &str, body: Option<&[u8]>) -> Result<Vec<u8>> {
        self.dispatch(Method::Post, path, body).await
    }

    async fn put(&self, path: &str, body: Option<&[u8]>) -> Result<Vec<u8>> {
        self.dispatch(Method::Put, path, body).await
    }
}
