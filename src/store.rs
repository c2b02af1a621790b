//! Key-value persistence for OAuth credentials and pending authorization state.
//!
//! - `KvStore`: the backend contract (get / put with optional expiry / delete).
//! - `MemoryStore`: in-process backend with per-entry expiry.
//! - `TokenStore`: one `Credential` per user identifier under `token:<userId>`.
//! - `StateStore`: single-use `state` values under `oauth_state:<key>`.
//!
//! Storage expiry and the access token's own `expiry` are separate timers: the
//! stored blob outlives the access token so the refresh token stays usable.
use std::{
    pin::Pin,
    sync::Arc,
    time::{Duration, Instant},
};

use chrono::Utc;
use dashmap::DashMap;
use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::{debug, warn};

use crate::{
    csrf_token::CSRFToken,
    token::{AccessToken, RefreshToken, TokenResponse},
};

pub type StoreFuture<'a, T> = Pin<Box<dyn Future<Output = Result<T, StoreError>> + Send + 'a>>;

/// Errors raised by a `KvStore` backend.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum StoreError {
    #[error("Backend failure: {0}")]
    Backend(String),
    #[error("Serialization error: {0}")]
    Serialization(String),
}

/// Backend contract. Writes to the same key are last-write-wins.
pub trait KvStore: Send + Sync {
    /// Returns `None` for missing and expired keys.
    fn get<'a>(&'a self, key: &'a str) -> StoreFuture<'a, Option<String>>;

    /// Writes or overwrites `key`. With `ttl`, the entry is evicted once it elapses.
    fn put<'a>(&'a self, key: &'a str, value: String, ttl: Option<Duration>)
    -> StoreFuture<'a, ()>;

    fn delete<'a>(&'a self, key: &'a str) -> StoreFuture<'a, ()>;

    /// Removes `key` and returns its value in one step. Of concurrent callers
    /// on the same key, at most one sees the value.
    fn take<'a>(&'a self, key: &'a str) -> StoreFuture<'a, Option<String>>;
}

#[derive(Debug, Clone)]
struct Entry {
    value: String,
    expires_at: Option<Instant>,
}

impl Entry {
    fn is_expired(&self, now: Instant) -> bool {
        self.expires_at.is_some_and(|at| now >= at)
    }
}

/// In-process `KvStore`. Expired entries are dropped when read and swept on every write.
#[derive(Debug, Clone, Default)]
pub struct MemoryStore(Arc<DashMap<String, Entry>>);

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// Drops every expired entry and returns how many were removed.
    pub fn sweep(&self) -> usize {
        let now = Instant::now();
        let before = self.0.len();
        self.0.retain(|_, entry| !entry.is_expired(now));
        before.saturating_sub(self.0.len())
    }
}

impl KvStore for MemoryStore {
    fn get<'a>(&'a self, key: &'a str) -> StoreFuture<'a, Option<String>> {
        Box::pin(async move {
            let now = Instant::now();
            let value = match self.0.get(key) {
                Some(entry) if !entry.is_expired(now) => Some(entry.value.clone()),
                Some(_) => None,
                None => return Ok(None),
            };
            if value.is_none() {
                self.0.remove_if(key, |_, entry| entry.is_expired(now));
            }
            Ok(value)
        })
    }

    fn put<'a>(
        &'a self,
        key: &'a str,
        value: String,
        ttl: Option<Duration>,
    ) -> StoreFuture<'a, ()> {
        Box::pin(async move {
            let swept = self.sweep();
            if swept > 0 {
                debug!("Swept {} expired entries", swept);
            }
            let expires_at = ttl.map(|ttl| Instant::now() + ttl);
            self.0.insert(key.to_string(), Entry { value, expires_at });
            Ok(())
        })
    }

    fn delete<'a>(&'a self, key: &'a str) -> StoreFuture<'a, ()> {
        Box::pin(async move {
            self.0.remove(key);
            Ok(())
        })
    }

    fn take<'a>(&'a self, key: &'a str) -> StoreFuture<'a, Option<String>> {
        Box::pin(async move {
            let now = Instant::now();
            Ok(self
                .0
                .remove(key)
                .filter(|(_, entry)| !entry.is_expired(now))
                .map(|(_, entry)| entry.value))
        })
    }
}

/// Returns the current time as epoch milliseconds.
pub fn now_millis() -> i64 {
    Utc::now().timestamp_millis()
}

/// The OAuth credential set stored per user identifier.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Credential {
    pub access_token: AccessToken,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub refresh_token: Option<RefreshToken>,
    /// Epoch milliseconds after which `access_token` is invalid.
    pub expiry: i64,
}

impl Credential {
    /// Builds a credential from a token endpoint reply received at `now` (epoch ms).
    /// `previous` is kept when the reply carries no new refresh token.
    pub fn from_response(res: TokenResponse, previous: Option<RefreshToken>, now: i64) -> Self {
        let lifetime_ms = i64::try_from(res.expires_in)
            .unwrap_or(i64::MAX / 1000)
            .saturating_mul(1000);
        Self {
            access_token: res.access_token,
            refresh_token: res.refresh_token.or(previous),
            expiry: now.saturating_add(lifetime_ms),
        }
    }

    /// True once `now + skew_ms` has reached `expiry`.
    pub fn is_expired(&self, now: i64, skew_ms: i64) -> bool {
        now.saturating_add(skew_ms) >= self.expiry
    }
}

/// Credentials keyed by user identifier.
#[derive(Clone)]
pub struct TokenStore {
    kv: Arc<dyn KvStore>,
    ttl: Duration,
}

impl TokenStore {
    pub fn new(kv: Arc<dyn KvStore>, ttl: Duration) -> Self {
        Self { kv, ttl }
    }

    fn key(user_id: &str) -> String {
        format!("token:{}", user_id)
    }

    /// Never fails: backend errors and unreadable records read as absent.
    pub async fn get(&self, user_id: &str) -> Option<Credential> {
        let key = Self::key(user_id);
        let raw = match self.kv.get(&key).await {
            Ok(raw) => raw?,
            Err(e) => {
                warn!("Failed to read credential for {}: {}", user_id, e);
                return None;
            }
        };
        serde_json::from_str(&raw)
            .map_err(|e| warn!("Discarding unreadable credential for {}: {}", user_id, e))
            .ok()
    }

    /// Writes the credential and resets its storage TTL.
    pub async fn put(&self, user_id: &str, credential: &Credential) -> Result<(), StoreError> {
        let raw = serde_json::to_string(credential)
            .map_err(|e| StoreError::Serialization(e.to_string()))?;
        self.kv.put(&Self::key(user_id), raw, Some(self.ttl)).await
    }

    pub async fn delete(&self, user_id: &str) -> Result<(), StoreError> {
        self.kv.delete(&Self::key(user_id)).await
    }
}

/// Pending authorization `state` values, keyed by a per-browser session key.
#[derive(Clone)]
pub struct StateStore {
    kv: Arc<dyn KvStore>,
    ttl: Duration,
}

impl StateStore {
    pub fn new(kv: Arc<dyn KvStore>, ttl: Duration) -> Self {
        Self { kv, ttl }
    }

    fn key(session_key: &str) -> String {
        format!("oauth_state:{}", session_key)
    }

    pub async fn issue(&self, session_key: &str, state: &CSRFToken) -> Result<(), StoreError> {
        self.kv
            .put(
                &Self::key(session_key),
                state.value().to_string(),
                Some(self.ttl),
            )
            .await
    }

    /// Returns the stored `state` and removes it, so each value is accepted at most once.
    pub async fn take(&self, session_key: &str) -> Result<Option<CSRFToken>, StoreError> {
        let value = self.kv.take(&Self::key(session_key)).await?;
        Ok(value.map(CSRFToken::from))
    }
}
