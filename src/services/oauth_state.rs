// src/services/oauth_state.rs
//! Single-use storage for in-flight OAuth transactions
//!
//! Each started flow stores its PKCE verifier and OIDC nonce under the random
//! state value, and the callback consumes the entry exactly once. `take` is a
//! single locked remove, so two concurrent callbacks presenting the same
//! state observe at most one success.

use async_trait::async_trait;
use std::collections::HashMap;
use std::time::{Duration, Instant};
use tokio::sync::Mutex;
use tracing::debug;

/// PKCE verifier and nonce generated at flow start
#[derive(Debug, Clone)]
pub struct OAuthTransaction {
    pub code_verifier: String,
    pub nonce: String,
}

/// Single-use, short-lived key-value storage keyed by the OAuth state token.
///
/// Production deployments should back this with a networked expiring cache so
/// entries survive process restarts and horizontal scale-out; the in-memory
/// implementation below fits tests and single-instance deployments.
#[async_trait]
pub trait OAuthStateStore: Send + Sync {
    async fn put(&self, state: String, tx: OAuthTransaction);

    /// Consumes and returns the transaction for `state`, or None when the
    /// state is unknown, already consumed, or older than the store TTL.
    async fn take(&self, state: &str) -> Option<OAuthTransaction>;
}

struct StoredTransaction {
    tx: OAuthTransaction,
    created_at: Instant,
}

pub struct InMemoryOAuthStateStore {
    ttl: Duration,
    entries: Mutex<HashMap<String, StoredTransaction>>,
}

impl InMemoryOAuthStateStore {
    pub fn new(ttl: Duration) -> Self {
        Self {
            ttl,
            entries: Mutex::new(HashMap::new()),
        }
    }
}

#[async_trait]
impl OAuthStateStore for InMemoryOAuthStateStore {
    async fn put(&self, state: String, tx: OAuthTransaction) {
        let mut entries = self.entries.lock().await;

        // Abandoned flows never get consumed; sweep them here so the map
        // stays bounded without a background task.
        let ttl = self.ttl;
        entries.retain(|_, stored| stored.created_at.elapsed() <= ttl);

        entries.insert(
            state,
            StoredTransaction {
                tx,
                created_at: Instant::now(),
            },
        );
    }

    async fn take(&self, state: &str) -> Option<OAuthTransaction> {
        let mut entries = self.entries.lock().await;
        let stored = entries.remove(state)?;

        if stored.created_at.elapsed() > self.ttl {
            debug!("OAuth state entry expired before consumption");
            return None;
        }

        Some(stored.tx)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn tx() -> OAuthTransaction {
        OAuthTransaction {
            code_verifier: "verifier".to_string(),
            nonce: "nonce".to_string(),
        }
    }

    #[tokio::test]
    async fn test_take_consumes_entry_exactly_once() {
        let store = InMemoryOAuthStateStore::new(Duration::from_secs(600));
        store.put("state-1".to_string(), tx()).await;

        let first = store.take("state-1").await;
        assert!(first.is_some());
        assert_eq!(first.unwrap().code_verifier, "verifier");

        // Replay of the same state must fail
        assert!(store.take("state-1").await.is_none());
    }

    #[tokio::test]
    async fn test_take_unknown_state_is_none() {
        let store = InMemoryOAuthStateStore::new(Duration::from_secs(600));
        assert!(store.take("never-stored").await.is_none());
    }

    #[tokio::test]
    async fn test_expired_entry_is_not_consumable() {
        let store = InMemoryOAuthStateStore::new(Duration::ZERO);
        store.put("state-1".to_string(), tx()).await;

        assert!(store.take("state-1").await.is_none());
    }

    #[tokio::test]
    async fn test_put_sweeps_expired_entries() {
        let store = InMemoryOAuthStateStore::new(Duration::ZERO);
        store.put("old".to_string(), tx()).await;

        // The next put runs the sweep and evicts the expired entry
        store.put("new".to_string(), tx()).await;

        let entries = store.entries.lock().await;
        assert!(!entries.contains_key("old"));
    }

    #[tokio::test]
    async fn test_entries_are_independent() {
        let store = InMemoryOAuthStateStore::new(Duration::from_secs(600));
        store.put("a".to_string(), tx()).await;
        store
            .put(
                "b".to_string(),
                OAuthTransaction {
                    code_verifier: "other".to_string(),
                    nonce: "n2".to_string(),
                },
            )
            .await;

        assert_eq!(store.take("b").await.unwrap().code_verifier, "other");
        assert_eq!(store.take("a").await.unwrap().code_verifier, "verifier");
    }
}
