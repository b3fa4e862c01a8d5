use chrono::{Duration, Utc};
use serde::{de::DeserializeOwned, Serialize};
use sha2::{Digest, Sha256};
use std::future::Future;
use tracing::warn;

use super::MemoStore;

/// SHA-256 of the JSON encoding of `key`. Structurally equal keys hash equal.
pub fn input_hash<K: Serialize>(key: &K) -> serde_json::Result<(String, Vec<u8>)> {
    let input_bytes = serde_json::to_vec(key)?;
    Ok((hex::encode(Sha256::digest(&input_bytes)), input_bytes))
}

/// Read-through memo over a `MemoStore`.
///
/// Store failures never fail the call: a broken read counts as a miss and a
/// broken write is logged and dropped.
pub struct MemoBuilder<'a, K> {
    function_name: &'a str,
    key: K,
    ttl_ms: Option<i64>,
    store: &'a dyn MemoStore,
}

impl<'a, K: Serialize> MemoBuilder<'a, K> {
    pub fn new(function_name: &'a str, key: K, store: &'a dyn MemoStore) -> Self {
        Self {
            function_name,
            key,
            ttl_ms: None,
            store,
        }
    }

    /// Set time-to-live in milliseconds.
    pub fn ttl(mut self, ms: i64) -> Self {
        self.ttl_ms = Some(ms);
        self
    }

    /// Get cached result or compute via the provided closure. Errors from the
    /// closure are returned as-is and nothing is stored.
    pub async fn get_or<T, E, F, Fut>(self, f: F) -> Result<T, E>
    where
        T: Serialize + DeserializeOwned,
        F: FnOnce() -> Fut,
        Fut: Future<Output = Result<T, E>>,
    {
        let hashed = match input_hash(&self.key) {
            Ok(hashed) => Some(hashed),
            Err(e) => {
                warn!(function = self.function_name, error = %e, "Memo key not serializable, bypassing cache");
                None
            }
        };

        // Check cache
        if let Some((hash, _)) = &hashed {
            match self.store.get(self.function_name, hash).await {
                Ok(Some(bytes)) => match serde_json::from_slice(&bytes) {
                    Ok(value) => return Ok(value),
                    Err(e) => {
                        warn!(function = self.function_name, error = %e, "Discarding undecodable memo entry")
                    }
                },
                Ok(None) => {}
                Err(e) => warn!(function = self.function_name, error = %e, "Memo read failed"),
            }
        }

        // Cache miss: compute
        let result = f().await?;

        // Store
        if let Some((hash, input_bytes)) = hashed {
            self.store_result(&hash, input_bytes, &result).await;
        }

        Ok(result)
    }

    async fn store_result<T: Serialize>(&self, hash: &str, input_bytes: Vec<u8>, result: &T) {
        let output_bytes = match serde_json::to_vec(result) {
            Ok(bytes) => bytes,
            Err(e) => {
                warn!(function = self.function_name, error = %e, "Memo output not serializable");
                return;
            }
        };
        let expires_at = self
            .ttl_ms
            .map(|ms| Utc::now() + Duration::milliseconds(ms));
        let input_summary = String::from_utf8(input_bytes).ok();

        if let Err(e) = self
            .store
            .set(
                self.function_name,
                hash,
                input_summary.as_deref(),
                &output_bytes,
                expires_at,
            )
            .await
        {
            warn!(function = self.function_name, error = %e, "Memo write failed");
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::memo::MemoryMemoStore;
    use anyhow::anyhow;
    use async_trait::async_trait;
    use chrono::DateTime;
    use std::sync::atomic::{AtomicU32, Ordering};

    #[derive(Serialize)]
    struct Key {
        a: u64,
        b: &'static str,
    }

    #[tokio::test]
    async fn second_call_is_served_from_store() {
        let store = MemoryMemoStore::new();
        let calls = AtomicU32::new(0);

        for _ in 0..2 {
            let value: Result<u64, anyhow::Error> = MemoBuilder::new("f", Key { a: 1, b: "x" }, &store)
                .get_or(|| async {
                    calls.fetch_add(1, Ordering::SeqCst);
                    Ok(7)
                })
                .await;
            assert_eq!(value.unwrap(), 7);
        }

        assert_eq!(calls.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn errors_are_not_stored() {
        let store = MemoryMemoStore::new();

        let first: Result<u64, anyhow::Error> = MemoBuilder::new("f", 1u8, &store)
            .get_or(|| async { Err(anyhow!("boom")) })
            .await;
        assert!(first.is_err());
        assert!(store.is_empty().await);

        let second: Result<u64, anyhow::Error> = MemoBuilder::new("f", 1u8, &store)
            .get_or(|| async { Ok(3) })
            .await;
        assert_eq!(second.unwrap(), 3);
    }

    #[test]
    fn structurally_equal_keys_hash_equal() {
        let (a, _) = input_hash(&Key { a: 5, b: "gov" }).unwrap();
        let (b, _) = input_hash(&Key { a: 5, b: "gov" }).unwrap();
        let (c, _) = input_hash(&Key { a: 6, b: "gov" }).unwrap();
        assert_eq!(a, b);
        assert_ne!(a, c);
    }

    struct BrokenStore;

    #[async_trait]
    impl MemoStore for BrokenStore {
        async fn get(&self, _: &str, _: &str) -> anyhow::Result<Option<Vec<u8>>> {
            Err(anyhow!("connection reset"))
        }

        async fn set(
            &self,
            _: &str,
            _: &str,
            _: Option<&str>,
            _: &[u8],
            _: Option<DateTime<Utc>>,
        ) -> anyhow::Result<()> {
            Err(anyhow!("connection reset"))
        }
    }

    #[tokio::test]
    async fn broken_store_degrades_to_direct_call() {
        let value: Result<u64, anyhow::Error> = MemoBuilder::new("f", 1u8, &BrokenStore)
            .get_or(|| async { Ok(11) })
            .await;
        assert_eq!(value.unwrap(), 11);
    }
}
