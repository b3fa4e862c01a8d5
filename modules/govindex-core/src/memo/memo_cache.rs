use std::collections::HashMap;

use anyhow::Result;
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::PgPool;
use tokio::sync::RwLock;

/// Backing storage for memoized outputs.
#[async_trait]
pub trait MemoStore: Send + Sync {
    /// Look up a cached output. Returns None if missing or expired.
    async fn get(&self, function_name: &str, input_hash: &str) -> Result<Option<Vec<u8>>>;

    /// Store an output (upsert).
    async fn set(
        &self,
        function_name: &str,
        input_hash: &str,
        input_summary: Option<&str>,
        output: &[u8],
        expires_at: Option<DateTime<Utc>>,
    ) -> Result<()>;
}

// ---------------------------------------------------------------------------
// Postgres
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, sqlx::FromRow)]
pub struct MemoCache {
    pub id: i64,
    pub function_name: String,
    pub input_hash: String,
    pub input_summary: Option<String>,
    pub output: Vec<u8>,
    pub created_at: DateTime<Utc>,
    pub expires_at: Option<DateTime<Utc>>,
    pub hit_count: i32,
}

/// `memo_cache` table store. Survives restarts.
#[derive(Clone)]
pub struct PgMemoStore {
    pool: PgPool,
}

impl PgMemoStore {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    /// Delete expired entries.
    pub async fn evict_expired(&self) -> Result<u64> {
        let result = sqlx::query(
            "DELETE FROM memo_cache WHERE expires_at IS NOT NULL AND expires_at <= now()",
        )
        .execute(&self.pool)
        .await?;
        Ok(result.rows_affected())
    }
}

#[async_trait]
impl MemoStore for PgMemoStore {
    async fn get(&self, function_name: &str, input_hash: &str) -> Result<Option<Vec<u8>>> {
        let row = sqlx::query_as::<_, MemoCache>(
            "SELECT * FROM memo_cache
             WHERE function_name = $1 AND input_hash = $2
               AND (expires_at IS NULL OR expires_at > now())",
        )
        .bind(function_name)
        .bind(input_hash)
        .fetch_optional(&self.pool)
        .await?;

        if let Some(ref row) = row {
            let id = row.id;
            let pool = self.pool.clone();
            tokio::spawn(async move {
                let _ = sqlx::query("UPDATE memo_cache SET hit_count = hit_count + 1 WHERE id = $1")
                    .bind(id)
                    .execute(&pool)
                    .await;
            });
        }

        Ok(row.map(|r| r.output))
    }

    async fn set(
        &self,
        function_name: &str,
        input_hash: &str,
        input_summary: Option<&str>,
        output: &[u8],
        expires_at: Option<DateTime<Utc>>,
    ) -> Result<()> {
        sqlx::query(
            "INSERT INTO memo_cache (function_name, input_hash, input_summary, output, expires_at)
             VALUES ($1, $2, $3, $4, $5)
             ON CONFLICT (function_name, input_hash)
             DO UPDATE SET output = EXCLUDED.output,
                          input_summary = EXCLUDED.input_summary,
                          expires_at = EXCLUDED.expires_at,
                          hit_count = 0,
                          created_at = now()",
        )
        .bind(function_name)
        .bind(input_hash)
        .bind(input_summary)
        .bind(output)
        .bind(expires_at)
        .execute(&self.pool)
        .await?;

        Ok(())
    }
}

// ---------------------------------------------------------------------------
// In-memory
// ---------------------------------------------------------------------------

type Entry = (Vec<u8>, Option<DateTime<Utc>>);

/// Process-lifetime store for tests and database-less runs.
#[derive(Default)]
pub struct MemoryMemoStore {
    entries: RwLock<HashMap<(String, String), Entry>>,
}

impl MemoryMemoStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub async fn len(&self) -> usize {
        self.entries.read().await.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.entries.read().await.is_empty()
    }
}

#[async_trait]
impl MemoStore for MemoryMemoStore {
    async fn get(&self, function_name: &str, input_hash: &str) -> Result<Option<Vec<u8>>> {
        let entries = self.entries.read().await;
        let key = (function_name.to_string(), input_hash.to_string());
        Ok(entries.get(&key).and_then(|(output, expires_at)| match expires_at {
            Some(at) if *at <= Utc::now() => None,
            _ => Some(output.clone()),
        }))
    }

    async fn set(
        &self,
        function_name: &str,
        input_hash: &str,
        _input_summary: Option<&str>,
        output: &[u8],
        expires_at: Option<DateTime<Utc>>,
    ) -> Result<()> {
        self.entries.write().await.insert(
            (function_name.to_string(), input_hash.to_string()),
            (output.to_vec(), expires_at),
        );
        Ok(())
    }
}
