use std::sync::Arc;

use anyhow::Result;
use governor_client::GovernorClient;
use govindex_core::{AppConfig, MemoStore, MemoryMemoStore, PgMemoStore, QuorumEffect, RateLimiter};
use govindex_indexer::{engine, ingest, IndexStats, IndexerDeps, Snapshot};
use govindex_store::{EntityStore, MemoryStore, PgStore};
use tokio::io::{AsyncWriteExt, BufReader};
use tracing::info;
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() -> Result<()> {
    dotenvy::dotenv().ok();
    init_tracing()?;

    info!("Governance indexer starting...");

    // Load config
    let config = AppConfig::from_env()?;

    // Storage: Postgres when configured, otherwise process memory
    let store: Arc<dyn EntityStore>;
    let memo: Arc<dyn MemoStore>;
    let persistent = config.database_url.is_some();
    match &config.database_url {
        Some(url) => {
            let pg = PgStore::connect(url).await?;
            pg.migrate().await?;
            let pg_memo = PgMemoStore::new(pg.pool().clone());
            let evicted = pg_memo.evict_expired().await?;
            info!(evicted, "Using Postgres store");
            store = Arc::new(pg);
            memo = Arc::new(pg_memo);
        }
        None => {
            info!("No DATABASE_URL, using in-memory store");
            store = Arc::new(MemoryStore::new());
            memo = Arc::new(MemoryMemoStore::new());
        }
    }

    // Quorum enrichment: memo → rate limit → RPC
    let client = GovernorClient::with_timeout(&config.rpc_url, config.rpc_timeout)?;
    let limiter = Arc::new(RateLimiter::new(
        config.quorum_rate_limit,
        config.quorum_rate_window,
    ));
    let quorum = Arc::new(QuorumEffect::compose(client, limiter, memo));

    let deps = IndexerDeps::new(store.clone(), quorum);
    let engine = engine();
    let mut stats = IndexStats::default();

    let events = ingest::read_logs(BufReader::new(tokio::io::stdin()));
    let summary = engine.try_run(events, &mut stats, &deps).await?;

    info!(
        dispatched = summary.dispatched,
        applied = summary.applied,
        skipped = summary.skipped,
        last_block = ?stats.last_block,
        "Event stream drained"
    );
    for (event_type, count) in &stats.by_type {
        info!(event_type, count, "Events by type");
    }

    if !persistent {
        let snapshot = Snapshot::collect(store.as_ref()).await?;
        let mut out = serde_json::to_vec_pretty(&snapshot)?;
        out.push(b'\n');
        let mut stdout = tokio::io::stdout();
        stdout.write_all(&out).await?;
        stdout.flush().await?;
    }

    Ok(())
}

/// Log to stderr so stdout stays clean for the snapshot.
fn init_tracing() -> Result<()> {
    let filter = EnvFilter::from_default_env().add_directive("govindex=info".parse()?);
    let json = std::env::var("LOG_FORMAT")
        .map(|v| v.eq_ignore_ascii_case("json"))
        .unwrap_or(false);

    if json {
        tracing_subscriber::fmt()
            .json()
            .with_env_filter(filter)
            .with_writer(std::io::stderr)
            .init();
    } else {
        tracing_subscriber::fmt()
            .with_env_filter(filter)
            .with_writer(std::io::stderr)
            .init();
    }
    Ok(())
}
