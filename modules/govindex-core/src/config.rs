use std::time::Duration;

use crate::error::ConfigError;

/// Public Rootstock testnet node, used when neither `RPC_URL` nor
/// `ENVIO_RPC_URL` is set.
pub const DEFAULT_RPC_URL: &str = "https://public-node.testnet.rsk.co";

pub const DEFAULT_QUORUM_RATE_LIMIT: u32 = 10;
pub const DEFAULT_QUORUM_RATE_WINDOW_MS: u64 = 1_000;
pub const DEFAULT_RPC_TIMEOUT_SECS: u64 = 10;

/// Application configuration loaded from environment variables.
///
/// There is no governor address here: every event names the
/// contract that emitted it.
#[derive(Debug, Clone)]
pub struct AppConfig {
    // Chain RPC
    pub rpc_url: String,
    pub rpc_timeout: Duration,

    // Quorum enrichment limits
    pub quorum_rate_limit: u32,
    pub quorum_rate_window: Duration,

    // Persistence
    pub database_url: Option<String>,
}

impl AppConfig {
    pub fn from_env() -> Result<Self, ConfigError> {
        dotenvy::dotenv().ok();

        let config = Self::from_lookup(|key| std::env::var(key).ok())?;
        config.log_keys();
        Ok(config)
    }

    /// Build from an arbitrary variable source. Unset and empty values take
    /// their defaults.
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let get = |key: &str| lookup(key).filter(|v| !v.trim().is_empty());

        let quorum_rate_limit = parse_or(
            "QUORUM_RATE_LIMIT",
            get("QUORUM_RATE_LIMIT"),
            DEFAULT_QUORUM_RATE_LIMIT,
        )?;
        if quorum_rate_limit == 0 {
            return Err(ConfigError::Invalid {
                var: "QUORUM_RATE_LIMIT",
                value: "0".into(),
                reason: "must be at least 1".into(),
            });
        }

        let window_ms = parse_or(
            "QUORUM_RATE_WINDOW_MS",
            get("QUORUM_RATE_WINDOW_MS"),
            DEFAULT_QUORUM_RATE_WINDOW_MS,
        )?;
        if window_ms == 0 {
            return Err(ConfigError::Invalid {
                var: "QUORUM_RATE_WINDOW_MS",
                value: "0".into(),
                reason: "must be at least 1".into(),
            });
        }

        let timeout_secs = parse_or(
            "RPC_TIMEOUT_SECS",
            get("RPC_TIMEOUT_SECS"),
            DEFAULT_RPC_TIMEOUT_SECS,
        )?;

        Ok(Self {
            rpc_url: get("RPC_URL")
                .or_else(|| get("ENVIO_RPC_URL"))
                .unwrap_or_else(|| DEFAULT_RPC_URL.to_string()),
            rpc_timeout: Duration::from_secs(timeout_secs),
            quorum_rate_limit,
            quorum_rate_window: Duration::from_millis(window_ms),
            database_url: get("DATABASE_URL"),
        })
    }

    fn log_keys(&self) {
        tracing::info!("Config loaded:");
        tracing::info!("  RPC_URL: {}", self.rpc_url);
        tracing::info!("  RPC_TIMEOUT_SECS: {}", self.rpc_timeout.as_secs());
        tracing::info!(
            "  QUORUM_RATE_LIMIT: {} per {}ms",
            self.quorum_rate_limit,
            self.quorum_rate_window.as_millis()
        );
        tracing::info!(
            "  DATABASE_URL: {}",
            self.database_url
                .as_deref()
                .map(redact_url)
                .unwrap_or_else(|| "<not set, using in-memory store>".to_string())
        );
    }
}

fn parse_or<T>(var: &'static str, raw: Option<String>, default: T) -> Result<T, ConfigError>
where
    T: std::str::FromStr,
    T::Err: std::fmt::Display,
{
    match raw {
        None => Ok(default),
        Some(value) => {
            let parsed = value.trim().parse::<T>();
            parsed.map_err(|e| ConfigError::Invalid {
                var,
                value,
                reason: e.to_string(),
            })
        }
    }
}

/// Hide credentials in a connection URL: `postgres://user:pw@host/db` → `postgres://***@host/db`.
fn redact_url(url: &str) -> String {
    match (url.find("://"), url.rfind('@')) {
        (Some(scheme_end), Some(at)) if at > scheme_end => {
            format!("{}://***{}", &url[..scheme_end], &url[at..])
        }
        _ => url.to_string(),
    }
}
