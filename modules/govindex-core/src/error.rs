//! Typed errors for configuration and enrichment effects.

use governor_client::RpcError;
use thiserror::Error;

/// Errors raised while loading configuration.
#[derive(Debug, Error)]
pub enum ConfigError {
    /// A variable is set but cannot be parsed
    #[error("invalid value for {var}: {value:?} ({reason})")]
    Invalid {
        var: &'static str,
        value: String,
        reason: String,
    },
}

/// Errors an effect can surface to its caller.
#[derive(Debug, Error)]
pub enum EffectError {
    /// The remote read failed (transport, RPC, or decode)
    #[error("remote read failed: {0}")]
    Remote(#[from] RpcError),
}
