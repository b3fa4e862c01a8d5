pub mod config;
pub mod effect;
pub mod error;
pub mod memo;
pub mod rate_limit;

pub use config::AppConfig;
pub use effect::{
    Cached, Effect, QuorumEffect, QuorumKey, QuorumReader, QuorumSource, RateLimited,
    RemoteQuorum,
};
pub use error::{ConfigError, EffectError};
pub use memo::{MemoBuilder, MemoStore, MemoryMemoStore, PgMemoStore};
pub use rate_limit::RateLimiter;
