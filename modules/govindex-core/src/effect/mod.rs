//! Enrichment effects.
//!
//! An effect is one asynchronous external read with a narrow contract:
//! `call(input) -> Result<output>`. Caching and rate limiting are separate
//! effects that wrap another one, so the quorum lookup is assembled as
//!
//! ```text
//! QuorumEffect(Cached(RateLimited(RemoteQuorum(GovernorClient))))
//! ```
//!
//! and each layer can be tested alone.

mod cached;
mod quorum;
mod rate_limited;
mod remote;

pub use cached::Cached;
pub use quorum::{QuorumEffect, QuorumSource};
pub use rate_limited::RateLimited;
pub use remote::{QuorumKey, QuorumReader, RemoteQuorum};

use async_trait::async_trait;

use crate::error::EffectError;

#[async_trait]
pub trait Effect: Send + Sync {
    type Input: Send + Sync;
    type Output: Send;

    /// Stable name, used as the memo namespace and in logs.
    fn name(&self) -> &'static str;

    async fn call(&self, input: &Self::Input) -> Result<Self::Output, EffectError>;
}
