use std::sync::Arc;

use alloy_primitives::U256;
use async_trait::async_trait;
use tracing::warn;

use super::{Cached, Effect, QuorumKey, QuorumReader, RateLimited, RemoteQuorum};
use crate::memo::MemoStore;
use crate::rate_limit::RateLimiter;

/// What proposal creation needs: a quorum for a key, always.
#[async_trait]
pub trait QuorumSource: Send + Sync {
    async fn quorum(&self, key: &QuorumKey) -> U256;
}

/// Degrading facade over a quorum effect. Any failure becomes a warning and
/// a zero quorum, so proposal creation never blocks on the remote node.
pub struct QuorumEffect<E> {
    effect: E,
}

impl<E> QuorumEffect<E>
where
    E: Effect<Input = QuorumKey, Output = U256>,
{
    pub fn new(effect: E) -> Self {
        Self { effect }
    }
}

impl<R: QuorumReader> QuorumEffect<Cached<RateLimited<RemoteQuorum<R>>>> {
    /// The production stack: memoized, then throttled, then the remote read.
    /// Memo hits do not spend rate budget.
    pub fn compose(reader: R, limiter: Arc<RateLimiter>, memo: Arc<dyn MemoStore>) -> Self {
        let remote = RemoteQuorum::new(reader);
        let throttled = RateLimited::new(remote, limiter);
        Self::new(Cached::new(throttled, memo))
    }
}

impl<E> QuorumEffect<E> {
    pub fn inner(&self) -> &E {
        &self.effect
    }
}

#[async_trait]
impl<E> QuorumSource for QuorumEffect<E>
where
    E: Effect<Input = QuorumKey, Output = U256>,
{
    async fn quorum(&self, key: &QuorumKey) -> U256 {
        match self.effect.call(key).await {
            Ok(quorum) => quorum,
            Err(e) => {
                warn!(
                    vote_start = %key.vote_start,
                    governor = %key.governor_address,
                    error = %e,
                    "Failed to fetch quorum, falling back to zero"
                );
                U256::ZERO
            }
        }
    }
}
