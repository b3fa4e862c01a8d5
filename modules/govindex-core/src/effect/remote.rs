use alloy_primitives::{Address, U256};
use async_trait::async_trait;
use governor_client::GovernorClient;
use serde::{Deserialize, Serialize};

use super::Effect;
use crate::error::EffectError;

/// Input of the quorum lookup. Equality is structural.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct QuorumKey {
    pub vote_start: U256,
    pub governor_address: Address,
}

/// The single remote read the indexer performs.
#[async_trait]
pub trait QuorumReader: Send + Sync {
    async fn read_quorum(
        &self,
        governor: Address,
        timepoint: U256,
    ) -> governor_client::Result<U256>;
}

#[async_trait]
impl QuorumReader for GovernorClient {
    async fn read_quorum(
        &self,
        governor: Address,
        timepoint: U256,
    ) -> governor_client::Result<U256> {
        self.quorum(governor, timepoint).await
    }
}

/// Uncached, unthrottled `quorum(voteStart)` call. One attempt per invocation.
pub struct RemoteQuorum<R> {
    reader: R,
}

impl<R: QuorumReader> RemoteQuorum<R> {
    pub fn new(reader: R) -> Self {
        Self { reader }
    }
}

#[async_trait]
impl<R: QuorumReader> Effect for RemoteQuorum<R> {
    type Input = QuorumKey;
    type Output = U256;

    fn name(&self) -> &'static str {
        "getQuorum"
    }

    async fn call(&self, input: &QuorumKey) -> Result<U256, EffectError> {
        Ok(self
            .reader
            .read_quorum(input.governor_address, input.vote_start)
            .await?)
    }
}
