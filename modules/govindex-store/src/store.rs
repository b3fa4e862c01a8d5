use std::sync::Arc;

use anyhow::Result;
use async_trait::async_trait;
use govindex_world::{Proposal, Vote};

/// Keyed get/upsert over proposals and votes.
///
/// Callers must serialize writes per proposal id; implementations do not lock
/// across a read-modify-write.
#[async_trait]
pub trait EntityStore: Send + Sync {
    async fn get_proposal(&self, id: &str) -> Result<Option<Proposal>>;

    /// Insert or replace by `proposal.id`.
    async fn set_proposal(&self, proposal: Proposal) -> Result<()>;

    async fn get_vote(&self, id: &str) -> Result<Option<Vote>>;

    /// Insert or replace by `vote.id`.
    async fn set_vote(&self, vote: Vote) -> Result<()>;

    /// All proposals, oldest first.
    async fn proposals(&self) -> Result<Vec<Proposal>>;

    /// All votes, in chain order.
    async fn votes(&self) -> Result<Vec<Vote>>;
}

#[async_trait]
impl<S: EntityStore + ?Sized> EntityStore for Arc<S> {
    async fn get_proposal(&self, id: &str) -> Result<Option<Proposal>> {
        (**self).get_proposal(id).await
    }

    async fn set_proposal(&self, proposal: Proposal) -> Result<()> {
        (**self).set_proposal(proposal).await
    }

    async fn get_vote(&self, id: &str) -> Result<Option<Vote>> {
        (**self).get_vote(id).await
    }

    async fn set_vote(&self, vote: Vote) -> Result<()> {
        (**self).set_vote(vote).await
    }

    async fn proposals(&self) -> Result<Vec<Proposal>> {
        (**self).proposals().await
    }

    async fn votes(&self) -> Result<Vec<Vote>> {
        (**self).votes().await
    }
}
