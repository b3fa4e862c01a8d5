//! In-memory entity store.

use std::collections::HashMap;

use anyhow::Result;
use async_trait::async_trait;
use govindex_world::{Proposal, Vote};
use tokio::sync::RwLock;

use crate::store::EntityStore;

/// HashMap-backed store. Thread-safe; contents are lost on drop.
#[derive(Default)]
pub struct MemoryStore {
    proposals: RwLock<HashMap<String, Proposal>>,
    votes: RwLock<HashMap<String, Vote>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub async fn proposal_count(&self) -> usize {
        self.proposals.read().await.len()
    }

    pub async fn vote_count(&self) -> usize {
        self.votes.read().await.len()
    }
}

#[async_trait]
impl EntityStore for MemoryStore {
    async fn get_proposal(&self, id: &str) -> Result<Option<Proposal>> {
        Ok(self.proposals.read().await.get(id).cloned())
    }

    async fn set_proposal(&self, proposal: Proposal) -> Result<()> {
        self.proposals
            .write()
            .await
            .insert(proposal.id.clone(), proposal);
        Ok(())
    }

    async fn get_vote(&self, id: &str) -> Result<Option<Vote>> {
        Ok(self.votes.read().await.get(id).cloned())
    }

    async fn set_vote(&self, vote: Vote) -> Result<()> {
        self.votes.write().await.insert(vote.id.clone(), vote);
        Ok(())
    }

    async fn proposals(&self) -> Result<Vec<Proposal>> {
        let mut all: Vec<Proposal> = self.proposals.read().await.values().cloned().collect();
        all.sort_by(|a, b| {
            a.created_at_block
                .cmp(&b.created_at_block)
                .then_with(|| a.proposal_id.cmp(&b.proposal_id))
        });
        Ok(all)
    }

    async fn votes(&self) -> Result<Vec<Vote>> {
        let mut all: Vec<Vote> = self.votes.read().await.values().cloned().collect();
        all.sort_by(|a, b| {
            a.block_number
                .cmp(&b.block_number)
                .then_with(|| a.id.cmp(&b.id))
        });
        Ok(all)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use govindex_world::{Address, U256};

    fn proposal(id: u64, block: u64) -> Proposal {
        Proposal {
            id: id.to_string(),
            proposal_id: U256::from(id),
            proposer: Address::repeat_byte(0xaa),
            description: String::new(),
            targets: vec![],
            calldatas: vec![],
            signatures: vec![],
            values: vec![],
            vote_start: U256::from(block + 10),
            vote_end: U256::from(block + 100),
            created_at_block: block,
            created_at: 0,
            votes_for: U256::ZERO,
            votes_against: U256::ZERO,
            votes_abstains: U256::ZERO,
            quorum: U256::ZERO,
            is_canceled: false,
            is_executed: false,
            is_queued: false,
            eta_seconds: None,
        }
    }

    #[tokio::test]
    async fn get_missing_is_none() {
        let store = MemoryStore::new();
        assert!(store.get_proposal("1").await.unwrap().is_none());
        assert!(store.get_vote("1-0x-0").await.unwrap().is_none());
    }

    #[tokio::test]
    async fn set_upserts_by_id() {
        let store = MemoryStore::new();
        store.set_proposal(proposal(1, 10)).await.unwrap();

        let mut updated = proposal(1, 10);
        updated.is_queued = true;
        store.set_proposal(updated).await.unwrap();

        assert_eq!(store.proposal_count().await, 1);
        assert!(store.get_proposal("1").await.unwrap().unwrap().is_queued);
    }

    #[tokio::test]
    async fn proposals_list_in_creation_order() {
        let store = MemoryStore::new();
        store.set_proposal(proposal(3, 30)).await.unwrap();
        store.set_proposal(proposal(1, 10)).await.unwrap();
        store.set_proposal(proposal(2, 20)).await.unwrap();

        let ids: Vec<String> = store
            .proposals()
            .await
            .unwrap()
            .into_iter()
            .map(|p| p.id)
            .collect();
        assert_eq!(ids, vec!["1", "2", "3"]);
    }
}
