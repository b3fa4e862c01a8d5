use anyhow::Result;
use govindex_store::EntityStore;
use govindex_world::{Proposal, Vote};
use serde::Serialize;

/// The full projected state, as written by the binary.
#[derive(Debug, Serialize)]
pub struct Snapshot {
    pub proposals: Vec<Proposal>,
    pub votes: Vec<Vote>,
}

impl Snapshot {
    pub async fn collect(store: &dyn EntityStore) -> Result<Self> {
        Ok(Self {
            proposals: store.proposals().await?,
            votes: store.votes().await?,
        })
    }
}
