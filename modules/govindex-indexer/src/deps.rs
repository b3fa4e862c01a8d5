use std::sync::Arc;

use govindex_core::QuorumSource;
use govindex_store::EntityStore;

/// Dependency container passed to every handler invocation.
#[derive(Clone)]
pub struct IndexerDeps {
    pub store: Arc<dyn EntityStore>,
    pub quorum: Arc<dyn QuorumSource>,
}

impl IndexerDeps {
    pub fn new(store: Arc<dyn EntityStore>, quorum: Arc<dyn QuorumSource>) -> Self {
        Self { store, quorum }
    }
}
