//! Governor event projection.
//!
//! Six handlers, one per event kind, each a read-modify-write against the
//! entity store. Only `ProposalCreated` performs I/O beyond the store: the
//! quorum lookup, which never fails (it degrades to zero).
//!
//! Delivery contract: events arrive in canonical chain order and events for
//! one proposal are never processed concurrently. The engine runs strictly
//! sequentially, so a single `Engine::run` satisfies this by construction.

pub mod deps;
pub mod handlers;
pub mod ingest;
pub mod router;
pub mod snapshot;
pub mod stats;

pub use deps::IndexerDeps;
pub use router::GovernorRouter;
pub use snapshot::Snapshot;
pub use stats::{IndexStats, StatsReducer};

use govindex_engine::Engine;
use govindex_world::GovernorLog;

/// The engine type the binary and tests run.
pub type IndexerEngine = Engine<GovernorLog, IndexStats, IndexerDeps, StatsReducer, GovernorRouter>;

pub fn engine() -> IndexerEngine {
    Engine::new(StatsReducer, GovernorRouter)
}
