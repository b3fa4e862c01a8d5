//! Event dispatch engine.
//!
//! Provides a generic, strictly sequential event loop: reduce → route, one event
//! at a time, in delivery order. Ordering and deduplication are the caller's
//! contract; the engine neither buffers nor reorders.
//!
//! Consumers define their domain by implementing `Reducer` (pure state updates)
//! and `Router` (side-effectful handlers that read and write the entity store).

pub mod engine;
pub mod traits;

pub use engine::{Engine, RunSummary};
pub use traits::{EventLike, Outcome, Reducer, Router};
