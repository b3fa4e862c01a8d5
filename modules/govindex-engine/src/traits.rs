//! Core traits for the event engine.

use anyhow::Result;
use async_trait::async_trait;

/// Events carry a type string and the key they serialize on.
pub trait EventLike: Clone + Send + Sync + 'static {
    /// Stable name of the event kind, used in logs and counters.
    fn event_type_str(&self) -> &'static str;

    /// Aggregate key the event mutates. Events sharing a key must be delivered
    /// and processed in order.
    fn key(&self) -> String;
}

/// Pure state updates. No I/O, no side effects.
///
/// Called for every event before routing. Use for counters, accumulators,
/// and other state that can be derived from the event stream.
pub trait Reducer<E: EventLike, S: Send>: Send + Sync {
    fn reduce(&self, state: &mut S, event: &E);
}

/// What a handler did with an event.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Outcome {
    /// The event produced store writes.
    Applied,
    /// The event was dropped without touching the store.
    Skipped,
}

/// Routes events to handlers. May perform I/O.
///
/// An `Err` is reserved for collaborator failures (the store is unreachable).
/// Domain-level problems are logged by the handler and reported as `Skipped`.
#[async_trait]
pub trait Router<E: EventLike, D: Send + Sync>: Send + Sync {
    async fn route(&self, event: &E, deps: &D) -> Result<Outcome>;
}
