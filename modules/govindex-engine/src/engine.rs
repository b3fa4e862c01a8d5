//! The dispatch loop.

use std::marker::PhantomData;

use anyhow::Result;
use futures::{Stream, StreamExt};
use tracing::{debug, info_span, Instrument};

use crate::traits::{EventLike, Outcome, Reducer, Router};

/// Counts for one `Engine::run`.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct RunSummary {
    pub dispatched: u64,
    pub applied: u64,
    pub skipped: u64,
}

impl RunSummary {
    fn record(&mut self, outcome: Outcome) {
        self.dispatched += 1;
        match outcome {
            Outcome::Applied => self.applied += 1,
            Outcome::Skipped => self.skipped += 1,
        }
    }
}

/// Generic event dispatch engine.
///
/// Reduce → route, one event at a time.
pub struct Engine<E, S, D, Red, Rout>
where
    E: EventLike,
    S: Send,
    D: Send + Sync,
    Red: Reducer<E, S>,
    Rout: Router<E, D>,
{
    reducer: Red,
    router: Rout,
    _phantom: PhantomData<fn() -> (E, S, D)>,
}

impl<E, S, D, Red, Rout> Engine<E, S, D, Red, Rout>
where
    E: EventLike,
    S: Send,
    D: Send + Sync,
    Red: Reducer<E, S>,
    Rout: Router<E, D>,
{
    pub fn new(reducer: Red, router: Rout) -> Self {
        Self {
            reducer,
            router,
            _phantom: PhantomData,
        }
    }

    /// Dispatch a single event. Reduces state, then routes to its handler.
    pub async fn dispatch(&self, event: E, state: &mut S, deps: &D) -> Result<Outcome> {
        let span = info_span!("dispatch", event_type = event.event_type_str(), key = %event.key());

        async {
            // 1. Reduce (pure state update)
            self.reducer.reduce(state, &event);

            // 2. Route (store reads/writes, enrichment)
            let outcome = self.router.route(&event, deps).await?;
            debug!(?outcome, "Event handled");
            Ok::<_, anyhow::Error>(outcome)
        }
        .instrument(span)
        .await
    }

    /// Drain an ordered stream, dispatching each event before pulling the next.
    /// Stops at the first routing error.
    pub async fn run<St>(&self, events: St, state: &mut S, deps: &D) -> Result<RunSummary>
    where
        St: Stream<Item = E> + Send,
    {
        self.try_run(events.map(Ok), state, deps).await
    }

    /// Like `run`, for sources that can fail. A source error stops the run the
    /// same way a routing error does.
    pub async fn try_run<St>(&self, events: St, state: &mut S, deps: &D) -> Result<RunSummary>
    where
        St: Stream<Item = Result<E>> + Send,
    {
        let mut summary = RunSummary::default();
        let mut events = std::pin::pin!(events);

        while let Some(event) = events.next().await {
            let outcome = self.dispatch(event?, state, deps).await?;
            summary.record(outcome);
        }

        Ok(summary)
    }
}
