use anyhow::Result;
use async_trait::async_trait;
use govindex_engine::{Outcome, Router};
use govindex_world::{GovernorEvent, GovernorLog};

use crate::deps::IndexerDeps;
use crate::handlers;

/// Routes each decoded log to the handler for its kind.
pub struct GovernorRouter;

#[async_trait]
impl Router<GovernorLog, IndexerDeps> for GovernorRouter {
    async fn route(&self, log: &GovernorLog, deps: &IndexerDeps) -> Result<Outcome> {
        match &log.event {
            GovernorEvent::ProposalCreated(e) => handlers::handle_proposal_created(log, e, deps).await,
            GovernorEvent::VoteCast(e) => handlers::handle_vote_cast(log, e, deps).await,
            GovernorEvent::VoteCastWithParams(e) => {
                handlers::handle_vote_cast_with_params(log, e, deps).await
            }
            GovernorEvent::ProposalCanceled(e) => handlers::handle_proposal_canceled(e, deps).await,
            GovernorEvent::ProposalExecuted(e) => handlers::handle_proposal_executed(e, deps).await,
            GovernorEvent::ProposalQueued(e) => handlers::handle_proposal_queued(e, deps).await,
        }
    }
}
