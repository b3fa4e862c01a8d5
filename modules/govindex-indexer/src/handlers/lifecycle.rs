//! Terminal lifecycle events. Each sets one flag; none clears any.
//!
//! The flags are independent: nothing here stops a proposal from being both
//! canceled and queued. The governor contract enforces exclusivity upstream.

use anyhow::Result;
use govindex_engine::Outcome;
use govindex_world::{
    proposal_key, Proposal, ProposalCanceled, ProposalExecuted, ProposalQueued, U256,
};
use tracing::{info, warn};

use crate::deps::IndexerDeps;

pub async fn handle_proposal_canceled(
    event: &ProposalCanceled,
    deps: &IndexerDeps,
) -> Result<Outcome> {
    update_proposal("ProposalCanceled", event.proposal_id, deps, Proposal::mark_canceled).await
}

pub async fn handle_proposal_executed(
    event: &ProposalExecuted,
    deps: &IndexerDeps,
) -> Result<Outcome> {
    update_proposal("ProposalExecuted", event.proposal_id, deps, Proposal::mark_executed).await
}

pub async fn handle_proposal_queued(
    event: &ProposalQueued,
    deps: &IndexerDeps,
) -> Result<Outcome> {
    let eta = event.eta_seconds;
    update_proposal("ProposalQueued", event.proposal_id, deps, |p| {
        p.mark_queued(eta)
    })
    .await
}

/// Look up the proposal, patch it, write it back. Unknown ids are dropped.
async fn update_proposal<F>(
    handler: &'static str,
    proposal_id: U256,
    deps: &IndexerDeps,
    patch: F,
) -> Result<Outcome>
where
    F: FnOnce(&mut Proposal) + Send,
{
    let id = proposal_key(&proposal_id);
    let Some(mut proposal) = deps.store.get_proposal(&id).await? else {
        warn!(handler, proposal_id = %id, "Proposal not found, dropping event");
        return Ok(Outcome::Skipped);
    };

    patch(&mut proposal);
    info!(handler, proposal_id = %id, "Proposal lifecycle updated");
    deps.store.set_proposal(proposal).await?;
    Ok(Outcome::Applied)
}
