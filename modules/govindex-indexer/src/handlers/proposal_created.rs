use anyhow::Result;
use govindex_core::QuorumKey;
use govindex_engine::Outcome;
use govindex_world::{proposal_key, GovernorLog, Proposal, ProposalCreated};
use tracing::{info, info_span, Instrument};

use crate::deps::IndexerDeps;

/// Build a fresh proposal with its quorum at `voteStart`.
///
/// No existence check: a repeated creation for the same id overwrites.
pub async fn handle_proposal_created(
    log: &GovernorLog,
    event: &ProposalCreated,
    deps: &IndexerDeps,
) -> Result<Outcome> {
    let key = QuorumKey {
        vote_start: event.vote_start,
        governor_address: log.src_address,
    };
    let id = proposal_key(&event.proposal_id);
    // Fallback warnings from the lookup inherit these fields.
    let span = info_span!("quorum_lookup", handler = "ProposalCreated", proposal_id = %id);
    let quorum = deps.quorum.quorum(&key).instrument(span).await;

    let proposal = Proposal::created(log, event, quorum);
    info!(
        proposal_id = %proposal.id,
        proposer = %proposal.proposer,
        vote_start = %proposal.vote_start,
        %quorum,
        "Proposal created"
    );

    deps.store.set_proposal(proposal).await?;
    Ok(Outcome::Applied)
}
