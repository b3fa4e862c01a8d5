use anyhow::Result;
use govindex_engine::Outcome;
use govindex_world::{
    proposal_key, vote_key, Address, GovernorLog, Support, Vote, VoteCast, VoteCastWithParams,
    U256,
};
use tracing::{debug, warn};

use crate::deps::IndexerDeps;

/// The fields both vote events share.
struct Ballot<'a> {
    voter: Address,
    proposal_id: U256,
    support: u8,
    weight: U256,
    reason: &'a str,
}

pub async fn handle_vote_cast(
    log: &GovernorLog,
    event: &VoteCast,
    deps: &IndexerDeps,
) -> Result<Outcome> {
    let ballot = Ballot {
        voter: event.voter,
        proposal_id: event.proposal_id,
        support: event.support,
        weight: event.weight,
        reason: &event.reason,
    };
    record_ballot("VoteCast", log, ballot, deps).await
}

/// Same as `VoteCast`; the extra params blob is not interpreted.
pub async fn handle_vote_cast_with_params(
    log: &GovernorLog,
    event: &VoteCastWithParams,
    deps: &IndexerDeps,
) -> Result<Outcome> {
    let ballot = Ballot {
        voter: event.voter,
        proposal_id: event.proposal_id,
        support: event.support,
        weight: event.weight,
        reason: &event.reason,
    };
    record_ballot("VoteCastWithParams", log, ballot, deps).await
}

/// Add the weight to the proposal's tally and write the vote record.
///
/// Not idempotent: a redelivered event counts twice.
async fn record_ballot(
    handler: &'static str,
    log: &GovernorLog,
    ballot: Ballot<'_>,
    deps: &IndexerDeps,
) -> Result<Outcome> {
    let id = proposal_key(&ballot.proposal_id);
    let Some(mut proposal) = deps.store.get_proposal(&id).await? else {
        warn!(handler, proposal_id = %id, "Proposal not found, dropping event");
        return Ok(Outcome::Skipped);
    };

    match Support::try_from(ballot.support) {
        Ok(support) => proposal.tally(support, ballot.weight),
        Err(raw) => warn!(
            handler,
            proposal_id = %id,
            support = raw,
            "Unknown support value, tallies unchanged"
        ),
    }
    deps.store.set_proposal(proposal).await?;

    let vote = Vote {
        id: vote_key(&ballot.proposal_id, &ballot.voter, log.log_index),
        proposal_id: ballot.proposal_id,
        voter: ballot.voter,
        support: ballot.support,
        weight: ballot.weight,
        reason: ballot.reason.to_string(),
        block_number: log.block_number,
        timestamp: log.block_timestamp,
    };
    debug!(handler, vote_id = %vote.id, weight = %vote.weight, "Vote recorded");
    deps.store.set_vote(vote).await?;

    Ok(Outcome::Applied)
}
