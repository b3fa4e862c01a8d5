//! Governor domain: the decoded contract events and the two projected entities.
//!
//! Events arrive already decoded from the contract log, in canonical chain order.
//! Entities are what the projection layer writes: one `Proposal` per governance
//! proposal and one immutable `Vote` per cast-vote log.

pub mod events;
pub mod types;

pub use events::{
    GovernorEvent, GovernorLog, ProposalCanceled, ProposalCreated, ProposalExecuted,
    ProposalQueued, VoteCast, VoteCastWithParams,
};
pub use types::{proposal_key, vote_key, Proposal, Support, Vote};

pub use alloy_primitives::{Address, Bytes, B256, U256};
