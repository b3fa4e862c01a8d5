//! Projected entities.

use alloy_primitives::{Address, Bytes, U256};
use serde::{Deserialize, Serialize};

use crate::events::{GovernorLog, ProposalCreated};

/// Vote direction as encoded by the Governor's counting module.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Support {
    Against = 0,
    For = 1,
    Abstain = 2,
}

impl TryFrom<u8> for Support {
    type Error = u8;

    fn try_from(value: u8) -> Result<Self, Self::Error> {
        match value {
            0 => Ok(Support::Against),
            1 => Ok(Support::For),
            2 => Ok(Support::Abstain),
            other => Err(other),
        }
    }
}

/// Store key of a proposal: the decimal form of its 256-bit id.
pub fn proposal_key(proposal_id: &U256) -> String {
    proposal_id.to_string()
}

/// Store key of a vote. Including the log index keeps two votes by the same
/// voter in one transaction distinct.
pub fn vote_key(proposal_id: &U256, voter: &Address, log_index: u64) -> String {
    format!("{proposal_id}-{voter}-{log_index}")
}

/// Aggregate of one governance proposal.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Proposal {
    pub id: String,
    pub proposal_id: U256,
    pub proposer: Address,
    pub description: String,
    pub targets: Vec<Address>,
    pub calldatas: Vec<Bytes>,
    pub signatures: Vec<String>,
    pub values: Vec<U256>,
    pub vote_start: U256,
    pub vote_end: U256,
    pub created_at_block: u64,
    /// Unix seconds.
    pub created_at: u64,
    pub votes_for: U256,
    pub votes_against: U256,
    pub votes_abstains: U256,
    /// Quorum at `vote_start`. Written once at creation.
    pub quorum: U256,
    pub is_canceled: bool,
    pub is_executed: bool,
    pub is_queued: bool,
    pub eta_seconds: Option<U256>,
}

impl Proposal {
    /// A freshly created proposal: zero tallies, no lifecycle flags.
    pub fn created(log: &GovernorLog, created: &ProposalCreated, quorum: U256) -> Self {
        Self {
            id: proposal_key(&created.proposal_id),
            proposal_id: created.proposal_id,
            proposer: created.proposer,
            description: created.description.clone(),
            targets: created.targets.clone(),
            calldatas: created.calldatas.clone(),
            signatures: created.signatures.clone(),
            values: created.values.clone(),
            vote_start: created.vote_start,
            vote_end: created.vote_end,
            created_at_block: log.block_number,
            created_at: log.block_timestamp,
            votes_for: U256::ZERO,
            votes_against: U256::ZERO,
            votes_abstains: U256::ZERO,
            quorum,
            is_canceled: false,
            is_executed: false,
            is_queued: false,
            eta_seconds: None,
        }
    }

    /// Add `weight` to the tally matching `support`. The other two pass through.
    pub fn tally(&mut self, support: Support, weight: U256) {
        let field = match support {
            Support::For => &mut self.votes_for,
            Support::Against => &mut self.votes_against,
            Support::Abstain => &mut self.votes_abstains,
        };
        *field = field.saturating_add(weight);
    }

    pub fn mark_canceled(&mut self) {
        self.is_canceled = true;
    }

    pub fn mark_executed(&mut self) {
        self.is_executed = true;
    }

    pub fn mark_queued(&mut self, eta_seconds: U256) {
        self.is_queued = true;
        self.eta_seconds = Some(eta_seconds);
    }

    pub fn total_votes(&self) -> U256 {
        self.votes_for
            .saturating_add(self.votes_against)
            .saturating_add(self.votes_abstains)
    }
}

/// One cast vote. Never mutated after it is written.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Vote {
    pub id: String,
    pub proposal_id: U256,
    pub voter: Address,
    /// Raw support byte from the log (0 against, 1 for, 2 abstain).
    pub support: u8,
    pub weight: U256,
    pub reason: String,
    pub block_number: u64,
    /// Unix seconds.
    pub timestamp: u64,
}
