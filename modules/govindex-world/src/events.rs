//! Decoded Governor contract events.
//!
//! One variant per log kind the indexer consumes. Field names mirror the
//! Solidity event parameters; 256-bit values stay 256-bit.

use alloy_primitives::{Address, Bytes, B256, U256};
use govindex_engine::EventLike;
use serde::{Deserialize, Serialize};

/// A decoded log plus the block/transaction metadata it was emitted under.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GovernorLog {
    /// The governor contract that emitted the log.
    pub src_address: Address,
    pub block_number: u64,
    /// Unix seconds.
    pub block_timestamp: u64,
    pub log_index: u64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub transaction_hash: Option<B256>,
    pub event: GovernorEvent,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type")]
pub enum GovernorEvent {
    ProposalCreated(ProposalCreated),
    VoteCast(VoteCast),
    VoteCastWithParams(VoteCastWithParams),
    ProposalCanceled(ProposalCanceled),
    ProposalExecuted(ProposalExecuted),
    ProposalQueued(ProposalQueued),
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ProposalCreated {
    pub proposal_id: U256,
    pub proposer: Address,
    pub targets: Vec<Address>,
    pub values: Vec<U256>,
    pub signatures: Vec<String>,
    pub calldatas: Vec<Bytes>,
    pub vote_start: U256,
    pub vote_end: U256,
    pub description: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct VoteCast {
    pub voter: Address,
    pub proposal_id: U256,
    pub support: u8,
    pub weight: U256,
    #[serde(default)]
    pub reason: String,
}

/// `VoteCast` with the extra ABI-encoded params blob. The blob is carried but
/// not interpreted.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct VoteCastWithParams {
    pub voter: Address,
    pub proposal_id: U256,
    pub support: u8,
    pub weight: U256,
    #[serde(default)]
    pub reason: String,
    #[serde(default)]
    pub params: Bytes,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ProposalCanceled {
    pub proposal_id: U256,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ProposalExecuted {
    pub proposal_id: U256,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ProposalQueued {
    pub proposal_id: U256,
    pub eta_seconds: U256,
}

impl GovernorEvent {
    /// Every governor event references exactly one proposal.
    pub fn proposal_id(&self) -> U256 {
        match self {
            GovernorEvent::ProposalCreated(e) => e.proposal_id,
            GovernorEvent::VoteCast(e) => e.proposal_id,
            GovernorEvent::VoteCastWithParams(e) => e.proposal_id,
            GovernorEvent::ProposalCanceled(e) => e.proposal_id,
            GovernorEvent::ProposalExecuted(e) => e.proposal_id,
            GovernorEvent::ProposalQueued(e) => e.proposal_id,
        }
    }

    pub fn name(&self) -> &'static str {
        match self {
            GovernorEvent::ProposalCreated(_) => "ProposalCreated",
            GovernorEvent::VoteCast(_) => "VoteCast",
            GovernorEvent::VoteCastWithParams(_) => "VoteCastWithParams",
            GovernorEvent::ProposalCanceled(_) => "ProposalCanceled",
            GovernorEvent::ProposalExecuted(_) => "ProposalExecuted",
            GovernorEvent::ProposalQueued(_) => "ProposalQueued",
        }
    }
}

impl EventLike for GovernorLog {
    fn event_type_str(&self) -> &'static str {
        self.event.name()
    }

    fn key(&self) -> String {
        self.event.proposal_id().to_string()
    }
}
