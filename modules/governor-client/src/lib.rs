pub mod error;
pub mod types;

pub use error::{Result, RpcError};
pub use types::{BlockTag, CallRequest, RpcRequest, RpcResponse};

use std::sync::atomic::{AtomicU64, Ordering};
use std::time::Duration;

use alloy_primitives::{keccak256, Address, U256};

/// Solidity signature of the Governor quorum view.
const QUORUM_SIGNATURE: &str = "quorum(uint256)";

/// Width of one ABI word.
const WORD: usize = 32;

pub struct GovernorClient {
    client: reqwest::Client,
    rpc_url: String,
    next_id: AtomicU64,
}

impl GovernorClient {
    pub fn new(rpc_url: impl Into<String>) -> Self {
        Self::with_client(reqwest::Client::new(), rpc_url)
    }

    /// Build a client whose requests time out after `timeout`.
    pub fn with_timeout(rpc_url: impl Into<String>, timeout: Duration) -> Result<Self> {
        let client = reqwest::Client::builder().timeout(timeout).build()?;
        Ok(Self::with_client(client, rpc_url))
    }

    pub fn with_client(client: reqwest::Client, rpc_url: impl Into<String>) -> Self {
        Self {
            client,
            rpc_url: rpc_url.into(),
            next_id: AtomicU64::new(1),
        }
    }

    pub fn rpc_url(&self) -> &str {
        &self.rpc_url
    }

    /// Read `quorum(timepoint)` from the governor at `governor`.
    ///
    /// The governor answers from its checkpoint history, so the value is the
    /// one in force at `timepoint` even though the call executes at `latest`.
    pub async fn quorum(&self, governor: Address, timepoint: U256) -> Result<U256> {
        let data = quorum_calldata(timepoint);
        let raw = self.eth_call(governor, &data, BlockTag::Latest).await?;
        let quorum = decode_uint256(&raw)?;
        tracing::debug!(%governor, %timepoint, %quorum, "Read governor quorum");
        Ok(quorum)
    }

    /// Issue a read-only `eth_call` and return the raw hex result.
    pub async fn eth_call(&self, to: Address, data: &[u8], block: BlockTag) -> Result<String> {
        let call = CallRequest {
            to: format!("0x{}", hex::encode(to.as_slice())),
            data: format!("0x{}", hex::encode(data)),
        };
        let id = self.next_id.fetch_add(1, Ordering::Relaxed);
        let request = RpcRequest::new(id, "eth_call", (call, block));

        let resp = self.client.post(&self.rpc_url).json(&request).send().await?;

        let status = resp.status();
        if !status.is_success() {
            let body = resp.text().await.unwrap_or_default();
            return Err(RpcError::Http {
                status: status.as_u16(),
                message: body,
            });
        }

        let body: RpcResponse<String> = resp.json().await?;
        if let Some(err) = body.error {
            return Err(RpcError::Rpc {
                code: err.code,
                message: err.message,
            });
        }

        body.result
            .ok_or_else(|| RpcError::Parse("response carried neither result nor error".into()))
    }
}

/// ABI calldata for `quorum(uint256)`: 4-byte selector plus one word.
pub fn quorum_calldata(timepoint: U256) -> Vec<u8> {
    let selector = keccak256(QUORUM_SIGNATURE.as_bytes());
    let mut data = Vec::with_capacity(4 + WORD);
    data.extend_from_slice(&selector[..4]);
    data.extend_from_slice(&timepoint.to_be_bytes::<WORD>());
    data
}

/// Decode the first ABI word of an `eth_call` result as `uint256`.
pub fn decode_uint256(raw: &str) -> Result<U256> {
    let stripped = raw.strip_prefix("0x").unwrap_or(raw);
    let bytes = hex::decode(stripped)?;
    if bytes.len() < WORD {
        return Err(RpcError::Decode(format!(
            "expected at least {WORD} bytes, got {}",
            bytes.len()
        )));
    }
    U256::try_from_be_slice(&bytes[..WORD])
        .ok_or_else(|| RpcError::Decode("word does not fit uint256".into()))
}
