//! JSON-RPC transport: one `eth_call` against one endpoint, one timeout, no
//! retries. Retrying belongs to the callers that orchestrate many calls.

mod error;
mod provider;
mod types;

pub use error::{CallError, RpcError, TransportError};
pub use provider::{RpcConfig, RpcProvider};
pub use types::{BlockTag, CallObject, JsonRpcErrorObject, JsonRpcRequest, JsonRpcResponse};

use crate::registry::NetworkEndpoint;
use async_trait::async_trait;
use clmm_lens_domain::entities::Address;

/// Read-only contract calls against a network.
///
/// The seam between orchestration and the wire; tests substitute in-memory
/// implementations.
#[async_trait]
pub trait EthCall: Send + Sync {
    /// Executes `eth_call` and returns the raw result bytes.
    async fn eth_call(
        &self,
        endpoint: &NetworkEndpoint,
        to: Address,
        data: &[u8],
        block: BlockTag,
    ) -> Result<Vec<u8>, CallError>;

    /// Latest block number of the endpoint.
    async fn block_number(&self, endpoint: &NetworkEndpoint) -> Result<u64, CallError>;
}
