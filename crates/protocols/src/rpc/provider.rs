use super::EthCall;
use super::error::{CallError, RpcError, TransportError};
use super::types::{BlockTag, CallObject, JsonRpcRequest, JsonRpcResponse, parse_quantity};
use crate::abi::{decode_hex, encode_hex};
use crate::registry::NetworkEndpoint;
use async_trait::async_trait;
use clmm_lens_domain::entities::Address;
use serde_json::{Value, json};
use std::sync::atomic::{AtomicU64, Ordering};
use std::time::Duration;
use tracing::{debug, warn};

/// Environment variable overriding the per-call timeout in seconds.
pub const RPC_TIMEOUT_ENV: &str = "CLMM_LENS_RPC_TIMEOUT_SECS";

/// Configuration for the RPC provider.
#[derive(Debug, Clone)]
pub struct RpcConfig {
    /// Timeout applied to every call, independent of any batch.
    pub timeout: Duration,
}

impl RpcConfig {
    /// Shortest timeout accepted from configuration.
    pub const MIN_TIMEOUT_SECS: u64 = 10;
    /// Longest timeout accepted from configuration.
    pub const MAX_TIMEOUT_SECS: u64 = 20;

    /// Timeout in seconds, clamped to the supported window.
    pub fn with_timeout_secs(secs: u64) -> Self {
        Self {
            timeout: Duration::from_secs(secs.clamp(Self::MIN_TIMEOUT_SECS, Self::MAX_TIMEOUT_SECS)),
        }
    }

    /// Reads [`RPC_TIMEOUT_ENV`], falling back to the default.
    pub fn from_env() -> Self {
        match std::env::var(RPC_TIMEOUT_ENV) {
            Ok(raw) => match raw.trim().parse::<u64>() {
                Ok(secs) => Self::with_timeout_secs(secs),
                Err(_) => {
                    warn!(value = %raw, "Ignoring unparsable RPC timeout");
                    Self::default()
                }
            },
            Err(_) => Self::default(),
        }
    }
}

impl Default for RpcConfig {
    fn default() -> Self {
        Self {
            timeout: Duration::from_secs(15),
        }
    }
}

/// HTTP JSON-RPC client shared by every call of one invocation.
pub struct RpcProvider {
    /// HTTP client carrying the timeout.
    client: reqwest::Client,
    /// Configuration.
    config: RpcConfig,
    /// Request id counter.
    next_id: AtomicU64,
}

impl RpcProvider {
    /// Creates a new provider.
    pub fn new(config: RpcConfig) -> Result<Self, TransportError> {
        let client = reqwest::Client::builder()
            .timeout(config.timeout)
            .build()
            .map_err(|e| TransportError::Connect(e.to_string()))?;
        Ok(Self {
            client,
            config,
            next_id: AtomicU64::new(1),
        })
    }

    /// Returns the configuration.
    pub fn config(&self) -> &RpcConfig {
        &self.config
    }

    /// Sends one request and returns its `result` value.
    async fn request(&self, url: &str, method: &str, params: Value) -> Result<Value, CallError> {
        let id = self.next_id.fetch_add(1, Ordering::Relaxed);
        let request = JsonRpcRequest::new(id, method, params);

        let response = self
            .client
            .post(url)
            .json(&request)
            .send()
            .await
            .map_err(TransportError::from)?;
        let status = response.status();
        let body = response.text().await.map_err(TransportError::from)?;

        // A non-success status is a transport failure even when the body
        // carries a JSON-RPC error; throttling nodes answer 429 that way.
        let parsed = serde_json::from_str::<JsonRpcResponse>(&body);
        if !status.is_success() {
            let detail = match &parsed {
                Ok(JsonRpcResponse {
                    error: Some(err), ..
                }) => err.message.as_str(),
                _ => "",
            };
            debug!(method, status = status.as_u16(), detail, "RPC endpoint rejected request");
            return Err(TransportError::Http(status.as_u16()).into());
        }
        match parsed {
            Ok(JsonRpcResponse {
                error: Some(err), ..
            }) => {
                debug!(method, code = err.code, message = %err.message, "RPC returned error");
                Err(RpcError::Reverted {
                    code: err.code,
                    message: err.message,
                }
                .into())
            }
            Ok(JsonRpcResponse {
                result: Some(result),
                ..
            }) => Ok(result),
            Ok(_) => Err(RpcError::InvalidResult("response has no result".to_string()).into()),
            Err(e) => Err(TransportError::InvalidBody(e.to_string()).into()),
        }
    }
}

#[async_trait]
impl EthCall for RpcProvider {
    async fn eth_call(
        &self,
        endpoint: &NetworkEndpoint,
        to: Address,
        data: &[u8],
        block: BlockTag,
    ) -> Result<Vec<u8>, CallError> {
        debug!(network = %endpoint.name, to = %to, block = %block.to_param(), "eth_call");
        let call = CallObject {
            to: to.to_string(),
            data: encode_hex(data),
        };
        let result = self
            .request(&endpoint.rpc_url, "eth_call", json!([call, block.to_param()]))
            .await?;

        let hex = result
            .as_str()
            .ok_or_else(|| RpcError::InvalidResult(result.to_string()))?;
        let bytes = decode_hex(hex).map_err(|e| RpcError::InvalidResult(e.to_string()))?;
        if bytes.is_empty() {
            return Err(RpcError::EmptyResult.into());
        }
        Ok(bytes)
    }

    async fn block_number(&self, endpoint: &NetworkEndpoint) -> Result<u64, CallError> {
        let result = self
            .request(&endpoint.rpc_url, "eth_blockNumber", json!([]))
            .await?;
        result
            .as_str()
            .and_then(parse_quantity)
            .ok_or_else(|| RpcError::InvalidResult(result.to_string()).into())
    }
}
