//! In-memory chain used by the locator, reader and indexer tests.

use crate::abi::AbiValue;
use crate::registry::{Deployment, NetworkEndpoint, ProtocolDescriptor, Registry};
use crate::rpc::{BlockTag, CallError, EthCall, RpcError};
use async_trait::async_trait;
use clmm_lens_domain::entities::Address;
use clmm_lens_domain::enums::ProtocolId;
use primitive_types::U256;
use std::collections::{BTreeMap, HashMap};
use std::sync::Mutex;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::time::Duration;

pub(crate) type Handler = Box<dyn Fn(&[u8]) -> Result<Vec<u8>, CallError> + Send + Sync>;

/// Contracts keyed by (network, address), each answering by calldata.
#[derive(Default)]
pub(crate) struct MockChain {
    contracts: HashMap<(String, Address), Handler>,
    delays: HashMap<String, Duration>,
    block: Option<u64>,
    pub started: AtomicUsize,
    pub completed: AtomicUsize,
    pub calls: Mutex<Vec<(String, Address, [u8; 4], BlockTag)>>,
}

impl MockChain {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_contract(
        mut self,
        network: &str,
        address: Address,
        handler: impl Fn(&[u8]) -> Result<Vec<u8>, CallError> + Send + Sync + 'static,
    ) -> Self {
        self.contracts
            .insert((network.to_string(), address), Box::new(handler));
        self
    }

    pub fn with_delay(mut self, network: &str, delay: Duration) -> Self {
        self.delays.insert(network.to_string(), delay);
        self
    }

    pub fn with_block(mut self, block: u64) -> Self {
        self.block = Some(block);
        self
    }

    /// Selectors called so far, in order.
    pub fn selectors(&self) -> Vec<[u8; 4]> {
        self.calls
            .lock()
            .map(|calls| calls.iter().map(|c| c.2).collect())
            .unwrap_or_default()
    }

    pub fn blocks(&self) -> Vec<BlockTag> {
        self.calls
            .lock()
            .map(|calls| calls.iter().map(|c| c.3).collect())
            .unwrap_or_default()
    }
}

#[async_trait]
impl EthCall for MockChain {
    async fn eth_call(
        &self,
        endpoint: &NetworkEndpoint,
        to: Address,
        data: &[u8],
        block: BlockTag,
    ) -> Result<Vec<u8>, CallError> {
        self.started.fetch_add(1, Ordering::SeqCst);
        if let Some(delay) = self.delays.get(&endpoint.name) {
            tokio::time::sleep(*delay).await;
        }
        self.completed.fetch_add(1, Ordering::SeqCst);

        let mut selector = [0u8; 4];
        selector.copy_from_slice(&data[..4]);
        if let Ok(mut calls) = self.calls.lock() {
            calls.push((endpoint.name.clone(), to, selector, block));
        }

        match self.contracts.get(&(endpoint.name.clone(), to)) {
            Some(handler) => handler(data),
            None => Err(RpcError::EmptyResult.into()),
        }
    }

    async fn block_number(&self, _endpoint: &NetworkEndpoint) -> Result<u64, CallError> {
        self.block
            .ok_or_else(|| RpcError::InvalidResult("no block".to_string()).into())
    }
}

pub(crate) fn manager_address(n: u8) -> Address {
    Address([0xa0 + n; 20])
}

pub(crate) fn factory_address(n: u8) -> Address {
    Address([0xf0 + n; 20])
}

/// One Uniswap V3 deployment per named network.
pub(crate) fn registry(networks: &[&str]) -> Registry {
    let endpoints = networks
        .iter()
        .enumerate()
        .map(|(i, name)| NetworkEndpoint {
            name: name.to_string(),
            chain_id: 1000 + i as u64,
            rpc_url: format!("http://{name}.invalid"),
            explorer_url: format!("https://{name}.explorer.invalid"),
        })
        .collect();
    let deployments: BTreeMap<String, Deployment> = networks
        .iter()
        .enumerate()
        .map(|(i, name)| {
            (
                name.to_string(),
                Deployment {
                    position_manager: manager_address(i as u8),
                    factory: factory_address(i as u8),
                },
            )
        })
        .collect();
    Registry::new(
        endpoints,
        vec![ProtocolDescriptor {
            id: ProtocolId::UniswapV3,
            deployments,
        }],
    )
}

/// Concatenates words into a call result.
pub(crate) fn words(values: &[AbiValue]) -> Vec<u8> {
    values.iter().flat_map(|v| v.to_word()).collect()
}

/// ABI-encoded dynamic string result.
pub(crate) fn string_result(s: &str) -> Vec<u8> {
    let mut out = words(&[
        AbiValue::Uint(U256::from(32u8)),
        AbiValue::Uint(U256::from(s.len() as u64)),
    ]);
    let mut padded = s.as_bytes().to_vec();
    padded.resize(s.len().div_ceil(32).max(1) * 32, 0);
    out.extend_from_slice(&padded);
    out
}

pub(crate) fn reverted() -> CallError {
    RpcError::Reverted {
        code: 3,
        message: "execution reverted: Invalid token ID".to_string(),
    }
    .into()
}
