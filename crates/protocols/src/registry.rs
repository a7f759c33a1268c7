//! Network endpoints and protocol deployments.
//!
//! The registry is built once per process and handed to the locator, reader
//! and indexer behind an `Arc`; nothing looks addresses up from global state.

use clmm_lens_domain::entities::Address;
use clmm_lens_domain::enums::ProtocolId;
use serde::Serialize;
use std::collections::BTreeMap;
use thiserror::Error;
use tracing::debug;

/// Prefix of the per-network RPC override variables, e.g.
/// `CLMM_LENS_RPC_ARBITRUM`.
pub const RPC_ENV_PREFIX: &str = "CLMM_LENS_RPC_";

/// Invalid registry configuration.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ConfigError {
    #[error("unknown network: {0}")]
    UnknownNetwork(String),
    #[error("invalid address {address} for {context}")]
    InvalidAddress { context: String, address: String },
    #[error("invalid RPC URL for {network}: {url}")]
    InvalidRpcUrl { network: String, url: String },
}

/// One chain and the node it is read through.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct NetworkEndpoint {
    /// Lowercase network name, the registry key.
    pub name: String,
    pub chain_id: u64,
    pub rpc_url: String,
    /// Block explorer base URL.
    pub explorer_url: String,
}

/// Contracts of one protocol on one network.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct Deployment {
    /// NonfungiblePositionManager.
    pub position_manager: Address,
    pub factory: Address,
}

/// A protocol and its deployments by network name.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ProtocolDescriptor {
    pub id: ProtocolId,
    pub deployments: BTreeMap<String, Deployment>,
}

/// A (network, protocol) pair that may host a position.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Candidate {
    pub network: NetworkEndpoint,
    pub protocol: ProtocolId,
    pub deployment: Deployment,
}

/// Narrows the candidate space before fan-out.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CandidateFilter {
    pub network: Option<String>,
    pub protocol: Option<ProtocolId>,
}

/// Immutable network and protocol tables.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Registry {
    networks: Vec<NetworkEndpoint>,
    protocols: Vec<ProtocolDescriptor>,
}

// (name, chain id, rpc, explorer)
const BUILTIN_NETWORKS: &[(&str, u64, &str, &str)] = &[
    ("ethereum", 1, "https://1rpc.io/eth", "https://etherscan.io"),
    ("arbitrum", 42161, "https://1rpc.io/arb", "https://arbiscan.io"),
    ("polygon", 137, "https://1rpc.io/matic", "https://polygonscan.com"),
    ("base", 8453, "https://1rpc.io/base", "https://basescan.org"),
    ("optimism", 10, "https://1rpc.io/op", "https://optimistic.etherscan.io"),
    ("bsc", 56, "https://1rpc.io/bnb", "https://bscscan.com"),
];

// (protocol, network, position manager, factory)
const BUILTIN_DEPLOYMENTS: &[(ProtocolId, &str, &str, &str)] = &[
    (ProtocolId::UniswapV3, "ethereum", "0xC36442b4a4522E871399CD717aBDD847Ab11FE88", "0x1F98431c8aD98523631AE4a59f267346ea31F984"),
    (ProtocolId::UniswapV3, "arbitrum", "0xC36442b4a4522E871399CD717aBDD847Ab11FE88", "0x1F98431c8aD98523631AE4a59f267346ea31F984"),
    (ProtocolId::UniswapV3, "polygon", "0xC36442b4a4522E871399CD717aBDD847Ab11FE88", "0x1F98431c8aD98523631AE4a59f267346ea31F984"),
    (ProtocolId::UniswapV3, "optimism", "0xC36442b4a4522E871399CD717aBDD847Ab11FE88", "0x1F98431c8aD98523631AE4a59f267346ea31F984"),
    (ProtocolId::UniswapV3, "base", "0x03a520b32C04BF3bEEf7BEb72E919cf822Ed34f1", "0x33128a8fC17869897dcE68Ed026d694621f6FDfD"),
    (ProtocolId::PancakeSwapV3, "ethereum", "0x46A15B0b27311cedF172AB29E4f4766fbE7F4364", "0x0BFbCF9fa4f9C56B0F40a671Ad40E0805A091865"),
    (ProtocolId::PancakeSwapV3, "bsc", "0x46A15B0b27311cedF172AB29E4f4766fbE7F4364", "0x0BFbCF9fa4f9C56B0F40a671Ad40E0805A091865"),
    (ProtocolId::PancakeSwapV3, "base", "0x46A15B0b27311cedF172AB29E4f4766fbE7F4364", "0x0BFbCF9fa4f9C56B0F40a671Ad40E0805A091865"),
    (ProtocolId::PancakeSwapV3, "arbitrum", "0x427bF5b37357632377eCbEC9de3626C71A5396c1", "0x0BFbCF9fa4f9C56B0F40a671Ad40E0805A091865"),
    (ProtocolId::SushiSwapV3, "ethereum", "0x2214A42d8e2A1d20635C2cb0664422c528b6A432", "0xbACEB8eC6b9355Dfc0269C18bac9d6E2Bdc29C4F"),
    (ProtocolId::SushiSwapV3, "arbitrum", "0xF0cBce1942a68BEB3d1b73F0dd86c8DCc363eF49", "0x1af415a1EbA07a4986a52B6f2e7dE7003D82231e"),
    (ProtocolId::SushiSwapV3, "polygon", "0xb7402ee99F0A008e461098AC3a27F4957Df89a40", "0x917933899c6a5f8E37F31E19f92CdbFf7e8ff0e2"),
    (ProtocolId::SushiSwapV3, "base", "0x80C7DD17B01855a6D2347444a0FCC36136a314de", "0xc35DADB65012eC5796536bD9864eD8773aBc74C4"),
    (ProtocolId::SushiSwapV3, "optimism", "0x1af415a1EbA07a4986a52B6f2e7dE7003D82231e", "0x9c6522117e2ed1fE5bdb72bb0eD5E3f2bdE7DBe0"),
];

fn parse_address(raw: &str, context: String) -> Result<Address, ConfigError> {
    raw.parse().map_err(|_| ConfigError::InvalidAddress {
        context,
        address: raw.to_string(),
    })
}

impl Registry {
    pub fn new(networks: Vec<NetworkEndpoint>, protocols: Vec<ProtocolDescriptor>) -> Self {
        Self {
            networks,
            protocols,
        }
    }

    /// Six EVM networks and the three V3 deployments on them.
    pub fn builtin() -> Result<Self, ConfigError> {
        let networks = BUILTIN_NETWORKS
            .iter()
            .map(|(name, chain_id, rpc, explorer)| NetworkEndpoint {
                name: name.to_string(),
                chain_id: *chain_id,
                rpc_url: rpc.to_string(),
                explorer_url: explorer.to_string(),
            })
            .collect();

        let mut protocols: Vec<ProtocolDescriptor> = ProtocolId::ALL
            .iter()
            .map(|id| ProtocolDescriptor {
                id: *id,
                deployments: BTreeMap::new(),
            })
            .collect();
        for (id, network, manager, factory) in BUILTIN_DEPLOYMENTS {
            let context = format!("{id} on {network}");
            let deployment = Deployment {
                position_manager: parse_address(manager, context.clone())?,
                factory: parse_address(factory, context)?,
            };
            if let Some(descriptor) = protocols.iter_mut().find(|p| p.id == *id) {
                descriptor.deployments.insert(network.to_string(), deployment);
            }
        }

        Ok(Self::new(networks, protocols))
    }

    /// Built-in tables with `CLMM_LENS_RPC_<NETWORK>` overrides applied.
    pub fn from_env() -> Result<Self, ConfigError> {
        let mut registry = Self::builtin()?;
        let names: Vec<String> = registry.networks.iter().map(|n| n.name.clone()).collect();
        for name in names {
            let var = format!("{RPC_ENV_PREFIX}{}", name.to_uppercase());
            if let Ok(url) = std::env::var(&var) {
                debug!(network = %name, var = %var, "Overriding RPC URL from environment");
                registry = registry.with_rpc_override(&name, &url)?;
            }
        }
        Ok(registry)
    }

    /// Replaces one network's RPC URL.
    pub fn with_rpc_override(mut self, network: &str, url: &str) -> Result<Self, ConfigError> {
        let url = url.trim();
        if !(url.starts_with("http://") || url.starts_with("https://")) {
            return Err(ConfigError::InvalidRpcUrl {
                network: network.to_string(),
                url: url.to_string(),
            });
        }
        let endpoint = self
            .networks
            .iter_mut()
            .find(|n| n.name.eq_ignore_ascii_case(network))
            .ok_or_else(|| ConfigError::UnknownNetwork(network.to_string()))?;
        endpoint.rpc_url = url.to_string();
        Ok(self)
    }

    pub fn networks(&self) -> &[NetworkEndpoint] {
        &self.networks
    }

    pub fn protocols(&self) -> &[ProtocolDescriptor] {
        &self.protocols
    }

    pub fn network(&self, name: &str) -> Option<&NetworkEndpoint> {
        self.networks.iter().find(|n| n.name.eq_ignore_ascii_case(name))
    }

    pub fn deployment(&self, network: &str, protocol: ProtocolId) -> Option<Deployment> {
        let network = network.to_ascii_lowercase();
        self.protocols
            .iter()
            .find(|p| p.id == protocol)
            .and_then(|p| p.deployments.get(&network).copied())
    }

    /// Network x protocol pairs that have a deployment, narrowed by `filter`.
    ///
    /// Ordered by network, then protocol, as configured.
    pub fn candidates(&self, filter: &CandidateFilter) -> Vec<Candidate> {
        let mut out = Vec::new();
        for network in &self.networks {
            if filter
                .network
                .as_ref()
                .is_some_and(|wanted| !network.name.eq_ignore_ascii_case(wanted))
            {
                continue;
            }
            for protocol in &self.protocols {
                if filter.protocol.is_some_and(|p| p != protocol.id) {
                    continue;
                }
                if let Some(deployment) = protocol.deployments.get(&network.name) {
                    out.push(Candidate {
                        network: network.clone(),
                        protocol: protocol.id,
                        deployment: *deployment,
                    });
                }
            }
        }
        out
    }
}
