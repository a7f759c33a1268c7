//! Lists the positions a wallet holds on one network.
//!
//! Position managers are ERC-721 enumerable, so each protocol is walked with
//! `balanceOf` followed by `tokenOfOwnerByIndex`. Protocols are indexed
//! concurrently and independently: one failing deployment is reported in the
//! result and never hides the positions found on the others.

use crate::abi::calls;
use crate::error::{LensError, Result};
use crate::reader::UNKNOWN_SYMBOL;
use crate::registry::{Candidate, CandidateFilter, ConfigError, Registry};
use crate::rpc::{BlockTag, EthCall};
use clmm_lens_domain::entities::{Address, PositionRaw, normalize_symbol};
use clmm_lens_domain::enums::ProtocolId;
use clmm_lens_domain::fees::FeeTier;
use primitive_types::U256;
use serde::Serialize;
use std::collections::{HashMap, HashSet};
use std::sync::Arc;
use tokio::task::JoinSet;
use tracing::{debug, info, warn};

/// Configuration for the indexer.
#[derive(Debug, Clone)]
pub struct IndexerConfig {
    /// Positions enumerated per protocol; wallets holding more are truncated.
    pub max_positions_per_protocol: usize,
}

impl Default for IndexerConfig {
    fn default() -> Self {
        Self {
            max_positions_per_protocol: 50,
        }
    }
}

/// Summary of one position owned by a wallet.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct WalletPosition {
    pub protocol: ProtocolId,
    pub token_id: U256,
    /// `None` when the factory lookup failed.
    pub pool: Option<Address>,
    pub token0_symbol: String,
    pub token1_symbol: String,
    pub fee: FeeTier,
    pub tick_lower: i32,
    pub tick_upper: i32,
    pub liquidity: u128,
    /// Holds liquidity.
    pub active: bool,
}

/// A protocol that could not be indexed.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ProtocolFailure {
    pub protocol: ProtocolId,
    pub error: String,
}

#[derive(Debug, Clone, Serialize)]
pub struct WalletPositions {
    pub network: String,
    pub wallet: Address,
    /// Active positions first, then by token id, newest first.
    pub positions: Vec<WalletPosition>,
    pub failures: Vec<ProtocolFailure>,
}

pub struct WalletIndexer {
    client: Arc<dyn EthCall>,
    registry: Arc<Registry>,
    config: IndexerConfig,
}

impl WalletIndexer {
    pub fn new(client: Arc<dyn EthCall>, registry: Arc<Registry>, config: IndexerConfig) -> Self {
        Self {
            client,
            registry,
            config,
        }
    }

    /// Lists every position `wallet` holds on `network`, optionally limited
    /// to one protocol.
    pub async fn list_positions(
        &self,
        network: &str,
        wallet: Address,
        protocol: Option<ProtocolId>,
    ) -> Result<WalletPositions> {
        let endpoint = self
            .registry
            .network(network)
            .ok_or_else(|| ConfigError::UnknownNetwork(network.to_string()))?;
        let candidates = self.registry.candidates(&CandidateFilter {
            network: Some(endpoint.name.clone()),
            protocol,
        });
        if candidates.is_empty() {
            return Err(LensError::InvalidInput(format!(
                "no deployment of {} on {network}",
                protocol.map_or_else(|| "any protocol".to_string(), |p| p.to_string())
            )));
        }
        info!(network = %endpoint.name, wallet = %wallet, protocols = candidates.len(), "Listing wallet positions");

        let mut tasks = JoinSet::new();
        for candidate in candidates {
            let client = Arc::clone(&self.client);
            let limit = self.config.max_positions_per_protocol;
            tasks.spawn(async move {
                let protocol = candidate.protocol;
                (protocol, index_protocol(client, candidate, wallet, limit).await)
            });
        }

        let mut positions = Vec::new();
        let mut failures = Vec::new();
        while let Some(joined) = tasks.join_next().await {
            match joined {
                Ok((_, Ok(found))) => positions.extend(found),
                Ok((protocol, Err(e))) => {
                    warn!(protocol = %protocol, error = %e, "Protocol indexing failed");
                    failures.push(ProtocolFailure {
                        protocol,
                        error: e.to_string(),
                    });
                }
                Err(e) => warn!(error = %e, "Indexing task panicked"),
            }
        }

        positions.sort_by(|a, b| {
            b.active
                .cmp(&a.active)
                .then_with(|| b.token_id.cmp(&a.token_id))
        });
        failures.sort_by_key(|f| f.protocol);

        Ok(WalletPositions {
            network: endpoint.name.clone(),
            wallet,
            positions,
            failures,
        })
    }
}

async fn index_protocol(
    client: Arc<dyn EthCall>,
    candidate: Candidate,
    wallet: Address,
    limit: usize,
) -> Result<Vec<WalletPosition>> {
    let manager = candidate.deployment.position_manager;
    let balance = calls::decode_uint256(
        &client
            .eth_call(&candidate.network, manager, &calls::balance_of(wallet), BlockTag::Latest)
            .await?,
    )?;
    let count = if balance > U256::from(limit as u64) {
        warn!(
            protocol = %candidate.protocol,
            balance = %balance,
            limit,
            "Wallet holds more positions than indexed"
        );
        limit
    } else {
        balance.as_usize()
    };
    debug!(protocol = %candidate.protocol, count, "Enumerating positions");

    // An unreadable id costs only that position.
    let mut reads = JoinSet::new();
    for index in 0..count {
        let client = Arc::clone(&client);
        let candidate = candidate.clone();
        reads.spawn(async move {
            let read = read_owned_position(&client, &candidate, wallet, index).await;
            (index, read)
        });
    }
    let mut found = Vec::with_capacity(count);
    while let Some(joined) = reads.join_next().await {
        match joined {
            Ok((_, Ok(entry))) => found.push(entry),
            Ok((index, Err(e))) => warn!(
                protocol = %candidate.protocol,
                index,
                error = %e,
                "Skipping unreadable position"
            ),
            Err(e) => warn!(error = %e, "Position read task panicked"),
        }
    }

    let symbols = token_symbols(
        &client,
        &candidate,
        found.iter().flat_map(|(position, _)| [position.token0, position.token1]),
    )
    .await;
    let symbol_of = |token: Address| {
        symbols
            .get(&token)
            .cloned()
            .unwrap_or_else(|| UNKNOWN_SYMBOL.to_string())
    };

    Ok(found
        .into_iter()
        .map(|(position, pool)| WalletPosition {
            protocol: candidate.protocol,
            token_id: position.token_id,
            pool,
            token0_symbol: symbol_of(position.token0),
            token1_symbol: symbol_of(position.token1),
            fee: position.fee,
            tick_lower: position.tick_lower,
            tick_upper: position.tick_upper,
            liquidity: position.liquidity,
            active: !position.is_closed(),
        })
        .collect())
}

/// Reads the wallet's `index`-th position and, best effort, its pool.
async fn read_owned_position(
    client: &Arc<dyn EthCall>,
    candidate: &Candidate,
    wallet: Address,
    index: usize,
) -> Result<(PositionRaw, Option<Address>)> {
    let endpoint = &candidate.network;
    let manager = candidate.deployment.position_manager;

    let data = calls::token_of_owner_by_index(wallet, U256::from(index as u64));
    let token_id =
        calls::decode_uint256(&client.eth_call(endpoint, manager, &data, BlockTag::Latest).await?)?;
    let bytes = client
        .eth_call(endpoint, manager, &calls::positions(token_id), BlockTag::Latest)
        .await?;
    let position = calls::decode_positions(token_id, &bytes)?;

    let pool_call = calls::get_pool(position.token0, position.token1, position.fee);
    let pool = match client
        .eth_call(endpoint, candidate.deployment.factory, &pool_call, BlockTag::Latest)
        .await
        .map_err(LensError::from)
        .and_then(|bytes| Ok(calls::decode_address(&bytes)?))
    {
        Ok(pool) if !pool.is_zero() => Some(pool),
        Ok(_) => None,
        Err(e) => {
            debug!(token_id = %token_id, error = %e, "Pool lookup failed");
            None
        }
    };
    Ok((position, pool))
}

/// Symbols of `tokens`, each distinct token queried once. Tokens whose
/// `symbol()` cannot be read are left out.
async fn token_symbols(
    client: &Arc<dyn EthCall>,
    candidate: &Candidate,
    tokens: impl IntoIterator<Item = Address>,
) -> HashMap<Address, String> {
    let unique: HashSet<Address> = tokens.into_iter().collect();
    let mut lookups = JoinSet::new();
    for token in unique {
        let client = Arc::clone(client);
        let endpoint = candidate.network.clone();
        lookups.spawn(async move {
            let symbol = client
                .eth_call(&endpoint, token, &calls::symbol(), BlockTag::Latest)
                .await
                .map_err(LensError::from)
                .and_then(|bytes| Ok(calls::decode_symbol(&bytes)?));
            (token, symbol)
        });
    }

    let mut symbols = HashMap::new();
    while let Some(joined) = lookups.join_next().await {
        match joined {
            Ok((token, Ok(raw))) => {
                symbols.insert(token, normalize_symbol(&raw));
            }
            Ok((token, Err(e))) => {
                debug!(token = %token, error = %e, "Token symbol unavailable");
            }
            Err(e) => warn!(error = %e, "Symbol lookup task panicked"),
        }
    }
    symbols
}
