//! Finds which deployment hosts a position id.
//!
//! Position ids are assigned independently by every position manager, so the
//! same id can exist on several deployments or none. The locator probes every
//! candidate at once and keeps the first one that decodes to a real position;
//! the rest are cancelled before [`PositionLocator::locate`] returns.

use crate::abi::calls;
use crate::error::{LensError, Result};
use crate::registry::{Candidate, CandidateFilter, Registry};
use crate::rpc::{BlockTag, CallError, EthCall, TransportError};
use clmm_lens_domain::entities::PositionRaw;
use primitive_types::U256;
use serde::Serialize;
use std::sync::Arc;
use std::time::Duration;
use tokio::task::JoinSet;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

/// Configuration for the locator.
#[derive(Debug, Clone)]
pub struct LocatorConfig {
    /// Upper bound on concurrently probed candidates.
    pub max_candidates: usize,
    /// Retry a candidate once after a transport failure.
    pub retry_once: bool,
    /// Delay before that retry.
    pub retry_backoff: Duration,
}

impl Default for LocatorConfig {
    fn default() -> Self {
        Self {
            max_candidates: 20,
            retry_once: true,
            retry_backoff: Duration::from_millis(250),
        }
    }
}

/// A position together with the deployment that holds it.
#[derive(Debug, Clone, Serialize)]
pub struct LocatedPosition {
    pub candidate: Candidate,
    pub position: PositionRaw,
}

/// Outcome of probing one candidate.
#[derive(Debug)]
enum Probe {
    Found(Box<LocatedPosition>),
    /// The deployment answered and does not hold the id.
    Missing,
    /// The deployment could not be asked.
    Unreachable(TransportError),
    /// The deployment answered with something other than a verdict on the id.
    Inconclusive(String),
    Cancelled,
}

/// Concurrent first-success search over the registry's candidates.
pub struct PositionLocator {
    /// Call transport.
    client: Arc<dyn EthCall>,
    /// Networks and deployments.
    registry: Arc<Registry>,
    /// Configuration.
    config: LocatorConfig,
}

impl PositionLocator {
    /// Creates a new locator.
    pub fn new(client: Arc<dyn EthCall>, registry: Arc<Registry>, config: LocatorConfig) -> Self {
        Self {
            client,
            registry,
            config,
        }
    }

    /// Finds the deployment holding `token_id`.
    ///
    /// Returns [`LensError::NotFound`] only when every candidate answered that
    /// the id does not exist. If any candidate failed at the transport layer,
    /// or answered with an error or result that says nothing about the id,
    /// the outcome is [`LensError::NetworkUnreachable`] instead.
    pub async fn locate(&self, token_id: U256, filter: &CandidateFilter) -> Result<LocatedPosition> {
        let mut candidates = self.registry.candidates(filter);
        if candidates.is_empty() {
            return Err(LensError::InvalidInput(format!(
                "no deployment matches network {:?} and protocol {:?}",
                filter.network, filter.protocol
            )));
        }
        if candidates.len() > self.config.max_candidates {
            warn!(
                total = candidates.len(),
                max = self.config.max_candidates,
                "Truncating candidate set"
            );
            candidates.truncate(self.config.max_candidates);
        }
        let scanned = candidates.len();
        info!(token_id = %token_id, candidates = scanned, "Locating position");

        let cancel = CancellationToken::new();
        let mut tasks = JoinSet::new();
        for candidate in candidates {
            let client = Arc::clone(&self.client);
            let token = cancel.child_token();
            let config = self.config.clone();
            tasks.spawn(async move {
                tokio::select! {
                    biased;
                    _ = token.cancelled() => Probe::Cancelled,
                    probe = probe(client, candidate, token_id, config) => probe,
                }
            });
        }

        // Only this loop writes the winner, and only while it is unset; once
        // committed, every other task is cancelled and any late result is
        // discarded. Draining the set guarantees no task outlives this call.
        let mut winner: Option<LocatedPosition> = None;
        let mut failed = 0usize;
        while let Some(joined) = tasks.join_next().await {
            match joined {
                Ok(Probe::Found(found)) => {
                    if winner.is_none() {
                        info!(
                            token_id = %token_id,
                            network = %found.candidate.network.name,
                            protocol = %found.candidate.protocol,
                            "Position located"
                        );
                        winner = Some(*found);
                        cancel.cancel();
                        tasks.abort_all();
                    }
                }
                Ok(Probe::Missing) | Ok(Probe::Cancelled) => {}
                Ok(Probe::Unreachable(e)) => {
                    debug!(error = %e, "Candidate counted as unreachable");
                    failed += 1;
                }
                Ok(Probe::Inconclusive(reason)) => {
                    debug!(reason = %reason, "Candidate counted as inconclusive");
                    failed += 1;
                }
                Err(e) if e.is_cancelled() => {}
                Err(e) => {
                    warn!(error = %e, "Locator probe panicked");
                    failed += 1;
                }
            }
        }

        match winner {
            Some(found) => Ok(found),
            None if failed > 0 => Err(LensError::NetworkUnreachable {
                failed,
                scanned,
            }),
            None => Err(LensError::NotFound(format!(
                "position {token_id} on any of {scanned} deployments"
            ))),
        }
    }
}

async fn probe(
    client: Arc<dyn EthCall>,
    candidate: Candidate,
    token_id: U256,
    config: LocatorConfig,
) -> Probe {
    let data = calls::positions(token_id);
    let mut retried = false;
    loop {
        let result = client
            .eth_call(
                &candidate.network,
                candidate.deployment.position_manager,
                &data,
                BlockTag::Latest,
            )
            .await;

        match result {
            Ok(bytes) => {
                return match calls::decode_positions(token_id, &bytes) {
                    Ok(position) if !position.is_empty() => {
                        Probe::Found(Box::new(LocatedPosition {
                            candidate,
                            position,
                        }))
                    }
                    Ok(_) => Probe::Missing,
                    Err(e) => {
                        warn!(
                            network = %candidate.network.name,
                            protocol = %candidate.protocol,
                            error = %e,
                            "Undecodable positions() result"
                        );
                        Probe::Inconclusive(e.to_string())
                    }
                };
            }
            Err(CallError::Rpc(e)) if e.is_nonexistent() => {
                debug!(
                    network = %candidate.network.name,
                    protocol = %candidate.protocol,
                    error = %e,
                    "Position not held by deployment"
                );
                return Probe::Missing;
            }
            Err(CallError::Rpc(e)) => {
                warn!(
                    network = %candidate.network.name,
                    protocol = %candidate.protocol,
                    error = %e,
                    "Deployment returned an inconclusive error"
                );
                return Probe::Inconclusive(e.to_string());
            }
            Err(CallError::Transport(e)) => {
                if config.retry_once && !retried {
                    debug!(
                        network = %candidate.network.name,
                        error = %e,
                        "Retrying candidate after transport failure"
                    );
                    retried = true;
                    tokio::time::sleep(config.retry_backoff).await;
                    continue;
                }
                warn!(
                    network = %candidate.network.name,
                    protocol = %candidate.protocol,
                    error = %e,
                    "Candidate unreachable"
                );
                return Probe::Unreachable(e);
            }
        }
    }
}
