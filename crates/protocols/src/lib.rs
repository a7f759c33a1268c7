//! Chain access for concentrated liquidity positions: ABI encoding, JSON-RPC
//! transport, the deployment registry, and the locate, read and index
//! operations built on them.

/// Calldata encoding and result decoding.
pub mod abi;
/// Error taxonomy of the orchestrating operations.
pub mod error;
/// Wallet position enumeration.
pub mod indexer;
/// Concurrent search for the deployment holding a position id.
pub mod locator;
/// Position state assembly.
pub mod reader;
/// Networks and protocol deployments.
pub mod registry;
/// JSON-RPC `eth_call` transport.
pub mod rpc;

#[cfg(test)]
mod testing;

/// Prelude module for convenient imports.
///
/// ```rust
/// use clmm_lens_protocols::prelude::*;
/// ```
pub mod prelude {
    // Operations
    pub use crate::indexer::{IndexerConfig, WalletIndexer, WalletPosition, WalletPositions};
    pub use crate::locator::{LocatedPosition, LocatorConfig, PositionLocator};
    pub use crate::reader::{
        FeeFallbackPolicy, MarketInputs, PositionReader, ReadRequest, ReaderConfig,
    };

    // Configuration
    pub use crate::registry::{Candidate, CandidateFilter, NetworkEndpoint, Registry};

    // Transport
    pub use crate::rpc::{BlockTag, CallError, EthCall, RpcConfig, RpcProvider};

    pub use crate::error::{LensError, Result};
}
