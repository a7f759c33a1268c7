use crate::abi::DecodeError;
use crate::registry::ConfigError;
use crate::rpc::{CallError, RpcError, TransportError};
use clmm_lens_domain::error::MathError;
use thiserror::Error;

/// Failure of a locate, read or index operation.
#[derive(Debug, Error)]
pub enum LensError {
    /// A required call could not reach its endpoint.
    #[error("transport error: {0}")]
    Transport(#[from] TransportError),
    /// A required call was answered with an error.
    #[error("rpc error: {0}")]
    Rpc(#[from] RpcError),
    /// A required result could not be decoded.
    #[error("decode error: {0}")]
    Decode(#[from] DecodeError),
    /// The position or its pool does not exist where it was looked for.
    #[error("not found: {0}")]
    NotFound(String),
    /// Some candidates could not be reached, so absence cannot be concluded.
    #[error("network unreachable: {failed} of {scanned} candidates failed at the transport layer")]
    NetworkUnreachable { failed: usize, scanned: usize },
    /// A tick or derived price is outside representable bounds.
    #[error("range error: {0}")]
    Range(#[from] MathError),
    /// Tick data for fee accounting failed under the strict fee policy.
    #[error("tick data for fee accounting unavailable: {0}")]
    FeeTicksUnavailable(CallError),
    #[error("configuration error: {0}")]
    Config(#[from] ConfigError),
    #[error("invalid input: {0}")]
    InvalidInput(String),
}

impl From<CallError> for LensError {
    fn from(e: CallError) -> Self {
        match e {
            CallError::Transport(t) => LensError::Transport(t),
            CallError::Rpc(r) => LensError::Rpc(r),
        }
    }
}

pub type Result<T> = std::result::Result<T, LensError>;
