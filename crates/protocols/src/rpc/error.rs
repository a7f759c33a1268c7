use thiserror::Error;

/// The call never produced a JSON-RPC answer.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum TransportError {
    /// No response within the per-call timeout.
    #[error("request timed out")]
    Timeout,
    /// Connection could not be established.
    #[error("connection failed: {0}")]
    Connect(String),
    /// Endpoint answered with a non-success HTTP status, whatever the body.
    #[error("HTTP status {0}")]
    Http(u16),
    /// Response body is not a JSON-RPC envelope.
    #[error("invalid response body: {0}")]
    InvalidBody(String),
}

/// The node answered, but not with a usable result.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum RpcError {
    /// Structured error object, e.g. `execution reverted`.
    #[error("rpc error {code}: {message}")]
    Reverted { code: i64, message: String },
    /// `0x`: the target holds no code or returned nothing.
    #[error("empty result")]
    EmptyResult,
    /// The result field is missing or not hex.
    #[error("invalid result: {0}")]
    InvalidResult(String),
}

impl RpcError {
    /// Node-side revert code used by `eth_call` for `execution reverted`.
    pub const REVERT_CODE: i64 = 3;

    /// True when the node answered that the call target or id does not exist.
    ///
    /// Reverts (code 3, or any code carrying an `execution reverted` or
    /// `invalid token id` message) and empty results qualify. Rate limits,
    /// missing headers and other node-side errors do not.
    #[must_use]
    pub fn is_nonexistent(&self) -> bool {
        match self {
            RpcError::Reverted { code, message } => {
                let message = message.to_ascii_lowercase();
                *code == Self::REVERT_CODE
                    || message.contains("execution reverted")
                    || message.contains("invalid token id")
            }
            RpcError::EmptyResult => true,
            RpcError::InvalidResult(_) => false,
        }
    }
}

/// Outcome of a single failed call.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum CallError {
    #[error(transparent)]
    Transport(#[from] TransportError),
    #[error(transparent)]
    Rpc(#[from] RpcError),
}

impl CallError {
    /// True when the endpoint could not be reached at all.
    #[must_use]
    pub fn is_transport(&self) -> bool {
        matches!(self, CallError::Transport(_))
    }
}

impl From<reqwest::Error> for TransportError {
    fn from(e: reqwest::Error) -> Self {
        if e.is_timeout() {
            TransportError::Timeout
        } else if e.is_connect() {
            TransportError::Connect(e.to_string())
        } else if let Some(status) = e.status() {
            TransportError::Http(status.as_u16())
        } else if e.is_decode() || e.is_body() {
            TransportError::InvalidBody(e.to_string())
        } else {
            TransportError::Connect(e.to_string())
        }
    }
}
