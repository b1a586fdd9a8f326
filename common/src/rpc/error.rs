use crate::{abi::AbiError, config::USER_REJECTED_REQUEST_CODE};
use thiserror::Error;

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum RpcError {
    // Node unreachable, connection dropped, HTTP failure: the request may be retried
    #[error("Transport error: {0}")]
    Transport(String),

    // The node answered with a JSON-RPC error object
    #[error("Node error {code}: {message}")]
    Node { code: i64, message: String },

    // The account holder declined the request
    #[error("Request rejected by user: {0}")]
    UserRejected(String),

    #[error("Invalid response: {0}")]
    InvalidResponse(String),

    #[error(transparent)]
    Abi(#[from] AbiError),
}

impl RpcError {
    // Build the error matching a JSON-RPC error object
    pub fn from_node(code: i64, message: String) -> Self {
        if code == USER_REJECTED_REQUEST_CODE {
            Self::UserRejected(message)
        } else {
            Self::Node { code, message }
        }
    }

    pub fn get_code(&self) -> Option<i64> {
        match self {
            Self::Node { code, .. } => Some(*code),
            Self::UserRejected(_) => Some(USER_REJECTED_REQUEST_CODE),
            _ => None,
        }
    }

    pub fn is_transport(&self) -> bool {
        matches!(self, Self::Transport(_))
    }
}
