use std::fmt::Display;

use alloy::{contract, transports};

use crate::decode::DecodeError;

/// Error returned by the watch pipeline.
///
/// Transient conditions (block not yet available, transport hiccups) are
/// retried internally by the components that encounter them; errors of this
/// type surfacing from [`crate::fill::start`] indicate a terminal condition.
#[derive(Debug, thiserror::Error)]
pub enum WatchError {
    #[error("fatal error: {0}")]
    Fatal(String),

    #[error("invalid request: {0}")]
    InvalidRequest(String),

    #[error("unexpected empty RPC response")]
    NullResp,

    #[error("transport error: {0}")]
    Transport(String),

    #[error("unsupported network, chain id: {0}")]
    UnsupportedNetwork(u64),

    #[error("order decode error: {0}")]
    Decode(#[from] DecodeError),
}

impl From<contract::Error> for WatchError {
    fn from(value: contract::Error) -> Self {
        match value {
            contract::Error::TransportError(rpc_err) => Self::from(rpc_err),
            contract::Error::PendingTransactionError(_) => Self::Transport(value.to_string()),
            _ => Self::Fatal(value.to_string()),
        }
    }
}

impl<E: Display> From<transports::RpcError<E>> for WatchError {
    fn from(value: transports::RpcError<E>) -> Self {
        match value {
            transports::RpcError::ErrorResp(ref resp) => {
                let msg = resp.message.to_ascii_lowercase();
                if ((resp.code == -32600 || resp.code == -32601 || resp.code == -32602)
                    && (msg.contains("invalid") || msg.contains("not found")))
                    || (resp.code == -32603
                        && (msg.contains("block by number") || msg.contains("getting block")))
                {
                    Self::InvalidRequest(msg)
                } else {
                    Self::Transport(value.to_string())
                }
            }
            transports::RpcError::NullResp => Self::NullResp,
            _ => Self::Transport(value.to_string()),
        }
    }
}

impl From<alloy::sol_types::Error> for WatchError {
    fn from(value: alloy::sol_types::Error) -> Self {
        Self::Fatal(value.to_string())
    }
}
