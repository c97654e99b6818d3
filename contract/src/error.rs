//! Error types for wallet and contract access.

use agora_types::TxHash;
use thiserror::Error;

/// JSON-RPC error code a wallet uses when the user rejects a request (EIP-1193).
pub const USER_REJECTED: i64 = 4001;
/// JSON-RPC error code for an unimplemented method.
pub const METHOD_NOT_FOUND: i64 = -32601;

/// Failure of a single JSON-RPC round-trip.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum RpcError {
    #[error("request failed: {0}")]
    Http(String),

    /// The endpoint answered with a JSON-RPC error object. Displays the remote
    /// message verbatim.
    #[error("{message}")]
    Remote { code: i64, message: String },

    #[error("invalid JSON-RPC response: {0}")]
    InvalidResponse(String),
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum WalletError {
    /// The user (or the wallet on their behalf) declined the request.
    #[error("{0}")]
    Rejected(String),

    #[error("wallet returned no accounts")]
    NoAccounts,

    #[error("wallet returned an invalid account: {0}")]
    InvalidAccount(String),

    #[error(transparent)]
    Rpc(#[from] RpcError),
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ContractError {
    /// The interface descriptor has no function with this name.
    #[error("contract interface lacks {0}()")]
    MissingMethod(String),

    #[error("invalid interface descriptor: {0}")]
    InvalidDescriptor(String),

    #[error("{0}")]
    NotConfigured(String),

    #[error("failed to encode call: {0}")]
    Encode(String),

    #[error("failed to decode response: {0}")]
    Decode(String),

    #[error("transaction {0} reverted")]
    Reverted(TxHash),

    #[error(transparent)]
    Rpc(#[from] RpcError),
}

impl ContractError {
    /// Build a remote error the way a node reports a failed call.
    pub fn remote(message: impl Into<String>) -> Self {
        ContractError::Rpc(RpcError::Remote {
            code: -32000,
            message: message.into(),
        })
    }
}
