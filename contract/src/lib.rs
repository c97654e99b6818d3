//! Access to the wallet provider and the external proposal contract.
//!
//! Provides:
//! - a JSON-RPC transport ([`RpcTransport`])
//! - the [`WalletProvider`] capability and its JSON-RPC implementation, including
//!   an account-change watcher
//! - the [`Contract`] capability set, bound per signer through a [`ContractConnector`],
//!   and its JSON-RPC implementation driven by an [`InterfaceDescriptor`]
//! - the response adapter that turns decoded contract records into [`agora_types::Proposal`]

pub mod abi;
pub mod adapter;
pub mod contract;
pub mod error;
pub mod rpc;
pub mod transport;
pub mod wallet;

pub use abi::InterfaceDescriptor;
pub use adapter::{normalize_proposal, RawField, RawRecord};
pub use contract::{methods, Contract, ContractConnector, Receipt};
pub use error::{ContractError, RpcError, WalletError};
pub use rpc::{RpcConnector, RpcContract};
pub use transport::{RpcTransport, MIN_POLL_INTERVAL};
pub use wallet::{RpcWallet, WalletProvider};

/// Dynamic ABI value, re-exported for callers building or inspecting records.
pub use alloy_dyn_abi::DynSolValue;
