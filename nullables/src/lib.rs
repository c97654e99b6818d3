//! Nullable infrastructure for deterministic testing.
//!
//! The wallet provider and the proposal contract are abstracted behind the
//! [`agora_contract::WalletProvider`] and [`agora_contract::Contract`] traits.
//! This crate provides in-memory implementations that:
//! - behave like a small voting contract (registration, proposals, one vote per account)
//! - record every call for assertions
//! - can be told to fail, reject or hold confirmations
//! - never touch the network
//!
//! Usage: swap the JSON-RPC implementations for nullables in tests.

pub mod contract;
mod gate;
pub mod wallet;

pub use contract::{ContractCall, NullConnector, NullContract, NullLedger, RecordShape};
pub use wallet::NullWallet;
