//! Fundamental types for the Agora voting page.
//!
//! Everything here is a transient copy of data owned by the external proposal
//! contract: identifiers are contract-assigned and never generated locally.

pub mod address;
pub mod hash;
pub mod proposal;
pub mod state;

pub use address::{abbreviate, Address};
pub use hash::TxHash;
pub use proposal::{Proposal, ProposalId, U256};
pub use state::RegistrationStatus;
