//! Proposals as rendered by the page.

use serde::{Deserialize, Serialize};
use std::fmt;

/// Unsigned 256-bit integer used for vote tallies.
pub use alloy_primitives::U256;

/// Contract-assigned proposal index. Indices form the dense range `1..=N`.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct ProposalId(u64);

impl ProposalId {
    pub fn new(index: u64) -> Self {
        Self(index)
    }

    pub fn get(&self) -> u64 {
        self.0
    }

    /// All indices for a reported proposal count, in ascending order.
    pub fn range(count: u64) -> impl Iterator<Item = ProposalId> {
        (1..=count).map(ProposalId)
    }
}

impl fmt::Display for ProposalId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// A re-fetched copy of one proposal. Never mutated locally.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Proposal {
    pub id: ProposalId,
    pub description: String,
    pub yes_votes: U256,
    pub no_votes: U256,
    /// Whether the contract still accepts votes on this proposal.
    pub active: bool,
    /// Proposer address as reported by the contract, or empty when absent.
    pub proposer: String,
}
