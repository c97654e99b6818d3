//! The remote contract capability set.

use agora_types::{Address, ProposalId, TxHash};
use async_trait::async_trait;
use std::sync::Arc;

use crate::adapter::RawRecord;
use crate::error::ContractError;

/// Contract function names as they appear in the interface descriptor.
pub mod methods {
    pub const ENROLL_PARTICIPANT: &str = "enrollParticipant";
    pub const SUBMIT_PROPOSAL: &str = "submitProposal";
    pub const CAST_VOTE: &str = "castVote";
    pub const PROPOSAL_COUNTER: &str = "proposalCounter";
    pub const PROPOSALS: &str = "proposals";
    /// Optional: not every deployment exposes it.
    pub const IS_REGISTERED: &str = "isRegistered";
}

/// Confirmation that a submitted transaction was included.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Receipt {
    pub tx_hash: TxHash,
    pub block_number: Option<u64>,
}

/// A contract handle bound to one signing account.
///
/// State-changing operations return as soon as the wallet accepted the
/// transaction; [`Contract::wait_for_confirmation`] waits for inclusion.
#[async_trait]
pub trait Contract: Send + Sync {
    async fn enroll_participant(&self) -> Result<TxHash, ContractError>;

    async fn submit_proposal(&self, description: &str) -> Result<TxHash, ContractError>;

    async fn cast_vote(&self, id: ProposalId, support: bool) -> Result<TxHash, ContractError>;

    /// Wait until the transaction is included. No local timeout.
    async fn wait_for_confirmation(&self, tx_hash: TxHash) -> Result<Receipt, ContractError>;

    async fn proposal_count(&self) -> Result<u64, ContractError>;

    /// Fetch one proposal record, undecoded into view fields.
    async fn proposal(&self, id: ProposalId) -> Result<RawRecord, ContractError>;

    /// Best-effort registration check. `Ok(None)` when the contract does not
    /// expose the capability.
    async fn is_registered(&self, account: Address) -> Result<Option<bool>, ContractError>;
}

/// Binds contract handles to a signing account at the fixed contract address.
pub trait ContractConnector: Send + Sync {
    fn bind(&self, signer: Address) -> Result<Arc<dyn Contract>, ContractError>;
}
