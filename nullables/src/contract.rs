//! Nullable contract: an in-memory voting ledger shared by every bound handle.

use agora_contract::{
    methods, Contract, ContractConnector, ContractError, DynSolValue, RawRecord, Receipt,
};
use agora_types::{Address, ProposalId, TxHash, U256};
use async_trait::async_trait;
use std::collections::{HashMap, HashSet};
use std::sync::{Arc, Mutex};

use crate::gate::Gate;

/// Name used with [`NullLedger::fail`] to make confirmations fail.
pub const WAIT_FOR_CONFIRMATION: &str = "waitForConfirmation";

/// A call observed by the ledger, in order of arrival.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum ContractCall {
    EnrollParticipant { from: Address },
    SubmitProposal { from: Address, description: String },
    CastVote { from: Address, id: ProposalId, support: bool },
    WaitForConfirmation(TxHash),
    ProposalCount,
    Proposal(ProposalId),
    IsRegistered(Address),
}

/// How `proposals(id)` responses are shaped.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum RecordShape {
    /// Fields carry their declared names.
    #[default]
    Named,
    /// A bare tuple, no names.
    Positional,
}

struct StoredProposal {
    description: String,
    yes_votes: u64,
    no_votes: u64,
    active: bool,
    proposer: Address,
    voters: HashSet<Address>,
}

#[derive(Default)]
struct LedgerState {
    proposals: Vec<StoredProposal>,
    registered: HashSet<Address>,
    registration_check: bool,
    shape: RecordShape,
    calls: Vec<ContractCall>,
    failures: HashMap<&'static str, String>,
    fetch_failures: HashMap<ProposalId, String>,
    next_tx: u64,
}

impl LedgerState {
    fn check(&self, method: &'static str) -> Result<(), ContractError> {
        match self.failures.get(method) {
            Some(message) => Err(ContractError::remote(message.clone())),
            None => Ok(()),
        }
    }

    fn next_tx_hash(&mut self) -> TxHash {
        self.next_tx += 1;
        let mut bytes = [0u8; 32];
        bytes[24..].copy_from_slice(&self.next_tx.to_be_bytes());
        TxHash::new(bytes)
    }

    fn stored(&mut self, id: ProposalId) -> Result<&mut StoredProposal, ContractError> {
        let index = id
            .get()
            .checked_sub(1)
            .ok_or_else(|| ContractError::remote("execution reverted: Invalid proposal"))?;
        self.proposals
            .get_mut(index as usize)
            .ok_or_else(|| ContractError::remote("execution reverted: Invalid proposal"))
    }
}

/// The in-memory contract state. Share it between a [`NullConnector`] and the test.
#[derive(Default)]
pub struct NullLedger {
    state: Mutex<LedgerState>,
    confirmations: Gate,
    reads: Gate,
}

impl NullLedger {
    pub fn new() -> Arc<Self> {
        Arc::new(Self::default())
    }

    /// Expose `isRegistered(address)`.
    pub fn enable_registration_check(&self) {
        self.state.lock().unwrap().registration_check = true;
    }

    pub fn set_shape(&self, shape: RecordShape) {
        self.state.lock().unwrap().shape = shape;
    }

    /// Seed a proposal as if `proposer` had submitted it.
    pub fn add_proposal(&self, description: &str, proposer: Address) -> ProposalId {
        let mut state = self.state.lock().unwrap();
        state.proposals.push(StoredProposal {
            description: description.to_string(),
            yes_votes: 0,
            no_votes: 0,
            active: true,
            proposer,
            voters: HashSet::new(),
        });
        ProposalId::new(state.proposals.len() as u64)
    }

    pub fn set_tallies(&self, id: ProposalId, yes_votes: u64, no_votes: u64) {
        let mut state = self.state.lock().unwrap();
        if let Ok(p) = state.stored(id) {
            p.yes_votes = yes_votes;
            p.no_votes = no_votes;
        }
    }

    /// Close voting on a proposal.
    pub fn close(&self, id: ProposalId) {
        let mut state = self.state.lock().unwrap();
        if let Ok(p) = state.stored(id) {
            p.active = false;
        }
    }

    pub fn register(&self, account: Address) {
        self.state.lock().unwrap().registered.insert(account);
    }

    pub fn is_registered(&self, account: Address) -> bool {
        self.state.lock().unwrap().registered.contains(&account)
    }

    /// Make every call to `method` fail with `message`.
    pub fn fail(&self, method: &'static str, message: impl Into<String>) {
        self.state
            .lock()
            .unwrap()
            .failures
            .insert(method, message.into());
    }

    /// Make fetching one proposal fail with `message`.
    pub fn fail_fetch(&self, id: ProposalId, message: impl Into<String>) {
        self.state
            .lock()
            .unwrap()
            .fetch_failures
            .insert(id, message.into());
    }

    pub fn clear_failures(&self) {
        let mut state = self.state.lock().unwrap();
        state.failures.clear();
        state.fetch_failures.clear();
    }

    pub fn proposal_count(&self) -> u64 {
        self.state.lock().unwrap().proposals.len() as u64
    }

    pub fn tallies(&self, id: ProposalId) -> Option<(u64, u64)> {
        let mut state = self.state.lock().unwrap();
        state.stored(id).ok().map(|p| (p.yes_votes, p.no_votes))
    }

    /// Every call observed so far.
    pub fn calls(&self) -> Vec<ContractCall> {
        self.state.lock().unwrap().calls.clone()
    }

    pub fn clear_calls(&self) {
        self.state.lock().unwrap().calls.clear();
    }

    /// Make confirmations wait until [`NullLedger::release_confirmations`].
    pub fn hold_confirmations(&self) {
        self.confirmations.close();
    }

    /// Let `n` held confirmations through.
    pub fn release_confirmations(&self, n: usize) {
        self.confirmations.release(n);
    }

    /// Make `proposalCounter()` reads wait until [`NullLedger::release_reads`].
    /// The call is recorded before it waits.
    pub fn hold_reads(&self) {
        self.reads.close();
    }

    pub fn release_reads(&self, n: usize) {
        self.reads.release(n);
    }

    fn record(&self, call: ContractCall) -> std::sync::MutexGuard<'_, LedgerState> {
        let mut state = self.state.lock().unwrap();
        state.calls.push(call);
        state
    }
}

/// A handle on the [`NullLedger`] bound to one signer.
pub struct NullContract {
    ledger: Arc<NullLedger>,
    signer: Address,
}

impl NullContract {
    pub fn new(ledger: Arc<NullLedger>, signer: Address) -> Self {
        Self { ledger, signer }
    }
}

#[async_trait]
impl Contract for NullContract {
    async fn enroll_participant(&self) -> Result<TxHash, ContractError> {
        let mut state = self
            .ledger
            .record(ContractCall::EnrollParticipant { from: self.signer });
        state.check(methods::ENROLL_PARTICIPANT)?;
        if !state.registered.insert(self.signer) {
            return Err(ContractError::remote("execution reverted: Already registered"));
        }
        Ok(state.next_tx_hash())
    }

    async fn submit_proposal(&self, description: &str) -> Result<TxHash, ContractError> {
        let mut state = self.ledger.record(ContractCall::SubmitProposal {
            from: self.signer,
            description: description.to_string(),
        });
        state.check(methods::SUBMIT_PROPOSAL)?;
        state.proposals.push(StoredProposal {
            description: description.to_string(),
            yes_votes: 0,
            no_votes: 0,
            active: true,
            proposer: self.signer,
            voters: HashSet::new(),
        });
        Ok(state.next_tx_hash())
    }

    async fn cast_vote(&self, id: ProposalId, support: bool) -> Result<TxHash, ContractError> {
        let mut state = self.ledger.record(ContractCall::CastVote {
            from: self.signer,
            id,
            support,
        });
        state.check(methods::CAST_VOTE)?;
        let voter = self.signer;
        let proposal = state.stored(id)?;
        if !proposal.active {
            return Err(ContractError::remote("execution reverted: Voting closed"));
        }
        if !proposal.voters.insert(voter) {
            return Err(ContractError::remote("execution reverted: Already voted"));
        }
        if support {
            proposal.yes_votes += 1;
        } else {
            proposal.no_votes += 1;
        }
        Ok(state.next_tx_hash())
    }

    async fn wait_for_confirmation(&self, tx_hash: TxHash) -> Result<Receipt, ContractError> {
        self.ledger
            .record(ContractCall::WaitForConfirmation(tx_hash))
            .check(WAIT_FOR_CONFIRMATION)?;
        self.ledger.confirmations.pass().await;
        Ok(Receipt {
            tx_hash,
            block_number: Some(1),
        })
    }

    async fn proposal_count(&self) -> Result<u64, ContractError> {
        drop(self.ledger.record(ContractCall::ProposalCount));
        self.ledger.reads.pass().await;
        let state = self.ledger.state.lock().unwrap();
        state.check(methods::PROPOSAL_COUNTER)?;
        Ok(state.proposals.len() as u64)
    }

    async fn proposal(&self, id: ProposalId) -> Result<RawRecord, ContractError> {
        let mut state = self.ledger.record(ContractCall::Proposal(id));
        state.check(methods::PROPOSALS)?;
        if let Some(message) = state.fetch_failures.get(&id) {
            return Err(ContractError::remote(message.clone()));
        }
        let shape = state.shape;
        let p = state.stored(id)?;
        let values = vec![
            DynSolValue::String(p.description.clone()),
            DynSolValue::Uint(U256::from(p.yes_votes), 256),
            DynSolValue::Uint(U256::from(p.no_votes), 256),
            DynSolValue::Bool(p.active),
            DynSolValue::Address(p.proposer),
        ];
        Ok(match shape {
            RecordShape::Named => RawRecord::named(
                ["description", "yesVotes", "noVotes", "active", "proposer"]
                    .into_iter()
                    .zip(values),
            ),
            RecordShape::Positional => RawRecord::positional(values),
        })
    }

    async fn is_registered(&self, account: Address) -> Result<Option<bool>, ContractError> {
        let state = self.ledger.record(ContractCall::IsRegistered(account));
        if !state.registration_check {
            return Ok(None);
        }
        state.check(methods::IS_REGISTERED)?;
        Ok(Some(state.registered.contains(&account)))
    }
}

/// Connector handing out [`NullContract`] handles on one shared ledger.
pub struct NullConnector {
    ledger: Arc<NullLedger>,
    configured: bool,
    binds: Mutex<Vec<Address>>,
}

impl NullConnector {
    pub fn new(ledger: Arc<NullLedger>) -> Self {
        Self {
            ledger,
            configured: true,
            binds: Mutex::new(Vec::new()),
        }
    }

    /// A connector whose contract address was never configured.
    pub fn unconfigured(ledger: Arc<NullLedger>) -> Self {
        Self {
            configured: false,
            ..Self::new(ledger)
        }
    }

    /// Signers bound so far, in order.
    pub fn binds(&self) -> Vec<Address> {
        self.binds.lock().unwrap().clone()
    }
}

impl ContractConnector for NullConnector {
    fn bind(&self, signer: Address) -> Result<Arc<dyn Contract>, ContractError> {
        if !self.configured {
            return Err(ContractError::NotConfigured(
                "contract address is not configured".into(),
            ));
        }
        self.binds.lock().unwrap().push(signer);
        Ok(Arc::new(NullContract::new(Arc::clone(&self.ledger), signer)))
    }
}
