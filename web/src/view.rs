//! View state: what the page shows, independent of how it is rendered.

use agora_types::{Address, Proposal, ProposalId, RegistrationStatus};
use std::collections::HashSet;
use std::fmt;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use crate::notifier::Notice;

#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub enum ProposalsView {
    /// No session; nothing to load.
    #[default]
    ConnectPrompt,
    Loading,
    Empty,
    Loaded(Vec<Proposal>),
    /// The last load failed part-way; details are in the log.
    Failed,
}

#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct ViewState {
    pub registration: RegistrationStatus,
    pub proposals: ProposalsView,
    /// Proposal text as last typed, kept until a submission succeeds.
    pub draft: String,
}

/// A page control that triggers a remote operation.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum Control {
    Connect,
    Register,
    Submit,
    Refresh,
    /// Both voting buttons of one proposal.
    Vote(ProposalId),
}

impl fmt::Display for Control {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Connect => write!(f, "Connecting"),
            Self::Register => write!(f, "Registration"),
            Self::Submit => write!(f, "Proposal submission"),
            Self::Refresh => write!(f, "Refresh"),
            Self::Vote(id) => write!(f, "Vote on proposal #{id}"),
        }
    }
}

/// Controls whose operation has not finished yet.
#[derive(Clone, Default)]
pub struct PendingControls {
    inner: Arc<Mutex<HashSet<Control>>>,
}

impl PendingControls {
    fn lock(&self) -> MutexGuard<'_, HashSet<Control>> {
        self.inner.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Mark `control` pending. `None` if it already is.
    pub fn try_begin(&self, control: Control) -> Option<PendingGuard> {
        if !self.lock().insert(control) {
            return None;
        }
        Some(PendingGuard {
            controls: self.clone(),
            control,
        })
    }

    pub fn is_pending(&self, control: Control) -> bool {
        self.lock().contains(&control)
    }

    pub fn snapshot(&self) -> HashSet<Control> {
        self.lock().clone()
    }
}

/// Clears its control when dropped.
pub struct PendingGuard {
    controls: PendingControls,
    control: Control,
}

impl Drop for PendingGuard {
    fn drop(&mut self) {
        self.controls.lock().remove(&self.control);
    }
}

/// Everything one page render needs, captured at one instant.
#[derive(Clone, Debug, Default)]
pub struct PageModel {
    pub account: Option<Address>,
    pub wallet_available: bool,
    pub view: ViewState,
    pub pending: HashSet<Control>,
    pub notices: Vec<Notice>,
}

impl PageModel {
    pub fn is_pending(&self, control: Control) -> bool {
        self.pending.contains(&control)
    }
}
