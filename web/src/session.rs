//! The signing session bound to one wallet account.

use agora_contract::Contract;
use agora_types::Address;
use std::fmt;
use std::sync::Arc;

/// An account plus the contract handle that signs as it.
///
/// Replaced wholesale whenever the account changes, never mutated.
pub struct Session {
    account: Address,
    contract: Arc<dyn Contract>,
}

impl Session {
    pub fn new(account: Address, contract: Arc<dyn Contract>) -> Self {
        Self { account, contract }
    }

    pub fn account(&self) -> Address {
        self.account
    }

    pub fn contract(&self) -> &Arc<dyn Contract> {
        &self.contract
    }
}

impl fmt::Debug for Session {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Session")
            .field("account", &self.account)
            .finish_non_exhaustive()
    }
}

#[derive(Clone, Debug, Default)]
pub enum SessionState {
    #[default]
    Disconnected,
    Connected(Arc<Session>),
}

impl SessionState {
    pub fn session(&self) -> Option<Arc<Session>> {
        match self {
            Self::Connected(session) => Some(Arc::clone(session)),
            _ => None,
        }
    }

    pub fn account(&self) -> Option<Address> {
        match self {
            Self::Connected(session) => Some(session.account()),
            _ => None,
        }
    }

    /// Whether `session` is still the installed one.
    pub fn holds(&self, session: &Arc<Session>) -> bool {
        matches!(self, Self::Connected(current) if Arc::ptr_eq(current, session))
    }
}
