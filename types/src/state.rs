//! Registration status of the connected account.

use serde::{Deserialize, Serialize};

/// Outcome of the best-effort registration check.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum RegistrationStatus {
    /// No session yet, nothing checked.
    #[default]
    Unchecked,
    Registered,
    NotRegistered,
    /// The contract interface does not expose a registration query.
    Unknown,
    /// The registration query failed.
    Error,
}

impl RegistrationStatus {
    pub fn from_check(registered: Option<bool>) -> Self {
        match registered {
            Some(true) => Self::Registered,
            Some(false) => Self::NotRegistered,
            None => Self::Unknown,
        }
    }

    /// Label shown next to `Status:` on the page.
    pub fn label(&self) -> &'static str {
        match self {
            Self::Unchecked => "Not connected",
            Self::Registered => "✅ Registered",
            Self::NotRegistered => "❌ Not Registered",
            Self::Unknown => "Unknown (contract lacks isRegistered())",
            Self::Error => "Error",
        }
    }
}
