use agora_contract::{ContractError, WalletError};
use thiserror::Error;

use crate::view::Control;

/// Everything a user action can fail with.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum AppError {
    #[error("No wallet provider found.")]
    NoWallet,

    #[error("Connect wallet first")]
    NotConnected,

    #[error("Enter proposal text.")]
    EmptyProposal,

    #[error("{0} is already in progress")]
    Busy(Control),

    #[error(transparent)]
    Wallet(#[from] WalletError),

    #[error(transparent)]
    Contract(#[from] ContractError),
}

impl AppError {
    /// Raised before any remote call was made.
    pub fn is_local(&self) -> bool {
        matches!(
            self,
            Self::NoWallet | Self::NotConnected | Self::EmptyProposal | Self::Busy(_)
        )
    }
}
