//! Wallet provider capability and its JSON-RPC implementation.

use agora_types::Address;
use async_trait::async_trait;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::broadcast;
use tokio::task::JoinHandle;
use tokio::time::MissedTickBehavior;
use tracing::{debug, info};

use crate::error::{RpcError, WalletError, METHOD_NOT_FOUND, USER_REJECTED};
use crate::transport::{RpcTransport, MIN_POLL_INTERVAL};

/// Capacity of the account-change broadcast channel.
const CHANGE_CHANNEL_CAPACITY: usize = 16;

/// Agent holding the user's keys.
#[async_trait]
pub trait WalletProvider: Send + Sync {
    /// Accounts already authorized for this page. Never prompts the user.
    async fn accounts(&self) -> Result<Vec<Address>, WalletError>;

    /// Ask the user for account access. May prompt; may be rejected.
    async fn request_accounts(&self) -> Result<Vec<Address>, WalletError>;

    /// Subscribe to account-change notifications. Each message carries the full
    /// new account list; an empty list means no account remains authorized.
    fn subscribe(&self) -> broadcast::Receiver<Vec<Address>>;
}

/// Wallet reached through an EIP-1193 style JSON-RPC endpoint.
pub struct RpcWallet {
    transport: RpcTransport,
    changes: broadcast::Sender<Vec<Address>>,
}

impl RpcWallet {
    pub fn new(transport: RpcTransport) -> Self {
        let (changes, _) = broadcast::channel(CHANGE_CHANNEL_CAPACITY);
        Self { transport, changes }
    }

    /// Poll the authorized accounts every `every` and publish changes to
    /// subscribers. The first successful poll only records the baseline.
    ///
    /// Intervals below [`MIN_POLL_INTERVAL`] are raised to it.
    pub fn watch(self: &Arc<Self>, every: Duration) -> JoinHandle<()> {
        let wallet = Arc::clone(self);
        tokio::spawn(async move {
            let mut ticker = tokio::time::interval(every.max(MIN_POLL_INTERVAL));
            ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);
            let mut last: Option<Vec<Address>> = None;
            loop {
                ticker.tick().await;
                match wallet.accounts().await {
                    Ok(accounts) => {
                        if last.as_ref().is_some_and(|prev| *prev != accounts) {
                            info!(count = accounts.len(), "wallet accounts changed");
                            // No subscribers is fine: nobody is listening yet.
                            let _ = wallet.changes.send(accounts.clone());
                        }
                        last = Some(accounts);
                    }
                    Err(e) => debug!(error = %e, "account poll failed"),
                }
            }
        })
    }
}

fn parse_accounts(raw: Vec<String>) -> Result<Vec<Address>, WalletError> {
    raw.into_iter()
        .map(|s| {
            s.parse::<Address>()
                .map_err(|_| WalletError::InvalidAccount(s.clone()))
        })
        .collect()
}

#[async_trait]
impl WalletProvider for RpcWallet {
    async fn accounts(&self) -> Result<Vec<Address>, WalletError> {
        let raw: Vec<String> = self
            .transport
            .request("eth_accounts", serde_json::json!([]))
            .await?;
        parse_accounts(raw)
    }

    async fn request_accounts(&self) -> Result<Vec<Address>, WalletError> {
        let result: Result<Vec<String>, RpcError> = self
            .transport
            .request("eth_requestAccounts", serde_json::json!([]))
            .await;
        match result {
            Ok(raw) => parse_accounts(raw),
            Err(RpcError::Remote { code, message }) if code == USER_REJECTED => {
                Err(WalletError::Rejected(message))
            }
            // Plain nodes have no interactive flow; their unlocked accounts are
            // the authorized ones.
            Err(RpcError::Remote { code, .. }) if code == METHOD_NOT_FOUND => {
                debug!("endpoint lacks eth_requestAccounts, using eth_accounts");
                self.accounts().await
            }
            Err(e) => Err(e.into()),
        }
    }

    fn subscribe(&self) -> broadcast::Receiver<Vec<Address>> {
        self.changes.subscribe()
    }
}
