//! Nullable wallet: scripted accounts and prompts.

use agora_contract::{WalletError, WalletProvider};
use agora_types::Address;
use async_trait::async_trait;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Mutex;
use tokio::sync::broadcast;

use crate::gate::Gate;

/// A wallet whose answers are set by the test.
pub struct NullWallet {
    /// Accounts returned without prompting.
    authorized: Mutex<Vec<Address>>,
    /// Accounts granted when the user is asked.
    grant: Mutex<Vec<Address>>,
    /// When set, interactive requests are rejected with this message.
    rejection: Mutex<Option<String>>,
    requests: AtomicUsize,
    /// Closed while the user "has the prompt open".
    prompt: Gate,
    changes: broadcast::Sender<Vec<Address>>,
}

impl NullWallet {
    /// A wallet with nothing authorized that grants nothing.
    pub fn new() -> Self {
        let (changes, _) = broadcast::channel(16);
        Self {
            authorized: Mutex::new(Vec::new()),
            grant: Mutex::new(Vec::new()),
            rejection: Mutex::new(None),
            requests: AtomicUsize::new(0),
            prompt: Gate::default(),
            changes,
        }
    }

    /// A wallet where `accounts` are already authorized for the page.
    pub fn authorized(accounts: Vec<Address>) -> Self {
        let wallet = Self::new();
        *wallet.authorized.lock().unwrap() = accounts.clone();
        *wallet.grant.lock().unwrap() = accounts;
        wallet
    }

    /// Grant `accounts` when the user is asked for access.
    pub fn grant_on_request(&self, accounts: Vec<Address>) {
        *self.grant.lock().unwrap() = accounts;
    }

    /// Reject interactive requests with `message`.
    pub fn reject_requests(&self, message: impl Into<String>) {
        *self.rejection.lock().unwrap() = Some(message.into());
    }

    /// Keep interactive requests waiting until [`NullWallet::answer_requests`].
    /// Requests are counted before they wait.
    pub fn hold_requests(&self) {
        self.prompt.close();
    }

    /// Let `n` held requests through.
    pub fn answer_requests(&self, n: usize) {
        self.prompt.release(n);
    }

    /// Number of interactive account requests made so far.
    pub fn request_count(&self) -> usize {
        self.requests.load(Ordering::SeqCst)
    }

    /// Simulate the user switching (or removing) accounts in the wallet.
    ///
    /// Returns the number of subscribers notified.
    pub fn switch_accounts(&self, accounts: Vec<Address>) -> usize {
        *self.authorized.lock().unwrap() = accounts.clone();
        self.changes.send(accounts).unwrap_or(0)
    }
}

impl Default for NullWallet {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl WalletProvider for NullWallet {
    async fn accounts(&self) -> Result<Vec<Address>, WalletError> {
        Ok(self.authorized.lock().unwrap().clone())
    }

    async fn request_accounts(&self) -> Result<Vec<Address>, WalletError> {
        self.requests.fetch_add(1, Ordering::SeqCst);
        self.prompt.pass().await;
        if let Some(message) = self.rejection.lock().unwrap().clone() {
            return Err(WalletError::Rejected(message));
        }
        let granted = self.grant.lock().unwrap().clone();
        *self.authorized.lock().unwrap() = granted.clone();
        Ok(granted)
    }

    fn subscribe(&self) -> broadcast::Receiver<Vec<Address>> {
        self.changes.subscribe()
    }
}
