//! The page's view-controller.
//!
//! Holds the session and the view state, runs user actions against the
//! bound contract, and records what the page should show next. Locks are
//! only ever held between awaits on remote calls, never across them.

use agora_contract::{
    normalize_proposal, Contract, ContractConnector, ContractError, Receipt, WalletError,
    WalletProvider,
};
use agora_types::{Address, Proposal, ProposalId, RegistrationStatus, TxHash};
use std::sync::Arc;
use tokio::sync::broadcast::error::RecvError;
use tokio::sync::{Mutex, RwLock};
use tokio::task::JoinHandle;
use tracing::{debug, error, info, warn};

use crate::error::AppError;
use crate::notifier::Notifier;
use crate::render::render_page;
use crate::session::{Session, SessionState};
use crate::view::{Control, PageModel, PendingControls, ProposalsView, ViewState};

/// A user action, as triggered from the page.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Action {
    Connect,
    Register,
    SubmitProposal(String),
    CastVote { id: ProposalId, support: bool },
    Refresh,
}

impl Action {
    /// The control that stays disabled while this action runs.
    pub fn control(&self) -> Control {
        match self {
            Self::Connect => Control::Connect,
            Self::Register => Control::Register,
            Self::SubmitProposal(_) => Control::Submit,
            Self::CastVote { id, .. } => Control::Vote(*id),
            Self::Refresh => Control::Refresh,
        }
    }

    fn success_message(&self) -> Option<&'static str> {
        match self {
            Self::Register => Some("Registration transaction mined."),
            Self::SubmitProposal(_) => Some("Proposal submitted."),
            Self::CastVote { .. } => Some("Vote recorded."),
            Self::Connect | Self::Refresh => None,
        }
    }

    fn failure_prefix(&self) -> &'static str {
        match self {
            Self::Connect => "Connection failed",
            Self::Register => "Registration failed",
            Self::SubmitProposal(_) => "Submit failed",
            Self::CastVote { .. } => "Vote failed",
            Self::Refresh => "Refresh failed",
        }
    }
}

pub struct ViewController {
    wallet: Option<Arc<dyn WalletProvider>>,
    connector: Arc<dyn ContractConnector>,
    session: RwLock<SessionState>,
    view: Mutex<ViewState>,
    pending: PendingControls,
    notifier: Notifier,
}

impl ViewController {
    /// `wallet` is `None` when the page has no wallet provider at all.
    pub fn new(
        wallet: Option<Arc<dyn WalletProvider>>,
        connector: Arc<dyn ContractConnector>,
    ) -> Self {
        Self {
            wallet,
            connector,
            session: RwLock::new(SessionState::Disconnected),
            view: Mutex::new(ViewState::default()),
            pending: PendingControls::default(),
            notifier: Notifier::default(),
        }
    }

    pub fn notifier(&self) -> &Notifier {
        &self.notifier
    }

    pub fn pending(&self) -> &PendingControls {
        &self.pending
    }

    pub async fn session(&self) -> Option<Arc<Session>> {
        self.session.read().await.session()
    }

    pub async fn account(&self) -> Option<Address> {
        self.session.read().await.account()
    }

    pub async fn view(&self) -> ViewState {
        self.view.lock().await.clone()
    }

    /// Snapshot for one render. Consumes queued notices.
    pub async fn page(&self) -> PageModel {
        let account = self.account().await;
        let view = self.view.lock().await.clone();
        PageModel {
            account,
            wallet_available: self.wallet.is_some(),
            view,
            pending: self.pending.snapshot(),
            notices: self.notifier.drain().await,
        }
    }

    pub async fn render(&self) -> String {
        render_page(&self.page().await)
    }

    // ── Dispatch ───────────────────────────────────────────────────────

    /// Run a user action and publish its outcome as a notice.
    pub async fn dispatch(&self, action: Action) -> Result<(), AppError> {
        let result = self.run(&action).await;
        match &result {
            Ok(()) => {
                if let Some(message) = action.success_message() {
                    self.notifier.success(message).await;
                }
            }
            Err(e) if e.is_local() => self.notifier.error(e.to_string()).await,
            Err(e) => {
                self.notifier
                    .error(format!("{}: {e}", action.failure_prefix()))
                    .await
            }
        }
        result
    }

    async fn run(&self, action: &Action) -> Result<(), AppError> {
        let control = action.control();
        let _guard = self
            .pending
            .try_begin(control)
            .ok_or(AppError::Busy(control))?;
        match action {
            Action::Connect => self.connect().await,
            Action::Register => self.register().await,
            Action::SubmitProposal(text) => self.submit_proposal(text).await,
            Action::CastVote { id, support } => self.cast_vote(*id, *support).await,
            Action::Refresh => {
                self.refresh().await;
                Ok(())
            }
        }
    }

    // ── Session lifecycle ──────────────────────────────────────────────

    /// Ask the wallet for access and bind a session to the granted account.
    ///
    /// The installed session, if any, keeps serving until the new one is
    /// bound; on failure it stays in place.
    pub async fn connect(&self) -> Result<(), AppError> {
        let wallet = self.wallet.clone().ok_or(AppError::NoWallet)?;
        let result = match wallet.request_accounts().await {
            Ok(accounts) => match accounts.first() {
                Some(&account) => self.establish(account).await,
                None => Err(WalletError::NoAccounts.into()),
            },
            Err(e) => Err(e.into()),
        };
        if let Err(e) = &result {
            warn!(error = %e, "wallet connection failed");
        }
        result
    }

    /// Re-bind to an account the wallet already authorized, without prompting.
    pub async fn restore(&self) -> Result<(), AppError> {
        let Some(wallet) = self.wallet.clone() else {
            return Ok(());
        };
        match wallet.accounts().await?.first() {
            Some(&account) => self.establish(account).await,
            None => {
                debug!("no previously authorized account");
                Ok(())
            }
        }
    }

    /// React to the wallet reporting a new account list.
    pub async fn accounts_changed(&self, accounts: Vec<Address>) -> Result<(), AppError> {
        let current = self.account().await;
        match accounts.first().copied() {
            None => {
                if current.is_some() {
                    info!("wallet removed all accounts");
                    self.disconnect().await;
                }
                Ok(())
            }
            Some(account) if Some(account) == current => Ok(()),
            Some(account) => {
                info!(%account, "wallet switched account");
                let result = self.establish(account).await;
                if result.is_err() {
                    self.disconnect().await;
                }
                result
            }
        }
    }

    /// Follow account changes published by the wallet until it goes away.
    pub fn watch_accounts(self: &Arc<Self>) -> Option<JoinHandle<()>> {
        let mut changes = self.wallet.as_ref()?.subscribe();
        let controller = Arc::clone(self);
        Some(tokio::spawn(async move {
            loop {
                match changes.recv().await {
                    Ok(accounts) => {
                        if let Err(e) = controller.accounts_changed(accounts).await {
                            controller
                                .notifier
                                .error(format!("Connection failed: {e}"))
                                .await;
                        }
                    }
                    Err(RecvError::Lagged(skipped)) => {
                        warn!(skipped, "missed account change notifications");
                    }
                    Err(RecvError::Closed) => break,
                }
            }
        }))
    }

    async fn establish(&self, account: Address) -> Result<(), AppError> {
        let contract = self.connector.bind(account)?;
        let session = Arc::new(Session::new(account, contract));
        *self.session.write().await = SessionState::Connected(session);
        info!(%account, "session established");

        self.check_registration().await;
        self.load_proposals().await;
        Ok(())
    }

    async fn disconnect(&self) {
        *self.session.write().await = SessionState::Disconnected;
        let mut view = self.view.lock().await;
        view.registration = RegistrationStatus::Unchecked;
        view.proposals = ProposalsView::ConnectPrompt;
    }

    async fn require_session(&self) -> Result<Arc<Session>, AppError> {
        self.session().await.ok_or(AppError::NotConnected)
    }

    /// Apply `update` to the view only while `session` is still installed.
    async fn update_if_current(
        &self,
        session: &Arc<Session>,
        update: impl FnOnce(&mut ViewState),
    ) {
        let state = self.session.read().await;
        if state.holds(session) {
            update(&mut *self.view.lock().await);
        }
    }

    // ── Registration ───────────────────────────────────────────────────

    /// Check whether the session account is registered. Never fails.
    pub async fn check_registration(&self) {
        let Some(session) = self.session().await else {
            return;
        };
        let status = match session.contract().is_registered(session.account()).await {
            Ok(registered) => RegistrationStatus::from_check(registered),
            Err(e) => {
                warn!(error = %e, "registration check failed");
                RegistrationStatus::Error
            }
        };
        self.update_if_current(&session, |view| view.registration = status)
            .await;
    }

    /// Enroll the session account, then re-check its status either way.
    pub async fn register(&self) -> Result<(), AppError> {
        let session = self.require_session().await?;
        let contract = session.contract();
        let result = confirm(contract.as_ref(), contract.enroll_participant().await).await;
        self.check_registration().await;
        result.map(drop)
    }

    // ── Proposals ──────────────────────────────────────────────────────

    pub async fn submit_proposal(&self, text: &str) -> Result<(), AppError> {
        self.view.lock().await.draft = text.to_string();
        let session = self.require_session().await?;
        let description = text.trim();
        if description.is_empty() {
            return Err(AppError::EmptyProposal);
        }

        let contract = session.contract();
        confirm(contract.as_ref(), contract.submit_proposal(description).await).await?;
        self.view.lock().await.draft.clear();
        self.load_proposals().await;
        Ok(())
    }

    /// Re-fetch the whole list. Shows an error state rather than a partial list.
    pub async fn load_proposals(&self) {
        let session = {
            let state = self.session.read().await;
            let mut view = self.view.lock().await;
            match state.session() {
                Some(session) => {
                    view.proposals = ProposalsView::Loading;
                    session
                }
                None => {
                    view.proposals = ProposalsView::ConnectPrompt;
                    return;
                }
            }
        };

        let view = match fetch_proposals(session.contract().as_ref()).await {
            Ok(proposals) if proposals.is_empty() => ProposalsView::Empty,
            Ok(proposals) => {
                debug!(count = proposals.len(), "proposals loaded");
                ProposalsView::Loaded(proposals)
            }
            Err(e) => {
                error!(error = %e, "failed to load proposals");
                ProposalsView::Failed
            }
        };
        self.update_if_current(&session, |state| state.proposals = view)
            .await;
    }

    pub async fn refresh(&self) {
        self.load_proposals().await;
    }

    pub async fn cast_vote(&self, id: ProposalId, support: bool) -> Result<(), AppError> {
        let session = self.require_session().await?;
        let contract = session.contract();
        confirm(contract.as_ref(), contract.cast_vote(id, support).await).await?;
        self.load_proposals().await;
        Ok(())
    }
}

/// Wait for a submitted transaction to be mined.
async fn confirm(
    contract: &dyn Contract,
    submitted: Result<TxHash, ContractError>,
) -> Result<Receipt, AppError> {
    Ok(contract.wait_for_confirmation(submitted?).await?)
}

/// Fetch proposals `1..=N` one at a time, in order.
async fn fetch_proposals(contract: &dyn Contract) -> Result<Vec<Proposal>, ContractError> {
    let count = contract.proposal_count().await?;
    let mut proposals = Vec::new();
    for id in ProposalId::range(count) {
        let record = contract.proposal(id).await?;
        proposals.push(normalize_proposal(id, &record));
    }
    Ok(proposals)
}
