//! View-controller behaviour against the in-memory wallet and contract.

use agora_contract::{methods, ContractError};
use agora_nullables::{ContractCall, NullConnector, NullLedger, NullWallet, RecordShape};
use agora_types::{Address, ProposalId, RegistrationStatus, U256};
use agora_web::{Action, AppError, Control, NoticeLevel, ProposalsView, ViewController};
use std::sync::Arc;
use std::time::Duration;

fn alice() -> Address {
    Address::repeat_byte(0x11)
}

fn bob() -> Address {
    Address::repeat_byte(0x22)
}

struct Harness {
    ledger: Arc<NullLedger>,
    wallet: Arc<NullWallet>,
    connector: Arc<NullConnector>,
    controller: Arc<ViewController>,
}

impl Harness {
    fn new() -> Self {
        Self::with_ledger(NullLedger::new())
    }

    fn with_ledger(ledger: Arc<NullLedger>) -> Self {
        let wallet = Arc::new(NullWallet::new());
        wallet.grant_on_request(vec![alice()]);
        let connector = Arc::new(NullConnector::new(Arc::clone(&ledger)));
        let controller = Arc::new(ViewController::new(
            Some(wallet.clone()),
            connector.clone(),
        ));
        Self {
            ledger,
            wallet,
            connector,
            controller,
        }
    }

    /// Connect as alice, then forget the calls and notices that produced.
    async fn connected(self) -> Self {
        self.controller.dispatch(Action::Connect).await.unwrap();
        self.ledger.clear_calls();
        self.controller.notifier().drain().await;
        self
    }

    async fn messages(&self) -> Vec<String> {
        self.controller
            .notifier()
            .drain()
            .await
            .into_iter()
            .map(|n| n.message)
            .collect()
    }

    async fn loaded(&self) -> Vec<agora_types::Proposal> {
        match self.controller.view().await.proposals {
            ProposalsView::Loaded(proposals) => proposals,
            other => panic!("expected a loaded list, got {other:?}"),
        }
    }
}

fn fetches(calls: &[ContractCall]) -> Vec<ProposalId> {
    calls
        .iter()
        .filter_map(|call| match call {
            ContractCall::Proposal(id) => Some(*id),
            _ => None,
        })
        .collect()
}

// ── Session ────────────────────────────────────────────────────────────

#[tokio::test]
async fn connect_binds_session_and_loads_everything() {
    let h = Harness::new();
    h.ledger.enable_registration_check();
    h.ledger.add_proposal("Plant trees", bob());
    h.ledger.add_proposal("Fix the roof", alice());

    h.controller.dispatch(Action::Connect).await.unwrap();

    assert_eq!(h.controller.account().await, Some(alice()));
    assert_eq!(h.connector.binds(), vec![alice()]);
    assert_eq!(h.wallet.request_count(), 1);
    let view = h.controller.view().await;
    assert_eq!(view.registration, RegistrationStatus::NotRegistered);
    assert_eq!(h.loaded().await.len(), 2);
    assert_eq!(
        h.ledger.calls(),
        vec![
            ContractCall::IsRegistered(alice()),
            ContractCall::ProposalCount,
            ContractCall::Proposal(ProposalId::new(1)),
            ContractCall::Proposal(ProposalId::new(2)),
        ]
    );
    assert!(h.messages().await.is_empty());
}

#[tokio::test]
async fn connect_label_shows_abbreviated_account() {
    let h = Harness::new().connected().await;
    let html = h.controller.render().await;
    assert!(html.contains("Connected: 0x1111...1111"));
}

#[tokio::test]
async fn rejected_connect_restores_disconnected_state() {
    let h = Harness::new();
    h.wallet.reject_requests("User rejected the request.");

    let err = h.controller.dispatch(Action::Connect).await.unwrap_err();

    assert!(matches!(err, AppError::Wallet(_)));
    assert_eq!(h.controller.account().await, None);
    assert!(h.ledger.calls().is_empty());
    assert_eq!(
        h.messages().await,
        vec!["Connection failed: User rejected the request."]
    );
    assert!(h.controller.render().await.contains("Connect Wallet"));
}

#[tokio::test]
async fn rejected_reconnect_keeps_existing_session() {
    let h = Harness::new().connected().await;
    h.wallet.reject_requests("User rejected the request.");

    assert!(h.controller.dispatch(Action::Connect).await.is_err());
    assert_eq!(h.controller.account().await, Some(alice()));
}

#[tokio::test]
async fn session_stays_usable_while_reconnect_prompt_is_open() {
    let ledger = NullLedger::new();
    let id = ledger.add_proposal("Plant trees", bob());
    let h = Harness::with_ledger(ledger).connected().await;
    h.wallet.hold_requests();

    let reconnect = {
        let controller = Arc::clone(&h.controller);
        tokio::spawn(async move { controller.dispatch(Action::Connect).await })
    };
    wait_until(|| h.wallet.request_count() == 2).await;

    assert_eq!(h.controller.account().await, Some(alice()));
    assert!(h.controller.render().await.contains("Connected: 0x1111...1111"));
    h.controller
        .dispatch(Action::CastVote { id, support: true })
        .await
        .unwrap();
    assert_eq!(h.messages().await, vec!["Vote recorded."]);

    h.wallet.answer_requests(1);
    reconnect.await.unwrap().unwrap();
    assert_eq!(h.controller.account().await, Some(alice()));
}

#[tokio::test]
async fn connecting_label_shows_while_first_prompt_is_open() {
    let h = Harness::new();
    h.wallet.hold_requests();

    let connect = {
        let controller = Arc::clone(&h.controller);
        tokio::spawn(async move { controller.dispatch(Action::Connect).await })
    };
    wait_until(|| h.wallet.request_count() == 1).await;

    assert!(h.controller.render().await.contains("Connecting..."));
    h.wallet.answer_requests(1);
    connect.await.unwrap().unwrap();
    assert!(h.controller.render().await.contains("Connected: 0x1111...1111"));
}

#[tokio::test]
async fn wallet_granting_nothing_is_an_error() {
    let h = Harness::new();
    h.wallet.grant_on_request(Vec::new());

    let err = h.controller.dispatch(Action::Connect).await.unwrap_err();
    assert!(matches!(err, AppError::Wallet(_)));
    assert_eq!(h.controller.account().await, None);
}

#[tokio::test]
async fn connect_without_wallet_provider() {
    let ledger = NullLedger::new();
    let controller = ViewController::new(None, Arc::new(NullConnector::new(ledger.clone())));

    let err = controller.dispatch(Action::Connect).await.unwrap_err();

    assert_eq!(err, AppError::NoWallet);
    let notices = controller.notifier().drain().await;
    assert_eq!(notices[0].message, "No wallet provider found.");
    assert_eq!(notices[0].level, NoticeLevel::Error);
    assert!(ledger.calls().is_empty());
}

#[tokio::test]
async fn missing_contract_address_fails_session_establishment() {
    let ledger = NullLedger::new();
    let wallet = Arc::new(NullWallet::new());
    wallet.grant_on_request(vec![alice()]);
    let controller = ViewController::new(
        Some(wallet),
        Arc::new(NullConnector::unconfigured(ledger.clone())),
    );

    let err = controller.dispatch(Action::Connect).await.unwrap_err();

    assert!(matches!(err, AppError::Contract(ContractError::NotConfigured(_))));
    assert_eq!(controller.account().await, None);
    assert_eq!(
        controller.notifier().drain().await[0].message,
        "Connection failed: contract address is not configured"
    );
}

#[tokio::test]
async fn restore_reuses_authorized_account_without_prompting() {
    let ledger = NullLedger::new();
    let wallet = Arc::new(NullWallet::authorized(vec![bob()]));
    let controller = ViewController::new(
        Some(wallet.clone()),
        Arc::new(NullConnector::new(ledger.clone())),
    );

    controller.restore().await.unwrap();

    assert_eq!(controller.account().await, Some(bob()));
    assert_eq!(wallet.request_count(), 0);
    assert_eq!(controller.view().await.proposals, ProposalsView::Empty);
}

#[tokio::test]
async fn restore_without_authorized_account_stays_disconnected() {
    let h = Harness::new();
    h.controller.restore().await.unwrap();
    assert_eq!(h.controller.account().await, None);
    assert_eq!(h.wallet.request_count(), 0);
    assert!(h.ledger.calls().is_empty());
}

#[tokio::test]
async fn empty_account_change_tears_session_down() {
    let h = Harness::new();
    h.ledger.enable_registration_check();
    let h = h.connected().await;

    h.controller.accounts_changed(Vec::new()).await.unwrap();

    assert_eq!(h.controller.account().await, None);
    let view = h.controller.view().await;
    assert_eq!(view.registration, RegistrationStatus::Unchecked);
    assert_eq!(view.proposals, ProposalsView::ConnectPrompt);
    assert!(h.ledger.calls().is_empty());
}

#[tokio::test]
async fn account_switch_rebinds_and_same_account_is_ignored() {
    let h = Harness::new().connected().await;

    h.controller.accounts_changed(vec![alice(), bob()]).await.unwrap();
    assert_eq!(h.connector.binds(), vec![alice()]);
    assert!(h.ledger.calls().is_empty());

    h.controller.accounts_changed(vec![bob()]).await.unwrap();
    assert_eq!(h.connector.binds(), vec![alice(), bob()]);
    assert_eq!(h.controller.account().await, Some(bob()));
}

#[tokio::test]
async fn watcher_follows_wallet_account_changes() {
    let h = Harness::new().connected().await;
    let watcher = h.controller.watch_accounts().expect("wallet present");

    // the watcher subscribes before it is spawned, so this is never missed
    assert_eq!(h.wallet.switch_accounts(Vec::new()), 1);

    for _ in 0..100 {
        if h.controller.account().await.is_none() {
            break;
        }
        tokio::time::sleep(Duration::from_millis(10)).await;
    }
    assert_eq!(h.controller.account().await, None);
    watcher.abort();
}

// ── Registration ───────────────────────────────────────────────────────

#[tokio::test]
async fn registration_is_unknown_without_capability() {
    let h = Harness::new().connected().await;
    assert_eq!(
        h.controller.view().await.registration,
        RegistrationStatus::Unknown
    );
    let html = h.controller.render().await;
    assert!(html.contains("Unknown (contract lacks isRegistered())"));
}

#[tokio::test]
async fn failed_check_shows_error_status() {
    let h = Harness::new();
    h.ledger.enable_registration_check();
    h.ledger.fail(methods::IS_REGISTERED, "header not found");

    h.controller.dispatch(Action::Connect).await.unwrap();

    assert_eq!(h.controller.view().await.registration, RegistrationStatus::Error);
}

#[tokio::test]
async fn register_confirms_and_rechecks_status() {
    let h = Harness::new();
    h.ledger.enable_registration_check();
    let h = h.connected().await;

    h.controller.dispatch(Action::Register).await.unwrap();

    assert_eq!(
        h.ledger.calls(),
        vec![
            ContractCall::EnrollParticipant { from: alice() },
            ContractCall::WaitForConfirmation(tx(1)),
            ContractCall::IsRegistered(alice()),
        ]
    );
    assert_eq!(
        h.controller.view().await.registration,
        RegistrationStatus::Registered
    );
    assert_eq!(h.messages().await, vec!["Registration transaction mined."]);
}

#[tokio::test]
async fn failed_registration_still_rechecks_status() {
    let h = Harness::new();
    h.ledger.enable_registration_check();
    h.ledger.register(alice());
    let h = h.connected().await;

    let err = h.controller.dispatch(Action::Register).await.unwrap_err();

    assert!(matches!(err, AppError::Contract(_)));
    assert_eq!(
        h.messages().await,
        vec!["Registration failed: execution reverted: Already registered"]
    );
    assert_eq!(
        h.ledger.calls().last(),
        Some(&ContractCall::IsRegistered(alice()))
    );
}

// ── Session guards ─────────────────────────────────────────────────────

#[tokio::test]
async fn actions_without_session_make_no_remote_calls() {
    let h = Harness::new();
    h.ledger.add_proposal("Plant trees", bob());

    let actions = [
        Action::Register,
        Action::SubmitProposal("Build a park".into()),
        Action::CastVote {
            id: ProposalId::new(1),
            support: true,
        },
    ];
    for action in actions {
        assert_eq!(
            h.controller.dispatch(action).await,
            Err(AppError::NotConnected)
        );
    }

    assert!(h.ledger.calls().is_empty());
    assert_eq!(h.messages().await, vec!["Connect wallet first"; 3]);
}

// ── Proposal submission ────────────────────────────────────────────────

#[tokio::test]
async fn blank_proposal_is_rejected_locally() {
    let h = Harness::new().connected().await;

    for text in ["", "   \n\t"] {
        assert_eq!(
            h.controller
                .dispatch(Action::SubmitProposal(text.into()))
                .await,
            Err(AppError::EmptyProposal)
        );
    }

    assert!(h.ledger.calls().is_empty());
    assert_eq!(h.messages().await, vec!["Enter proposal text."; 2]);
}

#[tokio::test]
async fn submission_sends_trimmed_text_and_reloads() {
    let h = Harness::new().connected().await;

    h.controller
        .dispatch(Action::SubmitProposal("  Build a park \n".into()))
        .await
        .unwrap();

    assert_eq!(
        h.ledger.calls(),
        vec![
            ContractCall::SubmitProposal {
                from: alice(),
                description: "Build a park".into(),
            },
            ContractCall::WaitForConfirmation(tx(1)),
            ContractCall::ProposalCount,
            ContractCall::Proposal(ProposalId::new(1)),
        ]
    );
    let proposals = h.loaded().await;
    assert_eq!(proposals[0].description, "Build a park");
    assert_eq!(proposals[0].proposer, alice().to_string());
    assert!(h.controller.view().await.draft.is_empty());
    assert_eq!(h.messages().await, vec!["Proposal submitted."]);
}

#[tokio::test]
async fn failed_submission_keeps_the_draft() {
    let h = Harness::new().connected().await;
    h.ledger
        .fail(methods::SUBMIT_PROPOSAL, "execution reverted: Not registered");

    let result = h
        .controller
        .dispatch(Action::SubmitProposal("My idea".into()))
        .await;

    assert!(result.is_err());
    assert_eq!(h.controller.view().await.draft, "My idea");
    assert_eq!(
        h.messages().await,
        vec!["Submit failed: execution reverted: Not registered"]
    );
    assert!(h.controller.render().await.contains(">My idea</textarea>"));
}

// ── Proposal list ──────────────────────────────────────────────────────

#[tokio::test]
async fn loader_fetches_each_index_once_in_order() {
    let ledger = NullLedger::new();
    for i in 0..5 {
        ledger.add_proposal(&format!("proposal {i}"), bob());
    }
    let h = Harness::with_ledger(ledger).connected().await;

    h.controller.dispatch(Action::Refresh).await.unwrap();

    let calls = h.ledger.calls();
    assert_eq!(calls[0], ContractCall::ProposalCount);
    assert_eq!(fetches(&calls), ProposalId::range(5).collect::<Vec<_>>());
    assert_eq!(calls.len(), 6);
    assert!(h.messages().await.is_empty());
}

#[tokio::test]
async fn zero_proposals_render_empty_state_without_fetches() {
    let h = Harness::new().connected().await;

    h.controller.refresh().await;

    assert_eq!(h.ledger.calls(), vec![ContractCall::ProposalCount]);
    assert_eq!(h.controller.view().await.proposals, ProposalsView::Empty);
    assert!(h.controller.render().await.contains("No proposals yet."));
}

#[tokio::test]
async fn any_failed_fetch_replaces_list_with_error_state() {
    let ledger = NullLedger::new();
    for i in 0..3 {
        ledger.add_proposal(&format!("proposal {i}"), bob());
    }
    let h = Harness::with_ledger(ledger).connected().await;
    assert_eq!(h.loaded().await.len(), 3);

    h.ledger.fail_fetch(ProposalId::new(2), "missing trie node");
    h.controller.refresh().await;

    // stops at the failing index
    assert_eq!(
        fetches(&h.ledger.calls()),
        vec![ProposalId::new(1), ProposalId::new(2)]
    );
    assert_eq!(h.controller.view().await.proposals, ProposalsView::Failed);
    let html = h.controller.render().await;
    assert!(html.contains("Error loading proposals. See log."));
    assert!(!html.contains("proposal 0"));
}

#[tokio::test]
async fn positional_records_render_like_named_ones() {
    async fn render_with(shape: RecordShape) -> Vec<agora_types::Proposal> {
        let ledger = NullLedger::new();
        ledger.set_shape(shape);
        let id = ledger.add_proposal("Shared garden", bob());
        ledger.set_tallies(id, 7, 2);
        ledger.close(id);
        Harness::with_ledger(ledger).connected().await.loaded().await
    }

    let named = render_with(RecordShape::Named).await;
    let positional = render_with(RecordShape::Positional).await;

    assert_eq!(named, positional);
    assert_eq!(named[0].yes_votes, U256::from(7u64));
    assert!(!named[0].active);
}

#[tokio::test]
async fn hostile_description_is_escaped() {
    let ledger = NullLedger::new();
    ledger.add_proposal("<script>alert(1)</script>", bob());
    let h = Harness::with_ledger(ledger).connected().await;

    let html = h.controller.render().await;

    assert!(!html.contains("<script>"));
    assert!(html.contains("&lt;script&gt;alert(1)&lt;/script&gt;"));
}

#[tokio::test]
async fn closed_proposal_offers_no_voting() {
    let ledger = NullLedger::new();
    let id = ledger.add_proposal("Old idea", bob());
    ledger.close(id);
    let h = Harness::with_ledger(ledger).connected().await;

    let html = h.controller.render().await;

    assert!(html.contains("Voting closed"));
    assert!(!html.contains("Support"));
    assert!(!html.contains("Oppose"));
}

#[tokio::test]
async fn refresh_without_session_shows_connect_prompt() {
    let h = Harness::new();
    h.controller.dispatch(Action::Refresh).await.unwrap();
    assert!(h.ledger.calls().is_empty());
    assert!(h
        .controller
        .render()
        .await
        .contains("Connect wallet to load proposals."));
}

#[tokio::test]
async fn superseded_load_does_not_overwrite_newer_session() {
    let ledger = NullLedger::new();
    ledger.add_proposal("Plant trees", bob());
    let h = Harness::with_ledger(ledger).connected().await;
    h.ledger.hold_reads();

    let stale = {
        let controller = Arc::clone(&h.controller);
        tokio::spawn(async move { controller.refresh().await })
    };
    wait_until(|| h.ledger.calls() == vec![ContractCall::ProposalCount]).await;
    assert_eq!(h.controller.view().await.proposals, ProposalsView::Loading);

    let switch = {
        let controller = Arc::clone(&h.controller);
        tokio::spawn(async move { controller.accounts_changed(vec![bob()]).await })
    };
    wait_until(|| {
        h.ledger
            .calls()
            .iter()
            .filter(|call| **call == ContractCall::ProposalCount)
            .count()
            == 2
    })
    .await;

    h.ledger.release_reads(2);
    stale.await.unwrap();
    switch.await.unwrap().unwrap();

    assert_eq!(h.controller.account().await, Some(bob()));
    assert_eq!(h.loaded().await.len(), 1);
}

#[tokio::test]
async fn load_for_removed_session_leaves_connect_prompt() {
    let ledger = NullLedger::new();
    ledger.add_proposal("Plant trees", bob());
    let h = Harness::with_ledger(ledger).connected().await;
    h.ledger.hold_reads();

    let stale = {
        let controller = Arc::clone(&h.controller);
        tokio::spawn(async move { controller.refresh().await })
    };
    wait_until(|| !h.ledger.calls().is_empty()).await;

    h.controller.accounts_changed(Vec::new()).await.unwrap();
    h.ledger.release_reads(1);
    stale.await.unwrap();

    assert_eq!(
        h.controller.view().await.proposals,
        ProposalsView::ConnectPrompt
    );
}

// ── Voting ─────────────────────────────────────────────────────────────

#[tokio::test]
async fn vote_is_confirmed_then_list_reloaded() {
    let ledger = NullLedger::new();
    let id = ledger.add_proposal("Plant trees", bob());
    let h = Harness::with_ledger(ledger).connected().await;

    h.controller
        .dispatch(Action::CastVote { id, support: false })
        .await
        .unwrap();

    assert_eq!(
        h.ledger.calls(),
        vec![
            ContractCall::CastVote {
                from: alice(),
                id,
                support: false,
            },
            ContractCall::WaitForConfirmation(tx(1)),
            ContractCall::ProposalCount,
            ContractCall::Proposal(id),
        ]
    );
    assert_eq!(h.loaded().await[0].no_votes, U256::from(1u64));
    assert_eq!(h.messages().await, vec!["Vote recorded."]);
}

#[tokio::test]
async fn rejected_vote_surfaces_remote_message() {
    let ledger = NullLedger::new();
    let id = ledger.add_proposal("Plant trees", bob());
    let h = Harness::with_ledger(ledger).connected().await;
    h.controller
        .dispatch(Action::CastVote { id, support: true })
        .await
        .unwrap();
    h.controller.notifier().drain().await;
    h.ledger.clear_calls();

    let err = h
        .controller
        .dispatch(Action::CastVote { id, support: true })
        .await
        .unwrap_err();

    assert!(matches!(err, AppError::Contract(_)));
    assert_eq!(
        h.messages().await,
        vec!["Vote failed: execution reverted: Already voted"]
    );
    // nothing reloaded after a failure
    assert_eq!(h.ledger.calls().len(), 1);
    assert_eq!(h.loaded().await[0].yes_votes, U256::from(1u64));
}

// ── Re-entrancy ────────────────────────────────────────────────────────

#[tokio::test]
async fn pending_action_rejects_second_invocation() {
    let ledger = NullLedger::new();
    let id = ledger.add_proposal("Plant trees", bob());
    let h = Harness::with_ledger(ledger).connected().await;
    h.ledger.hold_confirmations();

    let first = {
        let controller = Arc::clone(&h.controller);
        tokio::spawn(async move {
            controller
                .dispatch(Action::CastVote { id, support: true })
                .await
        })
    };
    for _ in 0..100 {
        if h.controller.pending().is_pending(Control::Vote(id))
            && h.ledger.calls().len() == 2
        {
            break;
        }
        tokio::time::sleep(Duration::from_millis(5)).await;
    }
    assert_eq!(h.ledger.calls().len(), 2, "vote sent and awaiting confirmation");

    let second = h
        .controller
        .dispatch(Action::CastVote { id, support: true })
        .await;
    assert_eq!(second, Err(AppError::Busy(Control::Vote(id))));
    assert_eq!(h.ledger.calls().len(), 2);

    // the page stays servable and shows the control disabled
    let html = h.controller.render().await;
    assert!(html.contains("Vote on proposal #1 is already in progress"));
    assert!(html.contains("value=\"true\" disabled"));

    h.ledger.release_confirmations(1);
    first.await.unwrap().unwrap();
    assert!(!h.controller.pending().is_pending(Control::Vote(id)));
    assert_eq!(h.messages().await, vec!["Vote recorded."]);
}

/// Poll `done` while letting spawned tasks run.
async fn wait_until(mut done: impl FnMut() -> bool) {
    for _ in 0..200 {
        if done() {
            return;
        }
        tokio::time::sleep(Duration::from_millis(5)).await;
    }
    panic!("condition not reached");
}

fn tx(n: u64) -> agora_types::TxHash {
    let mut bytes = [0u8; 32];
    bytes[24..].copy_from_slice(&n.to_be_bytes());
    agora_types::TxHash::new(bytes)
}
