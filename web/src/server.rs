//! HTTP surface of the page.
//!
//! `GET /` renders the current page. Every action is a plain form `POST`
//! answered with `303 See Other` back to `/`, where the outcome shows up
//! as a notice on the next render.

use axum::{
    extract::{Form, Path, State},
    response::{Html, Redirect},
    routing::{get, post},
    Router,
};
use serde::Deserialize;
use std::sync::Arc;
use tracing::{debug, info};

use agora_types::ProposalId;

use crate::controller::{Action, ViewController};

#[derive(Debug, Deserialize)]
struct ProposalForm {
    #[serde(default)]
    text: String,
}

#[derive(Debug, Deserialize)]
struct VoteForm {
    support: bool,
}

pub fn router(controller: Arc<ViewController>) -> Router {
    Router::new()
        .route("/", get(index))
        .route("/connect", post(connect))
        .route("/register", post(register))
        .route("/proposals", post(submit_proposal))
        .route("/proposals/:id/vote", post(cast_vote))
        .route("/refresh", post(refresh))
        .with_state(controller)
}

/// The page server, bound to one listen address.
pub struct WebServer {
    pub addr: String,
    pub controller: Arc<ViewController>,
}

impl WebServer {
    pub fn new(addr: impl Into<String>, controller: Arc<ViewController>) -> Self {
        Self {
            addr: addr.into(),
            controller,
        }
    }

    /// Serve the page until the process shuts down.
    pub async fn start(&self) -> std::io::Result<()> {
        let app = router(Arc::clone(&self.controller));
        let listener = tokio::net::TcpListener::bind(&self.addr).await?;
        info!("voting page listening on http://{}", listener.local_addr()?);
        axum::serve(listener, app).await
    }
}

async fn index(State(controller): State<Arc<ViewController>>) -> Html<String> {
    Html(controller.render().await)
}

async fn act(controller: &ViewController, action: Action) -> Redirect {
    if let Err(e) = controller.dispatch(action).await {
        debug!(error = %e, "action reported to the page");
    }
    Redirect::to("/")
}

async fn connect(State(controller): State<Arc<ViewController>>) -> Redirect {
    act(&controller, Action::Connect).await
}

async fn register(State(controller): State<Arc<ViewController>>) -> Redirect {
    act(&controller, Action::Register).await
}

async fn submit_proposal(
    State(controller): State<Arc<ViewController>>,
    Form(form): Form<ProposalForm>,
) -> Redirect {
    act(&controller, Action::SubmitProposal(form.text)).await
}

async fn cast_vote(
    State(controller): State<Arc<ViewController>>,
    Path(id): Path<u64>,
    Form(form): Form<VoteForm>,
) -> Redirect {
    let action = Action::CastVote {
        id: ProposalId::new(id),
        support: form.support,
    };
    act(&controller, action).await
}

async fn refresh(State(controller): State<Arc<ViewController>>) -> Redirect {
    act(&controller, Action::Refresh).await
}
