//! Server-side HTML for the voting page.
//!
//! Every piece of text that did not originate in this file goes through
//! [`escape_html`] before it is written out.

use agora_types::{abbreviate, Proposal, RegistrationStatus};
use agora_utils::escape_html;
use std::fmt::Write;

use crate::notifier::Notice;
use crate::view::{Control, PageModel, ProposalsView};

const STYLE: &str = "\
body{font-family:system-ui,sans-serif;background:#f3f4f6;margin:0;padding:2rem}\
main{max-width:48rem;margin:0 auto}\
section{background:#fff;border-radius:.5rem;padding:1rem;margin-bottom:1rem}\
.notice{padding:.5rem 1rem;border-radius:.25rem;margin-bottom:.5rem}\
.notice.success{background:#dcfce7}.notice.error{background:#fee2e2}\
.proposal{border:1px solid #e5e7eb;border-radius:.25rem;padding:.75rem;margin-top:.75rem}\
.closed{color:#6b7280}textarea{width:100%;min-height:4rem}\
button[disabled]{opacity:.5}";

pub fn render_page(model: &PageModel) -> String {
    let mut html = String::with_capacity(4096);
    html.push_str("<!DOCTYPE html>\n<html lang=\"en\">\n<head>\n<meta charset=\"utf-8\">\n");
    html.push_str("<title>Agora</title>\n");
    let _ = writeln!(html, "<style>{STYLE}</style>");
    html.push_str("</head>\n<body>\n<main>\n<h1>Agora</h1>\n");
    html.push_str(&render_notices(&model.notices));
    html.push_str(&render_connect(model));
    html.push_str(&render_registration(model));
    html.push_str(&render_submit(model));
    html.push_str(&render_proposals(model));
    html.push_str("</main>\n</body>\n</html>\n");
    html
}

fn disabled(model: &PageModel, control: Control) -> &'static str {
    if model.is_pending(control) {
        " disabled"
    } else {
        ""
    }
}

pub fn render_notices(notices: &[Notice]) -> String {
    let mut html = String::new();
    for notice in notices {
        let _ = writeln!(
            html,
            "<div class=\"notice {}\" role=\"alert\">{}</div>",
            notice.level.as_str(),
            escape_html(&notice.message)
        );
    }
    html
}

/// Label of the connect button.
pub fn connect_label(model: &PageModel) -> String {
    match model.account {
        Some(account) => format!("Connected: {}", abbreviate(&account.to_string())),
        None if model.is_pending(Control::Connect) => "Connecting...".to_string(),
        None => "Connect Wallet".to_string(),
    }
}

fn render_connect(model: &PageModel) -> String {
    let mut html = String::from("<section id=\"wallet\">\n");
    let _ = writeln!(
        html,
        "<form method=\"post\" action=\"/connect\"><button id=\"connectBtn\" type=\"submit\"{}>{}</button></form>",
        disabled(model, Control::Connect),
        escape_html(&connect_label(model))
    );
    if !model.wallet_available {
        html.push_str("<p class=\"closed\">No wallet provider found.</p>\n");
    }
    html.push_str("</section>\n");
    html
}

fn render_registration(model: &PageModel) -> String {
    let status = model.view.registration;
    let mut html = String::from("<section id=\"registration\">\n");
    let _ = writeln!(
        html,
        "<div id=\"regStatus\">Status: <span class=\"status\">{}</span></div>",
        escape_html(status.label())
    );
    if status != RegistrationStatus::Registered {
        let _ = writeln!(
            html,
            "<form method=\"post\" action=\"/register\"><button id=\"registerBtn\" type=\"submit\"{}>Register</button></form>",
            disabled(model, Control::Register)
        );
    }
    html.push_str("</section>\n");
    html
}

fn render_submit(model: &PageModel) -> String {
    let mut html = String::from("<section id=\"submit\">\n<h2>New proposal</h2>\n");
    html.push_str("<form method=\"post\" action=\"/proposals\">\n");
    let _ = writeln!(
        html,
        "<textarea id=\"proposalText\" name=\"text\" placeholder=\"Describe your proposal\">{}</textarea>",
        escape_html(&model.view.draft)
    );
    let _ = writeln!(
        html,
        "<button id=\"submitBtn\" type=\"submit\"{}>Submit Proposal</button>",
        disabled(model, Control::Submit)
    );
    html.push_str("</form>\n</section>\n");
    html
}

fn render_proposals(model: &PageModel) -> String {
    let mut html = String::from("<section id=\"proposals\">\n<h2>Proposals</h2>\n");
    let _ = writeln!(
        html,
        "<form method=\"post\" action=\"/refresh\"><button id=\"refreshBtn\" type=\"submit\"{}>Refresh</button></form>",
        disabled(model, Control::Refresh)
    );
    html.push_str("<div id=\"proposalsContainer\">\n");
    match &model.view.proposals {
        ProposalsView::ConnectPrompt => {
            html.push_str("<p>Connect wallet to load proposals.</p>\n");
        }
        ProposalsView::Loading => html.push_str("<p>Loading...</p>\n"),
        ProposalsView::Empty => html.push_str("<p>No proposals yet.</p>\n"),
        ProposalsView::Failed => {
            html.push_str("<p class=\"error\">Error loading proposals. See log.</p>\n");
        }
        ProposalsView::Loaded(proposals) => {
            for proposal in proposals {
                html.push_str(&render_proposal(model, proposal));
            }
        }
    }
    html.push_str("</div>\n</section>\n");
    html
}

/// One proposal card.
pub fn render_proposal(model: &PageModel, proposal: &Proposal) -> String {
    let id = proposal.id;
    let mut html = String::from("<div class=\"proposal\">\n");
    let _ = writeln!(
        html,
        "<h3>Proposal #{id} by {}</h3>",
        escape_html(&abbreviate(&proposal.proposer))
    );
    let _ = writeln!(html, "<p>{}</p>", escape_html(&proposal.description));
    let _ = writeln!(
        html,
        "<p>✅ {} &nbsp; ❌ {}</p>",
        proposal.yes_votes, proposal.no_votes
    );
    if proposal.active {
        let state = disabled(model, Control::Vote(id));
        let _ = writeln!(
            html,
            "<form method=\"post\" action=\"/proposals/{id}/vote\">\
<button type=\"submit\" name=\"support\" value=\"true\"{state}>Support</button> \
<button type=\"submit\" name=\"support\" value=\"false\"{state}>Oppose</button></form>"
        );
    } else {
        html.push_str("<p class=\"closed\">Voting closed</p>\n");
    }
    html.push_str("</div>\n");
    html
}
