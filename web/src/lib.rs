//! The Agora voting page.
//!
//! A single view-controller turns user actions into contract calls and
//! re-renders the page from what the contract reports:
//! - session lifecycle (connect, silent restore, account switch)
//! - registration check and enrollment
//! - proposal submission, listing and voting
//! - one dispatch path funnelling every outcome into the [`Notifier`]
//! - HTML rendering and the axum routes serving it

pub mod config;
pub mod controller;
pub mod error;
pub mod notifier;
pub mod render;
pub mod server;
pub mod session;
pub mod view;

pub use config::{ConfigError, WebConfig};
pub use controller::{Action, ViewController};
pub use error::AppError;
pub use notifier::{Notice, NoticeLevel, Notifier};
pub use server::{router, WebServer};
pub use session::{Session, SessionState};
pub use view::{Control, PageModel, PendingControls, ProposalsView, ViewState};
