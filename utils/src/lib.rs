//! Shared utilities for the Agora voting page.

pub mod html;
pub mod logging;

pub use html::escape_html;
pub use logging::{init_logging, LogFormat};
