//! Per-session conversation history.

pub mod sanitize;
pub mod store;
pub mod types;

pub use sanitize::sanitize_history;
pub use store::{ConversationStore, SessionEpoch, DEFAULT_MAX_TURNS};
pub use types::{ContentBlock, ImageRef, Role, SessionSummary, Turn};
