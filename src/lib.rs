//! Backend for a chat-platform monster tracking bot: users record which
//! monsters they have encountered at the `smallest` or `largest` size tier
//! and query their progress against the external catalog API. The chat
//! gateway invokes the command endpoints and renders the replies.

pub mod api;
pub mod catalog;
pub mod config;
pub mod db;
pub mod flow;
pub mod language;
pub mod metrics;
pub mod render;
pub mod session;
