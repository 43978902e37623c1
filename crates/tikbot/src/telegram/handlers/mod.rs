//! Telegram bot handler tree configuration
//!
//! The handlers are organized so that integration tests can drive the same
//! handler tree as production code.

mod commands;
mod schema;
mod types;

pub use schema::{schema, tiktok_link_in};
pub use types::{HandlerDeps, HandlerError};
