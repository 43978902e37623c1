//! Telegram delivery shell: commands, menus, and the download flow.

pub mod bot;
pub mod delivery;
pub mod handlers;
pub mod menu;
pub mod notifications;
pub mod texts;

pub use bot::{bot_token, create_bot, setup_bot_commands, Command};
pub use handlers::{schema, HandlerDeps, HandlerError};
