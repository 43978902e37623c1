//! Command handler implementations (/start, /help, /stats) and plain text replies

use teloxide::prelude::*;
use teloxide::types::{Message, ParseMode, ReplyParameters};
use tikcore::metrics;

use super::types::{HandlerDeps, HandlerError};
use crate::telegram::menu::{back_keyboard, main_menu_keyboard, stats_keyboard};
use crate::telegram::texts;

/// Handle /start command
pub(super) async fn handle_start_command(bot: &Bot, msg: &Message) -> Result<(), HandlerError> {
    metrics::record_command("start");
    let first_name = msg.from.as_ref().map(|u| u.first_name.as_str()).unwrap_or("there");
    log::info!("👋 /start from chat {}", msg.chat.id.0);

    bot.send_message(msg.chat.id, texts::welcome(first_name))
        .parse_mode(ParseMode::Html)
        .reply_markup(main_menu_keyboard())
        .await?;
    Ok(())
}

/// Handle /help command
pub(super) async fn handle_help_command(bot: &Bot, msg: &Message) -> Result<(), HandlerError> {
    metrics::record_command("help");
    bot.send_message(msg.chat.id, texts::help())
        .parse_mode(ParseMode::Html)
        .reply_markup(back_keyboard())
        .await?;
    Ok(())
}

/// Handle /stats command
pub(super) async fn handle_stats_command(bot: &Bot, msg: &Message, deps: &HandlerDeps) -> Result<(), HandlerError> {
    metrics::record_command("stats");
    bot.send_message(msg.chat.id, texts::stats(&deps.stats.snapshot()))
        .parse_mode(ParseMode::Html)
        .reply_markup(stats_keyboard(false))
        .await?;
    Ok(())
}

/// Text without a TikTok link: greet back or point at /help.
pub(super) async fn handle_plain_text(bot: &Bot, msg: &Message, text: &str) -> Result<(), HandlerError> {
    let reply = if texts::is_greeting(text) {
        texts::GREETING
    } else {
        texts::NO_LINK
    };
    bot.send_message(msg.chat.id, reply)
        .reply_parameters(ReplyParameters::new(msg.id))
        .await?;
    Ok(())
}
