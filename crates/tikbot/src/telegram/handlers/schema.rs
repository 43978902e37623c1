//! Dispatcher schema and handler chain builders

use teloxide::dispatching::{UpdateFilterExt, UpdateHandler};
use teloxide::prelude::*;
use teloxide::types::Message;
use tikcore::validation::extract_tiktok_url;

use super::commands::{handle_help_command, handle_plain_text, handle_start_command, handle_stats_command};
use super::types::{HandlerDeps, HandlerError};
use crate::telegram::bot::Command;
use crate::telegram::delivery::process_tiktok_url;
use crate::telegram::menu::handle_menu_callback;

/// Creates the main dispatcher schema for the Telegram bot.
///
/// The same tree is used by the dispatcher in production and by the
/// integration tests.
pub fn schema(deps: HandlerDeps) -> UpdateHandler<HandlerError> {
    let deps_commands = deps.clone();
    let deps_links = deps.clone();
    let deps_callback = deps;

    dptree::entry()
        .branch(command_handler(deps_commands))
        // Messages carrying a TikTok link
        .branch(tiktok_link_handler(deps_links))
        // Any other text
        .branch(text_handler())
        .branch(callback_handler(deps_callback))
}

fn command_handler(deps: HandlerDeps) -> UpdateHandler<HandlerError> {
    Update::filter_message().branch(dptree::entry().filter_command::<Command>().endpoint(
        move |bot: Bot, msg: Message, cmd: Command| {
            let deps = deps.clone();
            async move {
                log::info!("🎯 Received command: {:?} from chat {}", cmd, msg.chat.id.0);
                match cmd {
                    Command::Start => handle_start_command(&bot, &msg).await?,
                    Command::Help => handle_help_command(&bot, &msg).await?,
                    Command::Stats => handle_stats_command(&bot, &msg, &deps).await?,
                }
                Ok(())
            }
        },
    ))
}

/// Pulls the TikTok link out of a message, ignoring commands.
pub fn tiktok_link_in(msg: &Message) -> Option<String> {
    let text = msg.text()?;
    if text.starts_with('/') {
        return None;
    }
    extract_tiktok_url(text)
}

fn tiktok_link_handler(deps: HandlerDeps) -> UpdateHandler<HandlerError> {
    Update::filter_message()
        .filter_map(|msg: Message| tiktok_link_in(&msg))
        .endpoint(move |bot: Bot, msg: Message, url: String| {
            let deps = deps.clone();
            async move { process_tiktok_url(&bot, &msg, &url, &deps).await }
        })
}

fn text_handler() -> UpdateHandler<HandlerError> {
    Update::filter_message()
        .filter(|msg: Message| msg.text().is_some_and(|t| !t.starts_with('/')))
        .endpoint(|bot: Bot, msg: Message| async move {
            let text = msg.text().unwrap_or_default();
            handle_plain_text(&bot, &msg, text).await
        })
}

fn callback_handler(deps: HandlerDeps) -> UpdateHandler<HandlerError> {
    Update::filter_callback_query().endpoint(move |bot: Bot, q: CallbackQuery| {
        let deps = deps.clone();
        async move {
            handle_menu_callback(bot, q, deps)
                .await
                .map_err(|e| Box::new(e) as HandlerError)
        }
    })
}
