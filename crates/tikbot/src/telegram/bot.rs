//! Bot initialization
//!
//! This module contains:
//! - Command enum definition
//! - Bot instance creation (custom Bot API server support)
//! - Command registration in the Telegram UI

use reqwest::ClientBuilder;
use secrecy::{ExposeSecret, SecretString};
use teloxide::prelude::*;
use teloxide::types::BotCommand;
use teloxide::utils::command::BotCommands;

use tikcore::config;

/// Bot commands enum with descriptions
#[derive(BotCommands, Clone, Debug, PartialEq, Eq)]
#[command(rename_rule = "lowercase", description = "These commands are supported:")]
pub enum Command {
    #[command(description = "show the welcome message and main menu")]
    Start,
    #[command(description = "get help and examples")]
    Help,
    #[command(description = "view bot statistics")]
    Stats,
}

/// Reads the bot token from the environment.
///
/// # Returns
/// * `Err(anyhow::Error)` - none of TELEGRAM_BOT_TOKEN, BOT_TOKEN, TELOXIDE_TOKEN is set
pub fn bot_token() -> anyhow::Result<SecretString> {
    let token = config::BOT_TOKEN.trim();
    if token.is_empty() {
        anyhow::bail!("TELEGRAM_BOT_TOKEN is required in environment variables");
    }
    Ok(SecretString::from(token.to_string()))
}

/// Creates a Bot instance with custom or default API URL
///
/// # Returns
/// * `Ok(Bot)` - Successfully created bot instance
/// * `Err(anyhow::Error)` - Failed to create bot (invalid URL, client build failure)
pub fn create_bot(token: &SecretString) -> anyhow::Result<Bot> {
    let client = ClientBuilder::new().timeout(config::network::timeout()).build()?;
    let bot = Bot::with_client(token.expose_secret(), client);

    let bot = match config::BOT_API_URL.as_deref() {
        Some(bot_api_url) => {
            log::info!("Using custom Bot API URL: {}", bot_api_url);
            let url = url::Url::parse(bot_api_url).map_err(|e| anyhow::anyhow!("Invalid BOT_API_URL: {}", e))?;
            bot.set_api_url(url)
        }
        None => bot,
    };

    Ok(bot)
}

/// Sets up bot commands in Telegram UI
pub async fn setup_bot_commands(bot: &Bot) -> Result<(), teloxide::RequestError> {
    let commands: Vec<BotCommand> = Command::bot_commands();
    bot.set_my_commands(commands).await?;
    Ok(())
}
