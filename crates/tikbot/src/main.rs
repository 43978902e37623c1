use anyhow::Result;
use dotenvy::dotenv;
use secrecy::ExposeSecret;
use std::net::SocketAddr;
use std::path::Path;
use std::sync::Arc;
use std::time::Duration;
use teloxide::prelude::*;
use teloxide::types::ChatId;
use teloxide::update_listeners::{webhooks, Polling};
use tokio::net::TcpListener;
use tokio::time::sleep;

use tikbot::cli::{Cli, Commands};
use tikbot::health::{self, start_health_server};
use tikbot::telegram::{bot_token, create_bot, schema, setup_bot_commands, HandlerDeps};
use tikcore::fetch::download_video;
use tikcore::logging::init_logger;
use tikcore::providers::common::build_client;
use tikcore::{config, metrics, Media, ResolvedVideo, ResolverChain, ResolverConfig, UsageStats, VideoFetcher};

const GET_ME_MAX_RETRIES: u32 = 12;

/// Main entry point for the Telegram bot
///
/// Parses CLI arguments and dispatches to the subcommand. With no subcommand
/// the bot runs in polling mode.
#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse_args();

    // Load environment variables from .env if present
    let _ = dotenv();

    init_logger(*config::DEBUG)?;

    match cli.command {
        Some(Commands::Run { webhook }) => run_bot(webhook).await,
        Some(Commands::Resolve { url, json }) => resolve_once(&url, json).await,
        Some(Commands::Download { url, output }) => download_once(&url, &output).await,
        None => run_bot(false).await,
    }
}

fn build_chain(client: &reqwest::Client) -> ResolverChain {
    let resolver_config = ResolverConfig::from_env();
    let chain = ResolverChain::from_config(&resolver_config, client);
    log::info!(
        "🔗 Provider chain: {} (timeout {}s each)",
        chain.provider_names().join(" → "),
        chain.timeout().as_secs()
    );
    chain
}

async fn run_bot(use_webhook: bool) -> Result<()> {
    let bot_init_start = std::time::Instant::now();
    log::info!("🚀 Starting TikTok Downloader Bot...");

    metrics::init_metrics();

    let token = bot_token()?;
    let bot = create_bot(&token)?;

    // Retry while a local Bot API server is still starting up
    let mut attempt = 0;
    let me = loop {
        match bot.get_me().await {
            Ok(me) => break me,
            Err(e) => {
                attempt += 1;
                if attempt >= GET_ME_MAX_RETRIES {
                    return Err(anyhow::anyhow!(
                        "Failed to connect to Bot API after {} retries: {}",
                        attempt,
                        e
                    ));
                }
                log::warn!(
                    "Bot API not ready (attempt {}/{}): {}. Retrying in 5 seconds...",
                    attempt,
                    GET_ME_MAX_RETRIES,
                    e
                );
                sleep(Duration::from_secs(5)).await;
            }
        }
    };
    log::info!("🤖 Bot username: {:?}, Bot ID: {}", me.username, me.id.0);

    if let Err(e) = setup_bot_commands(&bot).await {
        log::warn!("Failed to register bot commands: {}", e);
    }

    let client = build_client()?;
    let chain = Arc::new(build_chain(&client));
    let fetcher = Arc::new(VideoFetcher::new(client));
    let stats = Arc::new(UsageStats::new());

    let health_stats = Arc::clone(&stats);

    let admin_chat = config::admin::ADMIN_CHAT_ID.map(ChatId);
    if admin_chat.is_none() {
        log::info!("ADMIN_CHAT_ID not set, admin error reports disabled");
    }
    let deps = HandlerDeps::new(chain, fetcher, stats, admin_chat);
    let handler = schema(deps);

    let webhook_url = if use_webhook { config::WEBHOOK_URL.clone() } else { None };
    if use_webhook && webhook_url.is_none() {
        log::warn!("--webhook given but WEBHOOK_URL is not set, falling back to polling");
    }

    log::info!("================================================");
    log::info!("🎉 Bot initialization complete in {:.2}s", bot_init_start.elapsed().as_secs_f64());
    log::info!("================================================");

    match webhook_url {
        Some(base) => {
            let address = SocketAddr::from(([0, 0, 0, 0], *config::PORT));
            let url: url::Url = format!("{}/{}", base.trim_end_matches('/'), token.expose_secret()).parse()?;
            log::info!("🌐 Starting bot in webhook mode on port {}", *config::PORT);

            // One public port: the webhook route and the health routes share it
            let (listener, stop_flag, webhook_router) =
                webhooks::axum_to_router(bot.clone(), webhooks::Options::new(address, url)).await?;
            let app = health::merge_into(webhook_router, health_stats);
            let tcp_listener = TcpListener::bind(address).await?;
            tokio::spawn(async move {
                if let Err(e) = axum::serve(tcp_listener, app).with_graceful_shutdown(stop_flag).await {
                    log::error!("Webhook server error: {}", e);
                }
            });

            Dispatcher::builder(bot, handler)
                .dependencies(DependencyMap::new())
                .enable_ctrlc_handler()
                .build()
                .dispatch_with_listener(
                    listener,
                    LoggingErrorHandler::with_custom_text("An error from the update listener"),
                )
                .await;
        }
        None => {
            log::info!("📡 Starting bot in long polling mode");
            let health_port = *config::health::PORT;
            tokio::spawn(async move {
                if let Err(e) = start_health_server(health_port, health_stats).await {
                    log::error!("Health server error: {}", e);
                }
            });

            // Drop updates that piled up while the bot was down
            let listener = Polling::builder(bot.clone()).drop_pending_updates().build();
            Dispatcher::builder(bot, handler)
                .dependencies(DependencyMap::new())
                .enable_ctrlc_handler()
                .build()
                .dispatch_with_listener(
                    listener,
                    LoggingErrorHandler::with_custom_text("An error from the update listener"),
                )
                .await;
        }
    }

    log::info!("Dispatcher shutdown gracefully");
    Ok(())
}

fn describe(video: &ResolvedVideo) -> serde_json::Value {
    let payload = &video.payload;
    let media = match &payload.media {
        Media::Url(url) => serde_json::json!({ "url": url.as_str() }),
        Media::Bytes(bytes) => serde_json::json!({ "bytes": bytes.len() }),
    };
    serde_json::json!({
        "source": video.source,
        "title": payload.title,
        "author": payload.author,
        "quality": payload.quality.to_string(),
        "duration_secs": payload.duration_secs,
        "size_estimate": payload.size_estimate,
        "thumbnail": payload.thumbnail.as_ref().map(|u| u.to_string()),
        "media": media,
    })
}

async fn resolve_once(url: &str, json: bool) -> Result<()> {
    let client = build_client()?;
    let chain = build_chain(&client);

    match chain.resolve(url).await {
        Ok(video) => {
            if json {
                println!("{}", serde_json::to_string_pretty(&describe(&video))?);
            } else {
                let payload = &video.payload;
                println!("Source:   {}", video.source);
                println!("Title:    {}", payload.title);
                println!("Author:   @{}", payload.author);
                println!("Quality:  {}", payload.quality);
                if let Some(size) = payload.size_estimate {
                    println!("Size:     {:.1}MB", size as f64 / (1024.0 * 1024.0));
                }
                match payload.media_url() {
                    Some(link) => println!("Media:    {}", link),
                    None => println!("Media:    inline body"),
                }
            }
            Ok(())
        }
        Err(e) => {
            if json {
                println!("{}", serde_json::json!({ "error": e.to_string() }));
            } else {
                println!("{}", e.user_message());
            }
            Err(e.into())
        }
    }
}

async fn download_once(url: &str, output: &Path) -> Result<()> {
    let client = build_client()?;
    let chain = build_chain(&client);
    let fetcher = VideoFetcher::new(client);

    let fetched = download_video(&chain, &fetcher, url).await?;
    tokio::fs::write(output, &fetched.bytes).await?;

    println!(
        "Saved {:.1}MB from {} to {}",
        fetched.size() as f64 / (1024.0 * 1024.0),
        fetched.video.source,
        output.display()
    );
    Ok(())
}
