//! Configuration for the bot, read once from the environment.
//!
//! `.env` is loaded by the binary before any of these statics are touched.

use once_cell::sync::Lazy;
use std::env;
use std::time::Duration;

/// Bot token
/// Read from TELEGRAM_BOT_TOKEN, BOT_TOKEN or TELOXIDE_TOKEN environment variable
pub static BOT_TOKEN: Lazy<String> = Lazy::new(|| {
    env::var("TELEGRAM_BOT_TOKEN")
        .or_else(|_| env::var("BOT_TOKEN"))
        .or_else(|_| env::var("TELOXIDE_TOKEN"))
        .unwrap_or_default()
});

/// Webhook base URL for Telegram updates
/// Read from WEBHOOK_URL environment variable; the token is appended as the path
pub static WEBHOOK_URL: Lazy<Option<String>> = Lazy::new(|| non_empty_var("WEBHOOK_URL"));

/// Custom Bot API server URL (local telegram-bot-api)
pub static BOT_API_URL: Lazy<Option<String>> = Lazy::new(|| non_empty_var("BOT_API_URL"));

/// Port the webhook listener binds to
/// Read from PORT environment variable
/// Default: 8443
pub static PORT: Lazy<u16> = Lazy::new(|| parse_var("PORT").unwrap_or(8443));

/// Enables debug-level logging when set to anything
pub static DEBUG: Lazy<bool> = Lazy::new(|| env::var("DEBUG").is_ok());

fn non_empty_var(key: &str) -> Option<String> {
    env::var(key).ok().and_then(|value| {
        let trimmed = value.trim();
        if trimmed.is_empty() {
            None
        } else {
            Some(trimmed.to_string())
        }
    })
}

fn parse_var<T: std::str::FromStr>(key: &str) -> Option<T> {
    env::var(key).ok().and_then(|v| v.trim().parse::<T>().ok())
}

/// Provider chain configuration
pub mod providers {
    use super::{parse_var, Duration, Lazy};
    use std::env;

    /// Default per-provider timeout (in seconds)
    pub const DEFAULT_TIMEOUT_SECS: u64 = 30;

    /// Per-provider timeout, PROVIDER_TIMEOUT_SECS
    pub static TIMEOUT_SECS: Lazy<u64> = Lazy::new(|| parse_var("PROVIDER_TIMEOUT_SECS").unwrap_or(DEFAULT_TIMEOUT_SECS));

    /// Comma-separated provider names overriding the default order, PROVIDER_ORDER
    pub static ORDER: Lazy<Option<String>> = Lazy::new(|| env::var("PROVIDER_ORDER").ok());

    pub fn timeout() -> Duration {
        Duration::from_secs(*TIMEOUT_SECS)
    }

    /// Browser user agent sent to the scraping services
    pub const USER_AGENT: &str =
        "Mozilla/5.0 (Windows NT 10.0; Win64; x64) AppleWebKit/537.36 (KHTML, like Gecko) Chrome/120.0.0.0 Safari/537.36";
}

/// Download configuration
pub mod download {
    use super::{parse_var, Duration, Lazy};

    /// Telegram's upload limit for bots on the public Bot API
    pub const DEFAULT_MAX_FILE_SIZE_MB: u64 = 50;

    /// Anything smaller than this is an error page, not a video
    pub const MIN_VIDEO_BYTES: usize = 1000;

    /// Timeout for fetching the media file itself (in seconds)
    pub const FETCH_TIMEOUT_SECS: u64 = 120;

    /// MAX_FILE_SIZE_MB
    pub static MAX_FILE_SIZE_MB: Lazy<u64> =
        Lazy::new(|| parse_var("MAX_FILE_SIZE_MB").unwrap_or(DEFAULT_MAX_FILE_SIZE_MB));

    pub fn max_file_size_bytes() -> u64 {
        megabytes_to_bytes(*MAX_FILE_SIZE_MB)
    }

    /// Saturates instead of overflowing on absurd MAX_FILE_SIZE_MB values.
    pub fn megabytes_to_bytes(mb: u64) -> u64 {
        mb.saturating_mul(1024 * 1024)
    }

    pub fn fetch_timeout() -> Duration {
        Duration::from_secs(FETCH_TIMEOUT_SECS)
    }
}

/// Network configuration
pub mod network {
    use super::Duration;

    /// Request timeout for Bot API calls (in seconds)
    /// Video uploads of up to 50 MB go through this client
    pub const REQUEST_TIMEOUT_SECS: u64 = 300;

    pub fn timeout() -> Duration {
        Duration::from_secs(REQUEST_TIMEOUT_SECS)
    }
}

/// Liveness server configuration
pub mod health {
    use super::{parse_var, Lazy};

    /// HEALTH_PORT, default 8080
    pub static PORT: Lazy<u16> = Lazy::new(|| parse_var("HEALTH_PORT").unwrap_or(8080));

    /// Seconds after start during which /ready reports "starting"
    pub const READY_AFTER_SECS: u64 = 5;
}

/// Admin configuration
pub mod admin {
    use super::{parse_var, Lazy};

    /// Chat that receives unexpected-error reports
    /// Read from ADMIN_CHAT_ID environment variable
    pub static ADMIN_CHAT_ID: Lazy<Option<i64>> = Lazy::new(|| parse_var("ADMIN_CHAT_ID"));
}
