use teloxide::prelude::*;
use tikcore::fetch::FetchError;

use super::texts::truncate_chars;

/// Admin report for a request that failed in an unexpected way.
pub fn error_report(user_id: Option<UserId>, url: &str, error: &str) -> String {
    let user = user_id.map(|id| id.0.to_string()).unwrap_or_else(|| "unknown".to_string());
    format!(
        "❌ Error in bot:\nUser: {}\nURL: {}\nError: {}",
        user,
        url,
        truncate_chars(error, 200)
    )
}

/// Whether a fetch failure is worth paging the admin about. Size limits and
/// upstream status codes are routine.
pub fn is_unexpected_fetch_error(err: &FetchError) -> bool {
    matches!(err, FetchError::Network(_))
}

/// Sends a plain-text message to the admin chat, if one is configured.
///
/// Failures are logged and swallowed.
pub async fn notify_admin(bot: &Bot, admin_chat: Option<ChatId>, text: &str) {
    let Some(chat_id) = admin_chat else {
        log::debug!("ADMIN_CHAT_ID not set, skipping admin notification");
        return;
    };
    if let Err(e) = bot.send_message(chat_id, text).await {
        log::error!("Failed to notify admin {}: {}", chat_id.0, e);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_report() {
        let report = error_report(Some(UserId(42)), "https://vm.tiktok.com/abc", &"x".repeat(500));
        assert!(report.starts_with("❌ Error in bot:\nUser: 42\nURL: https://vm.tiktok.com/abc\nError: "));
        assert!(report.chars().count() < 300);
        assert!(error_report(None, "u", "e").contains("User: unknown"));
    }

    #[test]
    fn test_unexpected_fetch_errors() {
        assert!(is_unexpected_fetch_error(&FetchError::Network("reset".into())));
        assert!(!is_unexpected_fetch_error(&FetchError::HttpStatus(403)));
        assert!(!is_unexpected_fetch_error(&FetchError::TooSmall(10)));
    }
}
