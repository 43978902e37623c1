//! Chat texts. Everything here is rendered with `ParseMode::Html`, so any
//! value that came from a user or a provider goes through `escape`.

use indoc::{formatdoc, indoc};
use teloxide::utils::html::escape;
use tikcore::stats::{format_duration, StatsSnapshot};
use tikcore::validation::ValidationError;
use tikcore::{QualityPreference, ResolvedVideo};

const MAX_TITLE_CHARS: usize = 100;

pub fn welcome(first_name: &str) -> String {
    formatdoc! {"
        🎬 <b>TikTok HD Downloader Bot</b>

        👋 Hello {name}! I can help you download TikTok videos in HD quality without watermarks.

        <b>How to use:</b>
        1️⃣ Send me any TikTok video link
        2️⃣ Wait while I process it
        3️⃣ Get your HD video without watermark!

        <b>Supported formats:</b>
        • tiktok.com/@user/video/123456
        • vm.tiktok.com/ABC123
        • vt.tiktok.com/ABC123

        <b>Commands:</b>
        /start - Show this message
        /help - Get help and examples
        /stats - View bot statistics

        Ready to download? Just send me a TikTok link! 🚀",
        name = escape(first_name),
    }
}

/// Shorter welcome shown when navigating back to the main menu.
pub fn main_menu(first_name: &str) -> String {
    formatdoc! {"
        🎬 <b>TikTok HD Downloader Bot</b>

        👋 Hello {name}! I can help you download TikTok videos in HD quality without watermarks.

        <b>How to use:</b>
        1️⃣ Send me any TikTok video link
        2️⃣ Wait while I process it
        3️⃣ Get your HD video without watermark!

        Ready to download? Just send me a TikTok link! 🚀",
        name = escape(first_name),
    }
}

pub fn help() -> &'static str {
    indoc! {"
        📚 <b>Help &amp; Instructions</b>

        <b>Step-by-step guide:</b>
        1. Open TikTok app on your phone
        2. Find the video you want to download
        3. Tap the \"Share\" button (arrow icon)
        4. Select \"Copy Link\"
        5. Come back to this bot and paste the link
        6. Wait for the magic! ✨

        <b>Supported URL formats:</b>
        • <code>https://www.tiktok.com/@username/video/1234567890</code>
        • <code>https://vm.tiktok.com/ABC123DEF/</code>
        • <code>https://vt.tiktok.com/ABC123/</code>
        • <code>https://tiktok.com/t/ABC123/</code>

        <b>Quality options:</b>
        🔥 <b>HD</b> - Highest available quality
        📺 <b>Standard</b> - Good quality, smaller file

        <b>Tips:</b>
        • Videos are processed in HD when available
        • Some videos might be region-locked
        • Private accounts may not work

        <b>Troubleshooting:</b>
        ❌ <b>\"Invalid URL\"</b> - Check your link format
        ❌ <b>\"Download failed\"</b> - The video might be deleted or private"}
}

pub fn help_link() -> &'static str {
    indoc! {"
        📱 <b>How to get TikTok video link:</b>

        1. Open TikTok app
        2. Find the video you want
        3. Tap the <b>Share</b> button (➡️)
        4. Select <b>Copy Link</b>
        5. Come back here and paste it!

        <b>Alternative method:</b>
        1. Tap and hold on the video
        2. Select \"Copy Link\" from menu
        3. Paste here!

        That's it! 🎉"}
}

pub fn quality_settings(current: QualityPreference) -> String {
    formatdoc! {"
        ⚙️ <b>Quality Settings</b>

        <b>Available options:</b>
        🔥 <b>Auto HD</b> - Best quality available (default)
        📺 <b>Standard</b> - Good quality, faster download

        <b>Current setting:</b> {current} ✅",
        current = quality_label(current),
    }
}

pub fn quality_label(quality: QualityPreference) -> &'static str {
    match quality {
        QualityPreference::Hd => "Auto HD",
        QualityPreference::Standard => "Standard",
    }
}

pub fn stats(snapshot: &StatsSnapshot) -> String {
    formatdoc! {"
        📊 <b>Bot Statistics</b>

        <b>Downloads:</b>
        ✅ Successful: {successful}
        ❌ Failed: {failed}
        📈 Total: {total}

        <b>Success rate:</b> {rate:.1}%

        <b>Uptime:</b> {uptime}

        <b>Status:</b> 🟢 Online
        🤖 Version: {version}",
        successful = snapshot.successful,
        failed = snapshot.failed,
        total = snapshot.total,
        rate = snapshot.success_rate(),
        uptime = format_duration(snapshot.uptime),
        version = env!("CARGO_PKG_VERSION"),
    }
}

pub const STAGE_FETCHING_INFO: &str = "🔄 <b>Processing your request...</b>\n\n⏳ Fetching video information...";
pub const STAGE_DOWNLOADING: &str = "🔄 <b>Processing your request...</b>\n\n📥 Downloading HD video...";
pub const STAGE_UPLOADING: &str = "🔄 <b>Processing your request...</b>\n\n📤 Uploading your video...";

pub const GREETING: &str =
    "👋 Hello! Send me a TikTok video link and I'll download it for you in HD quality!\n\nUse /help if you need assistance. 🎬";

pub const NO_LINK: &str =
    "🤔 I didn't find a TikTok link in your message.\n\nPlease send me a valid TikTok video URL, or use /help for instructions.";

pub const INVALID_URL: &str =
    "❌ <b>Invalid TikTok URL</b>\n\nPlease send a valid TikTok link. Need help? Use /help to see examples.";

pub const MISSING_VIDEO_ID: &str =
    "❌ <b>Invalid TikTok URL</b>\n\nCould not extract video ID from URL. Please send a link to a single video, not a profile.";

/// Status text for a link rejected before any download service was asked.
pub fn rejected_url(error: &ValidationError) -> &'static str {
    match error {
        ValidationError::MissingVideoId(_) => MISSING_VIDEO_ID,
        _ => INVALID_URL,
    }
}

pub fn download_failed(reason: &str) -> String {
    format!(
        "❌ <b>Download Failed</b>\n\n{}\n\nPlease try again or check if the video is available.",
        escape(reason)
    )
}

pub fn file_too_large(size_bytes: Option<u64>, limit_bytes: u64) -> String {
    let size = size_bytes
        .map(|s| format!("Video size: {:.1}MB\n", megabytes(s)))
        .unwrap_or_default();
    format!(
        "❌ <b>File Too Large</b>\n\n{}Telegram limit: {:.0}MB\n\nTry downloading a shorter video.",
        size,
        megabytes(limit_bytes)
    )
}

/// Sent instead of the video when it is over the upload limit but a direct link exists.
pub fn direct_link(video: &ResolvedVideo, size_bytes: Option<u64>, limit_bytes: u64) -> String {
    let size = size_bytes
        .map(|s| format!("📱 <b>Size:</b> {:.1}MB\n", megabytes(s)))
        .unwrap_or_default();
    formatdoc! {"
        🎬 <b>{title}</b>

        {size}⚠️ This video is larger than Telegram's {limit:.0}MB limit for bots, so it can't be uploaded here.
        Use the button below to download it directly.",
        title = escape(&truncate_chars(&video.payload.title, MAX_TITLE_CHARS)),
        size = size,
        limit = megabytes(limit_bytes),
    }
}

pub fn upload_failed(error: &str) -> String {
    format!(
        "❌ <b>Upload Failed</b>\n\nError uploading video: {}\n\nPlease try again later.",
        escape(&truncate_chars(error, 100))
    )
}

pub fn caption(video: &ResolvedVideo, size_bytes: u64) -> String {
    let payload = &video.payload;
    formatdoc! {"
        🎬 <b>TikTok Video Downloaded</b>

        📝 <b>Title:</b> {title}
        👤 <b>Author:</b> @{author}
        🎯 <b>Quality:</b> {quality}
        📱 <b>Size:</b> {size:.1}MB
        🔗 <b>Source:</b> {source}

        ✨ Downloaded without watermark!",
        title = escape(&truncate_chars(&payload.title, MAX_TITLE_CHARS)),
        author = escape(&payload.author),
        quality = payload.quality,
        size = megabytes(size_bytes),
        source = escape(&video.source),
    }
}

/// "hello", "hi", "hey" or "start" anywhere in the message, as whole words.
pub fn is_greeting(text: &str) -> bool {
    text.to_lowercase()
        .split(|c: char| !c.is_alphanumeric())
        .any(|word| matches!(word, "hello" | "hi" | "hey" | "start"))
}

pub fn megabytes(bytes: u64) -> f64 {
    bytes as f64 / (1024.0 * 1024.0)
}

pub fn truncate_chars(s: &str, max: usize) -> String {
    if s.chars().count() <= max {
        s.to_string()
    } else {
        let mut out: String = s.chars().take(max).collect();
        out.push('…');
        out
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use std::time::Duration;
    use tikcore::{ProviderPayload, VideoQuality};

    fn video(title: &str) -> ResolvedVideo {
        let mut payload =
            ProviderPayload::from_url("https://cdn.test/v.mp4".parse().unwrap(), VideoQuality::Hd);
        payload.title = title.to_string();
        payload.author = "brain".to_string();
        ResolvedVideo {
            source: "tikwm".to_string(),
            payload,
        }
    }

    #[test]
    fn test_caption_escapes_provider_text() {
        let text = caption(&video("<b>cats</b> & dogs"), 3 * 1024 * 1024);
        assert!(text.contains("&lt;b&gt;cats&lt;/b&gt; &amp; dogs"));
        assert!(text.contains("@brain"));
        assert!(text.contains("<b>Quality:</b> HD"));
        assert!(text.contains("3.0MB"));
        assert!(text.contains("tikwm"));
    }

    #[test]
    fn test_caption_truncates_long_titles() {
        let long = "a".repeat(300);
        let text = caption(&video(&long), 1024);
        assert!(text.contains(&format!("{}…", "a".repeat(100))));
        assert!(!text.contains(&"a".repeat(101)));
    }

    #[test]
    fn test_welcome_escapes_name() {
        assert!(welcome("<script>").contains("Hello &lt;script&gt;!"));
    }

    #[test]
    fn test_is_greeting() {
        assert!(is_greeting("Hello there"));
        assert!(is_greeting("hey!"));
        assert!(is_greeting("how do I start?"));
        assert!(!is_greeting("this is a cat"));
        assert!(!is_greeting("whatever"));
    }

    #[test]
    fn test_file_too_large() {
        let text = file_too_large(Some(80 * 1024 * 1024), 50 * 1024 * 1024);
        assert!(text.contains("Video size: 80.0MB"));
        assert!(text.contains("Telegram limit: 50MB"));
        assert!(!file_too_large(None, 50 * 1024 * 1024).contains("Video size"));
    }

    #[test]
    fn test_stats_rate() {
        let snapshot = StatsSnapshot {
            total: 4,
            successful: 3,
            failed: 1,
            uptime: Duration::from_secs(3725),
        };
        let text = stats(&snapshot);
        assert!(text.contains("Success rate:</b> 75.0%"));
        assert!(text.contains("1h 2m 5s"));
    }

    #[test]
    fn test_quality_settings_marks_current() {
        assert!(quality_settings(QualityPreference::Standard).contains("Current setting:</b> Standard"));
    }

    #[test]
    fn test_rejected_url_texts() {
        let missing = ValidationError::MissingVideoId("https://www.tiktok.com/@someone".into());
        assert!(rejected_url(&missing).contains("Could not extract video ID"));
        let foreign = ValidationError::NotTikTok("https://youtube.com".into());
        assert_eq!(rejected_url(&foreign), INVALID_URL);
    }

    #[test]
    fn test_truncate_chars_multibyte() {
        assert_eq!(truncate_chars("привет", 3), "при…");
        assert_eq!(truncate_chars("hi", 3), "hi");
    }
}
