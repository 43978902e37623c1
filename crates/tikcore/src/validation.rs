//! URL validation and extraction for user input
//!
//! Provides:
//! - TikTok URL validation (whitelist of tiktok.com and its subdomains)
//! - Extraction of the first TikTok link from free-form chat text
//! - Video id / short code extraction from the accepted URL shapes

use once_cell::sync::Lazy;
use regex::Regex;
use thiserror::Error;
use url::Url;

/// Validation errors
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum ValidationError {
    /// Input is not a URL at all, or uses a scheme other than http(s)
    #[error("Invalid URL: {0}")]
    InvalidUrl(String),

    /// Well-formed URL on a non-TikTok host
    #[error("Not a TikTok URL: {0}")]
    NotTikTok(String),

    /// TikTok host, but no video id or short code in the path
    #[error("Could not extract video ID from URL: {0}")]
    MissingVideoId(String),
}

/// Shapes a user can paste, most specific first. The last pattern is a loose
/// catch-all; its match still has to pass `validate_tiktok_url`.
static TIKTOK_URL_PATTERNS: Lazy<Vec<Regex>> = Lazy::new(|| {
    [
        r"https?://(?:www\.)?tiktok\.com/@[^/\s]+/video/\d+[^\s]*",
        r"https?://(?:vm|vt)\.tiktok\.com/[A-Za-z0-9]+[^\s]*",
        r"https?://(?:www\.)?tiktok\.com/t/[A-Za-z0-9]+[^\s]*",
        r"https?://[^\s]*tiktok[^\s]*",
    ]
    .iter()
    .map(|p| Regex::new(p).expect("Failed to compile TikTok URL regex"))
    .collect()
});

static VIDEO_ID_PATTERNS: Lazy<Vec<Regex>> = Lazy::new(|| {
    [
        r"https?://(?:www\.|m\.)?tiktok\.com/@[^/]+/video/(\d+)",
        r"https?://(?:vm|vt)\.tiktok\.com/([A-Za-z0-9]+)",
        r"https?://(?:www\.)?tiktok\.com/t/([A-Za-z0-9]+)",
        r"/video/(\d+)",
        r"(\d{19})",
    ]
    .iter()
    .map(|p| Regex::new(p).expect("Failed to compile video id regex"))
    .collect()
});

static TRAILING_PUNCTUATION: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"[.,;!?)]*$").expect("Failed to compile punctuation regex"));

fn is_tiktok_host(host: &str) -> bool {
    let host = host.to_ascii_lowercase();
    host == "tiktok.com" || host.ends_with(".tiktok.com")
}

/// Validates that a URL is a TikTok URL and returns it parsed.
///
/// # Security
/// Uses whitelist approach:
/// - Only HTTP/HTTPS schemes allowed
/// - Only tiktok.com and its subdomains (www, m, vm, vt)
///
/// # Examples
/// ```
/// use tikcore::validation::validate_tiktok_url;
///
/// assert!(validate_tiktok_url("https://www.tiktok.com/@user/video/7535094535538347282").is_ok());
/// assert!(validate_tiktok_url("https://vm.tiktok.com/ZMabc123/").is_ok());
///
/// assert!(validate_tiktok_url("https://evil.com/tiktok.com/video/1").is_err());
/// assert!(validate_tiktok_url("ftp://tiktok.com/video").is_err());
/// assert!(validate_tiktok_url("not a url").is_err());
/// ```
pub fn validate_tiktok_url(url: &str) -> Result<Url, ValidationError> {
    let url = url.trim();
    let parsed = Url::parse(url).map_err(|_| ValidationError::InvalidUrl(url.to_string()))?;

    if parsed.scheme() != "http" && parsed.scheme() != "https" {
        return Err(ValidationError::InvalidUrl(format!(
            "{} (invalid scheme: {})",
            url,
            parsed.scheme()
        )));
    }

    let host = parsed
        .host_str()
        .ok_or_else(|| ValidationError::InvalidUrl(format!("{} (no host)", url)))?;

    if !is_tiktok_host(host) {
        return Err(ValidationError::NotTikTok(url.to_string()));
    }

    Ok(parsed)
}

/// Finds the first valid TikTok link in a chat message.
///
/// Trailing sentence punctuation is stripped (`"look: https://vm.tiktok.com/abc!"`).
pub fn extract_tiktok_url(text: &str) -> Option<String> {
    for pattern in TIKTOK_URL_PATTERNS.iter() {
        for m in pattern.find_iter(text) {
            let candidate = TRAILING_PUNCTUATION.replace(m.as_str(), "").to_string();
            if validate_tiktok_url(&candidate).is_ok() {
                return Some(candidate);
            }
        }
    }
    None
}

/// Extracts the numeric video id or the short-link code from a TikTok URL.
pub fn extract_video_id(url: &str) -> Option<String> {
    let url = url.trim();
    VIDEO_ID_PATTERNS
        .iter()
        .find_map(|p| p.captures(url).and_then(|c| c.get(1)).map(|m| m.as_str().to_string()))
}

/// Full check applied before a download request is built: TikTok host and a
/// recognizable video id or short code.
pub fn validate_download_url(url: &str) -> Result<Url, ValidationError> {
    let parsed = validate_tiktok_url(url)?;
    if extract_video_id(parsed.as_str()).is_none() {
        return Err(ValidationError::MissingVideoId(url.trim().to_string()));
    }
    Ok(parsed)
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_validate_accepts_known_hosts() {
        for url in [
            "https://www.tiktok.com/@user/video/7535094535538347282",
            "https://tiktok.com/@user/video/7535094535538347282",
            "https://m.tiktok.com/@user/video/7535094535538347282",
            "https://vm.tiktok.com/ZMabc123/",
            "http://vt.tiktok.com/ZSxyz/",
            "https://www.tiktok.com/t/ZTRabc/",
        ] {
            assert!(validate_tiktok_url(url).is_ok(), "{} should be accepted", url);
        }
    }

    #[test]
    fn test_validate_rejects_lookalikes() {
        assert!(matches!(
            validate_tiktok_url("https://nottiktok.com/@user/video/1"),
            Err(ValidationError::NotTikTok(_))
        ));
        assert!(matches!(
            validate_tiktok_url("https://tiktok.com.evil.org/video/1"),
            Err(ValidationError::NotTikTok(_))
        ));
        assert!(matches!(
            validate_tiktok_url("ftp://tiktok.com/video"),
            Err(ValidationError::InvalidUrl(_))
        ));
        assert!(matches!(validate_tiktok_url(""), Err(ValidationError::InvalidUrl(_))));
    }

    #[test]
    fn test_extract_from_text_strips_punctuation() {
        let text = "look at this https://vm.tiktok.com/ZMabc123/! so funny";
        assert_eq!(extract_tiktok_url(text), Some("https://vm.tiktok.com/ZMabc123/".to_string()));

        let text = "https://www.tiktok.com/@bra1nooo/video/7535094535538347282?lang=en.";
        assert_eq!(
            extract_tiktok_url(text),
            Some("https://www.tiktok.com/@bra1nooo/video/7535094535538347282?lang=en".to_string())
        );
    }

    #[test]
    fn test_extract_skips_non_tiktok_links() {
        assert_eq!(extract_tiktok_url("https://youtube.com/watch?v=abc"), None);
        assert_eq!(extract_tiktok_url("https://example.com/tiktok-clone"), None);
        assert_eq!(extract_tiktok_url("hello there"), None);
    }

    #[test]
    fn test_extract_video_id_shapes() {
        assert_eq!(
            extract_video_id("https://www.tiktok.com/@user/video/7535094535538347282"),
            Some("7535094535538347282".to_string())
        );
        assert_eq!(extract_video_id("https://vm.tiktok.com/ZMabc123/"), Some("ZMabc123".to_string()));
        assert_eq!(extract_video_id("https://www.tiktok.com/t/ZTRxyz/"), Some("ZTRxyz".to_string()));
        assert_eq!(extract_video_id("https://www.tiktok.com/@user"), None);
    }

    #[test]
    fn test_validate_download_url_requires_id() {
        assert!(validate_download_url("https://www.tiktok.com/@user/video/7535094535538347282").is_ok());
        assert!(matches!(
            validate_download_url("https://www.tiktok.com/@user"),
            Err(ValidationError::MissingVideoId(_))
        ));
    }
}
