//! Plumbing shared by the HTTP providers: client construction, status checks,
//! body decoding and media-link normalization.

use super::ProviderFailure;
use crate::config;
use regex::Regex;
use reqwest::{Client, Response};
use serde::de::DeserializeOwned;
use std::time::Duration;
use url::Url;

/// Builds the client every provider shares.
///
/// No overall timeout is set here: the resolver chain bounds each provider
/// call with its own timeout.
pub fn build_client() -> reqwest::Result<Client> {
    Client::builder()
        .user_agent(config::providers::USER_AGENT)
        .connect_timeout(Duration::from_secs(15))
        .build()
}

/// Turns a non-2xx response into `HttpStatus`.
pub(crate) fn check_status(response: Response) -> Result<Response, ProviderFailure> {
    let status = response.status();
    if !status.is_success() {
        return Err(ProviderFailure::HttpStatus(status.as_u16()));
    }
    Ok(response)
}

/// Reads the body as text; a blank body is `EmptyPayload`.
pub(crate) async fn read_text(response: Response) -> Result<String, ProviderFailure> {
    let body = response.text().await.map_err(|e| ProviderFailure::Network(e.to_string()))?;
    if body.trim().is_empty() {
        return Err(ProviderFailure::EmptyPayload("empty response body".to_string()));
    }
    Ok(body)
}

/// Reads and decodes a JSON body.
pub(crate) async fn read_json<T: DeserializeOwned>(response: Response) -> Result<T, ProviderFailure> {
    let body = read_text(response).await?;
    parse_json(&body)
}

pub(crate) fn parse_json<T: DeserializeOwned>(body: &str) -> Result<T, ProviderFailure> {
    serde_json::from_str(body).map_err(|e| ProviderFailure::Malformed(format!("invalid JSON: {}", e)))
}

/// Parses a media link a service handed back.
///
/// Relative links are resolved against `base`. Protocol-relative links
/// (`//cdn...`) get https.
pub(crate) fn media_url(raw: &str, base: Option<&Url>) -> Result<Url, ProviderFailure> {
    let raw = raw.trim();
    if raw.is_empty() {
        return Err(ProviderFailure::EmptyPayload("empty media link".to_string()));
    }
    if let Some(rest) = raw.strip_prefix("//") {
        return Url::parse(&format!("https://{}", rest))
            .map_err(|e| ProviderFailure::Malformed(format!("bad media link {}: {}", raw, e)));
    }
    match Url::parse(raw) {
        Ok(url) => Ok(url),
        Err(url::ParseError::RelativeUrlWithoutBase) => match base {
            Some(base) => base
                .join(raw)
                .map_err(|e| ProviderFailure::Malformed(format!("bad media link {}: {}", raw, e))),
            None => Err(ProviderFailure::Malformed(format!("relative media link {}", raw))),
        },
        Err(e) => Err(ProviderFailure::Malformed(format!("bad media link {}: {}", raw, e))),
    }
}

/// First capture group of the first pattern that matches.
pub(crate) fn first_capture<'a>(patterns: &[Regex], text: &'a str) -> Option<&'a str> {
    patterns
        .iter()
        .find_map(|p| p.captures(text).and_then(|c| c.get(1)).map(|m| m.as_str()))
}

/// Undoes the escaping TikTok and friends apply to links embedded in JS/HTML.
pub(crate) fn unescape_link(raw: &str) -> String {
    raw.replace("\\u002F", "/")
        .replace("\\u0026", "&")
        .replace("\\/", "/")
        .replace("&amp;", "&")
}

/// Treats `None`, blank and whitespace-only strings alike.
pub(crate) fn non_blank(value: Option<String>) -> Option<String> {
    value.map(|v| v.trim().to_string()).filter(|v| !v.is_empty())
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_media_url_resolves_relative_links() {
        let base = Url::parse("https://www.tikwm.com").unwrap();
        let url = media_url("/video/media/hdplay/123.mp4", Some(&base)).unwrap();
        assert_eq!(url.as_str(), "https://www.tikwm.com/video/media/hdplay/123.mp4");
    }

    #[test]
    fn test_media_url_rejects_relative_without_base() {
        assert!(matches!(media_url("/x.mp4", None), Err(ProviderFailure::Malformed(_))));
        assert!(matches!(media_url("  ", None), Err(ProviderFailure::EmptyPayload(_))));
    }

    #[test]
    fn test_media_url_protocol_relative() {
        let url = media_url("//v16-webapp.tiktokcdn.com/abc/video.mp4", None).unwrap();
        assert_eq!(url.scheme(), "https");
    }

    #[test]
    fn test_unescape_link() {
        assert_eq!(
            unescape_link(r"https:\u002F\u002Fv16.tiktokcdn.com\u002Fa.mp4?x=1\u0026y=2"),
            "https://v16.tiktokcdn.com/a.mp4?x=1&y=2"
        );
    }

    #[test]
    fn test_parse_json_reports_malformed() {
        let res: Result<serde_json::Value, _> = parse_json("<html>");
        assert!(matches!(res, Err(ProviderFailure::Malformed(_))));
    }

    #[test]
    fn test_non_blank() {
        assert_eq!(non_blank(Some("  ".into())), None);
        assert_eq!(non_blank(Some(" a ".into())), Some("a".to_string()));
    }
}
