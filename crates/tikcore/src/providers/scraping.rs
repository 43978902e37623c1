//! Last resort: fetch the TikTok page and dig the play address out of it.
//!
//! The page layout changes often; this tries the embedded initial-state JSON
//! first, then falls back to plain regexes over the HTML.

use super::common::{self, check_status, first_capture, media_url, unescape_link};
use super::{DownloadRequest, Provider, ProviderFailure, ProviderPayload, ProviderResult, VideoQuality};
use async_trait::async_trait;
use once_cell::sync::Lazy;
use regex::Regex;
use reqwest::Client;
use serde_json::Value;
use url::Url;

pub const NAME: &str = "scraping";

static INITIAL_STATE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"(?s)<script[^>]*>.*?window\.__INITIAL_STATE__\s*=\s*(\{.*?\});")
        .expect("Failed to compile initial state regex")
});

static VIDEO_PATTERNS: Lazy<Vec<Regex>> = Lazy::new(|| {
    [
        r#""downloadAddr":"([^"]+)""#,
        r#""playAddr":"([^"]+)""#,
        r#"<video[^>]*src="([^"]+)""#,
    ]
    .iter()
    .map(|p| Regex::new(p).expect("Failed to compile video pattern regex"))
    .collect()
});

/// Where the video object has lived in the initial state over time.
const STATE_PATHS: &[&[&str]] = &[
    &["ItemModule", "video"],
    &["VideoPage", "video"],
    &["ItemList", "video-detail"],
    &["seo", "metaParams"],
];

pub struct ScrapingProvider {
    client: Client,
}

impl ScrapingProvider {
    pub fn new(client: Client) -> Self {
        Self { client }
    }
}

fn walk<'a>(state: &'a Value, path: &[&str]) -> Option<&'a Value> {
    path.iter().try_fold(state, |node, key| node.get(*key))
}

fn play_addr(video: &Value) -> Option<&str> {
    match video.get("playAddr")? {
        Value::String(s) => Some(s.as_str()),
        Value::Object(obj) => obj.get("UrlList")?.get(0)?.as_str(),
        _ => None,
    }
}

fn from_initial_state(state: &Value, page: &Url) -> Option<ProviderPayload> {
    let video = STATE_PATHS
        .iter()
        .filter_map(|path| walk(state, path))
        .find(|node| node.get("playAddr").is_some())?;

    let link = play_addr(video).filter(|l| !l.trim().is_empty())?;
    let url = media_url(&unescape_link(link), Some(page)).ok()?;

    let mut payload = ProviderPayload::from_url(url, VideoQuality::Hd);
    if let Some(desc) = video.get("desc").and_then(Value::as_str).filter(|d| !d.trim().is_empty()) {
        payload.title = desc.trim().to_string();
    }
    if let Some(nickname) = video
        .get("author")
        .and_then(|a| a.get("nickname"))
        .and_then(Value::as_str)
        .filter(|n| !n.trim().is_empty())
    {
        payload.author = nickname.trim().to_string();
    }
    Some(payload)
}

/// Extracts a media link from a TikTok page.
pub fn parse_page(html: &str, page: &Url) -> ProviderResult {
    if let Some(raw) = INITIAL_STATE.captures(html).and_then(|c| c.get(1)) {
        match serde_json::from_str::<Value>(raw.as_str()) {
            Ok(state) => {
                if let Some(payload) = from_initial_state(&state, page) {
                    return Ok(payload);
                }
            }
            Err(e) => log::debug!("Scraping: initial state is not valid JSON: {}", e),
        }
    }

    let link = first_capture(&VIDEO_PATTERNS, html)
        .ok_or_else(|| ProviderFailure::EmptyPayload("no video address in page".to_string()))?;
    let url = media_url(&unescape_link(link), Some(page))?;
    Ok(ProviderPayload::from_url(url, VideoQuality::Unknown))
}

#[async_trait]
impl Provider for ScrapingProvider {
    fn name(&self) -> &str {
        NAME
    }

    async fn resolve(&self, request: &DownloadRequest) -> ProviderResult {
        log::debug!("Scraping: fetching page {}", request.url);
        let response = self
            .client
            .get(request.url.clone())
            .header("Accept", "text/html,application/xhtml+xml,application/xml;q=0.9,*/*;q=0.8")
            .header("Accept-Language", "en-US,en;q=0.9")
            .send()
            .await?;

        // Short links redirect; relative addresses resolve against the final page.
        let page = response.url().clone();
        let html = common::read_text(check_status(response)?).await?;
        parse_page(&html, &page)
    }
}
