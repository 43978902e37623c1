//! tikdownloader.io search endpoint.
//!
//! Answers with JSON whose `data` field is an HTML fragment; the download
//! anchors inside it carry the media links. HD anchors are labelled
//! "Download MP4 HD".

use super::common::{self, check_status, media_url, unescape_link};
use super::{DownloadRequest, Provider, ProviderFailure, ProviderPayload, ProviderResult, QualityPreference, VideoQuality};
use async_trait::async_trait;
use once_cell::sync::Lazy;
use regex::Regex;
use reqwest::Client;
use serde::Deserialize;
use url::Url;

pub const NAME: &str = "tikdownloader_io";

static DEFAULT_BASE_URL: Lazy<Url> =
    Lazy::new(|| Url::parse("https://tikdownloader.io").expect("tikdownloader.io base URL is valid"));

static TITLE: Lazy<Regex> = Lazy::new(|| Regex::new(r"(?is)<h3[^>]*>(.*?)</h3>").expect("Failed to compile title regex"));

static TAGS: Lazy<Regex> = Lazy::new(|| Regex::new(r"<[^>]+>").expect("Failed to compile tag regex"));

/// Download anchor; group 2 is present for the HD variant.
static DOWNLOAD_ANCHOR: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r#"(?is)href="([^"]*)" rel="nofollow"[^>]*><i class="icon icon-download"></i>\s*Download MP4(\s*HD)?"#)
        .expect("Failed to compile download anchor regex")
});

static CDN_LINK: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r#"https://v16-[^.]+\.tiktokcdn\.com/[^"'\s]+"#).expect("Failed to compile CDN link regex")
});

#[derive(Debug, Deserialize)]
struct SearchResponse {
    data: Option<String>,
}

pub struct TikDownloaderIoProvider {
    client: Client,
    base: Url,
}

impl TikDownloaderIoProvider {
    pub fn new(client: Client) -> Self {
        Self::with_base_url(client, DEFAULT_BASE_URL.clone())
    }

    pub fn with_base_url(client: Client, base: Url) -> Self {
        Self { client, base }
    }
}

fn extract_title(html: &str) -> Option<String> {
    let raw = TITLE.captures(html)?.get(1)?.as_str();
    let title = TAGS.replace_all(raw, "").trim().to_string();
    (!title.is_empty()).then_some(title)
}

/// Picks the media link out of the HTML fragment.
pub fn parse_html(html: &str, preference: QualityPreference) -> ProviderResult {
    let mut hd = None;
    let mut standard = None;
    for caps in DOWNLOAD_ANCHOR.captures_iter(html) {
        let Some(link) = caps.get(1).map(|m| m.as_str()).filter(|l| !l.trim().is_empty()) else {
            continue;
        };
        if caps.get(2).is_some() {
            hd = hd.or(Some(link));
        } else {
            standard = standard.or(Some(link));
        }
    }

    let hd = hd.map(|l| (l.to_string(), VideoQuality::Hd));
    let standard = standard.map(|l| (l.to_string(), VideoQuality::Standard));
    let picked = match preference {
        QualityPreference::Hd => hd.or(standard),
        QualityPreference::Standard => standard.or(hd),
    }
    .or_else(|| {
        CDN_LINK
            .find(html)
            .map(|m| (m.as_str().to_string(), VideoQuality::CdnDirect))
    });

    let (link, quality) =
        picked.ok_or_else(|| ProviderFailure::EmptyPayload("no download link in HTML".to_string()))?;

    let mut payload = ProviderPayload::from_url(media_url(&unescape_link(&link), None)?, quality);
    if let Some(title) = extract_title(html) {
        payload.title = title;
    }
    Ok(payload)
}

/// Classifies the JSON envelope, then the HTML inside it.
pub fn parse_response(body: &str, preference: QualityPreference) -> ProviderResult {
    let response: SearchResponse = common::parse_json(body)?;
    let html = response
        .data
        .ok_or_else(|| ProviderFailure::Malformed("no data field in response".to_string()))?;
    if html.trim().is_empty() {
        return Err(ProviderFailure::EmptyPayload("empty HTML fragment".to_string()));
    }
    parse_html(&html, preference)
}

#[async_trait]
impl Provider for TikDownloaderIoProvider {
    fn name(&self) -> &str {
        NAME
    }

    async fn resolve(&self, request: &DownloadRequest) -> ProviderResult {
        let endpoint = self
            .base
            .join("/api/ajaxSearch")
            .map_err(|e| ProviderFailure::Network(format!("bad endpoint: {}", e)))?;
        let origin = self.base.as_str().trim_end_matches('/').to_string();
        log::debug!("TikDownloader.io: requesting video info for {}", request.url);

        let response = self
            .client
            .post(endpoint)
            .header("Accept", "application/json, text/javascript, */*; q=0.01")
            .header("Accept-Language", "en-US,en;q=0.9")
            .header("Origin", origin.as_str())
            .header("Referer", format!("{}/en", origin))
            .header("X-Requested-With", "XMLHttpRequest")
            .form(&[("q", request.url.as_str()), ("lang", "en")])
            .send()
            .await?;

        let body = common::read_text(check_status(response)?).await?;
        parse_response(&body, request.quality)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    const HTML: &str = r#"
        <div class="tik-video">
          <div class="thumbnail"><h3>cat <b>does</b> a backflip</h3></div>
          <div class="dl-action">
            <p><a class="tik-button-dl button dl-success" href="https://dl.snapcdn.app/get?token=std" rel="nofollow"><i class="icon icon-download"></i> Download MP4 [1]</a></p>
            <p><a class="tik-button-dl button dl-success" href="https://dl.snapcdn.app/get?token=hd" rel="nofollow"><i class="icon icon-download"></i> Download MP4 HD</a></p>
            <p><a class="tik-button-dl button dl-success" href="https://dl.snapcdn.app/get?token=mp3" rel="nofollow"><i class="icon icon-download"></i> Download MP3</a></p>
          </div>
        </div>"#;

    #[test]
    fn test_parse_prefers_hd_anchor() {
        let payload = parse_html(HTML, QualityPreference::Hd).unwrap();
        assert_eq!(payload.media_url().unwrap().as_str(), "https://dl.snapcdn.app/get?token=hd");
        assert_eq!(payload.quality, VideoQuality::Hd);
        assert_eq!(payload.title, "cat does a backflip");
        assert_eq!(payload.author, ProviderPayload::DEFAULT_AUTHOR);
    }

    #[test]
    fn test_parse_standard_preference() {
        let payload = parse_html(HTML, QualityPreference::Standard).unwrap();
        assert_eq!(payload.media_url().unwrap().as_str(), "https://dl.snapcdn.app/get?token=std");
        assert_eq!(payload.quality, VideoQuality::Standard);
    }

    #[test]
    fn test_parse_falls_back_to_cdn_link() {
        let html = r#"<h3>clip</h3><video src="https://v16-webapp.tiktokcdn.com/abc/video/tos/x.mp4?a=1&amp;b=2"></video>"#;
        let payload = parse_html(html, QualityPreference::Hd).unwrap();
        assert_eq!(payload.quality, VideoQuality::CdnDirect);
        assert_eq!(
            payload.media_url().unwrap().as_str(),
            "https://v16-webapp.tiktokcdn.com/abc/video/tos/x.mp4?a=1&b=2"
        );
    }

    #[test]
    fn test_parse_without_links() {
        assert!(matches!(
            parse_html("<h3>nothing</h3><p>Video not found</p>", QualityPreference::Hd),
            Err(ProviderFailure::EmptyPayload(_))
        ));
    }

    #[test]
    fn test_parse_response_envelope() {
        let body = serde_json::json!({ "status": "ok", "data": HTML }).to_string();
        assert!(parse_response(&body, QualityPreference::Hd).is_ok());

        let body = r#"{"status":"error","mess":"Sorry, video not found"}"#;
        assert!(matches!(
            parse_response(body, QualityPreference::Hd),
            Err(ProviderFailure::Malformed(_))
        ));

        let body = r#"{"status":"ok","data":""}"#;
        assert!(matches!(
            parse_response(body, QualityPreference::Hd),
            Err(ProviderFailure::EmptyPayload(_))
        ));
    }
}
