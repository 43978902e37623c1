//! tikwm.com JSON API.
//!
//! `POST /api/` with a form body, answers `{code, msg, data}`. `code == 0` means
//! success; `data.hdplay` is the HD rendition, `data.play` the regular one. Both
//! are sometimes relative to the site root.

use super::common::{self, check_status, media_url, non_blank};
use super::{DownloadRequest, Provider, ProviderFailure, ProviderPayload, ProviderResult, QualityPreference, VideoQuality};
use async_trait::async_trait;
use once_cell::sync::Lazy;
use reqwest::Client;
use serde::Deserialize;
use url::Url;

pub const NAME: &str = "tikwm";

static DEFAULT_BASE_URL: Lazy<Url> =
    Lazy::new(|| Url::parse("https://www.tikwm.com").expect("tikwm base URL is valid"));

#[derive(Debug, Deserialize)]
struct TikWmResponse {
    code: Option<i64>,
    #[serde(default)]
    msg: Option<String>,
    data: Option<TikWmData>,
}

#[derive(Debug, Deserialize)]
struct TikWmData {
    hdplay: Option<String>,
    play: Option<String>,
    title: Option<String>,
    author: Option<TikWmAuthor>,
    duration: Option<u32>,
    cover: Option<String>,
    size: Option<u64>,
    hd_size: Option<u64>,
}

#[derive(Debug, Deserialize)]
struct TikWmAuthor {
    nickname: Option<String>,
}

pub struct TikWmProvider {
    client: Client,
    base: Url,
}

impl TikWmProvider {
    pub fn new(client: Client) -> Self {
        Self::with_base_url(client, DEFAULT_BASE_URL.clone())
    }

    pub fn with_base_url(client: Client, base: Url) -> Self {
        Self { client, base }
    }

    fn endpoint(&self) -> Result<Url, ProviderFailure> {
        self.base
            .join("/api/")
            .map_err(|e| ProviderFailure::Network(format!("bad endpoint: {}", e)))
    }
}

/// Classifies a tikwm response body.
pub fn parse_response(body: &str, base: &Url, preference: QualityPreference) -> ProviderResult {
    let response: TikWmResponse = common::parse_json(body)?;

    if response.code != Some(0) {
        let msg = non_blank(response.msg).unwrap_or_else(|| format!("code {:?}", response.code));
        return Err(ProviderFailure::Service(msg));
    }

    let data = response
        .data
        .ok_or_else(|| ProviderFailure::EmptyPayload("no data in response".to_string()))?;

    let hd = non_blank(data.hdplay).map(|link| (link, VideoQuality::Hd, data.hd_size));
    let sd = non_blank(data.play).map(|link| (link, VideoQuality::Sd, data.size));
    let picked = match preference {
        QualityPreference::Hd => hd.or(sd),
        QualityPreference::Standard => sd.or(hd),
    };
    let (link, quality, size) =
        picked.ok_or_else(|| ProviderFailure::EmptyPayload("no video URL in response".to_string()))?;

    let mut payload = ProviderPayload::from_url(media_url(&link, Some(base))?, quality);
    payload.size_estimate = size.filter(|s| *s > 0);
    if let Some(title) = non_blank(data.title) {
        payload.title = title;
    }
    if let Some(author) = non_blank(data.author.and_then(|a| a.nickname)) {
        payload.author = author;
    }
    payload.duration_secs = data.duration.filter(|d| *d > 0);
    payload.thumbnail = non_blank(data.cover);

    Ok(payload)
}

#[async_trait]
impl Provider for TikWmProvider {
    fn name(&self) -> &str {
        NAME
    }

    async fn resolve(&self, request: &DownloadRequest) -> ProviderResult {
        let endpoint = self.endpoint()?;
        let origin = self.base.as_str().trim_end_matches('/').to_string();
        log::debug!("TikWM: requesting video info for {}", request.url);

        let response = self
            .client
            .post(endpoint)
            .header("Accept", "application/json, text/plain, */*")
            .header("Accept-Language", "en-US,en;q=0.9")
            .header("Origin", origin.as_str())
            .header("Referer", format!("{}/", origin))
            .form(&[
                ("url", request.url.as_str()),
                ("count", "12"),
                ("cursor", "0"),
                ("web", "1"),
                ("hd", "1"),
            ])
            .send()
            .await?;

        let body = common::read_text(check_status(response)?).await?;
        parse_response(&body, &self.base, request.quality)
    }
}
