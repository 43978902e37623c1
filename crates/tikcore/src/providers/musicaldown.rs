//! musicaldown.com converter API.

use super::common::{self, check_status, media_url, non_blank};
use super::{DownloadRequest, Provider, ProviderFailure, ProviderPayload, ProviderResult, VideoQuality};
use async_trait::async_trait;
use once_cell::sync::Lazy;
use reqwest::Client;
use serde::Deserialize;
use url::Url;

pub const NAME: &str = "musicaldown";

static DEFAULT_BASE_URL: Lazy<Url> =
    Lazy::new(|| Url::parse("https://musicaldown.com").expect("musicaldown base URL is valid"));

#[derive(Debug, Deserialize)]
struct ConverterResponse {
    #[serde(default)]
    success: bool,
    message: Option<String>,
    data: Option<ConverterData>,
}

#[derive(Debug, Deserialize)]
struct ConverterData {
    url: Option<String>,
    title: Option<String>,
    author: Option<String>,
    thumbnail: Option<String>,
}

pub struct MusicalDownProvider {
    client: Client,
    base: Url,
}

impl MusicalDownProvider {
    pub fn new(client: Client) -> Self {
        Self::with_base_url(client, DEFAULT_BASE_URL.clone())
    }

    pub fn with_base_url(client: Client, base: Url) -> Self {
        Self { client, base }
    }
}

pub fn parse_response(body: &str, base: &Url) -> ProviderResult {
    let response: ConverterResponse = common::parse_json(body)?;
    if !response.success {
        let msg = non_blank(response.message).unwrap_or_else(|| "success=false".to_string());
        return Err(ProviderFailure::Service(msg));
    }

    let data = response
        .data
        .ok_or_else(|| ProviderFailure::EmptyPayload("no data in response".to_string()))?;
    let link = non_blank(data.url).ok_or_else(|| ProviderFailure::EmptyPayload("no video URL in response".to_string()))?;

    // The converter always asks for hd, it never reports what it got.
    let mut payload = ProviderPayload::from_url(media_url(&link, Some(base))?, VideoQuality::Hd);
    if let Some(title) = non_blank(data.title) {
        payload.title = title;
    }
    if let Some(author) = non_blank(data.author) {
        payload.author = author;
    }
    payload.thumbnail = non_blank(data.thumbnail);
    Ok(payload)
}

#[async_trait]
impl Provider for MusicalDownProvider {
    fn name(&self) -> &str {
        NAME
    }

    async fn resolve(&self, request: &DownloadRequest) -> ProviderResult {
        let endpoint = self
            .base
            .join("/api/converter/index")
            .map_err(|e| ProviderFailure::Network(format!("bad endpoint: {}", e)))?;
        log::debug!("MusicalDown: requesting video info for {}", request.url);

        let response = self
            .client
            .post(endpoint)
            .form(&[("url", request.url.as_str()), ("format", ""), ("quality", "hd")])
            .send()
            .await?;

        let body = common::read_text(check_status(response)?).await?;
        parse_response(&body, &self.base)
    }
}
