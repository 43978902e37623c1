//! Third-party download providers.
//!
//! Provides the `Provider` trait for pluggable scraping backends. Each provider
//! owns its endpoint, request shape and response schema, and normalizes whatever
//! comes back into a `ProviderPayload` or a `ProviderFailure`. The chain that
//! walks them in order lives in `crate::resolver` and knows nothing about any
//! particular service.
//!
//! Built-in providers, default priority order:
//! - `TikDownloaderIoProvider` - tikdownloader.io, HTML fragment with HD links
//! - `TikWmProvider` - tikwm.com JSON API (`hdplay` / `play`)
//! - `MusicalDownProvider` - musicaldown.com converter API
//! - `ScrapingProvider` - the TikTok page itself (embedded state / play address)

pub mod common;
pub mod error;
pub mod musicaldown;
pub mod scraping;
pub mod tikdownloader_io;
pub mod tikwm;

pub use error::ProviderFailure;
pub use musicaldown::MusicalDownProvider;
pub use scraping::ScrapingProvider;
pub use tikdownloader_io::TikDownloaderIoProvider;
pub use tikwm::TikWmProvider;

use async_trait::async_trait;
use bytes::Bytes;
use std::sync::Arc;
use url::Url;

/// Outcome of calling one provider once.
pub type ProviderResult = Result<ProviderPayload, ProviderFailure>;

/// Which rendition the requester asked for.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, strum::Display, strum::EnumString, strum::AsRefStr)]
#[strum(serialize_all = "snake_case")]
pub enum QualityPreference {
    /// Best available (default)
    #[default]
    Hd,
    /// Smaller file, faster download
    Standard,
}

/// Quality reported by the provider for the link it returned.
#[derive(Debug, Clone, Copy, PartialEq, Eq, strum::Display)]
pub enum VideoQuality {
    #[strum(to_string = "HD")]
    Hd,
    #[strum(to_string = "SD")]
    Sd,
    #[strum(to_string = "Standard")]
    Standard,
    #[strum(to_string = "CDN direct")]
    CdnDirect,
    #[strum(to_string = "Unknown")]
    Unknown,
}

/// A validated download request.
#[derive(Debug, Clone)]
pub struct DownloadRequest {
    /// TikTok URL exactly as the user sent it (after validation)
    pub url: Url,
    /// Requested rendition
    pub quality: QualityPreference,
}

impl DownloadRequest {
    pub fn new(url: Url) -> Self {
        Self {
            url,
            quality: QualityPreference::default(),
        }
    }

    pub fn with_quality(mut self, quality: QualityPreference) -> Self {
        self.quality = quality;
        self
    }
}

/// Where the video actually is.
#[derive(Debug, Clone, PartialEq)]
pub enum Media {
    /// A media URL that still has to be fetched
    Url(Url),
    /// The provider already returned the video body
    Bytes(Bytes),
}

/// Normalized successful provider response.
#[derive(Debug, Clone, PartialEq)]
pub struct ProviderPayload {
    pub media: Media,
    /// Byte size if the provider reported one (or the body length for `Media::Bytes`)
    pub size_estimate: Option<u64>,
    pub title: String,
    pub author: String,
    pub duration_secs: Option<u32>,
    pub quality: VideoQuality,
    pub thumbnail: Option<String>,
}

impl ProviderPayload {
    pub const DEFAULT_TITLE: &'static str = "TikTok Video";
    pub const DEFAULT_AUTHOR: &'static str = "Unknown";

    /// Payload pointing at a media URL with placeholder metadata.
    pub fn from_url(url: Url, quality: VideoQuality) -> Self {
        Self {
            media: Media::Url(url),
            size_estimate: None,
            title: Self::DEFAULT_TITLE.to_string(),
            author: Self::DEFAULT_AUTHOR.to_string(),
            duration_secs: None,
            quality,
            thumbnail: None,
        }
    }

    /// Payload carrying the video body itself.
    pub fn from_bytes(body: Bytes, quality: VideoQuality) -> Self {
        Self {
            size_estimate: Some(body.len() as u64),
            media: Media::Bytes(body),
            title: Self::DEFAULT_TITLE.to_string(),
            author: Self::DEFAULT_AUTHOR.to_string(),
            duration_secs: None,
            quality,
            thumbnail: None,
        }
    }

    pub fn media_url(&self) -> Option<&Url> {
        match &self.media {
            Media::Url(url) => Some(url),
            Media::Bytes(_) => None,
        }
    }
}

/// A third-party service that turns a TikTok URL into a watermark-free video.
///
/// Implementations make exactly one attempt per call; timeouts and ordering are
/// the chain's business.
#[async_trait]
pub trait Provider: Send + Sync {
    /// Stable name used in logs, metrics, `PROVIDER_ORDER` and user messages
    fn name(&self) -> &str;

    /// Issue the provider-specific request and classify the response.
    async fn resolve(&self, request: &DownloadRequest) -> ProviderResult;
}

/// Names of the built-in providers in default priority order (best quality first).
pub const DEFAULT_ORDER: &[&str] = &[
    tikdownloader_io::NAME,
    tikwm::NAME,
    musicaldown::NAME,
    scraping::NAME,
];

/// Build a built-in provider by name, sharing one HTTP client.
pub fn builtin(name: &str, client: &reqwest::Client) -> Option<Arc<dyn Provider>> {
    let provider: Arc<dyn Provider> = match name {
        tikdownloader_io::NAME => Arc::new(TikDownloaderIoProvider::new(client.clone())),
        tikwm::NAME => Arc::new(TikWmProvider::new(client.clone())),
        musicaldown::NAME => Arc::new(MusicalDownProvider::new(client.clone())),
        scraping::NAME => Arc::new(ScrapingProvider::new(client.clone())),
        _ => return None,
    };
    Some(provider)
}
