//! Media fetcher: turns a resolved media link into the video bytes.
//!
//! Bodies are streamed and the download is aborted as soon as it passes the
//! size limit, so an oversized file never sits in memory in full.

use crate::config;
use crate::metrics;
use crate::providers::Media;
use crate::error::AppResult;
use crate::resolver::{ResolvedVideo, ResolverChain};
use bytes::{Bytes, BytesMut};
use futures_util::StreamExt;
use reqwest::Client;
use std::time::Duration;
use thiserror::Error;
use url::Url;

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum FetchError {
    #[error("media server returned HTTP {0}")]
    HttpStatus(u16),

    /// Anything below the floor is an error page, not a video
    #[error("downloaded content too small: {0} bytes")]
    TooSmall(usize),

    #[error("file is larger than {limit} bytes")]
    TooLarge { size: Option<u64>, limit: u64 },

    #[error("media download timed out")]
    Timeout,

    #[error("media download failed: {0}")]
    Network(String),
}

impl FetchError {
    pub fn user_message(&self) -> String {
        match self {
            FetchError::TooLarge { limit, .. } => {
                format!("Video is too large to send (limit {} MB).", limit / (1024 * 1024))
            }
            FetchError::Timeout => "Downloading the video took too long. Please try again later.".to_string(),
            _ => "Failed to download video file. Please try again later.".to_string(),
        }
    }
}

impl From<reqwest::Error> for FetchError {
    fn from(err: reqwest::Error) -> Self {
        if err.is_timeout() {
            FetchError::Timeout
        } else if let Some(status) = err.status() {
            FetchError::HttpStatus(status.as_u16())
        } else {
            FetchError::Network(err.to_string())
        }
    }
}

/// Video body plus the resolution that produced it.
#[derive(Debug, Clone)]
pub struct FetchedVideo {
    pub bytes: Bytes,
    pub video: ResolvedVideo,
}

impl FetchedVideo {
    pub fn size(&self) -> u64 {
        self.bytes.len() as u64
    }
}

pub struct VideoFetcher {
    client: Client,
    min_bytes: usize,
    max_bytes: u64,
    timeout: Duration,
}

impl VideoFetcher {
    pub fn new(client: Client) -> Self {
        Self {
            client,
            min_bytes: config::download::MIN_VIDEO_BYTES,
            max_bytes: config::download::max_file_size_bytes(),
            timeout: config::download::fetch_timeout(),
        }
    }

    pub fn with_max_bytes(mut self, max_bytes: u64) -> Self {
        self.max_bytes = max_bytes;
        self
    }

    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    pub fn max_bytes(&self) -> u64 {
        self.max_bytes
    }

    /// Downloads the media for `video`. `Media::Bytes` passes through untouched.
    pub async fn fetch(&self, video: &ResolvedVideo) -> Result<FetchedVideo, FetchError> {
        let bytes = match &video.payload.media {
            Media::Bytes(bytes) => bytes.clone(),
            Media::Url(url) => self.fetch_url(url).await?,
        };
        metrics::record_file_size(bytes.len() as u64);
        Ok(FetchedVideo {
            bytes,
            video: video.clone(),
        })
    }

    /// Streams `url` into memory, enforcing the size floor and ceiling.
    pub async fn fetch_url(&self, url: &Url) -> Result<Bytes, FetchError> {
        log::info!("📥 Downloading video from {}", truncate(url.as_str(), 100));

        let response = self
            .client
            .get(url.clone())
            .timeout(self.timeout)
            .header("Accept", "*/*")
            .header("Accept-Language", "en-US,en;q=0.9")
            .header("Origin", "https://www.tikwm.com")
            .header("Referer", "https://www.tikwm.com/")
            .header("Sec-Fetch-Dest", "video")
            .header("Sec-Fetch-Mode", "cors")
            .header("Sec-Fetch-Site", "cross-site")
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            log::error!("Video download HTTP error {}", status);
            return Err(FetchError::HttpStatus(status.as_u16()));
        }

        if let Some(length) = response.content_length() {
            if length > self.max_bytes {
                return Err(FetchError::TooLarge {
                    size: Some(length),
                    limit: self.max_bytes,
                });
            }
        }

        let mut body = BytesMut::new();
        let mut stream = response.bytes_stream();
        while let Some(chunk) = stream.next().await {
            let chunk = chunk?;
            if (body.len() + chunk.len()) as u64 > self.max_bytes {
                log::warn!("Video exceeds {} bytes, aborting download", self.max_bytes);
                return Err(FetchError::TooLarge {
                    size: None,
                    limit: self.max_bytes,
                });
            }
            body.extend_from_slice(&chunk);
        }

        if body.len() <= self.min_bytes {
            log::error!("Downloaded content too small: {} bytes", body.len());
            return Err(FetchError::TooSmall(body.len()));
        }

        log::info!("✅ Downloaded video: {} bytes", body.len());
        Ok(body.freeze())
    }
}

/// Resolve then fetch in one step, for callers that only want the bytes.
pub async fn download_video(chain: &ResolverChain, fetcher: &VideoFetcher, url: &str) -> AppResult<FetchedVideo> {
    let video = chain.resolve(url).await?;
    Ok(fetcher.fetch(&video).await?)
}

fn truncate(s: &str, max: usize) -> &str {
    match s.char_indices().nth(max) {
        Some((idx, _)) => &s[..idx],
        None => s,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::providers::{ProviderPayload, VideoQuality};

    #[test]
    fn test_too_large_message_in_megabytes() {
        let err = FetchError::TooLarge {
            size: Some(80 * 1024 * 1024),
            limit: 50 * 1024 * 1024,
        };
        assert_eq!(err.user_message(), "Video is too large to send (limit 50 MB).");
    }

    #[test]
    fn test_truncate() {
        assert_eq!(truncate("abcdef", 3), "abc");
        assert_eq!(truncate("ab", 3), "ab");
    }

    #[tokio::test]
    async fn test_bytes_pass_through_without_network() {
        let fetcher = VideoFetcher::new(Client::new());
        let video = ResolvedVideo {
            source: "inline".into(),
            payload: ProviderPayload::from_bytes(Bytes::from_static(&[7u8; 10]), VideoQuality::Unknown),
        };
        let fetched = fetcher.fetch(&video).await.unwrap();
        assert_eq!(fetched.size(), 10);
        assert_eq!(fetched.video.source, "inline");
    }
}
