//! tikcore: TikTok video resolution without the Telegram layer.
//!
//! - [`resolver::ResolverChain`] walks the [`providers`] in priority order
//! - [`fetch::VideoFetcher`] downloads the media a provider pointed at
//! - [`validation`] accepts and extracts TikTok links
//! - [`stats`] and [`metrics`] count what happened
//!
//! The `telegram` feature adds `From<teloxide::RequestError>` for [`error::AppError`].

pub mod config;
pub mod error;
pub mod fetch;
pub mod logging;
pub mod metrics;
pub mod providers;
pub mod resolver;
pub mod stats;
pub mod validation;

pub use error::{AppError, AppResult};
pub use fetch::{FetchError, FetchedVideo, VideoFetcher};
pub use providers::{DownloadRequest, Media, Provider, ProviderFailure, ProviderPayload, QualityPreference, VideoQuality};
pub use resolver::{AggregateFailure, ProviderAttempt, ResolveError, ResolvedVideo, ResolverChain, ResolverConfig};
pub use stats::{StatsSnapshot, UsageStats};
