//! Ordered multi-provider resolution.
//!
//! `ResolverChain` validates the URL, then asks each provider in turn for the
//! video. The first success wins and the rest are never consulted. Each call is
//! bounded by a timeout; a provider that runs over is recorded as `Timeout` and
//! the chain moves on. When every provider fails, the caller gets an
//! `AggregateFailure` listing one reason per provider, in attempt order.

use crate::config;
use crate::metrics;
use crate::providers::{self, DownloadRequest, Provider, ProviderFailure, ProviderPayload, QualityPreference};
use crate::validation::{validate_download_url, ValidationError};
use itertools::Itertools;
use std::fmt;
use std::sync::Arc;
use std::time::{Duration, Instant};
use thiserror::Error;

/// Successful resolution tagged with the provider that produced it.
#[derive(Debug, Clone, PartialEq)]
pub struct ResolvedVideo {
    pub source: String,
    pub payload: ProviderPayload,
}

/// One failed provider call.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProviderAttempt {
    pub provider: String,
    pub failure: ProviderFailure,
}

/// Per-provider reason length in chat; service error payloads can be arbitrarily long.
const MAX_REASON_CHARS: usize = 200;

fn clip(text: &str, max: usize) -> String {
    match text.char_indices().nth(max) {
        Some((idx, _)) => format!("{}…", &text[..idx]),
        None => text.to_string(),
    }
}

/// Every provider failed. Attempts are in the order they were made.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct AggregateFailure {
    pub attempts: Vec<ProviderAttempt>,
}

impl AggregateFailure {
    /// Single chat message describing the failure.
    pub fn user_message(&self) -> String {
        if self.attempts.is_empty() {
            return "No download services are configured.".to_string();
        }
        let reasons = self
            .attempts
            .iter()
            .map(|a| format!("• {}: {}", a.provider, clip(&a.failure.to_string(), MAX_REASON_CHARS)))
            .join("\n");
        format!(
            "All download methods failed. The video might be private or unavailable.\n\n{}",
            reasons
        )
    }

    pub fn all_timed_out(&self) -> bool {
        !self.attempts.is_empty() && self.attempts.iter().all(|a| matches!(a.failure, ProviderFailure::Timeout(_)))
    }
}

impl fmt::Display for AggregateFailure {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "all {} providers failed: {}",
            self.attempts.len(),
            self.attempts
                .iter()
                .map(|a| format!("{} ({})", a.provider, a.failure))
                .join("; ")
        )
    }
}

impl std::error::Error for AggregateFailure {}

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum ResolveError {
    /// Rejected before any provider was called
    #[error(transparent)]
    InvalidUrl(#[from] ValidationError),

    #[error(transparent)]
    Exhausted(#[from] AggregateFailure),
}

impl ResolveError {
    /// Chat-facing text.
    pub fn user_message(&self) -> String {
        match self {
            ResolveError::InvalidUrl(ValidationError::MissingVideoId(_)) => {
                "Could not extract video ID from URL. Please send a full TikTok video link.".to_string()
            }
            ResolveError::InvalidUrl(_) => "Invalid TikTok URL. Please send a valid TikTok video link.".to_string(),
            ResolveError::Exhausted(aggregate) => aggregate.user_message(),
        }
    }
}

/// Which providers to use, in which order, and how long each may take.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResolverConfig {
    pub order: Vec<String>,
    pub timeout: Duration,
}

impl Default for ResolverConfig {
    fn default() -> Self {
        Self {
            order: providers::DEFAULT_ORDER.iter().map(|s| s.to_string()).collect(),
            timeout: Duration::from_secs(config::providers::DEFAULT_TIMEOUT_SECS),
        }
    }
}

impl ResolverConfig {
    /// Reads `PROVIDER_ORDER` and `PROVIDER_TIMEOUT_SECS`.
    pub fn from_env() -> Self {
        Self {
            order: parse_order(config::providers::ORDER.as_deref()),
            timeout: config::providers::timeout(),
        }
    }
}

/// Parses a comma-separated provider list.
///
/// Unknown names are dropped with a warning, duplicates keep their first
/// position. An empty result (or no list at all) means the default order.
pub fn parse_order(raw: Option<&str>) -> Vec<String> {
    let default = || providers::DEFAULT_ORDER.iter().map(|s| s.to_string()).collect::<Vec<_>>();
    let Some(raw) = raw else {
        return default();
    };

    let order: Vec<String> = raw
        .split(',')
        .map(|name| name.trim().to_ascii_lowercase())
        .filter(|name| !name.is_empty())
        .filter(|name| {
            let known = providers::DEFAULT_ORDER.contains(&name.as_str());
            if !known {
                log::warn!("⚠️ Unknown provider '{}' in PROVIDER_ORDER, ignoring", name);
            }
            known
        })
        .unique()
        .collect();

    if order.is_empty() {
        log::warn!("⚠️ PROVIDER_ORDER has no known providers, using default order");
        return default();
    }
    order
}

/// The ordered provider list plus the per-call timeout.
pub struct ResolverChain {
    providers: Vec<Arc<dyn Provider>>,
    timeout: Duration,
}

impl ResolverChain {
    /// Empty chain; add providers with [`register`](Self::register).
    pub fn new(timeout: Duration) -> Self {
        Self {
            providers: Vec::new(),
            timeout,
        }
    }

    /// Chain of built-in providers in the configured order.
    pub fn from_config(config: &ResolverConfig, client: &reqwest::Client) -> Self {
        let mut chain = Self::new(config.timeout);
        for name in &config.order {
            match providers::builtin(name, client) {
                Some(provider) => chain.register(provider),
                None => log::warn!("⚠️ Unknown provider '{}', skipping", name),
            }
        }
        chain
    }

    /// Appends a provider at the lowest priority.
    pub fn register(&mut self, provider: Arc<dyn Provider>) {
        log::debug!("Registered provider: {}", provider.name());
        self.providers.push(provider);
    }

    pub fn provider_names(&self) -> Vec<&str> {
        self.providers.iter().map(|p| p.name()).collect()
    }

    pub fn timeout(&self) -> Duration {
        self.timeout
    }

    /// Resolves with the default quality.
    pub async fn resolve(&self, url: &str) -> Result<ResolvedVideo, ResolveError> {
        self.resolve_with_quality(url, QualityPreference::default()).await
    }

    /// Validates `url`, then walks the providers until one succeeds.
    pub async fn resolve_with_quality(
        &self,
        url: &str,
        quality: QualityPreference,
    ) -> Result<ResolvedVideo, ResolveError> {
        let url = validate_download_url(url)?;
        let request = DownloadRequest::new(url).with_quality(quality);

        let mut aggregate = AggregateFailure::default();
        for provider in &self.providers {
            let name = provider.name();
            log::info!("🔎 Trying provider {} for {}", name, request.url);
            let started = Instant::now();

            let result = match tokio::time::timeout(self.timeout, provider.resolve(&request)).await {
                Ok(result) => result,
                Err(_) => Err(ProviderFailure::Timeout(format!(
                    "no answer within {}s",
                    self.timeout.as_secs_f32()
                ))),
            };
            let elapsed = started.elapsed().as_secs_f64();

            match result {
                Ok(payload) => {
                    metrics::record_provider_attempt(name, "success", elapsed);
                    log::info!(
                        "✅ Provider {} resolved {} ({} quality, {:.1}s)",
                        name,
                        request.url,
                        payload.quality,
                        elapsed
                    );
                    return Ok(ResolvedVideo {
                        source: name.to_string(),
                        payload,
                    });
                }
                Err(failure) => {
                    metrics::record_provider_attempt(name, failure.subcategory(), elapsed);
                    log::warn!("⚠️ Provider {} failed for {}: {}", name, request.url, failure);
                    aggregate.attempts.push(ProviderAttempt {
                        provider: name.to_string(),
                        failure,
                    });
                }
            }
        }

        log::error!("❌ {}: {}", request.url, aggregate);
        Err(ResolveError::Exhausted(aggregate))
    }
}
