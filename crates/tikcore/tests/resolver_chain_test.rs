//! Integration tests for the resolver chain with in-process providers
//!
//! Run with: cargo test -p tikcore --test resolver_chain_test

use async_trait::async_trait;
use bytes::Bytes;
use pretty_assertions::assert_eq;
use std::sync::atomic::{AtomicU32, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;
use tikcore::providers::{DownloadRequest, Provider, ProviderFailure, ProviderPayload, ProviderResult, VideoQuality};
use tikcore::resolver::{ResolveError, ResolverChain};
use tikcore::validation::ValidationError;

const VIDEO_URL: &str = "https://www.tiktok.com/@bra1nooo/video/7535094535538347282";

#[derive(Clone)]
enum Behavior {
    Succeed(ProviderPayload),
    Fail(ProviderFailure),
    Sleep(Duration, ProviderPayload),
}

struct MockProvider {
    name: &'static str,
    behavior: Behavior,
    calls: Arc<AtomicU32>,
    log: Arc<Mutex<Vec<&'static str>>>,
}

#[async_trait]
impl Provider for MockProvider {
    fn name(&self) -> &str {
        self.name
    }

    async fn resolve(&self, _request: &DownloadRequest) -> ProviderResult {
        self.calls.fetch_add(1, Ordering::SeqCst);
        self.log.lock().unwrap().push(self.name);
        match &self.behavior {
            Behavior::Succeed(payload) => Ok(payload.clone()),
            Behavior::Fail(failure) => Err(failure.clone()),
            Behavior::Sleep(delay, payload) => {
                tokio::time::sleep(*delay).await;
                Ok(payload.clone())
            }
        }
    }
}

struct Harness {
    chain: ResolverChain,
    calls: Vec<Arc<AtomicU32>>,
    log: Arc<Mutex<Vec<&'static str>>>,
}

impl Harness {
    fn new(timeout: Duration, providers: Vec<(&'static str, Behavior)>) -> Self {
        let log = Arc::new(Mutex::new(Vec::new()));
        let mut chain = ResolverChain::new(timeout);
        let mut calls = Vec::new();
        for (name, behavior) in providers {
            let counter = Arc::new(AtomicU32::new(0));
            chain.register(Arc::new(MockProvider {
                name,
                behavior,
                calls: counter.clone(),
                log: log.clone(),
            }));
            calls.push(counter);
        }
        Self { chain, calls, log }
    }

    fn calls(&self) -> Vec<u32> {
        self.calls.iter().map(|c| c.load(Ordering::SeqCst)).collect()
    }

    fn order(&self) -> Vec<&'static str> {
        self.log.lock().unwrap().clone()
    }
}

fn url_payload(link: &str) -> ProviderPayload {
    ProviderPayload::from_url(link.parse().unwrap(), VideoQuality::Hd)
}

#[tokio::test]
async fn test_first_success_short_circuits() {
    let h = Harness::new(
        Duration::from_secs(5),
        vec![
            ("first", Behavior::Succeed(url_payload("https://cdn.test/first.mp4"))),
            ("second", Behavior::Succeed(url_payload("https://cdn.test/second.mp4"))),
            ("third", Behavior::Fail(ProviderFailure::HttpStatus(500))),
        ],
    );

    let resolved = h.chain.resolve(VIDEO_URL).await.unwrap();

    assert_eq!(resolved.source, "first");
    assert_eq!(resolved.payload.media_url().unwrap().as_str(), "https://cdn.test/first.mp4");
    assert_eq!(h.calls(), vec![1, 0, 0]);
}

#[tokio::test]
async fn test_providers_are_tried_in_declared_order() {
    let h = Harness::new(
        Duration::from_secs(5),
        vec![
            ("a", Behavior::Fail(ProviderFailure::Network("connection refused".into()))),
            ("b", Behavior::Fail(ProviderFailure::Service("Url parsing is failed!".into()))),
            ("c", Behavior::Succeed(url_payload("https://cdn.test/c.mp4"))),
            ("d", Behavior::Succeed(url_payload("https://cdn.test/d.mp4"))),
        ],
    );

    let resolved = h.chain.resolve(VIDEO_URL).await.unwrap();

    assert_eq!(resolved.source, "c");
    assert_eq!(h.order(), vec!["a", "b", "c"]);
    assert_eq!(h.calls(), vec![1, 1, 1, 0]);
}

#[tokio::test]
async fn test_all_fail_reports_one_reason_per_provider_in_order() {
    let h = Harness::new(
        Duration::from_secs(5),
        vec![
            ("tikdownloader_io", Behavior::Fail(ProviderFailure::Malformed("no data field in response".into()))),
            ("tikwm", Behavior::Fail(ProviderFailure::HttpStatus(403))),
            ("musicaldown", Behavior::Fail(ProviderFailure::Service("Video is private".into()))),
            ("scraping", Behavior::Fail(ProviderFailure::EmptyPayload("no video address in page".into()))),
        ],
    );

    let err = h.chain.resolve(VIDEO_URL).await.unwrap_err();

    let ResolveError::Exhausted(aggregate) = err else {
        panic!("expected exhausted chain");
    };
    let providers: Vec<&str> = aggregate.attempts.iter().map(|a| a.provider.as_str()).collect();
    assert_eq!(providers, vec!["tikdownloader_io", "tikwm", "musicaldown", "scraping"]);
    assert_eq!(aggregate.attempts[1].failure, ProviderFailure::HttpStatus(403));
    assert_eq!(h.calls(), vec![1, 1, 1, 1]);

    let message = aggregate.user_message();
    assert!(message.contains("tikwm: HTTP 403"));
    assert!(message.contains("musicaldown: service error: Video is private"));
}

#[tokio::test]
async fn test_timeout_is_a_failure_and_chain_continues() {
    let h = Harness::new(
        Duration::from_millis(50),
        vec![
            ("slow", Behavior::Sleep(Duration::from_secs(5), url_payload("https://cdn.test/slow.mp4"))),
            ("fast", Behavior::Fail(ProviderFailure::HttpStatus(502))),
        ],
    );

    let err = h.chain.resolve(VIDEO_URL).await.unwrap_err();

    let ResolveError::Exhausted(aggregate) = err else {
        panic!("expected exhausted chain");
    };
    assert!(matches!(aggregate.attempts[0].failure, ProviderFailure::Timeout(_)));
    assert_eq!(aggregate.attempts[1].failure, ProviderFailure::HttpStatus(502));
    assert!(!aggregate.all_timed_out());
}

#[tokio::test]
async fn test_timeout_then_three_megabyte_payload() {
    let body = Bytes::from(vec![0u8; 3 * 1024 * 1024]);
    let h = Harness::new(
        Duration::from_millis(50),
        vec![
            ("slow", Behavior::Sleep(Duration::from_secs(5), url_payload("https://cdn.test/slow.mp4"))),
            ("inline", Behavior::Succeed(ProviderPayload::from_bytes(body, VideoQuality::Hd))),
        ],
    );

    let resolved = h.chain.resolve(VIDEO_URL).await.unwrap();

    assert_eq!(resolved.source, "inline");
    assert_eq!(resolved.payload.size_estimate, Some(3 * 1024 * 1024));
    assert_eq!(h.calls(), vec![1, 1]);
}

#[tokio::test]
async fn test_non_tiktok_url_rejected_before_any_call() {
    let h = Harness::new(
        Duration::from_secs(5),
        vec![("only", Behavior::Succeed(url_payload("https://cdn.test/x.mp4")))],
    );

    for input in ["https://www.youtube.com/watch?v=abc", "not a url", "https://tiktok.com.evil.org/video/1"] {
        let err = h.chain.resolve(input).await.unwrap_err();
        assert!(matches!(err, ResolveError::InvalidUrl(_)), "{} should be rejected", input);
    }
    let err = h.chain.resolve("https://www.tiktok.com/@user").await.unwrap_err();
    assert_eq!(
        err,
        ResolveError::InvalidUrl(ValidationError::MissingVideoId("https://www.tiktok.com/@user".into()))
    );
    assert_eq!(h.calls(), vec![0]);
}

#[tokio::test]
async fn test_empty_chain_is_exhausted() {
    let chain = ResolverChain::new(Duration::from_secs(1));
    let err = chain.resolve(VIDEO_URL).await.unwrap_err();
    let ResolveError::Exhausted(aggregate) = err else {
        panic!("expected exhausted chain");
    };
    assert!(aggregate.attempts.is_empty());
    assert_eq!(aggregate.user_message(), "No download services are configured.");
}
