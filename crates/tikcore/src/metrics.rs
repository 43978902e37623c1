//! Prometheus metrics
//!
//! Registered in the process-global registry and exposed by the health server
//! at `/metrics`:
//! - provider attempts and latency per provider
//! - download outcomes and delivered file sizes
//! - command usage

use once_cell::sync::Lazy;
use prometheus::{
    register_counter_vec, register_histogram, register_histogram_vec, CounterVec, Encoder, Histogram, HistogramVec,
    TextEncoder,
};

/// Provider calls by outcome
/// Labels: provider, outcome (success or a failure subcategory)
pub static PROVIDER_ATTEMPTS_TOTAL: Lazy<CounterVec> = Lazy::new(|| {
    register_counter_vec!(
        "tiktok_bot_provider_attempts_total",
        "Provider calls by provider and outcome",
        &["provider", "outcome"]
    )
    .expect("provider attempts metric registers once")
});

/// Time spent inside a single provider call
/// Labels: provider
pub static PROVIDER_DURATION_SECONDS: Lazy<HistogramVec> = Lazy::new(|| {
    register_histogram_vec!(
        "tiktok_bot_provider_duration_seconds",
        "Time spent in a single provider call",
        &["provider"],
        vec![0.25, 0.5, 1.0, 2.5, 5.0, 10.0, 20.0, 30.0]
    )
    .expect("provider duration metric registers once")
});

/// Finished download requests
/// Labels: outcome (success/link_only/failed/invalid_url/fetch_failed)
pub static DOWNLOADS_TOTAL: Lazy<CounterVec> = Lazy::new(|| {
    register_counter_vec!(
        "tiktok_bot_downloads_total",
        "Download requests by outcome",
        &["outcome"]
    )
    .expect("downloads metric registers once")
});

/// Size of videos actually fetched
pub static FILE_SIZE_BYTES: Lazy<Histogram> = Lazy::new(|| {
    register_histogram!(
        "tiktok_bot_file_size_bytes",
        "Size of fetched videos in bytes",
        vec![
            500_000.0,
            1_000_000.0,
            5_000_000.0,
            10_000_000.0,
            25_000_000.0,
            50_000_000.0,
            100_000_000.0
        ]
    )
    .expect("file size metric registers once")
});

/// Bot commands and menu actions
/// Labels: command
pub static COMMAND_USAGE_TOTAL: Lazy<CounterVec> = Lazy::new(|| {
    register_counter_vec!("tiktok_bot_command_usage_total", "Bot command usage", &["command"])
        .expect("command usage metric registers once")
});

/// Download outcomes, also used as label values
pub mod outcome {
    pub const SUCCESS: &str = "success";
    pub const LINK_ONLY: &str = "link_only";
    pub const FAILED: &str = "failed";
    pub const INVALID_URL: &str = "invalid_url";
    pub const FETCH_FAILED: &str = "fetch_failed";
}

/// Touches every metric so it shows up in `/metrics` before the first event.
pub fn init_metrics() {
    log::info!("Initializing metrics registry...");

    Lazy::force(&PROVIDER_ATTEMPTS_TOTAL);
    Lazy::force(&PROVIDER_DURATION_SECONDS);
    Lazy::force(&FILE_SIZE_BYTES);
    Lazy::force(&COMMAND_USAGE_TOTAL);

    for outcome in [
        outcome::SUCCESS,
        outcome::LINK_ONLY,
        outcome::FAILED,
        outcome::INVALID_URL,
        outcome::FETCH_FAILED,
    ] {
        DOWNLOADS_TOTAL.with_label_values(&[outcome]);
    }
}

/// Renders the global registry in the Prometheus text format.
pub fn gather_text() -> Result<String, prometheus::Error> {
    let encoder = TextEncoder::new();
    let mut buffer = Vec::new();
    encoder.encode(&prometheus::gather(), &mut buffer)?;
    String::from_utf8(buffer).map_err(|e| prometheus::Error::Msg(e.to_string()))
}

pub fn record_provider_attempt(provider: &str, outcome: &str, elapsed_secs: f64) {
    PROVIDER_ATTEMPTS_TOTAL.with_label_values(&[provider, outcome]).inc();
    PROVIDER_DURATION_SECONDS.with_label_values(&[provider]).observe(elapsed_secs);
}

pub fn record_download(outcome: &str) {
    DOWNLOADS_TOTAL.with_label_values(&[outcome]).inc();
}

pub fn record_file_size(size_bytes: u64) {
    FILE_SIZE_BYTES.observe(size_bytes as f64);
}

pub fn record_command(command: &str) {
    COMMAND_USAGE_TOTAL.with_label_values(&[command]).inc();
}
