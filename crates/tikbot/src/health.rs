//! Liveness HTTP server
//!
//! Exposes health, readiness, and Prometheus metrics so hosting platforms and
//! the keep-alive monitor can tell the bot is up. In polling mode it runs on
//! its own port (HEALTH_PORT, default 8080); in webhook mode the routes are
//! merged into the webhook app on PORT.

use axum::{
    extract::State,
    http::{header, StatusCode},
    response::{IntoResponse, Response},
    routing::get,
    Json, Router,
};
use std::net::SocketAddr;
use std::sync::Arc;
use std::time::{Duration, Instant};
use tikcore::config;
use tikcore::stats::{format_duration, UsageStats};
use tokio::net::TcpListener;

const SERVICE_NAME: &str = "TikTok Downloader Bot";

/// Shared state for the health routes
#[derive(Clone)]
pub struct HealthState {
    stats: Arc<UsageStats>,
    start_time: Instant,
    ready_after: Duration,
}

impl HealthState {
    pub fn new(stats: Arc<UsageStats>) -> Self {
        Self {
            stats,
            start_time: Instant::now(),
            ready_after: Duration::from_secs(config::health::READY_AFTER_SECS),
        }
    }

    /// Overrides the warm-up period reported by `/ready`.
    pub fn with_ready_after(mut self, ready_after: Duration) -> Self {
        self.ready_after = ready_after;
        self
    }
}

/// Builds the router; split out of [`start_health_server`] for tests.
pub fn router(state: HealthState) -> Router {
    Router::new()
        .route("/health", get(health_handler))
        .route("/ready", get(ready_handler))
        .route("/metrics", get(metrics_handler))
        .route("/", get(root_handler))
        .with_state(Arc::new(state))
}

/// Adds the health routes to another app so both are served from one port.
///
/// Webhook mode uses this: hosting platforms expose a single public port, and
/// the keep-alive monitor pings `/health` on it.
pub fn merge_into(app: Router, stats: Arc<UsageStats>) -> Router {
    app.merge(router(HealthState::new(stats)))
}

/// Start the health HTTP server
///
/// # Arguments
/// * `port` - Port to listen on (HEALTH_PORT)
/// * `stats` - Counters reported by `/health`
pub async fn start_health_server(port: u16, stats: Arc<UsageStats>) -> anyhow::Result<()> {
    let addr = SocketAddr::from(([0, 0, 0, 0], port));
    let app = router(HealthState::new(stats));

    log::info!("🏥 Starting health server on http://{}", addr);
    log::info!("  /health  - Health check (liveness)");
    log::info!("  /ready   - Readiness check");
    log::info!("  /metrics - Prometheus metrics");

    let listener = TcpListener::bind(&addr).await?;
    axum::serve(listener, app).await?;
    Ok(())
}

async fn health_handler(State(state): State<Arc<HealthState>>) -> impl IntoResponse {
    let uptime = state.start_time.elapsed();
    let snapshot = state.stats.snapshot();

    let body = serde_json::json!({
        "status": "healthy",
        "uptime": format_duration(uptime),
        "uptime_seconds": uptime.as_secs(),
        "timestamp": chrono::Utc::now().to_rfc3339(),
        "bot": SERVICE_NAME,
        "version": env!("CARGO_PKG_VERSION"),
        "downloads": {
            "total": snapshot.total,
            "successful": snapshot.successful,
            "failed": snapshot.failed,
        },
    });

    (StatusCode::OK, Json(body))
}

async fn ready_handler(State(state): State<Arc<HealthState>>) -> impl IntoResponse {
    let uptime = state.start_time.elapsed();

    if uptime < state.ready_after {
        let status = serde_json::json!({
            "status": "starting",
            "uptime_seconds": uptime.as_secs(),
            "message": "Service is still initializing"
        });
        return (StatusCode::SERVICE_UNAVAILABLE, Json(status));
    }

    let status = serde_json::json!({
        "status": "ready",
        "uptime_seconds": uptime.as_secs(),
    });
    (StatusCode::OK, Json(status))
}

async fn metrics_handler() -> Response {
    match tikcore::metrics::gather_text() {
        Ok(text) => (
            StatusCode::OK,
            [(header::CONTENT_TYPE, "text/plain; version=0.0.4")],
            text,
        )
            .into_response(),
        Err(e) => {
            log::error!("Failed to encode metrics: {}", e);
            (StatusCode::INTERNAL_SERVER_ERROR, format!("Failed to encode metrics: {}", e)).into_response()
        }
    }
}

async fn root_handler(State(state): State<Arc<HealthState>>) -> impl IntoResponse {
    let info = serde_json::json!({
        "name": SERVICE_NAME,
        "version": env!("CARGO_PKG_VERSION"),
        "description": "Download TikTok videos without watermark via Telegram",
        "status": "running",
        "uptime": format_duration(state.start_time.elapsed()),
        "endpoints": {
            "/health": "Health check (JSON)",
            "/ready": "Readiness check (JSON)",
            "/metrics": "Prometheus metrics (text format)",
            "/": "This information page"
        }
    });
    (StatusCode::OK, Json(info))
}
