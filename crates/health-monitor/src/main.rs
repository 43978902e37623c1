//! Keep-alive monitor for tikbot.
//!
//! Free-tier hosts put a web service to sleep after a period without inbound
//! traffic. This binary GETs the bot's `/health` endpoint on an interval so it
//! stays awake. A failed ping is logged and the loop carries on.

use clap::Parser;
use reqwest::{Client, StatusCode};
use std::time::Duration;

const USER_AGENT: &str = "KeepAlive/1.0";
const PING_TIMEOUT: Duration = Duration::from_secs(30);

#[derive(Parser, Debug)]
#[command(name = "health-monitor", version, about = "Pings the bot's /health endpoint to keep it awake")]
struct Args {
    /// Public base URL of the bot service
    #[arg(long, env = "RENDER_EXTERNAL_URL")]
    url: Option<String>,

    /// Minutes between pings
    #[arg(long, env = "KEEPALIVE_INTERVAL_MINUTES", default_value_t = 10)]
    interval_minutes: u64,

    /// Ping once and exit with an error if the service is not healthy
    #[arg(long)]
    once: bool,
}

fn health_url(base: &str) -> String {
    format!("{}/health", base.trim_end_matches('/'))
}

/// At least one minute; saturates on absurd values.
fn interval_from_minutes(minutes: u64) -> Duration {
    Duration::from_secs(minutes.max(1).saturating_mul(60))
}

/// One GET against `<base>/health`.
async fn ping_once(client: &Client, base: &str) -> Result<StatusCode, reqwest::Error> {
    let response = client
        .get(health_url(base))
        .header(reqwest::header::USER_AGENT, USER_AGENT)
        .timeout(PING_TIMEOUT)
        .send()
        .await?;
    let status = response.status();

    if status == StatusCode::OK {
        // Body is informational only
        if let Ok(body) = response.json::<serde_json::Value>().await {
            log::debug!(
                "Service status: {}, uptime: {}",
                body["status"].as_str().unwrap_or("?"),
                body["uptime"].as_str().unwrap_or("?")
            );
        }
    }
    Ok(status)
}

/// Logs the outcome of a ping; returns whether the service answered 200.
fn report(result: &Result<StatusCode, reqwest::Error>) -> bool {
    match result {
        Ok(StatusCode::OK) => {
            log::info!("✅ Keep-alive ping successful");
            true
        }
        Ok(status) => {
            log::warn!("⚠️ Keep-alive ping returned status {}", status.as_u16());
            false
        }
        Err(e) => {
            log::error!("❌ Keep-alive ping failed: {}", e);
            false
        }
    }
}

/// Sleeps, pings, repeats. Never returns.
async fn keep_alive_loop(client: Client, base: String, interval: Duration) {
    log::info!(
        "🏓 Keep-alive started for {} (every {} min)",
        base,
        interval.as_secs() / 60
    );
    loop {
        tokio::time::sleep(interval).await;
        report(&ping_once(&client, &base).await);
    }
}

#[tokio::main(flavor = "current_thread")]
async fn main() -> anyhow::Result<()> {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();
    let args = Args::parse();

    let Some(base) = args.url.filter(|u| !u.trim().is_empty()) else {
        log::info!("RENDER_EXTERNAL_URL not set, keep-alive disabled");
        return Ok(());
    };

    let client = Client::builder().build()?;

    if args.once {
        if report(&ping_once(&client, &base).await) {
            return Ok(());
        }
        anyhow::bail!("{} is not healthy", health_url(&base));
    }

    let interval = interval_from_minutes(args.interval_minutes);
    keep_alive_loop(client, base, interval).await;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use wiremock::matchers::{header, method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    #[test]
    fn test_health_url() {
        assert_eq!(health_url("https://bot.onrender.com"), "https://bot.onrender.com/health");
        assert_eq!(health_url("https://bot.onrender.com/"), "https://bot.onrender.com/health");
    }

    #[test]
    fn test_interval_from_minutes() {
        assert_eq!(interval_from_minutes(10), Duration::from_secs(600));
        assert_eq!(interval_from_minutes(0), Duration::from_secs(60));
        assert_eq!(interval_from_minutes(u64::MAX), Duration::from_secs(u64::MAX));
    }

    #[test]
    fn test_args_defaults() {
        let args = Args::try_parse_from(["health-monitor", "--url", "https://x.test"]).unwrap();
        assert_eq!(args.url.as_deref(), Some("https://x.test"));
        assert!(!args.once);
    }

    #[tokio::test]
    async fn test_ping_sends_keepalive_agent() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/health"))
            .and(header("user-agent", USER_AGENT))
            .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
                "status": "healthy",
                "uptime": "1m 5s"
            })))
            .expect(1)
            .mount(&server)
            .await;

        let status = ping_once(&Client::new(), &server.uri()).await.unwrap();
        assert_eq!(status, StatusCode::OK);
        assert!(report(&Ok(status)));
    }

    #[tokio::test]
    async fn test_ping_non_200_is_reported_not_fatal() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/health"))
            .respond_with(ResponseTemplate::new(503))
            .mount(&server)
            .await;

        let result = ping_once(&Client::new(), &server.uri()).await;
        assert_eq!(result.as_ref().unwrap(), &StatusCode::SERVICE_UNAVAILABLE);
        assert!(!report(&result));
    }

    #[tokio::test]
    async fn test_ping_connection_error() {
        // Nothing listens on port 9 locally
        let result = ping_once(&Client::new(), "http://127.0.0.1:9").await;
        assert!(result.is_err());
        assert!(!report(&result));
    }
}
