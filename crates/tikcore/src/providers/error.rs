use std::fmt;

/// Why a single provider attempt did not yield a usable video.
///
/// Every variant carries a short detail message. None of these are fatal: the
/// chain records the failure and moves on to the next provider.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ProviderFailure {
    /// Transport failure (DNS, connect, TLS, reset, body read)
    Network(String),
    /// The call exceeded the per-provider timeout
    Timeout(String),
    /// Non-success HTTP status
    HttpStatus(u16),
    /// 200 with nothing usable in it (empty body, no media link)
    EmptyPayload(String),
    /// Body that doesn't match the expected schema
    Malformed(String),
    /// The service answered with its own error payload
    Service(String),
}

impl fmt::Display for ProviderFailure {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ProviderFailure::Network(msg) => write!(f, "network error: {}", msg),
            ProviderFailure::Timeout(msg) => write!(f, "timed out: {}", msg),
            ProviderFailure::HttpStatus(code) => write!(f, "HTTP {}", code),
            ProviderFailure::EmptyPayload(msg) => write!(f, "empty response: {}", msg),
            ProviderFailure::Malformed(msg) => write!(f, "malformed response: {}", msg),
            ProviderFailure::Service(msg) => write!(f, "service error: {}", msg),
        }
    }
}

impl std::error::Error for ProviderFailure {}

impl ProviderFailure {
    /// Returns subcategory for metrics
    pub fn subcategory(&self) -> &'static str {
        match self {
            ProviderFailure::Network(_) => "network",
            ProviderFailure::Timeout(_) => "timeout",
            ProviderFailure::HttpStatus(_) => "http_status",
            ProviderFailure::EmptyPayload(_) => "empty",
            ProviderFailure::Malformed(_) => "malformed",
            ProviderFailure::Service(_) => "service",
        }
    }
}

impl From<reqwest::Error> for ProviderFailure {
    fn from(err: reqwest::Error) -> Self {
        if err.is_timeout() {
            ProviderFailure::Timeout(err.to_string())
        } else if let Some(status) = err.status() {
            ProviderFailure::HttpStatus(status.as_u16())
        } else if err.is_decode() {
            ProviderFailure::Malformed(err.to_string())
        } else {
            ProviderFailure::Network(err.to_string())
        }
    }
}

impl From<serde_json::Error> for ProviderFailure {
    fn from(err: serde_json::Error) -> Self {
        ProviderFailure::Malformed(err.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_display() {
        assert_eq!(ProviderFailure::HttpStatus(503).to_string(), "HTTP 503");
        assert_eq!(
            ProviderFailure::Service("Url parsing is failed!".into()).to_string(),
            "service error: Url parsing is failed!"
        );
    }

    #[test]
    fn test_subcategory() {
        assert_eq!(ProviderFailure::Network("".into()).subcategory(), "network");
        assert_eq!(ProviderFailure::Timeout("".into()).subcategory(), "timeout");
        assert_eq!(ProviderFailure::HttpStatus(404).subcategory(), "http_status");
        assert_eq!(ProviderFailure::EmptyPayload("".into()).subcategory(), "empty");
        assert_eq!(ProviderFailure::Malformed("".into()).subcategory(), "malformed");
        assert_eq!(ProviderFailure::Service("".into()).subcategory(), "service");
    }

    #[test]
    fn test_from_json_error() {
        let err = serde_json::from_str::<serde_json::Value>("{not json").unwrap_err();
        assert!(matches!(ProviderFailure::from(err), ProviderFailure::Malformed(_)));
    }
}
