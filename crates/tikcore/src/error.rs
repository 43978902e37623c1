use thiserror::Error;

use crate::fetch::FetchError;
use crate::resolver::ResolveError;
use crate::validation::ValidationError;

/// Centralized error types for the application
///
/// Library code returns the narrower error types (`ResolveError`, `FetchError`,
/// `ValidationError`); everything converges here at the edges (CLI, bot handlers).
///
/// # Example
///
/// ```no_run
/// use tikcore::error::AppError;
///
/// fn handle_error(err: AppError) {
///     eprintln!("Error: {}", err);
/// }
/// ```
#[derive(Error, Debug)]
pub enum AppError {
    /// Telegram API errors
    #[cfg(feature = "telegram")]
    #[error("Telegram error: {0}")]
    Telegram(#[from] teloxide::RequestError),

    /// Every provider failed, or the URL was rejected up front
    #[error("Resolve error: {0}")]
    Resolve(#[from] ResolveError),

    /// Fetching the resolved media failed
    #[error("Fetch error: {0}")]
    Fetch(#[from] FetchError),

    /// HTTP/Fetch errors
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    /// IO errors
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// URL parsing errors
    #[error("URL parsing error: {0}")]
    Url(#[from] url::ParseError),

    /// Anyhow errors (for general error handling)
    #[error("Application error: {0}")]
    Anyhow(#[from] anyhow::Error),

    /// Validation errors
    #[error("Validation error: {0}")]
    Validation(#[from] ValidationError),
}

/// Type alias for Result with AppError
pub type AppResult<T> = Result<T, AppError>;
