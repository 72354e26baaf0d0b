//! Authenticated API access layer for the ReelPost client
//!
//! This crate owns the authentication session (user, access token, refresh
//! token), persists it across restarts, attaches bearer credentials to
//! outgoing requests, recovers from a single `401` by refreshing and retrying,
//! and can proactively renew the access token before it expires.

mod fetch;
mod manager;
mod scheduler;
mod session;
mod store;
mod token;

use std::time::Duration;
use thiserror::Error;

pub use fetch::{FetchRequest, FormPart};
pub use manager::{AuthManager, AuthResponse, LoginCredentials, RegisterCredentials};
pub use scheduler::{proactive_refresh, ProactiveRefresh, RefreshScheduler};
pub use session::{AuthSession, User};
pub use store::{FileSessionStore, MemorySessionStore, SessionStore, SESSION_STORAGE_KEY};
pub use token::{decode_expiry, time_until_expiry};

/// Error type for the access layer
#[derive(Error, Debug)]
pub enum AuthError {
    #[error("Network error: {0}")]
    NetworkError(#[from] reqwest::Error),

    #[error("JSON serialization error: {0}")]
    SerializationError(#[from] serde_json::Error),

    #[error("API error ({status}): {message}")]
    ApiError { status: u16, message: String },

    #[error("No refresh token available")]
    NoRefreshToken,

    /// The server rejected the refresh token; the local session has been cleared.
    #[error("Session expired")]
    SessionExpired,

    /// Another caller's refresh failed for a non-authoritative reason.
    #[error("Token refresh failed: {0}")]
    RefreshFailed(String),

    #[error("Timed out after {0:?} waiting for an in-flight token refresh")]
    RefreshTimeout(Duration),

    #[error("Invalid token: {0}")]
    InvalidToken(String),

    #[error("URL parse error: {0}")]
    UrlParseError(#[from] url::ParseError),

    #[error("Session storage error: {0}")]
    StorageError(#[from] std::io::Error),
}

impl AuthError {
    /// Whether the caller should treat this as "log in again".
    pub fn is_session_expired(&self) -> bool {
        matches!(self, AuthError::SessionExpired)
    }
}

/// Options for the access layer
#[derive(Debug, Clone)]
pub struct AuthOptions {
    /// Persist the session through the configured store after every transition
    pub persist_session: bool,
    /// Per-request timeout applied when a request does not set its own
    pub request_timeout: Option<Duration>,
    /// Period of the proactive refresh scheduler
    pub refresh_interval: Duration,
    /// Refresh proactively once less than this much lifetime remains
    pub refresh_threshold: Duration,
    /// Upper bound a caller waits on somebody else's in-flight refresh
    pub refresh_wait_timeout: Duration,
}

impl Default for AuthOptions {
    fn default() -> Self {
        Self {
            persist_session: true,
            request_timeout: Some(Duration::from_secs(30)),
            refresh_interval: Duration::from_secs(5 * 60),
            refresh_threshold: Duration::from_secs(5 * 60),
            refresh_wait_timeout: Duration::from_secs(10),
        }
    }
}
