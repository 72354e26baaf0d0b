//! Configuration options for the ReelPost client

use reelpost_auth::AuthOptions;
use std::path::PathBuf;
use std::time::Duration;

use crate::error::Error;

/// API root used when nothing is configured
pub const DEFAULT_API_URL: &str = "http://localhost:3000/api";

pub const ENV_API_URL: &str = "REELPOST_API_URL";
pub const ENV_SESSION_DIR: &str = "REELPOST_SESSION_DIR";
pub const ENV_REQUEST_TIMEOUT_SECS: &str = "REELPOST_REQUEST_TIMEOUT_SECS";
pub const ENV_AUTO_REFRESH: &str = "REELPOST_AUTO_REFRESH";

/// Configuration options for the ReelPost client
#[derive(Debug, Clone)]
pub struct ClientOptions {
    /// Whether to renew the access token before it expires
    pub auto_refresh_token: bool,

    /// Whether to write the session to disk
    pub persist_session: bool,

    /// Directory holding the persisted session; in-memory when unset
    pub session_dir: Option<PathBuf>,

    /// The request timeout
    pub request_timeout: Option<Duration>,

    /// How often the proactive refresh check runs
    pub refresh_interval: Duration,

    /// Remaining token lifetime below which a refresh is due
    pub refresh_threshold: Duration,

    /// How long a request waits on another caller's token refresh
    pub refresh_wait_timeout: Duration,
}

impl Default for ClientOptions {
    fn default() -> Self {
        let auth = AuthOptions::default();
        Self {
            auto_refresh_token: true,
            persist_session: true,
            session_dir: None,
            request_timeout: auth.request_timeout,
            refresh_interval: auth.refresh_interval,
            refresh_threshold: auth.refresh_threshold,
            refresh_wait_timeout: auth.refresh_wait_timeout,
        }
    }
}

impl ClientOptions {
    /// Defaults overridden by `REELPOST_*` environment variables
    ///
    /// A `.env` file in the working directory is honored.
    pub fn from_env() -> Result<Self, Error> {
        dotenv::dotenv().ok();
        let mut options = Self::default();

        if let Ok(dir) = std::env::var(ENV_SESSION_DIR) {
            if !dir.trim().is_empty() {
                options.session_dir = Some(PathBuf::from(dir));
            }
        }

        if let Ok(secs) = std::env::var(ENV_REQUEST_TIMEOUT_SECS) {
            let secs: u64 = secs.trim().parse().map_err(|_| {
                Error::config(format!(
                    "{} must be a number of seconds",
                    ENV_REQUEST_TIMEOUT_SECS
                ))
            })?;
            options.request_timeout = if secs == 0 {
                None
            } else {
                Some(Duration::from_secs(secs))
            };
        }

        if let Ok(flag) = std::env::var(ENV_AUTO_REFRESH) {
            options.auto_refresh_token = parse_flag(&flag).ok_or_else(|| {
                Error::config(format!("{} must be true or false", ENV_AUTO_REFRESH))
            })?;
        }

        Ok(options)
    }

    /// Set whether to automatically refresh the token
    pub fn with_auto_refresh_token(mut self, value: bool) -> Self {
        self.auto_refresh_token = value;
        self
    }

    /// Set whether to persist the session
    pub fn with_persist_session(mut self, value: bool) -> Self {
        self.persist_session = value;
        self
    }

    /// Set the directory the session is persisted in
    pub fn with_session_dir(mut self, dir: impl Into<PathBuf>) -> Self {
        self.session_dir = Some(dir.into());
        self
    }

    /// Set the request timeout
    pub fn with_request_timeout(mut self, value: Option<Duration>) -> Self {
        self.request_timeout = value;
        self
    }

    pub fn with_refresh_interval(mut self, value: Duration) -> Self {
        self.refresh_interval = value;
        self
    }

    pub fn with_refresh_threshold(mut self, value: Duration) -> Self {
        self.refresh_threshold = value;
        self
    }

    pub fn with_refresh_wait_timeout(mut self, value: Duration) -> Self {
        self.refresh_wait_timeout = value;
        self
    }

    pub(crate) fn auth_options(&self) -> AuthOptions {
        AuthOptions {
            persist_session: self.persist_session,
            request_timeout: self.request_timeout,
            refresh_interval: self.refresh_interval,
            refresh_threshold: self.refresh_threshold,
            refresh_wait_timeout: self.refresh_wait_timeout,
        }
    }
}

/// API root from `REELPOST_API_URL`, or [`DEFAULT_API_URL`]
pub fn api_url_from_env() -> String {
    dotenv::dotenv().ok();
    std::env::var(ENV_API_URL)
        .ok()
        .filter(|url| !url.trim().is_empty())
        .unwrap_or_else(|| DEFAULT_API_URL.to_string())
}

fn parse_flag(value: &str) -> Option<bool> {
    match value.trim().to_ascii_lowercase().as_str() {
        "1" | "true" | "yes" | "on" => Some(true),
        "0" | "false" | "no" | "off" => Some(false),
        _ => None,
    }
}
