//! ReelPost Rust Client Library
//!
//! A client for the ReelPost API: schedule and publish short-form videos to
//! connected TikTok accounts, manage uploads, brand patterns and AI voices.
//! Every call goes through the authenticated access layer in
//! [`reelpost_auth`], which attaches the access token, refreshes it on `401`
//! and can renew it in the background before it expires.

pub mod config;
pub mod connections;
pub mod error;
mod fetch;
pub mod patterns;
pub mod publish;
pub mod tiktok;
pub mod videos;
pub mod voices;

use log::info;
use reqwest::Client;
use std::sync::Arc;

pub use reelpost_auth as auth;

use crate::auth::{
    AuthManager, FileSessionStore, MemorySessionStore, RefreshScheduler, SessionStore,
};
use crate::config::ClientOptions;
use crate::connections::ConnectionsClient;
use crate::error::Error;
use crate::patterns::PatternsClient;
use crate::publish::PublishClient;
use crate::tiktok::TikTokClient;
use crate::videos::VideosClient;
use crate::voices::VoicesClient;

/// The main entry point for the ReelPost client
pub struct ReelPost {
    /// The API root, e.g. `https://api.example.com/api`
    pub url: String,
    /// HTTP client used for requests
    pub http_client: Client,
    /// Client options
    pub options: ClientOptions,
    auth: Arc<AuthManager>,
}

impl ReelPost {
    /// Create a new client with default options
    ///
    /// # Example
    ///
    /// ```
    /// use reelpost::ReelPost;
    ///
    /// let client = ReelPost::new("https://api.example.com/api");
    /// ```
    pub fn new(api_url: &str) -> Self {
        Self::new_with_options(api_url, ClientOptions::default())
    }

    /// Create a new client with custom options
    ///
    /// The session starts logged out; call [`ReelPost::restore_session`] to
    /// pick up a persisted one.
    ///
    /// # Example
    ///
    /// ```
    /// use reelpost::{ReelPost, config::ClientOptions};
    ///
    /// let options = ClientOptions::default()
    ///     .with_session_dir("/tmp/reelpost")
    ///     .with_auto_refresh_token(true);
    /// let client = ReelPost::new_with_options("https://api.example.com/api", options);
    /// ```
    pub fn new_with_options(api_url: &str, options: ClientOptions) -> Self {
        let http_client = Client::new();

        let store: Arc<dyn SessionStore> = match (&options.session_dir, options.persist_session) {
            (Some(dir), true) => Arc::new(FileSessionStore::new(dir)),
            _ => Arc::new(MemorySessionStore::new()),
        };
        let auth = AuthManager::with_store(
            api_url,
            http_client.clone(),
            options.auth_options(),
            store,
        );

        Self {
            url: auth.base_url().to_string(),
            http_client,
            options,
            auth: Arc::new(auth),
        }
    }

    /// Configure from the environment (see [`config`]) and restore the
    /// persisted session
    pub async fn from_env() -> Result<Self, Error> {
        let url = config::api_url_from_env();
        let options = ClientOptions::from_env()?;
        let client = Self::new_with_options(&url, options);
        client.restore_session().await?;
        info!("ReelPost client ready for {}", client.url);
        Ok(client)
    }

    /// Load the persisted session, returning whether it is authenticated
    pub async fn restore_session(&self) -> Result<bool, Error> {
        Ok(self.auth.restore().await?)
    }

    /// The session manager: login, register, logout, session state
    pub fn auth(&self) -> &AuthManager {
        &self.auth
    }

    /// Shared handle to the session manager
    pub fn auth_handle(&self) -> Arc<AuthManager> {
        self.auth.clone()
    }

    /// Start renewing the access token in the background
    ///
    /// Returns `None` when `auto_refresh_token` is off. Keep the returned
    /// scheduler alive for as long as renewal should run.
    pub fn start_auto_refresh(&self) -> Option<RefreshScheduler> {
        if !self.options.auto_refresh_token {
            return None;
        }
        Some(RefreshScheduler::start(self.auth.clone()))
    }

    /// Connected TikTok accounts
    pub fn connections(&self) -> ConnectionsClient {
        ConnectionsClient::new(self.auth.clone())
    }

    /// Linking new TikTok accounts
    pub fn tiktok(&self) -> TikTokClient {
        TikTokClient::new(self.auth.clone())
    }

    /// Publishing and the job queue
    pub fn publish(&self) -> PublishClient {
        PublishClient::new(self.auth.clone())
    }

    /// Uploaded videos
    pub fn videos(&self) -> VideosClient {
        VideosClient::new(self.auth.clone())
    }

    /// Brand patterns
    pub fn patterns(&self) -> PatternsClient {
        PatternsClient::new(self.auth.clone())
    }

    /// AI voices
    pub fn voices(&self) -> VoicesClient {
        VoicesClient::new(self.auth.clone())
    }
}

/// A convenience module for common imports
pub mod prelude {
    pub use crate::auth::{AuthError, AuthSession, User};
    pub use crate::config::ClientOptions;
    pub use crate::error::Error;
    pub use crate::ReelPost;
}
