//! The session manager: login, logout, authenticated requests and token refresh

use log::{debug, info, warn};
use reqwest::{Client, Response, StatusCode};
use serde::{Deserialize, Serialize};
use std::sync::{Arc, Mutex, MutexGuard, RwLock, RwLockReadGuard, RwLockWriteGuard};
use tokio::sync::{watch, Mutex as AsyncMutex};

use crate::fetch::FetchRequest;
use crate::session::{AuthSession, User};
use crate::store::{MemorySessionStore, SessionStore};
use crate::{AuthError, AuthOptions};

/// Login request body
#[derive(Debug, Clone, Serialize)]
pub struct LoginCredentials {
    pub email: String,
    pub password: String,
}

/// Registration request body
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct RegisterCredentials {
    pub name: String,
    pub email: String,
    pub password: String,
    pub accepted_terms: bool,
    pub accepted_privacy: bool,
}

/// Response of `/auth/login` and `/auth/register`
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AuthResponse {
    pub user: User,
    #[serde(alias = "token")]
    pub access_token: String,
    #[serde(default)]
    pub refresh_token: Option<String>,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct RefreshRequest<'a> {
    refresh_token: &'a str,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct RefreshResponse {
    #[serde(alias = "token")]
    access_token: String,
    #[serde(default)]
    refresh_token: Option<String>,
}

/// What the refresh leader hands to everybody who waited on it
#[derive(Debug, Clone)]
enum RefreshOutcome {
    Refreshed(String),
    Expired,
    Failed(String),
}

impl RefreshOutcome {
    fn from_result(result: &Result<String, AuthError>) -> Self {
        match result {
            Ok(token) => RefreshOutcome::Refreshed(token.clone()),
            Err(AuthError::SessionExpired) => RefreshOutcome::Expired,
            Err(e) => RefreshOutcome::Failed(e.to_string()),
        }
    }

    fn into_result(self) -> Result<String, AuthError> {
        match self {
            RefreshOutcome::Refreshed(token) => Ok(token),
            RefreshOutcome::Expired => Err(AuthError::SessionExpired),
            RefreshOutcome::Failed(msg) => Err(AuthError::RefreshFailed(msg)),
        }
    }
}

type InflightRefresh = watch::Receiver<Option<RefreshOutcome>>;

enum RefreshRole {
    Leader(watch::Sender<Option<RefreshOutcome>>),
    Follower(InflightRefresh),
}

/// Owner of the authentication session
///
/// One instance per process; share it as `Arc<AuthManager>` with every
/// component that needs authenticated access.
pub struct AuthManager {
    base_url: String,
    http_client: Client,
    options: AuthOptions,
    session: RwLock<AuthSession>,
    store: Arc<dyn SessionStore>,
    inflight: Mutex<Option<InflightRefresh>>,
    /// Serializes store writes so the last transition is the one persisted.
    persist_lock: AsyncMutex<()>,
}

impl AuthManager {
    /// Create a manager backed by an in-memory store
    pub fn new(base_url: &str, http_client: Client, options: AuthOptions) -> Self {
        Self::with_store(base_url, http_client, options, Arc::new(MemorySessionStore::new()))
    }

    /// Create a manager that persists through `store`
    ///
    /// The session starts logged out; call [`AuthManager::restore`] to load
    /// what the store holds.
    pub fn with_store(
        base_url: &str,
        http_client: Client,
        options: AuthOptions,
        store: Arc<dyn SessionStore>,
    ) -> Self {
        Self {
            base_url: base_url.trim_end_matches('/').to_string(),
            http_client,
            options,
            session: RwLock::new(AuthSession::default()),
            store,
            inflight: Mutex::new(None),
            persist_lock: AsyncMutex::new(()),
        }
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    pub fn options(&self) -> &AuthOptions {
        &self.options
    }

    pub fn http_client(&self) -> &Client {
        &self.http_client
    }

    /// Absolute URL for an API path such as `/connections`
    pub fn endpoint(&self, path: &str) -> String {
        format!("{}{}", self.base_url, path)
    }

    fn read_session(&self) -> RwLockReadGuard<'_, AuthSession> {
        self.session.read().unwrap_or_else(|e| e.into_inner())
    }

    fn write_session(&self) -> RwLockWriteGuard<'_, AuthSession> {
        self.session.write().unwrap_or_else(|e| e.into_inner())
    }

    fn lock_inflight(&self) -> MutexGuard<'_, Option<InflightRefresh>> {
        self.inflight.lock().unwrap_or_else(|e| e.into_inner())
    }

    /// Snapshot of the current session
    pub fn session(&self) -> AuthSession {
        self.read_session().clone()
    }

    pub fn is_authenticated(&self) -> bool {
        self.read_session().is_authenticated
    }

    pub fn is_refreshing(&self) -> bool {
        self.read_session().is_refreshing
    }

    pub fn access_token(&self) -> Option<String> {
        self.read_session().access_token.clone()
    }

    pub fn current_user(&self) -> Option<User> {
        self.read_session().user.clone()
    }

    /// Load the persisted session, returning whether it is authenticated.
    pub async fn restore(&self) -> Result<bool, AuthError> {
        let Some(stored) = self.store.load().await? else {
            debug!("No persisted session");
            return Ok(false);
        };

        let stored = stored.normalized();
        let authenticated = stored.is_authenticated;
        {
            let mut session = self.write_session();
            let refreshing = session.is_refreshing;
            *session = stored;
            session.is_refreshing = refreshing;
        }
        info!("Restored persisted session (authenticated: {})", authenticated);
        Ok(authenticated)
    }

    async fn persist(&self) {
        if !self.options.persist_session {
            return;
        }
        let _order = self.persist_lock.lock().await;
        // Snapshot under the lock: a write that started earlier cannot land
        // after this one with older state.
        let snapshot = self.session();
        let result = if snapshot.access_token.is_some() || snapshot.refresh_token.is_some() {
            self.store.save(&snapshot).await
        } else {
            self.store.clear().await
        };
        if let Err(e) = result {
            warn!("Failed to persist session: {}", e);
        }
    }

    /// Sign in with email and password
    pub async fn login(&self, email: &str, password: &str) -> Result<AuthResponse, AuthError> {
        let credentials = LoginCredentials {
            email: email.to_string(),
            password: password.to_string(),
        };
        let request = FetchRequest::post(&self.endpoint("/auth/login"))
            .skip_auth()
            .json(&credentials)?;
        self.authenticate(request).await
    }

    /// Create an account and sign in to it
    pub async fn register(
        &self,
        credentials: &RegisterCredentials,
    ) -> Result<AuthResponse, AuthError> {
        let request = FetchRequest::post(&self.endpoint("/auth/register"))
            .skip_auth()
            .json(credentials)?;
        self.authenticate(request).await
    }

    async fn authenticate(&self, request: FetchRequest) -> Result<AuthResponse, AuthError> {
        let response = self.execute(request).await?;
        let status = response.status();
        if !status.is_success() {
            let message = response.text().await.unwrap_or_default();
            return Err(AuthError::ApiError {
                status: status.as_u16(),
                message,
            });
        }

        let auth: AuthResponse = response.json().await?;
        self.write_session().establish(
            auth.user.clone(),
            auth.access_token.clone(),
            auth.refresh_token.clone(),
        );
        self.persist().await;
        if auth.refresh_token.is_none() {
            warn!("No refresh token issued for {}, session cannot be renewed", auth.user.email);
        }
        info!("Signed in as {}", auth.user.email);
        Ok(auth)
    }

    /// Forget the session locally and in the store
    pub async fn logout(&self) {
        self.clear_session().await;
        info!("Signed out");
    }

    async fn clear_session(&self) {
        self.write_session().clear();
        self.persist().await;
    }

    /// Send `request`, attaching the access token and recovering from one `401`.
    ///
    /// The response is returned as-is; only a `401` is acted upon. If there is
    /// no refresh token the `401` response goes back to the caller untouched.
    pub async fn execute(&self, mut request: FetchRequest) -> Result<Response, AuthError> {
        if !request.has_timeout() {
            if let Some(timeout) = self.options.request_timeout {
                request = request.timeout(timeout);
            }
        }

        let token = if request.skips_auth() {
            None
        } else {
            self.access_token()
        };

        let response = request.send(&self.http_client, token.as_deref()).await?;
        if response.status() != StatusCode::UNAUTHORIZED || request.skips_auth() {
            return Ok(response);
        }

        let has_refresh_token = self.read_session().has_refresh_token();
        if !has_refresh_token {
            debug!("401 from {} with no refresh token", request.url());
            return Ok(response);
        }

        debug!("401 from {}, refreshing access token", request.url());
        let token = match self.refresh_access_token().await {
            Ok(token) => token,
            // Cleared by someone else between the check and the refresh.
            Err(AuthError::NoRefreshToken) => return Ok(response),
            Err(e) => return Err(e),
        };

        let retried = request.send(&self.http_client, Some(&token)).await?;
        Ok(retried)
    }

    /// Exchange the refresh token for a new access token
    ///
    /// At most one refresh call is in flight at a time: concurrent callers wait
    /// for the running one and share its outcome, for at most
    /// `refresh_wait_timeout`.
    pub async fn refresh_access_token(&self) -> Result<String, AuthError> {
        let refresh_token = self
            .read_session()
            .refresh_token
            .clone()
            .ok_or(AuthError::NoRefreshToken)?;

        let role = {
            let mut inflight = self.lock_inflight();
            match inflight.clone() {
                Some(rx) => RefreshRole::Follower(rx),
                None => {
                    let (tx, rx) = watch::channel(None);
                    *inflight = Some(rx);
                    self.write_session().is_refreshing = true;
                    RefreshRole::Leader(tx)
                }
            }
        };

        match role {
            RefreshRole::Follower(rx) => self.await_inflight(rx).await,
            RefreshRole::Leader(tx) => {
                let _guard = InflightGuard { manager: self };
                let result = self.exchange_refresh_token(&refresh_token).await;
                tx.send_replace(Some(RefreshOutcome::from_result(&result)));
                result
            }
        }
    }

    async fn await_inflight(&self, mut rx: InflightRefresh) -> Result<String, AuthError> {
        debug!("Waiting for in-flight token refresh");
        let timeout = self.options.refresh_wait_timeout;
        let wait = async {
            rx.wait_for(Option::is_some)
                .await
                .map(|outcome| (*outcome).clone())
        };

        match tokio::time::timeout(timeout, wait).await {
            Ok(Ok(Some(outcome))) => outcome.into_result(),
            Ok(Ok(None)) | Ok(Err(_)) => Err(AuthError::RefreshFailed(
                "refresh ended without a result".to_string(),
            )),
            Err(_) => Err(AuthError::RefreshTimeout(timeout)),
        }
    }

    async fn exchange_refresh_token(&self, refresh_token: &str) -> Result<String, AuthError> {
        let request = FetchRequest::post(&self.endpoint("/auth/refresh"))
            .skip_auth()
            .json(&RefreshRequest { refresh_token })?;
        let request = match self.options.request_timeout {
            Some(timeout) => request.timeout(timeout),
            None => request,
        };

        let response = match request.send(&self.http_client, None).await {
            Ok(response) => response,
            Err(e) => {
                warn!("Token refresh could not reach the server: {}", e);
                return Err(e);
            }
        };

        let status = response.status();
        if !status.is_success() {
            warn!("Refresh token rejected ({}), clearing session", status);
            self.clear_session().await;
            return Err(AuthError::SessionExpired);
        }

        let refreshed: RefreshResponse = response.json().await?;
        let token = refreshed.access_token.clone();
        {
            let mut session = self.write_session();
            // Signed out, or signed in again, while the call was in flight.
            if session.refresh_token.as_deref() != Some(refresh_token) {
                debug!("Session changed during refresh, discarding the new token");
                return session
                    .access_token
                    .clone()
                    .filter(|_| session.is_authenticated)
                    .ok_or(AuthError::SessionExpired);
            }
            session.replace_access_token(refreshed.access_token, refreshed.refresh_token);
        }
        self.persist().await;
        debug!("Access token refreshed");
        Ok(token)
    }
}

/// Releases the single-flight slot, even if the leader is cancelled mid-refresh.
struct InflightGuard<'a> {
    manager: &'a AuthManager,
}

impl Drop for InflightGuard<'_> {
    fn drop(&mut self) {
        *self.manager.lock_inflight() = None;
        self.manager.write_session().is_refreshing = false;
    }
}
