//! Session state for authentication

use serde::{Deserialize, Serialize};

/// Identity of the signed-in user
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct User {
    pub id: String,
    pub email: String,
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub role: Option<String>,
}

/// The process-wide authentication session
///
/// Mutated only through [`AuthSession::establish`],
/// [`AuthSession::replace_access_token`] and [`AuthSession::clear`].
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AuthSession {
    pub user: Option<User>,
    pub access_token: Option<String>,
    pub refresh_token: Option<String>,
    pub is_authenticated: bool,

    /// Runtime-only; never written to the store.
    #[serde(skip)]
    pub is_refreshing: bool,
}

impl AuthSession {
    /// Install the credentials returned by a login or registration.
    ///
    /// The session only counts as authenticated when both tokens are present.
    pub fn establish(&mut self, user: User, access_token: String, refresh_token: Option<String>) {
        self.user = Some(user);
        self.refresh_token = refresh_token.filter(|t| !t.is_empty());
        self.is_authenticated = !access_token.is_empty() && self.refresh_token.is_some();
        self.access_token = Some(access_token);
    }

    /// Swap in a freshly issued access token, and the refresh token too if the
    /// server rotated it.
    pub fn replace_access_token(&mut self, access_token: String, rotated_refresh: Option<String>) {
        if let Some(refresh) = rotated_refresh.filter(|t| !t.is_empty()) {
            self.refresh_token = Some(refresh);
        }
        self.is_authenticated = !access_token.is_empty() && self.refresh_token.is_some();
        self.access_token = Some(access_token);
    }

    /// Drop every credential at once.
    pub fn clear(&mut self) {
        self.user = None;
        self.access_token = None;
        self.refresh_token = None;
        self.is_authenticated = false;
    }

    /// Re-apply the authentication invariant to a session read back from storage.
    pub fn normalized(mut self) -> Self {
        self.is_refreshing = false;
        if self.access_token.as_deref().map_or(true, str::is_empty) {
            self.access_token = None;
            self.is_authenticated = false;
        }
        if self.refresh_token.as_deref() == Some("") {
            self.refresh_token = None;
        }
        if self.refresh_token.is_none() {
            self.is_authenticated = false;
        }
        self
    }

    pub fn has_refresh_token(&self) -> bool {
        self.refresh_token.is_some()
    }

    /// Both tokens present and the session marked authenticated.
    pub fn has_credentials(&self) -> bool {
        self.is_authenticated && self.access_token.is_some() && self.refresh_token.is_some()
    }
}
