//! Connected TikTok accounts

use chrono::{DateTime, Utc};
use reelpost_auth::{AuthManager, FetchRequest};
use serde::{Deserialize, Serialize};
use std::sync::Arc;

use crate::error::Error;
use crate::fetch::{execute_empty, execute_json, segment};

/// A TikTok account linked to the user
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Connection {
    pub id: String,
    #[serde(default)]
    pub platform: Option<String>,
    #[serde(default)]
    pub username: Option<String>,
    #[serde(default)]
    pub display_name: Option<String>,
    #[serde(default)]
    pub avatar_url: Option<String>,
    #[serde(default)]
    pub is_default: bool,
    #[serde(default)]
    pub created_at: Option<DateTime<Utc>>,
}

impl Connection {
    /// Name to show for the account
    pub fn label(&self) -> &str {
        self.display_name
            .as_deref()
            .or(self.username.as_deref())
            .unwrap_or(&self.id)
    }
}

/// Client for `/connections`
#[derive(Clone)]
pub struct ConnectionsClient {
    auth: Arc<AuthManager>,
}

impl ConnectionsClient {
    pub(crate) fn new(auth: Arc<AuthManager>) -> Self {
        Self { auth }
    }

    /// List every connected account
    pub async fn list(&self) -> Result<Vec<Connection>, Error> {
        let request = FetchRequest::get(&self.auth.endpoint("/connections"));
        execute_json(&self.auth, request).await
    }

    /// The account publishing goes to when none is picked
    pub async fn default_connection(&self) -> Result<Option<Connection>, Error> {
        Ok(self.list().await?.into_iter().find(|c| c.is_default))
    }

    /// Disconnect an account
    pub async fn delete(&self, id: &str) -> Result<(), Error> {
        let url = self.auth.endpoint(&format!("/connections/{}", segment(id)));
        execute_empty(&self.auth, FetchRequest::delete(&url)).await
    }

    /// Make an account the default publishing target
    pub async fn set_default(&self, id: &str) -> Result<(), Error> {
        let url = self
            .auth
            .endpoint(&format!("/connections/{}/set-default", segment(id)));
        execute_empty(&self.auth, FetchRequest::post(&url)).await
    }
}
