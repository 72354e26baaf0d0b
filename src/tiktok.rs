//! Entry point of the TikTok account-linking flow
//!
//! The backend runs the OAuth exchange; the client only needs the URL to send
//! the user to. The callback is handled by the browser redirect.

use reelpost_auth::{AuthManager, FetchRequest};
use serde::Deserialize;
use std::sync::Arc;

use crate::error::Error;
use crate::fetch::execute_json;

#[derive(Debug, Deserialize)]
struct AuthorizationUrl {
    #[serde(alias = "authUrl", alias = "authorizationUrl")]
    url: String,
}

/// Client for `/auth/tiktok`
#[derive(Clone)]
pub struct TikTokClient {
    auth: Arc<AuthManager>,
}

impl TikTokClient {
    pub(crate) fn new(auth: Arc<AuthManager>) -> Self {
        Self { auth }
    }

    /// URL that starts linking a TikTok account to the signed-in user
    pub async fn authorization_url(&self) -> Result<String, Error> {
        let request = FetchRequest::get(&self.auth.endpoint("/auth/tiktok"));
        let body: AuthorizationUrl = execute_json(&self.auth, request).await?;
        Ok(body.url)
    }
}
