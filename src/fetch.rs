//! Response handling shared by the resource clients

use log::warn;
use reelpost_auth::{AuthError, AuthManager, FetchRequest};
use reqwest::{Response, StatusCode};
use serde::de::DeserializeOwned;
use std::path::Path;

use crate::error::Error;

/// Send through the access layer and turn non-success statuses into errors.
///
/// A `401` that survives the access layer without a refresh token means
/// nobody can renew the credentials, so the local session is torn down. A
/// `401` on the retry after a successful refresh is reported as an API error
/// and the renewed session is kept.
async fn execute_checked(auth: &AuthManager, request: FetchRequest) -> Result<Response, Error> {
    let skips_auth = request.skips_auth();
    let url = request.url().to_string();
    let response = auth.execute(request).await?;
    let status = response.status();

    if status.is_success() {
        return Ok(response);
    }

    if status == StatusCode::UNAUTHORIZED && !skips_auth && !auth.session().has_refresh_token() {
        warn!("{} unauthorized and no refresh token, signing out", url);
        auth.logout().await;
        return Err(Error::Auth(AuthError::SessionExpired));
    }

    let text = response.text().await.unwrap_or_default();
    Err(Error::Api {
        status: status.as_u16(),
        message: error_message(&text, status),
    })
}

/// Execute the request and parse the response as JSON
pub(crate) async fn execute_json<T: DeserializeOwned>(
    auth: &AuthManager,
    request: FetchRequest,
) -> Result<T, Error> {
    let response = execute_checked(auth, request).await?;
    Ok(response.json::<T>().await?)
}

/// Execute the request and ignore the body
pub(crate) async fn execute_empty(auth: &AuthManager, request: FetchRequest) -> Result<(), Error> {
    execute_checked(auth, request).await?;
    Ok(())
}

/// Path segment for an id taken from user input
pub(crate) fn segment(id: &str) -> String {
    urlencoding::encode(id).into_owned()
}

/// Pull a readable message out of an error body
fn error_message(body: &str, status: StatusCode) -> String {
    if let Ok(value) = serde_json::from_str::<serde_json::Value>(body) {
        for key in ["message", "error", "detail"] {
            if let Some(msg) = value.get(key).and_then(|v| v.as_str()) {
                return msg.to_string();
            }
        }
    }

    let body = body.trim();
    if body.is_empty() {
        status
            .canonical_reason()
            .unwrap_or("request failed")
            .to_string()
    } else {
        body.to_string()
    }
}

/// Content type for an upload, from its file extension
pub(crate) fn guess_mime(file_name: &str) -> Option<&'static str> {
    let ext = Path::new(file_name)
        .extension()?
        .to_str()?
        .to_ascii_lowercase();
    let mime = match ext.as_str() {
        "mp4" => "video/mp4",
        "mov" => "video/quicktime",
        "webm" => "video/webm",
        "mkv" => "video/x-matroska",
        "mp3" => "audio/mpeg",
        "wav" => "audio/wav",
        "m4a" => "audio/mp4",
        "ogg" => "audio/ogg",
        "png" => "image/png",
        "jpg" | "jpeg" => "image/jpeg",
        "svg" => "image/svg+xml",
        _ => return None,
    };
    Some(mime)
}
