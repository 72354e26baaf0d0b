//! AI voices, proxied to ElevenLabs by the backend

use reelpost_auth::{AuthManager, FetchRequest, FormPart};
use serde::{Deserialize, Serialize};
use std::sync::Arc;

use crate::error::Error;
use crate::fetch::{execute_empty, execute_json, segment};
use crate::videos::UploadFile;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Voice {
    #[serde(alias = "voiceId")]
    pub voice_id: String,
    pub name: String,
    #[serde(default)]
    pub category: Option<String>,
    #[serde(default, alias = "previewUrl")]
    pub preview_url: Option<String>,
}

#[derive(Debug, Deserialize)]
struct VoiceList {
    voices: Vec<Voice>,
}

/// Client for `/voices`
#[derive(Clone)]
pub struct VoicesClient {
    auth: Arc<AuthManager>,
}

impl VoicesClient {
    pub(crate) fn new(auth: Arc<AuthManager>) -> Self {
        Self { auth }
    }

    pub async fn list(&self) -> Result<Vec<Voice>, Error> {
        let request = FetchRequest::get(&self.auth.endpoint("/voices"));
        let list: VoiceList = execute_json(&self.auth, request).await?;
        Ok(list.voices)
    }

    /// Clone a voice from one or more audio samples
    pub async fn clone_voice(&self, name: &str, samples: Vec<UploadFile>) -> Result<Voice, Error> {
        if name.trim().is_empty() {
            return Err(Error::validation("voice name is required"));
        }
        if samples.is_empty() {
            return Err(Error::validation("at least one audio sample is required"));
        }

        let mut parts = vec![FormPart::Text {
            name: "name".to_string(),
            value: name.to_string(),
        }];
        parts.extend(samples.into_iter().map(|sample| sample.into_part("files")));

        let request = FetchRequest::post(&self.auth.endpoint("/voices/clone")).multipart(parts);
        execute_json(&self.auth, request).await
    }

    pub async fn delete(&self, voice_id: &str) -> Result<(), Error> {
        let url = self.auth.endpoint(&format!("/voices/{}", segment(voice_id)));
        execute_empty(&self.auth, FetchRequest::delete(&url)).await
    }
}
