//! Uploaded videos

use chrono::{DateTime, Utc};
use reelpost_auth::{AuthManager, FetchRequest, FormPart};
use serde::{Deserialize, Serialize};
use std::path::Path;
use std::sync::Arc;

use crate::error::Error;
use crate::fetch::{execute_empty, execute_json, guess_mime, segment};

/// A video stored by the backend
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Video {
    pub id: String,
    #[serde(default)]
    pub title: Option<String>,
    #[serde(default)]
    pub file_name: Option<String>,
    #[serde(default)]
    pub url: Option<String>,
    #[serde(default)]
    pub thumbnail_url: Option<String>,
    #[serde(default, alias = "duration")]
    pub duration_seconds: Option<f64>,
    #[serde(default)]
    pub status: Option<String>,
    #[serde(default)]
    pub created_at: Option<DateTime<Utc>>,
}

/// A file to upload, held in memory
#[derive(Debug, Clone)]
pub struct UploadFile {
    pub file_name: String,
    pub bytes: Vec<u8>,
    pub mime: Option<String>,
}

impl UploadFile {
    pub fn new(file_name: &str, bytes: Vec<u8>) -> Self {
        Self {
            file_name: file_name.to_string(),
            mime: guess_mime(file_name).map(str::to_string),
            bytes,
        }
    }

    /// Read a file from disk
    pub async fn from_path(path: impl AsRef<Path>) -> Result<Self, Error> {
        let path = path.as_ref();
        let file_name = path
            .file_name()
            .and_then(|name| name.to_str())
            .ok_or_else(|| Error::validation(format!("not a file path: {}", path.display())))?;
        let bytes = tokio::fs::read(path).await?;
        Ok(Self::new(file_name, bytes))
    }

    pub(crate) fn into_part(self, field: &str) -> FormPart {
        FormPart::File {
            name: field.to_string(),
            file_name: self.file_name,
            mime: self.mime,
            bytes: self.bytes,
        }
    }
}

/// Video upload with optional replacement audio track
#[derive(Debug, Clone)]
pub struct VideoUpload {
    pub video: UploadFile,
    pub audio: Option<UploadFile>,
    pub title: Option<String>,
}

impl VideoUpload {
    pub fn new(video: UploadFile) -> Self {
        Self {
            video,
            audio: None,
            title: None,
        }
    }

    pub fn audio(mut self, audio: UploadFile) -> Self {
        self.audio = Some(audio);
        self
    }

    pub fn title(mut self, title: &str) -> Self {
        self.title = Some(title.to_string());
        self
    }

    fn into_parts(self) -> Vec<FormPart> {
        let mut parts = vec![self.video.into_part("video")];
        if let Some(audio) = self.audio {
            parts.push(audio.into_part("audio"));
        }
        if let Some(title) = self.title {
            parts.push(FormPart::Text {
                name: "title".to_string(),
                value: title,
            });
        }
        parts
    }
}

/// Client for `/videos`
#[derive(Clone)]
pub struct VideosClient {
    auth: Arc<AuthManager>,
}

impl VideosClient {
    pub(crate) fn new(auth: Arc<AuthManager>) -> Self {
        Self { auth }
    }

    pub async fn list(&self) -> Result<Vec<Video>, Error> {
        let request = FetchRequest::get(&self.auth.endpoint("/videos"));
        execute_json(&self.auth, request).await
    }

    pub async fn get(&self, id: &str) -> Result<Video, Error> {
        let url = self.auth.endpoint(&format!("/videos/{}", segment(id)));
        execute_json(&self.auth, FetchRequest::get(&url)).await
    }

    /// Upload a video (multipart `video`, optional `audio` and `title`)
    pub async fn upload(&self, upload: VideoUpload) -> Result<Video, Error> {
        if upload.video.bytes.is_empty() {
            return Err(Error::validation("video file is empty"));
        }
        let request = FetchRequest::post(&self.auth.endpoint("/videos/upload"))
            .multipart(upload.into_parts());
        execute_json(&self.auth, request).await
    }

    pub async fn delete(&self, id: &str) -> Result<(), Error> {
        let url = self.auth.endpoint(&format!("/videos/{}", segment(id)));
        execute_empty(&self.auth, FetchRequest::delete(&url)).await
    }
}
