//! Brand patterns: logo overlay, subtitle style and color filter applied to
//! every video published with them

use chrono::{DateTime, Utc};
use reelpost_auth::{AuthManager, FetchRequest};
use serde::{Deserialize, Serialize};
use std::sync::Arc;

use crate::error::Error;
use crate::fetch::{execute_empty, execute_json, segment};

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum LogoPosition {
    TopLeft,
    #[default]
    TopRight,
    BottomLeft,
    BottomRight,
    Center,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LogoSettings {
    pub url: String,
    #[serde(default)]
    pub position: LogoPosition,
    /// Width as a percentage of the video width
    #[serde(alias = "size")]
    pub size_percent: f32,
    pub opacity: f32,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SubtitleSettings {
    pub enabled: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub font_family: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub font_size: Option<u32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub color: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub background_color: Option<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BrandPattern {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<String>,
    pub name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub logo: Option<LogoSettings>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub subtitles: Option<SubtitleSettings>,
    /// Name of the color filter, e.g. `vivid`
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub filter: Option<String>,
    #[serde(default)]
    pub is_default: bool,
    #[serde(default, skip_serializing)]
    pub created_at: Option<DateTime<Utc>>,
}

impl BrandPattern {
    pub fn new(name: &str) -> Self {
        Self {
            name: name.to_string(),
            ..Self::default()
        }
    }

    /// Check the values the backend would otherwise reject
    pub fn validate(&self) -> Result<(), Error> {
        if self.name.trim().is_empty() {
            return Err(Error::validation("pattern name is required"));
        }
        if let Some(logo) = &self.logo {
            if logo.url.trim().is_empty() {
                return Err(Error::validation("logo url is required"));
            }
            if !(0.0..=1.0).contains(&logo.opacity) {
                return Err(Error::validation("logo opacity must be between 0 and 1"));
            }
            if !(logo.size_percent > 0.0 && logo.size_percent <= 100.0) {
                return Err(Error::validation("logo size must be within (0, 100] percent"));
            }
        }
        Ok(())
    }
}

/// Client for `/patterns`
#[derive(Clone)]
pub struct PatternsClient {
    auth: Arc<AuthManager>,
}

impl PatternsClient {
    pub(crate) fn new(auth: Arc<AuthManager>) -> Self {
        Self { auth }
    }

    pub async fn list(&self) -> Result<Vec<BrandPattern>, Error> {
        let request = FetchRequest::get(&self.auth.endpoint("/patterns"));
        execute_json(&self.auth, request).await
    }

    pub async fn create(&self, pattern: &BrandPattern) -> Result<BrandPattern, Error> {
        pattern.validate()?;
        let request = FetchRequest::post(&self.auth.endpoint("/patterns")).json(pattern)?;
        execute_json(&self.auth, request).await
    }

    pub async fn update(&self, id: &str, pattern: &BrandPattern) -> Result<BrandPattern, Error> {
        pattern.validate()?;
        let url = self.auth.endpoint(&format!("/patterns/{}", segment(id)));
        execute_json(&self.auth, FetchRequest::put(&url).json(pattern)?).await
    }

    pub async fn delete(&self, id: &str) -> Result<(), Error> {
        let url = self.auth.endpoint(&format!("/patterns/{}", segment(id)));
        execute_empty(&self.auth, FetchRequest::delete(&url)).await
    }
}
