//! Types for publishing and the job queue

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Where a publish job is in its life
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PublishJobStatus {
    Pending,
    Scheduled,
    Processing,
    Published,
    Failed,
    Cancelled,
    #[serde(other)]
    Unknown,
}

impl PublishJobStatus {
    /// No further transitions will happen
    pub fn is_terminal(&self) -> bool {
        matches!(
            self,
            PublishJobStatus::Published | PublishJobStatus::Failed | PublishJobStatus::Cancelled
        )
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            PublishJobStatus::Pending => "pending",
            PublishJobStatus::Scheduled => "scheduled",
            PublishJobStatus::Processing => "processing",
            PublishJobStatus::Published => "published",
            PublishJobStatus::Failed => "failed",
            PublishJobStatus::Cancelled => "cancelled",
            PublishJobStatus::Unknown => "unknown",
        }
    }
}

/// Publish one video to one or more connected accounts
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PublishRequest {
    pub video_id: String,
    pub connection_ids: Vec<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub caption: Option<String>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub hashtags: Vec<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub pattern_id: Option<String>,
    /// Publish immediately when unset
    #[serde(skip_serializing_if = "Option::is_none")]
    pub scheduled_at: Option<DateTime<Utc>>,
}

impl PublishRequest {
    pub fn new(video_id: &str, connection_ids: &[&str]) -> Self {
        Self {
            video_id: video_id.to_string(),
            connection_ids: connection_ids.iter().map(|id| id.to_string()).collect(),
            caption: None,
            hashtags: Vec::new(),
            pattern_id: None,
            scheduled_at: None,
        }
    }

    pub fn caption(mut self, caption: &str) -> Self {
        self.caption = Some(caption.to_string());
        self
    }

    pub fn hashtag(mut self, tag: &str) -> Self {
        self.hashtags.push(tag.trim_start_matches('#').to_string());
        self
    }

    /// Apply a brand pattern (logo, subtitles, filter) before publishing
    pub fn pattern(mut self, pattern_id: &str) -> Self {
        self.pattern_id = Some(pattern_id.to_string());
        self
    }

    pub fn schedule_at(mut self, at: DateTime<Utc>) -> Self {
        self.scheduled_at = Some(at);
        self
    }
}

#[derive(Debug, Serialize)]
pub(crate) struct BatchPublishRequest<'a> {
    pub items: &'a [PublishRequest],
}

/// A queued, running or finished publish
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PublishJob {
    pub id: String,
    #[serde(default)]
    pub video_id: Option<String>,
    #[serde(default)]
    pub connection_id: Option<String>,
    pub status: PublishJobStatus,
    #[serde(default)]
    pub caption: Option<String>,
    #[serde(default)]
    pub scheduled_at: Option<DateTime<Utc>>,
    #[serde(default)]
    pub published_at: Option<DateTime<Utc>>,
    /// Link to the post once published
    #[serde(default)]
    pub post_url: Option<String>,
    #[serde(default)]
    pub error: Option<String>,
    #[serde(default)]
    pub created_at: Option<DateTime<Utc>>,
}

/// Narrow down `GET /publish/jobs`
#[derive(Debug, Clone, Default)]
pub struct JobFilter {
    pub status: Option<PublishJobStatus>,
    pub limit: Option<u32>,
}

impl JobFilter {
    pub fn status(mut self, status: PublishJobStatus) -> Self {
        self.status = Some(status);
        self
    }

    pub fn limit(mut self, limit: u32) -> Self {
        self.limit = Some(limit);
        self
    }
}
