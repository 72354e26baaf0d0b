//! Publishing videos and following the job queue

mod types;

use log::debug;
use reelpost_auth::{AuthManager, FetchRequest};
use std::sync::Arc;
use std::time::Duration;
use tokio::time::{sleep, Instant};

use crate::error::Error;
use crate::fetch::execute_json;

pub use types::*;

/// Client for `/publish`
#[derive(Clone)]
pub struct PublishClient {
    auth: Arc<AuthManager>,
}

impl PublishClient {
    pub(crate) fn new(auth: Arc<AuthManager>) -> Self {
        Self { auth }
    }

    /// Publish (or schedule) one video
    pub async fn publish(&self, request: &PublishRequest) -> Result<PublishJob, Error> {
        if request.connection_ids.is_empty() {
            return Err(Error::validation("at least one connection is required"));
        }
        let request = FetchRequest::post(&self.auth.endpoint("/publish")).json(request)?;
        execute_json(&self.auth, request).await
    }

    /// Publish several videos in one call
    pub async fn publish_batch(&self, items: &[PublishRequest]) -> Result<Vec<PublishJob>, Error> {
        if items.is_empty() {
            return Ok(Vec::new());
        }
        if items.iter().any(|item| item.connection_ids.is_empty()) {
            return Err(Error::validation("every batch item needs a connection"));
        }
        let request = FetchRequest::post(&self.auth.endpoint("/publish/batch"))
            .json(&BatchPublishRequest { items })?;
        execute_json(&self.auth, request).await
    }

    /// Publish history and queue
    pub async fn jobs(&self, filter: &JobFilter) -> Result<Vec<PublishJob>, Error> {
        let mut request = FetchRequest::get(&self.auth.endpoint("/publish/jobs"));
        if let Some(status) = filter.status {
            request = request.query("status", status.as_str());
        }
        if let Some(limit) = filter.limit {
            request = request.query("limit", limit);
        }
        execute_json(&self.auth, request).await
    }

    /// Poll the queue until `job_id` reaches a terminal status
    pub async fn wait_for_job(
        &self,
        job_id: &str,
        poll_every: Duration,
        timeout: Duration,
    ) -> Result<PublishJob, Error> {
        let deadline = Instant::now() + timeout;
        loop {
            let jobs = self.jobs(&JobFilter::default()).await?;
            let job = jobs
                .into_iter()
                .find(|job| job.id == job_id)
                .ok_or_else(|| Error::general(format!("publish job {} not found", job_id)))?;

            if job.status.is_terminal() {
                return Ok(job);
            }
            if Instant::now() + poll_every > deadline {
                return Err(Error::general(format!(
                    "publish job {} still {} after {:?}",
                    job_id,
                    job.status.as_str(),
                    timeout
                )));
            }
            debug!("Job {} is {}, polling again", job_id, job.status.as_str());
            sleep(poll_every).await;
        }
    }
}
