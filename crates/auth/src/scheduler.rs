//! Proactive access token renewal

use chrono::Utc;
use log::{debug, error, info, warn};
use std::sync::Arc;
use std::time::Duration;
use tokio::task::JoinHandle;
use tokio::time::{interval_at, Instant, MissedTickBehavior};

use crate::manager::AuthManager;
use crate::token::time_until_expiry;

/// Result of one scheduler tick
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ProactiveRefresh {
    /// Not signed in, or a token is missing
    Skipped,
    /// Enough lifetime left; seconds until expiry
    NotDue(i64),
    Refreshed,
    /// Logged and ignored; the reactive path still covers us
    Failed(String),
}

/// Run one proactive refresh check against `manager`.
///
/// Never returns an error: a failed check just waits for the next tick or the
/// next `401`.
pub async fn proactive_refresh(manager: &AuthManager) -> ProactiveRefresh {
    let session = manager.session();
    if !session.has_credentials() {
        return ProactiveRefresh::Skipped;
    }
    let Some(access_token) = session.access_token else {
        return ProactiveRefresh::Skipped;
    };

    let remaining = match time_until_expiry(&access_token, Utc::now()) {
        Ok(remaining) => remaining,
        Err(e) => {
            warn!("Cannot read access token expiry: {}", e);
            return ProactiveRefresh::Failed(e.to_string());
        }
    };

    let threshold = chrono::Duration::from_std(manager.options().refresh_threshold)
        .unwrap_or_else(|_| chrono::Duration::minutes(5));
    if remaining >= threshold {
        debug!("Access token valid for another {}s", remaining.num_seconds());
        return ProactiveRefresh::NotDue(remaining.num_seconds());
    }

    info!(
        "Access token expires in {}s, refreshing proactively",
        remaining.num_seconds()
    );
    match manager.refresh_access_token().await {
        Ok(_) => ProactiveRefresh::Refreshed,
        Err(e) => {
            error!("Proactive token refresh failed: {}", e);
            ProactiveRefresh::Failed(e.to_string())
        }
    }
}

/// Background task that calls [`proactive_refresh`] every `refresh_interval`
///
/// The first check happens one interval after start. Dropping the scheduler
/// stops it.
pub struct RefreshScheduler {
    handle: JoinHandle<()>,
}

impl RefreshScheduler {
    /// Spawn the scheduler on the current tokio runtime
    pub fn start(manager: Arc<AuthManager>) -> Self {
        let period = manager
            .options()
            .refresh_interval
            .max(Duration::from_millis(1));
        let handle = tokio::spawn(async move {
            let mut ticker = interval_at(Instant::now() + period, period);
            ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);
            loop {
                ticker.tick().await;
                let outcome = proactive_refresh(&manager).await;
                debug!("Proactive refresh tick: {:?}", outcome);
            }
        });
        debug!("Proactive refresh scheduler started ({:?} period)", period);
        Self { handle }
    }

    pub fn is_running(&self) -> bool {
        !self.handle.is_finished()
    }

    pub fn stop(self) {
        self.handle.abort();
    }
}

impl Drop for RefreshScheduler {
    fn drop(&mut self) {
        self.handle.abort();
    }
}
