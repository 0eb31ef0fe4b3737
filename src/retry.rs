//! Background retry task - host-scheduled retry of failed notification sends
//!
//! The agent keeps no retry bookkeeping of its own. Scheduling belongs to the
//! host and deciding what to resend belongs to the server.

use crate::analytics::NotificationsApi;
use crate::error::Result;
use serde::Serialize;
use std::sync::Arc;

/// What a sync signal resulted in
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum SyncOutcome {
    /// The retry request was sent
    Dispatched,
    /// The tag is not one this agent handles
    Ignored,
}

/// Handles host sync signals
pub struct BackgroundRetryTask {
    api: Arc<dyn NotificationsApi>,
    sync_tag: String,
}

impl BackgroundRetryTask {
    /// Create a task that reacts to `sync_tag`
    pub fn new(api: Arc<dyn NotificationsApi>, sync_tag: impl Into<String>) -> Self {
        Self {
            api,
            sync_tag: sync_tag.into(),
        }
    }

    /// The tag this task reacts to
    pub fn sync_tag(&self) -> &str {
        &self.sync_tag
    }

    /// Handle a sync signal. A failed dispatch is returned so the host's
    /// scheduler can try again later.
    pub async fn handle_sync(&self, tag: &str) -> Result<SyncOutcome> {
        if tag != self.sync_tag {
            tracing::debug!(tag, "Ignoring unrelated sync tag");
            return Ok(SyncOutcome::Ignored);
        }

        tracing::info!(tag, "Requesting retry of failed notification sends");
        self.api.retry_failed().await.map_err(|e| {
            tracing::warn!(error = %e, "Retry dispatch failed");
            e
        })?;
        Ok(SyncOutcome::Dispatched)
    }
}
