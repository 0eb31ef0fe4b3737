//! Push message handler - decode, classify, display

use super::payload::PushPayload;
use super::profile::NotificationProfile;
use crate::config::NotificationsConfig;
use crate::error::Result;
use crate::host::{Notification, NotificationHost};
use serde::Serialize;
use std::sync::Arc;

/// What a push event resulted in
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "outcome", rename_all = "snake_case")]
pub enum PushOutcome {
    /// A notification was displayed
    Displayed { id: String, tag: String },
    /// The event carried no usable payload
    Ignored { reason: String },
}

/// Turns push payloads into displayed notifications
pub struct PushHandler {
    host: Arc<dyn NotificationHost>,
    defaults: NotificationsConfig,
}

impl PushHandler {
    /// Create a new push handler
    pub fn new(host: Arc<dyn NotificationHost>, defaults: NotificationsConfig) -> Self {
        Self { host, defaults }
    }

    /// Handle one push event.
    ///
    /// A missing or undecodable payload is a no-op, not an error. The returned
    /// future settles only once the host has processed the display request.
    pub async fn handle(&self, raw: Option<&[u8]>) -> Result<PushOutcome> {
        let Some(raw) = raw else {
            tracing::debug!("Push event without payload");
            return Ok(PushOutcome::Ignored {
                reason: "no payload".to_string(),
            });
        };

        let payload = match PushPayload::decode(raw) {
            Ok(Some(payload)) => payload,
            Ok(None) => {
                tracing::debug!("Push event with empty payload");
                return Ok(PushOutcome::Ignored {
                    reason: "empty payload".to_string(),
                });
            }
            Err(e) => {
                tracing::warn!(error = %e, "Ignoring undecodable push payload");
                return Ok(PushOutcome::Ignored {
                    reason: e.to_string(),
                });
            }
        };

        let notification = self.build_notification(payload);
        let displayed = self.host.show_notification(notification).await?;

        Ok(PushOutcome::Displayed {
            id: displayed.id,
            tag: displayed.notification.tag,
        })
    }

    /// Apply the type profile and the configured fallbacks to a payload
    pub fn build_notification(&self, payload: PushPayload) -> Notification {
        let profile = NotificationProfile::resolve(
            payload.data.kind.as_deref(),
            payload.require_interaction,
            &self.defaults.default_tag,
        );

        Notification {
            title: payload
                .title
                .unwrap_or_else(|| self.defaults.app_name.clone()),
            body: payload.body.unwrap_or_default(),
            icon: payload
                .icon
                .unwrap_or_else(|| self.defaults.default_icon.clone()),
            badge: payload
                .badge
                .unwrap_or_else(|| self.defaults.default_badge.clone()),
            vibrate: profile.vibrate,
            require_interaction: profile.require_interaction,
            tag: profile.tag,
            data: payload.data,
            actions: payload.actions,
        }
    }
}
