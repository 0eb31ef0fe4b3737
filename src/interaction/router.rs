//! Interaction router - notification clicks and dismissals

use super::route::ActionRoute;
use crate::analytics::{timestamp_now, ClickEvent, DismissEvent, NotificationsApi};
use crate::error::Result;
use crate::host::{DisplayedNotification, NotificationHost};
use serde::{Deserialize, Serialize};
use std::sync::Arc;

/// Analytics action recorded when the notification body was clicked
pub const DEFAULT_ACTION: &str = "default";

/// A click on a displayed notification
#[derive(Debug, Clone)]
pub struct NotificationClick {
    pub notification: DisplayedNotification,
    /// Chosen action button, `None` for the body
    pub action: Option<String>,
}

/// A notification dismissed without a click
#[derive(Debug, Clone)]
pub struct NotificationClose {
    pub notification: DisplayedNotification,
}

/// Result of routing a click
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ClickOutcome {
    pub url: String,
    pub action: String,
    pub analytics_recorded: bool,
}

/// Routes notification interactions into the application and analytics
pub struct InteractionRouter {
    host: Arc<dyn NotificationHost>,
    api: Arc<dyn NotificationsApi>,
    map_search_url: String,
}

impl InteractionRouter {
    /// Create a new router
    pub fn new(
        host: Arc<dyn NotificationHost>,
        api: Arc<dyn NotificationsApi>,
        map_search_url: impl Into<String>,
    ) -> Self {
        Self {
            host,
            api,
            map_search_url: map_search_url.into(),
        }
    }

    /// Handle a click: close the notification, then open the target window
    /// and record analytics side by side.
    ///
    /// Analytics failures are logged and never fail the click.
    pub async fn handle_click(&self, click: NotificationClick) -> Result<ClickOutcome> {
        let NotificationClick {
            notification,
            action,
        } = click;

        if let Err(e) = self.host.close_notification(&notification.id).await {
            tracing::warn!(id = %notification.id, error = %e, "Failed to close notification");
        }

        let data = &notification.notification.data;
        let url = ActionRoute::resolve(action.as_deref(), data).to_url(&self.map_search_url);
        let event = ClickEvent {
            notification_id: data.notification_id.clone(),
            action: action.unwrap_or_else(|| DEFAULT_ACTION.to_string()),
            timestamp: timestamp_now(),
        };

        tracing::info!(
            id = %notification.id,
            action = %event.action,
            url = %url,
            "Routing notification click"
        );

        let (opened, recorded) =
            tokio::join!(self.host.open_window(&url), self.api.record_click(&event));

        let analytics_recorded = match recorded {
            Ok(()) => true,
            Err(e) => {
                tracing::warn!(action = %event.action, error = %e, "Failed to record click analytics");
                false
            }
        };
        opened?;

        Ok(ClickOutcome {
            url,
            action: event.action,
            analytics_recorded,
        })
    }

    /// Handle a dismissal: record the tag. Failures are logged only.
    pub async fn handle_close(&self, close: NotificationClose) -> Result<()> {
        let event = DismissEvent {
            tag: close.notification.notification.tag,
            timestamp: timestamp_now(),
        };

        tracing::debug!(tag = %event.tag, "Notification dismissed");
        if let Err(e) = self.api.record_dismiss(&event).await {
            tracing::warn!(tag = %event.tag, error = %e, "Failed to record dismissal analytics");
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::NotificationsConfig;
    use crate::error::Error;
    use crate::host::{InMemoryHost, Notification};
    use crate::push::NotificationData;
    use crate::testing::MockApi;
    use async_trait::async_trait;

    async fn show(host: &InMemoryHost, data: NotificationData, tag: &str) -> DisplayedNotification {
        host.show_notification(Notification {
            title: "t".to_string(),
            body: String::new(),
            icon: String::new(),
            badge: String::new(),
            vibrate: vec![],
            require_interaction: false,
            tag: tag.to_string(),
            data,
            actions: vec![],
        })
        .await
        .unwrap()
    }

    fn router(host: Arc<InMemoryHost>, api: Arc<MockApi>) -> InteractionRouter {
        InteractionRouter::new(host, api, NotificationsConfig::default().map_search_url)
    }

    #[tokio::test]
    async fn test_directions_click() {
        let host = Arc::new(InMemoryHost::new());
        let api = Arc::new(MockApi::new());
        let data = NotificationData {
            address: Some("100 Congress Ave, Austin, TX".to_string()),
            notification_id: Some("n-5".to_string()),
            ..Default::default()
        };
        let shown = show(&host, data, "rsvp_reminder").await;

        let outcome = router(host.clone(), api.clone())
            .handle_click(NotificationClick {
                notification: shown,
                action: Some("directions".to_string()),
            })
            .await
            .unwrap();

        assert!(outcome.url.starts_with("https://www.google.com/maps/search/"));
        assert!(outcome.url.ends_with("100%20Congress%20Ave%2C%20Austin%2C%20TX"));
        assert!(outcome.analytics_recorded);
        assert_eq!(host.windows().await, vec![outcome.url.clone()]);
        // Closed before routing
        assert!(host.notifications().await.is_empty());

        let clicks = api.clicks.lock().unwrap();
        assert_eq!(clicks.len(), 1);
        assert_eq!(clicks[0].action, "directions");
        assert_eq!(clicks[0].notification_id.as_deref(), Some("n-5"));
    }

    #[tokio::test]
    async fn test_body_click_records_default_action() {
        let host = Arc::new(InMemoryHost::new());
        let api = Arc::new(MockApi::new());
        let data = NotificationData {
            kind: Some("friend_activity".to_string()),
            ..Default::default()
        };
        let shown = show(&host, data, "friend_activity").await;

        let outcome = router(host.clone(), api.clone())
            .handle_click(NotificationClick {
                notification: shown,
                action: None,
            })
            .await
            .unwrap();

        assert_eq!(outcome.url, "/friends");
        assert_eq!(outcome.action, DEFAULT_ACTION);
        assert_eq!(api.clicks.lock().unwrap()[0].action, "default");
    }

    #[tokio::test]
    async fn test_analytics_failure_does_not_block_navigation() {
        let host = Arc::new(InMemoryHost::new());
        let api = Arc::new(MockApi::failing());
        let data = NotificationData {
            restaurant_id: Some("7".to_string()),
            ..Default::default()
        };
        let shown = show(&host, data, "weekly_announcement").await;

        let outcome = router(host.clone(), api)
            .handle_click(NotificationClick {
                notification: shown,
                action: Some("details".to_string()),
            })
            .await
            .unwrap();

        assert!(!outcome.analytics_recorded);
        assert_eq!(host.windows().await, vec!["/restaurant/7"]);
    }

    struct NoWindows;

    #[async_trait]
    impl NotificationHost for NoWindows {
        async fn show_notification(&self, _n: Notification) -> crate::Result<DisplayedNotification> {
            Err(Error::Host("unsupported".to_string()))
        }

        async fn close_notification(&self, _id: &str) -> crate::Result<()> {
            Err(Error::Host("already gone".to_string()))
        }

        async fn open_window(&self, _url: &str) -> crate::Result<()> {
            Err(Error::Host("no window".to_string()))
        }
    }

    #[tokio::test]
    async fn test_window_failure_still_records_analytics() {
        let api = Arc::new(MockApi::new());
        let router = InteractionRouter::new(
            Arc::new(NoWindows),
            api.clone(),
            NotificationsConfig::default().map_search_url,
        );
        let placeholder = InMemoryHost::new();
        let shown = show(&placeholder, NotificationData::default(), "x").await;

        let err = router
            .handle_click(NotificationClick {
                notification: shown,
                action: None,
            })
            .await
            .unwrap_err();

        assert!(matches!(err, Error::Host(_)));
        assert_eq!(api.clicks.lock().unwrap().len(), 1);
    }

    #[tokio::test]
    async fn test_close_records_tag() {
        let host = Arc::new(InMemoryHost::new());
        let api = Arc::new(MockApi::new());
        let shown = show(&host, NotificationData::default(), "weekly_announcement").await;

        router(host, api.clone())
            .handle_close(NotificationClose { notification: shown })
            .await
            .unwrap();

        let dismissals = api.dismissals.lock().unwrap();
        assert_eq!(dismissals.len(), 1);
        assert_eq!(dismissals[0].tag, "weekly_announcement");
    }

    #[tokio::test]
    async fn test_close_analytics_failure_is_swallowed() {
        let host = Arc::new(InMemoryHost::new());
        let api = Arc::new(MockApi::failing());
        let shown = show(&host, NotificationData::default(), "t").await;

        assert!(router(host, api)
            .handle_close(NotificationClose { notification: shown })
            .await
            .is_ok());
    }
}
