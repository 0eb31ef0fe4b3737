//! Host platform abstraction - notification display and window navigation

use crate::error::Result;
use crate::push::{NotificationAction, NotificationData};
use async_trait::async_trait;
use serde::Serialize;
use tokio::sync::RwLock;

/// A notification ready to be displayed
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Notification {
    pub title: String,
    pub body: String,
    pub icon: String,
    pub badge: String,
    pub vibrate: Vec<u32>,
    pub require_interaction: bool,
    pub tag: String,
    pub data: NotificationData,
    pub actions: Vec<NotificationAction>,
}

/// A notification the host has on screen
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct DisplayedNotification {
    pub id: String,
    #[serde(flatten)]
    pub notification: Notification,
}

/// Services the hosting platform provides to the agent
#[async_trait]
pub trait NotificationHost: Send + Sync {
    /// Display a notification. One with the same tag is replaced.
    async fn show_notification(&self, notification: Notification) -> Result<DisplayedNotification>;

    /// Close a displayed notification
    async fn close_notification(&self, id: &str) -> Result<()>;

    /// Open a window at the URL, or focus one already showing it
    async fn open_window(&self, url: &str) -> Result<()>;
}

/// Host that keeps notifications and windows in memory.
///
/// Used by the host bridge to expose state over HTTP.
#[derive(Default)]
pub struct InMemoryHost {
    notifications: RwLock<Vec<DisplayedNotification>>,
    windows: RwLock<Vec<String>>,
}

impl InMemoryHost {
    /// Create an empty host
    pub fn new() -> Self {
        Self::default()
    }

    /// Notifications currently displayed, oldest first
    pub async fn notifications(&self) -> Vec<DisplayedNotification> {
        self.notifications.read().await.clone()
    }

    /// Look up a displayed notification
    pub async fn notification(&self, id: &str) -> Option<DisplayedNotification> {
        self.notifications
            .read()
            .await
            .iter()
            .find(|n| n.id == id)
            .cloned()
    }

    /// URLs of open windows, in the order they were opened
    pub async fn windows(&self) -> Vec<String> {
        self.windows.read().await.clone()
    }
}

#[async_trait]
impl NotificationHost for InMemoryHost {
    async fn show_notification(&self, notification: Notification) -> Result<DisplayedNotification> {
        let displayed = DisplayedNotification {
            id: format!("ntf-{}", uuid::Uuid::new_v4()),
            notification,
        };

        let mut notifications = self.notifications.write().await;
        let before = notifications.len();
        notifications.retain(|n| n.notification.tag != displayed.notification.tag);
        if notifications.len() != before {
            tracing::debug!(tag = %displayed.notification.tag, "Replacing notification with same tag");
        }
        notifications.push(displayed.clone());

        tracing::info!(
            id = %displayed.id,
            tag = %displayed.notification.tag,
            title = %displayed.notification.title,
            "Notification displayed"
        );
        Ok(displayed)
    }

    async fn close_notification(&self, id: &str) -> Result<()> {
        self.notifications.write().await.retain(|n| n.id != id);
        Ok(())
    }

    async fn open_window(&self, url: &str) -> Result<()> {
        let mut windows = self.windows.write().await;
        if windows.iter().any(|w| w == url) {
            tracing::info!(url, "Focusing existing window");
        } else {
            tracing::info!(url, "Opening window");
            windows.push(url.to_string());
        }
        Ok(())
    }
}
