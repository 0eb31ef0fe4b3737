//! Agent facade - one handler per event kind, each behind a tracked handle
//!
//! The host delivers events with [`Agent::dispatch`] and keeps the returned
//! [`EventHandle`] until it settles. [`Agent::drain`] waits for every handler
//! still in flight, so the host knows when the agent may be reclaimed.

use crate::analytics::{HttpNotificationsApi, NotificationsApi};
use crate::cache::{CacheStore, FetchRequest};
use crate::config::AgentConfig;
use crate::error::{Error, Result};
use crate::host::{InMemoryHost, NotificationHost};
use crate::interaction::{ClickOutcome, InteractionRouter, NotificationClick, NotificationClose};
use crate::interceptor::{FetchOutcome, RequestInterceptor};
use crate::lifecycle::{ActivationReport, InstallReport, LifecycleManager, LifecyclePhase};
use crate::network::{HttpNetwork, Network};
use crate::push::{PushHandler, PushOutcome};
use crate::retry::{BackgroundRetryTask, SyncOutcome};
use bytes::Bytes;
use serde::Serialize;
use std::sync::Arc;
use tokio::task::JoinHandle;
use tokio_util::task::TaskTracker;

/// An event delivered by the host
#[derive(Debug, Clone)]
pub enum AgentEvent {
    Install,
    Activate,
    Fetch(FetchRequest),
    /// Raw push payload, `None` when the push carried no data
    Push(Option<Bytes>),
    NotificationClick(NotificationClick),
    NotificationClose(NotificationClose),
    /// Host retry signal with its tag
    Sync(String),
}

impl AgentEvent {
    /// Event kind name, for logging
    pub fn name(&self) -> &'static str {
        match self {
            Self::Install => "install",
            Self::Activate => "activate",
            Self::Fetch(_) => "fetch",
            Self::Push(_) => "push",
            Self::NotificationClick(_) => "notificationclick",
            Self::NotificationClose(_) => "notificationclose",
            Self::Sync(_) => "sync",
        }
    }
}

/// Result of a settled event handler
#[derive(Debug, Clone)]
pub enum EventOutcome {
    Installed(InstallReport),
    Activated(ActivationReport),
    Fetched(FetchOutcome),
    Pushed(PushOutcome),
    Clicked(ClickOutcome),
    Closed,
    Synced(SyncOutcome),
}

/// Lease on an in-flight event handler.
///
/// The handler keeps running if the handle is dropped; the agent still counts
/// it as pending until it finishes.
pub struct EventHandle {
    event: &'static str,
    task: JoinHandle<Result<EventOutcome>>,
}

impl EventHandle {
    /// Event kind this handle belongs to
    pub fn event(&self) -> &'static str {
        self.event
    }

    /// Whether the handler has finished
    pub fn is_settled(&self) -> bool {
        self.task.is_finished()
    }

    /// Wait for the handler to settle
    pub async fn settled(self) -> Result<EventOutcome> {
        self.task
            .await
            .map_err(|e| Error::Internal(format!("{} handler did not complete: {}", self.event, e)))?
    }
}

/// Snapshot of agent state
#[derive(Debug, Clone, Serialize)]
pub struct AgentStatus {
    pub phase: LifecyclePhase,
    pub namespace: String,
    pub namespaces: Vec<String>,
    pub cached_entries: usize,
    pub pending_events: usize,
}

/// Components shared by every handler
struct AgentCore {
    lifecycle: LifecycleManager,
    interceptor: RequestInterceptor,
    push: PushHandler,
    router: InteractionRouter,
    retry: BackgroundRetryTask,
}

impl AgentCore {
    async fn handle(&self, event: AgentEvent) -> Result<EventOutcome> {
        match event {
            AgentEvent::Install => self.lifecycle.install().await.map(EventOutcome::Installed),
            AgentEvent::Activate => self.lifecycle.activate().await.map(EventOutcome::Activated),
            AgentEvent::Fetch(request) => self.fetch(request).await.map(EventOutcome::Fetched),
            AgentEvent::Push(raw) => self.push(raw).await.map(EventOutcome::Pushed),
            AgentEvent::NotificationClick(click) => {
                self.click(click).await.map(EventOutcome::Clicked)
            }
            AgentEvent::NotificationClose(close) => {
                self.close(close).await.map(|()| EventOutcome::Closed)
            }
            AgentEvent::Sync(tag) => self.sync(tag).await.map(EventOutcome::Synced),
        }
    }

    async fn fetch(&self, request: FetchRequest) -> Result<FetchOutcome> {
        self.lifecycle.ensure_active().await?;
        self.interceptor.handle(&request).await
    }

    async fn push(&self, raw: Option<Bytes>) -> Result<PushOutcome> {
        self.lifecycle.ensure_active().await?;
        self.push.handle(raw.as_deref()).await
    }

    async fn click(&self, click: NotificationClick) -> Result<ClickOutcome> {
        self.lifecycle.ensure_active().await?;
        self.router.handle_click(click).await
    }

    async fn close(&self, close: NotificationClose) -> Result<()> {
        self.lifecycle.ensure_active().await?;
        self.router.handle_close(close).await
    }

    async fn sync(&self, tag: String) -> Result<SyncOutcome> {
        self.lifecycle.ensure_active().await?;
        self.retry.handle_sync(&tag).await
    }
}

/// The notification and offline cache agent
pub struct Agent {
    config: AgentConfig,
    cache: Arc<CacheStore>,
    core: Arc<AgentCore>,
    tracker: TaskTracker,
}

impl Agent {
    /// Start building an agent
    pub fn builder() -> AgentBuilder {
        AgentBuilder::new()
    }

    /// Agent configuration
    pub fn config(&self) -> &AgentConfig {
        &self.config
    }

    /// Shared cache store
    pub fn cache(&self) -> &Arc<CacheStore> {
        &self.cache
    }

    /// Current lifecycle phase
    pub async fn phase(&self) -> LifecyclePhase {
        self.core.lifecycle.phase().await
    }

    /// Spawn the handler for an event and return its lease
    pub fn dispatch(&self, event: AgentEvent) -> EventHandle {
        let name = event.name();
        let core = self.core.clone();
        tracing::debug!(event = name, "Dispatching event");

        let task = self.tracker.spawn(async move {
            let result = core.handle(event).await;
            if let Err(e) = &result {
                tracing::warn!(event = name, error = %e, "Event handler failed");
            }
            result
        });

        EventHandle { event: name, task }
    }

    /// Dispatch an event and wait for it to settle
    pub async fn handle(&self, event: AgentEvent) -> Result<EventOutcome> {
        self.dispatch(event).settled().await
    }

    /// Number of handlers still in flight
    pub fn pending(&self) -> usize {
        self.tracker.len()
    }

    /// Wait until every in-flight handler has settled
    pub async fn drain(&self) {
        self.tracker.close();
        self.tracker.wait().await;
        self.tracker.reopen();
    }

    /// Current state snapshot
    pub async fn status(&self) -> AgentStatus {
        let namespace = self.config.cache.namespace.clone();
        AgentStatus {
            phase: self.phase().await,
            namespaces: self.cache.namespaces().await,
            cached_entries: self.cache.len(&namespace).await,
            namespace,
            pending_events: self.pending(),
        }
    }

    // =========================================================================
    // Typed entry points (tracked, run on the caller's task)
    // =========================================================================

    /// Pre-populate the current namespace
    pub async fn install(&self) -> Result<InstallReport> {
        self.tracker.track_future(self.core.lifecycle.install()).await
    }

    /// Prune stale namespaces and become active
    pub async fn activate(&self) -> Result<ActivationReport> {
        self.tracker.track_future(self.core.lifecycle.activate()).await
    }

    /// Install then activate
    pub async fn bootstrap(&self) -> Result<ActivationReport> {
        self.install().await?;
        self.activate().await
    }

    /// Handle a resource fetch
    pub async fn fetch(&self, request: FetchRequest) -> Result<FetchOutcome> {
        self.tracker.track_future(self.core.fetch(request)).await
    }

    /// Handle a push event
    pub async fn push(&self, raw: Option<Bytes>) -> Result<PushOutcome> {
        self.tracker.track_future(self.core.push(raw)).await
    }

    /// Handle a notification click
    pub async fn click(&self, click: NotificationClick) -> Result<ClickOutcome> {
        self.tracker.track_future(self.core.click(click)).await
    }

    /// Handle a notification dismissal
    pub async fn close(&self, close: NotificationClose) -> Result<()> {
        self.tracker.track_future(self.core.close(close)).await
    }

    /// Handle a host retry signal
    pub async fn sync(&self, tag: impl Into<String>) -> Result<SyncOutcome> {
        self.tracker.track_future(self.core.sync(tag.into())).await
    }
}

/// Builder for [`Agent`]; collaborators not supplied fall back to the
/// HTTP implementations and an in-memory cache and host
pub struct AgentBuilder {
    config: AgentConfig,
    cache: Option<Arc<CacheStore>>,
    network: Option<Arc<dyn Network>>,
    host: Option<Arc<dyn NotificationHost>>,
    api: Option<Arc<dyn NotificationsApi>>,
}

impl AgentBuilder {
    /// Create a new builder with default config
    pub fn new() -> Self {
        Self {
            config: AgentConfig::default(),
            cache: None,
            network: None,
            host: None,
            api: None,
        }
    }

    /// Set the configuration
    pub fn config(mut self, config: AgentConfig) -> Self {
        self.config = config;
        self
    }

    /// Set the current cache namespace
    pub fn namespace(mut self, namespace: impl Into<String>) -> Self {
        self.config.cache.namespace = namespace.into();
        self
    }

    /// Use an existing cache store
    pub fn cache(mut self, cache: Arc<CacheStore>) -> Self {
        self.cache = Some(cache);
        self
    }

    /// Use a custom network
    pub fn network(mut self, network: Arc<dyn Network>) -> Self {
        self.network = Some(network);
        self
    }

    /// Use a custom host
    pub fn host(mut self, host: Arc<dyn NotificationHost>) -> Self {
        self.host = Some(host);
        self
    }

    /// Use a custom notifications API
    pub fn api(mut self, api: Arc<dyn NotificationsApi>) -> Self {
        self.api = Some(api);
        self
    }

    /// Build the agent in the `installing` phase
    pub fn build(self) -> Result<Agent> {
        self.config.validate()?;
        let config = self.config;

        let cache = self
            .cache
            .unwrap_or_else(|| Arc::new(CacheStore::in_memory()));
        let network: Arc<dyn Network> = match self.network {
            Some(network) => network,
            None => Arc::new(HttpNetwork::new(&config.origin.base_url)?),
        };
        let host: Arc<dyn NotificationHost> = match self.host {
            Some(host) => host,
            None => Arc::new(InMemoryHost::new()),
        };
        let api: Arc<dyn NotificationsApi> = match self.api {
            Some(api) => api,
            None => Arc::new(HttpNotificationsApi::new(config.api.clone())?),
        };

        let core = AgentCore {
            lifecycle: LifecycleManager::new(
                config.cache.namespace.clone(),
                config.cache.manifest.clone(),
                cache.clone(),
                network.clone(),
            ),
            interceptor: RequestInterceptor::new(cache.clone(), network),
            push: PushHandler::new(host.clone(), config.notifications.clone()),
            router: InteractionRouter::new(
                host,
                api.clone(),
                config.notifications.map_search_url.clone(),
            ),
            retry: BackgroundRetryTask::new(api, config.retry.sync_tag.clone()),
        };

        Ok(Agent {
            config,
            cache,
            core: Arc::new(core),
            tracker: TaskTracker::new(),
        })
    }
}

impl Default for AgentBuilder {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::default_manifest;
    use crate::interceptor::FetchSource;
    use crate::testing::{MockApi, MockNetwork};
    use std::sync::atomic::Ordering;

    struct Fixture {
        agent: Agent,
        host: Arc<InMemoryHost>,
        api: Arc<MockApi>,
        network: Arc<MockNetwork>,
    }

    fn fixture(namespace: &str, cache: Arc<CacheStore>) -> Fixture {
        let host = Arc::new(InMemoryHost::new());
        let api = Arc::new(MockApi::new());
        let network = Arc::new(
            MockNetwork::serving(&default_manifest()).with("/api/restaurants", 200, "[]"),
        );
        let agent = Agent::builder()
            .namespace(namespace)
            .cache(cache)
            .network(network.clone())
            .host(host.clone())
            .api(api.clone())
            .build()
            .unwrap();
        Fixture {
            agent,
            host,
            api,
            network,
        }
    }

    #[tokio::test]
    async fn test_events_rejected_before_active() {
        let f = fixture("v1", Arc::new(CacheStore::in_memory()));

        let err = f.agent.fetch(FetchRequest::get("/")).await.unwrap_err();
        assert!(matches!(err, Error::Lifecycle(_)));
        assert!(f.agent.push(None).await.is_err());
        assert!(f.agent.sync("retry-failed-notifications").await.is_err());

        f.agent.install().await.unwrap();
        assert!(matches!(
            f.agent.fetch(FetchRequest::get("/")).await,
            Err(Error::Lifecycle(_))
        ));
    }

    #[tokio::test]
    async fn test_cache_first_after_bootstrap() {
        let f = fixture("v1", Arc::new(CacheStore::in_memory()));
        f.agent.bootstrap().await.unwrap();
        let installs = f.network.calls();

        let hit = f.agent.fetch(FetchRequest::get("/static/js/bundle.js")).await.unwrap();
        assert_eq!(hit.source, FetchSource::Cache);
        assert_eq!(f.network.calls(), installs);

        let miss = f.agent.fetch(FetchRequest::get("/api/restaurants")).await.unwrap();
        assert_eq!(miss.source, FetchSource::Network);
        assert_eq!(miss.response.body, "[]");
        assert_eq!(f.network.calls(), installs + 1);
    }

    #[tokio::test]
    async fn test_push_then_click_flow() {
        let f = fixture("v1", Arc::new(CacheStore::in_memory()));
        f.agent.bootstrap().await.unwrap();

        let raw = Bytes::from_static(
            br#"{"title":"Tonight","data":{"type":"rsvp_reminder","restaurantId":"12","notificationId":"n-3"}}"#,
        );
        let outcome = f.agent.push(Some(raw)).await.unwrap();
        let PushOutcome::Displayed { id, tag } = outcome else {
            panic!("expected a displayed notification");
        };
        assert_eq!(tag, "rsvp_reminder");

        let shown = f.host.notification(&id).await.unwrap();
        assert!(shown.notification.require_interaction);

        let clicked = f
            .agent
            .click(NotificationClick {
                notification: shown,
                action: Some("rsvp".to_string()),
            })
            .await
            .unwrap();
        assert_eq!(clicked.url, "/restaurant/12");
        assert_eq!(f.host.windows().await, vec!["/restaurant/12"]);
        assert_eq!(
            f.api.clicks.lock().unwrap()[0].notification_id.as_deref(),
            Some("n-3")
        );
    }

    #[tokio::test]
    async fn test_dispatch_returns_settling_handles() {
        let f = fixture("v1", Arc::new(CacheStore::in_memory()));
        assert!(matches!(
            f.agent.handle(AgentEvent::Install).await.unwrap(),
            EventOutcome::Installed(_)
        ));
        assert!(matches!(
            f.agent.handle(AgentEvent::Activate).await.unwrap(),
            EventOutcome::Activated(_)
        ));

        let handles: Vec<EventHandle> = (0..8)
            .map(|i| {
                let event = if i % 2 == 0 {
                    AgentEvent::Fetch(FetchRequest::get("/"))
                } else {
                    AgentEvent::Push(Some(Bytes::from_static(
                        br#"{"data":{"type":"friend_activity"}}"#,
                    )))
                };
                f.agent.dispatch(event)
            })
            .collect();

        assert_eq!(handles[0].event(), "fetch");
        assert_eq!(handles[1].event(), "push");
        for handle in handles {
            handle.settled().await.unwrap();
        }

        // Four friend_activity pushes coalesce under one tag
        assert_eq!(f.host.notifications().await.len(), 1);
        assert_eq!(f.agent.pending(), 0);
    }

    #[tokio::test]
    async fn test_drain_waits_for_dropped_handles() {
        let f = fixture("v1", Arc::new(CacheStore::in_memory()));
        f.agent.bootstrap().await.unwrap();

        for _ in 0..4 {
            drop(f.agent.dispatch(AgentEvent::Sync(
                "retry-failed-notifications".to_string(),
            )));
        }
        f.agent.drain().await;

        assert_eq!(f.agent.pending(), 0);
        assert_eq!(f.api.retries.load(Ordering::SeqCst), 4);

        // Still usable after draining
        assert_eq!(
            f.agent.sync("something-else").await.unwrap(),
            SyncOutcome::Ignored
        );
    }

    #[tokio::test]
    async fn test_failed_handler_settles_with_error() {
        let f = fixture("v1", Arc::new(CacheStore::in_memory()));
        let handle = f.agent.dispatch(AgentEvent::Activate);
        assert!(matches!(handle.settled().await, Err(Error::Lifecycle(_))));
    }

    #[tokio::test]
    async fn test_version_upgrade_prunes_old_namespace() {
        let cache = Arc::new(CacheStore::in_memory());

        let v1 = fixture("v1", cache.clone());
        v1.agent.bootstrap().await.unwrap();
        assert_eq!(cache.namespaces().await, vec!["v1"]);

        let v2 = fixture("v2", cache.clone());
        v2.agent.install().await.unwrap();
        let report = v2.agent.activate().await.unwrap();

        assert_eq!(report.removed, vec!["v1"]);
        assert!(cache.keys("v1").await.is_empty());
        assert_eq!(cache.keys("v2").await.len(), 5);

        let status = v2.agent.status().await;
        assert_eq!(status.phase, LifecyclePhase::Active);
        assert_eq!(status.namespaces, vec!["v2"]);
        assert_eq!(status.cached_entries, 5);
    }

    #[test]
    fn test_build_rejects_invalid_namespace() {
        let result = Agent::builder()
            .namespace("bad/namespace")
            .network(Arc::new(MockNetwork::new()))
            .api(Arc::new(MockApi::new()))
            .build();
        assert!(matches!(result, Err(Error::Config(_))));
    }

    #[test]
    fn test_build_with_http_defaults() {
        let agent = Agent::builder().build().unwrap();
        assert_eq!(agent.config().cache.namespace, "supperclub-v1");
        assert_eq!(agent.pending(), 0);
    }
}
