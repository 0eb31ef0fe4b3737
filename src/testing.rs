//! Mock collaborators shared by unit tests

use crate::analytics::{ClickEvent, DismissEvent, NotificationsApi};
use crate::cache::{FetchRequest, ResourceResponse};
use crate::error::{Error, Result};
use crate::network::Network;
use async_trait::async_trait;
use std::collections::{HashMap, HashSet};
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::Mutex;
use std::time::Duration;

/// Network serving fixed bodies; unknown paths fail like an unreachable host
#[derive(Default)]
pub struct MockNetwork {
    routes: HashMap<String, ResourceResponse>,
    failing: HashSet<String>,
    calls: AtomicUsize,
    requested: Mutex<Vec<String>>,
    delay: Option<Duration>,
}

impl MockNetwork {
    pub fn new() -> Self {
        Self::default()
    }

    /// Serve every path with a 200 whose body names the path
    pub fn serving(paths: &[String]) -> Self {
        let mut network = Self::new();
        for path in paths {
            network = network.with(path, 200, &format!("body of {}", path));
        }
        network
    }

    pub fn with(mut self, path: &str, status: u16, body: &str) -> Self {
        self.routes.insert(
            path.to_string(),
            ResourceResponse::new(status, vec![], body.to_string()),
        );
        self
    }

    pub fn failing(mut self, path: &str) -> Self {
        self.failing.insert(path.to_string());
        self
    }

    /// Answer every request only after `delay`
    pub fn delayed(mut self, delay: Duration) -> Self {
        self.delay = Some(delay);
        self
    }

    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }

    pub fn requested(&self) -> Vec<String> {
        self.requested.lock().unwrap().clone()
    }
}

#[async_trait]
impl Network for MockNetwork {
    async fn fetch(&self, request: &FetchRequest) -> Result<ResourceResponse> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        self.requested.lock().unwrap().push(request.url.clone());
        if let Some(delay) = self.delay {
            tokio::time::sleep(delay).await;
        }

        if self.failing.contains(&request.url) {
            return Err(Error::Network(format!("connection reset: {}", request.url)));
        }
        self.routes
            .get(&request.url)
            .cloned()
            .ok_or_else(|| Error::Network(format!("unreachable: {}", request.url)))
    }
}

/// Notifications API that records calls and can be told to fail
#[derive(Default)]
pub struct MockApi {
    pub clicks: Mutex<Vec<ClickEvent>>,
    pub dismissals: Mutex<Vec<DismissEvent>>,
    pub retries: AtomicUsize,
    fail: AtomicBool,
}

impl MockApi {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn failing() -> Self {
        let api = Self::default();
        api.fail.store(true, Ordering::SeqCst);
        api
    }

    fn check(&self) -> Result<()> {
        if self.fail.load(Ordering::SeqCst) {
            Err(Error::Api("503 Service Unavailable".to_string()))
        } else {
            Ok(())
        }
    }
}

#[async_trait]
impl NotificationsApi for MockApi {
    async fn record_click(&self, event: &ClickEvent) -> Result<()> {
        self.clicks.lock().unwrap().push(event.clone());
        self.check()
    }

    async fn record_dismiss(&self, event: &DismissEvent) -> Result<()> {
        self.dismissals.lock().unwrap().push(event.clone());
        self.check()
    }

    async fn retry_failed(&self) -> Result<()> {
        self.retries.fetch_add(1, Ordering::SeqCst);
        self.check()
    }
}
