//! Supper Club Agent - notification and offline cache agent
//!
//! A background agent for the Supper Club web application. It pre-populates a
//! versioned resource cache, answers resource fetches cache-first, turns push
//! payloads into categorized notifications, routes notification clicks into
//! the application while reporting engagement, and relays retry signals for
//! failed notification sends.
//!
//! ## Architecture
//!
//! ```text
//! ┌───────────────────────────────────────────────────────────────┐
//! │                     Host (platform / bridge)                   │
//! │  install · activate · fetch · push · click · close · sync      │
//! └──────────────────────────────┬────────────────────────────────┘
//!                                │ EventHandle per event
//! ┌──────────────────────────────▼────────────────────────────────┐
//! │                            Agent                               │
//! │  ┌───────────┐ ┌─────────────┐ ┌──────────┐ ┌──────────────┐  │
//! │  │ Lifecycle │ │ Interceptor │ │   Push   │ │ Interaction  │  │
//! │  └─────┬─────┘ └──────┬──────┘ └────┬─────┘ └──────┬───────┘  │
//! │        └──────┬───────┘             │              │          │
//! │        ┌──────▼──────┐       ┌──────▼──────────────▼───────┐  │
//! │        │ Cache Store │       │  NotificationHost · API     │  │
//! │        └─────────────┘       └─────────────────────────────┘  │
//! └───────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Modules
//!
//! - [`agent`]: Event dispatch and lifetime tracking
//! - [`lifecycle`]: Install and activate phases
//! - [`cache`]: Namespaced resource cache
//! - [`interceptor`]: Cache-first fetch policy
//! - [`push`]: Push payloads and notification presentation
//! - [`interaction`]: Click routing and engagement analytics
//! - [`retry`]: Background retry of failed sends
//! - [`bridge`]: HTTP surface for hosts
//! - [`config`]: Configuration management

pub mod agent;
pub mod analytics;
pub mod bridge;
pub mod cache;
pub mod config;
pub mod error;
pub mod host;
pub mod interaction;
pub mod interceptor;
pub mod lifecycle;
pub mod network;
pub mod push;
pub mod retry;

#[cfg(test)]
mod testing;

pub use agent::{Agent, AgentBuilder, AgentEvent, EventHandle, EventOutcome};
pub use config::AgentConfig;
pub use error::{Error, Result};
