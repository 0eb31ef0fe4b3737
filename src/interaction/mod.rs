//! Interaction module - clicks and dismissals on displayed notifications
//!
//! Routing is a pure decision table ([`ActionRoute`]); the router adds the
//! side effects (window navigation and fire-and-forget analytics).

mod route;
mod router;

pub use route::{encode_component, resolve_url, ActionRoute};
pub use router::{
    ClickOutcome, InteractionRouter, NotificationClick, NotificationClose, DEFAULT_ACTION,
};
