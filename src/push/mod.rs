//! Push module - inbound push payloads and notification presentation
//!
//! The handler decodes a payload, classifies it by `data.type`, applies the
//! matching presentation profile and asks the host to display it.

mod handler;
mod payload;
mod profile;

pub use handler::{PushHandler, PushOutcome};
pub use payload::{NotificationAction, NotificationData, PushPayload};
pub use profile::{NotificationKind, NotificationProfile};
