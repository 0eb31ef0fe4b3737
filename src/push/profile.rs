//! Notification kinds and their presentation profiles

use serde::Serialize;

const WEEKLY_ANNOUNCEMENT_VIBRATION: &[u32] = &[200, 100, 200];
const RSVP_REMINDER_VIBRATION: &[u32] = &[300, 100, 300, 100, 300];
const BASE_VIBRATION: &[u32] = &[100, 50, 100];

/// Notification class, parsed from the payload's `data.type`
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum NotificationKind {
    WeeklyAnnouncement,
    RsvpReminder,
    FriendActivity,
    /// Unknown or absent type
    Other,
}

impl NotificationKind {
    /// Classify a `data.type` value
    pub fn from_type(kind: Option<&str>) -> Self {
        match kind {
            Some("weekly_announcement") => Self::WeeklyAnnouncement,
            Some("rsvp_reminder") => Self::RsvpReminder,
            Some("friend_activity") => Self::FriendActivity,
            _ => Self::Other,
        }
    }

    /// Wire name for the known kinds
    pub fn as_str(&self) -> Option<&'static str> {
        match self {
            Self::WeeklyAnnouncement => Some("weekly_announcement"),
            Self::RsvpReminder => Some("rsvp_reminder"),
            Self::FriendActivity => Some("friend_activity"),
            Self::Other => None,
        }
    }

    /// Presentation for this kind. `requested` is the payload's own
    /// `requireInteraction`, honoured only by the base profile.
    pub fn presentation(&self, requested: Option<bool>) -> (&'static [u32], bool) {
        match self {
            Self::WeeklyAnnouncement => (WEEKLY_ANNOUNCEMENT_VIBRATION, false),
            Self::RsvpReminder => (RSVP_REMINDER_VIBRATION, true),
            Self::FriendActivity => (BASE_VIBRATION, false),
            Self::Other => (BASE_VIBRATION, requested.unwrap_or(false)),
        }
    }
}

/// Type-specific presentation parameters for one notification
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct NotificationProfile {
    pub vibrate: Vec<u32>,
    pub require_interaction: bool,
    pub tag: String,
}

impl NotificationProfile {
    /// Build the profile for a payload's `data.type` and `requireInteraction`.
    ///
    /// The tag is the raw type when present so same-type notifications
    /// replace each other instead of stacking.
    pub fn resolve(kind: Option<&str>, requested: Option<bool>, default_tag: &str) -> Self {
        let (vibrate, require_interaction) =
            NotificationKind::from_type(kind).presentation(requested);
        Self {
            vibrate: vibrate.to_vec(),
            require_interaction,
            tag: kind.unwrap_or(default_tag).to_string(),
        }
    }
}
