//! Push payload wire types
//!
//! All types use camelCase JSON serialization to match what the server sends.

use crate::error::{Error, Result};
use serde::{Deserialize, Deserializer, Serialize};

/// Inbound push message
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PushPayload {
    pub title: Option<String>,
    pub body: Option<String>,
    pub icon: Option<String>,
    pub badge: Option<String>,
    pub require_interaction: Option<bool>,
    #[serde(default, deserialize_with = "null_as_default")]
    pub data: NotificationData,
    #[serde(default, deserialize_with = "null_as_default")]
    pub actions: Vec<NotificationAction>,
}

impl PushPayload {
    /// Decode a raw payload. Empty or whitespace-only input means "no payload".
    pub fn decode(raw: &[u8]) -> Result<Option<Self>> {
        if raw.iter().all(u8::is_ascii_whitespace) {
            return Ok(None);
        }
        serde_json::from_slice(raw)
            .map(Some)
            .map_err(|e| Error::Payload(format!("invalid push payload: {}", e)))
    }
}

/// Contextual data attached to a notification and handed back on click
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NotificationData {
    #[serde(rename = "type", skip_serializing_if = "Option::is_none")]
    pub kind: Option<String>,
    #[serde(
        default,
        deserialize_with = "string_or_number",
        skip_serializing_if = "Option::is_none"
    )]
    pub restaurant_id: Option<String>,
    #[serde(
        default,
        deserialize_with = "string_or_number",
        skip_serializing_if = "Option::is_none"
    )]
    pub rsvp_id: Option<String>,
    #[serde(
        default,
        deserialize_with = "string_or_number",
        skip_serializing_if = "Option::is_none"
    )]
    pub notification_id: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub address: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub action: Option<String>,
    /// Fields the agent does not interpret, kept so they reach the host intact
    #[serde(flatten)]
    pub extra: serde_json::Map<String, serde_json::Value>,
}

/// A button offered on the notification
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NotificationAction {
    pub action: String,
    pub title: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub icon: Option<String>,
}

fn null_as_default<'de, D, T>(deserializer: D) -> std::result::Result<T, D::Error>
where
    D: Deserializer<'de>,
    T: Default + Deserialize<'de>,
{
    Ok(Option::<T>::deserialize(deserializer)?.unwrap_or_default())
}

/// Identifiers arrive as strings or as bare numbers depending on the sender
fn string_or_number<'de, D>(deserializer: D) -> std::result::Result<Option<String>, D::Error>
where
    D: Deserializer<'de>,
{
    match Option::<serde_json::Value>::deserialize(deserializer)? {
        None | Some(serde_json::Value::Null) => Ok(None),
        Some(serde_json::Value::String(s)) => Ok(Some(s)),
        Some(serde_json::Value::Number(n)) => Ok(Some(n.to_string())),
        Some(other) => Err(serde::de::Error::custom(format!(
            "expected string or number identifier, got {}",
            other
        ))),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_decode_full_payload() {
        let raw = br#"{
            "title": "Your table is booked",
            "body": "Friday 7pm at Olamaie",
            "icon": "/img/olamaie.png",
            "data": {
                "type": "rsvp_reminder",
                "restaurantId": 42,
                "rsvpId": "r-9",
                "notificationId": "n-1",
                "cuisine": "southern"
            },
            "actions": [
                {"action": "details", "title": "View details"},
                {"action": "cancel", "title": "Cancel RSVP"}
            ]
        }"#;

        let payload = PushPayload::decode(raw).unwrap().unwrap();
        assert_eq!(payload.title.as_deref(), Some("Your table is booked"));
        assert_eq!(payload.badge, None);
        assert_eq!(payload.data.kind.as_deref(), Some("rsvp_reminder"));
        assert_eq!(payload.data.restaurant_id.as_deref(), Some("42"));
        assert_eq!(payload.data.rsvp_id.as_deref(), Some("r-9"));
        assert_eq!(payload.data.extra["cuisine"], "southern");
        assert_eq!(payload.actions.len(), 2);
        assert_eq!(payload.actions[1].action, "cancel");
    }

    #[test]
    fn test_decode_empty_is_none() {
        assert_eq!(PushPayload::decode(b"").unwrap(), None);
        assert_eq!(PushPayload::decode(b"  \n").unwrap(), None);
    }

    #[test]
    fn test_decode_malformed_is_error() {
        assert!(matches!(
            PushPayload::decode(b"not json"),
            Err(Error::Payload(_))
        ));
        assert!(PushPayload::decode(b"\"just a string\"").is_err());
    }

    #[test]
    fn test_decode_minimal_and_null_fields() {
        let payload = PushPayload::decode(br#"{"data": null, "actions": null}"#)
            .unwrap()
            .unwrap();
        assert_eq!(payload, PushPayload::default());

        let payload = PushPayload::decode(br#"{"data": {"type": "rsvp_reminder"}}"#)
            .unwrap()
            .unwrap();
        assert_eq!(payload.title, None);
        assert_eq!(payload.require_interaction, None);
        assert_eq!(payload.data.kind.as_deref(), Some("rsvp_reminder"));
    }

    #[test]
    fn test_identifier_rejects_objects() {
        assert!(PushPayload::decode(br#"{"data": {"rsvpId": {"id": 1}}}"#).is_err());
    }

    #[test]
    fn test_data_serializes_camel_case() {
        let data = NotificationData {
            kind: Some("friend_activity".to_string()),
            notification_id: Some("n-7".to_string()),
            ..Default::default()
        };
        let json = serde_json::to_value(&data).unwrap();
        assert_eq!(json["type"], "friend_activity");
        assert_eq!(json["notificationId"], "n-7");
        assert!(json.get("restaurantId").is_none());
    }
}
