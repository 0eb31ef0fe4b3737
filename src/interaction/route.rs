//! Action routes - where a notification click navigates to

use crate::push::NotificationData;
use percent_encoding::{utf8_percent_encode, AsciiSet, NON_ALPHANUMERIC};

/// Characters left unescaped, matching JavaScript's `encodeURIComponent`
const COMPONENT: &AsciiSet = &NON_ALPHANUMERIC
    .remove(b'-')
    .remove(b'_')
    .remove(b'.')
    .remove(b'!')
    .remove(b'~')
    .remove(b'*')
    .remove(b'\'')
    .remove(b'(')
    .remove(b')');

/// Percent-encode a single URL component
pub fn encode_component(value: &str) -> String {
    utf8_percent_encode(value, COMPONENT).to_string()
}

/// Navigation target for a notification interaction
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ActionRoute {
    Restaurant(String),
    Directions(String),
    CancelRsvp(String),
    VerifyVisit(String),
    Friends,
    Home,
}

impl ActionRoute {
    /// Resolve the route for a chosen action (`None` when the body was clicked).
    ///
    /// Rules are checked top to bottom and the first match wins. A rule whose
    /// identifier is missing from `data` does not match.
    pub fn resolve(action: Option<&str>, data: &NotificationData) -> Self {
        let restaurant = data.restaurant_id.as_deref();

        if matches!(action, Some("rsvp") | Some("details"))
            || data.action.as_deref() == Some("view_restaurant")
        {
            if let Some(id) = restaurant {
                return Self::Restaurant(id.to_string());
            }
        }

        if action == Some("directions") {
            if let Some(address) = data.address.as_deref() {
                return Self::Directions(address.to_string());
            }
        }

        if action == Some("cancel") {
            if let Some(rsvp) = data.rsvp_id.as_deref() {
                return Self::CancelRsvp(rsvp.to_string());
            }
        }

        if action == Some("verify") {
            if let Some(id) = restaurant {
                return Self::VerifyVisit(id.to_string());
            }
        }

        match data.kind.as_deref() {
            Some("friend_activity") => Self::Friends,
            _ => Self::Home,
        }
    }

    /// Render the route as a URL; directions use the map search prefix
    pub fn to_url(&self, map_search_url: &str) -> String {
        match self {
            Self::Restaurant(id) => format!("/restaurant/{}", encode_component(id)),
            Self::Directions(address) => {
                format!("{}{}", map_search_url, encode_component(address))
            }
            Self::CancelRsvp(id) => format!("/profile?cancel_rsvp={}", encode_component(id)),
            Self::VerifyVisit(id) => {
                format!("/verify-visit?restaurant={}", encode_component(id))
            }
            Self::Friends => "/friends".to_string(),
            Self::Home => "/".to_string(),
        }
    }
}

/// Resolve the navigation URL for an action and notification data
pub fn resolve_url(action: Option<&str>, data: &NotificationData, map_search_url: &str) -> String {
    ActionRoute::resolve(action, data).to_url(map_search_url)
}
