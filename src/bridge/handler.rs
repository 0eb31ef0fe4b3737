//! HTTP handlers that turn bridge requests into agent events

use crate::agent::{Agent, AgentStatus};
use crate::cache::FetchRequest;
use crate::error::Error;
use crate::host::{InMemoryHost, NotificationHost};
use crate::interaction::{NotificationClick, NotificationClose};
use crate::interceptor::FetchSource;
use axum::{
    body::{Body, Bytes},
    extract::{Path, RawQuery, State},
    http::{HeaderName, HeaderValue, Method, StatusCode},
    response::{IntoResponse, Response},
    routing::{any, get, post},
    Json, Router,
};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tower_http::trace::TraceLayer;

/// Header naming where a bridged fetch was answered from
pub const SOURCE_HEADER: &str = "x-supperclub-source";

/// Shared bridge state
#[derive(Clone)]
pub struct BridgeState {
    pub agent: Arc<Agent>,
    /// The host the agent displays into; must be the one the agent was built with
    pub host: Arc<InMemoryHost>,
}

impl BridgeState {
    pub fn new(agent: Arc<Agent>, host: Arc<InMemoryHost>) -> Self {
        Self { agent, host }
    }
}

/// Create the bridge router
pub fn router(state: BridgeState) -> Router {
    Router::new()
        .route("/health", get(health_check))
        .route("/status", get(get_status))
        .route("/events/install", post(install))
        .route("/events/activate", post(activate))
        .route("/events/push", post(push))
        .route("/events/notificationclick", post(notification_click))
        .route("/events/notificationclose", post(notification_close))
        .route("/events/sync", post(sync))
        .route("/notifications", get(list_notifications))
        .route("/windows", get(list_windows))
        .route("/fetch", any(fetch_resource))
        .route("/fetch/*path", any(fetch_resource))
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

/// Map an agent error onto an HTTP response
fn error_response(error: Error) -> Response {
    let status = match &error {
        Error::Lifecycle(_) => StatusCode::CONFLICT,
        Error::Install(_) | Error::Network(_) | Error::Http(_) => StatusCode::BAD_GATEWAY,
        Error::Payload(_) => StatusCode::BAD_REQUEST,
        _ => StatusCode::INTERNAL_SERVER_ERROR,
    };
    (status, Json(serde_json::json!({ "error": error.to_string() }))).into_response()
}

fn not_found(what: &str) -> Response {
    (
        StatusCode::NOT_FOUND,
        Json(serde_json::json!({ "error": format!("{} not found", what) })),
    )
        .into_response()
}

fn respond<T: Serialize>(result: crate::Result<T>) -> Response {
    match result {
        Ok(value) => Json(value).into_response(),
        Err(e) => error_response(e),
    }
}

/// Health check response
#[derive(Debug, Serialize)]
struct HealthResponse {
    status: String,
    version: String,
}

async fn health_check() -> impl IntoResponse {
    Json(HealthResponse {
        status: "ok".to_string(),
        version: env!("CARGO_PKG_VERSION").to_string(),
    })
}

async fn get_status(State(state): State<BridgeState>) -> Json<AgentStatus> {
    Json(state.agent.status().await)
}

async fn install(State(state): State<BridgeState>) -> Response {
    respond(state.agent.install().await)
}

async fn activate(State(state): State<BridgeState>) -> Response {
    respond(state.agent.activate().await)
}

/// Raw push body; an empty body is a push without data
async fn push(State(state): State<BridgeState>, body: Bytes) -> Response {
    let raw = if body.is_empty() { None } else { Some(body) };
    respond(state.agent.push(raw).await)
}

/// Notification click request
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct ClickRequest {
    notification_id: String,
    #[serde(default)]
    action: Option<String>,
}

async fn notification_click(
    State(state): State<BridgeState>,
    Json(request): Json<ClickRequest>,
) -> Response {
    let Some(notification) = state.host.notification(&request.notification_id).await else {
        return not_found("notification");
    };
    // An empty action string is a click on the body
    let action = request.action.filter(|a| !a.is_empty());
    respond(
        state
            .agent
            .click(NotificationClick {
                notification,
                action,
            })
            .await,
    )
}

/// Notification close request
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct CloseRequest {
    notification_id: String,
}

async fn notification_close(
    State(state): State<BridgeState>,
    Json(request): Json<CloseRequest>,
) -> Response {
    let Some(notification) = state.host.notification(&request.notification_id).await else {
        return not_found("notification");
    };

    let id = notification.id.clone();
    if let Err(e) = state.agent.close(NotificationClose { notification }).await {
        return error_response(e);
    }

    // The user already dismissed it; mirror that once the dismissal is recorded
    match state.host.close_notification(&id).await {
        Ok(()) => StatusCode::NO_CONTENT.into_response(),
        Err(e) => error_response(e),
    }
}

/// Sync request
#[derive(Debug, Deserialize)]
struct SyncRequest {
    tag: String,
}

#[derive(Debug, Serialize)]
struct SyncResponse {
    tag: String,
    outcome: crate::retry::SyncOutcome,
}

async fn sync(State(state): State<BridgeState>, Json(request): Json<SyncRequest>) -> Response {
    match state.agent.sync(request.tag.clone()).await {
        Ok(outcome) => Json(SyncResponse {
            tag: request.tag,
            outcome,
        })
        .into_response(),
        Err(e) => error_response(e),
    }
}

async fn list_notifications(State(state): State<BridgeState>) -> impl IntoResponse {
    Json(state.host.notifications().await)
}

async fn list_windows(State(state): State<BridgeState>) -> impl IntoResponse {
    Json(state.host.windows().await)
}

/// Pass a resource fetch through the agent's interceptor
async fn fetch_resource(
    State(state): State<BridgeState>,
    method: Method,
    path: Option<Path<String>>,
    RawQuery(query): RawQuery,
) -> Response {
    let mut url = format!("/{}", path.map(|Path(p)| p).unwrap_or_default());
    if let Some(query) = query {
        url.push('?');
        url.push_str(&query);
    }

    let outcome = match state.agent.fetch(FetchRequest::new(method.as_str(), url)).await {
        Ok(outcome) => outcome,
        Err(e) => return error_response(e),
    };

    let source = match outcome.source {
        FetchSource::Cache => "cache",
        FetchSource::Network => "network",
    };
    let status = StatusCode::from_u16(outcome.response.status).unwrap_or(StatusCode::BAD_GATEWAY);

    let mut response = Response::new(Body::from(outcome.response.body));
    *response.status_mut() = status;
    let headers = response.headers_mut();
    for (name, value) in &outcome.response.headers {
        match (
            HeaderName::from_bytes(name.as_bytes()),
            HeaderValue::from_str(value),
        ) {
            (Ok(name), Ok(value)) => {
                headers.append(name, value);
            }
            _ => tracing::debug!(header = %name, "Dropping unrepresentable header"),
        }
    }
    headers.insert(SOURCE_HEADER, HeaderValue::from_static(source));
    response
}
