/// Node callback endpoints
///
/// The routes the orchestrator calls while running a workflow:
/// - `POST /node/{id}/next` sends the configured email and passes the payload on
/// - `GET /node/{id}/config` renders the settings form
/// - `POST /node/{id}/config` stores submitted settings

use crate::{
    api::auth::{require_node_token, JwtVerifier, NodeAuth},
    email::EmailSender,
    node::{render_config_page, ConfigStore, NodeConfig},
};
use axum::{
    body::Bytes,
    extract::{rejection::BytesRejection, Path, State},
    http::{header::CONTENT_TYPE, StatusCode},
    response::{Html, IntoResponse, Json, Response},
    routing::{get, post},
    Extension, Form, Router,
};
use serde_json::Value;
use std::sync::Arc;

/// Shared resources of the node routes, read-only after startup
#[derive(Clone)]
pub struct AppState {
    /// Client of the orchestrator's per-node config API
    pub store: ConfigStore,
    /// Outbound email provider
    pub mailer: Arc<dyn EmailSender>,
}

/// Create the token-protected node routes
pub fn create_node_routes(verifier: Arc<JwtVerifier>) -> Router<AppState> {
    Router::new()
        .route("/node/{id}/next", post(next))
        .route("/node/{id}/config", get(show_config).post(save_config))
        .route_layer(axum::middleware::from_fn_with_state(verifier, require_node_token))
}

/// Send the node's email for this payload and hand the payload back
///
/// POST /node/:id/next
/// Body: arbitrary JSON produced by the previous workflow step
///
/// Always answers 200. Unreadable or non-JSON bodies answer `null`; every
/// other failure is logged and the received bytes are returned as they came.
async fn next(
    State(state): State<AppState>,
    Path(id): Path<String>,
    Extension(auth): Extension<NodeAuth>,
    body: Result<Bytes, BytesRejection>,
) -> Response {
    let node_id = auth.node_id(&id);
    tracing::info!("📥 Mail sender node called: {}", node_id);

    let body = match body {
        Ok(body) => body,
        Err(e) => {
            tracing::warn!("❌ Could not read request body for node {}: {}", node_id, e);
            return Json(Value::Null).into_response();
        }
    };

    let payload: Value = match serde_json::from_slice(&body) {
        Ok(json) => json,
        Err(e) => {
            tracing::warn!("❌ Invalid JSON payload for node {}: {}", node_id, e);
            return Json(Value::Null).into_response();
        }
    };

    let config = state.store.load_or_default(&node_id, &auth.token).await;
    let email = config.compose(&payload);
    tracing::debug!(
        "📧 Composed email from '{}' to {:?} with subject '{}'",
        email.from,
        email.to,
        email.subject
    );

    match state.mailer.send(&email).await {
        Ok(()) => tracing::info!("✅ Email sent for node {}", node_id),
        Err(e) => tracing::error!("❌ Email for node {} not sent: {}", node_id, e),
    }

    ([(CONTENT_TYPE, "application/json")], body).into_response()
}

/// Render the settings form
///
/// GET /node/:id/config
async fn show_config(
    State(state): State<AppState>,
    Path(id): Path<String>,
    Extension(auth): Extension<NodeAuth>,
) -> Result<Html<String>, (StatusCode, String)> {
    let node_id = auth.node_id(&id);
    let config = state.store.load_or_default(&node_id, &auth.token).await;
    page(&node_id, &auth.token, &config)
}

/// Store submitted settings and render the form again
///
/// POST /node/:id/config
/// Body: form-encoded `EmailFrom`, `EmailTo`, `EmailSubject`, `EmailBody`, `Replacement`
async fn save_config(
    State(state): State<AppState>,
    Path(id): Path<String>,
    Extension(auth): Extension<NodeAuth>,
    Form(submitted): Form<NodeConfig>,
) -> Result<Html<String>, (StatusCode, String)> {
    let node_id = auth.node_id(&id);
    let config = submitted.trimmed();

    if let Err(e) = config.validate() {
        tracing::warn!("Rejected settings for node {}: {}", node_id, e);
        return Err((StatusCode::BAD_REQUEST, e.to_string()));
    }

    if let Err(e) = state.store.set(&node_id, &auth.token, &config).await {
        tracing::error!("Failed to store settings for node {}: {}", node_id, e);
        return Err((StatusCode::BAD_GATEWAY, e.to_string()));
    }

    tracing::info!("💾 Stored settings for node {}", node_id);
    page(&node_id, &auth.token, &config)
}

fn page(
    node_id: &str,
    token: &str,
    config: &NodeConfig,
) -> Result<Html<String>, (StatusCode, String)> {
    render_config_page(node_id, token, config).map(Html).map_err(|e| {
        tracing::error!("Failed to render settings page for node {}: {}", node_id, e);
        (StatusCode::INTERNAL_SERVER_ERROR, e.to_string())
    })
}
