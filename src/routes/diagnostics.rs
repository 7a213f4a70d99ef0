use axum::extract::State;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::routing::get;
use axum::{Json, Router};
use serde::Serialize;
use serde_json::json;

use crate::config::Config;
use crate::extractors::AdminUser;
use crate::schema;
use crate::state::AppState;

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/api/diagnostics/db", get(database))
        .route("/api/diagnostics/env", get(environment))
        .route("/api/studio/schema", get(studio_schema))
}

/// GET /api/diagnostics/db
pub async fn database(State(state): State<AppState>, AdminUser(admin): AdminUser) -> Response {
    tracing::info!(admin = %admin.id, "Database diagnostics requested");

    let result = match state.users.ping().await {
        Ok(()) => state.users.count().await,
        Err(e) => Err(e),
    };

    match result {
        Ok(users) => Json(json!({ "status": "ok", "users": users })).into_response(),
        Err(e) => {
            tracing::error!("Database diagnostics failed: {}", e);
            (
                StatusCode::SERVICE_UNAVAILABLE,
                Json(json!({ "status": "error", "message": "User store is unreachable." })),
            )
                .into_response()
        }
    }
}

/// Presence flags only; configured values are never echoed.
#[derive(Debug, Serialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct EnvReport {
    pub database_url: bool,
    pub session_secret: bool,
    pub content_project: bool,
    pub content_token: bool,
    pub form_endpoint: bool,
    pub fixtures: bool,
    pub hostname: String,
}

impl EnvReport {
    pub fn from_config(config: &Config) -> Self {
        let set = |v: &Option<String>| v.as_deref().is_some_and(|s| !s.is_empty());
        Self {
            database_url: set(&config.database.url),
            session_secret: set(&config.auth.secret),
            content_project: set(&config.content.project_id),
            content_token: set(&config.content.token),
            form_endpoint: set(&config.site.form_endpoint_id),
            fixtures: config.content.fixtures.is_some(),
            hostname: hostname::get()
                .map(|h| h.to_string_lossy().into_owned())
                .unwrap_or_else(|_| "unknown".to_string()),
        }
    }
}

/// GET /api/diagnostics/env
pub async fn environment(State(state): State<AppState>, _admin: AdminUser) -> Json<EnvReport> {
    Json(EnvReport::from_config(&state.config))
}

/// GET /api/studio/schema: document descriptors for the CMS admin tool
pub async fn studio_schema() -> Json<Vec<schema::DocumentSchema>> {
    Json(schema::all())
}
