pub mod arcade;
pub mod assets;
pub mod auth;
pub mod chrome;
pub mod diagnostics;
pub mod insights;
pub mod pages;
pub mod policy;
pub mod preferences;
pub mod views;

use askama::Template;
use axum::http::{header, StatusCode};
use axum::middleware;
use axum::response::{IntoResponse, Response};
use axum::routing::get;
use axum::Router;
use tower_http::trace::TraceLayer;

use crate::content::ContentError;
use crate::error::not_found_response;
use crate::state::AppState;
use chrome::Chrome;

/// Wrapper to render askama templates as axum responses
pub struct Html<T: Template>(pub T);

impl<T: Template> IntoResponse for Html<T> {
    fn into_response(self) -> Response {
        match self.0.render() {
            Ok(body) => (
                StatusCode::OK,
                [(header::CONTENT_TYPE, "text/html; charset=utf-8")],
                body,
            )
                .into_response(),
            Err(e) => {
                tracing::error!("Template render error: {}", e);
                (StatusCode::INTERNAL_SERVER_ERROR, "Template error").into_response()
            }
        }
    }
}

#[derive(Template)]
#[template(path = "pages/not_found.html")]
pub struct NotFoundTemplate {
    pub chrome: Chrome,
}

async fn not_found(chrome: Chrome) -> Response {
    not_found_response(chrome)
}

/// Listing pages show an empty state rather than failing when the content
/// store is unreachable.
pub(crate) fn or_empty<T>(result: Result<Vec<T>, ContentError>, what: &str) -> Vec<T> {
    result.unwrap_or_else(|e| {
        tracing::warn!("Could not load {}: {}", what, e);
        Vec::new()
    })
}

/// The full site: pages, auth, arcade, APIs and assets behind the member gate.
pub fn build_router(state: AppState) -> Router {
    Router::new()
        .merge(pages::router())
        .merge(policy::router())
        .merge(insights::router())
        .merge(auth::router())
        .merge(arcade::router())
        .merge(preferences::router())
        .merge(diagnostics::router())
        .route("/assets/{*path}", get(assets::serve))
        .fallback(not_found)
        .layer(middleware::from_fn_with_state(
            state.clone(),
            crate::auth::guard,
        ))
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}
