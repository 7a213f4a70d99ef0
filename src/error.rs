use askama::Template;
use axum::http::{header, StatusCode};
use axum::response::{IntoResponse, Response};

use crate::arcade::ArcadeError;
use crate::content::ContentError;
use crate::routes::chrome::Chrome;
use crate::routes::NotFoundTemplate;
use crate::users::UserStoreError;

#[derive(Debug, thiserror::Error)]
pub enum AppError {
    #[error("Not found")]
    NotFound,

    #[error("Unauthorized")]
    Unauthorized,

    #[error("Forbidden")]
    Forbidden,

    #[error("Bad request: {0}")]
    BadRequest(String),

    #[error("User store error: {0}")]
    Users(#[from] UserStoreError),

    #[error("Content store error: {0}")]
    Content(#[from] ContentError),

    #[error("Session error: {0}")]
    Session(#[from] jsonwebtoken::errors::Error),

    #[error("Game state error: {0}")]
    Arcade(#[from] ArcadeError),

    #[error("Template error: {0}")]
    Template(#[from] askama::Error),

    #[error("Internal error: {0}")]
    Internal(String),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

fn internal(kind: &str, detail: &dyn std::fmt::Display) -> (StatusCode, String) {
    tracing::error!("{}: {}", kind, detail);
    (
        StatusCode::INTERNAL_SERVER_ERROR,
        "Something went wrong on our end. Please try again later.".to_string(),
    )
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let (status, message) = match &self {
            AppError::NotFound => return not_found_response(Chrome::default()),
            AppError::Unauthorized => (StatusCode::UNAUTHORIZED, "Unauthorized".to_string()),
            AppError::Forbidden => (StatusCode::FORBIDDEN, "Forbidden".to_string()),
            AppError::BadRequest(msg) => (StatusCode::BAD_REQUEST, msg.clone()),
            AppError::Users(e) if e.is_client_error() => (StatusCode::BAD_REQUEST, e.to_string()),
            AppError::Users(e) => internal("User store error", e),
            AppError::Content(ContentError::Invalid(msg)) => {
                (StatusCode::BAD_REQUEST, msg.clone())
            }
            AppError::Content(e) => internal("Content store error", e),
            AppError::Session(e) => internal("Session error", e),
            AppError::Arcade(e) => internal("Game state error", e),
            AppError::Template(e) => internal("Template error", e),
            AppError::Internal(msg) => internal("Internal error", msg),
            AppError::Json(e) => internal("JSON error", e),
        };

        (status, message).into_response()
    }
}

/// Render the 404 page. Falls back to plain text if the template fails.
pub fn not_found_response(chrome: Chrome) -> Response {
    match (NotFoundTemplate { chrome }).render() {
        Ok(body) => (
            StatusCode::NOT_FOUND,
            [(header::CONTENT_TYPE, "text/html; charset=utf-8")],
            body,
        )
            .into_response(),
        Err(e) => {
            tracing::error!("Template render error: {}", e);
            (StatusCode::NOT_FOUND, "Not found").into_response()
        }
    }
}

pub type AppResult<T> = Result<T, AppError>;

#[cfg(test)]
mod tests {
    use super::*;
    use axum::http::StatusCode;

    fn response_status(err: AppError) -> StatusCode {
        let response = err.into_response();
        response.status()
    }

    #[test]
    fn not_found_returns_404() {
        assert_eq!(response_status(AppError::NotFound), StatusCode::NOT_FOUND);
    }

    #[test]
    fn unauthorized_returns_401() {
        assert_eq!(
            response_status(AppError::Unauthorized),
            StatusCode::UNAUTHORIZED
        );
    }

    #[test]
    fn forbidden_returns_403() {
        assert_eq!(response_status(AppError::Forbidden), StatusCode::FORBIDDEN);
    }

    #[test]
    fn duplicate_email_is_a_client_error() {
        assert_eq!(
            response_status(AppError::Users(UserStoreError::DuplicateEmail)),
            StatusCode::BAD_REQUEST
        );
    }

    #[test]
    fn store_failures_are_500() {
        assert_eq!(
            response_status(AppError::Users(UserStoreError::Corrupt("bad role".into()))),
            StatusCode::INTERNAL_SERVER_ERROR
        );
        assert_eq!(
            response_status(AppError::Internal("boom".into())),
            StatusCode::INTERNAL_SERVER_ERROR
        );
    }
}
