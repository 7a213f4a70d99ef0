use axum::routing::{get, post};
use axum::Router;

use crate::auth::handlers;
use crate::state::AppState;

pub fn router() -> Router<AppState> {
    Router::new()
        .route(
            "/auth/signin",
            get(handlers::signin_page).post(handlers::signin),
        )
        .route("/auth/signup", get(handlers::signup_page))
        .route("/auth/signout", post(handlers::signout))
        .route("/api/auth/signup", post(handlers::signup_api))
}
