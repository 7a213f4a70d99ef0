use askama::Template;
use axum::extract::rejection::JsonRejection;
use axum::extract::{Query, State};
use axum::http::{header, StatusCode};
use axum::response::{IntoResponse, Response};
use axum::{Form, Json};
use serde::Deserialize;
use serde_json::json;

use crate::auth::gate::{safe_callback, SIGN_IN_PATH};
use crate::auth::session::{clear_session_cookie, session_cookie};
use crate::db::models::NewUser;
use crate::error::AppResult;
use crate::routes::chrome::Chrome;
use crate::routes::Html;
use crate::state::AppState;

pub const CREDENTIALS_ERROR: &str = "CredentialsSignin";

// -- Templates --

#[derive(Template)]
#[template(path = "pages/signin.html")]
pub struct SignInTemplate {
    pub chrome: Chrome,
    pub error: String,
    pub notice: String,
    pub callback_url: String,
}

#[derive(Template)]
#[template(path = "pages/signup.html")]
pub struct SignUpTemplate {
    pub chrome: Chrome,
}

// -- Request types --

#[derive(Deserialize, Default)]
pub struct SignInQuery {
    pub error: Option<String>,
    #[serde(rename = "callbackUrl")]
    pub callback_url: Option<String>,
    pub registered: Option<String>,
}

#[derive(Deserialize)]
pub struct SignInForm {
    #[serde(default)]
    pub email: String,
    #[serde(default)]
    pub password: String,
    #[serde(rename = "callbackUrl", default)]
    pub callback_url: Option<String>,
}

/// User-facing text for the `error` query parameter.
pub fn error_message(code: &str) -> &'static str {
    match code {
        CREDENTIALS_ERROR => "Invalid email or password.",
        "SessionRequired" => "Please sign in to access this page.",
        _ => "Something went wrong. Please try again.",
    }
}

fn sign_in_error_url(callback: Option<&str>) -> String {
    let mut query = url::form_urlencoded::Serializer::new(String::new());
    query.append_pair("error", CREDENTIALS_ERROR);
    if let Some(callback) = callback.filter(|c| !c.is_empty()) {
        query.append_pair("callbackUrl", callback);
    }
    format!("{}?{}", SIGN_IN_PATH, query.finish())
}

fn see_other(location: &str, cookie: Option<String>) -> Response {
    match cookie {
        Some(cookie) => (
            StatusCode::SEE_OTHER,
            [
                (header::LOCATION, location.to_string()),
                (header::SET_COOKIE, cookie),
            ],
        )
            .into_response(),
        None => (StatusCode::SEE_OTHER, [(header::LOCATION, location.to_string())]).into_response(),
    }
}

// -- Sign in --

/// GET /auth/signin
pub async fn signin_page(chrome: Chrome, Query(query): Query<SignInQuery>) -> Response {
    let error = query
        .error
        .as_deref()
        .map(error_message)
        .unwrap_or_default()
        .to_string();
    let notice = if query.registered.is_some() {
        "Account created. Please sign in.".to_string()
    } else {
        String::new()
    };

    Html(SignInTemplate {
        chrome,
        error,
        notice,
        callback_url: query.callback_url.unwrap_or_default(),
    })
    .into_response()
}

/// POST /auth/signin: verify credentials and start a session
pub async fn signin(State(state): State<AppState>, Form(form): Form<SignInForm>) -> AppResult<Response> {
    let callback = form.callback_url.as_deref();

    if form.email.trim().is_empty() || form.password.is_empty() {
        return Ok(see_other(&sign_in_error_url(callback), None));
    }

    let Some(user) = state
        .users
        .verify_credentials(&form.email, &form.password)
        .await?
    else {
        tracing::info!("Failed sign-in attempt");
        return Ok(see_other(&sign_in_error_url(callback), None));
    };

    let hours = state.config.auth.session_hours;
    let token = state.sessions.issue(&user, hours)?;
    let cookie = session_cookie(&state.config.auth.cookie_name, &token, hours);
    tracing::info!(user_id = %user.id, "User signed in");

    let destination = safe_callback(callback, &state.config.site.member_prefix);
    Ok(see_other(destination, Some(cookie)))
}

/// POST /auth/signout
pub async fn signout(State(state): State<AppState>) -> Response {
    see_other("/", Some(clear_session_cookie(&state.config.auth.cookie_name)))
}

// -- Sign up --

/// GET /auth/signup
pub async fn signup_page(chrome: Chrome) -> Response {
    Html(SignUpTemplate { chrome }).into_response()
}

fn message(status: StatusCode, text: &str) -> Response {
    (status, Json(json!({ "message": text }))).into_response()
}

/// POST /api/auth/signup: JSON registration used by the sign-up page
pub async fn signup_api(
    State(state): State<AppState>,
    payload: Result<Json<NewUser>, JsonRejection>,
) -> Response {
    let Json(input) = match payload {
        Ok(payload) => payload,
        Err(rejection) => {
            tracing::debug!("Rejected sign-up body: {}", rejection);
            return message(StatusCode::BAD_REQUEST, "Invalid request body.");
        }
    };

    match state.users.create(input).await {
        Ok(user) => (
            StatusCode::CREATED,
            Json(json!({
                "message": "User created successfully",
                "userId": user.id,
            })),
        )
            .into_response(),
        Err(e) if e.is_client_error() => message(StatusCode::BAD_REQUEST, &e.to_string()),
        Err(e) => {
            tracing::error!("Sign-up failed: {}", e);
            message(
                StatusCode::INTERNAL_SERVER_ERROR,
                "Something went wrong on our end. Please try again later.",
            )
        }
    }
}
