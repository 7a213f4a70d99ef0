use axum::http::{header, HeaderMap, StatusCode};
use axum::response::{IntoResponse, Response};
use axum::routing::post;
use axum::{Form, Router};
use serde::Deserialize;

use crate::auth::session::get_cookie_value;
use crate::routes::chrome::{Theme, CONSENT_COOKIE, THEME_COOKIE};
use crate::state::AppState;

const ONE_YEAR_SECS: u64 = 365 * 24 * 3600;

#[derive(Deserialize)]
pub struct ConsentForm {
    #[serde(default)]
    pub choice: String,
}

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/preferences/theme", post(theme))
        .route("/preferences/consent", post(consent))
}

fn preference_cookie(name: &str, value: &str) -> String {
    format!(
        "{}={}; SameSite=Lax; Path=/; Max-Age={}",
        name, value, ONE_YEAR_SECS
    )
}

/// Send the visitor back to the page they came from. Only the path and query
/// of the Referer are used, so the redirect never leaves the site.
pub fn back_to(headers: &HeaderMap) -> String {
    headers
        .get(header::REFERER)
        .and_then(|v| v.to_str().ok())
        .and_then(|r| url::Url::parse(r).ok())
        .map(|u| match u.query() {
            Some(q) => format!("{}?{}", u.path(), q),
            None => u.path().to_string(),
        })
        .filter(|p| p.starts_with('/') && !p.starts_with("//"))
        .unwrap_or_else(|| "/".to_string())
}

fn redirect_with_cookie(location: String, cookie: String) -> Response {
    (
        StatusCode::SEE_OTHER,
        [(header::LOCATION, location), (header::SET_COOKIE, cookie)],
    )
        .into_response()
}

/// POST /preferences/theme: flip between light and dark
pub async fn theme(headers: HeaderMap) -> Response {
    let next = Theme::from_cookie(get_cookie_value(&headers, THEME_COOKIE)).toggled();
    redirect_with_cookie(back_to(&headers), preference_cookie(THEME_COOKIE, next.as_str()))
}

/// POST /preferences/consent: remember the cookie banner answer
pub async fn consent(headers: HeaderMap, Form(form): Form<ConsentForm>) -> Response {
    let value = match form.choice.as_str() {
        "accepted" => "accepted",
        _ => "declined",
    };
    redirect_with_cookie(back_to(&headers), preference_cookie(CONSENT_COOKIE, value))
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::http::HeaderValue;

    fn referer(value: &str) -> HeaderMap {
        let mut headers = HeaderMap::new();
        headers.insert(header::REFERER, HeaderValue::from_str(value).unwrap());
        headers
    }

    #[test]
    fn back_to_keeps_only_path_and_query() {
        assert_eq!(
            back_to(&referer("https://example.org/insights?page=2")),
            "/insights?page=2"
        );
        assert_eq!(back_to(&referer("https://evil.test/members")), "/members");
    }

    #[test]
    fn back_to_defaults_to_home() {
        assert_eq!(back_to(&HeaderMap::new()), "/");
        assert_eq!(back_to(&referer("not a url")), "/");
    }
}
