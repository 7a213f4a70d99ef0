use axum::extract::{Request, State};
use axum::middleware::Next;
use axum::response::{IntoResponse, Redirect, Response};

use crate::auth::session::claims_from_headers;
use crate::state::AppState;

pub const SIGN_IN_PATH: &str = "/auth/signin";
pub const SIGN_UP_PATH: &str = "/auth/signup";

/// What the gate does with a request, given only its path and whether it
/// carries a valid session.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum GateDecision {
    Pass,
    /// Anonymous request for the member area
    ToSignIn { callback: String },
    /// Signed-in request for sign-in or sign-up
    ToMembers,
}

pub(crate) fn under_prefix(path: &str, prefix: &str) -> bool {
    let prefix = prefix.trim_end_matches('/');
    path == prefix
        || path
            .strip_prefix(prefix)
            .is_some_and(|rest| rest.starts_with('/'))
}

pub fn gate_decision(path: &str, authenticated: bool, member_prefix: &str) -> GateDecision {
    if authenticated {
        if path == SIGN_IN_PATH || path == SIGN_UP_PATH {
            return GateDecision::ToMembers;
        }
    } else if under_prefix(path, member_prefix) {
        return GateDecision::ToSignIn {
            callback: path.to_string(),
        };
    }
    GateDecision::Pass
}

pub fn sign_in_url(callback: &str) -> String {
    let encoded: String = url::form_urlencoded::byte_serialize(callback.as_bytes()).collect();
    format!("{}?callbackUrl={}", SIGN_IN_PATH, encoded)
}

/// Only same-site absolute paths are honoured as post-login destinations.
pub fn safe_callback<'a>(callback: Option<&'a str>, fallback: &'a str) -> &'a str {
    match callback {
        Some(c) if c.starts_with('/') && !c.starts_with("//") && !c.contains('\\') => c,
        _ => fallback,
    }
}

/// Middleware applying [`gate_decision`] to every request. Invalid tokens
/// are treated the same as missing ones.
pub async fn guard(State(state): State<AppState>, request: Request, next: Next) -> Response {
    let authenticated = claims_from_headers(
        &state.sessions,
        request.headers(),
        &state.config.auth.cookie_name,
    )
    .is_some();

    let path = request.uri().path().to_string();
    match gate_decision(&path, authenticated, &state.config.site.member_prefix) {
        GateDecision::Pass => next.run(request).await,
        GateDecision::ToSignIn { callback } => {
            tracing::debug!(%path, "Anonymous request to member area");
            Redirect::to(&sign_in_url(&callback)).into_response()
        }
        GateDecision::ToMembers => {
            Redirect::to(&state.config.site.member_prefix).into_response()
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn anonymous_member_requests_go_to_sign_in() {
        for path in ["/members", "/members/", "/members/resources/toolkit"] {
            assert_eq!(
                gate_decision(path, false, "/members"),
                GateDecision::ToSignIn {
                    callback: path.to_string()
                }
            );
        }
    }

    #[test]
    fn prefix_match_respects_segment_boundary() {
        assert_eq!(gate_decision("/membership", false, "/members"), GateDecision::Pass);
        assert_eq!(gate_decision("/members-faq", false, "/members"), GateDecision::Pass);
    }

    #[test]
    fn authenticated_auth_pages_go_to_members() {
        assert_eq!(gate_decision(SIGN_IN_PATH, true, "/members"), GateDecision::ToMembers);
        assert_eq!(gate_decision(SIGN_UP_PATH, true, "/members"), GateDecision::ToMembers);
    }

    #[test]
    fn other_combinations_pass() {
        assert_eq!(gate_decision("/members/x", true, "/members"), GateDecision::Pass);
        assert_eq!(gate_decision(SIGN_IN_PATH, false, "/members"), GateDecision::Pass);
        assert_eq!(gate_decision("/insights", false, "/members"), GateDecision::Pass);
        assert_eq!(gate_decision("/", true, "/members"), GateDecision::Pass);
    }

    #[test]
    fn sign_in_url_encodes_callback() {
        assert_eq!(
            sign_in_url("/members/a b"),
            "/auth/signin?callbackUrl=%2Fmembers%2Fa+b"
        );
    }

    #[test]
    fn safe_callback_rejects_offsite_targets() {
        assert_eq!(safe_callback(Some("/members/x"), "/members"), "/members/x");
        assert_eq!(safe_callback(Some("//evil.test"), "/members"), "/members");
        assert_eq!(safe_callback(Some("https://evil.test"), "/members"), "/members");
        assert_eq!(safe_callback(Some("/\\evil.test"), "/members"), "/members");
        assert_eq!(safe_callback(None, "/members"), "/members");
    }
}
