use std::convert::Infallible;

use axum::extract::FromRequestParts;
use axum::http::request::Parts;
use axum::http::HeaderMap;
use chrono::{Datelike, Utc};

use crate::auth::session::{claims_from_headers, get_cookie_value};
use crate::config::SiteConfig;
use crate::db::models::Role;
use crate::state::AppState;

pub const THEME_COOKIE: &str = "theme";
pub const CONSENT_COOKIE: &str = "cookie_consent";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Theme {
    #[default]
    Light,
    Dark,
}

impl Theme {
    pub fn from_cookie(value: Option<&str>) -> Self {
        match value {
            Some("dark") => Self::Dark,
            _ => Self::Light,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Light => "light",
            Self::Dark => "dark",
        }
    }

    pub fn toggled(&self) -> Self {
        match self {
            Self::Light => Self::Dark,
            Self::Dark => Self::Light,
        }
    }
}

/// Everything the shared layout (header, nav, footer, consent banner) needs.
/// Extracted per request from cookies and config.
#[derive(Debug, Clone)]
pub struct Chrome {
    pub site_name: String,
    pub signed_in: bool,
    pub user_name: String,
    pub is_admin: bool,
    pub member_prefix: String,
    pub theme: Theme,
    pub show_consent: bool,
    pub year: i32,
    /// Contact form endpoint; empty when none is configured
    pub form_action: String,
}

impl Default for Chrome {
    fn default() -> Self {
        let site = SiteConfig::default();
        Self {
            site_name: site.name,
            signed_in: false,
            user_name: String::new(),
            is_admin: false,
            member_prefix: site.member_prefix,
            theme: Theme::default(),
            show_consent: false,
            year: Utc::now().year(),
            form_action: String::new(),
        }
    }
}

impl Chrome {
    pub fn from_headers(state: &AppState, headers: &HeaderMap) -> Self {
        let claims = claims_from_headers(&state.sessions, headers, &state.config.auth.cookie_name);
        Self {
            site_name: state.config.site.name.clone(),
            signed_in: claims.is_some(),
            user_name: claims.as_ref().map(|c| c.name.clone()).unwrap_or_default(),
            is_admin: claims.as_ref().is_some_and(|c| c.role == Role::Admin),
            member_prefix: state.config.site.member_prefix.clone(),
            theme: Theme::from_cookie(get_cookie_value(headers, THEME_COOKIE)),
            show_consent: get_cookie_value(headers, CONSENT_COOKIE).is_none(),
            year: Utc::now().year(),
            form_action: state.config.form_action().unwrap_or_default(),
        }
    }

    pub fn dark(&self) -> bool {
        self.theme == Theme::Dark
    }
}

impl FromRequestParts<AppState> for Chrome {
    type Rejection = Infallible;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &AppState,
    ) -> Result<Self, Self::Rejection> {
        Ok(Chrome::from_headers(state, &parts.headers))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn unknown_theme_values_fall_back_to_light() {
        assert_eq!(Theme::from_cookie(Some("dark")), Theme::Dark);
        assert_eq!(Theme::from_cookie(Some("neon")), Theme::Light);
        assert_eq!(Theme::from_cookie(None), Theme::Light);
        assert_eq!(Theme::Dark.toggled(), Theme::Light);
    }

    #[test]
    fn default_chrome_is_anonymous() {
        let chrome = Chrome::default();
        assert!(!chrome.signed_in);
        assert!(!chrome.show_consent);
        assert_eq!(chrome.member_prefix, "/members");
        assert!(chrome.form_action.is_empty());
    }
}
