#![allow(dead_code)]

use std::sync::Arc;

use axum::body::Body;
use axum::http::{header, Request, Response};
use axum::Router;
use chrono::Utc;
use serde_json::json;
use tempfile::TempDir;
use tower::ServiceExt;

use advocacy_site::auth::session::{SessionClaims, SessionKeys};
use advocacy_site::config::Config;
use advocacy_site::content::documents::Document;
use advocacy_site::content::image::ImageUrls;
use advocacy_site::content::FixtureStore;
use advocacy_site::db::{self, models::Role};
use advocacy_site::routes;
use advocacy_site::state::AppState;
use advocacy_site::users::SqliteUserStore;

pub const SECRET: &str = "integration-test-secret-0123456789abcdef";
pub const ADMIN_EMAIL: &str = "admin@example.org";

pub struct TestApp {
    pub router: Router,
    pub content: Arc<FixtureStore>,
    pub users: Arc<SqliteUserStore>,
    pub sessions: Arc<SessionKeys>,
    _dir: TempDir,
}

fn fixtures() -> Vec<Document> {
    serde_json::from_value(json!([
        {
            "_type": "post",
            "_id": "post-housing",
            "title": "Why Housing First Works",
            "slug": { "current": "housing-first" },
            "author": { "name": "Rosa Diaz" },
            "categories": [{ "title": "Housing", "slug": { "current": "housing" } }],
            "publishedAt": "2024-03-01T09:00:00Z",
            "excerpt": "Stable homes come before everything else.",
            "body": [{
                "_type": "block",
                "style": "normal",
                "children": [{ "_type": "span", "text": "Housing is health care." }]
            }]
        },
        {
            "_type": "category",
            "_id": "cat-housing",
            "title": "Housing",
            "slug": { "current": "housing" },
            "description": "Homes people can afford."
        },
        {
            "_type": "event",
            "_id": "event-townhall",
            "title": "Spring Town Hall",
            "slug": { "current": "spring-town-hall" },
            "startsAt": "2099-04-01T18:00:00Z",
            "location": "Central Library"
        },
        {
            "_type": "teamMember",
            "_id": "team-1",
            "name": "Jordan Lee",
            "role": "Director",
            "order": 1
        }
    ]))
    .expect("fixture documents")
}

pub fn spawn() -> TestApp {
    spawn_with(|_| {})
}

/// Like `spawn`, with a hook to adjust the config before the router is built.
pub fn spawn_with(configure: impl FnOnce(&mut Config)) -> TestApp {
    let dir = TempDir::new().unwrap();
    let db_path = dir.path().join("users.db");
    let pool = db::create_pool(&db_path, 4).expect("Failed to create test database");
    db::run_migrations(&pool).expect("Failed to run migrations");

    let mut config = Config::default();
    config.database.url = Some(db_path.display().to_string());
    config.auth.secret = Some(SECRET.to_string());
    config.auth.bcrypt_cost = 4;
    config.auth.admin_emails = vec![ADMIN_EMAIL.to_string()];
    configure(&mut config);

    let users = Arc::new(
        SqliteUserStore::new(pool, config.auth.bcrypt_cost).with_admins(&config.auth.admin_emails),
    );
    let content = Arc::new(FixtureStore::new(fixtures()));
    let sessions = Arc::new(SessionKeys::new(SECRET.as_bytes()));

    let state = AppState {
        config,
        users: users.clone(),
        content: content.clone(),
        sessions: sessions.clone(),
        images: ImageUrls::new("test-project", "production"),
    };

    TestApp {
        router: routes::build_router(state),
        content,
        users,
        sessions,
        _dir: dir,
    }
}

impl TestApp {
    pub async fn send(&self, request: Request<Body>) -> Response<Body> {
        self.router.clone().oneshot(request).await.unwrap()
    }

    pub async fn get(&self, uri: &str, cookie: Option<&str>) -> Response<Body> {
        let mut builder = Request::builder().uri(uri);
        if let Some(cookie) = cookie {
            builder = builder.header(header::COOKIE, cookie);
        }
        self.send(builder.body(Body::empty()).unwrap()).await
    }

    pub async fn post_form(&self, uri: &str, body: &str, cookie: Option<&str>) -> Response<Body> {
        let mut builder = Request::builder()
            .method("POST")
            .uri(uri)
            .header(header::CONTENT_TYPE, "application/x-www-form-urlencoded");
        if let Some(cookie) = cookie {
            builder = builder.header(header::COOKIE, cookie);
        }
        self.send(builder.body(Body::from(body.to_string())).unwrap())
            .await
    }

    pub async fn post_json(&self, uri: &str, body: serde_json::Value) -> Response<Body> {
        let request = Request::builder()
            .method("POST")
            .uri(uri)
            .header(header::CONTENT_TYPE, "application/json")
            .body(Body::from(body.to_string()))
            .unwrap();
        self.send(request).await
    }

    /// A signed session cookie for an arbitrary identity.
    pub fn cookie_for(&self, name: &str, role: Role) -> String {
        let now = Utc::now().timestamp();
        let claims = SessionClaims {
            sub: format!("{}-id", name.to_lowercase()),
            name: name.to_string(),
            email: format!("{}@example.org", name.to_lowercase()),
            role,
            iat: now,
            exp: now + 3600,
        };
        format!("site_session={}", self.sessions.sign(&claims).unwrap())
    }
}

pub async fn body_string(response: Response<Body>) -> String {
    let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .unwrap();
    String::from_utf8(bytes.to_vec()).unwrap()
}

pub async fn body_json(response: Response<Body>) -> serde_json::Value {
    serde_json::from_str(&body_string(response).await).unwrap()
}

pub fn location(response: &Response<Body>) -> &str {
    response
        .headers()
        .get(header::LOCATION)
        .and_then(|v| v.to_str().ok())
        .unwrap_or_default()
}

/// The `name=value` part of the first Set-Cookie header.
pub fn set_cookie(response: &Response<Body>) -> String {
    response
        .headers()
        .get(header::SET_COOKIE)
        .and_then(|v| v.to_str().ok())
        .and_then(|v| v.split(';').next())
        .unwrap_or_default()
        .to_string()
}
