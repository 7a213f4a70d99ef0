use askama::Template;
use axum::extract::State;
use axum::response::{IntoResponse, Response};
use axum::routing::get;
use axum::Router;
use chrono::Utc;

use crate::arcade::{GameInfo, GAMES};
use crate::extractors::CurrentUser;
use crate::routes::chrome::Chrome;
use crate::routes::policy::{PolicyArea, POLICY_AREAS};
use crate::routes::views::{split_events, EventView, PostCard, TeamView};
use crate::routes::{or_empty, Html};
use crate::state::AppState;

const HOME_POSTS: usize = 3;
const HOME_EVENTS: usize = 3;

#[derive(Template)]
#[template(path = "pages/home.html")]
pub struct HomeTemplate {
    pub chrome: Chrome,
    pub posts: Vec<PostCard>,
    pub events: Vec<EventView>,
    pub areas: &'static [PolicyArea],
}

#[derive(Template)]
#[template(path = "pages/about.html")]
pub struct AboutTemplate {
    pub chrome: Chrome,
    pub team: Vec<TeamView>,
}

#[derive(Template)]
#[template(path = "pages/events.html")]
pub struct EventsTemplate {
    pub chrome: Chrome,
    pub upcoming: Vec<EventView>,
    pub past: Vec<EventView>,
}

#[derive(Template)]
#[template(path = "pages/contact.html")]
pub struct ContactTemplate {
    pub chrome: Chrome,
}

#[derive(Template)]
#[template(path = "pages/members.html")]
pub struct MembersTemplate {
    pub chrome: Chrome,
    pub name: String,
    pub email: String,
    pub role: String,
    pub is_admin: bool,
    pub posts: Vec<PostCard>,
    pub games: &'static [GameInfo],
}

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/", get(home))
        .route("/about", get(about))
        .route("/events", get(events))
        .route("/contact", get(contact))
        .route("/members", get(members))
}

pub async fn home(State(state): State<AppState>, chrome: Chrome) -> Response {
    let posts = or_empty(state.content.latest_posts(HOME_POSTS).await, "latest posts");
    let events = or_empty(state.content.events().await, "events");
    let (mut upcoming, _) = split_events(&events, Utc::now());
    upcoming.truncate(HOME_EVENTS);

    Html(HomeTemplate {
        chrome,
        posts: posts
            .iter()
            .map(|p| PostCard::new(p, &state.images))
            .collect(),
        events: upcoming,
        areas: POLICY_AREAS,
    })
    .into_response()
}

pub async fn about(State(state): State<AppState>, chrome: Chrome) -> Response {
    let team = or_empty(state.content.team().await, "team members");
    Html(AboutTemplate {
        chrome,
        team: team
            .iter()
            .map(|m| TeamView::new(m, &state.images))
            .collect(),
    })
    .into_response()
}

pub async fn events(State(state): State<AppState>, chrome: Chrome) -> Response {
    let events = or_empty(state.content.events().await, "events");
    let (upcoming, past) = split_events(&events, Utc::now());
    Html(EventsTemplate {
        chrome,
        upcoming,
        past,
    })
    .into_response()
}

pub async fn contact(chrome: Chrome) -> Response {
    Html(ContactTemplate { chrome }).into_response()
}

/// Member area landing page. The gate has already redirected anonymous
/// visitors; the extractor still refuses requests without a session.
pub async fn members(
    State(state): State<AppState>,
    chrome: Chrome,
    user: CurrentUser,
) -> Response {
    let posts = or_empty(state.content.latest_posts(HOME_POSTS).await, "latest posts");
    Html(MembersTemplate {
        chrome,
        is_admin: user.is_admin(),
        role: user.role.to_string(),
        name: user.name,
        email: user.email,
        posts: posts
            .iter()
            .map(|p| PostCard::new(p, &state.images))
            .collect(),
        games: GAMES,
    })
    .into_response()
}
