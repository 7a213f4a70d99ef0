use askama::Template;
use axum::extract::{Path, State};
use axum::response::{IntoResponse, Response};
use axum::routing::get;
use axum::Router;

use crate::error::not_found_response;
use crate::routes::chrome::Chrome;
use crate::routes::views::PostCard;
use crate::routes::{or_empty, Html};
use crate::state::AppState;

const RELATED_POSTS: usize = 4;

/// A policy area is static copy; its slug doubles as the insights category
/// whose posts are listed alongside it.
pub struct PolicyArea {
    pub slug: &'static str,
    pub title: &'static str,
    pub summary: &'static str,
    pub priorities: &'static [&'static str],
}

pub static POLICY_AREAS: &[PolicyArea] = &[
    PolicyArea {
        slug: "housing",
        title: "Housing",
        summary: "Homes people can afford, in neighborhoods they choose.",
        priorities: &[
            "Legalize duplexes and small apartment buildings near transit",
            "Fund permanent supportive housing",
            "Protect tenants from no-cause evictions",
        ],
    },
    PolicyArea {
        slug: "health",
        title: "Health",
        summary: "Care that is close to home and does not bankrupt anyone.",
        priorities: &[
            "Expand community clinic hours",
            "Cap out-of-pocket costs for essential medicines",
            "Integrate mental health into primary care",
        ],
    },
    PolicyArea {
        slug: "climate",
        title: "Climate",
        summary: "Clean air and a stable climate for the next generation.",
        priorities: &[
            "Electrify municipal fleets",
            "Retrofit public buildings for efficiency",
            "Plant and maintain urban tree canopy",
        ],
    },
    PolicyArea {
        slug: "democracy",
        title: "Democracy",
        summary: "Elections that are open, fair and easy to take part in.",
        priorities: &[
            "Automatic voter registration",
            "Public financing for local campaigns",
            "Accessible polling places in every neighborhood",
        ],
    },
];

pub fn find_area(slug: &str) -> Option<&'static PolicyArea> {
    POLICY_AREAS.iter().find(|a| a.slug == slug)
}

#[derive(Template)]
#[template(path = "pages/policy_index.html")]
pub struct PolicyIndexTemplate {
    pub chrome: Chrome,
    pub areas: &'static [PolicyArea],
}

#[derive(Template)]
#[template(path = "pages/policy_area.html")]
pub struct PolicyAreaTemplate {
    pub chrome: Chrome,
    pub area: &'static PolicyArea,
    pub related: Vec<PostCard>,
}

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/policy", get(index))
        .route("/policy/{slug}", get(area))
}

pub async fn index(chrome: Chrome) -> Response {
    Html(PolicyIndexTemplate {
        chrome,
        areas: POLICY_AREAS,
    })
    .into_response()
}

pub async fn area(
    State(state): State<AppState>,
    chrome: Chrome,
    Path(slug): Path<String>,
) -> Response {
    let Some(area) = find_area(&slug) else {
        return not_found_response(chrome);
    };
    let mut posts = or_empty(
        state.content.posts_in_category(area.slug).await,
        "related posts",
    );
    posts.truncate(RELATED_POSTS);

    Html(PolicyAreaTemplate {
        chrome,
        area,
        related: posts
            .iter()
            .map(|p| PostCard::new(p, &state.images))
            .collect(),
    })
    .into_response()
}
