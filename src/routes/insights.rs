use askama::Template;
use axum::extract::{Path, Query, State};
use axum::http::StatusCode;
use axum::response::{IntoResponse, Redirect, Response};
use axum::routing::{get, post};
use axum::{Form, Router};
use serde::Deserialize;

use crate::content::documents::{NewComment, Post};
use crate::content::ContentError;
use crate::error::{not_found_response, AppError, AppResult};
use crate::routes::chrome::Chrome;
use crate::routes::views::{CommentView, Link, PostCard, PostView};
use crate::routes::{or_empty, Html};
use crate::state::AppState;

const LIST_LIMIT: usize = 24;

#[derive(Template)]
#[template(path = "pages/insights.html")]
pub struct InsightsTemplate {
    pub chrome: Chrome,
    pub heading: String,
    pub description: String,
    pub active_category: String,
    pub categories: Vec<Link>,
    pub posts: Vec<PostCard>,
}

#[derive(Default)]
pub struct CommentFormView {
    pub name: String,
    pub email: String,
    pub comment: String,
}

#[derive(Template)]
#[template(path = "pages/post.html")]
pub struct PostTemplate {
    pub chrome: Chrome,
    pub post: PostView,
    pub comments: Vec<CommentView>,
    pub notice: String,
    pub error: String,
    pub form: CommentFormView,
}

#[derive(Deserialize, Default)]
pub struct PostQuery {
    pub comment: Option<String>,
}

#[derive(Deserialize)]
pub struct CommentForm {
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub email: String,
    #[serde(default)]
    pub comment: String,
}

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/insights", get(list))
        .route("/insights/category/{slug}", get(category))
        .route("/insights/{slug}", get(show))
        .route("/insights/{slug}/comments", post(submit_comment))
}

async fn category_links(state: &AppState) -> Vec<Link> {
    or_empty(state.content.categories().await, "categories")
        .iter()
        .map(Link::from)
        .collect()
}

pub async fn list(State(state): State<AppState>, chrome: Chrome) -> Response {
    let posts = or_empty(state.content.latest_posts(LIST_LIMIT).await, "posts");
    Html(InsightsTemplate {
        chrome,
        heading: "Insights".to_string(),
        description: "Analysis, updates and stories from our campaigns.".to_string(),
        active_category: String::new(),
        categories: category_links(&state).await,
        posts: posts
            .iter()
            .map(|p| PostCard::new(p, &state.images))
            .collect(),
    })
    .into_response()
}

pub async fn category(
    State(state): State<AppState>,
    chrome: Chrome,
    Path(slug): Path<String>,
) -> Response {
    let category = match state.content.category_by_slug(&slug).await {
        Ok(Some(category)) => category,
        Ok(None) => return not_found_response(chrome),
        Err(e) => {
            tracing::warn!(%slug, "Category lookup failed: {}", e);
            return not_found_response(chrome);
        }
    };
    let posts = or_empty(state.content.posts_in_category(&slug).await, "category posts");

    Html(InsightsTemplate {
        chrome,
        heading: category.title.clone(),
        description: category.description.clone().unwrap_or_default(),
        active_category: Link::from(&category).href,
        categories: category_links(&state).await,
        posts: posts
            .iter()
            .map(|p| PostCard::new(p, &state.images))
            .collect(),
    })
    .into_response()
}

/// Slug pages treat a store failure the same as a miss.
async fn load_post(state: &AppState, slug: &str) -> Option<Post> {
    match state.content.post_by_slug(slug).await {
        Ok(post) => post,
        Err(e) => {
            tracing::warn!(%slug, "Post lookup failed: {}", e);
            None
        }
    }
}

async fn render_post(
    state: &AppState,
    chrome: Chrome,
    post: &Post,
    notice: String,
    error: String,
    form: CommentFormView,
) -> PostTemplate {
    let comments = or_empty(state.content.approved_comments(&post.id).await, "comments");
    PostTemplate {
        chrome,
        post: PostView::new(post, &state.images),
        comments: comments.iter().map(CommentView::from).collect(),
        notice,
        error,
        form,
    }
}

pub async fn show(
    State(state): State<AppState>,
    chrome: Chrome,
    Path(slug): Path<String>,
    Query(query): Query<PostQuery>,
) -> Response {
    let Some(post) = load_post(&state, &slug).await else {
        return not_found_response(chrome);
    };
    let notice = match query.comment.as_deref() {
        Some("pending") => "Thanks! Your comment will appear once a moderator approves it.",
        _ => "",
    };
    let page = render_post(
        &state,
        chrome,
        &post,
        notice.to_string(),
        String::new(),
        CommentFormView::default(),
    )
    .await;
    Html(page).into_response()
}

/// POST /insights/{slug}/comments: queue a comment for moderation
pub async fn submit_comment(
    State(state): State<AppState>,
    chrome: Chrome,
    Path(slug): Path<String>,
    Form(form): Form<CommentForm>,
) -> AppResult<Response> {
    let Some(post) = load_post(&state, &slug).await else {
        return Ok(not_found_response(chrome));
    };

    let submission = NewComment {
        post_id: post.id.clone(),
        name: form.name.clone(),
        email: form.email.clone(),
        comment: form.comment.clone(),
    };

    let error = match state.content.create_comment(submission).await {
        Ok(id) => {
            tracing::info!(comment_id = %id, post = %slug, "Comment queued for moderation");
            return Ok(Redirect::to(&pending_comment_url(&slug)).into_response());
        }
        Err(ContentError::Invalid(message)) => message,
        Err(ContentError::ReadOnly) => {
            "Comments are not being accepted right now. Please try again later.".to_string()
        }
        Err(e) => return Err(AppError::Content(e)),
    };

    let page = render_post(
        &state,
        chrome,
        &post,
        String::new(),
        error,
        CommentFormView {
            name: form.name,
            email: form.email,
            comment: form.comment,
        },
    )
    .await;
    Ok((StatusCode::BAD_REQUEST, Html(page)).into_response())
}

/// Post page URL after a queued comment. The slug is percent-encoded as one
/// path segment so it cannot break out into another path, query or header.
fn pending_comment_url(slug: &str) -> String {
    // byte_serialize leaves spaces as '+', which a path would keep literally
    let segment: String = url::form_urlencoded::byte_serialize(slug.as_bytes())
        .collect::<String>()
        .replace('+', "%20");
    format!("/insights/{}?comment=pending#comments", segment)
}
