pub mod documents;
pub mod fixtures;
pub mod image;
pub mod portable_text;
pub mod query;
pub mod sanity;

use async_trait::async_trait;
use chrono::Utc;
use thiserror::Error;

use crate::schema;
use documents::{Category, Comment, Document, DocumentType, Event, NewComment, Post, TeamMember};
use query::{ContentQuery, Filter, Order};

pub use fixtures::FixtureStore;
pub use sanity::SanityStore;

#[derive(Debug, Error)]
pub enum ContentError {
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("Content API returned {status}: {message}")]
    Api { status: u16, message: String },

    #[error("Decode error: {0}")]
    Decode(#[from] serde_json::Error),

    #[error("URL error: {0}")]
    Url(#[from] url::ParseError),

    #[error("Fixture file error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Content store is read-only")]
    ReadOnly,

    #[error("{0}")]
    Invalid(String),
}

macro_rules! typed {
    ($docs:expr, $variant:path) => {
        $docs
            .into_iter()
            .filter_map(|doc| match doc {
                $variant(inner) => Some(inner),
                _ => None,
            })
            .collect::<Vec<_>>()
    };
}

/// Read access to CMS documents plus the single public write path
/// (comment submission). Errors propagate; there is no retry.
#[async_trait]
pub trait ContentStore: Send + Sync {
    async fn fetch(&self, query: &ContentQuery) -> Result<Vec<Document>, ContentError>;

    /// Store a comment for moderation. Implementations must force
    /// `approved = false`.
    async fn create_comment(&self, comment: NewComment) -> Result<String, ContentError>;

    async fn latest_posts(&self, limit: usize) -> Result<Vec<Post>, ContentError> {
        let query = ContentQuery::of(DocumentType::Post)
            .order(Order::PublishedDesc)
            .limit(limit);
        Ok(typed!(self.fetch(&query).await?, Document::Post))
    }

    async fn post_by_slug(&self, slug: &str) -> Result<Option<Post>, ContentError> {
        let query = ContentQuery::of(DocumentType::Post).slug(slug).limit(1);
        Ok(typed!(self.fetch(&query).await?, Document::Post).into_iter().next())
    }

    async fn posts_in_category(&self, category: &str) -> Result<Vec<Post>, ContentError> {
        let query = ContentQuery::of(DocumentType::Post)
            .filter(Filter::Category(category.to_string()))
            .order(Order::PublishedDesc);
        Ok(typed!(self.fetch(&query).await?, Document::Post))
    }

    async fn categories(&self) -> Result<Vec<Category>, ContentError> {
        let query = ContentQuery::of(DocumentType::Category).order(Order::TitleAsc);
        Ok(typed!(self.fetch(&query).await?, Document::Category))
    }

    async fn category_by_slug(&self, slug: &str) -> Result<Option<Category>, ContentError> {
        let query = ContentQuery::of(DocumentType::Category).slug(slug).limit(1);
        Ok(typed!(self.fetch(&query).await?, Document::Category).into_iter().next())
    }

    async fn events(&self) -> Result<Vec<Event>, ContentError> {
        let query = ContentQuery::of(DocumentType::Event).order(Order::StartsAsc);
        Ok(typed!(self.fetch(&query).await?, Document::Event))
    }

    async fn team(&self) -> Result<Vec<TeamMember>, ContentError> {
        let query = ContentQuery::of(DocumentType::TeamMember).order(Order::DisplayOrder);
        Ok(typed!(self.fetch(&query).await?, Document::TeamMember))
    }

    async fn approved_comments(&self, post_id: &str) -> Result<Vec<Comment>, ContentError> {
        let query = ContentQuery::of(DocumentType::Comment)
            .filter(Filter::Post(post_id.to_string()))
            .filter(Filter::Approved)
            .order(Order::CreatedAsc);
        Ok(typed!(self.fetch(&query).await?, Document::Comment))
    }
}

/// Check a comment submission against the comment schema and build the
/// document payload sent to the store.
pub fn comment_payload(comment: &NewComment) -> Result<serde_json::Value, ContentError> {
    let trimmed = |s: &str| s.trim().to_string();
    let payload = serde_json::json!({
        "_type": "comment",
        "name": Some(trimmed(&comment.name)).filter(|s| !s.is_empty()),
        "email": Some(trimmed(&comment.email)).filter(|s| !s.is_empty()),
        "comment": Some(trimmed(&comment.comment)).filter(|s| !s.is_empty()),
        "post": { "_type": "reference", "_ref": comment.post_id },
        "approved": false,
        "_createdAt": Utc::now(),
    });

    let missing = schema::comment().missing_required(&payload);
    if !missing.is_empty() {
        return Err(ContentError::Invalid(format!(
            "Please fill in: {}",
            missing.join(", ")
        )));
    }
    if !comment.email.contains('@') {
        return Err(ContentError::Invalid(
            "Please enter a valid email address.".into(),
        ));
    }
    if comment.comment.chars().count() > 5000 {
        return Err(ContentError::Invalid("Comment is too long.".into()));
    }
    Ok(payload)
}
