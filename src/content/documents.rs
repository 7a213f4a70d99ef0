//! Typed CMS documents. Each variant mirrors the projection the query layer
//! asks for, so references (author, categories) arrive already resolved.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::content::portable_text::BodyBlock;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum DocumentType {
    Post,
    Author,
    Category,
    TeamMember,
    Event,
    Comment,
}

impl DocumentType {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Post => "post",
            Self::Author => "author",
            Self::Category => "category",
            Self::TeamMember => "teamMember",
            Self::Event => "event",
            Self::Comment => "comment",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Default)]
pub struct Slug {
    pub current: String,
}

impl Slug {
    pub fn new(current: impl Into<String>) -> Self {
        Self {
            current: current.into(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Reference {
    #[serde(rename = "_ref")]
    pub id: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ImageAsset {
    pub asset: Reference,
    #[serde(default)]
    pub alt: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AuthorSummary {
    pub name: String,
    #[serde(default)]
    pub slug: Option<Slug>,
    #[serde(default)]
    pub image: Option<ImageAsset>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CategorySummary {
    pub title: String,
    pub slug: Slug,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Post {
    #[serde(rename = "_id")]
    pub id: String,
    pub title: String,
    pub slug: Slug,
    #[serde(default)]
    pub author: Option<AuthorSummary>,
    #[serde(default)]
    pub main_image: Option<ImageAsset>,
    #[serde(default)]
    pub categories: Vec<CategorySummary>,
    #[serde(default)]
    pub published_at: Option<DateTime<Utc>>,
    #[serde(default)]
    pub excerpt: Option<String>,
    #[serde(default)]
    pub body: Vec<BodyBlock>,
}

impl Post {
    pub fn in_category(&self, slug: &str) -> bool {
        self.categories.iter().any(|c| c.slug.current == slug)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Author {
    #[serde(rename = "_id")]
    pub id: String,
    pub name: String,
    pub slug: Slug,
    #[serde(default)]
    pub image: Option<ImageAsset>,
    #[serde(default)]
    pub bio: Vec<BodyBlock>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Category {
    #[serde(rename = "_id")]
    pub id: String,
    pub title: String,
    pub slug: Slug,
    #[serde(default)]
    pub description: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TeamMember {
    #[serde(rename = "_id")]
    pub id: String,
    pub name: String,
    #[serde(default)]
    pub role: Option<String>,
    #[serde(default)]
    pub image: Option<ImageAsset>,
    #[serde(default)]
    pub bio: Option<String>,
    #[serde(default)]
    pub order: Option<i64>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Event {
    #[serde(rename = "_id")]
    pub id: String,
    pub title: String,
    pub slug: Slug,
    pub starts_at: DateTime<Utc>,
    #[serde(default)]
    pub ends_at: Option<DateTime<Utc>>,
    #[serde(default)]
    pub location: Option<String>,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default)]
    pub registration_url: Option<String>,
}

impl Event {
    pub fn is_upcoming(&self, now: DateTime<Utc>) -> bool {
        self.ends_at.unwrap_or(self.starts_at) >= now
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Comment {
    #[serde(rename = "_id")]
    pub id: String,
    pub name: String,
    /// Kept for moderators; never rendered publicly.
    #[serde(default)]
    pub email: Option<String>,
    pub comment: String,
    pub post: Reference,
    #[serde(default)]
    pub approved: bool,
    #[serde(rename = "_createdAt", default)]
    pub created_at: Option<DateTime<Utc>>,
}

/// One variant per document type, tagged by the CMS `_type` field.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "_type", rename_all = "camelCase")]
pub enum Document {
    Post(Post),
    Author(Author),
    Category(Category),
    TeamMember(TeamMember),
    Event(Event),
    Comment(Comment),
}

impl Document {
    pub fn doc_type(&self) -> DocumentType {
        match self {
            Self::Post(_) => DocumentType::Post,
            Self::Author(_) => DocumentType::Author,
            Self::Category(_) => DocumentType::Category,
            Self::TeamMember(_) => DocumentType::TeamMember,
            Self::Event(_) => DocumentType::Event,
            Self::Comment(_) => DocumentType::Comment,
        }
    }

    pub fn id(&self) -> &str {
        match self {
            Self::Post(d) => &d.id,
            Self::Author(d) => &d.id,
            Self::Category(d) => &d.id,
            Self::TeamMember(d) => &d.id,
            Self::Event(d) => &d.id,
            Self::Comment(d) => &d.id,
        }
    }

    pub fn slug(&self) -> Option<&str> {
        match self {
            Self::Post(d) => Some(&d.slug.current),
            Self::Author(d) => Some(&d.slug.current),
            Self::Category(d) => Some(&d.slug.current),
            Self::Event(d) => Some(&d.slug.current),
            Self::TeamMember(_) | Self::Comment(_) => None,
        }
    }
}

/// Comment submission from the public post page.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NewComment {
    pub post_id: String,
    pub name: String,
    pub email: String,
    pub comment: String,
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn post_deserializes_from_projection() {
        let doc: Document = serde_json::from_value(json!({
            "_type": "post",
            "_id": "p1",
            "title": "Housing First",
            "slug": { "current": "housing-first" },
            "author": { "name": "Dana" },
            "mainImage": { "asset": { "_ref": "image-abc-800x600-jpg" }, "alt": "Homes" },
            "categories": [{ "title": "Housing", "slug": { "current": "housing" } }],
            "publishedAt": "2024-03-01T12:00:00Z",
            "body": []
        }))
        .unwrap();

        let Document::Post(post) = doc else {
            panic!("expected a post");
        };
        assert_eq!(post.slug.current, "housing-first");
        assert!(post.in_category("housing"));
        assert!(!post.in_category("health"));
        assert_eq!(post.main_image.unwrap().alt.as_deref(), Some("Homes"));
    }

    #[test]
    fn team_member_tag_is_camel_case() {
        let doc: Document = serde_json::from_value(json!({
            "_type": "teamMember",
            "_id": "t1",
            "name": "Robin",
            "role": "Director"
        }))
        .unwrap();
        assert_eq!(doc.doc_type(), DocumentType::TeamMember);
        assert_eq!(doc.doc_type().as_str(), "teamMember");
        assert_eq!(doc.slug(), None);
    }

    #[test]
    fn unknown_type_is_an_error() {
        let result: Result<Document, _> = serde_json::from_value(json!({
            "_type": "sanity.imageAsset",
            "_id": "x"
        }));
        assert!(result.is_err());
    }

    #[test]
    fn comment_defaults_to_unapproved() {
        let doc: Document = serde_json::from_value(json!({
            "_type": "comment",
            "_id": "c1",
            "name": "Sam",
            "comment": "Great piece",
            "post": { "_ref": "p1" }
        }))
        .unwrap();
        let Document::Comment(comment) = doc else {
            panic!("expected a comment");
        };
        assert!(!comment.approved);
    }

    #[test]
    fn event_upcoming_uses_end_time() {
        let event = Event {
            id: "e1".into(),
            title: "Town hall".into(),
            slug: Slug::new("town-hall"),
            starts_at: "2024-01-01T10:00:00Z".parse().unwrap(),
            ends_at: Some("2024-01-03T10:00:00Z".parse().unwrap()),
            location: None,
            description: None,
            registration_url: None,
        };
        assert!(event.is_upcoming("2024-01-02T00:00:00Z".parse().unwrap()));
        assert!(!event.is_upcoming("2024-01-04T00:00:00Z".parse().unwrap()));
    }
}
