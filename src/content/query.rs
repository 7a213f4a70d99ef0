use std::cmp::Ordering;

use serde_json::Value;

use crate::content::documents::{Document, DocumentType};

pub const DRAFT_PREFIX: &str = "drafts.";
const PUBLISHED_ONLY: &str = r#"!(_id in path("drafts.**"))"#;

#[derive(Debug, Clone, PartialEq)]
pub enum Filter {
    Slug(String),
    /// Posts tagged with the category whose slug is given
    Category(String),
    Id(String),
    /// Comments attached to the post with this id
    Post(String),
    Approved,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Order {
    PublishedDesc,
    StartsAsc,
    TitleAsc,
    DisplayOrder,
    CreatedAsc,
}

impl Order {
    fn groq(&self) -> &'static str {
        match self {
            Self::PublishedDesc => "publishedAt desc",
            Self::StartsAsc => "startsAt asc",
            Self::TitleAsc => "title asc",
            Self::DisplayOrder => "order asc, name asc",
            Self::CreatedAsc => "_createdAt asc",
        }
    }

    fn compare(&self, a: &Document, b: &Document) -> Ordering {
        // None sorts last in every ordering
        fn opt<T: Ord>(a: Option<T>, b: Option<T>) -> Ordering {
            match (a, b) {
                (Some(a), Some(b)) => a.cmp(&b),
                (Some(_), None) => Ordering::Less,
                (None, Some(_)) => Ordering::Greater,
                (None, None) => Ordering::Equal,
            }
        }

        match (self, a, b) {
            (Self::PublishedDesc, Document::Post(a), Document::Post(b)) => {
                match (a.published_at, b.published_at) {
                    (Some(a), Some(b)) => b.cmp(&a),
                    (a, b) => opt(a, b),
                }
            }
            (Self::StartsAsc, Document::Event(a), Document::Event(b)) => {
                a.starts_at.cmp(&b.starts_at)
            }
            (Self::TitleAsc, Document::Category(a), Document::Category(b)) => a.title.cmp(&b.title),
            (Self::TitleAsc, Document::Post(a), Document::Post(b)) => a.title.cmp(&b.title),
            (Self::TitleAsc, Document::Event(a), Document::Event(b)) => a.title.cmp(&b.title),
            (Self::DisplayOrder, Document::TeamMember(a), Document::TeamMember(b)) => {
                opt(a.order, b.order).then_with(|| a.name.cmp(&b.name))
            }
            (Self::CreatedAsc, Document::Comment(a), Document::Comment(b)) => {
                opt(a.created_at, b.created_at)
            }
            _ => Ordering::Equal,
        }
    }
}

/// A read query against the content store: one document type, optional
/// filters, ordering, and a limit. Renders to GROQ for the remote store and
/// evaluates directly against in-memory documents for fixtures.
#[derive(Debug, Clone, PartialEq)]
pub struct ContentQuery {
    pub doc_type: DocumentType,
    pub filters: Vec<Filter>,
    pub order: Option<Order>,
    pub limit: Option<usize>,
}

impl ContentQuery {
    pub fn of(doc_type: DocumentType) -> Self {
        Self {
            doc_type,
            filters: Vec::new(),
            order: None,
            limit: None,
        }
    }

    pub fn filter(mut self, filter: Filter) -> Self {
        self.filters.push(filter);
        self
    }

    pub fn slug(self, slug: impl Into<String>) -> Self {
        self.filter(Filter::Slug(slug.into()))
    }

    pub fn order(mut self, order: Order) -> Self {
        self.order = Some(order);
        self
    }

    pub fn limit(mut self, limit: usize) -> Self {
        self.limit = Some(limit);
        self
    }

    /// Fields fetched for each type. References are dereferenced so the
    /// result deserializes straight into the typed documents.
    pub fn projection(doc_type: DocumentType) -> &'static str {
        match doc_type {
            DocumentType::Post => {
                r#"{_id, _type, title, slug, "author": author->{name, slug, image}, mainImage, "categories": categories[]->{title, slug}, publishedAt, excerpt, body}"#
            }
            DocumentType::Author => "{_id, _type, name, slug, image, bio}",
            DocumentType::Category => "{_id, _type, title, slug, description}",
            DocumentType::TeamMember => "{_id, _type, name, role, image, bio, order}",
            DocumentType::Event => {
                "{_id, _type, title, slug, startsAt, endsAt, location, description, registrationUrl}"
            }
            // email is deliberately not projected
            DocumentType::Comment => "{_id, _type, _createdAt, name, comment, post, approved}",
        }
    }

    /// Every query skips unpublished drafts, which an authenticated
    /// client would otherwise see next to the published documents.
    pub fn to_groq(&self) -> String {
        let mut conditions = vec![
            format!("_type == \"{}\"", self.doc_type.as_str()),
            PUBLISHED_ONLY.to_string(),
        ];
        for filter in &self.filters {
            conditions.push(
                match filter {
                    Filter::Slug(_) => "slug.current == $slug",
                    Filter::Category(_) => "$category in categories[]->slug.current",
                    Filter::Id(_) => "_id == $id",
                    Filter::Post(_) => "post._ref == $post",
                    Filter::Approved => "approved == true",
                }
                .to_string(),
            );
        }

        let mut groq = format!("*[{}]", conditions.join(" && "));
        if let Some(order) = self.order {
            groq.push_str(&format!(" | order({})", order.groq()));
        }
        if let Some(limit) = self.limit {
            groq.push_str(&format!(" [0...{}]", limit));
        }
        groq.push(' ');
        groq.push_str(Self::projection(self.doc_type));
        groq
    }

    /// Query parameters, values JSON-encoded as the query API expects.
    pub fn params(&self) -> Vec<(String, String)> {
        self.filters
            .iter()
            .filter_map(|filter| {
                let (name, value) = match filter {
                    Filter::Slug(v) => ("slug", v),
                    Filter::Category(v) => ("category", v),
                    Filter::Id(v) => ("id", v),
                    Filter::Post(v) => ("post", v),
                    Filter::Approved => return None,
                };
                Some((format!("${}", name), Value::String(value.clone()).to_string()))
            })
            .collect()
    }

    pub fn matches(&self, doc: &Document) -> bool {
        doc.doc_type() == self.doc_type
            && !doc.id().starts_with(DRAFT_PREFIX)
            && self.filters.iter().all(|filter| match filter {
                Filter::Slug(slug) => doc.slug() == Some(slug.as_str()),
                Filter::Category(category) => {
                    matches!(doc, Document::Post(post) if post.in_category(category))
                }
                Filter::Id(id) => doc.id() == id,
                Filter::Post(post_id) => {
                    matches!(doc, Document::Comment(c) if &c.post.id == post_id)
                }
                Filter::Approved => matches!(doc, Document::Comment(c) if c.approved),
            })
    }

    /// Evaluate against an in-memory set of documents.
    pub fn apply<'a, I>(&self, docs: I) -> Vec<Document>
    where
        I: IntoIterator<Item = &'a Document>,
    {
        let mut found: Vec<Document> = docs
            .into_iter()
            .filter(|d| self.matches(d))
            .cloned()
            .collect();
        if let Some(order) = self.order {
            found.sort_by(|a, b| order.compare(a, b));
        }
        if let Some(limit) = self.limit {
            found.truncate(limit);
        }
        found
    }
}
