use std::path::Path;

use async_trait::async_trait;
use chrono::Utc;
use tokio::sync::RwLock;

use crate::content::documents::{Comment, Document, NewComment, Reference};
use crate::content::query::ContentQuery;
use crate::content::{comment_payload, ContentError, ContentStore};

/// In-memory content store for local development and tests. Seeded from a
/// JSON array of documents in their projected shape.
#[derive(Default)]
pub struct FixtureStore {
    documents: RwLock<Vec<Document>>,
}

impl FixtureStore {
    pub fn new(documents: Vec<Document>) -> Self {
        Self {
            documents: RwLock::new(documents),
        }
    }

    pub fn load(path: &Path) -> Result<Self, ContentError> {
        let raw = std::fs::read_to_string(path)?;
        let documents: Vec<Document> = serde_json::from_str(&raw)?;
        tracing::info!(
            "Loaded {} fixture documents from {}",
            documents.len(),
            path.display()
        );
        Ok(Self::new(documents))
    }

    /// Flip a pending comment to approved, as an editor would in the CMS.
    pub async fn approve_comment(&self, id: &str) -> bool {
        let mut docs = self.documents.write().await;
        let pending = docs.iter_mut().find_map(|doc| match doc {
            Document::Comment(c) if c.id == id => Some(c),
            _ => None,
        });
        match pending {
            Some(comment) => {
                comment.approved = true;
                true
            }
            None => false,
        }
    }

    pub async fn pending_comments(&self) -> Vec<Comment> {
        self.documents
            .read()
            .await
            .iter()
            .filter_map(|doc| match doc {
                Document::Comment(c) if !c.approved => Some(c.clone()),
                _ => None,
            })
            .collect()
    }
}

#[async_trait]
impl ContentStore for FixtureStore {
    async fn fetch(&self, query: &ContentQuery) -> Result<Vec<Document>, ContentError> {
        let docs = self.documents.read().await;
        let mut found = query.apply(docs.iter());
        // Same field set the remote projection returns
        for doc in &mut found {
            if let Document::Comment(c) = doc {
                c.email = None;
            }
        }
        Ok(found)
    }

    async fn create_comment(&self, comment: NewComment) -> Result<String, ContentError> {
        comment_payload(&comment)?;

        let id = uuid::Uuid::now_v7().to_string();
        let doc = Document::Comment(Comment {
            id: id.clone(),
            name: comment.name.trim().to_string(),
            email: Some(comment.email.trim().to_string()),
            comment: comment.comment.trim().to_string(),
            post: Reference {
                id: comment.post_id,
            },
            approved: false,
            created_at: Some(Utc::now()),
        });
        self.documents.write().await.push(doc);
        Ok(id)
    }
}
