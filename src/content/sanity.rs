use std::time::Duration;

use async_trait::async_trait;
use serde::Deserialize;
use serde_json::{json, Value};
use url::Url;

use crate::config::ContentConfig;
use crate::content::documents::{Document, NewComment};
use crate::content::query::ContentQuery;
use crate::content::{comment_payload, ContentError, ContentStore};

#[derive(Deserialize)]
struct QueryResponse {
    #[serde(default)]
    result: Value,
}

#[derive(Deserialize)]
struct MutateResponse {
    #[serde(default)]
    results: Vec<MutateResult>,
}

#[derive(Deserialize)]
struct MutateResult {
    id: String,
}

/// Remote headless CMS over its HTTP query and mutate APIs.
pub struct SanityStore {
    client: reqwest::Client,
    query_base: Url,
    mutate_base: Url,
    token: Option<String>,
}

impl SanityStore {
    pub fn new(config: &ContentConfig, project_id: &str) -> Result<Self, ContentError> {
        let host = if config.use_cdn && config.token.is_none() {
            "apicdn.sanity.io"
        } else {
            "api.sanity.io"
        };
        let query_base = Url::parse(&format!(
            "https://{}.{}/v{}/data/query/{}",
            project_id, host, config.api_version, config.dataset
        ))?;
        let mutate_base = Url::parse(&format!(
            "https://{}.api.sanity.io/v{}/data/mutate/{}",
            project_id, config.api_version, config.dataset
        ))?;

        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(config.timeout_secs))
            .build()?;

        Ok(Self {
            client,
            query_base,
            mutate_base,
            token: config.token.clone(),
        })
    }

    pub fn query_url(&self, query: &ContentQuery) -> Url {
        let mut url = self.query_base.clone();
        {
            let mut pairs = url.query_pairs_mut();
            pairs.append_pair("query", &query.to_groq());
            for (name, value) in query.params() {
                pairs.append_pair(&name, &value);
            }
            pairs.append_pair("perspective", "published");
        }
        url
    }

    async fn error_for(response: reqwest::Response) -> ContentError {
        let status = response.status().as_u16();
        let message = response
            .text()
            .await
            .unwrap_or_else(|e| format!("<unreadable body: {}>", e));
        ContentError::Api { status, message }
    }
}

/// Decode query results one by one so a single malformed document does
/// not blank a whole listing.
pub fn decode_results(result: Value) -> Vec<Document> {
    let items = match result {
        Value::Array(items) => items,
        Value::Null => Vec::new(),
        single => vec![single],
    };
    items
        .into_iter()
        .filter_map(|item| {
            let id = item
                .get("_id")
                .and_then(Value::as_str)
                .unwrap_or("?")
                .to_string();
            match serde_json::from_value::<Document>(item) {
                Ok(doc) => Some(doc),
                Err(e) => {
                    tracing::warn!(document = %id, "Skipping malformed document: {}", e);
                    None
                }
            }
        })
        .collect()
}

#[async_trait]
impl ContentStore for SanityStore {
    async fn fetch(&self, query: &ContentQuery) -> Result<Vec<Document>, ContentError> {
        let url = self.query_url(query);
        tracing::debug!(groq = %query.to_groq(), "Querying content store");

        let mut request = self.client.get(url);
        if let Some(ref token) = self.token {
            request = request.bearer_auth(token);
        }
        let response = request.send().await?;
        if !response.status().is_success() {
            return Err(Self::error_for(response).await);
        }

        let body: QueryResponse = response.json().await?;
        Ok(decode_results(body.result))
    }

    async fn create_comment(&self, comment: NewComment) -> Result<String, ContentError> {
        let token = self.token.as_ref().ok_or(ContentError::ReadOnly)?;
        let payload = comment_payload(&comment)?;

        let mut url = self.mutate_base.clone();
        url.query_pairs_mut().append_pair("returnIds", "true");

        let response = self
            .client
            .post(url)
            .bearer_auth(token)
            .json(&json!({ "mutations": [{ "create": payload }] }))
            .send()
            .await?;
        if !response.status().is_success() {
            return Err(Self::error_for(response).await);
        }

        let body: MutateResponse = response.json().await?;
        let id = body
            .results
            .into_iter()
            .next()
            .map(|r| r.id)
            .ok_or_else(|| ContentError::Api {
                status: 200,
                message: "mutation returned no document id".into(),
            })?;
        tracing::info!(comment_id = %id, post_id = %comment.post_id, "Comment submitted for moderation");
        Ok(id)
    }
}
