use std::sync::Arc;

use r2d2::Pool;
use r2d2_sqlite::SqliteConnectionManager;

use crate::auth::session::SessionKeys;
use crate::config::Config;
use crate::content::image::ImageUrls;
use crate::content::{ContentStore, FixtureStore, SanityStore};
use crate::users::{SqliteUserStore, UserStore};

pub type DbPool = Pool<SqliteConnectionManager>;

#[derive(Clone)]
pub struct AppState {
    pub config: Config,
    pub users: Arc<dyn UserStore>,
    pub content: Arc<dyn ContentStore>,
    pub sessions: Arc<SessionKeys>,
    pub images: ImageUrls,
}

impl AppState {
    /// Wire the stores for a validated config. The pool is owned by the
    /// caller so it can be inspected at shutdown.
    pub fn new(config: Config, pool: DbPool) -> anyhow::Result<Self> {
        let users = Arc::new(
            SqliteUserStore::new(pool, config.auth.bcrypt_cost)
                .with_admins(&config.auth.admin_emails),
        );
        let content = content_store(&config)?;
        let images = ImageUrls::new(
            config.content.project_id.clone().unwrap_or_default(),
            config.content.dataset.clone(),
        );
        Ok(Self {
            sessions: Arc::new(SessionKeys::new(config.session_secret())),
            config,
            users,
            content,
            images,
        })
    }
}

/// The CMS when a project is configured, else the fixture file, else an
/// empty in-memory store.
pub fn content_store(config: &Config) -> anyhow::Result<Arc<dyn ContentStore>> {
    if let Some(project) = config.content.project_id.as_deref() {
        tracing::info!(
            project,
            dataset = %config.content.dataset,
            "Using remote content store"
        );
        return Ok(Arc::new(SanityStore::new(&config.content, project)?));
    }
    match config.content.fixtures {
        Some(ref path) => Ok(Arc::new(FixtureStore::load(path)?)),
        None => {
            tracing::warn!("No content project or fixture file configured; content pages will be empty");
            Ok(Arc::new(FixtureStore::default()))
        }
    }
}
