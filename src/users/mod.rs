// User store - one contract, one SQLite-backed implementation
pub mod repository;
pub mod validation;

use async_trait::async_trait;
use thiserror::Error;

use crate::db::models::{NewUser, User};

pub use repository::SqliteUserStore;
pub use validation::{normalize_email, ValidNewUser};

#[derive(Debug, Error)]
pub enum UserStoreError {
    #[error("User with this email already exists.")]
    DuplicateEmail,

    #[error("{0}")]
    Validation(String),

    #[error("Pool error: {0}")]
    Pool(#[from] r2d2::Error),

    #[error("SQL error: {0}")]
    Sql(#[from] rusqlite::Error),

    #[error("Password hashing error: {0}")]
    Hash(#[from] bcrypt::BcryptError),

    #[error("Corrupt user record: {0}")]
    Corrupt(String),

    #[error("Background task failed: {0}")]
    Join(#[from] tokio::task::JoinError),
}

impl UserStoreError {
    /// Errors the caller caused, as opposed to infrastructure failures.
    pub fn is_client_error(&self) -> bool {
        matches!(self, Self::DuplicateEmail | Self::Validation(_))
    }
}

#[async_trait]
pub trait UserStore: Send + Sync {
    /// Case-insensitive lookup.
    async fn find_by_email(&self, email: &str) -> Result<Option<User>, UserStoreError>;

    async fn find_by_id(&self, id: &str) -> Result<Option<User>, UserStoreError>;

    /// Validate, hash the password, and insert. Fails with `DuplicateEmail`
    /// if the (case-folded) email is taken.
    async fn create(&self, input: NewUser) -> Result<User, UserStoreError>;

    /// Returns the user when the password matches the stored hash.
    async fn verify_credentials(
        &self,
        email: &str,
        password: &str,
    ) -> Result<Option<User>, UserStoreError>;

    async fn count(&self) -> Result<i64, UserStoreError>;

    /// Cheap connectivity check for diagnostics.
    async fn ping(&self) -> Result<(), UserStoreError>;
}
