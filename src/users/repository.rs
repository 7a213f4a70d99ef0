// SQLite user store - all user persistence side effects live here
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use rusqlite::{params, ErrorCode, OptionalExtension, Row};

use crate::db::models::{NewUser, Role, User};
use crate::state::DbPool;
use crate::users::{normalize_email, UserStore, UserStoreError};

const USER_COLUMNS: &str = "id, email, password_hash, name, role, created_at";

pub struct SqliteUserStore {
    pool: DbPool,
    bcrypt_cost: u32,
    admin_emails: Vec<String>,
}

impl SqliteUserStore {
    pub fn new(pool: DbPool, bcrypt_cost: u32) -> Self {
        Self {
            pool,
            bcrypt_cost,
            admin_emails: Vec::new(),
        }
    }

    /// Emails that are granted the admin role. Matched after normalization.
    pub fn with_admins<I, S>(mut self, emails: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        self.admin_emails = emails
            .into_iter()
            .map(|e| normalize_email(e.as_ref()))
            .filter(|e| !e.is_empty())
            .collect();
        self
    }

    fn role_for(&self, email: &str) -> Role {
        if self.admin_emails.iter().any(|a| a == email) {
            Role::Admin
        } else {
            Role::Member
        }
    }

    fn set_role(&self, id: &str, role: Role) -> Result<(), UserStoreError> {
        let conn = self.pool.get()?;
        conn.execute(
            "UPDATE users SET role = ?1 WHERE id = ?2",
            params![role.as_str(), id],
        )?;
        Ok(())
    }

    fn find_one(&self, column: &str, value: &str) -> Result<Option<User>, UserStoreError> {
        let conn = self.pool.get()?;
        let sql = format!("SELECT {} FROM users WHERE {} = ?1", USER_COLUMNS, column);
        let raw = conn
            .query_row(&sql, params![value], RawUser::from_row)
            .optional()?;
        raw.map(RawUser::into_user).transpose()
    }
}

/// Row as stored, before role and timestamp parsing.
struct RawUser {
    id: String,
    email: String,
    password_hash: String,
    name: String,
    role: String,
    created_at: String,
}

impl RawUser {
    fn from_row(row: &Row<'_>) -> rusqlite::Result<Self> {
        Ok(Self {
            id: row.get(0)?,
            email: row.get(1)?,
            password_hash: row.get(2)?,
            name: row.get(3)?,
            role: row.get(4)?,
            created_at: row.get(5)?,
        })
    }

    fn into_user(self) -> Result<User, UserStoreError> {
        let role = self.role.parse::<Role>().map_err(UserStoreError::Corrupt)?;
        let created_at = DateTime::parse_from_rfc3339(&self.created_at)
            .map(|dt| dt.with_timezone(&Utc))
            .map_err(|e| UserStoreError::Corrupt(format!("created_at: {}", e)))?;
        Ok(User {
            id: self.id,
            email: self.email,
            name: self.name,
            role,
            password_hash: self.password_hash,
            created_at,
        })
    }
}

fn is_unique_violation(err: &rusqlite::Error) -> bool {
    matches!(
        err,
        rusqlite::Error::SqliteFailure(e, _) if e.code == ErrorCode::ConstraintViolation
    )
}

#[async_trait]
impl UserStore for SqliteUserStore {
    async fn find_by_email(&self, email: &str) -> Result<Option<User>, UserStoreError> {
        self.find_one("email", &normalize_email(email))
    }

    async fn find_by_id(&self, id: &str) -> Result<Option<User>, UserStoreError> {
        self.find_one("id", id)
    }

    async fn create(&self, input: NewUser) -> Result<User, UserStoreError> {
        // Reject bad input before touching the database
        let valid = input.validate()?;

        if self.find_one("email", &valid.email)?.is_some() {
            return Err(UserStoreError::DuplicateEmail);
        }

        let cost = self.bcrypt_cost;
        let password = valid.password;
        let password_hash =
            tokio::task::spawn_blocking(move || bcrypt::hash(password, cost)).await??;

        let role = self.role_for(&valid.email);
        let user = User {
            id: uuid::Uuid::now_v7().to_string(),
            email: valid.email,
            role,
            name: valid.name,
            password_hash,
            created_at: Utc::now(),
        };

        let conn = self.pool.get()?;
        let inserted = conn.execute(
            "INSERT INTO users (id, email, password_hash, name, role, created_at)
             VALUES (?1, ?2, ?3, ?4, ?5, ?6)",
            params![
                user.id,
                user.email,
                user.password_hash,
                user.name,
                user.role.as_str(),
                user.created_at.to_rfc3339(),
            ],
        );

        match inserted {
            Ok(_) => {
                tracing::info!(user_id = %user.id, "Created user");
                Ok(user)
            }
            // Lost a race with a concurrent sign-up for the same email
            Err(e) if is_unique_violation(&e) => Err(UserStoreError::DuplicateEmail),
            Err(e) => Err(e.into()),
        }
    }

    async fn verify_credentials(
        &self,
        email: &str,
        password: &str,
    ) -> Result<Option<User>, UserStoreError> {
        let Some(user) = self.find_by_email(email).await? else {
            return Ok(None);
        };

        let hash = user.password_hash.clone();
        let password = password.to_string();
        let matches =
            tokio::task::spawn_blocking(move || bcrypt::verify(password, &hash).unwrap_or(false))
                .await?;

        if !matches {
            return Ok(None);
        }

        // Accounts listed after they signed up are promoted on their next sign-in
        let mut user = user;
        if user.role == Role::Member && self.role_for(&user.email) == Role::Admin {
            self.set_role(&user.id, Role::Admin)?;
            tracing::info!(user_id = %user.id, "Promoted user to admin");
            user.role = Role::Admin;
        }

        Ok(Some(user))
    }

    async fn count(&self) -> Result<i64, UserStoreError> {
        let conn = self.pool.get()?;
        Ok(conn.query_row("SELECT COUNT(*) FROM users", [], |row| row.get(0))?)
    }

    async fn ping(&self) -> Result<(), UserStoreError> {
        let conn = self.pool.get()?;
        conn.query_row("SELECT 1", [], |row| row.get::<_, i64>(0))?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db;

    fn store() -> (tempfile::TempDir, SqliteUserStore) {
        let tmp = tempfile::tempdir().unwrap();
        let pool = db::create_pool(&tmp.path().join("users.db"), 2).unwrap();
        db::run_migrations(&pool).unwrap();
        (tmp, SqliteUserStore::new(pool, 4))
    }

    fn signup(email: &str) -> NewUser {
        NewUser {
            name: "A".into(),
            email: email.into(),
            password: "Password1!".into(),
        }
    }

    #[tokio::test]
    async fn create_then_find_is_case_insensitive() {
        let (_tmp, store) = store();
        let created = store.create(signup("Someone@Example.com")).await.unwrap();

        let found = store
            .find_by_email("SOMEONE@example.COM")
            .await
            .unwrap()
            .expect("user should exist");
        assert_eq!(found.id, created.id);
        assert_eq!(found.email, "someone@example.com");
        assert_eq!(found.role, Role::Member);
        assert_ne!(found.password_hash, "Password1!");
        assert!(bcrypt::verify("Password1!", &found.password_hash).unwrap());
    }

    #[tokio::test]
    async fn duplicate_email_is_rejected_without_insert() {
        let (_tmp, store) = store();
        store.create(signup("a@b.com")).await.unwrap();

        let err = store.create(signup("A@B.com")).await.unwrap_err();
        assert!(matches!(err, UserStoreError::DuplicateEmail));
        assert_eq!(err.to_string(), "User with this email already exists.");
        assert_eq!(store.count().await.unwrap(), 1);
    }

    #[tokio::test]
    async fn short_password_never_reaches_the_store() {
        let (_tmp, store) = store();
        let err = store
            .create(NewUser {
                name: "A".into(),
                email: "a@b.com".into(),
                password: "short".into(),
            })
            .await
            .unwrap_err();
        assert!(matches!(err, UserStoreError::Validation(_)));
        assert_eq!(store.count().await.unwrap(), 0);
    }

    #[tokio::test]
    async fn verify_credentials_checks_hash() {
        let (_tmp, store) = store();
        store.create(signup("a@b.com")).await.unwrap();

        assert!(store
            .verify_credentials("a@b.com", "Password1!")
            .await
            .unwrap()
            .is_some());
        assert!(store
            .verify_credentials("a@b.com", "wrong-password")
            .await
            .unwrap()
            .is_none());
        assert!(store
            .verify_credentials("nobody@b.com", "Password1!")
            .await
            .unwrap()
            .is_none());
    }

    #[tokio::test]
    async fn find_by_id_round_trips_timestamp() {
        let (_tmp, store) = store();
        let created = store.create(signup("a@b.com")).await.unwrap();
        let found = store.find_by_id(&created.id).await.unwrap().unwrap();
        assert_eq!(found.created_at.timestamp(), created.created_at.timestamp());
        assert!(store.find_by_id("missing").await.unwrap().is_none());
    }

    #[tokio::test]
    async fn listed_email_signs_up_as_admin() {
        let (_tmp, store) = store();
        let store = store.with_admins(["Ops@Example.org"]);

        let admin = store.create(signup("ops@example.org")).await.unwrap();
        assert_eq!(admin.role, Role::Admin);
        let member = store.create(signup("someone@example.org")).await.unwrap();
        assert_eq!(member.role, Role::Member);

        let found = store.find_by_id(&admin.id).await.unwrap().unwrap();
        assert_eq!(found.role, Role::Admin);
    }

    #[tokio::test]
    async fn existing_member_is_promoted_on_sign_in() {
        let (tmp, store) = store();
        let created = store.create(signup("ops@example.org")).await.unwrap();
        assert_eq!(created.role, Role::Member);

        let pool = db::create_pool(&tmp.path().join("users.db"), 2).unwrap();
        let store = SqliteUserStore::new(pool, 4).with_admins(["ops@example.org"]);

        assert!(store
            .verify_credentials("ops@example.org", "wrong-password")
            .await
            .unwrap()
            .is_none());
        assert_eq!(
            store.find_by_id(&created.id).await.unwrap().unwrap().role,
            Role::Member
        );

        let user = store
            .verify_credentials("ops@example.org", "Password1!")
            .await
            .unwrap()
            .unwrap();
        assert_eq!(user.role, Role::Admin);
        assert_eq!(
            store.find_by_id(&created.id).await.unwrap().unwrap().role,
            Role::Admin
        );
    }

    #[tokio::test]
    async fn ping_succeeds_on_live_pool() {
        let (_tmp, store) = store();
        store.ping().await.unwrap();
    }
}
