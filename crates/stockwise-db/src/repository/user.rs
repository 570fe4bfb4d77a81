//! # User Repository
//!
//! Back-office users. Password hashes are written here and never read back
//! into [`User`]; authentication itself lives outside this crate.

use chrono::Utc;
use sqlx::SqlitePool;
use tracing::debug;

use crate::error::{DbError, DbResult};
use stockwise_core::validation::{validate_email, validate_required_text};
use stockwise_core::{NewUser, User};

const USER_COLUMNS: &str = "user_id, name, email, role, created_at, updated_at";

/// Repository for user database operations.
#[derive(Debug, Clone)]
pub struct UserRepository {
    pool: SqlitePool,
}

impl UserRepository {
    /// Creates a new UserRepository.
    pub fn new(pool: SqlitePool) -> Self {
        UserRepository { pool }
    }

    /// Inserts a user.
    ///
    /// ## Errors
    /// * `DbError::UniqueViolation` - Email already registered
    pub async fn insert(&self, user: &NewUser) -> DbResult<User> {
        let name = validate_required_text("name", &user.name, 100)?;
        let email = validate_email(&user.email)?;
        validate_required_text("password_hash", &user.password_hash, 512)?;

        debug!(email = %email, role = %user.role, "Inserting user");

        let sql = format!(
            r#"
            INSERT INTO users (name, email, password_hash, role, created_at, updated_at)
            VALUES (?1, ?2, ?3, ?4, ?5, ?5)
            RETURNING {}
            "#,
            USER_COLUMNS
        );
        let inserted = sqlx::query_as::<_, User>(&sql)
            .bind(&name)
            .bind(&email)
            .bind(&user.password_hash)
            .bind(user.role)
            .bind(Utc::now())
            .fetch_one(&self.pool)
            .await?;

        Ok(inserted)
    }

    pub async fn get_by_id(&self, user_id: i64) -> DbResult<Option<User>> {
        let sql = format!("SELECT {} FROM users WHERE user_id = ?1", USER_COLUMNS);
        let user = sqlx::query_as::<_, User>(&sql)
            .bind(user_id)
            .fetch_optional(&self.pool)
            .await?;

        Ok(user)
    }

    pub async fn get(&self, user_id: i64) -> DbResult<User> {
        self.get_by_id(user_id)
            .await?
            .ok_or_else(|| DbError::not_found("User", user_id))
    }

    /// Looks a user up by email (case-insensitive).
    pub async fn get_by_email(&self, email: &str) -> DbResult<Option<User>> {
        let sql = format!("SELECT {} FROM users WHERE email = ?1", USER_COLUMNS);
        let user = sqlx::query_as::<_, User>(&sql)
            .bind(email.trim().to_lowercase())
            .fetch_optional(&self.pool)
            .await?;

        Ok(user)
    }

    pub async fn list(&self) -> DbResult<Vec<User>> {
        let sql = format!("SELECT {} FROM users ORDER BY name, user_id", USER_COLUMNS);
        let users = sqlx::query_as::<_, User>(&sql)
            .fetch_all(&self.pool)
            .await?;

        Ok(users)
    }

    pub async fn count(&self) -> DbResult<i64> {
        let count: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM users")
            .fetch_one(&self.pool)
            .await?;

        Ok(count)
    }
}
