//! User repository for database operations

use anyhow::Result;
use argon2::{Argon2, PasswordHash, PasswordHasher, PasswordVerifier, password_hash::SaltString};
use common::UserRole;
use sqlx::{PgPool, Row, postgres::PgRow};
use tracing::info;
use uuid::Uuid;

use crate::models::{NewUser, User};

fn map_user_row(row: &PgRow) -> Result<User> {
    let role: String = row.get("role");

    Ok(User {
        id: row.get("id"),
        username: row.get("username"),
        email: row.get("email"),
        password_hash: row.get("password_hash"),
        role: role
            .parse::<UserRole>()
            .map_err(|e| anyhow::anyhow!("Corrupt user row: {}", e))?,
        is_active: row.get("is_active"),
        refresh_token: row.get("refresh_token"),
        created_at: row.get("created_at"),
    })
}

const USER_COLUMNS: &str =
    "id, username, email, password_hash, role, is_active, refresh_token, created_at";

/// User repository
#[derive(Clone)]
pub struct UserRepository {
    pool: PgPool,
}

impl UserRepository {
    /// Create a new user repository
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    /// Create a new user, hashing the password before it is stored
    pub async fn create(&self, new_user: &NewUser) -> Result<User> {
        info!("Creating new user: {}", new_user.username);

        let salt = SaltString::generate(&mut rand::thread_rng());
        let argon2 = Argon2::default();
        let password_hash = argon2
            .hash_password(new_user.password.as_bytes(), &salt)
            .map_err(|e| anyhow::anyhow!("Failed to hash password: {}", e))?
            .to_string();

        let row = sqlx::query(&format!(
            r#"
            INSERT INTO users (username, email, password_hash, role)
            VALUES ($1, $2, $3, $4)
            RETURNING {USER_COLUMNS}
            "#,
        ))
        .bind(&new_user.username)
        .bind(&new_user.email)
        .bind(&password_hash)
        .bind(new_user.role.as_str())
        .fetch_one(&self.pool)
        .await?;

        map_user_row(&row)
    }

    /// Find a user by username or email
    pub async fn find_by_username_or_email(&self, username_or_email: &str) -> Result<Option<User>> {
        let row = sqlx::query(&format!(
            r#"
            SELECT {USER_COLUMNS}
            FROM users
            WHERE username = $1 OR email = $1
            "#,
        ))
        .bind(username_or_email)
        .fetch_optional(&self.pool)
        .await?;

        row.as_ref().map(map_user_row).transpose()
    }

    /// Find a user by ID
    pub async fn find_by_id(&self, id: Uuid) -> Result<Option<User>> {
        let row = sqlx::query(&format!(
            r#"
            SELECT {USER_COLUMNS}
            FROM users
            WHERE id = $1
            "#,
        ))
        .bind(id)
        .fetch_optional(&self.pool)
        .await?;

        row.as_ref().map(map_user_row).transpose()
    }

    /// Find the user holding the given refresh token
    pub async fn find_by_refresh_token(&self, refresh_token: &str) -> Result<Option<User>> {
        let row = sqlx::query(&format!(
            r#"
            SELECT {USER_COLUMNS}
            FROM users
            WHERE refresh_token = $1
            "#,
        ))
        .bind(refresh_token)
        .fetch_optional(&self.pool)
        .await?;

        row.as_ref().map(map_user_row).transpose()
    }

    /// Store (or clear) the user's single active refresh token
    pub async fn update_refresh_token(
        &self,
        id: Uuid,
        refresh_token: Option<&str>,
    ) -> Result<()> {
        sqlx::query("UPDATE users SET refresh_token = $1 WHERE id = $2")
            .bind(refresh_token)
            .bind(id)
            .execute(&self.pool)
            .await?;

        Ok(())
    }

    /// Verify a user's password against the stored hash
    pub fn verify_password(&self, user: &User, password: &str) -> Result<bool> {
        let parsed_hash = PasswordHash::new(&user.password_hash)
            .map_err(|e| anyhow::anyhow!("Failed to parse password hash: {}", e))?;

        let argon2 = Argon2::default();
        Ok(argon2
            .verify_password(password.as_bytes(), &parsed_hash)
            .is_ok())
    }
}
