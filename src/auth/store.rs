// src/auth/store.rs
//! Credential store access for user identity records.
//!
//! Thin wrapper over the SQLite pool exposing the lookups and mutations
//! the identity linker and account service need. Uniqueness of email and
//! (provider, external id) is enforced by partial unique indexes; callers
//! that lose a check-then-act race see a unique-violation error here.

use sqlx::SqlitePool;

use super::models::{AuthToken, User};
use super::providers::Provider;

#[derive(Debug, Clone)]
pub struct UserStore {
    pool: SqlitePool,
}

impl UserStore {
    pub fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }

    pub async fn find_by_id(&self, id: &str) -> Result<Option<User>, sqlx::Error> {
        sqlx::query_as::<_, User>("SELECT * FROM users WHERE id = ?")
            .bind(id)
            .fetch_optional(&self.pool)
            .await
    }

    /// Email lookups are case-insensitive; emails are stored lower-cased.
    pub async fn find_by_email(&self, email: &str) -> Result<Option<User>, sqlx::Error> {
        sqlx::query_as::<_, User>("SELECT * FROM users WHERE email = ?")
            .bind(email.to_lowercase())
            .fetch_optional(&self.pool)
            .await
    }

    pub async fn find_by_provider_id(
        &self,
        provider: Provider,
        external_id: &str,
    ) -> Result<Option<User>, sqlx::Error> {
        // column name comes from the closed Provider enum, never from input
        let query = format!("SELECT * FROM users WHERE {} = ?", provider.column());
        sqlx::query_as::<_, User>(&query)
            .bind(external_id)
            .fetch_optional(&self.pool)
            .await
    }

    /// Insert a new record and fetch it back with store-assigned timestamps.
    pub async fn insert(&self, user: &User) -> Result<User, sqlx::Error> {
        sqlx::query(
            r#"
            INSERT INTO users (id, email, password_hash, name, picture, facebook, twitter, google, github)
            VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?)
            "#,
        )
        .bind(&user.id)
        .bind(user.email.as_deref())
        .bind(user.password_hash.as_deref())
        .bind(user.name.as_deref())
        .bind(user.picture.as_deref())
        .bind(user.facebook.as_deref())
        .bind(user.twitter.as_deref())
        .bind(user.google.as_deref())
        .bind(user.github.as_deref())
        .execute(&self.pool)
        .await?;

        sqlx::query_as::<_, User>("SELECT * FROM users WHERE id = ?")
            .bind(&user.id)
            .fetch_one(&self.pool)
            .await
    }

    /// Persist every mutable field of an existing record.
    pub async fn save(&self, user: &User) -> Result<(), sqlx::Error> {
        sqlx::query(
            r#"
            UPDATE users SET
                email = ?,
                password_hash = ?,
                name = ?,
                picture = ?,
                facebook = ?,
                twitter = ?,
                google = ?,
                github = ?,
                updated_at = datetime('now')
            WHERE id = ?
            "#,
        )
        .bind(user.email.as_deref())
        .bind(user.password_hash.as_deref())
        .bind(user.name.as_deref())
        .bind(user.picture.as_deref())
        .bind(user.facebook.as_deref())
        .bind(user.twitter.as_deref())
        .bind(user.google.as_deref())
        .bind(user.github.as_deref())
        .bind(&user.id)
        .execute(&self.pool)
        .await?;

        Ok(())
    }

    /// Remove a record and all of its stored tokens. Deletion is terminal.
    pub async fn remove(&self, id: &str) -> Result<(), sqlx::Error> {
        sqlx::query("DELETE FROM auth_tokens WHERE user_id = ?")
            .bind(id)
            .execute(&self.pool)
            .await?;
        sqlx::query("DELETE FROM users WHERE id = ?")
            .bind(id)
            .execute(&self.pool)
            .await?;
        Ok(())
    }

    /// Insert a new record and its first token grant in one transaction;
    /// neither row lands without the other.
    pub async fn insert_with_token(
        &self,
        user: &User,
        provider: Provider,
        access_token: &str,
        token_secret: Option<&str>,
    ) -> Result<User, sqlx::Error> {
        let mut tx = self.pool.begin().await?;

        sqlx::query(
            r#"
            INSERT INTO users (id, email, password_hash, name, picture, facebook, twitter, google, github)
            VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?)
            "#,
        )
        .bind(&user.id)
        .bind(user.email.as_deref())
        .bind(user.password_hash.as_deref())
        .bind(user.name.as_deref())
        .bind(user.picture.as_deref())
        .bind(user.facebook.as_deref())
        .bind(user.twitter.as_deref())
        .bind(user.google.as_deref())
        .bind(user.github.as_deref())
        .execute(&mut *tx)
        .await?;

        sqlx::query(
            "INSERT INTO auth_tokens (user_id, provider, access_token, token_secret) VALUES (?, ?, ?, ?)",
        )
        .bind(&user.id)
        .bind(provider.as_str())
        .bind(access_token)
        .bind(token_secret)
        .execute(&mut *tx)
        .await?;

        tx.commit().await?;

        sqlx::query_as::<_, User>("SELECT * FROM users WHERE id = ?")
            .bind(&user.id)
            .fetch_one(&self.pool)
            .await
    }

    /// Save an existing record and append a token grant in one transaction.
    pub async fn save_with_token(
        &self,
        user: &User,
        provider: Provider,
        access_token: &str,
        token_secret: Option<&str>,
    ) -> Result<(), sqlx::Error> {
        let mut tx = self.pool.begin().await?;

        sqlx::query(
            r#"
            UPDATE users SET
                email = ?,
                password_hash = ?,
                name = ?,
                picture = ?,
                facebook = ?,
                twitter = ?,
                google = ?,
                github = ?,
                updated_at = datetime('now')
            WHERE id = ?
            "#,
        )
        .bind(user.email.as_deref())
        .bind(user.password_hash.as_deref())
        .bind(user.name.as_deref())
        .bind(user.picture.as_deref())
        .bind(user.facebook.as_deref())
        .bind(user.twitter.as_deref())
        .bind(user.google.as_deref())
        .bind(user.github.as_deref())
        .bind(&user.id)
        .execute(&mut *tx)
        .await?;

        sqlx::query(
            "INSERT INTO auth_tokens (user_id, provider, access_token, token_secret) VALUES (?, ?, ?, ?)",
        )
        .bind(&user.id)
        .bind(provider.as_str())
        .bind(access_token)
        .bind(token_secret)
        .execute(&mut *tx)
        .await?;

        tx.commit().await
    }

    pub async fn append_token(
        &self,
        user_id: &str,
        provider: Provider,
        access_token: &str,
        token_secret: Option<&str>,
    ) -> Result<(), sqlx::Error> {
        sqlx::query(
            "INSERT INTO auth_tokens (user_id, provider, access_token, token_secret) VALUES (?, ?, ?, ?)",
        )
        .bind(user_id)
        .bind(provider.as_str())
        .bind(access_token)
        .bind(token_secret)
        .execute(&self.pool)
        .await?;
        Ok(())
    }

    /// Stored grants in append order.
    pub async fn tokens_for(&self, user_id: &str) -> Result<Vec<AuthToken>, sqlx::Error> {
        sqlx::query_as::<_, AuthToken>(
            "SELECT * FROM auth_tokens WHERE user_id = ? ORDER BY id ASC",
        )
        .bind(user_id)
        .fetch_all(&self.pool)
        .await
    }

    pub async fn delete_tokens(
        &self,
        user_id: &str,
        provider: Provider,
    ) -> Result<(), sqlx::Error> {
        sqlx::query("DELETE FROM auth_tokens WHERE user_id = ? AND provider = ?")
            .bind(user_id)
            .bind(provider.as_str())
            .execute(&self.pool)
            .await?;
        Ok(())
    }
}
