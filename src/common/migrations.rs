// src/common/migrations.rs
//! Database migration and schema management

use sqlx::SqlitePool;
use std::env;
use tracing::{info, warn};

/// Run all database migrations
///
/// Tables are created if they don't exist. Setting RESET_DB=true drops and
/// recreates the schema, which loses all data; it is off unless asked for.
pub async fn run_migrations(pool: &SqlitePool) -> Result<(), sqlx::Error> {
    let should_reset_db = env::var("RESET_DB").unwrap_or_else(|_| "false".to_string()) == "true";

    if should_reset_db {
        warn!("RESET_DB=true - Dropping all tables and recreating schema...");
        drop_all_tables(pool).await?;
    }

    create_user_tables(pool).await?;
    create_indexes(pool).await?;

    info!("Database migration completed successfully");

    Ok(())
}

async fn drop_all_tables(pool: &SqlitePool) -> Result<(), sqlx::Error> {
    sqlx::query("DROP TABLE IF EXISTS auth_tokens")
        .execute(pool)
        .await?;
    sqlx::query("DROP TABLE IF EXISTS users").execute(pool).await?;
    Ok(())
}

/// Users and their per-provider credential grants.
///
/// One column per OAuth provider holds the provider-assigned external id;
/// `auth_tokens` accumulates one row per successful link or sign-in event
/// and is never pruned except by unlink or account deletion.
async fn create_user_tables(pool: &SqlitePool) -> Result<(), sqlx::Error> {
    sqlx::query(
        r#"
        CREATE TABLE IF NOT EXISTS users (
            id TEXT PRIMARY KEY,
            email TEXT,
            password_hash TEXT,
            name TEXT,
            picture TEXT,
            facebook TEXT,
            twitter TEXT,
            google TEXT,
            github TEXT,
            created_at TEXT DEFAULT (datetime('now')),
            updated_at TEXT DEFAULT (datetime('now'))
        )
        "#,
    )
    .execute(pool)
    .await?;

    sqlx::query(
        r#"
        CREATE TABLE IF NOT EXISTS auth_tokens (
            id INTEGER PRIMARY KEY AUTOINCREMENT,
            user_id TEXT NOT NULL,
            provider TEXT NOT NULL,
            access_token TEXT NOT NULL,
            token_secret TEXT,
            created_at TEXT DEFAULT (datetime('now')),
            FOREIGN KEY (user_id) REFERENCES users(id)
        )
        "#,
    )
    .execute(pool)
    .await?;

    Ok(())
}

/// Partial unique indexes enforce the identity invariants: email is unique
/// when present, and a (provider, external id) pair belongs to at most one
/// user. Check-then-act races in callers lose here with a unique violation.
async fn create_indexes(pool: &SqlitePool) -> Result<(), sqlx::Error> {
    let index_statements = [
        "CREATE UNIQUE INDEX IF NOT EXISTS idx_users_email ON users(email) WHERE email IS NOT NULL",
        "CREATE UNIQUE INDEX IF NOT EXISTS idx_users_facebook ON users(facebook) WHERE facebook IS NOT NULL",
        "CREATE UNIQUE INDEX IF NOT EXISTS idx_users_twitter ON users(twitter) WHERE twitter IS NOT NULL",
        "CREATE UNIQUE INDEX IF NOT EXISTS idx_users_google ON users(google) WHERE google IS NOT NULL",
        "CREATE UNIQUE INDEX IF NOT EXISTS idx_users_github ON users(github) WHERE github IS NOT NULL",
        "CREATE INDEX IF NOT EXISTS idx_auth_tokens_user ON auth_tokens(user_id)",
    ];

    for statement in index_statements {
        sqlx::query(statement).execute(pool).await?;
    }

    Ok(())
}
