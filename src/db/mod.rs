//! Database module for SQLite persistence.
//!
//! SQLite backs the record store for all application collections.

mod repository;
mod schema;

pub use repository::*;
pub use schema::*;

use sqlx::sqlite::{SqliteConnectOptions, SqlitePool, SqlitePoolOptions};
use std::path::Path;
use std::str::FromStr;

/// Initialize the database connection pool and run migrations.
pub async fn init_database(db_path: &Path) -> Result<SqlitePool, sqlx::Error> {
    // Ensure the parent directory exists
    if let Some(parent) = db_path.parent() {
        tokio::fs::create_dir_all(parent).await.ok();
    }

    let db_url = format!("sqlite:{}?mode=rwc", db_path.display());

    let options = SqliteConnectOptions::from_str(&db_url)?
        .create_if_missing(true)
        .journal_mode(sqlx::sqlite::SqliteJournalMode::Wal)
        .synchronous(sqlx::sqlite::SqliteSynchronous::Normal)
        .busy_timeout(std::time::Duration::from_secs(30));

    let pool = SqlitePoolOptions::new()
        .max_connections(5)
        .connect_with(options)
        .await?;

    run_migrations(&pool).await?;

    Ok(pool)
}

/// Run database migrations.
async fn run_migrations(pool: &SqlitePool) -> Result<(), sqlx::Error> {
    sqlx::query(
        r#"
        CREATE TABLE IF NOT EXISTS creator_applications (
            id TEXT PRIMARY KEY,
            status TEXT NOT NULL DEFAULT 'partial',
            first_name TEXT NOT NULL,
            last_name TEXT NOT NULL,
            email TEXT NOT NULL,
            state TEXT NOT NULL,
            social_profiles TEXT,
            motivation TEXT,
            veteran_connection TEXT,
            willing_to_share INTEGER,
            comfort_level TEXT,
            fundraising_goal TEXT,
            additional_info TEXT,
            agreement_accepted INTEGER NOT NULL DEFAULT 0,
            created_at TEXT NOT NULL,
            updated_at TEXT NOT NULL
        );
        "#,
    )
    .execute(pool)
    .await?;

    sqlx::query(
        r#"
        CREATE TABLE IF NOT EXISTS therapist_applications (
            id TEXT PRIMARY KEY,
            status TEXT NOT NULL DEFAULT 'partial',
            first_name TEXT NOT NULL,
            last_name TEXT NOT NULL,
            email TEXT NOT NULL,
            phone TEXT NOT NULL,
            licensed_states TEXT,
            license_type TEXT,
            telehealth_experience INTEGER,
            weekly_hours TEXT,
            referral_source TEXT,
            motivation TEXT,
            agreement_accepted INTEGER NOT NULL DEFAULT 0,
            created_at TEXT NOT NULL,
            updated_at TEXT NOT NULL
        );
        "#,
    )
    .execute(pool)
    .await?;

    sqlx::query(
        r#"
        CREATE INDEX IF NOT EXISTS idx_creator_applications_status ON creator_applications(status);
        CREATE INDEX IF NOT EXISTS idx_creator_applications_created_at ON creator_applications(created_at);
        CREATE INDEX IF NOT EXISTS idx_therapist_applications_status ON therapist_applications(status);
        CREATE INDEX IF NOT EXISTS idx_therapist_applications_created_at ON therapist_applications(created_at);
        "#,
    )
    .execute(pool)
    .await?;

    Ok(())
}
