// Database access layer (SQLite via sqlx).

use serde::{Deserialize, Serialize};
use sqlx::sqlite::{SqlitePool, SqlitePoolOptions};

use crate::language::Language;

/// The two size categories an encounter can be logged at.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SizeTier {
    Smallest,
    Largest,
}

impl SizeTier {
    pub const ALL: [SizeTier; 2] = [SizeTier::Smallest, SizeTier::Largest];

    /// The value stored in the `size` column and submitted by menus.
    pub fn as_str(&self) -> &'static str {
        match self {
            SizeTier::Smallest => "smallest",
            SizeTier::Largest => "largest",
        }
    }

    /// Label shown in the size select menu.
    pub fn label(&self) -> &'static str {
        match self {
            SizeTier::Smallest => "Smallest",
            SizeTier::Largest => "Largest",
        }
    }

    pub fn parse(value: &str) -> Option<SizeTier> {
        match value {
            "smallest" => Some(SizeTier::Smallest),
            "largest" => Some(SizeTier::Largest),
            _ => None,
        }
    }
}

impl std::fmt::Display for SizeTier {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// One confirmed sighting of a monster at a size tier.
/// Monster names are stored lowercased; the (user, name, size) triple is
/// unique and rows are never updated or deleted.
#[derive(Debug, Clone, Serialize, Deserialize, sqlx::FromRow)]
pub struct Encounter {
    pub user_id: String,
    pub monster_name: String,
    pub size: String,
    pub created_at: String,
}

impl Encounter {
    pub fn size_tier(&self) -> Option<SizeTier> {
        SizeTier::parse(&self.size)
    }
}

pub struct Database {
    pool: SqlitePool,
}

impl Database {
    pub async fn new(database_url: &str) -> Result<Self, sqlx::Error> {
        let pool = SqlitePoolOptions::new()
            .max_connections(5)
            .connect(database_url)
            .await?;
        let db = Self { pool };
        db.run_migrations().await?;
        Ok(db)
    }

    async fn run_migrations(&self) -> Result<(), sqlx::Error> {
        sqlx::query(
            r#"
            CREATE TABLE IF NOT EXISTS encounters (
                user_id TEXT NOT NULL,
                monster_name TEXT NOT NULL,
                size TEXT NOT NULL,
                created_at TEXT NOT NULL DEFAULT (datetime('now')),
                UNIQUE(user_id, monster_name, size)
            )
        "#,
        )
        .execute(&self.pool)
        .await?;

        sqlx::query(
            r#"
            CREATE TABLE IF NOT EXISTS user_preferences (
                user_id TEXT PRIMARY KEY,
                language TEXT NOT NULL DEFAULT 'en',
                updated_at TEXT NOT NULL DEFAULT (datetime('now'))
            )
        "#,
        )
        .execute(&self.pool)
        .await?;

        Ok(())
    }

    // ── Language preferences ──────────────────────────────────────────

    /// Stored language for the user, or the default when absent.
    /// Unknown stored codes also fall back to the default.
    pub async fn get_language(&self, user_id: &str) -> Result<Language, sqlx::Error> {
        let code: Option<String> =
            sqlx::query_scalar("SELECT language FROM user_preferences WHERE user_id = ?")
                .bind(user_id)
                .fetch_optional(&self.pool)
                .await?;

        Ok(code
            .as_deref()
            .and_then(Language::parse)
            .unwrap_or_default())
    }

    /// Upsert the user's language preference, refreshing `updated_at`.
    pub async fn set_language(&self, user_id: &str, language: Language) -> Result<(), sqlx::Error> {
        sqlx::query(
            r#"
            INSERT INTO user_preferences (user_id, language, updated_at)
            VALUES (?, ?, datetime('now'))
            ON CONFLICT(user_id) DO UPDATE SET
                language = excluded.language,
                updated_at = datetime('now')
        "#,
        )
        .bind(user_id)
        .bind(language.code())
        .execute(&self.pool)
        .await?;
        Ok(())
    }

    // ── Encounters ────────────────────────────────────────────────────

    /// All encounters logged by the user. Row order carries no meaning;
    /// callers consume this as a set.
    pub async fn list_encounters(&self, user_id: &str) -> Result<Vec<Encounter>, sqlx::Error> {
        let rows = sqlx::query_as::<_, Encounter>(
            "SELECT user_id, monster_name, size, created_at FROM encounters WHERE user_id = ?",
        )
        .bind(user_id)
        .fetch_all(&self.pool)
        .await?;
        Ok(rows)
    }

    /// Lowercased names the user has already logged at the given size.
    pub async fn tracked_names_for_size(
        &self,
        user_id: &str,
        size: SizeTier,
    ) -> Result<Vec<String>, sqlx::Error> {
        let rows: Vec<String> = sqlx::query_scalar(
            "SELECT DISTINCT LOWER(monster_name) FROM encounters WHERE user_id = ? AND size = ?",
        )
        .bind(user_id)
        .bind(size.as_str())
        .fetch_all(&self.pool)
        .await?;
        Ok(rows)
    }

    /// Record an encounter. The monster name is lowercased before insert, so
    /// the UNIQUE constraint makes the triple case-insensitive. Duplicate
    /// inserts are no-ops; returns whether a new row was actually written.
    pub async fn record_encounter(
        &self,
        user_id: &str,
        monster_name: &str,
        size: SizeTier,
    ) -> Result<bool, sqlx::Error> {
        let result = sqlx::query(
            "INSERT OR IGNORE INTO encounters (user_id, monster_name, size) VALUES (?, ?, ?)",
        )
        .bind(user_id)
        .bind(monster_name.to_lowercase())
        .bind(size.as_str())
        .execute(&self.pool)
        .await?;
        Ok(result.rows_affected() > 0)
    }

    /// Close the connection pool. Further queries fail with a storage error.
    pub async fn close(&self) {
        self.pool.close().await;
    }
}
