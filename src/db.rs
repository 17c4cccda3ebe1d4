use sqlx::sqlite::{SqliteConnectOptions, SqlitePool, SqlitePoolOptions};
use std::path::Path;
use tracing::{error, info, instrument};

use crate::models::HarvestedArticle;
use crate::utils::now_timestamp;

/// Publisher name written to the `source` column of every row.
pub const SOURCE_NAME: &str = "Channel NewsAsia";

// The `mp_mentioned`, `categories`, and `summary` columns belong to the
// downstream enrichment job; this crate only reserves them.
const MIGRATIONS: &[&str] = &["CREATE TABLE IF NOT EXISTS articles (
        id INTEGER PRIMARY KEY AUTOINCREMENT,
        title TEXT NOT NULL,
        author TEXT,
        source TEXT,
        content TEXT,
        date_created TEXT,
        date_updated TEXT,
        mp_mentioned TEXT,
        categories TEXT,
        summary TEXT
    )"];

/// Append-only writer for the `articles` relation. Holds the run's single
/// database connection; rows are never updated or deleted here.
pub struct ArticleSink {
    pool: SqlitePool,
}

impl ArticleSink {
    /// Open the database file, creating it if missing, and run migrations.
    #[instrument(level = "info", skip_all, fields(path = %path.as_ref().display()))]
    pub async fn open(path: impl AsRef<Path>) -> Result<Self, sqlx::Error> {
        let options = SqliteConnectOptions::new()
            .filename(path.as_ref())
            .create_if_missing(true);
        let pool = SqlitePoolOptions::new()
            .max_connections(1)
            .connect_with(options)
            .await?;
        let sink = Self { pool };
        sink.ensure_schema().await?;
        info!("Database ready");
        Ok(sink)
    }

    /// Create the `articles` relation when absent. Safe to call every run.
    pub async fn ensure_schema(&self) -> Result<(), sqlx::Error> {
        for migration in MIGRATIONS {
            sqlx::query(migration).execute(&self.pool).await?;
        }
        Ok(())
    }

    /// Insert one row per article, each as its own statement. A failed row is
    /// logged and skipped without disturbing rows already written. Returns
    /// the number of rows that made it in.
    #[instrument(level = "info", skip_all)]
    pub async fn save(&self, articles: &[HarvestedArticle]) -> usize {
        let now = now_timestamp();
        let mut saved = 0usize;
        for article in articles {
            let date_created = if article.created.is_empty() {
                now.clone()
            } else {
                article.created.clone()
            };
            let date_updated = if article.updated.is_empty() {
                date_created.clone()
            } else {
                article.updated.clone()
            };
            let res = sqlx::query(
                "INSERT INTO articles
                    (title, author, source, content, date_created, date_updated, mp_mentioned)
                 VALUES (?, ?, ?, ?, ?, ?, ?)",
            )
            .bind(&article.title)
            .bind(&article.author)
            .bind(SOURCE_NAME)
            .bind(&article.content)
            .bind(&date_created)
            .bind(&date_updated)
            .bind("")
            .execute(&self.pool)
            .await;
            match res {
                Ok(_) => saved += 1,
                Err(e) => error!(error = %e, url = %article.url, "Failed to insert article row"),
            }
        }
        info!(saved, total = articles.len(), "Saved articles");
        saved
    }
}
