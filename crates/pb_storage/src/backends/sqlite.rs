use std::path::{Path, PathBuf};
use std::str::FromStr;

use async_trait::async_trait;
use chrono::NaiveDate;
use pb_core::{DateWindow, DocumentRecord, RecordStore, Result};
use sqlx::sqlite::{SqliteConnectOptions, SqlitePool, SqlitePoolOptions, SqliteRow};
use sqlx::{QueryBuilder, Row, Sqlite};
use crate::StorageBackend;

const DEFAULT_DB_PATH: &str = "papers.db";

const MIGRATIONS: &[&str] = &[
    r#"
    CREATE TABLE IF NOT EXISTS papers (
        sn INTEGER PRIMARY KEY AUTOINCREMENT,
        id TEXT NOT NULL UNIQUE,
        category TEXT NOT NULL,
        title TEXT NOT NULL,
        authors TEXT NOT NULL,
        abstract TEXT NOT NULL,
        url TEXT NOT NULL,
        added_at TEXT NOT NULL
    )
    "#,
    r#"
    CREATE INDEX IF NOT EXISTS papers_added_at ON papers (added_at)
    "#,
    // Add future migrations here
];

fn db_error(context: &str, e: sqlx::Error) -> pb_core::Error {
    pb_core::Error::Database(format!("{}: {}", context, e))
}

fn push_window_filter(builder: &mut QueryBuilder<'_, Sqlite>, window: &DateWindow, categories: &[String]) {
    builder.push(" WHERE added_at >= ");
    builder.push_bind(window.start.to_string());
    builder.push(" AND added_at <= ");
    builder.push_bind(window.end.to_string());
    if !categories.is_empty() {
        builder.push(" AND category IN (");
        let mut separated = builder.separated(", ");
        for category in categories {
            separated.push_bind(category.clone());
        }
        separated.push_unseparated(")");
    }
}

fn record_from_row(row: &SqliteRow) -> Result<DocumentRecord> {
    let added_at: String = row.get("added_at");
    let added_at = NaiveDate::parse_from_str(&added_at, "%Y-%m-%d")
        .map_err(|e| pb_core::Error::Database(format!("Failed to parse date {:?}: {}", added_at, e)))?;
    Ok(DocumentRecord {
        id: row.get("id"),
        category: row.get("category"),
        title: row.get("title"),
        authors: row.get("authors"),
        abstract_text: row.get("abstract"),
        url: row.get("url"),
        added_at,
    })
}

/// SQLite-backed store. The pool holds a single connection so ingestion
/// writes are serialized.
pub struct SQLiteStorage {
    pool: SqlitePool,
    db_path: PathBuf,
}

#[async_trait]
impl StorageBackend for SQLiteStorage {
    fn get_error_message() -> &'static str {
        "SQLite database should be available at ./papers.db"
    }

    async fn open(location: Option<&str>) -> Result<Self> {
        let db_path = PathBuf::from(location.unwrap_or(DEFAULT_DB_PATH));
        Self::new_with_path(&db_path).await
    }
}

impl SQLiteStorage {
    pub async fn new_with_path(db_path: &Path) -> Result<Self> {
        if let Some(parent) = db_path.parent().filter(|p| !p.as_os_str().is_empty()) {
            std::fs::create_dir_all(parent)?;
        }

        let options = SqliteConnectOptions::from_str(&format!("sqlite:{}", db_path.display()))
            .map_err(|e| db_error("Invalid database path", e))?
            .create_if_missing(true);
        let storage = Self::connect(options, db_path.to_path_buf()).await?;
        tracing::debug!(path = %db_path.display(), "SQLite store opened");
        Ok(storage)
    }

    /// Private in-memory database, mostly for tests.
    pub async fn in_memory() -> Result<Self> {
        let options = SqliteConnectOptions::from_str("sqlite::memory:")
            .map_err(|e| db_error("Invalid database path", e))?;
        Self::connect(options, PathBuf::from(":memory:")).await
    }

    async fn connect(options: SqliteConnectOptions, db_path: PathBuf) -> Result<Self> {
        let pool = SqlitePoolOptions::new()
            .max_connections(1)
            .connect_with(options)
            .await
            .map_err(|e| db_error("Failed to connect to database", e))?;

        for (i, migration) in MIGRATIONS.iter().enumerate() {
            sqlx::query(migration)
                .execute(&pool)
                .await
                .map_err(|e| db_error(&format!("Failed to run migration {}", i), e))?;
        }

        Ok(Self { pool, db_path })
    }

    pub fn get_db_path(&self) -> &PathBuf {
        &self.db_path
    }
}

#[async_trait]
impl RecordStore for SQLiteStorage {
    async fn insert(&self, record: &DocumentRecord) -> Result<bool> {
        let result = sqlx::query(
            r#"
            INSERT INTO papers (id, category, title, authors, abstract, url, added_at)
            VALUES (?, ?, ?, ?, ?, ?, ?)
            ON CONFLICT(id) DO NOTHING
            "#,
        )
        .bind(&record.id)
        .bind(&record.category)
        .bind(&record.title)
        .bind(&record.authors)
        .bind(&record.abstract_text)
        .bind(&record.url)
        .bind(record.added_at.to_string())
        .execute(&self.pool)
        .await
        .map_err(|e| db_error("Failed to store record", e))?;

        Ok(result.rows_affected() == 1)
    }

    async fn query_window(&self, window: &DateWindow, categories: &[String]) -> Result<Vec<DocumentRecord>> {
        let mut builder = QueryBuilder::<Sqlite>::new(
            "SELECT id, category, title, authors, abstract, url, added_at FROM papers",
        );
        push_window_filter(&mut builder, window, categories);
        builder.push(" ORDER BY sn DESC");

        let rows = builder
            .build()
            .fetch_all(&self.pool)
            .await
            .map_err(|e| db_error("Failed to query records", e))?;

        rows.iter().map(record_from_row).collect()
    }

    async fn count_window(&self, window: &DateWindow, categories: &[String]) -> Result<u64> {
        let mut builder = QueryBuilder::<Sqlite>::new("SELECT COUNT(*) AS n FROM papers");
        push_window_filter(&mut builder, window, categories);

        let row = builder
            .build()
            .fetch_one(&self.pool)
            .await
            .map_err(|e| db_error("Failed to count records", e))?;
        let n: i64 = row.get("n");
        Ok(n.max(0) as u64)
    }

    async fn ping(&self) -> Result<()> {
        let row = sqlx::query("SELECT 1 AS ok")
            .fetch_one(&self.pool)
            .await
            .map_err(|e| db_error("Database ping failed", e))?;
        let ok: i64 = row.get("ok");
        if ok != 1 {
            return Err(pb_core::Error::Database("Database ping returned no result".to_string()));
        }
        Ok(())
    }

    async fn close(&self) -> Result<()> {
        self.pool.close().await;
        Ok(())
    }
}
