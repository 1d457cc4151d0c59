use std::str::FromStr;

use chrono::{DateTime, NaiveDateTime, Utc};
use futures_util::future::{BoxFuture, FutureExt};
use sqlx::sqlite::{SqliteConnectOptions, SqlitePool, SqlitePoolOptions};

use super::CalculationStore;
use crate::errors::StorageError;
use crate::models::calculation::{NewCalculation, StoredCalculation};

const CREATE_CALCULATIONS_TABLE: &str = r#"
    CREATE TABLE IF NOT EXISTS calculations (
        id INTEGER PRIMARY KEY AUTOINCREMENT,
        input_data TEXT NOT NULL,
        result_data TEXT NOT NULL,
        language TEXT DEFAULT 'ru',
        created_at TEXT NOT NULL
    )
"#;

/// (id, input_data, result_data, language, created_at)
type CalculationRow = (i64, String, String, Option<String>, String);

/// Durable store backed by a SQLite file.
#[derive(Debug, Clone)]
pub struct SqliteStore {
    pool: SqlitePool,
}

impl SqliteStore {
    /// Opens (creating if needed) the database behind `database_url`.
    pub async fn connect(database_url: &str) -> Result<Self, StorageError> {
        let options = SqliteConnectOptions::from_str(database_url)?.create_if_missing(true);

        if let Some(dir) = options.get_filename().parent() {
            if !dir.as_os_str().is_empty() {
                tokio::fs::create_dir_all(dir).await.map_err(|e| {
                    StorageError::Unavailable(format!("cannot create {}: {}", dir.display(), e))
                })?;
            }
        }

        let pool = SqlitePoolOptions::new()
            .max_connections(5)
            .connect_with(options)
            .await?;

        Self::from_pool(pool).await
    }

    pub async fn from_pool(pool: SqlitePool) -> Result<Self, StorageError> {
        let store = Self { pool };
        store.init_schema().await?;
        Ok(store)
    }

    async fn init_schema(&self) -> Result<(), StorageError> {
        sqlx::query(CREATE_CALCULATIONS_TABLE).execute(&self.pool).await?;

        // Databases written before the language column existed
        let columns: Vec<(String,)> =
            sqlx::query_as("SELECT name FROM pragma_table_info('calculations')")
                .fetch_all(&self.pool)
                .await?;
        if !columns.iter().any(|(name,)| name == "language") {
            tracing::info!("adding 'language' column to calculations table");
            sqlx::query("ALTER TABLE calculations ADD COLUMN language TEXT DEFAULT 'ru'")
                .execute(&self.pool)
                .await?;
        }
        Ok(())
    }

    async fn insert(&self, record: NewCalculation) -> Result<i64, StorageError> {
        let input_json = serde_json::to_string(&record.input)
            .map_err(|e| StorageError::Unavailable(format!("cannot encode input: {}", e)))?;
        let result_json = serde_json::to_string(&record.result)
            .map_err(|e| StorageError::Unavailable(format!("cannot encode result: {}", e)))?;

        let done = sqlx::query(
            "INSERT INTO calculations (input_data, result_data, language, created_at) VALUES (?, ?, ?, ?)",
        )
        .bind(input_json)
        .bind(result_json)
        .bind(record.language)
        .bind(Utc::now().to_rfc3339())
        .execute(&self.pool)
        .await?;

        Ok(done.last_insert_rowid())
    }

    async fn fetch(&self, id: i64) -> Result<Option<StoredCalculation>, StorageError> {
        let row: Option<CalculationRow> = sqlx::query_as(
            "SELECT id, input_data, result_data, language, created_at FROM calculations WHERE id = ?",
        )
        .bind(id)
        .fetch_optional(&self.pool)
        .await?;

        row.map(decode_row).transpose()
    }

    async fn fetch_recent(&self, limit: usize) -> Result<Vec<StoredCalculation>, StorageError> {
        let rows: Vec<CalculationRow> = sqlx::query_as(
            "SELECT id, input_data, result_data, language, created_at FROM calculations ORDER BY id DESC LIMIT ?",
        )
        .bind(i64::try_from(limit).unwrap_or(i64::MAX))
        .fetch_all(&self.pool)
        .await?;

        let mut out = Vec::with_capacity(rows.len());
        for row in rows {
            match decode_row(row) {
                Ok(calc) => out.push(calc),
                Err(e) => tracing::warn!("skipping history entry: {}", e),
            }
        }
        Ok(out)
    }
}

impl CalculationStore for SqliteStore {
    fn backend_name(&self) -> &'static str {
        "sqlite"
    }

    fn save(&self, record: NewCalculation) -> BoxFuture<'_, Result<i64, StorageError>> {
        self.insert(record).boxed()
    }

    fn get(&self, id: i64) -> BoxFuture<'_, Result<Option<StoredCalculation>, StorageError>> {
        self.fetch(id).boxed()
    }

    fn list_recent(&self, limit: usize) -> BoxFuture<'_, Result<Vec<StoredCalculation>, StorageError>> {
        self.fetch_recent(limit).boxed()
    }
}

fn decode_row((id, input, result, language, created_at): CalculationRow) -> Result<StoredCalculation, StorageError> {
    let corrupt = |reason: String| StorageError::Corrupt { id, reason };

    Ok(StoredCalculation {
        id,
        input_data: serde_json::from_str(&input).map_err(|e| corrupt(format!("input_data: {}", e)))?,
        result_data: serde_json::from_str(&result).map_err(|e| corrupt(format!("result_data: {}", e)))?,
        language: language.unwrap_or_else(|| "ru".to_string()),
        created_at: parse_timestamp(&created_at).ok_or_else(|| corrupt(format!("created_at: {:?}", created_at)))?,
    })
}

/// RFC 3339, or SQLite's `CURRENT_TIMESTAMP` format (UTC, no zone).
fn parse_timestamp(s: &str) -> Option<DateTime<Utc>> {
    DateTime::parse_from_rfc3339(s)
        .map(|dt| dt.with_timezone(&Utc))
        .ok()
        .or_else(|| {
            NaiveDateTime::parse_from_str(s, "%Y-%m-%d %H:%M:%S")
                .ok()
                .map(|naive| naive.and_utc())
        })
}
