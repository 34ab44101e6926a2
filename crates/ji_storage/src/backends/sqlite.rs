use async_trait::async_trait;
use ji_core::{Error, Record, RecordStore, Result};
use sqlx::sqlite::{SqliteConnectOptions, SqlitePool};
use sqlx::Row;
use std::path::PathBuf;
use std::sync::Arc;
use crate::StorageBackend;

const MIGRATIONS: &[&str] = &[
    r#"
    CREATE TABLE IF NOT EXISTS records (
        id INTEGER PRIMARY KEY AUTOINCREMENT,
        collection TEXT NOT NULL,
        body TEXT NOT NULL
    )
    "#,
    // Add future migrations here
];

pub struct SQLiteStorage {
    pool: Arc<SqlitePool>,
}

#[async_trait]
impl StorageBackend for SQLiteStorage {
    async fn new() -> Result<Self> {
        let db_path = PathBuf::from("records.db");
        Self::new_with_path(&db_path).await
    }
}

impl SQLiteStorage {
    pub async fn new_with_path(db_path: &PathBuf) -> Result<Self> {
        if let Some(parent) = db_path.parent() {
            if !parent.as_os_str().is_empty() {
                std::fs::create_dir_all(parent)?;
            }
        }

        let options = SqliteConnectOptions::new()
            .filename(db_path)
            .create_if_missing(true);
        let pool = SqlitePool::connect_with(options)
            .await
            .map_err(|e| Error::Database(format!("Failed to connect to database: {}", e)))?;

        for (i, migration) in MIGRATIONS.iter().enumerate() {
            sqlx::query(migration)
                .execute(&pool)
                .await
                .map_err(|e| Error::Database(format!("Failed to run migration {}: {}", i, e)))?;
        }

        Ok(Self {
            pool: Arc::new(pool),
        })
    }
}

#[async_trait]
impl RecordStore for SQLiteStorage {
    async fn delete_all(&self, collection: &str) -> Result<u64> {
        let result = sqlx::query("DELETE FROM records WHERE collection = ?")
            .bind(collection)
            .execute(&*self.pool)
            .await
            .map_err(|e| Error::Database(format!("Failed to delete records: {}", e)))?;
        Ok(result.rows_affected())
    }

    async fn insert_many(&self, collection: &str, records: &[Record]) -> Result<usize> {
        if records.is_empty() {
            return Ok(0);
        }

        let mut tx = self
            .pool
            .begin()
            .await
            .map_err(|e| Error::Database(format!("Failed to start transaction: {}", e)))?;

        for record in records {
            let body = serde_json::to_string(record)?;
            sqlx::query("INSERT INTO records (collection, body) VALUES (?, ?)")
                .bind(collection)
                .bind(body)
                .execute(&mut *tx)
                .await
                .map_err(|e| Error::Database(format!("Failed to insert record: {}", e)))?;
        }

        tx.commit()
            .await
            .map_err(|e| Error::Database(format!("Failed to commit records: {}", e)))?;
        Ok(records.len())
    }

    async fn count(&self, collection: &str) -> Result<usize> {
        let row = sqlx::query("SELECT COUNT(*) AS n FROM records WHERE collection = ?")
            .bind(collection)
            .fetch_one(&*self.pool)
            .await
            .map_err(|e| Error::Database(format!("Failed to count records: {}", e)))?;
        Ok(row.get::<i64, _>("n") as usize)
    }

    async fn find_all(&self, collection: &str) -> Result<Vec<Record>> {
        let rows = sqlx::query("SELECT body FROM records WHERE collection = ? ORDER BY id")
            .bind(collection)
            .fetch_all(&*self.pool)
            .await
            .map_err(|e| Error::Database(format!("Failed to load records: {}", e)))?;

        rows.into_iter()
            .map(|row| {
                let body: String = row.get("body");
                serde_json::from_str(&body).map_err(Error::Serialization)
            })
            .collect()
    }
}
