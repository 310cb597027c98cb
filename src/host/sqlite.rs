//! Standalone host backed by SQLite via sqlx.
//!
//! Lets the server half run without a chat server: posts and the plugin KV
//! namespace live in one database file, and the plugin configuration comes
//! from the operator config.

use async_trait::async_trait;
use serde_json::{Map, Value};
use sqlx::sqlite::{SqliteConnectOptions, SqliteJournalMode, SqlitePool};
use sqlx::Row;
use std::path::Path;

use super::traits::{HostApi, HostError, HostResult};
use crate::server::configuration::PluginConfiguration;
use crate::ttl::{Post, PostId};

const SCHEMA: &[&str] = &[
    "CREATE TABLE IF NOT EXISTS posts (
        id          TEXT PRIMARY KEY,
        user_id     TEXT NOT NULL DEFAULT '',
        channel_id  TEXT NOT NULL DEFAULT '',
        message     TEXT NOT NULL,
        create_at   INTEGER NOT NULL,
        type        TEXT NOT NULL DEFAULT '',
        props       TEXT NOT NULL DEFAULT '{}'
    )",
    "CREATE TABLE IF NOT EXISTS plugin_kv (
        key   TEXT PRIMARY KEY,
        value BLOB NOT NULL
    )",
];

/// SQLite-backed host. Cheap to clone (the pool is shared).
#[derive(Clone)]
pub struct SqliteHost {
    pool: SqlitePool,
    configuration: PluginConfiguration,
}

impl SqliteHost {
    /// Open (or create) the database at `db_path` and ensure the schema.
    pub async fn open(db_path: &Path, configuration: PluginConfiguration) -> HostResult<Self> {
        let opts = SqliteConnectOptions::new()
            .filename(db_path)
            .create_if_missing(true)
            .journal_mode(SqliteJournalMode::Wal);

        let pool = SqlitePool::connect_with(opts).await?;
        for statement in SCHEMA {
            sqlx::query(statement).execute(&pool).await?;
        }

        Ok(Self {
            pool,
            configuration,
        })
    }

    /// Store a post (insert or replace).
    pub async fn save_post(&self, post: &Post) -> HostResult<()> {
        let props = serde_json::to_string(&post.props)?;
        sqlx::query(
            "INSERT OR REPLACE INTO posts (id, user_id, channel_id, message, create_at, type, props)
             VALUES (?, ?, ?, ?, ?, ?, ?)",
        )
        .bind(&post.id.0)
        .bind(&post.user_id)
        .bind(&post.channel_id)
        .bind(&post.message)
        .bind(post.create_at)
        .bind(&post.post_type)
        .bind(props)
        .execute(&self.pool)
        .await?;
        Ok(())
    }

    /// Number of stored posts.
    pub async fn post_count(&self) -> HostResult<i64> {
        let row = sqlx::query("SELECT COUNT(*) AS n FROM posts")
            .fetch_one(&self.pool)
            .await?;
        Ok(row.try_get("n")?)
    }

    pub async fn close(&self) {
        self.pool.close().await;
    }
}

#[async_trait]
impl HostApi for SqliteHost {
    async fn kv_set(&self, key: &str, value: &[u8]) -> HostResult<()> {
        sqlx::query("INSERT OR REPLACE INTO plugin_kv (key, value) VALUES (?, ?)")
            .bind(key)
            .bind(value)
            .execute(&self.pool)
            .await?;
        Ok(())
    }

    async fn kv_get(&self, key: &str) -> HostResult<Option<Vec<u8>>> {
        let row = sqlx::query("SELECT value FROM plugin_kv WHERE key = ?")
            .bind(key)
            .fetch_optional(&self.pool)
            .await?;
        match row {
            Some(row) => Ok(Some(row.try_get("value")?)),
            None => Ok(None),
        }
    }

    async fn kv_delete(&self, key: &str) -> HostResult<()> {
        sqlx::query("DELETE FROM plugin_kv WHERE key = ?")
            .bind(key)
            .execute(&self.pool)
            .await?;
        Ok(())
    }

    async fn kv_list(&self, page: usize, per_page: usize) -> HostResult<Vec<String>> {
        let limit = i64::try_from(per_page).map_err(|e| HostError::Kv(e.to_string()))?;
        let offset = i64::try_from(page.saturating_mul(per_page))
            .map_err(|e| HostError::Kv(e.to_string()))?;

        let rows = sqlx::query("SELECT key FROM plugin_kv ORDER BY key LIMIT ? OFFSET ?")
            .bind(limit)
            .bind(offset)
            .fetch_all(&self.pool)
            .await?;
        rows.iter()
            .map(|row| row.try_get::<String, _>("key").map_err(HostError::from))
            .collect()
    }

    async fn get_post(&self, id: &PostId) -> HostResult<Post> {
        let row = sqlx::query(
            "SELECT id, user_id, channel_id, message, create_at, type, props FROM posts WHERE id = ?",
        )
        .bind(&id.0)
        .fetch_optional(&self.pool)
        .await?
        .ok_or_else(|| HostError::PostNotFound(id.clone()))?;

        let props: String = row.try_get("props")?;
        let props: Map<String, Value> = serde_json::from_str(&props)?;

        Ok(Post {
            id: PostId(row.try_get("id")?),
            user_id: row.try_get("user_id")?,
            channel_id: row.try_get("channel_id")?,
            message: row.try_get("message")?,
            create_at: row.try_get("create_at")?,
            post_type: row.try_get("type")?,
            props,
        })
    }

    async fn delete_post(&self, id: &PostId) -> HostResult<()> {
        let result = sqlx::query("DELETE FROM posts WHERE id = ?")
            .bind(&id.0)
            .execute(&self.pool)
            .await?;
        if result.rows_affected() == 0 {
            return Err(HostError::PostNotFound(id.clone()));
        }
        Ok(())
    }

    async fn load_plugin_configuration(&self) -> HostResult<PluginConfiguration> {
        Ok(self.configuration.clone())
    }
}
