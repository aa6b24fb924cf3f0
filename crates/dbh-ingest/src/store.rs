//! Persistent hostname store
//!
//! A local SQLite database with one partition (table) per feed job target.
//! Schema per partition: `(hostname TEXT PRIMARY KEY, last_seen TIMESTAMP)`.
//! Writes are batch-scoped upserts — a batch commits fully or not at all —
//! and upsert idempotency makes interleaved writers safe without external
//! locking. Readers only ever see committed snapshots.

use chrono::{DateTime, Utc};
use sqlx::sqlite::{SqliteConnectOptions, SqlitePoolOptions};
use sqlx::SqlitePool;
use std::str::FromStr;
use tracing::debug;

use dbh_common::Hostname;

use crate::error::{IngestError, Result};
use crate::source::HostnameBatch;

/// Store handle; cheap to clone, shares one connection pool.
#[derive(Clone)]
pub struct FeedStore {
    pool: SqlitePool,
}

impl FeedStore {
    pub fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }

    /// Open (creating if missing) the database at `database_url`.
    pub async fn connect(database_url: &str) -> Result<Self> {
        let options = SqliteConnectOptions::from_str(database_url)?.create_if_missing(true);
        let pool = SqlitePoolOptions::new()
            .max_connections(5)
            .connect_with(options)
            .await?;
        Ok(Self::new(pool))
    }

    /// Upsert one batch into a partition, tagged with the run's logical
    /// update timestamp.
    ///
    /// Inserting an already-present hostname only refreshes `last_seen`;
    /// the partition's hostname set is unchanged. The whole batch runs in
    /// one transaction.
    pub async fn upsert_batch(
        &self,
        target: &str,
        batch: &HostnameBatch,
        seen_at: DateTime<Utc>,
    ) -> Result<u64> {
        let table = table_name(target)?;
        self.ensure_partition(&table).await?;

        let sql = format!(
            "INSERT INTO {table} (hostname, last_seen) VALUES (?1, ?2) \
             ON CONFLICT(hostname) DO UPDATE SET last_seen = excluded.last_seen"
        );

        let mut tx = self.pool.begin().await?;
        for host in batch {
            sqlx::query(&sql)
                .bind(host.as_str())
                .bind(seen_at)
                .execute(&mut *tx)
                .await?;
        }
        tx.commit().await?;

        debug!(target, count = batch.len(), "batch committed");
        Ok(batch.len() as u64)
    }

    /// Remove entries last seen before `cutoff`. Returns rows deleted.
    pub async fn prune(&self, target: &str, cutoff: DateTime<Utc>) -> Result<u64> {
        let table = table_name(target)?;
        self.ensure_partition(&table).await?;
        let result = sqlx::query(&format!("DELETE FROM {table} WHERE last_seen < ?1"))
            .bind(cutoff)
            .execute(&self.pool)
            .await?;
        Ok(result.rows_affected())
    }

    /// Read one partition's full hostname set.
    pub async fn snapshot(&self, target: &str) -> Result<Vec<Hostname>> {
        let table = table_name(target)?;
        self.ensure_partition(&table).await?;
        let rows: Vec<String> =
            sqlx::query_scalar(&format!("SELECT hostname FROM {table} ORDER BY hostname"))
                .fetch_all(&self.pool)
                .await?;
        Ok(rows.iter().filter_map(|raw| Hostname::parse(raw)).collect())
    }

    /// Number of hostnames in one partition.
    pub async fn partition_len(&self, target: &str) -> Result<u64> {
        let table = table_name(target)?;
        self.ensure_partition(&table).await?;
        let count: i64 = sqlx::query_scalar(&format!("SELECT COUNT(*) FROM {table}"))
            .fetch_one(&self.pool)
            .await?;
        Ok(count as u64)
    }

    /// List every partition in the store.
    pub async fn partitions(&self) -> Result<Vec<String>> {
        let rows: Vec<String> = sqlx::query_scalar(
            "SELECT name FROM sqlite_master \
             WHERE type = 'table' AND name NOT LIKE 'sqlite_%' ORDER BY name",
        )
        .fetch_all(&self.pool)
        .await?;
        Ok(rows)
    }

    async fn ensure_partition(&self, table: &str) -> Result<()> {
        sqlx::query(&format!(
            "CREATE TABLE IF NOT EXISTS {table} \
             (hostname TEXT PRIMARY KEY, last_seen TIMESTAMP NOT NULL)"
        ))
        .execute(&self.pool)
        .await?;
        Ok(())
    }
}

/// Validate a job target as a SQL identifier.
///
/// Targets are produced by the sources' own sanitizers; this is the last
/// line of defense before the name is interpolated into SQL.
fn table_name(target: &str) -> Result<String> {
    let valid = !target.is_empty()
        && target.chars().next().is_some_and(|c| c.is_ascii_alphabetic())
        && target
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || c == '_');
    if valid {
        Ok(target.to_string())
    } else {
        Err(IngestError::Parse(format!(
            "invalid partition name: {target:?}"
        )))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    async fn memory_store() -> FeedStore {
        let pool = SqlitePoolOptions::new()
            .max_connections(1)
            .connect("sqlite::memory:")
            .await
            .unwrap();
        FeedStore::new(pool)
    }

    fn hosts(names: &[&str]) -> HostnameBatch {
        names.iter().map(|n| Hostname::parse(n).unwrap()).collect()
    }

    #[tokio::test]
    async fn test_upsert_is_idempotent() {
        let store = memory_store().await;
        let batch = hosts(&["a.example", "b.example"]);
        let now = Utc::now();

        store.upsert_batch("feed_x", &batch, now).await.unwrap();
        store.upsert_batch("feed_x", &batch, now).await.unwrap();

        assert_eq!(store.partition_len("feed_x").await.unwrap(), 2);
    }

    #[tokio::test]
    async fn test_absent_hostnames_are_retained_across_runs() {
        let store = memory_store().await;
        let now = Utc::now();

        store
            .upsert_batch("feed_x", &hosts(&["a.example", "b.example"]), now)
            .await
            .unwrap();
        store
            .upsert_batch("feed_x", &hosts(&["b.example", "c.example"]), now)
            .await
            .unwrap();

        let snapshot = store.snapshot("feed_x").await.unwrap();
        let names: Vec<&str> = snapshot.iter().map(|h| h.as_str()).collect();
        assert_eq!(names, vec!["a.example", "b.example", "c.example"]);
    }

    #[tokio::test]
    async fn test_partitions_are_isolated() {
        let store = memory_store().await;
        let now = Utc::now();

        store
            .upsert_batch("feed_x", &hosts(&["a.example"]), now)
            .await
            .unwrap();
        store
            .upsert_batch("feed_y", &hosts(&["b.example"]), now)
            .await
            .unwrap();

        assert_eq!(store.partition_len("feed_x").await.unwrap(), 1);
        assert_eq!(store.partition_len("feed_y").await.unwrap(), 1);
        assert_eq!(
            store.partitions().await.unwrap(),
            vec!["feed_x".to_string(), "feed_y".to_string()]
        );
    }

    #[tokio::test]
    async fn test_prune_removes_only_old_entries() {
        let store = memory_store().await;
        let old = Utc::now() - chrono::Duration::days(60);
        let now = Utc::now();

        store
            .upsert_batch("feed_x", &hosts(&["stale.example"]), old)
            .await
            .unwrap();
        store
            .upsert_batch("feed_x", &hosts(&["fresh.example"]), now)
            .await
            .unwrap();

        let removed = store
            .prune("feed_x", now - chrono::Duration::days(30))
            .await
            .unwrap();
        assert_eq!(removed, 1);

        let snapshot = store.snapshot("feed_x").await.unwrap();
        assert_eq!(snapshot.len(), 1);
        assert_eq!(snapshot[0].as_str(), "fresh.example");
    }

    #[tokio::test]
    async fn test_upsert_refreshes_last_seen() {
        let store = memory_store().await;
        let old = Utc::now() - chrono::Duration::days(60);
        let now = Utc::now();

        store
            .upsert_batch("feed_x", &hosts(&["kept.example"]), old)
            .await
            .unwrap();
        // Re-seen in this run; prune must no longer remove it
        store
            .upsert_batch("feed_x", &hosts(&["kept.example"]), now)
            .await
            .unwrap();

        let removed = store
            .prune("feed_x", now - chrono::Duration::days(30))
            .await
            .unwrap();
        assert_eq!(removed, 0);
    }

    #[tokio::test]
    async fn test_rejects_hostile_partition_name() {
        let store = memory_store().await;
        let result = store
            .upsert_batch("x; DROP TABLE y", &hosts(&["a.example"]), Utc::now())
            .await;
        assert!(matches!(result, Err(IngestError::Parse(_))));
    }
}
