//! SQLite implementation of [`RoadNetworkStore`].
//!
//! [`SqliteStore`] keeps each snapshot as one JSON TEXT row plus its content
//! hash, in a database with WAL mode, a transaction around every write, and
//! automatic schema migrations.

use rusqlite::{params, Connection, OptionalExtension};

use plateau_core::ObjectKind;

use crate::data::RoadNetworkStorage;
use crate::error::StorageError;
use crate::traits::RoadNetworkStore;
use crate::types::{EncodedSnapshot, RecordCounts, SnapshotSummary};

/// SQLite-backed implementation of [`RoadNetworkStore`].
pub struct SqliteStore {
    conn: Connection,
}

impl SqliteStore {
    /// Opens (or creates) a snapshot database at `path`.
    pub fn new(path: &str) -> Result<Self, StorageError> {
        let conn = crate::schema::open_database(path)?;
        Ok(SqliteStore { conn })
    }

    /// Opens an in-memory snapshot database (for testing).
    pub fn in_memory() -> Result<Self, StorageError> {
        let conn = crate::schema::open_in_memory()?;
        Ok(SqliteStore { conn })
    }

    fn load_counts(&self, name: &str) -> Result<RecordCounts, StorageError> {
        let mut stmt = self
            .conn
            .prepare_cached("SELECT kind, record_count FROM snapshot_counts WHERE snapshot_name = ?1")?;
        let rows = stmt.query_map(params![name], |row| {
            let kind: String = row.get(0)?;
            let count: i64 = row.get(1)?;
            Ok((kind, count))
        })?;

        let mut counts = RecordCounts::default();
        for row in rows {
            let (kind, count) = row?;
            // Kinds this build does not know are skipped.
            if let Some(kind) = kind_from_str(&kind) {
                counts.set(kind, usize::try_from(count).unwrap_or(0));
            }
        }
        Ok(counts)
    }
}

fn kind_from_str(s: &str) -> Option<ObjectKind> {
    ObjectKind::ALL.into_iter().find(|k| k.name() == s)
}

impl RoadNetworkStore for SqliteStore {
    fn save(&mut self, name: &str, storage: &RoadNetworkStorage) -> Result<SnapshotSummary, StorageError> {
        let encoded = EncodedSnapshot::encode(storage)?;

        let tx = self.conn.transaction()?;
        // Cascades to snapshot_counts.
        tx.execute("DELETE FROM snapshots WHERE name = ?1", params![name])?;
        tx.execute(
            "INSERT INTO snapshots (name, content_hash, storage_json) VALUES (?1, ?2, ?3)",
            params![name, encoded.hash, encoded.json],
        )?;
        {
            let mut stmt = tx.prepare_cached(
                "INSERT INTO snapshot_counts (snapshot_name, kind, record_count) VALUES (?1, ?2, ?3)",
            )?;
            for (kind, count) in encoded.counts.iter() {
                stmt.execute(params![name, kind.name(), count as i64])?;
            }
        }
        tx.commit()?;

        let summary = encoded.summary(name);
        tracing::info!("saved snapshot '{}' ({})", name, summary.record_counts);
        Ok(summary)
    }

    fn load(&self, name: &str) -> Result<RoadNetworkStorage, StorageError> {
        let row: Option<(String, String)> = self
            .conn
            .query_row(
                "SELECT storage_json, content_hash FROM snapshots WHERE name = ?1",
                params![name],
                |row| Ok((row.get(0)?, row.get(1)?)),
            )
            .optional()?;
        let (json, hash) = row.ok_or_else(|| StorageError::SnapshotNotFound(name.to_string()))?;
        EncodedSnapshot::decode(name, &json, &hash)
    }

    fn delete(&mut self, name: &str) -> Result<(), StorageError> {
        let tx = self.conn.transaction()?;
        let deleted = tx.execute("DELETE FROM snapshots WHERE name = ?1", params![name])?;
        if deleted == 0 {
            return Err(StorageError::SnapshotNotFound(name.to_string()));
        }
        tx.commit()?;
        Ok(())
    }

    fn list(&self) -> Result<Vec<SnapshotSummary>, StorageError> {
        let mut stmt = self
            .conn
            .prepare_cached("SELECT name, content_hash FROM snapshots ORDER BY name")?;
        let rows = stmt.query_map([], |row| {
            let name: String = row.get(0)?;
            let hash: String = row.get(1)?;
            Ok((name, hash))
        })?;

        let mut result = Vec::new();
        for row in rows {
            let (name, hash) = row?;
            let record_counts = self.load_counts(&name)?;
            result.push(SnapshotSummary {
                name,
                hash,
                record_counts,
            });
        }
        Ok(result)
    }
}
