//! Key/value persistence for Atelier.
//!
//! Every tab of one origin shares a single `PersistentStore`. Project
//! documents are stored as JSON text under `project-<uid>`, next to a few
//! origin-wide settings.
//!
//! # Implementations
//!
//! - `MemoryStore`: shared in-process map, used by tests and embedded hosts
//! - `DuckDbStore`: durable `kv` table in a DuckDB file

mod duckdb_store;
mod error;
mod memory_store;
mod settings;
mod store;

pub use duckdb_store::DuckDbStore;
pub use error::{StorageError, StorageResult};
pub use memory_store::MemoryStore;
pub use settings::StoredSettings;
pub use store::PersistentStore;

/// Open a DuckDB connection with stale WAL recovery and resource limits.
///
/// If the initial open fails and a `.wal` file exists alongside the database,
/// it is removed and the open is retried once.
pub fn open_duckdb_with_wal_recovery(
    path: &std::path::Path,
    memory_limit: &str,
    threads: u32,
) -> StorageResult<duckdb::Connection> {
    let conn = match duckdb::Connection::open(path) {
        Ok(c) => c,
        Err(first_err) => {
            let wal_path = path.with_extension(
                path.extension()
                    .map(|ext| format!("{}.wal", ext.to_string_lossy()))
                    .unwrap_or_else(|| "wal".to_string()),
            );
            if wal_path.exists() {
                tracing::warn!(
                    "DuckDB open failed, removing stale WAL and retrying: {}",
                    wal_path.display()
                );
                if std::fs::remove_file(&wal_path).is_ok() {
                    let c = duckdb::Connection::open(path)?;
                    apply_resource_limits(&c, memory_limit, threads)?;
                    return Ok(c);
                }
            }
            return Err(first_err.into());
        }
    };
    apply_resource_limits(&conn, memory_limit, threads)?;
    Ok(conn)
}

fn apply_resource_limits(
    conn: &duckdb::Connection,
    memory_limit: &str,
    threads: u32,
) -> StorageResult<()> {
    conn.execute_batch(&format!(
        "PRAGMA memory_limit='{}'; PRAGMA threads={};",
        memory_limit, threads
    ))?;
    Ok(())
}
