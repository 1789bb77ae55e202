//! Schema for the persistent store.
//!
//! Two tables: `stores` holds one row per named store and `entries` holds
//! the responses, keyed by `(store, key_hash)` and removed with their store
//! through `ON DELETE CASCADE`. The schema version lives in SQLite's
//! `user_version` pragma; the `n`th entry of [`SCHEMA`] brings the
//! database to version `n`.

use super::Error;
use tokio_rusqlite::Connection;

const SCHEMA: &[&str] = &[
    include_str!("../../migrations/001_stores.sql"),
    include_str!("../../migrations/002_entries.sql"),
];

/// Bring the schema up to date. Each pending step runs in its own
/// transaction together with its version bump.
///
/// # Errors
///
/// Returns `Error::MigrationFailed` naming the step that did not apply.
pub async fn run(conn: &Connection) -> Result<(), Error> {
    conn.call(|conn| -> Result<(), Error> {
        let applied: i64 = conn.query_row("PRAGMA user_version", [], |row| row.get(0))?;

        for (version, sql) in (1_i64..).zip(SCHEMA).filter(|(version, _)| *version > applied) {
            let tx = conn.transaction()?;
            tx.execute_batch(sql)
                .and_then(|()| tx.pragma_update(None, "user_version", version))
                .map_err(|e| Error::MigrationFailed(format!("schema step {version}: {e}")))?;
            tx.commit()?;
            tracing::debug!(version, "schema step applied");
        }

        Ok(())
    })
    .await
    .map_err(Error::from)
}
