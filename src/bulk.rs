//! Chunked bulk write operations
//!
//! SQLite caps the number of parameters a single statement may carry
//! (commonly 999). Bulk creates and deletes are split into chunks that
//! stay under [`PARAM_CEILING`], and pseudo-updates are ordered
//! delete-first so recreated rows cannot collide with recycled rowids.

use crate::error::{RatebookError, Result};
use rusqlite::types::Value;
use rusqlite::Transaction;
use std::collections::BTreeSet;
use std::fmt::Debug;
use std::hash::Hash;

/// Maximum number of scalar parameters carried by one bulk statement.
/// Kept under the common 999-parameter limit.
pub const PARAM_CEILING: usize = 900;

/// Descriptor for an entity type that participates in bulk reconciliation.
///
/// Implementations declare their table layout and capability statically,
/// so a type lacking bulk support is rejected before any work begins
/// rather than probed at runtime.
pub trait BulkEntity: Sized + Clone {
    /// The tuple of attributes uniquely identifying a logical row
    /// within one reconciliation run.
    type Key: Eq + Hash + Clone + Debug;

    /// Backing table name
    const TABLE: &'static str;

    /// Column names in bind order. The primary key column comes first.
    const COLUMNS: &'static [&'static str];

    /// Whether the table supports chunked bulk create/delete
    const BULK_CAPABLE: bool;

    /// Persistent identifier, if the row has been stored
    fn id(&self) -> Option<i64>;

    /// Key tuple for cache lookup
    fn key(&self) -> Self::Key;

    /// The scalar value attribute
    fn value(&self) -> f64;

    /// Replace the scalar value attribute
    fn set_value(&mut self, value: f64);

    /// Parameter values in [`Self::COLUMNS`] order. The last-modified
    /// timestamp is stamped here, at write time.
    fn bind(&self) -> Vec<Value>;

    /// Build from a row selected with [`Self::COLUMNS`] order
    fn from_row(row: &rusqlite::Row<'_>) -> rusqlite::Result<Self>;

    /// Domain validation, applied before any persistence
    fn validate(&self) -> Result<()>;
}

/// Rows per insert chunk for a given field count
pub fn rows_per_chunk(field_count: usize) -> usize {
    (PARAM_CEILING / field_count).max(1)
}

/// Bulk create rows, chunked to stay under the parameter ceiling.
///
/// Input order is preserved across chunks; the final chunk may be partial.
pub fn bulk_insert<E: BulkEntity>(tx: &Transaction<'_>, rows: &[E]) -> Result<()> {
    if rows.is_empty() {
        return Ok(());
    }

    let per_chunk = rows_per_chunk(E::COLUMNS.len());
    log::debug!(
        "Bulk insert into {}: {} rows, {} per chunk",
        E::TABLE,
        rows.len(),
        per_chunk
    );

    for chunk in rows.chunks(per_chunk) {
        insert_chunk(tx, chunk)?;
    }
    Ok(())
}

fn insert_chunk<E: BulkEntity>(tx: &Transaction<'_>, chunk: &[E]) -> Result<()> {
    let row_marks = format!("({})", vec!["?"; E::COLUMNS.len()].join(", "));
    let values = vec![row_marks; chunk.len()].join(", ");
    let sql = format!(
        "INSERT INTO {} ({}) VALUES {}",
        E::TABLE,
        E::COLUMNS.join(", "),
        values
    );

    let params: Vec<Value> = chunk.iter().flat_map(|row| row.bind()).collect();
    tx.execute(&sql, rusqlite::params_from_iter(params))
        .map_err(|e| RatebookError::StoreError(format!("Failed to bulk insert into {}: {}", E::TABLE, e)))?;
    Ok(())
}

/// Bulk delete rows by primary key, chunked at the parameter ceiling.
///
/// Delete statements carry one parameter per id, so the chunk size is
/// the ceiling itself. Empty input is a no-op.
pub fn bulk_delete<E: BulkEntity>(tx: &Transaction<'_>, ids: &[i64]) -> Result<()> {
    if ids.is_empty() {
        return Ok(());
    }

    for chunk in ids.chunks(PARAM_CEILING) {
        let marks = vec!["?"; chunk.len()].join(", ");
        let sql = format!(
            "DELETE FROM {} WHERE {} IN ({})",
            E::TABLE,
            E::COLUMNS[0],
            marks
        );
        tx.execute(&sql, rusqlite::params_from_iter(chunk.iter().copied()))
            .map_err(|e| {
                RatebookError::StoreError(format!("Failed to bulk delete from {}: {}", E::TABLE, e))
            })?;
    }
    Ok(())
}

/// Apply a reconciliation plan in collision-safe order.
///
/// Updates are pseudo-updates: the old row is deleted and a replacement
/// carrying the original id is recreated. All deletes (for updates and
/// true deletes alike) run first, then the update recreations, then the
/// id-less inserts, so a recreated id can never be stolen by rowid
/// auto-assignment.
pub fn commit<E: BulkEntity>(
    tx: &Transaction<'_>,
    updates: &[E],
    inserts: &[E],
    deletes: &[i64],
) -> Result<()> {
    let mut doomed: BTreeSet<i64> = deletes.iter().copied().collect();
    for row in updates {
        if let Some(id) = row.id() {
            doomed.insert(id);
        }
    }
    let doomed: Vec<i64> = doomed.into_iter().collect();

    bulk_delete::<E>(tx, &doomed)?;
    bulk_insert(tx, updates)?;
    bulk_insert(tx, inserts)?;
    Ok(())
}
