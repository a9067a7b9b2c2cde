//! Generic bulk reconciliation engine
//!
//! Diffs an in-memory map of new keyed values against the store, derives
//! the minimal set of inserts, pseudo-updates and deletes, and applies it
//! in one transaction. A value of `None` (or exactly zero) means "delete
//! if present".
//!
//! The new-items map is keyed by the entity's key tuple, so duplicate
//! logical keys cannot reach the engine; whichever write wins during map
//! construction is the one reconciled (last-write-wins).

use crate::bulk::{self, BulkEntity};
use crate::console;
use crate::error::{RatebookError, Result};
use crate::store::{RateStore, Scope};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::fmt;

/// Value comparator deciding whether a stored and a new value are equal
pub type Comparator = fn(f64, f64) -> bool;

/// Default comparator: exact equality
pub fn exact_eq(a: f64, b: f64) -> bool {
    a == b
}

/// Count of what happened to each of the new items.
///
/// This is a count per classification, not a count of final statements.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ReconcileStatus {
    pub added: usize,
    pub updated: usize,
    pub deleted: usize,
    pub value_unchanged: usize,
    pub ignored_zero: usize,
}

impl ReconcileStatus {
    /// Total number of classified items
    pub fn total(&self) -> usize {
        self.added + self.updated + self.deleted + self.value_unchanged + self.ignored_zero
    }

    /// Whether any write would be issued
    pub fn has_changes(&self) -> bool {
        self.added + self.updated + self.deleted > 0
    }
}

impl fmt::Display for ReconcileStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "added: {}, updated: {}, deleted: {}, value unchanged: {}, ignored zero: {}",
            self.added, self.updated, self.deleted, self.value_unchanged, self.ignored_zero
        )
    }
}

/// Behavior switches for a reconciliation run
#[derive(Debug, Clone, Copy, Default)]
pub struct ReconcileOptions {
    /// Classify only, never persist
    pub dry_run: bool,
    /// Ask for confirmation before persisting
    pub prompt: bool,
}

/// Result of one reconciliation pass
#[derive(Debug, Clone)]
pub struct ReconcileOutcome<K> {
    /// Classification counts, computed whether or not anything was persisted
    pub status: ReconcileStatus,
    /// Keys classified added, updated or deleted
    pub changed: Vec<K>,
    /// Whether the plan was committed to the store
    pub persisted: bool,
}

/// Reconcile a map of new keyed values against the store.
///
/// When `options.prompt` is set, confirmation is requested on the console.
pub fn reconcile<E, B>(
    store: &mut RateStore,
    new_items: &HashMap<E::Key, Option<f64>>,
    scope: &Scope<'_>,
    build: B,
    comparator: Option<Comparator>,
    options: ReconcileOptions,
) -> Result<ReconcileOutcome<E::Key>>
where
    E: BulkEntity,
    B: Fn(&E::Key, f64) -> E,
{
    reconcile_with(store, new_items, scope, build, comparator, options, |status| {
        console::confirm_plan(status)
    })
}

/// Reconcile with an explicit confirmation callback.
///
/// The callback is only invoked when `options.prompt` is set and there is
/// something to persist; returning false skips all writes without error.
pub fn reconcile_with<E, B, C>(
    store: &mut RateStore,
    new_items: &HashMap<E::Key, Option<f64>>,
    scope: &Scope<'_>,
    build: B,
    comparator: Option<Comparator>,
    options: ReconcileOptions,
    confirm: C,
) -> Result<ReconcileOutcome<E::Key>>
where
    E: BulkEntity,
    B: Fn(&E::Key, f64) -> E,
    C: FnOnce(&ReconcileStatus) -> bool,
{
    // Capability gate: declared per entity type, checked before any work
    if !E::BULK_CAPABLE {
        return Err(RatebookError::UnsupportedModel(E::TABLE));
    }

    let comparator = comparator.unwrap_or(exact_eq);

    // Build the existing-record cache with a single scoped query. It lives
    // for this call only and is never refreshed mid-run.
    let mut cache: HashMap<E::Key, E> = HashMap::new();
    for row in store.fetch_all::<E>(scope)? {
        cache.insert(row.key(), row);
    }

    let mut status = ReconcileStatus::default();
    let mut updates: Vec<E> = Vec::new();
    let mut inserts: Vec<E> = Vec::new();
    let mut delete_ids: Vec<i64> = Vec::new();
    let mut changed: Vec<E::Key> = Vec::new();

    for (key, value) in new_items {
        // Zero means "no value", same as absent
        let value = (*value).filter(|v| *v != 0.0);

        match (cache.get(key), value) {
            (Some(old), Some(new_value)) => {
                if comparator(old.value(), new_value) {
                    status.value_unchanged += 1;
                } else {
                    let mut updated = old.clone();
                    updated.set_value(new_value);
                    updated.validate()?;
                    updates.push(updated);
                    changed.push(key.clone());
                    status.updated += 1;
                }
            }
            (Some(old), None) => {
                let id = old.id().ok_or_else(|| {
                    RatebookError::StoreError(format!(
                        "Cached {} row has no id for key {:?}",
                        E::TABLE,
                        key
                    ))
                })?;
                delete_ids.push(id);
                changed.push(key.clone());
                status.deleted += 1;
            }
            (None, Some(new_value)) => {
                let row = build(key, new_value);
                row.validate()?;
                inserts.push(row);
                changed.push(key.clone());
                status.added += 1;
            }
            (None, None) => {
                // Zero values are never persisted
                status.ignored_zero += 1;
            }
        }
    }

    if options.dry_run {
        log::info!("Dry run against {}: {}", E::TABLE, status);
        return Ok(ReconcileOutcome {
            status,
            changed,
            persisted: false,
        });
    }

    // The confirmation wait happens with no transaction open; only the
    // final commit runs inside one.
    if options.prompt && !confirm(&status) {
        log::info!("Reconciliation of {} declined, no writes performed", E::TABLE);
        return Ok(ReconcileOutcome {
            status,
            changed,
            persisted: false,
        });
    }

    let tx = store.transaction()?;
    bulk::commit(&tx, &updates, &inserts, &delete_ids)?;
    tx.commit()
        .map_err(|e| RatebookError::StoreError(format!("Failed to commit reconciliation: {}", e)))?;

    log::info!("Reconciled {}: {}", E::TABLE, status);
    Ok(ReconcileOutcome {
        status,
        changed,
        persisted: true,
    })
}
