//! Primary-key deduplication within one batch.

use std::collections::HashSet;
use std::fmt;

use tracing::info;

use crate::error::{Result, UpsertError};
use crate::options::DuplicatePolicy;
use crate::value::SqlValue;

/// Separator used when a signature is rendered as one token.
pub const KEY_SEPARATOR: &str = "-";

/// Primary-key values of one row.
///
/// Signatures compare part by part, so `("1-2", "3")` and `("1", "2-3")` stay
/// distinct even though both render as `1-2-3`.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct KeySignature(Vec<String>);

impl KeySignature {
    /// Builds the signature of `row` from the values at `primary_key_index`.
    #[must_use]
    pub fn of_row(row: &[SqlValue], primary_key_index: &[usize]) -> Self {
        Self(
            primary_key_index
                .iter()
                .filter_map(|&position| row.get(position))
                .map(SqlValue::key_fragment)
                .collect(),
        )
    }

    /// The individual key parts.
    #[must_use]
    pub fn parts(&self) -> &[String] {
        &self.0
    }
}

impl fmt::Display for KeySignature {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0.join(KEY_SEPARATOR))
    }
}

/// Receives every row dropped under [`DuplicatePolicy::Skip`].
pub trait SkipObserver: Send + Sync {
    /// Called once per dropped row, in input order.
    fn on_skip(&self, table: &str, signature: &KeySignature, args: &[SqlValue]);
}

/// Logs skipped rows through `tracing` at `info` level.
#[derive(Debug, Default, Clone, Copy)]
pub struct TracingSkipObserver;

impl SkipObserver for TracingSkipObserver {
    fn on_skip(&self, table: &str, signature: &KeySignature, args: &[SqlValue]) {
        info!(table, %signature, ?args, "duplicate record found: skipping");
    }
}

/// Filters batch rows down to the first occurrence of each key signature.
pub struct Deduplicator<'a> {
    table: &'a str,
    primary_key_index: &'a [usize],
    policy: DuplicatePolicy,
    observer: &'a dyn SkipObserver,
    seen: HashSet<KeySignature>,
}

impl<'a> Deduplicator<'a> {
    /// Creates a deduplicator with an empty seen set.
    #[must_use]
    pub fn new(
        table: &'a str,
        primary_key_index: &'a [usize],
        policy: DuplicatePolicy,
        observer: &'a dyn SkipObserver,
    ) -> Self {
        Self {
            table,
            primary_key_index,
            policy,
            observer,
            seen: HashSet::new(),
        }
    }

    /// Decides whether `row` is emitted.
    ///
    /// Returns `Ok(true)` for a fresh signature and `Ok(false)` for a
    /// repeated one under [`DuplicatePolicy::Skip`].
    ///
    /// # Errors
    ///
    /// Returns [`UpsertError::DuplicateKey`] for a repeated signature under
    /// [`DuplicatePolicy::Error`].
    pub fn admit(&mut self, row: &[SqlValue]) -> Result<bool> {
        let signature = KeySignature::of_row(row, self.primary_key_index);
        if !self.seen.contains(&signature) {
            self.seen.insert(signature);
            return Ok(true);
        }
        match self.policy {
            DuplicatePolicy::Error => Err(UpsertError::DuplicateKey {
                signature,
                args: row.to_vec(),
            }),
            DuplicatePolicy::Skip => {
                self.observer.on_skip(self.table, &signature, row);
                Ok(false)
            }
        }
    }

    /// Filters `rows` in order.
    ///
    /// # Errors
    ///
    /// Fails on the first repeated signature under [`DuplicatePolicy::Error`];
    /// rows accumulated so far are discarded.
    pub fn dedup(mut self, rows: Vec<Vec<SqlValue>>) -> Result<Vec<Vec<SqlValue>>> {
        let mut kept = Vec::with_capacity(rows.len());
        for row in rows {
            if self.admit(&row)? {
                kept.push(row);
            }
        }
        Ok(kept)
    }
}
