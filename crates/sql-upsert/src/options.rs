//! Overrides applied on top of derived record metadata.
//!
//! Options are plain data so they can be assembled in code or loaded from a
//! configuration file:
//!
//! ```rust
//! use sql_upsert::{DuplicatePolicy, UpsertOptions};
//!
//! let options = UpsertOptions::new()
//!     .table_name("people")
//!     .on_duplicate_skip();
//! assert_eq!(options.duplicate_policy, Some(DuplicatePolicy::Skip));
//! ```

use std::fmt;
use std::sync::Arc;

use serde::{Deserialize, Serialize};

use crate::dedup::SkipObserver;
use crate::schema::PrimaryMarker;

/// What to do when two rows of a batch share a primary key.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DuplicatePolicy {
    /// Reject the whole batch.
    #[default]
    Error,
    /// Keep the first occurrence and drop later ones.
    Skip,
}

/// What to do when a batch holds no rows.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EmptyBatchPolicy {
    /// Fail with [`UpsertError::EmptyBatch`](crate::UpsertError::EmptyBatch).
    #[default]
    Reject,
    /// Emit a statement with an empty `VALUES ()` clause.
    Emit,
}

/// Overrides for an [`UpsertBuilder`](crate::UpsertBuilder).
///
/// Every field left at `None` keeps the derived value. Setting the same field
/// twice keeps the last value.
#[derive(Clone, Default, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct UpsertOptions {
    /// Target table.
    pub table_name: Option<String>,
    /// Conflict target columns.
    pub primary_key_columns: Option<Vec<String>>,
    /// Columns updated on conflict.
    pub non_primary_key_columns: Option<Vec<String>>,
    /// Full column list, one entry per record field.
    pub columns: Option<Vec<String>>,
    /// Duplicate handling within one batch.
    pub duplicate_policy: Option<DuplicatePolicy>,
    /// How the `primary` marker is recognized.
    pub primary_marker: Option<PrimaryMarker>,
    /// Empty batch handling.
    pub empty_batch: Option<EmptyBatchPolicy>,
    /// Receives rows dropped under [`DuplicatePolicy::Skip`].
    #[serde(skip)]
    pub skip_observer: Option<Arc<dyn SkipObserver>>,
}

impl UpsertOptions {
    /// Creates options that keep every derived value.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Overrides the table name.
    #[must_use]
    pub fn table_name(mut self, table_name: impl Into<String>) -> Self {
        self.table_name = Some(table_name.into());
        self
    }

    /// Overrides the conflict target columns.
    #[must_use]
    pub fn primary_keys(mut self, columns: &[&str]) -> Self {
        self.primary_key_columns = Some(to_strings(columns));
        self
    }

    /// Overrides the columns updated on conflict.
    #[must_use]
    pub fn non_primary_keys(mut self, columns: &[&str]) -> Self {
        self.non_primary_key_columns = Some(to_strings(columns));
        self
    }

    /// Overrides the full column list.
    #[must_use]
    pub fn columns(mut self, columns: &[&str]) -> Self {
        self.columns = Some(to_strings(columns));
        self
    }

    /// Rejects batches containing a repeated primary key. This is the default.
    #[must_use]
    pub const fn on_duplicate_error(mut self) -> Self {
        self.duplicate_policy = Some(DuplicatePolicy::Error);
        self
    }

    /// Drops rows repeating an earlier primary key.
    #[must_use]
    pub const fn on_duplicate_skip(mut self) -> Self {
        self.duplicate_policy = Some(DuplicatePolicy::Skip);
        self
    }

    /// Selects how the `primary` marker is matched.
    #[must_use]
    pub const fn primary_marker(mut self, marker: PrimaryMarker) -> Self {
        self.primary_marker = Some(marker);
        self
    }

    /// Selects how an empty batch is handled.
    #[must_use]
    pub const fn empty_batch(mut self, policy: EmptyBatchPolicy) -> Self {
        self.empty_batch = Some(policy);
        self
    }

    /// Installs an observer for skipped duplicates.
    #[must_use]
    pub fn skip_observer(mut self, observer: Arc<dyn SkipObserver>) -> Self {
        self.skip_observer = Some(observer);
        self
    }
}

impl fmt::Debug for UpsertOptions {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("UpsertOptions")
            .field("table_name", &self.table_name)
            .field("primary_key_columns", &self.primary_key_columns)
            .field("non_primary_key_columns", &self.non_primary_key_columns)
            .field("columns", &self.columns)
            .field("duplicate_policy", &self.duplicate_policy)
            .field("primary_marker", &self.primary_marker)
            .field("empty_batch", &self.empty_batch)
            .field("skip_observer", &self.skip_observer.is_some())
            .finish()
    }
}

fn to_strings(columns: &[&str]) -> Vec<String> {
    columns.iter().map(|s| String::from(*s)).collect()
}
