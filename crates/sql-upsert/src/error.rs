//! Error types for statement generation and builder configuration.

use thiserror::Error;

use crate::dedup::KeySignature;
use crate::value::SqlValue;

/// Errors returned by [`UpsertBuilder::build_upsert`](crate::UpsertBuilder::build_upsert).
///
/// Any error is fatal to the call: no partial statement is produced.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum UpsertError {
    /// The input was absent.
    #[error("nil is not supported")]
    NilInput,

    /// The input was a collection reference that holds no collection.
    #[error("nil slice is not supported")]
    NilCollection,

    /// The input is neither a single record nor a sequence of records.
    #[error("{kind} is not supported")]
    UnsupportedInputKind {
        /// Description of the rejected input shape.
        kind: &'static str,
    },

    /// Two rows of a batch share a primary key under the `Error` policy.
    #[error("duplicate record found: {signature}")]
    DuplicateKey {
        /// Key signature shared by the colliding rows.
        signature: KeySignature,
        /// Arguments of the row that collided with an earlier one.
        args: Vec<SqlValue>,
    },

    /// The batch contained no rows.
    #[error("empty batch is not supported")]
    EmptyBatch,
}

/// Errors rejected while applying [`UpsertOptions`](crate::UpsertOptions).
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ConfigError {
    /// The column list does not line up with the record's fields.
    #[error("{table}: {columns} columns configured for {fields} record fields")]
    ColumnCountMismatch {
        /// Target table.
        table: String,
        /// Number of configured columns.
        columns: usize,
        /// Number of fields declared by the record.
        fields: usize,
    },

    /// A primary-key column is missing from the column list.
    #[error("{table}: primary key column '{column}' is not a configured column")]
    UnknownPrimaryKey {
        /// Target table.
        table: String,
        /// The offending column.
        column: String,
    },

    /// A non-primary-key column is missing from the column list.
    #[error("{table}: update column '{column}' is not a configured column")]
    UnknownColumn {
        /// Target table.
        table: String,
        /// The offending column.
        column: String,
    },
}

/// Result type for statement generation.
pub type Result<T> = std::result::Result<T, UpsertError>;
