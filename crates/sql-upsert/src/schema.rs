//! Record metadata.
//!
//! A record type registers its fields once, in declaration order, as
//! annotation strings of the form `column` or `column,primary`. This module
//! turns those annotations into the column lists an upsert needs.
//!
//! Implement [`Record`] with `#[derive(Record)]` or by hand:
//!
//! ```rust
//! use sql_upsert::schema::{PrimaryMarker, Record, TableMetadata};
//! use sql_upsert::value::{SqlValue, ToSqlValue};
//!
//! struct Person {
//!     id: String,
//!     name: String,
//! }
//!
//! impl Record for Person {
//!     const TYPE_NAME: &'static str = "Person";
//!     const ANNOTATIONS: &'static [&'static str] = &["id,primary", "name"];
//!
//!     fn values(&self) -> Vec<SqlValue> {
//!         vec![self.id.clone().to_sql_value(), self.name.clone().to_sql_value()]
//!     }
//! }
//!
//! let meta = TableMetadata::derive::<Person>(PrimaryMarker::default());
//! assert_eq!(meta.table_name, "person");
//! assert_eq!(meta.primary_key_columns, ["id"]);
//! ```

use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::value::SqlValue;

/// Separator between the column name and flags of an annotation.
pub const ANNOTATION_SEPARATOR: char = ',';

/// Marker flag declaring a primary-key column.
pub const PRIMARY_MARKER: &str = "primary";

/// A record type whose instances can be upserted.
pub trait Record {
    /// The type name. The default table name is its lower-cased form.
    const TYPE_NAME: &'static str;

    /// One annotation per field, in declaration order.
    const ANNOTATIONS: &'static [&'static str];

    /// Explicit table name, if the type declares one.
    const TABLE_NAME: Option<&'static str> = None;

    /// The field values in declaration order.
    ///
    /// Must return exactly `ANNOTATIONS.len()` values.
    fn values(&self) -> Vec<SqlValue>;
}

/// How the `primary` marker is recognized in an annotation.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PrimaryMarker {
    /// The annotation contains `primary` anywhere, including inside the
    /// column name (`is_primary_admin` matches).
    #[default]
    Substring,
    /// One of the comma-separated flags after the column name is exactly
    /// `primary`.
    Token,
}

impl PrimaryMarker {
    /// Returns whether `annotation` declares a primary-key column.
    #[must_use]
    pub fn matches(self, annotation: &str) -> bool {
        match self {
            Self::Substring => annotation.contains(PRIMARY_MARKER),
            Self::Token => annotation
                .split(ANNOTATION_SEPARATOR)
                .skip(1)
                .any(|flag| flag.trim() == PRIMARY_MARKER),
        }
    }
}

/// A record field mapped to a column.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ColumnDescriptor {
    /// Field position in declaration order.
    pub position: usize,
    /// Column name: the annotation up to the first separator.
    pub name: String,
    /// Whether the column is part of the primary key.
    pub primary_key: bool,
}

impl ColumnDescriptor {
    /// Parses the annotation of the field at `position`.
    ///
    /// Malformed or empty annotations are not rejected; they produce an empty
    /// column name.
    #[must_use]
    pub fn parse(position: usize, annotation: &str, marker: PrimaryMarker) -> Self {
        let name = annotation
            .split(ANNOTATION_SEPARATOR)
            .next()
            .unwrap_or_default();
        Self {
            position,
            name: String::from(name),
            primary_key: marker.matches(annotation),
        }
    }
}

/// Column layout derived from a [`Record`] type.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TableMetadata {
    /// Target table.
    pub table_name: String,
    /// All columns in declaration order.
    pub columns: Vec<String>,
    /// Primary-key columns in declaration order.
    pub primary_key_columns: Vec<String>,
    /// Field positions of the primary-key columns.
    pub primary_key_index: Vec<usize>,
    /// Remaining columns in declaration order.
    pub non_primary_key_columns: Vec<String>,
}

impl TableMetadata {
    /// Derives the layout of `R`.
    #[must_use]
    pub fn derive<R: Record>(marker: PrimaryMarker) -> Self {
        let descriptors = R::ANNOTATIONS
            .iter()
            .enumerate()
            .map(|(position, annotation)| ColumnDescriptor::parse(position, annotation, marker));
        let table_name = R::TABLE_NAME.map_or_else(|| R::TYPE_NAME.to_lowercase(), String::from);
        let meta = Self::from_descriptors(table_name, descriptors);
        debug!(
            table = %meta.table_name,
            columns = ?meta.columns,
            primary_key = ?meta.primary_key_columns,
            "derived record metadata"
        );
        meta
    }

    /// Partitions descriptors, keeping their order within each partition.
    #[must_use]
    pub fn from_descriptors(
        table_name: String,
        descriptors: impl IntoIterator<Item = ColumnDescriptor>,
    ) -> Self {
        let mut meta = Self {
            table_name,
            columns: Vec::new(),
            primary_key_columns: Vec::new(),
            primary_key_index: Vec::new(),
            non_primary_key_columns: Vec::new(),
        };
        for descriptor in descriptors {
            if descriptor.primary_key {
                meta.primary_key_columns.push(descriptor.name.clone());
                meta.primary_key_index.push(descriptor.position);
            } else {
                meta.non_primary_key_columns.push(descriptor.name.clone());
            }
            meta.columns.push(descriptor.name);
        }
        meta
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    struct Membership;

    impl Record for Membership {
        const TYPE_NAME: &'static str = "Membership";
        const ANNOTATIONS: &'static [&'static str] =
            &["user_id,primary", "joined_at", "group_id,primary", "role"];

        fn values(&self) -> Vec<SqlValue> {
            vec![SqlValue::Null; 4]
        }
    }

    struct Renamed;

    impl Record for Renamed {
        const TYPE_NAME: &'static str = "Renamed";
        const ANNOTATIONS: &'static [&'static str] = &["id,primary"];
        const TABLE_NAME: Option<&'static str> = Some("renamed_things");

        fn values(&self) -> Vec<SqlValue> {
            vec![SqlValue::Null]
        }
    }

    #[test]
    fn test_partitions_preserve_declaration_order() {
        let meta = TableMetadata::derive::<Membership>(PrimaryMarker::Substring);
        assert_eq!(meta.table_name, "membership");
        assert_eq!(meta.columns, ["user_id", "joined_at", "group_id", "role"]);
        assert_eq!(meta.primary_key_columns, ["user_id", "group_id"]);
        assert_eq!(meta.primary_key_index, [0, 2]);
        assert_eq!(meta.non_primary_key_columns, ["joined_at", "role"]);
        assert_eq!(meta.primary_key_columns.len(), meta.primary_key_index.len());
    }

    #[test]
    fn test_columns_are_union_of_partitions() {
        let meta = TableMetadata::derive::<Membership>(PrimaryMarker::Token);
        let mut merged: Vec<(usize, &String)> = meta
            .primary_key_index
            .iter()
            .copied()
            .zip(&meta.primary_key_columns)
            .collect();
        let non_pk_positions =
            (0..meta.columns.len()).filter(|i| !meta.primary_key_index.contains(i));
        merged.extend(non_pk_positions.zip(&meta.non_primary_key_columns));
        merged.sort_by_key(|(position, _)| *position);
        let merged: Vec<&String> = merged.into_iter().map(|(_, name)| name).collect();
        assert_eq!(merged, meta.columns.iter().collect::<Vec<_>>());
    }

    #[test]
    fn test_declared_table_name_wins() {
        let meta = TableMetadata::derive::<Renamed>(PrimaryMarker::default());
        assert_eq!(meta.table_name, "renamed_things");
    }

    #[test]
    fn test_column_name_stops_at_separator() {
        let column = ColumnDescriptor::parse(3, "email,primary", PrimaryMarker::Substring);
        assert_eq!(column.position, 3);
        assert_eq!(column.name, "email");
        assert!(column.primary_key);

        let column = ColumnDescriptor::parse(0, "name,omitempty", PrimaryMarker::Substring);
        assert_eq!(column.name, "name");
        assert!(!column.primary_key);
    }

    #[test]
    fn test_empty_annotation_gives_empty_name() {
        let column = ColumnDescriptor::parse(0, "", PrimaryMarker::Substring);
        assert_eq!(column.name, "");
        assert!(!column.primary_key);
    }

    #[test]
    fn test_substring_marker_matches_inside_name() {
        assert!(PrimaryMarker::Substring.matches("is_primary_admin"));
        assert!(!PrimaryMarker::Token.matches("is_primary_admin"));
        assert!(PrimaryMarker::Token.matches("id,primary"));
        assert!(PrimaryMarker::Token.matches("id, primary"));
        assert!(!PrimaryMarker::Token.matches("primary"));
    }
}
