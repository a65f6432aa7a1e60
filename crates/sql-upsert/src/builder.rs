//! The upsert statement builder.

use std::fmt;
use std::marker::PhantomData;
use std::sync::Arc;

use tracing::debug;

use crate::dedup::{Deduplicator, SkipObserver, TracingSkipObserver};
use crate::error::{ConfigError, Result, UpsertError};
use crate::extract::{placeholder_group, row_values};
use crate::input::{Batch, IntoBatch};
use crate::options::{DuplicatePolicy, EmptyBatchPolicy, UpsertOptions};
use crate::schema::{PrimaryMarker, Record, TableMetadata};
use crate::statement::UpsertStatement;
use crate::value::SqlValue;

/// A generated statement and its positional arguments.
#[derive(Debug, Clone, PartialEq)]
pub struct Upsert {
    /// Statement text with `?` placeholders.
    pub sql: String,
    /// Arguments aligned with the placeholders.
    pub args: Vec<SqlValue>,
}

impl Upsert {
    /// Splits into statement text and arguments.
    #[must_use]
    pub fn into_parts(self) -> (String, Vec<SqlValue>) {
        (self.sql, self.args)
    }
}

/// Builds upsert statements for records of type `R`.
///
/// Configuration is derived once and never changes afterwards, so one builder
/// can serve any number of calls, including from several threads.
pub struct UpsertBuilder<R> {
    table_name: String,
    columns: Vec<String>,
    primary_key_columns: Vec<String>,
    primary_key_index: Vec<usize>,
    non_primary_key_columns: Vec<String>,
    duplicate_policy: DuplicatePolicy,
    empty_batch: EmptyBatchPolicy,
    observer: Arc<dyn SkipObserver>,
    _record: PhantomData<fn() -> R>,
}

impl<R: Record> UpsertBuilder<R> {
    /// Creates a builder from the metadata derived from `R`.
    #[must_use]
    pub fn new() -> Self {
        let meta = TableMetadata::derive::<R>(PrimaryMarker::default());
        Self {
            table_name: meta.table_name,
            columns: meta.columns,
            primary_key_columns: meta.primary_key_columns,
            primary_key_index: meta.primary_key_index,
            non_primary_key_columns: meta.non_primary_key_columns,
            duplicate_policy: DuplicatePolicy::default(),
            empty_batch: EmptyBatchPolicy::default(),
            observer: Arc::new(TracingSkipObserver),
            _record: PhantomData,
        }
    }

    /// Creates a builder, applying `options` over the derived metadata.
    ///
    /// Each option replaces only its own field. When `columns` or the key
    /// columns are overridden, the key index is recomputed by looking up each
    /// key column in the final column list.
    ///
    /// # Errors
    ///
    /// Returns a [`ConfigError`] when the column list does not match the
    /// record's field count, or when a key or update column is not one of the
    /// configured columns.
    pub fn with_options(options: UpsertOptions) -> std::result::Result<Self, ConfigError> {
        let meta = TableMetadata::derive::<R>(options.primary_marker.unwrap_or_default());
        let table_name = options.table_name.unwrap_or(meta.table_name);

        let columns_overridden = options.columns.is_some();
        let columns = options.columns.unwrap_or(meta.columns);
        if columns.len() != R::ANNOTATIONS.len() {
            return Err(ConfigError::ColumnCountMismatch {
                table: table_name,
                columns: columns.len(),
                fields: R::ANNOTATIONS.len(),
            });
        }

        let pk_overridden = options.primary_key_columns.is_some();
        let primary_key_columns = options
            .primary_key_columns
            .unwrap_or(meta.primary_key_columns);
        let primary_key_index = if pk_overridden || columns_overridden {
            primary_key_columns
                .iter()
                .map(|pk| {
                    columns
                        .iter()
                        .position(|column| column == pk)
                        .ok_or_else(|| ConfigError::UnknownPrimaryKey {
                            table: table_name.clone(),
                            column: pk.clone(),
                        })
                })
                .collect::<std::result::Result<Vec<_>, _>>()?
        } else {
            meta.primary_key_index
        };

        let non_primary_key_columns = options
            .non_primary_key_columns
            .unwrap_or(meta.non_primary_key_columns);
        if let Some(unknown) = non_primary_key_columns
            .iter()
            .find(|col| !columns.contains(col))
        {
            return Err(ConfigError::UnknownColumn {
                table: table_name,
                column: unknown.clone(),
            });
        }

        let builder = Self {
            table_name,
            columns,
            primary_key_columns,
            primary_key_index,
            non_primary_key_columns,
            duplicate_policy: options.duplicate_policy.unwrap_or_default(),
            empty_batch: options.empty_batch.unwrap_or_default(),
            observer: options
                .skip_observer
                .unwrap_or_else(|| Arc::new(TracingSkipObserver)),
            _record: PhantomData,
        };
        debug!(
            table = %builder.table_name,
            columns = ?builder.columns,
            primary_key = ?builder.primary_key_columns,
            policy = ?builder.duplicate_policy,
            "configured upsert builder"
        );
        Ok(builder)
    }

    /// Builds the statement for one record or a batch of records.
    ///
    /// Batches are deduplicated by primary key according to the configured
    /// [`DuplicatePolicy`]; emitted rows keep their input order.
    ///
    /// # Errors
    ///
    /// See [`UpsertError`]. No statement is returned on error.
    pub fn build_upsert<'a>(&self, input: impl IntoBatch<'a, R>) -> Result<Upsert>
    where
        R: 'a,
    {
        let rows = match input.into_batch() {
            Batch::Absent => return Err(UpsertError::NilInput),
            Batch::NilCollection => return Err(UpsertError::NilCollection),
            Batch::Unsupported { kind } => {
                return Err(UpsertError::UnsupportedInputKind { kind });
            }
            Batch::One(record) => vec![row_values(record)],
            Batch::Many(records) => {
                let rows = records.iter().map(row_values).collect();
                Deduplicator::new(
                    &self.table_name,
                    &self.primary_key_index,
                    self.duplicate_policy,
                    self.observer.as_ref(),
                )
                .dedup(rows)?
            }
        };

        if rows.is_empty() && self.empty_batch == EmptyBatchPolicy::Reject {
            return Err(UpsertError::EmptyBatch);
        }

        let groups: Vec<String> = rows
            .iter()
            .map(|row| placeholder_group(row.len()))
            .collect();
        let sql = UpsertStatement {
            table: &self.table_name,
            columns: &self.columns,
            rows: &groups,
            primary_key_columns: &self.primary_key_columns,
            non_primary_key_columns: &self.non_primary_key_columns,
        }
        .to_sql();
        let args: Vec<SqlValue> = rows.into_iter().flatten().collect();

        debug!(
            table = %self.table_name,
            rows = groups.len(),
            args = args.len(),
            "built upsert"
        );
        Ok(Upsert { sql, args })
    }

    /// Target table.
    #[must_use]
    pub fn table_name(&self) -> &str {
        &self.table_name
    }

    /// Insert column list.
    #[must_use]
    pub fn columns(&self) -> &[String] {
        &self.columns
    }

    /// Conflict target columns.
    #[must_use]
    pub fn primary_key_columns(&self) -> &[String] {
        &self.primary_key_columns
    }

    /// Field positions of the conflict target columns.
    #[must_use]
    pub fn primary_key_index(&self) -> &[usize] {
        &self.primary_key_index
    }

    /// Columns updated on conflict.
    #[must_use]
    pub fn non_primary_key_columns(&self) -> &[String] {
        &self.non_primary_key_columns
    }

    /// Duplicate handling within one batch.
    #[must_use]
    pub const fn duplicate_policy(&self) -> DuplicatePolicy {
        self.duplicate_policy
    }

    /// Empty batch handling.
    #[must_use]
    pub const fn empty_batch(&self) -> EmptyBatchPolicy {
        self.empty_batch
    }
}

impl<R: Record> Default for UpsertBuilder<R> {
    fn default() -> Self {
        Self::new()
    }
}

impl<R> Clone for UpsertBuilder<R> {
    fn clone(&self) -> Self {
        Self {
            table_name: self.table_name.clone(),
            columns: self.columns.clone(),
            primary_key_columns: self.primary_key_columns.clone(),
            primary_key_index: self.primary_key_index.clone(),
            non_primary_key_columns: self.non_primary_key_columns.clone(),
            duplicate_policy: self.duplicate_policy,
            empty_batch: self.empty_batch,
            observer: Arc::clone(&self.observer),
            _record: PhantomData,
        }
    }
}

impl<R> fmt::Debug for UpsertBuilder<R> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("UpsertBuilder")
            .field("table_name", &self.table_name)
            .field("columns", &self.columns)
            .field("primary_key_columns", &self.primary_key_columns)
            .field("primary_key_index", &self.primary_key_index)
            .field("non_primary_key_columns", &self.non_primary_key_columns)
            .field("duplicate_policy", &self.duplicate_policy)
            .field("empty_batch", &self.empty_batch)
            .finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::value::ToSqlValue;

    #[derive(Clone)]
    struct Person {
        id: String,
        name: String,
        age: Option<i32>,
    }

    impl Record for Person {
        const TYPE_NAME: &'static str = "Person";
        const ANNOTATIONS: &'static [&'static str] = &["id,primary", "name", "age"];

        fn values(&self) -> Vec<SqlValue> {
            vec![
                self.id.clone().to_sql_value(),
                self.name.clone().to_sql_value(),
                self.age.to_sql_value(),
            ]
        }
    }

    fn person(id: &str, name: &str) -> Person {
        Person {
            id: String::from(id),
            name: String::from(name),
            age: None,
        }
    }

    #[test]
    fn test_derived_configuration() {
        let builder = UpsertBuilder::<Person>::new();
        assert_eq!(builder.table_name(), "person");
        assert_eq!(builder.columns(), ["id", "name", "age"]);
        assert_eq!(builder.primary_key_columns(), ["id"]);
        assert_eq!(builder.primary_key_index(), [0]);
        assert_eq!(builder.non_primary_key_columns(), ["name", "age"]);
        assert_eq!(builder.duplicate_policy(), DuplicatePolicy::Error);
    }

    #[test]
    fn test_single_record() {
        let builder = UpsertBuilder::<Person>::new();
        let (sql, args) = builder
            .build_upsert(&person("1001", "Tom"))
            .unwrap()
            .into_parts();
        assert_eq!(
            sql,
            "INSERT INTO person (id, name, age) VALUES (?, ?, ?)\n\
             ON CONFLICT (id) DO UPDATE SET name = excluded.name, age = excluded.age"
        );
        assert_eq!(
            args,
            vec![
                SqlValue::Text(String::from("1001")),
                SqlValue::Text(String::from("Tom")),
                SqlValue::Null,
            ]
        );
    }

    #[test]
    fn test_nil_inputs() {
        let builder = UpsertBuilder::<Person>::new();
        assert_eq!(builder.build_upsert(None::<&Person>), Err(UpsertError::NilInput));
        assert_eq!(
            builder.build_upsert(None::<&Vec<Person>>),
            Err(UpsertError::NilCollection)
        );
        assert_eq!(
            builder.build_upsert(None::<&[Person]>),
            Err(UpsertError::NilCollection)
        );
    }

    #[test]
    fn test_unsupported_input() {
        let builder = UpsertBuilder::<Person>::new();
        let input: Batch<'_, Person> = Batch::Unsupported { kind: "map" };
        let result = builder.build_upsert(input);
        assert_eq!(result, Err(UpsertError::UnsupportedInputKind { kind: "map" }));
        assert_eq!(result.unwrap_err().to_string(), "map is not supported");
    }

    #[test]
    fn test_empty_batch_policy() {
        let rows: Vec<Person> = Vec::new();
        let rejecting = UpsertBuilder::<Person>::new();
        assert_eq!(rejecting.build_upsert(&rows), Err(UpsertError::EmptyBatch));

        let emitting = UpsertBuilder::<Person>::with_options(
            UpsertOptions::new().empty_batch(EmptyBatchPolicy::Emit),
        )
        .unwrap();
        let upsert = emitting.build_upsert(&rows).unwrap();
        assert!(upsert.sql.contains("VALUES ()\n"));
        assert!(upsert.args.is_empty());
    }

    #[test]
    fn test_column_override_keeps_key_lists() {
        let builder = UpsertBuilder::<Person>::with_options(
            UpsertOptions::new().columns(&["name", "id", "age"]),
        )
        .unwrap();
        assert_eq!(builder.columns(), ["name", "id", "age"]);
        assert_eq!(builder.primary_key_columns(), ["id"]);
        assert_eq!(builder.primary_key_index(), [1]);
        assert_eq!(builder.non_primary_key_columns(), ["name", "age"]);

        let upsert = builder.build_upsert(&person("1001", "Tom")).unwrap();
        assert!(upsert
            .sql
            .ends_with("ON CONFLICT (id) DO UPDATE SET name = excluded.name, age = excluded.age"));
    }

    #[test]
    fn test_column_override_rejects_missing_key() {
        let err = UpsertBuilder::<Person>::with_options(
            UpsertOptions::new().columns(&["person_id", "full_name", "years"]),
        )
        .unwrap_err();
        assert_eq!(
            err,
            ConfigError::UnknownPrimaryKey {
                table: String::from("person"),
                column: String::from("id"),
            }
        );

        let err = UpsertBuilder::<Person>::with_options(
            UpsertOptions::new()
                .columns(&["person_id", "full_name", "years"])
                .primary_keys(&["person_id"]),
        )
        .unwrap_err();
        assert!(matches!(err, ConfigError::UnknownColumn { ref column, .. } if column == "name"));
    }

    #[test]
    fn test_primary_key_override_resyncs_index() {
        let builder = UpsertBuilder::<Person>::with_options(
            UpsertOptions::new()
                .primary_keys(&["name"])
                .non_primary_keys(&["age"]),
        )
        .unwrap();
        assert_eq!(builder.primary_key_index(), [1]);

        let rows = vec![person("1", "Tom"), person("2", "Tom")];
        assert!(matches!(
            builder.build_upsert(&rows),
            Err(UpsertError::DuplicateKey { .. })
        ));
    }

    #[test]
    fn test_inconsistent_configuration_rejected() {
        let err =
            UpsertBuilder::<Person>::with_options(UpsertOptions::new().columns(&["id", "name"]))
                .unwrap_err();
        assert_eq!(
            err,
            ConfigError::ColumnCountMismatch {
                table: String::from("person"),
                columns: 2,
                fields: 3,
            }
        );

        let err =
            UpsertBuilder::<Person>::with_options(UpsertOptions::new().primary_keys(&["uuid"]))
                .unwrap_err();
        assert!(matches!(
            err,
            ConfigError::UnknownPrimaryKey { ref column, .. } if column == "uuid"
        ));

        let err = UpsertBuilder::<Person>::with_options(
            UpsertOptions::new().non_primary_keys(&["email"]),
        )
        .unwrap_err();
        assert!(matches!(err, ConfigError::UnknownColumn { ref column, .. } if column == "email"));
    }

    #[test]
    fn test_builder_is_shareable() {
        fn assert_send_sync<T: Send + Sync>() {}
        assert_send_sync::<UpsertBuilder<Person>>();
    }
}
