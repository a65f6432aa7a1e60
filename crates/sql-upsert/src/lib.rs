//! # sql-upsert
//!
//! Derives parameterized `INSERT ... ON CONFLICT DO UPDATE` statements from
//! record types.
//!
//! A record registers its fields once, as annotation strings of the form
//! `column` or `column,primary`. An [`UpsertBuilder`] turns that registration
//! into a column layout, then builds one statement per call from a single
//! record or a batch:
//!
//! - every value is bound through a `?` placeholder, never inlined;
//! - absent `Option` fields are bound as NULL;
//! - rows repeating a primary key are rejected or dropped, depending on the
//!   configured [`DuplicatePolicy`].
//!
//! Executing the statement is left to the caller's database layer.
//!
//! ## Example
//!
//! ```rust
//! use sql_upsert::{Record, UpsertBuilder};
//!
//! #[derive(Clone, Record)]
//! struct Person {
//!     #[db("id,primary")]
//!     id: String,
//!     #[db("name")]
//!     name: String,
//!     #[db("age")]
//!     age: Option<i32>,
//! }
//!
//! let builder = UpsertBuilder::<Person>::new();
//! let (sql, args) = builder
//!     .build_upsert(&Person { id: "1001".into(), name: "Tom".into(), age: None })?
//!     .into_parts();
//!
//! assert_eq!(
//!     sql,
//!     "INSERT INTO person (id, name, age) VALUES (?, ?, ?)\n\
//!      ON CONFLICT (id) DO UPDATE SET name = excluded.name, age = excluded.age"
//! );
//! assert_eq!(args.len(), 3);
//! assert!(args[2].is_null());
//! # Ok::<(), sql_upsert::UpsertError>(())
//! ```

mod builder;
pub mod dedup;
mod error;
pub mod extract;
pub mod input;
mod options;
pub mod schema;
pub mod statement;
pub mod value;

pub use builder::{Upsert, UpsertBuilder};
pub use dedup::{KeySignature, SkipObserver, TracingSkipObserver};
pub use error::{ConfigError, Result, UpsertError};
pub use input::{Batch, IntoBatch};
pub use options::{DuplicatePolicy, EmptyBatchPolicy, UpsertOptions};
pub use schema::{PrimaryMarker, Record};
pub use sql_upsert_derive::Record;
pub use value::{SqlValue, ToSqlValue};
