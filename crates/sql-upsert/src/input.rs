//! Accepted input shapes for statement generation.

use crate::schema::Record;

/// The shape of an upsert input.
#[derive(Debug)]
pub enum Batch<'a, R> {
    /// No input at all.
    Absent,
    /// A collection reference holding no collection.
    NilCollection,
    /// A single record.
    One(&'a R),
    /// An ordered sequence of records.
    Many(&'a [R]),
    /// Anything else. `kind` names the rejected shape.
    Unsupported {
        /// Description of the rejected shape.
        kind: &'static str,
    },
}

/// Conversion of an input value into a [`Batch`].
///
/// Implement this for custom containers; report shapes that cannot be
/// upserted as [`Batch::Unsupported`].
pub trait IntoBatch<'a, R> {
    /// Classifies the input.
    fn into_batch(self) -> Batch<'a, R>;
}

impl<'a, R: Record> IntoBatch<'a, R> for Batch<'a, R> {
    fn into_batch(self) -> Batch<'a, R> {
        self
    }
}

impl<'a, R: Record> IntoBatch<'a, R> for &'a R {
    fn into_batch(self) -> Batch<'a, R> {
        Batch::One(self)
    }
}

impl<'a, R: Record> IntoBatch<'a, R> for &'a [R] {
    fn into_batch(self) -> Batch<'a, R> {
        Batch::Many(self)
    }
}

impl<'a, R: Record, const N: usize> IntoBatch<'a, R> for &'a [R; N] {
    fn into_batch(self) -> Batch<'a, R> {
        Batch::Many(self.as_slice())
    }
}

impl<'a, R: Record> IntoBatch<'a, R> for &'a Vec<R> {
    fn into_batch(self) -> Batch<'a, R> {
        Batch::Many(self.as_slice())
    }
}

impl<'a, R: Record> IntoBatch<'a, R> for Option<&'a R> {
    fn into_batch(self) -> Batch<'a, R> {
        self.map_or(Batch::Absent, Batch::One)
    }
}

impl<'a, R: Record> IntoBatch<'a, R> for Option<&'a [R]> {
    fn into_batch(self) -> Batch<'a, R> {
        self.map_or(Batch::NilCollection, Batch::Many)
    }
}

impl<'a, R: Record> IntoBatch<'a, R> for Option<&'a Vec<R>> {
    fn into_batch(self) -> Batch<'a, R> {
        self.map_or(Batch::NilCollection, |rows| Batch::Many(rows.as_slice()))
    }
}
