//! Per-record value extraction.

use crate::schema::Record;
use crate::value::SqlValue;

/// Extracts the field values of `record` in declaration order.
///
/// Absent optional fields arrive as [`SqlValue::Null`] through
/// [`ToSqlValue`](crate::value::ToSqlValue) for `Option<T>`.
#[must_use]
pub fn row_values<R: Record>(record: &R) -> Vec<SqlValue> {
    let args = record.values();
    debug_assert_eq!(
        args.len(),
        R::ANNOTATIONS.len(),
        "{} returned a row that does not match its annotations",
        R::TYPE_NAME
    );
    args
}

/// Renders a parenthesized group of `count` placeholders.
#[must_use]
pub fn placeholder_group(count: usize) -> String {
    let placeholders = vec![SqlValue::placeholder(); count];
    format!("({})", placeholders.join(", "))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::value::ToSqlValue;

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

    #[test]
    fn test_values_follow_declaration_order() {
        let row = row_values(&Person {
            id: String::from("1001"),
            name: String::from("Tom"),
            age: Some(4),
        });
        assert_eq!(
            row,
            vec![
                SqlValue::Text(String::from("1001")),
                SqlValue::Text(String::from("Tom")),
                SqlValue::Int(4),
            ]
        );
        assert_eq!(placeholder_group(row.len()), "(?, ?, ?)");
    }

    #[test]
    fn test_absent_optional_is_null() {
        let row = row_values(&Person {
            id: String::from("1001"),
            name: String::from("Tom"),
            age: None,
        });
        assert_eq!(row[2], SqlValue::Null);
    }

    #[test]
    fn test_empty_placeholder_group() {
        assert_eq!(placeholder_group(0), "()");
        assert_eq!(placeholder_group(1), "(?)");
    }
}
