//! Statement text assembly.

/// The pieces of an upsert statement.
#[derive(Debug, Clone, Copy)]
pub struct UpsertStatement<'a> {
    /// Target table.
    pub table: &'a str,
    /// Insert column list.
    pub columns: &'a [String],
    /// Rendered placeholder groups, one per row.
    pub rows: &'a [String],
    /// Conflict target.
    pub primary_key_columns: &'a [String],
    /// Columns copied from `excluded` on conflict.
    pub non_primary_key_columns: &'a [String],
}

impl UpsertStatement<'_> {
    /// Renders the statement.
    ///
    /// ```text
    /// INSERT INTO person (id, name) VALUES (?, ?), (?, ?)
    /// ON CONFLICT (id) DO UPDATE SET name = excluded.name
    /// ```
    ///
    /// Assignments are joined by a bare `,`, each carrying its own leading
    /// space. An empty row list renders as `VALUES ()`.
    #[must_use]
    pub fn to_sql(&self) -> String {
        let mut sql = String::from("INSERT INTO ");
        sql.push_str(self.table);

        sql.push_str(" (");
        sql.push_str(&self.columns.join(", "));
        sql.push(')');

        sql.push_str(" VALUES ");
        if self.rows.is_empty() {
            sql.push_str("()");
        } else {
            sql.push_str(&self.rows.join(", "));
        }

        sql.push_str("\nON CONFLICT (");
        sql.push_str(&self.primary_key_columns.join(", "));
        sql.push_str(") DO UPDATE SET");

        let updates: Vec<String> = self
            .non_primary_key_columns
            .iter()
            .map(|col| format!(" {col} = excluded.{col}"))
            .collect();
        sql.push_str(&updates.join(","));

        sql
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn strings(items: &[&str]) -> Vec<String> {
        items.iter().map(|s| String::from(*s)).collect()
    }

    #[test]
    fn test_multi_row_statement() {
        let columns = strings(&["id", "name", "age"]);
        let rows = strings(&["(?, ?, ?)", "(?, ?, ?)"]);
        let pk = strings(&["id"]);
        let non_pk = strings(&["name", "age"]);
        let sql = UpsertStatement {
            table: "person",
            columns: &columns,
            rows: &rows,
            primary_key_columns: &pk,
            non_primary_key_columns: &non_pk,
        }
        .to_sql();
        assert_eq!(
            sql,
            "INSERT INTO person (id, name, age) VALUES (?, ?, ?), (?, ?, ?)\n\
             ON CONFLICT (id) DO UPDATE SET name = excluded.name, age = excluded.age"
        );
    }

    #[test]
    fn test_composite_key() {
        let columns = strings(&["user_id", "role_id", "granted_at"]);
        let rows = strings(&["(?, ?, ?)"]);
        let pk = strings(&["user_id", "role_id"]);
        let non_pk = strings(&["granted_at"]);
        let sql = UpsertStatement {
            table: "user_roles",
            columns: &columns,
            rows: &rows,
            primary_key_columns: &pk,
            non_primary_key_columns: &non_pk,
        }
        .to_sql();
        assert!(sql.ends_with(
            "\nON CONFLICT (user_id, role_id) DO UPDATE SET granted_at = excluded.granted_at"
        ));
    }

    #[test]
    fn test_no_update_columns() {
        let columns = strings(&["id"]);
        let rows = strings(&["(?)"]);
        let pk = strings(&["id"]);
        let sql = UpsertStatement {
            table: "tags",
            columns: &columns,
            rows: &rows,
            primary_key_columns: &pk,
            non_primary_key_columns: &[],
        }
        .to_sql();
        assert_eq!(sql, "INSERT INTO tags (id) VALUES (?)\nON CONFLICT (id) DO UPDATE SET");
    }

    #[test]
    fn test_empty_rows() {
        let columns = strings(&["id", "name"]);
        let pk = strings(&["id"]);
        let non_pk = strings(&["name"]);
        let sql = UpsertStatement {
            table: "person",
            columns: &columns,
            rows: &[],
            primary_key_columns: &pk,
            non_primary_key_columns: &non_pk,
        }
        .to_sql();
        assert!(sql.starts_with("INSERT INTO person (id, name) VALUES ()\n"));
    }
}
