//! Insert and sequence statements shared by both destination backends.

use crate::{literal, Table};

/// A column value on its way to PostgreSQL.
#[derive(Debug, Clone, PartialEq)]
pub enum SqlValue {
    Null,
    Int(i64),
    Text(String),
    Json(serde_json::Value),
}

impl From<Option<String>> for SqlValue {
    fn from(value: Option<String>) -> Self {
        value.map_or(Self::Null, Self::Text)
    }
}

impl From<String> for SqlValue {
    fn from(value: String) -> Self {
        Self::Text(value)
    }
}

impl From<&str> for SqlValue {
    fn from(value: &str) -> Self {
        Self::Text(value.to_owned())
    }
}

impl From<i64> for SqlValue {
    fn from(value: i64) -> Self {
        Self::Int(value)
    }
}

/// How a column is written. Decides casting and, for the textual backend,
/// whether the value is inlined into the template.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ColumnKind {
    /// Integer primary or foreign key.
    Key,
    /// Any other integer column.
    Integer,
    Text,
    Json,
    Timestamp,
}

impl ColumnKind {
    const fn is_inlined(self) -> bool {
        matches!(self, Self::Key | Self::Integer)
    }

    /// Wrap a value expression in the cast this column needs.
    fn cast(self, expr: &str) -> String {
        match self {
            Self::Json => format!("CAST({expr} AS JSONB)"),
            Self::Timestamp => format!("CAST({expr} AS TIMESTAMP)"),
            Self::Key | Self::Integer | Self::Text => expr.to_owned(),
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct Column {
    pub name: &'static str,
    pub kind: ColumnKind,
    pub value: SqlValue,
}

impl Column {
    pub fn new(name: &'static str, kind: ColumnKind, value: impl Into<SqlValue>) -> Self {
        Self { name, kind, value: value.into() }
    }
}

/// `INSERT … ON CONFLICT (id) DO NOTHING` for one row.
#[derive(Debug, Clone, PartialEq)]
pub struct InsertStatement {
    table: Table,
    columns: Vec<Column>,
}

impl InsertStatement {
    #[must_use]
    pub const fn new(table: Table, columns: Vec<Column>) -> Self {
        Self { table, columns }
    }

    #[must_use]
    pub const fn table(&self) -> Table {
        self.table
    }

    #[must_use]
    pub fn columns(&self) -> &[Column] {
        &self.columns
    }

    fn render<'a>(&'a self, mut expr: impl FnMut(&'a Column) -> String) -> String {
        let names: Vec<&str> = self.columns.iter().map(|c| c.name).collect();
        let exprs: Vec<String> = self.columns.iter().map(|c| c.kind.cast(&expr(c))).collect();
        format!(
            "INSERT INTO {} ({}) VALUES ({}) ON CONFLICT (id) DO NOTHING",
            self.table,
            names.join(", "),
            exprs.join(", ")
        )
    }

    /// Every column as a bind parameter, in column order. Columns come back
    /// whole so a `NULL` can be bound with the type its column expects.
    #[must_use]
    pub fn parameterized(&self) -> (String, Vec<&Column>) {
        let mut n = 0usize;
        let sql = self.render(|_| {
            n += 1;
            format!("${n}")
        });
        (sql, self.columns.iter().collect())
    }

    /// Keys and integers inlined, remaining columns as `$n` markers with the
    /// values they stand for.
    #[must_use]
    pub fn templated(&self) -> (String, Vec<SqlValue>) {
        let mut values = Vec::new();
        let sql = self.render(|c| {
            if c.kind.is_inlined() {
                literal::render(&c.value)
            } else {
                values.push(c.value.clone());
                format!("${}", values.len())
            }
        });
        (sql, values)
    }
}

/// Move `table`'s id sequence to at least `max_id` and never below the ids
/// already present in the destination. `$1` is the max id.
#[must_use]
pub fn sequence_fix_template(table: Table) -> String {
    format!(
        "SELECT setval(pg_get_serial_sequence('{table}', 'id'), \
         GREATEST($1, (SELECT COALESCE(MAX(id), 0) FROM {table})))"
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn character_insert() -> InsertStatement {
        InsertStatement::new(
            Table::Characters,
            vec![
                Column::new("id", ColumnKind::Key, 4_i64),
                Column::new("user_id", ColumnKind::Key, 1_i64),
                Column::new("name", ColumnKind::Text, "Aria"),
                Column::new("data", ColumnKind::Json, SqlValue::Json(json!({"hp": 10}))),
                Column::new("updated_at", ColumnKind::Timestamp, Some("2024-05-01 10:00:00".to_owned())),
            ],
        )
    }

    #[test]
    fn parameterized_binds_every_column() {
        let stmt = character_insert();
        let (sql, params) = stmt.parameterized();
        assert_eq!(
            sql,
            "INSERT INTO characters (id, user_id, name, data, updated_at) \
             VALUES ($1, $2, $3, CAST($4 AS JSONB), CAST($5 AS TIMESTAMP)) \
             ON CONFLICT (id) DO NOTHING"
        );
        assert_eq!(params.len(), 5);
        assert_eq!(params[0].value, SqlValue::Int(4));
        assert_eq!(params[3].kind, ColumnKind::Json);
    }

    #[test]
    fn templated_inlines_keys() {
        let (sql, values) = character_insert().templated();
        assert_eq!(
            sql,
            "INSERT INTO characters (id, user_id, name, data, updated_at) \
             VALUES (4, 1, $1, CAST($2 AS JSONB), CAST($3 AS TIMESTAMP)) \
             ON CONFLICT (id) DO NOTHING"
        );
        assert_eq!(values.len(), 3);
        assert_eq!(values[0], SqlValue::Text("Aria".into()));
    }

    #[test]
    fn literal_sql_is_fully_rendered() {
        let (template, values) = character_insert().templated();
        let sql = literal::fill_template(&template, &values);
        assert!(sql.contains(r#"VALUES (4, 1, 'Aria', CAST('{"hp":10}' AS JSONB), CAST('2024-05-01 10:00:00' AS TIMESTAMP))"#));
        assert!(!sql.contains('$'));
    }

    #[test]
    fn missing_timestamp_becomes_null() {
        let stmt = InsertStatement::new(
            Table::Users,
            vec![
                Column::new("id", ColumnKind::Key, 1_i64),
                Column::new("created_at", ColumnKind::Timestamp, None::<String>),
            ],
        );
        let (template, values) = stmt.templated();
        assert!(literal::fill_template(&template, &values).contains("CAST(NULL AS TIMESTAMP)"));
    }

    #[test]
    fn sequence_fix_never_moves_below_existing_ids() {
        assert_eq!(
            literal::fill_template(&sequence_fix_template(Table::Users), &[SqlValue::Int(7)]),
            "SELECT setval(pg_get_serial_sequence('users', 'id'), \
             GREATEST(7, (SELECT COALESCE(MAX(id), 0) FROM users)))"
        );
    }
}
