//! Rendering of [`Statement`]s into parameterized SQL.
//!
//! Identifiers in the generated text come only from the static schema; every
//! caller-provided value is returned separately as a positional parameter.

use crate::backend::{Filter, Statement, Value};

/// SQL text plus its positional parameters.
#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) struct Rendered {
    pub sql: String,
    pub params: Vec<Value>,
}

impl Rendered {
    fn new() -> Self {
        Self {
            sql: String::new(),
            params: Vec::new(),
        }
    }

    /// Append a parameter and return its placeholder.
    fn param(&mut self, value: Value) -> String {
        self.params.push(value);
        format!("${}", self.params.len())
    }

    fn push_filter(&mut self, filter: &Filter) {
        match filter {
            Filter::All => {}
            Filter::Id(id) => {
                let p = self.param(Value::from(*id));
                self.sql.push_str(&format!(" WHERE id = {p}"));
            }
            Filter::Eq(column, value) => {
                let p = self.param(value.clone());
                self.sql.push_str(&format!(" WHERE {column} = {p}"));
            }
        }
    }
}

/// Render a validated statement.
pub(crate) fn render(statement: &Statement) -> Rendered {
    let mut out = Rendered::new();
    match statement {
        Statement::Select {
            table,
            projection,
            filter,
        } => {
            let columns: Vec<&str> = Statement::selected_columns(*table, projection)
                .into_iter()
                .map(|c| c.name)
                .collect();
            out.sql = format!("SELECT {} FROM {}", columns.join(", "), table.name());
            out.push_filter(filter);
            out.sql.push_str(" ORDER BY id");
        }
        Statement::Insert { table, row } => {
            let mut names = Vec::new();
            let mut placeholders = Vec::new();
            for column in table.columns() {
                if let Some(value) = row.get(column.name) {
                    names.push(column.name);
                    placeholders.push(out.param(value.clone()));
                }
            }
            out.sql = format!(
                "INSERT INTO {} ({}) VALUES ({})",
                table.name(),
                names.join(", "),
                placeholders.join(", ")
            );
        }
        Statement::Update {
            table,
            id,
            column,
            value,
        } => {
            let set = out.param(value.clone());
            let key = out.param(Value::from(*id));
            out.sql = format!("UPDATE {} SET {column} = {set} WHERE id = {key}", table.name());
        }
        Statement::Delete { table, filter } => {
            out.sql = format!("DELETE FROM {}", table.name());
            out.push_filter(filter);
        }
    }
    out
}
