// src/schema/ddl.rs

use std::fmt;

use super::{ColumnType, TableSchema};
use crate::process::utils::quote_ident;

/// Target table, optionally schema-qualified as `schema.table`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TableName {
    schema: Option<String>,
    name: String,
}

impl TableName {
    pub fn parse(raw: &str) -> Result<Self, String> {
        let raw = raw.trim();
        let (schema, name) = match raw.split_once('.') {
            Some((s, n)) => (Some(s.trim().to_string()), n.trim().to_string()),
            None => (None, raw.to_string()),
        };
        if name.is_empty()
            || name.contains('.')
            || schema.as_deref().is_some_and(str::is_empty)
        {
            return Err(format!("invalid table name `{}`", raw));
        }
        Ok(Self { schema, name })
    }

    pub fn schema(&self) -> Option<&str> {
        self.schema.as_deref()
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    /// Quoted form for use in statements.
    pub fn quoted(&self) -> String {
        match &self.schema {
            Some(s) => format!("{}.{}", quote_ident(s), quote_ident(&self.name)),
            None => quote_ident(&self.name),
        }
    }
}

impl fmt::Display for TableName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.schema {
            Some(s) => write!(f, "{}.{}", s, self.name),
            None => f.write_str(&self.name),
        }
    }
}

/// Existence check against `information_schema`. Parameters are the table name
/// and, when qualified, the schema name.
pub fn table_exists_sql(table: &TableName) -> &'static str {
    match table.schema() {
        Some(_) => {
            "SELECT COUNT(*) FROM information_schema.tables \
             WHERE table_name = $1::text AND table_schema = $2::text"
        }
        None => {
            "SELECT COUNT(*) FROM information_schema.tables \
             WHERE table_name = $1::text AND table_schema = current_schema()"
        }
    }
}

/// `CREATE TABLE IF NOT EXISTS` in schema order, with backend type names from
/// `type_name`.
pub fn create_table_sql<F>(table: &TableName, schema: &TableSchema, type_name: F) -> String
where
    F: Fn(ColumnType) -> String,
{
    let cols: Vec<String> = schema
        .columns
        .iter()
        .map(|c| format!("{} {}", quote_ident(&c.name), type_name(c.ty)))
        .collect();
    format!(
        "CREATE TABLE IF NOT EXISTS {} ({});",
        table.quoted(),
        cols.join(", ")
    )
}

/// Parameterized insert covering every schema column, in schema order.
pub fn insert_sql(table: &TableName, schema: &TableSchema) -> String {
    let cols: Vec<String> = schema.names().map(quote_ident).collect();
    let placeholders: Vec<String> = (1..=schema.len()).map(|i| format!("${}", i)).collect();
    format!(
        "INSERT INTO {} ({}) VALUES ({});",
        table.quoted(),
        cols.join(", "),
        placeholders.join(", ")
    )
}
