mod pg;

pub use pg::connect;

use crate::process::convert::Cell;
use crate::schema::{ColumnType, TableName};

/// Sink defines the write interface between the importer and a database.
/// All statements the importer issues go through here.
pub trait Sink {
    type Error: std::error::Error + Send + Sync + 'static;

    fn table_exists(&mut self, table: &TableName) -> Result<bool, Self::Error>;

    /// Run a DDL statement.
    fn run_ddl(&mut self, sql: &str) -> Result<(), Self::Error>;

    /// Insert one row; `row` is in the same order as the statement's columns.
    fn insert_row(&mut self, sql: &str, row: &[Cell]) -> Result<(), Self::Error>;

    /// Column type name used in `CREATE TABLE`.
    fn column_type(&self, ty: ColumnType, text_limit: usize) -> String {
        match ty {
            ColumnType::Integer => "BIGINT".into(),
            ColumnType::Float => "DOUBLE PRECISION".into(),
            ColumnType::Date => "DATE".into(),
            ColumnType::Text { long: false } => format!("VARCHAR({})", text_limit),
            ColumnType::Text { long: true } => "TEXT".into(),
        }
    }

    /// Release the connection.
    fn release(self) -> Result<(), Self::Error>
    where
        Self: Sized;
}
