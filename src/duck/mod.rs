use duckdb::types::{ToSqlOutput, Value};
use duckdb::{params, params_from_iter, Connection, ToSql};

use crate::process::convert::Cell;
use crate::schema::{ddl, ColumnType, TableName};
use crate::sink::Sink;

/// Open a DuckDB database on disk at `path`, creating the file if it doesn't exist.
pub fn open_disk_db(path: &str) -> duckdb::Result<Connection> {
    Connection::open(path)
}

/// Open a DuckDB in‐memory database
pub fn open_mem_db() -> duckdb::Result<Connection> {
    Connection::open_in_memory()
}

impl Sink for Connection {
    type Error = duckdb::Error;

    fn table_exists(&mut self, table: &TableName) -> Result<bool, Self::Error> {
        let sql = ddl::table_exists_sql(table);
        let count: i64 = match table.schema() {
            Some(schema) => self.query_row(sql, params![table.name(), schema], |r| r.get(0))?,
            None => self.query_row(sql, params![table.name()], |r| r.get(0))?,
        };
        Ok(count > 0)
    }

    fn run_ddl(&mut self, sql: &str) -> Result<(), Self::Error> {
        self.execute_batch(sql)
    }

    fn insert_row(&mut self, sql: &str, row: &[Cell]) -> Result<(), Self::Error> {
        let mut stmt = self.prepare_cached(sql)?;
        stmt.execute(params_from_iter(row.iter()))?;
        Ok(())
    }

    fn column_type(&self, ty: ColumnType, _text_limit: usize) -> String {
        match ty {
            ColumnType::Integer => "BIGINT".into(),
            ColumnType::Float => "DOUBLE".into(),
            ColumnType::Date => "DATE".into(),
            ColumnType::Text { .. } => "VARCHAR".into(),
        }
    }

    fn release(self) -> Result<(), Self::Error> {
        Connection::close(self).map_err(|(_, e)| e)
    }
}

impl ToSql for Cell {
    fn to_sql(&self) -> duckdb::Result<ToSqlOutput<'_>> {
        Ok(match self {
            Cell::Null => ToSqlOutput::Owned(Value::Null),
            Cell::Integer(v) => ToSqlOutput::from(*v),
            Cell::Float(v) => ToSqlOutput::from(*v),
            // ISO text; DuckDB casts it on insert into DATE columns
            Cell::Date(v) => ToSqlOutput::from(v.format("%Y-%m-%d").to_string()),
            Cell::Text(v) => ToSqlOutput::from(v.as_str()),
        })
    }
}
