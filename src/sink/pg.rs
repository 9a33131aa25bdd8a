use bytes::BytesMut;
use postgres::types::{to_sql_checked, IsNull, ToSql, Type};
use postgres::{Client, Config, NoTls};
use std::error::Error;
use tracing::info;

use super::Sink;
use crate::config::ConnectOptions;
use crate::process::convert::Cell;
use crate::schema::{ddl, TableName};

/// Open a blocking PostgreSQL connection.
pub fn connect(opts: &ConnectOptions) -> Result<Client, postgres::Error> {
    let client = Config::new()
        .host(&opts.host)
        .port(opts.port)
        .user(&opts.user)
        .password(&opts.password)
        .dbname(&opts.database)
        .connect(NoTls)?;
    info!(host = %opts.host, port = opts.port, database = %opts.database, "connected");
    Ok(client)
}

impl Sink for Client {
    type Error = postgres::Error;

    fn table_exists(&mut self, table: &TableName) -> Result<bool, Self::Error> {
        let sql = ddl::table_exists_sql(table);
        let row = match table.schema() {
            Some(schema) => self.query_one(sql, &[&table.name(), &schema])?,
            None => self.query_one(sql, &[&table.name()])?,
        };
        Ok(row.get::<_, i64>(0) > 0)
    }

    fn run_ddl(&mut self, sql: &str) -> Result<(), Self::Error> {
        self.batch_execute(sql)
    }

    fn insert_row(&mut self, sql: &str, row: &[Cell]) -> Result<(), Self::Error> {
        let params: Vec<&(dyn ToSql + Sync)> =
            row.iter().map(|c| c as &(dyn ToSql + Sync)).collect();
        self.execute(sql, &params)?;
        Ok(())
    }

    fn release(self) -> Result<(), Self::Error> {
        Client::close(self)
    }
}

/// Each variant binds through the matching native type, so a column whose
/// existing type disagrees fails that row rather than writing garbage.
impl ToSql for Cell {
    fn to_sql(&self, ty: &Type, out: &mut BytesMut) -> Result<IsNull, Box<dyn Error + Sync + Send>> {
        match self {
            Cell::Null => Ok(IsNull::Yes),
            Cell::Integer(v) => v.to_sql_checked(ty, out),
            Cell::Float(v) => v.to_sql_checked(ty, out),
            Cell::Date(v) => v.to_sql_checked(ty, out),
            Cell::Text(v) => v.to_sql_checked(ty, out),
        }
    }

    fn accepts(_: &Type) -> bool {
        true
    }

    to_sql_checked!();
}
