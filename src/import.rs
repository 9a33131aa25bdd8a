use serde::Serialize;
use std::path::Path;
use std::time::Instant;
use tracing::{debug, info, warn};

use crate::config::{ConnectOptions, ImportOptions};
use crate::error::ImportError;
use crate::process::{convert::convert_row, Source};
use crate::schema::{ddl, derive_types, TableName, TableSchema};
use crate::sink::{self, Sink};

/// Outcome of one `import_file` call.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct ImportSummary {
    pub table: String,
    /// Whether this call created the table.
    pub created: bool,
    pub inserted: u64,
    /// Rows the database rejected or the reader could not parse.
    pub skipped: u64,
    /// Cells stored as NULL because they did not fit their column type.
    pub nulled_cells: u64,
}

/// Owns one database connection for the length of an import session.
pub struct Importer<S: Sink> {
    sink: S,
    options: ImportOptions,
}

impl Importer<postgres::Client> {
    /// Connect to a PostgreSQL server. `host` may be given as `host:port`.
    pub fn open(host: &str, user: &str, password: &str, database: &str) -> Result<Self, ImportError> {
        Self::connect(&ConnectOptions::new(host, user, password, database))
    }

    pub fn connect(opts: &ConnectOptions) -> Result<Self, ImportError> {
        let client = sink::connect(opts).map_err(ImportError::connection)?;
        Ok(Self::with_sink(client))
    }
}

impl<S: Sink> Importer<S> {
    pub fn with_sink(sink: S) -> Self {
        Self {
            sink,
            options: ImportOptions::default(),
        }
    }

    pub fn with_options(mut self, options: ImportOptions) -> Self {
        self.options = options;
        self
    }

    pub fn options(&self) -> &ImportOptions {
        &self.options
    }

    pub fn sink(&self) -> &S {
        &self.sink
    }

    pub fn sink_mut(&mut self) -> &mut S {
        &mut self.sink
    }

    /// Infer → create if absent → load every row → report.
    pub fn import_file(
        &mut self,
        table_name: &str,
        file_path: impl AsRef<Path>,
    ) -> Result<ImportSummary, ImportError> {
        let path = file_path.as_ref();
        let start = Instant::now();
        let table = TableName::parse(table_name)
            .map_err(|e| ImportError::schema_creation(table_name, e))?;

        let schema = infer_schema(path, &self.options)?;
        let created = self.ensure_table(&table, &schema)?;
        let mut summary = self.load_rows(&table, path, &schema)?;
        summary.created = created;

        info!(
            table = %table,
            inserted = summary.inserted,
            skipped = summary.skipped,
            nulled_cells = summary.nulled_cells,
            elapsed = ?start.elapsed(),
            "import finished"
        );
        Ok(summary)
    }

    /// Create `table` from `schema` unless it already exists. Returns whether
    /// it was created. An existing table is used as is.
    pub fn ensure_table(
        &mut self,
        table: &TableName,
        schema: &TableSchema,
    ) -> Result<bool, ImportError> {
        let fail = |e: S::Error| ImportError::schema_creation(&table.to_string(), e);

        if self.sink.table_exists(table).map_err(fail)? {
            info!(table = %table, "table already exists");
            return Ok(false);
        }

        let text_limit = self.options.text_limit;
        let sql = ddl::create_table_sql(table, schema, |ty| self.sink.column_type(ty, text_limit));
        debug!(sql = %sql, "creating table");
        self.sink.run_ddl(&sql).map_err(fail)?;
        info!(table = %table, columns = schema.len(), "table created");
        Ok(true)
    }

    /// Second pass: convert and insert every data row in file order.
    pub fn load_rows(
        &mut self,
        table: &TableName,
        path: &Path,
        schema: &TableSchema,
    ) -> Result<ImportSummary, ImportError> {
        let source = Source::open(path, self.options.delimiter)?;
        if !source.headers.iter().map(String::as_str).eq(schema.names()) {
            return Err(ImportError::file_read(
                path,
                "header row does not match the inferred schema",
            ));
        }

        let sql = ddl::insert_sql(table, schema);
        let mut summary = ImportSummary {
            table: table.to_string(),
            ..Default::default()
        };

        for (idx, result) in source.records().enumerate() {
            let row = idx + 1;
            let record = match result {
                Ok(r) => r,
                Err(e) => {
                    warn!(table = %table, row, error = %e, "unreadable record, skipping row");
                    summary.skipped += 1;
                    continue;
                }
            };

            let (cells, nulled) = convert_row(&record, schema, &self.options, row);
            summary.nulled_cells += nulled as u64;

            match self.sink.insert_row(&sql, &cells) {
                Ok(()) => summary.inserted += 1,
                Err(e) => {
                    warn!(table = %table, row, error = %e, "insert rejected, skipping row");
                    summary.skipped += 1;
                }
            }
        }

        Ok(summary)
    }

    /// Release the connection.
    pub fn close(self) -> Result<(), ImportError> {
        self.sink.release().map_err(ImportError::connection)
    }
}

/// First pass: derive column types from the leading `options.sample_rows` rows.
pub fn infer_schema(path: &Path, options: &ImportOptions) -> Result<TableSchema, ImportError> {
    let source = Source::open(path, options.delimiter)?;
    let sample = source.sample(options.sample_rows);
    debug!(path = %path.display(), rows = sample.len(), "sampled rows for inference");
    Ok(derive_types(&source.headers, &sample, options))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::duck::open_mem_db;
    use crate::schema::ColumnType;
    use anyhow::Result;
    use chrono::NaiveDate;
    use duckdb::{params, Connection};
    use std::io::Write;
    use std::sync::{Arc, Mutex};
    use tempfile::NamedTempFile;
    use tracing_subscriber::{EnvFilter, FmtSubscriber};

    fn init_test_logging() {
        let subscriber = FmtSubscriber::builder()
            .with_env_filter(
                EnvFilter::try_from_default_env()
                    .unwrap_or_else(|_| EnvFilter::new("info,csvload=debug")),
            )
            .with_test_writer()
            .finish();
        let _ = tracing::subscriber::set_global_default(subscriber);
    }

    fn write_csv(content: &str) -> Result<NamedTempFile> {
        let mut f = NamedTempFile::new()?;
        f.write_all(content.as_bytes())?;
        f.flush()?;
        Ok(f)
    }

    fn importer() -> Result<Importer<Connection>> {
        init_test_logging();
        Ok(Importer::with_sink(open_mem_db()?))
    }

    fn column_types(conn: &Connection, table: &str) -> Result<Vec<(String, String)>> {
        let mut stmt = conn.prepare(
            "SELECT column_name, data_type FROM information_schema.columns \
             WHERE table_name = $1 ORDER BY ordinal_position",
        )?;
        let rows = stmt
            .query_map(params![table], |r| Ok((r.get(0)?, r.get(1)?)))?
            .collect::<Result<Vec<(String, String)>, _>>()?;
        Ok(rows)
    }

    fn count(conn: &Connection, sql: &str) -> Result<i64> {
        Ok(conn.query_row(sql, [], |r| r.get(0))?)
    }

    fn pairs(cols: &[(&str, &str)]) -> Vec<(String, String)> {
        cols.iter()
            .map(|(n, t)| (n.to_string(), t.to_string()))
            .collect()
    }

    const PEOPLE: &str = "id,name,joined\n1,Alice,2020-01-01\n2,Bob,not-a-date\n";

    #[test]
    fn bad_date_is_nulled_and_row_kept() -> Result<()> {
        let csv = write_csv(PEOPLE)?;
        let mut imp = importer()?
            .with_options(ImportOptions::default().with_override("joined", ColumnType::Date));

        let summary = imp.import_file("people", csv.path())?;
        assert_eq!(
            summary,
            ImportSummary {
                table: "people".into(),
                created: true,
                inserted: 2,
                skipped: 0,
                nulled_cells: 1,
            }
        );

        let conn = imp.sink();
        assert_eq!(
            column_types(conn, "people")?,
            pairs(&[("id", "BIGINT"), ("name", "VARCHAR"), ("joined", "DATE")])
        );
        let alice: Option<NaiveDate> =
            conn.query_row("SELECT joined FROM people WHERE id = 1", [], |r| r.get(0))?;
        assert_eq!(alice, NaiveDate::from_ymd_opt(2020, 1, 1));
        let bob: Option<NaiveDate> =
            conn.query_row("SELECT joined FROM people WHERE id = 2", [], |r| r.get(0))?;
        assert_eq!(bob, None);
        Ok(())
    }

    #[derive(Clone, Default)]
    struct Captured(Arc<Mutex<Vec<u8>>>);

    impl Write for Captured {
        fn write(&mut self, buf: &[u8]) -> std::io::Result<usize> {
            self.0.lock().unwrap().extend_from_slice(buf);
            Ok(buf.len())
        }

        fn flush(&mut self) -> std::io::Result<()> {
            Ok(())
        }
    }

    #[test]
    fn nulled_cell_logs_a_warning() -> Result<()> {
        let csv = write_csv(PEOPLE)?;
        let mut imp = importer()?
            .with_options(ImportOptions::default().with_override("joined", ColumnType::Date));

        let out = Captured::default();
        let writer = out.clone();
        let subscriber = FmtSubscriber::builder()
            .with_max_level(tracing::Level::WARN)
            .with_ansi(false)
            .with_writer(move || writer.clone())
            .finish();
        let summary = tracing::subscriber::with_default(subscriber, || {
            imp.import_file("people", csv.path())
        })?;
        assert_eq!(summary.nulled_cells, 1);

        let logged = String::from_utf8(out.0.lock().unwrap().clone())?;
        let warnings: Vec<&str> = logged
            .lines()
            .filter(|l| l.contains("cell does not convert"))
            .collect();
        assert_eq!(warnings.len(), 1, "{}", logged);
        assert!(warnings[0].contains("WARN"));
        assert!(warnings[0].contains("column=joined"));
        assert!(warnings[0].contains("not-a-date"));
        Ok(())
    }

    #[test]
    fn quoted_quotes_are_kept_as_text() -> Result<()> {
        let csv = write_csv("code,note\n\"\"\"007\"\"\",\"\"\"NA\"\"\"\n")?;
        let mut imp = importer()?;
        let summary = imp.import_file("codes", csv.path())?;
        assert_eq!(summary.inserted, 1);
        assert_eq!(summary.nulled_cells, 0);

        let conn = imp.sink();
        assert_eq!(
            column_types(conn, "codes")?,
            pairs(&[("code", "VARCHAR"), ("note", "VARCHAR")])
        );
        let (code, note): (Option<String>, Option<String>) =
            conn.query_row("SELECT code, note FROM codes", [], |r| {
                Ok((r.get(0)?, r.get(1)?))
            })?;
        assert_eq!(code.as_deref(), Some("\"007\""));
        assert_eq!(note.as_deref(), Some("\"NA\""));
        Ok(())
    }

    #[test]
    fn junk_in_sample_makes_the_column_text() -> Result<()> {
        let csv = write_csv(PEOPLE)?;
        let mut imp = importer()?;
        let summary = imp.import_file("people", csv.path())?;
        assert_eq!(summary.inserted, 2);
        assert_eq!(summary.nulled_cells, 0);

        let conn = imp.sink();
        assert_eq!(
            column_types(conn, "people")?,
            pairs(&[("id", "BIGINT"), ("name", "VARCHAR"), ("joined", "VARCHAR")])
        );
        let bob: String =
            conn.query_row("SELECT joined FROM people WHERE id = 2", [], |r| r.get(0))?;
        assert_eq!(bob, "not-a-date");
        Ok(())
    }

    #[test]
    fn header_only_file_creates_text_table() -> Result<()> {
        let csv = write_csv("a,b\n")?;
        let mut imp = importer()?;
        let summary = imp.import_file("empty_one", csv.path())?;
        assert!(summary.created);
        assert_eq!(summary.inserted, 0);
        assert_eq!(summary.skipped, 0);
        assert_eq!(
            column_types(imp.sink(), "empty_one")?,
            pairs(&[("a", "VARCHAR"), ("b", "VARCHAR")])
        );
        Ok(())
    }

    #[test]
    fn missing_float_reads_back_null() -> Result<()> {
        let csv = write_csv("k,v\na,1.5\nb,\nc,NA\n")?;
        let mut imp = importer()?;
        imp.import_file("readings", csv.path())?;

        let conn = imp.sink();
        assert_eq!(
            column_types(conn, "readings")?,
            pairs(&[("k", "VARCHAR"), ("v", "DOUBLE")])
        );
        for k in ["b", "c"] {
            let v: Option<f64> = conn.query_row(
                "SELECT v FROM readings WHERE k = $1",
                params![k],
                |r| r.get(0),
            )?;
            assert_eq!(v, None);
        }
        let a: Option<f64> =
            conn.query_row("SELECT v FROM readings WHERE k = 'a'", [], |r| r.get(0))?;
        assert_eq!(a, Some(1.5));
        Ok(())
    }

    #[test]
    fn iso_and_long_form_dates_are_normalized() -> Result<()> {
        let csv = write_csv(
            "title,date_added\nA,2021-09-24\nB,\" September 25, 2021\"\nC,\n",
        )?;
        let mut imp = importer()?;
        let summary = imp.import_file("titles", csv.path())?;
        assert_eq!(summary.inserted, 3);

        let conn = imp.sink();
        let got: Vec<Option<String>> = conn
            .prepare("SELECT strftime(date_added, '%Y-%m-%d') FROM titles ORDER BY title")?
            .query_map([], |r| r.get(0))?
            .collect::<Result<_, _>>()?;
        assert_eq!(
            got,
            vec![Some("2021-09-24".to_string()), Some("2021-09-25".to_string()), None]
        );
        Ok(())
    }

    #[test]
    fn create_is_idempotent() -> Result<()> {
        let csv = write_csv(PEOPLE)?;
        let mut imp = importer()?;
        let table = TableName::parse("people").unwrap();
        let schema = infer_schema(csv.path(), imp.options())?;

        assert!(imp.ensure_table(&table, &schema)?);
        assert!(!imp.ensure_table(&table, &schema)?);
        assert_eq!(column_types(imp.sink(), "people")?.len(), 3);

        // importing again appends rows but leaves the table alone
        let first = imp.import_file("people", csv.path())?;
        let second = imp.import_file("people", csv.path())?;
        assert!(!first.created && !second.created);
        assert_eq!(count(imp.sink(), "SELECT COUNT(*) FROM people")?, 4);
        Ok(())
    }

    #[test]
    fn rejected_rows_are_skipped_and_counted() -> Result<()> {
        let csv = write_csv("id,name\n1,a\n,b\n3,c\n")?;
        let mut imp = importer()?;
        imp.sink_mut()
            .run_ddl("CREATE TABLE strict (id BIGINT NOT NULL, name VARCHAR);")?;

        let summary = imp.import_file("strict", csv.path())?;
        assert!(!summary.created);
        assert_eq!(summary.inserted, 2);
        assert_eq!(summary.skipped, 1);
        assert_eq!(count(imp.sink(), "SELECT COUNT(*) FROM strict")?, 2);
        Ok(())
    }

    #[test]
    fn values_past_the_sample_are_nulled() -> Result<()> {
        let csv = write_csv("n\n1\n2\nthree\n4\n")?;
        let mut imp = importer()?.with_options(ImportOptions::default().with_sample_rows(2));
        let summary = imp.import_file("nums", csv.path())?;
        assert_eq!(summary.inserted, 4);
        assert_eq!(summary.nulled_cells, 1);

        let conn = imp.sink();
        assert_eq!(column_types(conn, "nums")?, pairs(&[("n", "BIGINT")]));
        assert_eq!(count(conn, "SELECT COUNT(*) FROM nums WHERE n IS NULL")?, 1);
        assert_eq!(count(conn, "SELECT CAST(SUM(n) AS BIGINT) FROM nums")?, 7);
        Ok(())
    }

    #[test]
    fn rows_keep_file_order() -> Result<()> {
        let csv = write_csv("n,label\n3,c\n1,a\n2,b\n")?;
        let mut imp = importer()?;
        imp.import_file("ordered", csv.path())?;
        let labels: Vec<String> = imp
            .sink()
            .prepare("SELECT label FROM ordered")?
            .query_map([], |r| r.get(0))?
            .collect::<Result<_, _>>()?;
        assert_eq!(labels, vec!["c", "a", "b"]);
        Ok(())
    }

    #[test]
    fn missing_file_is_fatal_and_creates_nothing() -> Result<()> {
        let mut imp = importer()?;
        let err = imp
            .import_file("ghost", "/definitely/not/here.csv")
            .unwrap_err();
        assert!(matches!(err, ImportError::FileRead { .. }));
        assert!(!imp.sink_mut().table_exists(&TableName::parse("ghost").unwrap())?);
        Ok(())
    }

    #[test]
    fn bad_table_name_is_a_schema_error() -> Result<()> {
        let csv = write_csv(PEOPLE)?;
        let mut imp = importer()?;
        let err = imp.import_file("nope.", csv.path()).unwrap_err();
        assert!(matches!(err, ImportError::SchemaCreation { .. }));
        Ok(())
    }

    #[test]
    fn close_releases_the_connection() -> Result<()> {
        let imp = importer()?;
        imp.close()?;
        Ok(())
    }
}
