use std::collections::HashMap;

use crate::process::utils::clean_str;
use crate::schema::ColumnType;

/// Rows read for type inference unless told otherwise.
pub const DEFAULT_SAMPLE_ROWS: usize = 1_000;

/// Longest value a bounded text column is sized for.
pub const DEFAULT_TEXT_LIMIT: usize = 255;

/// Cells that read as missing, after trimming. Mirrors the usual
/// spreadsheet/dataframe export spellings.
pub const DEFAULT_NULL_MARKERS: &[&str] = &["", "NA", "N/A", "NULL", "null", "NaN", "nan", "#N/A"];

pub const DEFAULT_PG_PORT: u16 = 5432;

/// Tunables for one import call.
#[derive(Debug, Clone)]
pub struct ImportOptions {
    pub sample_rows: usize,
    pub text_limit: usize,
    pub null_markers: Vec<String>,
    pub delimiter: u8,
    /// Column name → type, bypassing inference for that column.
    pub overrides: HashMap<String, ColumnType>,
}

impl Default for ImportOptions {
    fn default() -> Self {
        Self {
            sample_rows: DEFAULT_SAMPLE_ROWS,
            text_limit: DEFAULT_TEXT_LIMIT,
            null_markers: DEFAULT_NULL_MARKERS.iter().map(|s| s.to_string()).collect(),
            delimiter: b',',
            overrides: HashMap::new(),
        }
    }
}

impl ImportOptions {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_sample_rows(mut self, rows: usize) -> Self {
        self.sample_rows = rows;
        self
    }

    /// Bounded text needs room for at least one character; 0 is raised to 1.
    pub fn with_text_limit(mut self, limit: usize) -> Self {
        self.text_limit = limit.max(1);
        self
    }

    pub fn with_null_markers<I, S>(mut self, markers: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.null_markers = markers.into_iter().map(Into::into).collect();
        self
    }

    pub fn with_delimiter(mut self, delimiter: u8) -> Self {
        self.delimiter = delimiter;
        self
    }

    pub fn with_override(mut self, column: impl Into<String>, ty: ColumnType) -> Self {
        self.overrides.insert(column.into(), ty);
        self
    }

    /// Empty cells are always missing, whatever the marker list says.
    pub fn is_missing(&self, raw: &str) -> bool {
        let v = clean_str(raw);
        v.is_empty() || self.null_markers.iter().any(|m| m == v)
    }
}

/// Where the network database lives.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ConnectOptions {
    pub host: String,
    pub port: u16,
    pub user: String,
    pub password: String,
    pub database: String,
}

impl ConnectOptions {
    /// `host` may carry a port as `host:port`; otherwise 5432 is used.
    pub fn new(host: &str, user: &str, password: &str, database: &str) -> Self {
        let (host, port) = match host.rsplit_once(':') {
            Some((h, p)) if !h.is_empty() => match p.parse::<u16>() {
                Ok(port) => (h, port),
                Err(_) => (host, DEFAULT_PG_PORT),
            },
            _ => (host, DEFAULT_PG_PORT),
        };
        Self {
            host: host.to_string(),
            port,
            user: user.to_string(),
            password: password.to_string(),
            database: database.to_string(),
        }
    }
}
