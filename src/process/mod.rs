pub mod convert;
pub mod date_parser;
pub mod utils;

use csv::{ReaderBuilder, StringRecord, StringRecordsIntoIter};
use encoding_rs::{UTF_8, WINDOWS_1252};
use std::{collections::HashSet, fs, path::Path};
use tracing::{debug, warn};

use crate::error::ImportError;

/// A decoded source file plus its validated header row.
///
/// The whole text is held in memory; each call to [`Source::records`] starts a
/// fresh pass from the first data row.
pub struct Source {
    text: String,
    delimiter: u8,
    pub headers: Vec<String>,
}

impl Source {
    /// Read and decode `path`, then parse and validate its header row.
    pub fn open(path: &Path, delimiter: u8) -> Result<Self, ImportError> {
        let bytes = fs::read(path).map_err(|e| ImportError::file_read(path, e))?;
        let text = decode(path, &bytes);

        let mut rdr = ReaderBuilder::new()
            .delimiter(delimiter)
            .has_headers(true)
            .flexible(true)
            .from_reader(text.as_bytes());
        let header_record = rdr
            .headers()
            .map_err(|e| ImportError::file_read(path, e))?
            .clone();
        let headers =
            validate_headers(&header_record).map_err(|e| ImportError::file_read(path, e))?;
        debug!(path = %path.display(), columns = headers.len(), "opened source");

        Ok(Self {
            text,
            delimiter,
            headers,
        })
    }

    /// Iterate data rows from the top of the file.
    pub fn records(&self) -> StringRecordsIntoIter<&[u8]> {
        ReaderBuilder::new()
            .delimiter(self.delimiter)
            .has_headers(true)
            .flexible(true)
            .from_reader(self.text.as_bytes())
            .into_records()
    }

    /// Up to `limit` data rows; records the reader can't parse are skipped.
    pub fn sample(&self, limit: usize) -> Vec<StringRecord> {
        let mut rows = Vec::with_capacity(limit.min(1_024));
        for (idx, result) in self.records().take(limit).enumerate() {
            match result {
                Ok(record) => rows.push(record),
                Err(e) => warn!(row = idx + 1, error = %e, "skipping unreadable record in sample"),
            }
        }
        rows
    }
}

/// UTF-8 first (BOM stripped); anything else is read as Latin-1.
fn decode(path: &Path, bytes: &[u8]) -> String {
    let (text, _, malformed) = UTF_8.decode(bytes);
    if !malformed {
        return text.into_owned();
    }
    warn!(path = %path.display(), "source is not valid UTF-8, decoding as ISO-8859-1");
    let (text, _) = WINDOWS_1252.decode_without_bom_handling(bytes);
    text.into_owned()
}

fn validate_headers(record: &StringRecord) -> Result<Vec<String>, String> {
    if record.is_empty() {
        return Err("no header row".to_string());
    }

    let mut seen = HashSet::with_capacity(record.len());
    let mut headers = Vec::with_capacity(record.len());
    for (idx, raw) in record.iter().enumerate() {
        let name = raw.trim();
        if name.is_empty() {
            return Err(format!("header at index {} is empty", idx));
        }
        if !seen.insert(name.to_string()) {
            return Err(format!("duplicate header `{}`", name));
        }
        headers.push(name.to_string());
    }
    Ok(headers)
}
