use chrono::NaiveDate;
use csv::StringRecord;
use tracing::warn;

use crate::config::ImportOptions;
use crate::process::{date_parser, utils};
use crate::schema::{ColumnType, TableSchema};

/// One value ready to be bound into an insert.
#[derive(Debug, Clone, PartialEq)]
pub enum Cell {
    Null,
    Integer(i64),
    Float(f64),
    Date(NaiveDate),
    Text(String),
}

impl Cell {
    pub fn is_null(&self) -> bool {
        matches!(self, Cell::Null)
    }
}

/// Convert a raw cell to `ty`.
///
/// Missing markers become `Some(Cell::Null)`. `None` means the value is present
/// but does not fit the column type; the caller decides what to do with it.
pub fn convert_cell(raw: &str, ty: ColumnType, options: &ImportOptions) -> Option<Cell> {
    if options.is_missing(raw) {
        return Some(Cell::Null);
    }
    match ty {
        ColumnType::Integer => utils::try_parse_int(raw).map(Cell::Integer),
        ColumnType::Float => utils::try_parse_float(raw).map(Cell::Float),
        ColumnType::Date => date_parser::try_parse_date(utils::clean_str(raw)).map(Cell::Date),
        ColumnType::Text { .. } => Some(Cell::Text(raw.to_string())),
    }
}

/// Convert a full record in schema order.
///
/// Cells that don't fit their column are nulled with a warning; short records
/// are padded with NULL and cells past the last column are dropped. Returns the
/// cells and how many were nulled for not fitting.
pub fn convert_row(
    record: &StringRecord,
    schema: &TableSchema,
    options: &ImportOptions,
    row: usize,
) -> (Vec<Cell>, usize) {
    if record.len() > schema.len() {
        warn!(
            row,
            cells = record.len(),
            columns = schema.len(),
            "row has more cells than columns, extra cells ignored"
        );
    }

    let mut nulled = 0;
    let cells = schema
        .columns
        .iter()
        .enumerate()
        .map(|(idx, col)| {
            let raw = record.get(idx).unwrap_or("");
            match convert_cell(raw, col.ty, options) {
                Some(cell) => cell,
                None => {
                    warn!(
                        row,
                        column = %col.name,
                        expected = %col.ty,
                        value = raw,
                        "cell does not convert, storing NULL"
                    );
                    nulled += 1;
                    Cell::Null
                }
            }
        })
        .collect();

    (cells, nulled)
}
