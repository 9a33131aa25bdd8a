use csv::StringRecord;
use tracing::debug;

use super::{Column, ColumnType, TableSchema};
use crate::config::ImportOptions;
use crate::process::{date_parser, utils};

/// Narrowest type seen so far for one column.
///
/// Joins only move up: `Integer → Float → Text`, with `Date` beside the
/// numeric chain and collapsing to `Text` when it meets a number.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Bound {
    Empty,
    Integer,
    Float,
    Date,
    Text,
}

impl Bound {
    fn of(value: &str) -> Self {
        if utils::try_parse_int(value).is_some() {
            Bound::Integer
        } else if utils::try_parse_float(value).is_some() {
            Bound::Float
        } else if date_parser::try_parse_date(utils::clean_str(value)).is_some() {
            Bound::Date
        } else {
            Bound::Text
        }
    }

    fn join(self, other: Bound) -> Bound {
        match (self, other) {
            (Bound::Empty, b) | (b, Bound::Empty) => b,
            (a, b) if a == b => a,
            (Bound::Integer, Bound::Float) | (Bound::Float, Bound::Integer) => Bound::Float,
            _ => Bound::Text,
        }
    }
}

/// For each column, fold over the sample:
///  - Ignore missing cells
///  - Join each value's own type into the running bound
///  - Once the bound is text, only keep measuring lengths
///  - No samples at all means text
///
/// Columns named in `options.overrides` skip inference entirely.
pub fn derive_types(
    headers: &[String],
    sample: &[StringRecord],
    options: &ImportOptions,
) -> TableSchema {
    let columns = headers
        .iter()
        .enumerate()
        .map(|(idx, name)| {
            if let Some(ty) = options.overrides.get(name) {
                debug!(column = %name, ty = %ty, "using type override");
                return Column {
                    name: name.clone(),
                    ty: *ty,
                };
            }

            let mut bound = Bound::Empty;
            let mut longest = 0usize;
            for row in sample {
                let raw = row.get(idx).unwrap_or("");
                if options.is_missing(raw) {
                    continue;
                }
                longest = longest.max(raw.chars().count());
                if bound != Bound::Text {
                    bound = bound.join(Bound::of(raw));
                }
            }

            let ty = match bound {
                Bound::Integer => ColumnType::Integer,
                Bound::Float => ColumnType::Float,
                Bound::Date => ColumnType::Date,
                Bound::Empty | Bound::Text => ColumnType::Text {
                    long: longest > options.text_limit,
                },
            };
            debug!(column = %name, ty = %ty, longest, "derived column type");
            Column {
                name: name.clone(),
                ty,
            }
        })
        .collect();

    TableSchema::new(columns)
}
