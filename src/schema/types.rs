// src/schema/types.rs

use serde::{Deserialize, Serialize};
use std::{fmt, str::FromStr};

/// Storage type decided for one column.
#[derive(Debug, Serialize, Deserialize, PartialEq, Clone, Copy, Eq, Hash)]
#[serde(rename_all = "lowercase")]
pub enum ColumnType {
    Integer,
    Float,
    Date,
    /// `long` is set when a sampled value exceeded the bounded text length.
    Text { long: bool },
}

impl ColumnType {
    pub const TEXT: ColumnType = ColumnType::Text { long: false };
    pub const LONG_TEXT: ColumnType = ColumnType::Text { long: true };
}

impl fmt::Display for ColumnType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ColumnType::Integer => f.write_str("INTEGER"),
            ColumnType::Float => f.write_str("FLOAT"),
            ColumnType::Date => f.write_str("DATE"),
            ColumnType::Text { long: false } => f.write_str("TEXT"),
            ColumnType::Text { long: true } => f.write_str("LONGTEXT"),
        }
    }
}

impl FromStr for ColumnType {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "integer" | "int" | "bigint" => Ok(ColumnType::Integer),
            "float" | "double" | "real" => Ok(ColumnType::Float),
            "date" => Ok(ColumnType::Date),
            "text" | "varchar" | "string" => Ok(ColumnType::TEXT),
            "longtext" | "clob" => Ok(ColumnType::LONG_TEXT),
            other => Err(format!("unknown column type `{}`", other)),
        }
    }
}

/// A single column definition: header name plus decided type.
#[derive(Debug, Serialize, Deserialize, PartialEq, Clone, Eq, Hash)]
pub struct Column {
    pub name: String,
    pub ty: ColumnType,
}

/// Ordered column list; creation and every insert use this order.
#[derive(Debug, Serialize, Deserialize, PartialEq, Clone, Eq, Default)]
pub struct TableSchema {
    pub columns: Vec<Column>,
}

impl TableSchema {
    pub fn new(columns: Vec<Column>) -> Self {
        Self { columns }
    }

    pub fn len(&self) -> usize {
        self.columns.len()
    }

    pub fn is_empty(&self) -> bool {
        self.columns.is_empty()
    }

    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.columns.iter().map(|c| c.name.as_str())
    }
}
