//! Load a CSV file into a database table, creating the table from column
//! types inferred over a sample of the file.

pub mod config;
pub mod duck;
pub mod error;
pub mod import;
pub mod process;
pub mod schema;
pub mod sink;

pub use config::{ConnectOptions, ImportOptions};
pub use error::ImportError;
pub use import::{infer_schema, ImportSummary, Importer};
pub use schema::{Column, ColumnType, TableSchema};
pub use sink::Sink;
