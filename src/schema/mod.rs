pub mod ddl;
pub mod derive;
pub mod types;

pub use ddl::TableName;
pub use derive::derive_types;
pub use types::{Column, ColumnType, TableSchema};
