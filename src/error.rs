use std::path::{Path, PathBuf};
use thiserror::Error;

pub type BoxError = Box<dyn std::error::Error + Send + Sync>;

/// Failures that stop an import. Per-cell and per-row problems never show up
/// here; they are logged and counted in [`crate::ImportSummary`].
#[derive(Debug, Error)]
pub enum ImportError {
    #[error("database connection failed: {source}")]
    Connection {
        #[source]
        source: BoxError,
    },

    #[error("cannot read `{}`: {source}", .path.display())]
    FileRead {
        path: PathBuf,
        #[source]
        source: BoxError,
    },

    #[error("cannot create table `{table}`: {source}")]
    SchemaCreation {
        table: String,
        #[source]
        source: BoxError,
    },
}

impl ImportError {
    pub fn connection(err: impl Into<BoxError>) -> Self {
        ImportError::Connection { source: err.into() }
    }

    pub fn file_read(path: &Path, err: impl Into<BoxError>) -> Self {
        ImportError::FileRead {
            path: path.to_path_buf(),
            source: err.into(),
        }
    }

    pub fn schema_creation(table: &str, err: impl Into<BoxError>) -> Self {
        ImportError::SchemaCreation {
            table: table.to_string(),
            source: err.into(),
        }
    }
}
