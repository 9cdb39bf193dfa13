use std::path::PathBuf;

use thiserror::Error;

/// Failure modes of the OBJ mesh importer.
#[derive(Debug, Error)]
pub enum ImportError {
    #[error("failed to read mesh file {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("{path}:{line}: malformed `{kind}` record: {detail}")]
    Malformed {
        path: PathBuf,
        line: usize,
        kind: &'static str,
        detail: String,
    },
    #[error("{path} contains no faces")]
    Empty { path: PathBuf },
}

/// Failure modes of the path-record persistence store.
#[derive(Debug, Error)]
pub enum StoreError {
    #[error("failed to open database at {path}: {source}")]
    Open {
        path: PathBuf,
        #[source]
        source: rusqlite::Error,
    },
    #[error("sqlite operation failed: {0}")]
    Sqlite(#[from] rusqlite::Error),
}
