use thiserror::Error;

#[derive(Error, Debug)]
pub enum StoreError {
    #[error("IO Error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON Parsing Error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("Unsupported export version: {found} (expected {expected})")]
    UnsupportedExportVersion { found: u32, expected: u32 },

    #[error("Import failed during {phase}: {source}")]
    Import {
        phase: &'static str,
        source: std::io::Error,
    },

    #[error("Sync worker is gone")]
    WorkerGone,
}

pub type StoreResult<T> = Result<T, StoreError>;
