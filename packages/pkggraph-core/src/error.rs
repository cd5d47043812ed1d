use std::path::PathBuf;
use thiserror::Error;

pub type Result<T> = std::result::Result<T, ScanError>;

#[derive(Error, Debug)]
pub enum ScanError {
    #[error("install root not found: {}", path.display())]
    RootNotFound { path: PathBuf },

    #[error("scan cancelled")]
    Cancelled,

    #[error("scan deadline exceeded after {elapsed_ms}ms")]
    DeadlineExceeded { elapsed_ms: u64 },

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("walk error: {0}")]
    Walk(String),

    #[error("worker pool error: {0}")]
    Pool(String),

    #[error("serialization error: {0}")]
    Serialize(#[from] serde_json::Error),
}

impl ScanError {
    pub fn walk<E: std::fmt::Display>(e: E) -> Self {
        Self::Walk(e.to_string())
    }

    /// Fatal errors abort the whole scan; everything else is confined to a
    /// single package and degrades that package's data.
    pub fn is_fatal(&self) -> bool {
        matches!(
            self,
            ScanError::RootNotFound { .. }
                | ScanError::Cancelled
                | ScanError::DeadlineExceeded { .. }
                | ScanError::Pool(_)
        )
    }
}
