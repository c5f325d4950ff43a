use bridge_traits::error::BridgeError;
use std::path::PathBuf;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum SyncError {
    #[error("Catalog unavailable: HTTP {status} from {url}")]
    CatalogUnavailable { status: u16, url: String },

    #[error("Catalog unreachable: {0}")]
    CatalogUnreachable(String),

    #[error("Source file missing: {}", path.display())]
    SourceFileMissing { path: PathBuf },

    #[error("Failed to write {}: {message}", path.display())]
    DestinationWriteFailure { path: PathBuf, message: String },

    #[error("Failed to watch {}: {message}", path.display())]
    WatchStartFailure { path: PathBuf, message: String },

    #[error("Filesystem error: {0}")]
    Filesystem(String),

    #[error("Configuration error: {0}")]
    Config(String),
}

impl SyncError {
    /// Classify a bridge error raised by a catalog call.
    pub fn from_catalog(error: BridgeError) -> Self {
        match error {
            BridgeError::Unavailable { status, url } => SyncError::CatalogUnavailable { status, url },
            other => SyncError::CatalogUnreachable(other.to_string()),
        }
    }

    pub fn destination(path: impl Into<PathBuf>, error: BridgeError) -> Self {
        SyncError::DestinationWriteFailure {
            path: path.into(),
            message: error.to_string(),
        }
    }

    /// Catalog failures abort a pass; everything else is scoped to one item.
    pub fn is_catalog_failure(&self) -> bool {
        matches!(
            self,
            SyncError::CatalogUnavailable { .. } | SyncError::CatalogUnreachable(_)
        )
    }
}

impl From<core_runtime::Error> for SyncError {
    fn from(error: core_runtime::Error) -> Self {
        SyncError::Config(error.to_string())
    }
}

pub type Result<T> = std::result::Result<T, SyncError>;
