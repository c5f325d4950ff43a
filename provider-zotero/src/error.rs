//! Error types for the Zotero provider

use bridge_traits::error::BridgeError;
use thiserror::Error;

/// Zotero provider errors
#[derive(Error, Debug)]
pub enum ZoteroError {
    /// The local API answered with a non-200 status
    #[error("Zotero API error: HTTP {status_code} for {url}")]
    Unavailable { status_code: u16, url: String },

    /// The request never produced a response
    #[error("Cannot reach Zotero at {url}: {message}")]
    Unreachable { url: String, message: String },

    /// Failed to parse API response
    #[error("Failed to parse API response: {0}")]
    ParseError(String),

    /// Bridge error
    #[error(transparent)]
    BridgeError(#[from] BridgeError),
}

/// Result type for Zotero operations
pub type Result<T> = std::result::Result<T, ZoteroError>;

impl From<ZoteroError> for BridgeError {
    fn from(error: ZoteroError) -> Self {
        match error {
            ZoteroError::Unavailable { status_code, url } => BridgeError::Unavailable {
                status: status_code,
                url,
            },
            ZoteroError::Unreachable { url, message } => {
                BridgeError::OperationFailed(format!("Cannot reach {}: {}", url, message))
            }
            ZoteroError::ParseError(msg) => {
                BridgeError::OperationFailed(format!("Parse error: {}", msg))
            }
            ZoteroError::BridgeError(e) => e,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_display() {
        let error = ZoteroError::Unavailable {
            status_code: 503,
            url: "http://localhost:23119/api/users/0/collections?format=json".to_string(),
        };

        assert_eq!(
            error.to_string(),
            "Zotero API error: HTTP 503 for http://localhost:23119/api/users/0/collections?format=json"
        );
    }

    #[test]
    fn test_unavailable_keeps_status_through_conversion() {
        let error = ZoteroError::Unavailable {
            status_code: 500,
            url: "http://localhost:23119/api/users/0/items".to_string(),
        };
        let bridge_error: BridgeError = error.into();

        assert!(matches!(
            bridge_error,
            BridgeError::Unavailable { status: 500, .. }
        ));
    }
}
