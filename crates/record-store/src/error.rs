//! Record store errors.

use std::fmt;
use thiserror::Error;

/// The collection an error refers to.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Collection {
    Users,
    Organizations,
    Nfts,
}

impl fmt::Display for Collection {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Collection::Users => "users",
            Collection::Organizations => "organizations",
            Collection::Nfts => "nfts",
        };
        f.write_str(name)
    }
}

#[derive(Debug, Error)]
pub enum StoreError {
    #[error("Duplicate key in {collection}: {key}")]
    Duplicate { collection: Collection, key: String },

    #[error("No record in {collection} for {key}")]
    NotFound { collection: Collection, key: String },

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("Encryption error: {0}")]
    Encryption(String),
}

impl StoreError {
    pub(crate) fn duplicate(collection: Collection, key: impl Into<String>) -> Self {
        StoreError::Duplicate {
            collection,
            key: key.into(),
        }
    }

    pub(crate) fn not_found(collection: Collection, key: impl Into<String>) -> Self {
        StoreError::NotFound {
            collection,
            key: key.into(),
        }
    }
}

impl From<aes_gcm::Error> for StoreError {
    fn from(_: aes_gcm::Error) -> Self {
        StoreError::Encryption("AES-GCM encryption/decryption failed".to_string())
    }
}
