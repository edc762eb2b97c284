//! Durable key-value storage for the offline queue, using Apache OpenDAL.
//!
//! The queue is one JSON array under one key. The store exposes whole-value
//! `get` and `set` only; there is no partial update.

use std::path::Path;

use async_trait::async_trait;
use opendal::{ErrorKind, Operator, services};
use thiserror::Error;

/// Storage operation errors.
#[derive(Debug, Error)]
pub enum StorageError {
    /// Storage backend configuration error.
    #[error("storage configuration error: {0}")]
    Configuration(String),

    /// OpenDAL operation error.
    #[error("storage operation failed: {0}")]
    Operation(String),
}

impl StorageError {
    /// Create a configuration error.
    #[must_use]
    pub fn configuration(msg: impl Into<String>) -> Self {
        Self::Configuration(msg.into())
    }

    /// Returns the error code for diagnostics.
    #[must_use]
    pub fn error_code(&self) -> &'static str {
        match self {
            Self::Configuration(_) => "STORAGE_CONFIGURATION_ERROR",
            Self::Operation(_) => "STORAGE_ERROR",
        }
    }
}

impl From<opendal::Error> for StorageError {
    fn from(err: opendal::Error) -> Self {
        match err.kind() {
            ErrorKind::ConfigInvalid => Self::Configuration(err.to_string()),
            _ => Self::Operation(err.to_string()),
        }
    }
}

/// Process-surviving key-value storage.
#[async_trait]
pub trait QueueStore: Send + Sync {
    /// Reads the value under `key`, `None` if nothing was ever written.
    async fn get(&self, key: &str) -> Result<Option<Vec<u8>>, StorageError>;

    /// Replaces the value under `key`.
    async fn set(&self, key: &str, value: Vec<u8>) -> Result<(), StorageError>;
}

/// [`QueueStore`] backed by an OpenDAL operator.
#[derive(Debug, Clone)]
pub struct OpendalQueueStore {
    operator: Operator,
}

impl OpendalQueueStore {
    /// Local filesystem storage rooted at `root`.
    ///
    /// # Errors
    ///
    /// Returns an error if the path is not valid UTF-8 or the backend cannot
    /// be initialized.
    pub fn fs(root: impl AsRef<Path>) -> Result<Self, StorageError> {
        let root = root
            .as_ref()
            .to_str()
            .ok_or_else(|| StorageError::configuration("invalid path"))?;
        let builder = services::Fs::default().root(root);

        let operator = Operator::new(builder)
            .map_err(|e| StorageError::configuration(e.to_string()))?
            .finish();
        Ok(Self { operator })
    }

    /// In-memory storage; contents are lost with the process.
    ///
    /// # Errors
    ///
    /// Returns an error if the backend cannot be initialized.
    pub fn memory() -> Result<Self, StorageError> {
        let operator = Operator::new(services::Memory::default())
            .map_err(|e| StorageError::configuration(e.to_string()))?
            .finish();
        Ok(Self { operator })
    }

    /// Wraps an existing operator.
    #[must_use]
    pub fn from_operator(operator: Operator) -> Self {
        Self { operator }
    }
}

#[async_trait]
impl QueueStore for OpendalQueueStore {
    async fn get(&self, key: &str) -> Result<Option<Vec<u8>>, StorageError> {
        match self.operator.read(key).await {
            Ok(buffer) => Ok(Some(buffer.to_vec())),
            Err(e) if e.kind() == ErrorKind::NotFound => Ok(None),
            Err(e) => Err(e.into()),
        }
    }

    async fn set(&self, key: &str, value: Vec<u8>) -> Result<(), StorageError> {
        self.operator.write(key, value).await?;
        Ok(())
    }
}
