use async_trait::async_trait;
use mongodb::bson::document::ValueAccessError;
use thiserror::Error;

use ambulance_init_core::DeviceEntry;

pub mod document;
pub mod mongo;

pub use mongo::{MongoConnector, MongoStore};

/// Operations the initializer needs from a document database.
///
/// Names are matched exactly; implementations must not normalise case.
#[async_trait]
pub trait DocumentStore: Send + Sync {
    /// Lists every database visible to the connected user.
    async fn list_database_names(&self) -> Result<Vec<String>, StorageError>;

    /// Lists the collections inside `database`.
    async fn list_collection_names(&self, database: &str) -> Result<Vec<String>, StorageError>;

    /// Creates an empty collection.
    async fn create_collection(&self, database: &str, collection: &str)
        -> Result<(), StorageError>;

    /// Creates a non-unique single-field ascending index and returns its name.
    async fn create_ascending_index(
        &self,
        database: &str,
        collection: &str,
        field: &str,
    ) -> Result<String, StorageError>;

    /// Inserts the devices as one batch and returns how many were written.
    ///
    /// A rejected batch surfaces as [`StorageError::Write`].
    async fn insert_devices(
        &self,
        database: &str,
        collection: &str,
        devices: &[DeviceEntry],
    ) -> Result<usize, StorageError>;
}

/// Opens a [`DocumentStore`] handle. Each call is one connection attempt.
#[async_trait]
pub trait Connector: Send + Sync {
    type Store: DocumentStore;

    /// Endpoint description safe to put in logs.
    fn target(&self) -> &str;

    async fn connect(&self) -> Result<Self::Store, StorageError>;
}

/// Storage level errors.
#[derive(Debug, Error)]
pub enum StorageError {
    #[error("mongodb at {target} is unreachable: {reason}")]
    Unreachable { target: String, reason: String },
    #[error("invalid mongodb uri for {target}: {reason}")]
    InvalidUri { target: String, reason: String },
    #[error("seed write rejected: {0}")]
    Write(String),
    #[error("failed to decode stored document: {0}")]
    Decode(#[from] ValueAccessError),
    #[error("logList entry #{0} is not a document")]
    MalformedLogEntry(usize),
    #[error("stored timestamp {0} is out of range")]
    Timestamp(i64),
    #[error("mongodb error: {0}")]
    Database(#[from] mongodb::error::Error),
}

impl StorageError {
    /// Returns `true` for failures worth another connection attempt.
    pub fn is_transient(&self) -> bool {
        matches!(self, Self::Unreachable { .. })
    }
}
