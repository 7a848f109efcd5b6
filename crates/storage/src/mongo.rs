use std::time::Duration;

use async_trait::async_trait;
use mongodb::{
    bson::{doc, Document},
    options::ClientOptions,
    Client, Collection, IndexModel,
};
use tracing::debug;

use ambulance_init_core::DeviceEntry;

use crate::{document::device_document, Connector, DocumentStore, StorageError};

const APP_NAME: &str = "ambulance-init";
const DEFAULT_SERVER_SELECTION_TIMEOUT: Duration = Duration::from_secs(10);

/// Opens MongoDB clients and verifies them with a `ping`.
#[derive(Clone)]
pub struct MongoConnector {
    options: ClientOptions,
    redacted: String,
}

impl MongoConnector {
    /// Parses `uri` once, up front. `redacted` is the form used in logs and errors.
    ///
    /// A malformed URI is reported as [`StorageError::InvalidUri`], which is
    /// never worth retrying.
    pub async fn parse(uri: &str, redacted: impl Into<String>) -> Result<Self, StorageError> {
        let redacted = redacted.into();
        let mut options = ClientOptions::parse(uri)
            .await
            .map_err(|err| StorageError::InvalidUri {
                target: redacted.clone(),
                reason: err.to_string(),
            })?;
        options.app_name = Some(APP_NAME.to_string());
        options.server_selection_timeout = Some(DEFAULT_SERVER_SELECTION_TIMEOUT);

        Ok(Self { options, redacted })
    }

    /// Bounds how long a single attempt waits for a reachable server.
    pub fn with_server_selection_timeout(mut self, timeout: Duration) -> Self {
        self.options.server_selection_timeout = Some(timeout);
        self
    }

    fn unreachable(&self, err: mongodb::error::Error) -> StorageError {
        StorageError::Unreachable {
            target: self.redacted.clone(),
            reason: err.to_string(),
        }
    }
}

#[async_trait]
impl Connector for MongoConnector {
    type Store = MongoStore;

    fn target(&self) -> &str {
        &self.redacted
    }

    async fn connect(&self) -> Result<MongoStore, StorageError> {
        let client =
            Client::with_options(self.options.clone()).map_err(|err| self.unreachable(err))?;

        // Client construction is lazy; only a round-trip proves the server is up.
        client
            .database("admin")
            .run_command(doc! { "ping": 1 })
            .await
            .map_err(|err| self.unreachable(err))?;

        debug!(stage = "connect", target = %self.redacted, "mongodb answered ping");
        Ok(MongoStore { client })
    }
}

/// Connected MongoDB handle.
#[derive(Clone)]
pub struct MongoStore {
    client: Client,
}

impl MongoStore {
    pub fn client(&self) -> &Client {
        &self.client
    }

    fn collection(&self, database: &str, collection: &str) -> Collection<Document> {
        self.client.database(database).collection(collection)
    }
}

#[async_trait]
impl DocumentStore for MongoStore {
    async fn list_database_names(&self) -> Result<Vec<String>, StorageError> {
        Ok(self.client.list_database_names().await?)
    }

    async fn list_collection_names(&self, database: &str) -> Result<Vec<String>, StorageError> {
        Ok(self.client.database(database).list_collection_names().await?)
    }

    async fn create_collection(
        &self,
        database: &str,
        collection: &str,
    ) -> Result<(), StorageError> {
        self.client
            .database(database)
            .create_collection(collection)
            .await?;
        Ok(())
    }

    async fn create_ascending_index(
        &self,
        database: &str,
        collection: &str,
        field: &str,
    ) -> Result<String, StorageError> {
        let mut keys = Document::new();
        keys.insert(field, 1_i32);
        let model = IndexModel::builder().keys(keys).build();

        let created = self
            .collection(database, collection)
            .create_index(model)
            .await?;
        Ok(created.index_name)
    }

    async fn insert_devices(
        &self,
        database: &str,
        collection: &str,
        devices: &[DeviceEntry],
    ) -> Result<usize, StorageError> {
        let documents: Vec<Document> = devices.iter().map(device_document).collect();

        match self
            .collection(database, collection)
            .insert_many(documents)
            .await
        {
            Ok(result) => Ok(result.inserted_ids.len()),
            Err(err) => Err(StorageError::Write(err.to_string())),
        }
    }
}
