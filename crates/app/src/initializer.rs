use std::time::Duration;

use async_trait::async_trait;
use thiserror::Error;
use tracing::{error, info, warn};

use ambulance_init_core::{RetryPolicy, SeedFixture, INDEXED_FIELD};
use ambulance_init_storage::{Connector, DocumentStore, StorageError};
use ambulance_init_util::{SeedMode, DEFAULT_RETRY_SECONDS};

/// Suspends the initializer between connection attempts.
#[async_trait]
pub trait Sleeper: Send + Sync {
    async fn sleep(&self, duration: Duration);
}

/// Sleeper backed by the tokio timer.
#[derive(Debug, Clone, Copy, Default)]
pub struct TokioSleeper;

#[async_trait]
impl Sleeper for TokioSleeper {
    async fn sleep(&self, duration: Duration) {
        tokio::time::sleep(duration).await;
    }
}

/// Terminal state of a completed run.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum InitOutcome {
    /// Target collection was already present; nothing was written.
    AlreadyInitialized,
    /// Collection, index and seed documents were created.
    Seeded { inserted: usize, index: String },
    /// Collection and index exist but the seed batch was rejected.
    SeedWriteFailed { reason: String },
}

impl InitOutcome {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::AlreadyInitialized => "already_initialized",
            Self::Seeded { .. } => "seeded",
            Self::SeedWriteFailed { .. } => "seed_write_failed",
        }
    }
}

#[derive(Debug, Error)]
pub enum InitError {
    #[error("gave up connecting to {target} after {attempts} attempts: {source}")]
    ConnectExhausted {
        target: String,
        attempts: u32,
        #[source]
        source: StorageError,
    },
    #[error("seed write rejected in strict mode: {0}")]
    StrictSeed(String),
    #[error(transparent)]
    Storage(#[from] StorageError),
}

/// Waits for MongoDB, then seeds the target collection unless it already exists.
pub struct Initializer<C, S = TokioSleeper> {
    connector: C,
    sleeper: S,
    policy: RetryPolicy,
    seed_mode: SeedMode,
    database: String,
    collection: String,
    fixture: SeedFixture,
}

impl<C: Connector> Initializer<C> {
    pub fn new(
        connector: C,
        database: impl Into<String>,
        collection: impl Into<String>,
        fixture: SeedFixture,
    ) -> Self {
        Self {
            connector,
            sleeper: TokioSleeper,
            policy: RetryPolicy::unbounded(Duration::from_secs(DEFAULT_RETRY_SECONDS)),
            seed_mode: SeedMode::default(),
            database: database.into(),
            collection: collection.into(),
            fixture,
        }
    }
}

impl<C: Connector, S: Sleeper> Initializer<C, S> {
    pub fn with_policy(mut self, policy: RetryPolicy) -> Self {
        self.policy = policy;
        self
    }

    pub fn with_seed_mode(mut self, seed_mode: SeedMode) -> Self {
        self.seed_mode = seed_mode;
        self
    }

    /// Overrides the sleeper used between connection attempts.
    #[cfg(test)]
    pub fn with_sleeper<T: Sleeper>(self, sleeper: T) -> Initializer<C, T> {
        Initializer {
            connector: self.connector,
            sleeper,
            policy: self.policy,
            seed_mode: self.seed_mode,
            database: self.database,
            collection: self.collection,
            fixture: self.fixture,
        }
    }

    /// Runs the whole bootstrap: connect, check, seed.
    pub async fn run(&self) -> Result<InitOutcome, InitError> {
        let store = self.connect().await?;

        if is_initialized(&store, &self.database, &self.collection).await? {
            info!(
                stage = "check",
                database = %self.database,
                collection = %self.collection,
                "collection already exists in database, nothing to do"
            );
            return Ok(InitOutcome::AlreadyInitialized);
        }

        self.seed(&store).await
    }

    /// Attempts connections until one succeeds or the policy gives up.
    ///
    /// Only transient failures are retried; anything else is returned at once.
    pub async fn connect(&self) -> Result<C::Store, InitError> {
        let mut attempt: u32 = 0;
        loop {
            attempt = attempt.saturating_add(1);
            match self.connector.connect().await {
                Ok(store) => {
                    info!(
                        stage = "connect",
                        target = %self.connector.target(),
                        attempts = attempt,
                        "connected to mongodb"
                    );
                    return Ok(store);
                }
                Err(err) if !err.is_transient() => {
                    error!(
                        stage = "connect",
                        target = %self.connector.target(),
                        attempt,
                        error = %err,
                        "mongodb connection cannot succeed, not retrying"
                    );
                    return Err(err.into());
                }
                Err(err) => {
                    let Some(delay) = self.policy.next_delay(attempt) else {
                        return Err(InitError::ConnectExhausted {
                            target: self.connector.target().to_string(),
                            attempts: attempt,
                            source: err,
                        });
                    };
                    warn!(
                        stage = "connect",
                        target = %self.connector.target(),
                        attempt,
                        error = %err,
                        retry_in_secs = delay.as_secs(),
                        "cannot connect to mongodb, will retry"
                    );
                    self.sleeper.sleep(delay).await;
                }
            }
        }
    }

    /// Creates the collection and its index, then inserts the fixture as one batch.
    pub async fn seed(&self, store: &C::Store) -> Result<InitOutcome, InitError> {
        let database = self.database.as_str();
        let collection = self.collection.as_str();

        store.create_collection(database, collection).await?;
        info!(stage = "seed", database, collection, "collection created");

        let index = store
            .create_ascending_index(database, collection, INDEXED_FIELD)
            .await?;
        info!(stage = "seed", collection, index = %index, "index created");

        match store
            .insert_devices(database, collection, self.fixture.documents())
            .await
        {
            Ok(inserted) => {
                info!(
                    stage = "seed",
                    collection,
                    inserted,
                    fixture = %self.fixture.source(),
                    "seed documents inserted"
                );
                Ok(InitOutcome::Seeded { inserted, index })
            }
            Err(StorageError::Write(reason)) => {
                error!(
                    stage = "seed",
                    collection,
                    mode = self.seed_mode.as_str(),
                    error = %reason,
                    "error when writing the seed data"
                );
                match self.seed_mode {
                    SeedMode::Strict => Err(InitError::StrictSeed(reason)),
                    SeedMode::Lenient => Ok(InitOutcome::SeedWriteFailed { reason }),
                }
            }
            Err(err) => Err(err.into()),
        }
    }
}

/// Returns `true` iff `database` exists and contains `collection`.
///
/// Collections are only listed when the database is present.
pub async fn is_initialized<D>(
    store: &D,
    database: &str,
    collection: &str,
) -> Result<bool, StorageError>
where
    D: DocumentStore + ?Sized,
{
    let databases = store.list_database_names().await?;
    if !databases.iter().any(|name| name == database) {
        return Ok(false);
    }

    let collections = store.list_collection_names(database).await?;
    Ok(collections.iter().any(|name| name == collection))
}
