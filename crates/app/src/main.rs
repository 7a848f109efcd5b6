mod initializer;
mod telemetry;

use std::{process::ExitCode, time::Duration};

use thiserror::Error;
use tracing::{error, info};

use ambulance_init_core::{FixtureError, RetryPolicy, SeedFixture};
use ambulance_init_storage::MongoConnector;
use ambulance_init_util::{load_env_file, ConfigError, Environment, InitConfig};

use crate::initializer::{InitError, InitOutcome, Initializer};

#[derive(Debug, Error)]
enum AppError {
    #[error("invalid configuration: {0}")]
    Config(#[from] ConfigError),
    #[error("invalid seed fixture: {0}")]
    Fixture(#[from] FixtureError),
    #[error(transparent)]
    Init(#[from] InitError),
}

#[tokio::main(flavor = "current_thread")]
async fn main() -> ExitCode {
    load_env_file();

    // An invalid APP_ENV is reported by the config loader below.
    let environment = Environment::from_env().unwrap_or(Environment::Development);
    if let Err(err) = telemetry::init_tracing(environment) {
        eprintln!("{err}");
        return ExitCode::FAILURE;
    }

    let result = run().await;
    report(&result);
    ExitCode::from(exit_status(&result))
}

/// Process exit status for a finished run. A rejected seed batch in lenient
/// mode still counts as success.
fn exit_status(result: &Result<InitOutcome, AppError>) -> u8 {
    match result {
        Ok(_) => 0,
        Err(_) => 1,
    }
}

fn report(result: &Result<InitOutcome, AppError>) {
    match result {
        Ok(outcome @ InitOutcome::Seeded { inserted, index }) => info!(
            stage = "app",
            outcome = outcome.as_str(),
            inserted,
            index = %index,
            "initialization finished"
        ),
        Ok(outcome @ InitOutcome::SeedWriteFailed { reason }) => info!(
            stage = "app",
            outcome = outcome.as_str(),
            reason = %reason,
            "initialization finished without seed data"
        ),
        Ok(outcome @ InitOutcome::AlreadyInitialized) => {
            info!(stage = "app", outcome = outcome.as_str(), "initialization finished")
        }
        Err(err) => error!(stage = "app", error = %err, "initialization failed"),
    }
}

async fn run() -> Result<InitOutcome, AppError> {
    let config = InitConfig::from_env()?;
    info!(
        stage = "config",
        target = %config.mongo.redacted(),
        database = %config.database,
        collection = %config.collection,
        retry_secs = config.retry_seconds,
        max_attempts = ?config.retry_max_attempts,
        seed_mode = config.seed_mode.as_str(),
        "configuration loaded"
    );

    let fixture = SeedFixture::load(config.fixture_path.as_deref())?;
    info!(
        stage = "config",
        fixture = %fixture.source(),
        documents = fixture.len(),
        "seed fixture loaded"
    );

    // A URI the driver cannot parse will never connect; fail before the retry loop.
    let connector =
        MongoConnector::parse(&config.mongo.connection_uri()?, config.mongo.redacted())
            .await
            .map_err(|err| ConfigError::InvalidTarget(err.to_string()))?
            .with_server_selection_timeout(Duration::from_secs(config.connect_timeout_seconds));
    let policy = RetryPolicy::unbounded(Duration::from_secs(config.retry_seconds))
        .with_max_attempts(config.retry_max_attempts);

    let outcome = Initializer::new(connector, &config.database, &config.collection, fixture)
        .with_policy(policy)
        .with_seed_mode(config.seed_mode)
        .run()
        .await?;
    Ok(outcome)
}
