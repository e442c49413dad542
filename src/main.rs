//! prbell service entrypoint.

use std::io::{self, Write};
use std::process::ExitCode;
use std::sync::Arc;

use ortho_config::OrthoConfig;
use prbell::persistence::migrate_database;
use prbell::server::{ServeError, serve};
use prbell::telemetry::StderrJsonlTelemetrySink;
use prbell::{
    AppState, ConfigError, IntakeError, OctocrabGateway, PersistenceError, PrbellConfig,
    ReqwestSlackGateway, SlackError, SqliteStore,
};
use thiserror::Error;
use tracing::info;
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;
use tracing_subscriber::{EnvFilter, fmt};

/// Failures that stop the service from starting or keep it from running.
#[derive(Debug, Error)]
enum StartupError {
    #[error(transparent)]
    Config(#[from] ConfigError),
    #[error(transparent)]
    Persistence(#[from] PersistenceError),
    #[error(transparent)]
    GitHub(#[from] IntakeError),
    #[error(transparent)]
    Slack(#[from] SlackError),
    #[error(transparent)]
    Serve(#[from] ServeError),
}

#[tokio::main]
async fn main() -> ExitCode {
    match run().await {
        Ok(()) => ExitCode::SUCCESS,
        Err(error) => {
            if writeln!(io::stderr().lock(), "{error}").is_err() {
                return ExitCode::FAILURE;
            }
            ExitCode::FAILURE
        }
    }
}

async fn run() -> Result<(), StartupError> {
    let config = load_config()?;
    init_logging(&config.log_level, config.json_logs);

    let database_url = config.require_database_url()?;
    let telemetry = Arc::new(StderrJsonlTelemetrySink);
    let schema_version = migrate_database(database_url, telemetry.as_ref())?;
    if config.migrate_db {
        info!(schema_version = schema_version.as_str(), "migrations applied; exiting");
        return Ok(());
    }

    let store = Arc::new(SqliteStore::new(database_url)?);
    let github_token = config.resolve_github_token(&store)?;
    let slack_token = config.resolve_slack_token(&store)?;
    let github =
        OctocrabGateway::for_token(&github_token, &config.github_api_url, config.http_timeout())?;
    let slack =
        ReqwestSlackGateway::for_token(slack_token, &config.slack_api_url, config.http_timeout())?;

    let state = AppState {
        registry: store,
        github: Arc::new(github),
        slack: Arc::new(slack),
        telemetry,
        dispatch: Arc::new(config.dispatch_config()?),
    };
    let paths = config.route_paths()?;
    serve(state, &paths, config.bind_address()?).await?;
    Ok(())
}

/// Loads configuration from CLI, environment, and files.
///
/// # Errors
///
/// Returns [`ConfigError::Load`] when ortho-config fails to parse arguments
/// or load configuration files.
fn load_config() -> Result<PrbellConfig, ConfigError> {
    PrbellConfig::load().map_err(|error| ConfigError::Load {
        message: error.to_string(),
    })
}

/// Installs the global tracing subscriber.
///
/// `RUST_LOG` wins over the configured level when set.
fn init_logging(level: &str, json: bool) {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(level));
    let registry = tracing_subscriber::registry().with(filter);
    if json {
        registry.with(fmt::layer().json().with_writer(io::stderr)).init();
    } else {
        registry.with(fmt::layer().with_writer(io::stderr)).init();
    }
}
