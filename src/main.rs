use std::path::PathBuf;
use std::process::ExitCode;
use std::sync::Arc;

use anyhow::{bail, Context};
use clap::{Parser, Subcommand};
use serde_json::Value;
use spoticheck_core::protocol::Identify;
use spoticheck_core::report;
use spoticheck_gateway::{handshake, run_session, Dispatcher, WsConnection};
use spoticheck_settings::{load_settings, SettingsOverrides, SpoticheckSettings};
use spoticheck_store::{Database, ListeningRepo, StorageLocation};
use spoticheck_telemetry::{init_telemetry, TelemetryConfig};
use tracing::Level;

#[derive(Parser)]
#[command(name = "spoticheck", version, about = "Record what people on a gateway are listening to")]
struct Cli {
    #[command(subcommand)]
    command: Option<Command>,

    /// Gateway authentication token
    #[arg(short, long, global = true)]
    token: Option<String>,

    /// Storage location (directory, sqlite://<dir>, or :memory:)
    #[arg(short = 'u', long = "uri", global = true)]
    storage_uri: Option<String>,

    /// Storage database name
    #[arg(short = 'b', long = "database", global = true)]
    storage_database: Option<String>,

    /// Comma-separated identity ids to record (empty records everyone)
    #[arg(short, long = "watch", global = true)]
    watched: Option<String>,

    /// Debug-level console logging
    #[arg(short, long, global = true)]
    debug: bool,

    #[arg(long, global = true)]
    gateway_url: Option<String>,

    /// Directory for per-run log files
    #[arg(long, global = true)]
    log_dir: Option<PathBuf>,

    /// JSON settings file
    #[arg(short, long, global = true)]
    config: Option<PathBuf>,
}

#[derive(Subcommand)]
enum Command {
    /// Connect to the gateway and record listening events (default)
    Listen,
    /// Print aggregates over stored records as JSON
    Report {
        #[command(subcommand)]
        query: ReportQuery,

        /// Keep only the first N entries
        #[arg(long)]
        limit: Option<usize>,
    },
}

#[derive(Subcommand)]
enum ReportQuery {
    /// Every stored record
    All,
    /// Tracks from most to least played
    Most,
    /// Tracks from least to most played
    Least,
    /// Records for one artist
    Artist { name: String },
    /// Records for one listener
    Listener { id: String },
    /// Records for either of two listeners
    Listeners { first: String, second: String },
    /// Tracks both listeners have played
    Shared { first: String, second: String },
}

impl Cli {
    fn overrides(&self) -> SettingsOverrides {
        SettingsOverrides {
            token: self.token.clone(),
            storage_uri: self.storage_uri.clone(),
            storage_database: self.storage_database.clone(),
            watched: self.watched.clone(),
            debug: self.debug,
            gateway_url: self.gateway_url.clone(),
            log_dir: self.log_dir.clone(),
        }
    }
}

#[tokio::main]
async fn main() -> ExitCode {
    let _ = rustls::crypto::ring::default_provider().install_default();

    let cli = Cli::parse();
    let loaded = match load_settings(cli.config.as_deref(), &cli.overrides()) {
        Ok(loaded) => loaded,
        Err(e) => {
            eprintln!("spoticheck: {e}");
            return ExitCode::FAILURE;
        }
    };
    let settings = loaded.settings;
    let command = cli.command.unwrap_or(Command::Listen);

    let _telemetry = init_telemetry(telemetry_config(&command, &settings));
    for warning in &loaded.warnings {
        tracing::warn!("{warning}");
    }

    let result = match command {
        Command::Listen => listen(&settings).await,
        Command::Report { query, limit } => run_report(&settings, &query, limit),
    };

    match result {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            tracing::error!(error = %format!("{e:#}"), "spoticheck exiting");
            ExitCode::FAILURE
        }
    }
}

/// Listening logs at info (debug with the toggle) plus a per-run file.
/// Reports keep stdout for JSON and only log warnings to stderr.
fn telemetry_config(command: &Command, settings: &SpoticheckSettings) -> TelemetryConfig {
    match command {
        Command::Listen => {
            TelemetryConfig::for_run(settings.logging.debug, settings.logging.dir.clone())
        }
        Command::Report { .. } => TelemetryConfig {
            log_level: if settings.logging.debug { Level::DEBUG } else { Level::WARN },
            stderr: true,
            ..TelemetryConfig::default()
        },
    }
}

fn open_repo(settings: &SpoticheckSettings) -> anyhow::Result<ListeningRepo> {
    let location = StorageLocation::parse(settings.storage_uri()?, &settings.storage.database)?;
    let db = Database::open_location(&location)
        .with_context(|| format!("opening store at {location}"))?;
    Ok(ListeningRepo::new(db, settings.storage.collection.clone()))
}

/// Runs until the gateway connection is lost, which is always an error.
async fn listen(settings: &SpoticheckSettings) -> anyhow::Result<()> {
    settings.validate_for_listen()?;
    let repo = open_repo(settings)?;
    let watched = settings.watched();
    tracing::info!(
        collection = repo.collection(),
        watched = watched.len(),
        "starting collector"
    );

    let conn = Arc::new(WsConnection::connect(&settings.gateway.url).await?);
    let identify = Identify::new(settings.token()?, settings.gateway.properties.clone());
    let interval = handshake(conn.as_ref(), &identify).await?;

    let dispatcher = Dispatcher::new(Arc::new(repo), watched);
    let end = run_session(conn, interval, dispatcher).await;
    bail!("gateway session ended: {end:?}")
}

fn run_report(
    settings: &SpoticheckSettings,
    query: &ReportQuery,
    limit: Option<usize>,
) -> anyhow::Result<()> {
    settings.validate_for_report()?;
    let records = open_repo(settings)?.all()?;
    tracing::debug!(records = records.len(), "loaded records");

    let output = match query {
        ReportQuery::All => limited(records.iter().collect::<Vec<_>>(), limit)?,
        ReportQuery::Most => limited(report::most_played(&records), limit)?,
        ReportQuery::Least => limited(report::least_played(&records), limit)?,
        ReportQuery::Artist { name } => limited(report::by_artist(&records, name), limit)?,
        ReportQuery::Listener { id } => limited(report::by_listener(&records, id), limit)?,
        ReportQuery::Listeners { first, second } => {
            limited(report::by_listeners(&records, first, second), limit)?
        }
        ReportQuery::Shared { first, second } => {
            limited(report::shared_tracks(&records, first, second), limit)?
        }
    };

    println!("{}", serde_json::to_string_pretty(&output)?);
    Ok(())
}

fn limited<T: serde::Serialize>(mut items: Vec<T>, limit: Option<usize>) -> anyhow::Result<Value> {
    if let Some(n) = limit {
        items.truncate(n);
    }
    Ok(serde_json::to_value(items)?)
}
