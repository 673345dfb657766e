//! beacon - share short "what I'm doing" statuses with a small group.
//!
//! The backend cannot send CORS headers, so every call goes through the
//! transport resolver (direct → relay → callback).

mod prefs;
mod render;

use std::future::Future;
use std::path::Path;
use std::process::ExitCode;
use std::time::Duration;

use anyhow::{Context, anyhow};
use beacon_core::domain::{StatusBoard, parse_endpoint};
use beacon_core::{BeaconError, ResolverBuilder, ResolverConfig, ResultEnvelope, StatusClient};
use clap::{Parser, Subcommand};
use tokio::time::MissedTickBehavior;
use tracing_subscriber::{EnvFilter, layer::SubscriberExt, util::SubscriberInitExt};

use crate::prefs::Prefs;

/// Placeholder Apps Script deployment; set a real one with `beacon config set-endpoint`.
const DEFAULT_ENDPOINT: &str = "https://script.google.com/macros/s/YOUR_DEPLOYMENT_ID/exec";

const DEFAULT_FILTER: &str = "warn,beacon=info";

#[derive(Debug, Parser)]
#[command(name = "beacon", version)]
#[command(about = "Share short status updates through a backend without CORS headers")]
#[command(
    after_help = "Environment:\n  BEACON_PREFS       Preferences file path\n  BEACON_STRATEGIES  Strategy order, e.g. relay,callback\n  RUST_LOG           Log filter"
)]
struct Cli {
    /// Backend endpoint for this invocation (overrides the saved one).
    #[arg(long, global = true)]
    endpoint: Option<String>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Debug, Subcommand)]
enum Commands {
    /// Check that the backend is reachable.
    Health,
    /// Show everyone's latest status.
    List,
    /// Post a status.
    Post {
        status: String,
        /// Defaults to the saved name.
        #[arg(long)]
        name: Option<String>,
    },
    /// Keep the board on screen, refreshing until Ctrl-C.
    Watch {
        #[arg(long, default_value_t = 10)]
        interval_secs: u64,
    },
    /// Saved preferences.
    Config {
        #[command(subcommand)]
        command: ConfigCommand,
    },
}

#[derive(Debug, Subcommand)]
enum ConfigCommand {
    Show,
    SetEndpoint { url: String },
    SetName { name: String },
}

fn init_tracing() {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(DEFAULT_FILTER));
    let _ = tracing_subscriber::registry()
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .with(filter)
        .try_init();
}

fn outcome(envelope: &ResultEnvelope) -> ExitCode {
    if envelope.is_success() {
        ExitCode::SUCCESS
    } else {
        ExitCode::FAILURE
    }
}

#[tokio::main]
async fn main() -> ExitCode {
    init_tracing();
    let cli = Cli::parse();

    match run(cli).await {
        Ok(code) => code,
        Err(e) => {
            eprintln!("error: {e:#}");
            ExitCode::FAILURE
        }
    }
}

async fn run(cli: Cli) -> anyhow::Result<ExitCode> {
    let prefs_path = prefs::default_path()?;
    let mut prefs = Prefs::load(&prefs_path)?;

    if let Commands::Config { command } = &cli.command {
        configure(command, &mut prefs, &prefs_path)?;
        return Ok(ExitCode::SUCCESS);
    }

    let endpoint = cli
        .endpoint
        .clone()
        .or_else(|| prefs.api_url.clone())
        .unwrap_or_else(|| DEFAULT_ENDPOINT.to_string());

    let config = ResolverConfig::from_env().context("reading BEACON_* settings")?;
    let resolver = ResolverBuilder::new()
        .config(config)
        .with_reqwest(reqwest::Client::new())
        .build()?;
    let client = StatusClient::new(resolver, endpoint);

    match cli.command {
        Commands::Health => {
            let env = client.health().await;
            println!("{}", render::connection(&env));
            Ok(outcome(&env))
        }
        Commands::List => Ok(list(&client).await),
        Commands::Post { status, name } => {
            let name = name
                .or_else(|| prefs.username.clone())
                .ok_or_else(|| anyhow!("no name given; pass --name or run `beacon config set-name`"))?;

            let env = client.update_status(&name, &status).await?;
            if !env.is_success() {
                eprintln!("failed to update status: {}", render::failure(&env));
                return Ok(ExitCode::FAILURE);
            }

            prefs.username = Some(name.trim().to_string());
            if let Err(e) = prefs.save(&prefs_path) {
                tracing::warn!("could not save preferences: {e}");
            }
            Ok(list(&client).await)
        }
        Commands::Watch { interval_secs } => watch(&client, interval_secs).await,
        Commands::Config { .. } => Ok(ExitCode::SUCCESS),
    }
}

async fn list(client: &StatusClient) -> ExitCode {
    let env = client.statuses().await;
    match env.data() {
        Some(data) if env.is_success() => {
            let board = StatusBoard::from_data(data);
            print!("{}", render::board(&board, chrono::Utc::now()));
        }
        _ => eprintln!("failed to load statuses: {}", render::failure(&env)),
    }
    outcome(&env)
}

async fn watch(client: &StatusClient, interval_secs: u64) -> anyhow::Result<ExitCode> {
    let health = client.health().await;
    println!("{}", render::connection(&health));
    if !health.is_success() {
        eprintln!("cannot connect to the status server; check the endpoint");
        return Ok(ExitCode::FAILURE);
    }

    let shutdown = async {
        if let Err(e) = tokio::signal::ctrl_c().await {
            tracing::warn!("cannot listen for Ctrl-C: {e}");
        }
    };
    let period = Duration::from_secs(interval_secs.max(1));
    let refreshes = refresh_until(period, shutdown, || async move {
        list(client).await;
        println!("last updated: {}", chrono::Local::now().format("%H:%M:%S"));
    })
    .await;

    tracing::info!(refreshes, "stopping watch");
    Ok(ExitCode::SUCCESS)
}

/// Run `refresh` every `period` until `shutdown` completes; returns the number
/// of finished refreshes.
///
/// A refresh in flight is abandoned on shutdown. Ticks missed during a slow
/// refresh collapse into one.
async fn refresh_until<S, F, Fut>(period: Duration, shutdown: S, mut refresh: F) -> usize
where
    S: Future<Output = ()>,
    F: FnMut() -> Fut,
    Fut: Future<Output = ()>,
{
    let mut ticker = tokio::time::interval(period);
    ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);
    tokio::pin!(shutdown);

    let mut done = 0;
    loop {
        let round = async {
            ticker.tick().await;
            refresh().await;
        };
        tokio::select! {
            _ = round => done += 1,
            _ = &mut shutdown => return done,
        }
    }
}

fn configure(command: &ConfigCommand, prefs: &mut Prefs, path: &Path) -> anyhow::Result<()> {
    match command {
        ConfigCommand::Show => {
            println!("preferences: {}", path.display());
            match &prefs.api_url {
                Some(url) => println!("endpoint:    {url}"),
                None => println!("endpoint:    {DEFAULT_ENDPOINT} (default)"),
            }
            println!("name:        {}", prefs.username.as_deref().unwrap_or("(not set)"));
            return Ok(());
        }
        ConfigCommand::SetEndpoint { url } => {
            let url = parse_endpoint(url).map_err(|_| BeaconError::InvalidEndpoint(url.clone()))?;
            prefs.api_url = Some(url.to_string());
        }
        ConfigCommand::SetName { name } => {
            let name = name.trim();
            if name.is_empty() {
                return Err(BeaconError::MissingField("name").into());
            }
            prefs.username = Some(name.to_string());
        }
    }
    prefs.save(path)?;
    tracing::info!(path = %path.display(), "preferences saved");
    Ok(())
}
