mod feed;
mod output;

use clap::{Args, Parser, Subcommand};
use owo_colors::OwoColorize;
use rf_core::RevfeedError;
use rf_core::clamp::{DEFAULT_ELLIPSIS, MonospaceMeasure, clamp_html};
use rf_core::error::{SettingsError, StoreError};
use rf_core::reviews::ReviewRepository;
use rf_core::settings::SettingsFile;
use rf_core::store::Store;
use rf_core::types::review::NewReview;
use rf_db::schema;
use rf_db::store::DbStore;
use std::io::Read;
use std::net::{IpAddr, Ipv4Addr, SocketAddr};
use std::path::{Path, PathBuf};
use thiserror::Error;
use tracing_subscriber::EnvFilter;

const DB_PATH_ENV: &str = "REVFEED_DB_PATH";
const PORT_ENV: &str = "REVFEED_PORT";

/// Line height handed to the monospace layout. The clamp budget adds one
/// unit of slack, so this must stay above 1.
pub(crate) const LINE_HEIGHT: u32 = 20;

#[derive(Parser)]
#[command(name = "rf", about = "Product review feed tools")]
struct Cli {
    /// Settings file; missing files fall back to defaults.
    #[arg(long, global = true, default_value = "revfeed.toml")]
    config: PathBuf,
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Serve the reviews endpoint from a SQLite database.
    Serve {
        #[arg(long)]
        port: Option<u16>,
        #[arg(long)]
        db: Option<String>,
    },
    /// Insert reviews from a JSON array file.
    Seed {
        file: PathBuf,
        #[arg(long)]
        db: Option<String>,
    },
    /// Run a feed against a running endpoint and print what it shows.
    Feed(feed::FeedArgs),
    /// Clamp HTML to a number of lines in a fixed-width layout.
    Clamp(ClampArgs),
    /// Print the OpenAPI document.
    Openapi,
}

#[derive(Args)]
struct ClampArgs {
    /// HTML to clamp; read from stdin when omitted.
    html: Option<String>,
    #[arg(long, default_value_t = 3)]
    lines: usize,
    #[arg(long, default_value_t = 40)]
    columns: usize,
    #[arg(long, default_value = DEFAULT_ELLIPSIS)]
    ellipsis: String,
}

#[derive(Debug, Error)]
pub(crate) enum CliError {
    #[error(transparent)]
    Revfeed(#[from] RevfeedError),
    #[error(transparent)]
    Store(#[from] StoreError),
    #[error(transparent)]
    Settings(#[from] SettingsError),
    #[error("failed to read {path}: {message}")]
    Input { path: String, message: String },
    #[error("invalid argument {name}: {message}")]
    Argument { name: &'static str, message: String },
    #[error("server stopped: {0}")]
    Serve(#[from] std::io::Error),
}

#[tokio::main]
async fn main() {
    let cli = Cli::parse();
    init_tracing(matches!(cli.command, Command::Serve { .. }));
    if let Err(err) = run(cli).await {
        eprintln!("{} {err}", "error:".red().bold());
        std::process::exit(1);
    }
}

fn init_tracing(serving: bool) {
    let default = if serving { "info" } else { "warn" };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();
}

async fn run(cli: Cli) -> Result<(), CliError> {
    let settings = SettingsFile::load(&cli.config)?;
    match cli.command {
        Command::Serve { port, db } => {
            let db_path = resolve_db_path(db, &settings);
            let port = port
                .or_else(|| std::env::var(PORT_ENV).ok()?.parse().ok())
                .unwrap_or(settings.server.port);
            let addr = SocketAddr::new(IpAddr::V4(Ipv4Addr::LOCALHOST), port);
            rf_serve::serve(rf_serve::AppState::new(db_path), addr).await?;
        }
        Command::Seed { file, db } => {
            let db_path = resolve_db_path(db, &settings);
            let count = seed(&file, &db_path)?;
            println!(
                "{} {count} reviews into {db_path}",
                "Seeded".green().bold()
            );
        }
        Command::Feed(args) => feed::run(args, &settings).await?,
        Command::Clamp(args) => clamp(args)?,
        Command::Openapi => println!("{}", rf_serve::openapi::generate_spec()),
    }
    Ok(())
}

/// Flag, then environment, then settings file.
fn resolve_db_path(flag: Option<String>, settings: &SettingsFile) -> String {
    flag.or_else(|| std::env::var(DB_PATH_ENV).ok())
        .filter(|path| !path.trim().is_empty())
        .unwrap_or_else(|| settings.server.db_path.clone())
}

fn seed(file: &Path, db_path: &str) -> Result<usize, CliError> {
    let input_error = |message: String| CliError::Input {
        path: file.display().to_string(),
        message,
    };
    let content = std::fs::read_to_string(file).map_err(|err| input_error(err.to_string()))?;
    let reviews: Vec<NewReview> =
        serde_json::from_str(&content).map_err(|err| input_error(err.to_string()))?;

    let conn = schema::open_and_migrate(db_path).map_err(|err| StoreError::Storage {
        message: err.to_string(),
    })?;
    let store = DbStore::new(conn);
    let count = reviews.len();
    store.with_tx(|tx| {
        for review in reviews {
            tx.reviews().insert(review)?;
        }
        Ok(())
    })?;
    tracing::info!(count, db_path, "seeded reviews");
    Ok(count)
}

fn clamp(args: ClampArgs) -> Result<(), CliError> {
    let html = match args.html {
        Some(html) => html,
        None => {
            let mut buffer = String::new();
            std::io::stdin()
                .read_to_string(&mut buffer)
                .map_err(|err| CliError::Input {
                    path: "stdin".to_string(),
                    message: err.to_string(),
                })?;
            buffer
        }
    };
    let measure = MonospaceMeasure::new(args.columns, LINE_HEIGHT);
    let clamped = clamp_html(&html, &measure, args.lines, &args.ellipsis);
    println!("{}", clamped.html);
    if clamped.clamped {
        eprintln!("{}", "clamped".yellow());
    }
    Ok(())
}
