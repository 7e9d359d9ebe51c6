use std::path::PathBuf;

use clap::{Parser, Subcommand};
use tracing::debug;
use tracing_subscriber::EnvFilter;

use refund_cli::app;
use refund_cli::config::CliConfig;
use refund_core::db::DbConfig;

// ─── CLI definition ──────────────────────────────────────────────────────────

/// Estimated federal refund calculator for wage earners.
///
/// Connects to the configured database, loads the rate schedule and
/// standard deduction for the requested tax year and filing status, and
/// computes taxable income, liability, and the estimated refund.
#[derive(Debug, Parser)]
#[command(name = "refund-estimator", version, about)]
struct Cli {
    /// Database backend to use (overrides the config file).
    #[arg(long)]
    backend: Option<String>,

    /// Database connection string.
    /// For SQLite this is a file path (e.g. `refunds.db`) or `:memory:`.
    #[arg(long)]
    db: Option<String>,

    /// Path to a TOML config file (default: ./refund-estimator.toml if present).
    #[arg(long)]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Debug, Subcommand)]
enum Command {
    /// Run migrations (and optional seed files) against the database.
    Setup {
        /// Directory of .sql seed files to apply after migrations.
        #[arg(long)]
        seeds: Option<PathBuf>,
    },

    /// Estimate a refund from gross wages and federal withholding.
    Estimate {
        /// Tax year of the rate schedule to apply.
        #[arg(long, default_value_t = 2024)]
        year: i32,

        /// Filing status code: S, MFJ, MFS, HOH, or QSS.
        #[arg(long, default_value = "S")]
        status: String,

        /// Gross wages (commas allowed, e.g. 75,000).
        #[arg(long)]
        wages: String,

        /// Federal income tax withheld.
        #[arg(long)]
        withheld: String,

        /// Save the result as a refund record.
        #[arg(long, default_value_t = false)]
        save: bool,
    },

    /// List saved refund records.
    List {
        /// Only records for this tax year.
        #[arg(long)]
        year: Option<i32>,
    },

    /// Show one saved refund record.
    Show { id: i64 },

    /// Delete a saved refund record.
    Delete { id: i64 },

    /// List tax years with reference data.
    Years,

    /// List filing statuses.
    Statuses,
}

// ─── tracing ─────────────────────────────────────────────────────────────────

/// Initialise the tracing subscriber.
///
/// * Honours `RUST_LOG` when set.
/// * Falls back to `info` so normal runs are quiet.
/// * Strips timestamps and target names to keep CLI output clean.
fn init_tracing() {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::from("info"));

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .without_time()
        .with_target(false)
        .init();
}

// ─── entry point ─────────────────────────────────────────────────────────────

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    init_tracing();

    let cli = Cli::parse();

    let file_config = CliConfig::load_or_default(cli.config.as_deref())?;
    let db_config = DbConfig {
        backend: cli.backend.unwrap_or(file_config.backend),
        connection_string: cli.db.unwrap_or(file_config.database),
    };

    if let Command::Setup { seeds } = &cli.command {
        return app::setup(&db_config, seeds.as_deref()).await;
    }

    debug!("connecting to {} backend", db_config.backend);
    let registry = app::build_registry();
    let repo = registry.create(&db_config).await?;

    match cli.command {
        Command::Setup { .. } => unreachable!("handled above"),
        Command::Estimate {
            year,
            status,
            wages,
            withheld,
            save,
        } => app::estimate(&*repo, year, &status, &wages, &withheld, save).await,
        Command::List { year } => app::list(&*repo, year).await,
        Command::Show { id } => app::show(&*repo, id).await,
        Command::Delete { id } => app::delete(&*repo, id).await,
        Command::Years => app::years(&*repo).await,
        Command::Statuses => app::statuses(&*repo).await,
    }
}
