//! # sitecheck CLI
//!
//! Command-line entry points for the website verification pipeline. The
//! batch commands are meant to be run on a schedule; the rest are
//! administrative one-offs.
//!
//! - `check`: probe sites that are due for a status check
//! - `scan`: fetch and classify pending sites that answered 200
//! - `scan-one`: classify a single site on demand
//! - `submit`: add a new site and probe it once
//! - `show`: print a stored record as JSON
//! - `summary`: print aggregate scan statistics

mod telemetry;

use std::path::PathBuf;
use std::time::Duration;

use anyhow::anyhow;
use clap::{Args, Parser, Subcommand};
use indicatif::{ProgressBar, ProgressStyle};
use sitecheck::batch::{BatchRunner, ItemOutcome};
use sitecheck::classifier::CompletionService;
use sitecheck::config::Settings;
use sitecheck::report;
use sitecheck::store::ResultStore;
use telemetry::TelemetryOptions;
use tracing::instrument;

#[derive(Parser)]
#[command(author, version, about = "Verify and analyze websites submitted to a link directory", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Option<Commands>,

    /// Database path (overrides DATABASE_PATH)
    #[arg(long, global = true)]
    database: Option<PathBuf>,

    /// Output format (text|json)
    #[arg(short, long, global = true, default_value = "text", value_parser = ["text", "json"])]
    format: String,

    /// Also write logs to a daily file in this directory
    #[arg(long, global = true)]
    log_dir: Option<PathBuf>,

    /// Export traces and metrics over OTLP
    #[arg(long, global = true)]
    otel: bool,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Probe sites that are due for a status check
    Check(BatchArgs),

    /// Fetch and classify pending sites
    Scan(BatchArgs),

    /// Classify one site regardless of eligibility
    ScanOne(IdArgs),

    /// Add a site to the directory
    Submit(SubmitArgs),

    /// Show a stored site
    Show(IdArgs),

    /// Show aggregate scan statistics
    Summary,
}

#[derive(Args, Debug)]
struct BatchArgs {
    /// Maximum number of sites to process (default 50 for check, 5 for scan)
    #[arg(short, long)]
    limit: Option<usize>,
}

#[derive(Args, Debug)]
struct IdArgs {
    /// Site ID
    #[arg(long)]
    id: i64,
}

#[derive(Args, Debug)]
struct SubmitArgs {
    /// Site URL
    #[arg(required = true)]
    url: String,

    /// Site title
    #[arg(short, long)]
    title: String,

    /// Site description
    #[arg(short, long, default_value = "")]
    description: String,

    /// Category ID
    #[arg(short, long)]
    category: Option<i64>,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    let _telemetry = telemetry::init_tracing_subscriber(&TelemetryOptions {
        log_dir: cli.log_dir.clone(),
        otel: cli.otel,
    })?;

    let Some(command) = cli.command else {
        let _ = Cli::parse_from(["sitecheck", "--help"]);
        return Ok(());
    };

    let mut settings = Settings::from_env()?;
    if let Some(path) = &cli.database {
        settings.database_path = path.to_string_lossy().to_string();
    }
    let runner = settings.build_runner().await?;

    let cancel = runner.cancellation_token();
    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            eprintln!("Stopping after the current site...");
            cancel.cancel();
        }
    });

    match command {
        Commands::Check(args) => check_command(&runner, args, &cli.format).await?,
        Commands::Scan(args) => scan_command(&runner, args, &cli.format).await?,
        Commands::ScanOne(args) => scan_one_command(&runner, args, &cli.format).await?,
        Commands::Submit(args) => submit_command(&runner, args, &cli.format).await?,
        Commands::Show(args) => show_command(&runner, args).await?,
        Commands::Summary => summary_command(&runner, &cli.format).await?,
    }

    Ok(())
}

fn spinner(message: String) -> anyhow::Result<ProgressBar> {
    let spinner = ProgressBar::new_spinner();
    spinner.set_style(ProgressStyle::default_spinner().template("{spinner:.green} {msg} [{elapsed}]")?);
    spinner.set_message(message);
    spinner.enable_steady_tick(Duration::from_millis(100));
    Ok(spinner)
}

fn emit_outcomes(outcomes: &[ItemOutcome], format: &str) -> anyhow::Result<()> {
    match format {
        "json" => println!("{}", serde_json::to_string_pretty(outcomes)?),
        _ => report::print_outcomes(outcomes)?,
    }
    Ok(())
}

#[instrument(skip(runner))]
async fn check_command<S: ResultStore, C: CompletionService>(
    runner: &BatchRunner<S, C>,
    args: BatchArgs,
    format: &str,
) -> anyhow::Result<()> {
    let limit = args.limit.unwrap_or(runner.config().status_limit);

    let progress = spinner(format!("Checking up to {} sites...", limit))?;
    let outcomes = runner.run_status_batch(limit).await;
    progress.finish_and_clear();

    emit_outcomes(&outcomes?, format)
}

#[instrument(skip(runner))]
async fn scan_command<S: ResultStore, C: CompletionService>(
    runner: &BatchRunner<S, C>,
    args: BatchArgs,
    format: &str,
) -> anyhow::Result<()> {
    let limit = args.limit.unwrap_or(runner.config().scan_limit);

    let progress = spinner(format!("Scanning up to {} sites...", limit))?;
    let outcomes = runner.run_scan_batch(limit).await;
    progress.finish_and_clear();

    emit_outcomes(&outcomes?, format)
}

#[instrument(skip(runner))]
async fn scan_one_command<S: ResultStore, C: CompletionService>(
    runner: &BatchRunner<S, C>,
    args: IdArgs,
    format: &str,
) -> anyhow::Result<()> {
    let progress = spinner(format!("Scanning site {}...", args.id))?;
    let outcome = runner.scan_one(args.id).await;
    progress.finish_and_clear();

    emit_outcomes(&[outcome?], format)
}

#[instrument(skip(runner))]
async fn submit_command<S: ResultStore, C: CompletionService>(
    runner: &BatchRunner<S, C>,
    args: SubmitArgs,
    format: &str,
) -> anyhow::Result<()> {
    let outcome = runner
        .submit(&args.url, &args.title, &args.description, args.category)
        .await?;

    emit_outcomes(&[outcome], format)
}

#[instrument(skip(runner))]
async fn show_command<C: CompletionService>(
    runner: &BatchRunner<sitecheck::store::Database, C>,
    args: IdArgs,
) -> anyhow::Result<()> {
    let record = runner
        .store()
        .get_submission(args.id)
        .await?
        .ok_or_else(|| anyhow!("Site {} not found", args.id))?;

    println!("{}", serde_json::to_string_pretty(&record)?);
    Ok(())
}

#[instrument(skip(runner))]
async fn summary_command<S: ResultStore, C: CompletionService>(
    runner: &BatchRunner<S, C>,
    format: &str,
) -> anyhow::Result<()> {
    let summary = runner.read_summary().await?;

    match format {
        "json" => println!("{}", serde_json::to_string_pretty(&summary)?),
        _ => report::print_summary(&summary)?,
    }
    Ok(())
}
