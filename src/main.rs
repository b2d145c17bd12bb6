use std::path::PathBuf;
use std::process::ExitCode;

use anyhow::{bail, Context, Result};
use chrono::NaiveDate;
use clap::{Parser, Subcommand};
use log::info;
use tokio::sync::mpsc;

use jira_api::{JiraClient, JiraConfig};
use jira_autolog::engine::{AutologEngine, Event, RunSummary};
use jira_autolog::settings::{Settings, SettingsManager};

#[derive(Parser)]
#[command(name = "jira-autolog", version, about = "Automatic Jira work-log filler")]
struct Cli {
    /// Path to the settings file
    #[arg(long, global = true, value_name = "PATH")]
    config: Option<PathBuf>,

    /// Enable debug logging
    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Write a default settings file
    Init {
        /// Overwrite an existing settings file
        #[arg(long)]
        force: bool,
    },
    /// Fill work logs for a date range
    Run {
        /// First date of the range (YYYY-MM-DD)
        #[arg(long)]
        from: NaiveDate,
        /// Last date of the range, inclusive (YYYY-MM-DD)
        #[arg(long)]
        to: NaiveDate,
        /// Plan allocations without creating worklogs
        #[arg(long)]
        dry_run: bool,
    },
}

fn setup_logging(verbose: bool) {
    let mut builder = env_logger::Builder::from_default_env();
    if verbose {
        builder.filter_level(log::LevelFilter::Debug);
    }
    builder.init();
}

fn settings_manager(config: Option<PathBuf>) -> Result<SettingsManager> {
    match config {
        Some(path) => Ok(SettingsManager::at(path)),
        None => SettingsManager::from_default_location()
            .context("could not resolve the default settings location"),
    }
}

#[tokio::main]
async fn main() -> ExitCode {
    let cli = Cli::parse();
    setup_logging(cli.verbose);

    match execute(cli).await {
        Ok(code) => code,
        Err(err) => {
            eprintln!("error: {err:#}");
            ExitCode::FAILURE
        }
    }
}

async fn execute(cli: Cli) -> Result<ExitCode> {
    let manager = settings_manager(cli.config)?;

    match cli.command {
        Commands::Init { force } => {
            if manager.exists() && !force {
                bail!(
                    "settings file {} already exists (use --force to overwrite)",
                    manager.path().display()
                );
            }
            manager.save(&Settings::default())?;
            println!("Wrote default settings to {}", manager.path().display());
            println!("Fill in jira_host, jira_user and jira_pass before running.");
            Ok(ExitCode::SUCCESS)
        }
        Commands::Run { from, to, dry_run } => {
            if from > to {
                bail!("--from {from} is after --to {to}");
            }

            let settings = manager
                .load()
                .with_context(|| format!("failed to load {}", manager.path().display()))?;
            settings.validate()?;

            let config = JiraConfig::new(
                settings.jira_host.clone(),
                settings.jira_user.clone(),
                settings.jira_pass.clone(),
            );
            let client = JiraClient::new(config)?;

            let (events, mut receiver) = mpsc::unbounded_channel();
            let engine = AutologEngine::new(client, settings, events).dry_run(dry_run);
            let worker = tokio::spawn(async move { engine.run(from, to).await });

            while let Some(event) = receiver.recv().await {
                match event {
                    Event::Info(message) => println!("{message}"),
                    Event::Warn(message) => println!("warning: {message}"),
                    Event::Error(message) => eprintln!("error: {message}"),
                }
            }

            let summary = worker.await.context("autolog task panicked")?;
            report_summary(&summary, dry_run);
            Ok(if summary.failures == 0 {
                ExitCode::SUCCESS
            } else {
                ExitCode::FAILURE
            })
        }
    }
}

fn report_summary(summary: &RunSummary, dry_run: bool) {
    info!(
        "run finished: {} date(s), {} worklog(s), {} failure(s)",
        summary.dates_processed, summary.worklogs_created, summary.failures
    );
    if dry_run {
        println!(
            "Dry run over {} date(s) finished, nothing was created.",
            summary.dates_processed
        );
    } else {
        println!(
            "Created {} worklog(s) across {} date(s), {} failure(s).",
            summary.worklogs_created, summary.dates_processed, summary.failures
        );
    }
}
