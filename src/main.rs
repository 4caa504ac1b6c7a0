use anyhow::Result;
use chrono::{Datelike, NaiveDate, Utc};
use clap::Parser;
use log::{error, info, warn};
use std::path::{Path, PathBuf};
use std::sync::Arc;

use node_accounting::api::Providers;
use node_accounting::cli::{Cli, Command};
use node_accounting::config::Config;
use node_accounting::export;
use node_accounting::fetch::{HttpTransport, TokioPause};
use node_accounting::jobs::{self, JobContext, JobSummary};
use node_accounting::logging;
use node_accounting::sheets::{DryRun, GoogleSheets, SheetClient};
use node_accounting::validation::parse_date;

const DEFAULT_CONFIG: &str = "config/config.toml";
const EXIT_INTERRUPTED: i32 = 130;

fn day_or_yesterday(date: &Option<String>) -> node_accounting::Result<NaiveDate> {
    match date {
        Some(date) => parse_date(date),
        None => Ok(jobs::previous_day(Utc::now())),
    }
}

fn google(config: &Config, providers: &Providers) -> Result<GoogleSheets> {
    let fetcher = providers.fetcher(HttpTransport::new()?);
    Ok(GoogleSheets::from_env(fetcher, &config.google)?)
}

async fn export_csv(
    config: &Config,
    providers: &Providers,
    start: &str,
    end: &str,
    only: Option<&str>,
    out_dir: &Path,
) -> Result<()> {
    let start = parse_date(start)?;
    let end = parse_date(end)?;
    export::check_range(start, end)?;
    let client = google(config, providers)?;
    let spreadsheet = client.open(&config.sheet_title(start.year())).await?;
    let files = export::export_ctc(spreadsheet.as_ref(), config, start, end, only, out_dir).await?;
    info!("Wrote {} CSV files", files.len());
    Ok(())
}

async fn run_job(command: &Command, dry_run: bool, config: &Config, providers: &Providers) -> Result<JobSummary> {
    let sheets: Box<dyn SheetClient> = if dry_run {
        info!("Dry run, results are printed instead of written");
        Box::new(DryRun)
    } else {
        Box::new(google(config, providers)?)
    };
    let ctx = JobContext::new(config, providers, sheets.as_ref());

    let summary = match command {
        Command::Balances => jobs::balances::run(&ctx, Utc::now()).await?,
        Command::Payments { date } => jobs::payments::run(&ctx, day_or_yesterday(date)?).await?,
        Command::Funding { date } => jobs::funding::run(&ctx, day_or_yesterday(date)?).await?,
        Command::Activity => jobs::activity::run(&ctx, Utc::now()).await?,
        Command::Prices { date } => jobs::prices::run(&ctx, day_or_yesterday(date)?).await?,
        Command::Export { .. } => return Err(anyhow::anyhow!("export does not write to the spreadsheet")),
    };
    Ok(summary)
}

async fn run(cli: Cli, config: Config) -> Result<()> {
    let providers = Providers::from_config(&config, Arc::new(TokioPause));

    if let Command::Export { start, end, sheet, out_dir } = &cli.command {
        return export_csv(&config, &providers, start, end, sheet.as_deref(), out_dir).await;
    }

    let summary = run_job(&cli.command, cli.dry_run, &config, &providers).await?;
    if summary.failed > 0 {
        warn!("Finished with failures: {}", summary);
    } else {
        info!("Finished: {}", summary);
    }
    Ok(())
}

#[tokio::main]
async fn main() -> Result<()> {
    dotenv::dotenv().ok();
    let cli = Cli::parse();

    match &cli.log_file {
        Some(path) => logging::init_file(path, cli.debug)?,
        None => logging::init_terminal(cli.debug),
    }

    let config_path = cli.config.clone().unwrap_or_else(|| PathBuf::from(DEFAULT_CONFIG));
    let config = match Config::load(&config_path) {
        Ok(cfg) => cfg,
        Err(e) => {
            error!("Failed to load configuration from {:?}: {}", config_path, e);
            return Err(anyhow::anyhow!("Configuration loading failed: {}", e));
        }
    };
    info!("Configuration loaded from {:?}", config_path);

    tokio::select! {
        result = run(cli, config) => {
            if let Err(e) = &result {
                error!("{:#}", e);
            }
            result
        }
        _ = tokio::signal::ctrl_c() => {
            warn!("Interrupted, stopping");
            log::logger().flush();
            std::process::exit(EXIT_INTERRUPTED);
        }
    }
}
