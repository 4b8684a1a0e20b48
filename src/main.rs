use std::path::{Path, PathBuf};
use std::sync::Arc;

use anyhow::Context;
use clap::{Parser, Subcommand};
use tracing::info;

use app_version_audit::catalog::HomebrewCatalog;
use app_version_audit::catalog::homebrew::DEFAULT_BASE_URL;
use app_version_audit::config::{AuditConfig, log_path};
use app_version_audit::inventory::{exclude_managed, load_inventory};
use app_version_audit::pipeline::{AppStatus, ApplicationRecord, AuditPipeline, BatchEvent};

#[derive(Parser)]
#[command(name = "app-version-audit")]
#[command(version, about = "Find installed applications that are behind the package catalog")]
struct Cli {
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Check an inventory file against the Homebrew cask catalog
    Check {
        /// JSON array of {"name", "version"} objects
        inventory: PathBuf,

        /// JSON config file (camelCase keys)
        #[arg(long)]
        config: Option<PathBuf>,

        #[arg(long)]
        batch_size: Option<usize>,

        #[arg(long)]
        workers: Option<usize>,

        /// Names already managed by the catalog; matching apps are skipped
        #[arg(long, num_args = 1..)]
        managed: Vec<String>,

        #[arg(long)]
        catalog_url: Option<String>,

        /// Write logs here instead of stderr
        #[arg(long)]
        log_file: Option<PathBuf>,

        /// Write logs to the default data directory
        #[arg(long, conflicts_with = "log_file")]
        log_to_data_dir: bool,
    },
}

struct CheckArgs {
    inventory: PathBuf,
    config: Option<PathBuf>,
    batch_size: Option<usize>,
    workers: Option<usize>,
    managed: Vec<String>,
    catalog_url: Option<String>,
}

fn load_config(path: Option<&Path>) -> anyhow::Result<AuditConfig> {
    match path {
        Some(path) => AuditConfig::load(path)
            .with_context(|| format!("Failed to load config from {}", path.display())),
        None => Ok(AuditConfig::default()),
    }
}

fn format_progress(event: &BatchEvent) -> String {
    format!(
        "[{}/{}] checked {} apps, {} outdated",
        event.batch_index + 1,
        event.total_batches,
        event.processed,
        event.outdated
    )
}

fn format_record(record: &ApplicationRecord) -> String {
    let latest = record.latest_version.as_deref().unwrap_or("-");
    match record.status {
        AppStatus::Error => format!(
            "{}\t{}\terror: {}",
            record.name,
            record.installed_version,
            record.error.as_deref().unwrap_or("unknown error")
        ),
        status => format!(
            "{}\t{} -> {}\t{}",
            record.name, record.installed_version, latest, status
        ),
    }
}

async fn run_check(args: CheckArgs) -> anyhow::Result<()> {
    let mut config = load_config(args.config.as_deref())?;
    if let Some(batch_size) = args.batch_size {
        config.batch_size = batch_size;
    }
    if let Some(workers) = args.workers {
        config.max_workers = workers;
    }

    let apps = load_inventory(&args.inventory)
        .with_context(|| format!("Failed to load inventory {}", args.inventory.display()))?;
    let apps = exclude_managed(apps, &args.managed, config.match_threshold);

    let catalog_url = args.catalog_url.as_deref().unwrap_or(DEFAULT_BASE_URL);
    let catalog = HomebrewCatalog::with_timeout(catalog_url, config.lookup_timeout());

    let (sender, mut receiver) = tokio::sync::mpsc::unbounded_channel::<BatchEvent>();
    let progress = tokio::spawn(async move {
        while let Some(event) = receiver.recv().await {
            eprintln!("{}", format_progress(&event));
        }
    });

    let pipeline = AuditPipeline::new(Arc::new(catalog), config).with_progress(sender);
    let records = pipeline.check_outdated(apps).await?;
    drop(pipeline);
    progress.await?;

    let outdated = records
        .iter()
        .filter(|r| r.status == AppStatus::Outdated)
        .count();
    for record in &records {
        println!("{}", format_record(record));
    }
    info!("{} of {} applications are outdated", outdated, records.len());

    Ok(())
}

fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    match cli.command {
        Command::Check {
            inventory,
            config,
            batch_size,
            workers,
            managed,
            catalog_url,
            log_file,
            log_to_data_dir,
        } => {
            let log_file = log_file.or_else(|| log_to_data_dir.then(log_path));
            let _guard = app_version_audit::logging::init(log_file.as_deref())?;

            tokio::runtime::Builder::new_multi_thread()
                .enable_all()
                .build()?
                .block_on(run_check(CheckArgs {
                    inventory,
                    config,
                    batch_size,
                    workers,
                    managed,
                    catalog_url,
                }))
        }
    }
}
