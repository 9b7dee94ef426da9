//! jobwatch CLI
//!
//! Local execution entry point. For AWS Lambda, use `jobwatch-lambda`.

use std::fs::OpenOptions;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use clap::{Parser, Subcommand};
use jobwatch::{
    config::load_config,
    error::Result,
    models::Config,
    notify::{LogNotifier, NotificationSink, sink_from_config},
    pipeline::{CycleReport, CycleRunner, SourceStatus, top_jobs},
    storage::{MemoryStorage, SeenStore, store_from_config},
    utils::log as console,
};

/// jobwatch - career page watcher
#[derive(Parser, Debug)]
#[command(
    name = "jobwatch",
    version,
    about = "Watches company career pages and alerts on new job postings"
)]
struct Cli {
    /// Path to the configuration file
    #[arg(short, long, default_value = "config.toml")]
    config: PathBuf,

    /// Enable verbose logging
    #[arg(short, long)]
    verbose: bool,

    /// Suppress console summaries
    #[arg(short, long)]
    quiet: bool,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Run one cycle: extract, reconcile, notify, persist
    Run {
        /// Reconcile against a copy of the state and only log the digest
        #[arg(long)]
        dry_run: bool,
    },

    /// Serve the HTTP API, running cycles on the configured schedule
    #[cfg(feature = "server")]
    Serve,

    /// Print the keyword-filtered listing from the stored state
    Top,

    /// Validate the configuration file
    Validate,

    /// Show the stored state
    Info,

    /// Write a default configuration file
    InitConfig {
        /// Overwrite an existing file
        #[arg(long)]
        force: bool,
    },
}

/// Initialize logging based on verbosity flag and the configured level.
fn init_logging(verbose: bool, config: Option<&Config>) {
    let level = match (verbose, config) {
        (true, _) => "debug",
        (false, Some(config)) => config.logging.level.as_str(),
        (false, None) => "info",
    };
    let mut builder =
        env_logger::Builder::from_env(env_logger::Env::default().default_filter_or(level));
    builder.format_timestamp_secs();

    if let Some(path) = config.and_then(|c| c.logging.file.as_deref()) {
        match OpenOptions::new().create(true).append(true).open(path) {
            Ok(file) => {
                let tee = console::TeeWriter::new(std::io::stderr(), file);
                builder.target(env_logger::Target::Pipe(Box::new(tee)));
            }
            Err(e) => eprintln!("Cannot open log file {}: {}. Logging to stderr.", path, e),
        }
    }
    builder.init();
}

/// Main entry point for the CLI application.
#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();
    console::set_quiet(cli.quiet);

    if let Command::InitConfig { force } = cli.command {
        init_logging(cli.verbose, None);
        return init_config(&cli.config, force);
    }

    let config = load_config(&cli.config);
    init_logging(cli.verbose, config.as_ref().ok());
    let config = match config {
        Ok(config) => config,
        Err(e) => {
            log::error!("Config validation failed: {}", e);
            return Err(e);
        }
    };
    log::info!("Loaded configuration from {}", cli.config.display());

    match cli.command {
        Command::Run { dry_run } => {
            let report = run_once(&config, dry_run).await?;
            print_report(&report);
            if !report.persisted {
                console::warn("Seen state was not saved; the next cycle will alert on these jobs again");
            }
        }

        #[cfg(feature = "server")]
        Command::Serve => serve_forever(config).await?,

        Command::Top => {
            let store = store_from_config(&config.storage).await?;
            let state = store.load().await?;
            let top = top_jobs(&state, &config.server.top_keywords);
            console::header(&format!("Top jobs ({})", top.count));
            for job in &top.jobs {
                console::sub_item(&format!(
                    "{} | {} | {} [{}]",
                    job.company,
                    job.title,
                    job.link,
                    job.filters.join(", ")
                ));
            }
        }

        Command::Validate => {
            log::info!("Validating configuration...");
            console::success(&format!(
                "Config OK: {} sources enabled ({})",
                config.sources.enabled.len(),
                config.sources.enabled.join(", ")
            ));
            if config.notify.enabled && !config.notify.email_ready() {
                console::warn("Email is enabled but SMTP host or sender is missing; alerts go to the log");
            }
        }

        Command::Info => {
            let store = store_from_config(&config.storage).await?;
            let state = store.load().await?;
            console::summary(
                &format!("Seen state at {}", store.describe()),
                &[
                    ("Sources", state.source_count().to_string()),
                    ("Jobs", state.total_jobs().to_string()),
                ],
            );
            for (source, jobs) in state.iter() {
                console::sub_item(&format!("{}: {} jobs", source, jobs.len()));
            }
        }

        // handled before the config is loaded
        Command::InitConfig { .. } => {}
    }

    log::info!("Done!");
    Ok(())
}

fn init_config(path: &Path, force: bool) -> Result<()> {
    if path.exists() && !force {
        log::warn!(
            "Config already exists at {}. Use --force to overwrite.",
            path.display()
        );
        return Ok(());
    }
    std::fs::write(path, Config::default().to_toml()?)?;
    console::success(&format!("Wrote default configuration to {}", path.display()));
    Ok(())
}

async fn run_once(config: &Config, dry_run: bool) -> Result<CycleReport> {
    let store = store_from_config(&config.storage).await?;

    let (store, sink): (Arc<dyn SeenStore>, Arc<dyn NotificationSink>) = if dry_run {
        log::warn!("Dry run: {} will not be written", store.describe());
        let state = store.load().await?;
        (
            Arc::new(MemoryStorage::with_state(state)),
            Arc::new(LogNotifier::new()),
        )
    } else {
        (store, sink_from_config(&config.notify)?)
    };

    let runner = CycleRunner::from_config(config, store, sink)?;
    console::step(1, 1, &format!("Running cycle over {} sources", runner.registry().len()));
    Ok(runner.run_cycle().await)
}

#[cfg(feature = "server")]
async fn serve_forever(config: Config) -> Result<()> {
    use jobwatch::pipeline::run_every;
    use jobwatch::server::{AppState, serve};
    use tokio_util::sync::CancellationToken;

    let store = store_from_config(&config.storage).await?;
    let sink = sink_from_config(&config.notify)?;
    let runner = Arc::new(CycleRunner::from_config(&config, store, sink)?);
    let shutdown = CancellationToken::new();

    let ctrl_c = shutdown.clone();
    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            log::info!("Shutdown requested");
            ctrl_c.cancel();
        }
    });

    let scheduler = config.schedule.interval().map(|interval| {
        log::info!("Scheduling a cycle every {}s", interval.as_secs());
        tokio::spawn(run_every(Arc::clone(&runner), interval, shutdown.clone()))
    });

    let state = Arc::new(AppState::new(runner, Arc::new(config), shutdown.clone()));
    let served = serve(state, shutdown.clone()).await;
    shutdown.cancel();

    if let Some(handle) = scheduler {
        if let Err(e) = handle.await {
            log::error!("Scheduler task failed: {}", e);
        }
    }
    served
}

fn print_report(report: &CycleReport) {
    console::summary(
        "Cycle",
        &[
            ("Status", format!("{:?}", report.status())),
            ("New jobs", report.total_new().to_string()),
            ("Duration", format!("{:.2}s", report.duration().as_secs_f64())),
            ("Notified", report.notified.to_string()),
            ("Persisted", report.persisted.to_string()),
        ],
    );
    for source in &report.sources {
        match &source.status {
            SourceStatus::Succeeded {
                found,
                new,
                updated,
                stale,
            } => console::sub_item(&format!(
                "{}: {} found, {} new, {} updated, {} stale",
                source.source, found, new, updated, stale
            )),
            SourceStatus::Failed { reason } => {
                console::warn(&format!("{}: failed ({})", source.source, reason))
            }
        }
    }
}
