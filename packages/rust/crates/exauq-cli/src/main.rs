//! exauq CLI: submit simulations, list the simulations log, watch pending jobs.
//!
//! Settings come from `packages/conf/exauq.yaml` under `PRJ_ROOT`, overridden by
//! `<config home>/exauq/settings.yaml`, overridden by command-line flags.
//!
//! Logging: set `RUST_LOG=exauq=debug` (or `warn`, `trace`) to adjust stderr output.

mod cli;

use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::Parser;
use exauq_cli::{BackendKind, ExauqSettings, build_interface, load_settings};
use exauq_jobs::{App, BatchError};
use exauq_log::{SimulationRecord, SimulationsLog};
use exauq_types::{JobId, JobStatus, format_real};
use tracing_subscriber::EnvFilter;

use crate::cli::{BackendArg, Cli, Command, Coordinates};

const DEFAULT_LOG_PATH: &str = "simulations.csv";

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    // RUST_LOG overrides; --verbose => debug; else info
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| {
        EnvFilter::new(if cli.verbose { "exauq=debug" } else { "exauq=info" })
    });
    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .try_init();

    let mut settings = load_settings(cli.conf.as_deref());
    apply_overrides(&mut settings, &cli);

    match cli.command {
        Command::Submit { inputs, wait } => run_submit(&settings, inputs, wait).await,
        Command::Jobs {
            job_ids,
            statuses,
            json,
        } => run_jobs(&settings, job_ids, statuses, json).await,
        Command::Watch => run_watch(&settings).await,
    }
}

fn apply_overrides(settings: &mut ExauqSettings, cli: &Cli) {
    if let Some(path) = &cli.log {
        settings.log.path = Some(path.clone());
    }
    if let Some(dim) = cli.input_dim {
        settings.log.input_dim = Some(dim);
    }
    if let Some(backend) = cli.backend {
        settings.hardware.backend = Some(match backend {
            BackendArg::Local => BackendKind::Local,
            BackendArg::Slurm => BackendKind::Slurm,
            BackendArg::Http => BackendKind::Http,
        });
    }
}

fn log_location(settings: &ExauqSettings) -> Result<(PathBuf, usize)> {
    let path = settings
        .log
        .path
        .clone()
        .unwrap_or_else(|| PathBuf::from(DEFAULT_LOG_PATH));
    let input_dim = settings
        .log
        .input_dim
        .context("input dimension unknown: pass --input-dim or set log.input_dim")?;
    Ok((path, input_dim))
}

async fn open_log(settings: &ExauqSettings) -> Result<SimulationsLog> {
    let (path, input_dim) = log_location(settings)?;
    let log = tokio::task::spawn_blocking(move || {
        SimulationsLog::open(&path, input_dim)
            .with_context(|| format!("failed to open simulations log {}", path.display()))
    })
    .await??;
    Ok(log)
}

async fn start_app(settings: &ExauqSettings) -> Result<App> {
    let log = open_log(settings).await?;
    let interface = build_interface(&settings.hardware, &log)?;
    let mut config = settings.jobs.to_config();
    // Waiting is driven by the subcommand so Ctrl+C stays responsive.
    config.wait_for_pending = false;
    let path = log.path().to_path_buf();
    let app = App::with_log(log, interface, config)
        .await
        .with_context(|| format!("failed to start job manager on {}", path.display()))?;
    Ok(app)
}

async fn wait_or_interrupt(app: &App) {
    tokio::select! {
        () = app.manager().wait_for_idle() => {}
        result = tokio::signal::ctrl_c() => {
            if let Err(error) = result {
                tracing::warn!(error = %error, "failed to listen for ctrl-c");
            }
            tracing::warn!("interrupted; pending jobs stay in the log for the next run");
        }
    }
}

async fn run_submit(settings: &ExauqSettings, inputs: Vec<Coordinates>, wait: bool) -> Result<()> {
    // Local jobs are children of this process and die with it.
    let wait = wait || settings.hardware.backend == Some(BackendKind::Local);
    let app = start_app(settings).await?;
    let batch: Vec<Vec<f64>> = inputs.into_iter().map(|coords| coords.0).collect();

    let (jobs, failure) = match app.submit(&batch).await {
        Ok(jobs) => (jobs, None),
        Err(BatchError { submitted, source }) => (submitted, Some(source)),
    };
    for job in &jobs {
        println!("{}\t{}", job.id(), job.input());
    }
    if wait && !jobs.is_empty() {
        wait_or_interrupt(&app).await;
    }
    app.shutdown().await?;
    if let Some(error) = failure {
        return Err(anyhow::Error::new(error).context(format!(
            "submission failed after {} job(s) were submitted",
            jobs.len()
        )));
    }
    Ok(())
}

async fn run_watch(settings: &ExauqSettings) -> Result<()> {
    let app = start_app(settings).await?;
    let pending = app.manager().pending_jobs().await;
    if pending.is_empty() {
        println!("no pending jobs");
    } else {
        tracing::info!(pending = pending.len(), "watching pending jobs");
        wait_or_interrupt(&app).await;
    }
    app.shutdown().await?;

    let remaining = app.get_jobs(None, Some(vec![JobStatus::Submitted])).await?;
    println!("{} job(s) still pending", remaining.len());
    Ok(())
}

async fn run_jobs(
    settings: &ExauqSettings,
    job_ids: Vec<JobId>,
    statuses: Vec<JobStatus>,
    json: bool,
) -> Result<()> {
    let log = open_log(settings).await?;
    let records = tokio::task::spawn_blocking(move || -> Result<Vec<SimulationRecord>> {
        let job_ids = (!job_ids.is_empty()).then_some(job_ids);
        let statuses = (!statuses.is_empty()).then_some(statuses);
        Ok(log.get_records(job_ids.as_deref(), statuses.as_deref())?)
    })
    .await??;

    if json {
        println!("{}", serde_json::to_string_pretty(&records)?);
        return Ok(());
    }
    println!("JOB_ID\tSTATUS\tOUTPUT\tINPUT");
    for record in &records {
        println!(
            "{}\t{}\t{}\t{}",
            record.job_id.as_ref().map_or("-", JobId::as_str),
            record.status(),
            record.output.map_or_else(|| "-".to_string(), format_real),
            record.input
        );
    }
    Ok(())
}
