//! Build the configured hardware backend from settings.

use std::sync::Arc;
use std::time::Duration;

use anyhow::{Context, Result, anyhow};
use exauq_hardware::{
    HardwareInterface, HttpConfig, HttpInterface, LocalProcessConfig, LocalProcessInterface,
    SlurmConfig, SlurmInterface,
};
use exauq_log::SimulationsLog;

use crate::settings::{BackendKind, HardwareSettings, HttpSettings, LocalSettings, SlurmSettings};

/// Instantiate the backend named by `hardware.backend` for use with `log`.
///
/// The local backend numbers its jobs after the largest id already in `log`.
pub fn build_interface(
    settings: &HardwareSettings,
    log: &SimulationsLog,
) -> Result<Arc<dyn HardwareInterface>> {
    let backend = settings
        .backend
        .ok_or_else(|| anyhow!("no hardware backend configured (set hardware.backend)"))?;
    tracing::debug!(?backend, "building hardware interface");
    let interface: Arc<dyn HardwareInterface> = match backend {
        BackendKind::Local => {
            let config = local_config(&settings.local)?;
            let first_id = log
                .max_job_number()?
                .map_or(1, |last| last.saturating_add(1));
            tracing::debug!(first_id, "local job numbering continues from the log");
            Arc::new(LocalProcessInterface::new(config).with_first_id(first_id))
        }
        BackendKind::Slurm => Arc::new(SlurmInterface::new(slurm_config(&settings.slurm)?)?),
        BackendKind::Http => Arc::new(HttpInterface::new(http_config(&settings.http)?)?),
    };
    Ok(interface)
}

fn local_config(settings: &LocalSettings) -> Result<LocalProcessConfig> {
    let program = settings
        .program
        .clone()
        .context("hardware.local.program is required for the local backend")?;
    let mut config = LocalProcessConfig::new(program);
    config.args = settings.args.clone().unwrap_or_default();
    config.working_dir.clone_from(&settings.working_dir);
    config.job_timeout = settings.job_timeout_secs.map(Duration::from_secs);
    Ok(config)
}

fn slurm_config(settings: &SlurmSettings) -> Result<SlurmConfig> {
    let script = settings
        .script
        .clone()
        .context("hardware.slurm.script is required for the slurm backend")?;
    let output_dir = settings
        .output_dir
        .clone()
        .context("hardware.slurm.output_dir is required for the slurm backend")?;
    let mut config = SlurmConfig::new(script, output_dir);
    if let Some(args) = &settings.sbatch_args {
        config.sbatch_args.clone_from(args);
    }
    if let Some(sbatch) = &settings.sbatch {
        config.sbatch.clone_from(sbatch);
    }
    if let Some(squeue) = &settings.squeue {
        config.squeue.clone_from(squeue);
    }
    if let Some(scancel) = &settings.scancel {
        config.scancel.clone_from(scancel);
    }
    if let Some(retries) = settings.num_retries {
        config.num_retries = retries;
    }
    if let Some(delay) = settings.retry_delay_secs {
        config.retry_delay = Duration::from_secs(delay);
    }
    Ok(config)
}

fn http_config(settings: &HttpSettings) -> Result<HttpConfig> {
    let base_url = settings
        .base_url
        .clone()
        .context("hardware.http.base_url is required for the http backend")?;
    let mut config = HttpConfig::new(base_url);
    if let Some(secs) = settings.timeout_secs {
        config.timeout = Duration::from_secs(secs.max(1));
    }
    config.bearer_token = settings.bearer_token.clone().or_else(|| {
        settings
            .bearer_token_env
            .as_deref()
            .and_then(|name| std::env::var(name).ok())
    });
    Ok(config)
}
