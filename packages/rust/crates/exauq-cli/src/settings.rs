//! Runtime settings loader for the `exauq` CLI.
//!
//! Loads and merges:
//! - System defaults: `<PRJ_ROOT>/packages/conf/exauq.yaml`
//! - User overrides:  `<PRJ_CONFIG_HOME>/exauq/settings.yaml`
//!
//! Merge precedence is user over system.

use std::io::ErrorKind;
use std::path::{Path, PathBuf};

use exauq_jobs::JobManagerConfig;
use serde::Deserialize;

const DEFAULT_SYSTEM_SETTINGS_RELATIVE_PATH: &str = "packages/conf/exauq.yaml";
const DEFAULT_USER_SETTINGS_RELATIVE_PATH: &str = "exauq/settings.yaml";
const DEFAULT_CONFIG_HOME_RELATIVE_PATH: &str = ".config";

/// Merged settings file contents. Every field is optional so a user file can
/// override single values of the system file.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct ExauqSettings {
    /// Simulations log location and shape.
    #[serde(default)]
    pub log: LogSettings,
    /// Job manager tuning.
    #[serde(default)]
    pub jobs: JobsSettings,
    /// Hardware backend selection.
    #[serde(default)]
    pub hardware: HardwareSettings,
}

/// `log:` section.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct LogSettings {
    /// CSV file path.
    pub path: Option<PathBuf>,
    /// Number of input coordinates per simulation.
    pub input_dim: Option<usize>,
}

/// `jobs:` section.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct JobsSettings {
    /// Monitor polling interval.
    pub polling_interval_ms: Option<u64>,
    /// Block on start until recovered jobs are reconciled.
    pub wait_for_pending: Option<bool>,
    /// Consecutive poll failures before a job is dropped.
    pub max_poll_failures: Option<u32>,
    /// Shutdown wait bound; `0` waits without limit.
    pub shutdown_timeout_secs: Option<u64>,
}

/// Which hardware backend runs the simulations.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum BackendKind {
    /// One child process per job on this machine.
    Local,
    /// Slurm batch jobs.
    Slurm,
    /// Remote JSON/HTTP service.
    Http,
}

/// `hardware:` section.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct HardwareSettings {
    /// Selected backend.
    pub backend: Option<BackendKind>,
    /// `hardware.local:` settings.
    #[serde(default)]
    pub local: LocalSettings,
    /// `hardware.slurm:` settings.
    #[serde(default)]
    pub slurm: SlurmSettings,
    /// `hardware.http:` settings.
    #[serde(default)]
    pub http: HttpSettings,
}

/// `hardware.local:` section.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct LocalSettings {
    /// Simulator executable.
    pub program: Option<String>,
    /// Arguments placed before the coordinates.
    pub args: Option<Vec<String>>,
    /// Working directory of each job.
    pub working_dir: Option<PathBuf>,
    /// Per-job wall-clock limit.
    pub job_timeout_secs: Option<u64>,
}

/// `hardware.slurm:` section.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct SlurmSettings {
    /// Batch script wrapping the simulator.
    pub script: Option<PathBuf>,
    /// Directory for per-job output files.
    pub output_dir: Option<PathBuf>,
    /// Extra `sbatch` arguments.
    pub sbatch_args: Option<Vec<String>>,
    /// `sbatch` executable.
    pub sbatch: Option<String>,
    /// `squeue` executable.
    pub squeue: Option<String>,
    /// `scancel` executable.
    pub scancel: Option<String>,
    /// Attempts per scheduler command.
    pub num_retries: Option<usize>,
    /// Delay between attempts.
    pub retry_delay_secs: Option<u64>,
}

/// `hardware.http:` section.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct HttpSettings {
    /// Service base URL.
    pub base_url: Option<String>,
    /// Per-request timeout.
    pub timeout_secs: Option<u64>,
    /// Literal bearer token.
    pub bearer_token: Option<String>,
    /// Environment variable holding the bearer token.
    pub bearer_token_env: Option<String>,
}

impl ExauqSettings {
    fn merge(self, overlay: Self) -> Self {
        Self {
            log: self.log.merge(overlay.log),
            jobs: self.jobs.merge(overlay.jobs),
            hardware: self.hardware.merge(overlay.hardware),
        }
    }
}

impl LogSettings {
    fn merge(self, overlay: Self) -> Self {
        Self {
            path: overlay.path.or(self.path),
            input_dim: overlay.input_dim.or(self.input_dim),
        }
    }
}

impl JobsSettings {
    fn merge(self, overlay: Self) -> Self {
        Self {
            polling_interval_ms: overlay.polling_interval_ms.or(self.polling_interval_ms),
            wait_for_pending: overlay.wait_for_pending.or(self.wait_for_pending),
            max_poll_failures: overlay.max_poll_failures.or(self.max_poll_failures),
            shutdown_timeout_secs: overlay
                .shutdown_timeout_secs
                .or(self.shutdown_timeout_secs),
        }
    }

    /// Manager config with unset fields taken from [`JobManagerConfig::default`].
    #[must_use]
    pub fn to_config(&self) -> JobManagerConfig {
        let defaults = JobManagerConfig::default();
        JobManagerConfig {
            polling_interval_ms: self
                .polling_interval_ms
                .unwrap_or(defaults.polling_interval_ms),
            wait_for_pending: self.wait_for_pending.unwrap_or(defaults.wait_for_pending),
            max_poll_failures: self.max_poll_failures.unwrap_or(defaults.max_poll_failures),
            shutdown_timeout_secs: match self.shutdown_timeout_secs {
                Some(0) => None,
                Some(secs) => Some(secs),
                None => defaults.shutdown_timeout_secs,
            },
        }
    }
}

impl HardwareSettings {
    fn merge(self, overlay: Self) -> Self {
        Self {
            backend: overlay.backend.or(self.backend),
            local: self.local.merge(overlay.local),
            slurm: self.slurm.merge(overlay.slurm),
            http: self.http.merge(overlay.http),
        }
    }
}

impl LocalSettings {
    fn merge(self, overlay: Self) -> Self {
        Self {
            program: overlay.program.or(self.program),
            args: overlay.args.or(self.args),
            working_dir: overlay.working_dir.or(self.working_dir),
            job_timeout_secs: overlay.job_timeout_secs.or(self.job_timeout_secs),
        }
    }
}

impl SlurmSettings {
    fn merge(self, overlay: Self) -> Self {
        Self {
            script: overlay.script.or(self.script),
            output_dir: overlay.output_dir.or(self.output_dir),
            sbatch_args: overlay.sbatch_args.or(self.sbatch_args),
            sbatch: overlay.sbatch.or(self.sbatch),
            squeue: overlay.squeue.or(self.squeue),
            scancel: overlay.scancel.or(self.scancel),
            num_retries: overlay.num_retries.or(self.num_retries),
            retry_delay_secs: overlay.retry_delay_secs.or(self.retry_delay_secs),
        }
    }
}

impl HttpSettings {
    fn merge(self, overlay: Self) -> Self {
        Self {
            base_url: overlay.base_url.or(self.base_url),
            timeout_secs: overlay.timeout_secs.or(self.timeout_secs),
            bearer_token: overlay.bearer_token.or(self.bearer_token),
            bearer_token_env: overlay.bearer_token_env.or(self.bearer_token_env),
        }
    }
}

/// Load system and user settings; `config_home` replaces `PRJ_CONFIG_HOME`.
pub fn load_settings(config_home: Option<&Path>) -> ExauqSettings {
    let (system_path, user_path) = settings_paths(config_home);
    load_settings_from_paths(&system_path, &user_path)
}

/// `(system, user)` settings file paths.
///
/// Relative locations resolve against `PRJ_ROOT`, or the current directory.
pub fn settings_paths(config_home: Option<&Path>) -> (PathBuf, PathBuf) {
    let root = env_path("PRJ_ROOT")
        .or_else(|| std::env::current_dir().ok())
        .unwrap_or_default();
    let config_home = config_home
        .map(Path::to_path_buf)
        .or_else(|| env_path("PRJ_CONFIG_HOME"))
        .unwrap_or_else(|| PathBuf::from(DEFAULT_CONFIG_HOME_RELATIVE_PATH));
    (
        root.join(DEFAULT_SYSTEM_SETTINGS_RELATIVE_PATH),
        root.join(config_home).join(DEFAULT_USER_SETTINGS_RELATIVE_PATH),
    )
}

/// Load and merge two settings files, `user` taking precedence.
pub fn load_settings_from_paths(system: &Path, user: &Path) -> ExauqSettings {
    load_one(system).merge(load_one(user))
}

fn env_path(name: &str) -> Option<PathBuf> {
    std::env::var(name)
        .ok()
        .filter(|value| !value.trim().is_empty())
        .map(|value| PathBuf::from(value.trim()))
}

/// A missing file is empty; an unreadable or invalid one is skipped with a warning.
fn load_one(path: &Path) -> ExauqSettings {
    let raw = match std::fs::read_to_string(path) {
        Ok(raw) => raw,
        Err(error) if error.kind() == ErrorKind::NotFound => return ExauqSettings::default(),
        Err(error) => {
            tracing::warn!(path = %path.display(), error = %error, "failed to read settings file; ignoring");
            return ExauqSettings::default();
        }
    };
    serde_yaml::from_str(&raw).unwrap_or_else(|error| {
        tracing::warn!(path = %path.display(), error = %error, "invalid settings yaml; ignoring file");
        ExauqSettings::default()
    })
}
