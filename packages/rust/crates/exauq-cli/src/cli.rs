use std::path::PathBuf;

use clap::{Parser, Subcommand, ValueEnum};
use exauq_cli::parse_coordinates;
use exauq_types::{JobId, JobStatus};

#[derive(Parser)]
#[command(name = "exauq")]
#[command(about = "Submit simulation jobs, record them in a simulations log, and collect their outputs.")]
pub(crate) struct Cli {
    /// Override config directory (settings are read from `<conf>/exauq/settings.yaml`).
    #[arg(long, global = true)]
    pub(crate) conf: Option<PathBuf>,

    /// Simulations log path (overrides `log.path`).
    #[arg(long, global = true)]
    pub(crate) log: Option<PathBuf>,

    /// Number of input coordinates (overrides `log.input_dim`).
    #[arg(long, global = true)]
    pub(crate) input_dim: Option<usize>,

    /// Hardware backend (overrides `hardware.backend`).
    #[arg(long, global = true, value_enum)]
    pub(crate) backend: Option<BackendArg>,

    /// Debug logging on stderr (ignored when `RUST_LOG` is set).
    #[arg(long, short, global = true)]
    pub(crate) verbose: bool,

    #[command(subcommand)]
    pub(crate) command: Command,
}

#[derive(Debug, Clone, Copy, ValueEnum)]
pub(crate) enum BackendArg {
    Local,
    Slurm,
    Http,
}

#[derive(Subcommand)]
pub(crate) enum Command {
    /// Submit simulations and print their job ids.
    Submit {
        /// Comma-separated coordinates, e.g. `1.0,2.5`. Repeat for a batch.
        #[arg(long = "input", required = true, value_parser = parse_input)]
        inputs: Vec<Coordinates>,

        /// Block until every submitted job has an output or has ended.
        /// Always on for the local backend, whose jobs end with this process.
        #[arg(long)]
        wait: bool,
    },
    /// Print records from the simulations log.
    Jobs {
        /// Only these job ids. Repeatable.
        #[arg(long = "job-id")]
        job_ids: Vec<JobId>,

        /// Only these statuses (`completed`, `submitted`, `failed_submit`). Repeatable.
        #[arg(long = "status")]
        statuses: Vec<JobStatus>,

        /// Emit JSON instead of a table.
        #[arg(long)]
        json: bool,
    },
    /// Resume pending jobs from the log and wait until they are reconciled.
    Watch,
}

/// One `--input` value.
#[derive(Debug, Clone)]
pub(crate) struct Coordinates(pub(crate) Vec<f64>);

fn parse_input(text: &str) -> Result<Coordinates, String> {
    parse_coordinates(text).map(Coordinates)
}
