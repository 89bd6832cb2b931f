//! exauq-hardware - Hardware interfaces for simulation jobs
//!
//! Provides the [`HardwareInterface`] capability trait consumed by the job
//! manager, with one implementation per kind of compute resource:
//! - Local child processes
//! - Slurm clusters (`sbatch`/`squeue`/`scancel`)
//! - JSON/HTTP simulation services

mod error;
mod http;
mod interface;
mod local;
mod slurm;

pub use error::{HardwareError, Result};
pub use http::{HttpConfig, HttpInterface};
pub use interface::HardwareInterface;
pub use local::{LocalProcessConfig, LocalProcessInterface};
pub use slurm::{SlurmConfig, SlurmInterface};
