//! Job manager: submission recording, pending-set, background monitor.

mod core;
mod types;

pub use core::JobManager;
pub use types::{JobManagerConfig, MonitorPhase};
