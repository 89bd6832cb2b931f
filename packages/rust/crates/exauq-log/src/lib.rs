//! exauq-log - Durable simulations log for submitted jobs
//!
//! A flat CSV table with header `Input_1, ..., Input_N, Output, Job_ID`.
//! A blank `Job_ID` marks a submission the hardware rejected; a blank
//! `Output` marks a result not yet known. The log is the recovery source of
//! truth for the job monitor: rows with a job id and no output are pending.
//!
//! # Architecture
//!
//! ```text
//! exauq-log/src/
//! ├── lib.rs      # Re-exports (this file)
//! ├── error.rs    # LogError enum
//! ├── layout.rs   # Header/column resolution, row parse & render
//! ├── record.rs   # Typed SimulationRecord
//! └── log.rs      # SimulationsLog operations
//! ```
//!
//! # Example
//!
//! ```rust,ignore
//! use exauq_log::SimulationsLog;
//!
//! let log = SimulationsLog::open("simulations.csv", 2)?;
//! log.append_record(&input, Some(&job_id))?;
//! log.record_result(&job_id, 3.5)?;
//! ```

mod error;
mod layout;
mod log;
mod record;

pub use error::LogError;
pub use log::SimulationsLog;
pub use record::SimulationRecord;
