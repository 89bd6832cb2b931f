//! exauq-types - Shared value types for simulation job management
//!
//! This crate provides the data structures passed between the hardware
//! backends, the simulations log and the job manager.
//!
//! # Architecture
//!
//! ```text
//! exauq-types/src/
//! ├── lib.rs      # Re-exports (this file)
//! ├── error.rs    # ValidationError enum
//! ├── input.rs    # Input coordinates + real-number text form
//! ├── job.rs      # JobId and Job
//! └── status.rs   # JobStatus
//! ```

mod error;
mod input;
mod job;
mod status;

pub use error::ValidationError;
pub use input::{Input, format_real};
pub use job::{Job, JobId};
pub use status::JobStatus;
