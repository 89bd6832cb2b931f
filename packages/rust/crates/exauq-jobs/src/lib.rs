//! exauq-jobs - Simulation job lifecycle management
//!
//! The [`JobManager`] submits inputs to a hardware interface, records every
//! attempt in the simulations log, and runs one background monitor that
//! polls pending jobs and writes their outputs back to the log. Pending
//! jobs left in the log by an earlier run are resumed on start.
//!
//! # Architecture
//!
//! ```text
//! exauq-jobs/src/
//! ├── lib.rs              # Re-exports (this file)
//! ├── error.rs            # ManagerError, BatchError
//! ├── manager/
//! │   ├── types.rs        # JobManagerConfig, MonitorPhase, pending-set
//! │   └── core/
//! │       ├── mod.rs      # start, submit, shutdown, accessors
//! │       └── monitor.rs  # background polling loop
//! ├── simulator.rs        # Memoising Simulator
//! └── app.rs              # App facade
//! ```
//!
//! # Example
//!
//! ```rust,ignore
//! let app = App::start(interface, 2, "simulations.csv", JobManagerConfig::default()).await?;
//! let jobs = app.submit(&[vec![1.0, 2.0]]).await?;
//! app.manager().wait_for_idle().await;
//! app.shutdown().await?;
//! ```

mod app;
mod error;
mod manager;
mod simulator;

pub use app::App;
pub use error::{BatchError, ManagerError, Result};
pub use manager::{JobManager, JobManagerConfig, MonitorPhase};
pub use simulator::Simulator;
