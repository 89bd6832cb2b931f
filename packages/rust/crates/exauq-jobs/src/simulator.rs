//! Simulator view over a job manager: look up known outputs, submit new inputs.

use std::sync::Arc;

use exauq_types::Input;

use crate::error::Result;
use crate::manager::JobManager;

/// A simulator whose evaluations are memoised in the simulations log.
#[derive(Debug, Clone)]
pub struct Simulator {
    manager: Arc<JobManager>,
}

impl Simulator {
    /// Wrap a running job manager.
    #[must_use]
    pub fn new(manager: Arc<JobManager>) -> Self {
        Self { manager }
    }

    /// Output for `input` if it was simulated before, `None` while it is
    /// still pending. A never-seen input is submitted and `None` returned.
    pub async fn compute(&self, input: Input) -> Result<Option<f64>> {
        let previous = self.previous_simulations().await?;
        if let Some((_, output)) = previous.iter().find(|(seen, _)| *seen == input) {
            return Ok(*output);
        }
        self.manager.submit(input).await?;
        Ok(None)
    }

    /// Every logged input with its output, if known.
    pub async fn previous_simulations(&self) -> Result<Vec<(Input, Option<f64>)>> {
        self.manager
            .with_log(exauq_log::SimulationsLog::get_simulations)
            .await
    }
}
