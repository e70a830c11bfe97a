//! Batch evaluation of a strategy over a push's task set

use serde::Serialize;
use tracing::{debug, info};

use gantry_core::{PushParams, Result, Task};

use crate::context::OptimizationContext;
use crate::traits::OptimizationStrategy;

/// Labels kept and removed for one push, in input order
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct OptimizationOutcome {
    pub kept: Vec<String>,
    pub removed: Vec<String>,
}

impl OptimizationOutcome {
    /// Total number of tasks evaluated
    pub fn total(&self) -> usize {
        self.kept.len() + self.removed.len()
    }
}

/// Evaluate `strategy` for every task.
///
/// The first failure aborts the evaluation; callers should then run the full
/// task set for the push.
pub fn evaluate(
    strategy: &dyn OptimizationStrategy,
    tasks: &[Task],
    params: &PushParams,
    ctx: &OptimizationContext,
) -> Result<OptimizationOutcome> {
    let mut outcome = OptimizationOutcome::default();

    for task in tasks {
        if strategy.should_remove_task(task, params, ctx)? {
            debug!(task = %task.label, "removing task");
            outcome.removed.push(task.label.clone());
        } else {
            outcome.kept.push(task.label.clone());
        }
    }

    info!(
        project = %params.project,
        pushlog_id = params.pushlog_id,
        kept = outcome.kept.len(),
        removed = outcome.removed.len(),
        "optimized push"
    );
    Ok(outcome)
}
