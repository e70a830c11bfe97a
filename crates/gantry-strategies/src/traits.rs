//! Optimization strategy trait

use gantry_core::{PushParams, Result, Task};

use crate::context::OptimizationContext;

/// Decides whether a task can be skipped on a push
pub trait OptimizationStrategy: Send + Sync {
    /// Human readable description used in logs
    fn description(&self) -> String;

    /// Whether `task` should be removed from the graph for this push.
    ///
    /// Returning `Ok(false)` keeps the task. Errors mean the strategy could
    /// not decide and the caller should not optimize the push.
    fn should_remove_task(
        &self,
        task: &Task,
        params: &PushParams,
        ctx: &OptimizationContext,
    ) -> Result<bool>;
}
