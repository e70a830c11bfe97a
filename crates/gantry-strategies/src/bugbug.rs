//! Predictor driven task removal

use std::sync::Arc;

use tracing::{debug, warn};

use gantry_core::{ConfigError, GantryError, PushParams, Result, Task};
use gantry_evidence::PushScheduleClient;

use crate::context::OptimizationContext;
use crate::selection::ConfidenceSelector;
use crate::traits::OptimizationStrategy;

/// Removes tasks the relevance predictor is not confident about.
///
/// Evidence is fetched through a shared [`PushScheduleClient`], so every task
/// of a push reuses the same fetch. When the predictor times out the decision
/// goes to the fallback strategy, or the timeout is returned when there is
/// none.
pub struct BugBugPushSchedules {
    client: Arc<PushScheduleClient>,
    selector: ConfidenceSelector,
    num_pushes: usize,
    fallback: Option<Arc<dyn OptimizationStrategy>>,
    projects: Option<Vec<String>>,
}

impl BugBugPushSchedules {
    /// Create the strategy with a confidence threshold in `[0, 1]`
    pub fn new(client: Arc<PushScheduleClient>, threshold: f64) -> Result<Self> {
        Ok(Self {
            client,
            selector: ConfidenceSelector::new(threshold)?,
            num_pushes: 1,
            fallback: None,
            projects: None,
        })
    }

    /// Ignore group confidences
    pub fn tasks_only(mut self, tasks_only: bool) -> Self {
        self.selector = self.selector.tasks_only(tasks_only);
        self
    }

    /// Score tasks from the predictor's reduced task set
    pub fn reduced_tasks(mut self, reduced_tasks: bool) -> Self {
        self.selector = self.selector.use_reduced_tasks(reduced_tasks);
        self
    }

    /// Delegate to `fallback` when the predictor times out
    pub fn with_fallback(mut self, fallback: Arc<dyn OptimizationStrategy>) -> Self {
        self.fallback = Some(fallback);
        self
    }

    /// Merge evidence over the last `num_pushes` pushes
    pub fn with_num_pushes(mut self, num_pushes: usize) -> Result<Self> {
        if num_pushes == 0 {
            return Err(ConfigError::invalid("num_pushes", "must be at least 1").into());
        }
        self.num_pushes = num_pushes;
        Ok(self)
    }

    /// Only act on these projects, keeping every task elsewhere
    pub fn only_projects<I, S>(mut self, projects: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.projects = Some(projects.into_iter().map(Into::into).collect());
        self
    }

    fn applies_to(&self, project: &str) -> bool {
        self.projects
            .as_ref()
            .map_or(true, |projects| projects.iter().any(|p| p == project))
    }
}

impl OptimizationStrategy for BugBugPushSchedules {
    fn description(&self) -> String {
        format!(
            "bugbug(threshold={}, pushes={}, fallback={})",
            self.selector.threshold(),
            self.num_pushes,
            self.fallback.is_some()
        )
    }

    fn should_remove_task(
        &self,
        task: &Task,
        params: &PushParams,
        ctx: &OptimizationContext,
    ) -> Result<bool> {
        if !self.applies_to(&params.project) {
            return Ok(false);
        }

        let evidence = match self.client.evidence_for_push(params, self.num_pushes) {
            Ok(evidence) => evidence,
            Err(GantryError::Evidence(err)) if err.is_timeout() => {
                let Some(fallback) = &self.fallback else {
                    return Err(err.into());
                };
                debug!(
                    task = %task.label,
                    fallback = %fallback.description(),
                    "predictor unavailable, using fallback"
                );
                return fallback.should_remove_task(task, params, ctx);
            }
            Err(e) => {
                warn!(rev = %params.head_rev, error = %e, "failed to fetch predictor evidence");
                return Err(e);
            }
        };

        let remove = self.selector.should_remove(&evidence, task);
        debug!(task = %task.label, remove, "predictor decision");
        Ok(remove)
    }
}
