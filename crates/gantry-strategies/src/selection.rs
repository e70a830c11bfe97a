//! Confidence threshold selection

use gantry_core::config::validation::validate_threshold;
use gantry_core::{Result, Task};
use gantry_evidence::EvidenceResult;

/// Decides removal from predictor evidence and a confidence threshold
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ConfidenceSelector {
    threshold: f64,
    tasks_only: bool,
    reduced_tasks: bool,
}

impl ConfidenceSelector {
    /// Create a selector, rejecting thresholds outside `[0, 1]`
    pub fn new(threshold: f64) -> Result<Self> {
        validate_threshold("threshold", threshold)?;
        Ok(Self {
            threshold,
            tasks_only: false,
            reduced_tasks: false,
        })
    }

    /// Ignore group confidences
    pub fn tasks_only(mut self, tasks_only: bool) -> Self {
        self.tasks_only = tasks_only;
        self
    }

    /// Score tasks from the reduced task set
    pub fn use_reduced_tasks(mut self, reduced_tasks: bool) -> Self {
        self.reduced_tasks = reduced_tasks;
        self
    }

    /// The configured threshold
    pub fn threshold(&self) -> f64 {
        self.threshold
    }

    /// Relevance score of a task, `None` when no evidence mentions it
    pub fn score(&self, evidence: &EvidenceResult, task: &Task) -> Option<f64> {
        if self.reduced_tasks {
            return evidence.reduced_tasks.get(&task.label).copied();
        }

        let own = evidence.tasks.get(&task.label).copied();
        if self.tasks_only {
            return own;
        }

        task.test_manifests()
            .iter()
            .filter_map(|m| evidence.groups.get(m).copied())
            .chain(own)
            .reduce(f64::max)
    }

    /// Whether `task` should be removed given `evidence`
    pub fn should_remove(&self, evidence: &EvidenceResult, task: &Task) -> bool {
        if task.test_manifests().is_empty() {
            return false;
        }
        if !evidence.knows(&task.label) {
            return false;
        }
        self.score(evidence, task).unwrap_or(0.0) < self.threshold
    }
}
