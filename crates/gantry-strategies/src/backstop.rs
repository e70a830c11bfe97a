//! Push-class gating strategies
//!
//! These look only at the push, never at the task, so every task of a push
//! gets the same answer. Composed under [`crate::All`] they act as gates: one
//! gate voting keep keeps the task whatever the other children say.

use std::sync::Arc;

use tracing::debug;

use gantry_core::{ConfigError, PushParams, Result, Task};

use crate::composite::All;
use crate::context::OptimizationContext;
use crate::traits::OptimizationStrategy;

/// Remove every task unless the push is a backstop push
#[derive(Debug, Clone, Copy, Default)]
pub struct SkipUnlessBackstop;

impl OptimizationStrategy for SkipUnlessBackstop {
    fn description(&self) -> String {
        "skip-unless-backstop".to_string()
    }

    fn should_remove_task(
        &self,
        _task: &Task,
        params: &PushParams,
        _ctx: &OptimizationContext,
    ) -> Result<bool> {
        Ok(!params.backstop)
    }
}

/// Remove every task unless the push id falls on the interval
#[derive(Debug, Clone)]
pub struct SkipUnlessPushInterval {
    interval: i64,
    remove_on_projects: Option<Vec<String>>,
}

impl SkipUnlessPushInterval {
    /// Create the strategy, rejecting a non-positive interval
    pub fn new(interval: i64) -> Result<Self> {
        if interval <= 0 {
            return Err(ConfigError::invalid(
                "push_interval",
                format!("must be a positive integer, got {}", interval),
            )
            .into());
        }
        Ok(Self {
            interval,
            remove_on_projects: None,
        })
    }

    /// Only remove tasks on these projects
    pub fn remove_on_projects<I, S>(mut self, projects: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.remove_on_projects = Some(projects.into_iter().map(Into::into).collect());
        self
    }

    /// The configured interval
    pub fn interval(&self) -> i64 {
        self.interval
    }
}

impl OptimizationStrategy for SkipUnlessPushInterval {
    fn description(&self) -> String {
        format!("skip-unless-push-interval({})", self.interval)
    }

    fn should_remove_task(
        &self,
        _task: &Task,
        params: &PushParams,
        _ctx: &OptimizationContext,
    ) -> Result<bool> {
        if let Some(projects) = &self.remove_on_projects {
            if !projects.iter().any(|p| *p == params.project) {
                return Ok(false);
            }
        }
        Ok(params.pushlog_id.rem_euclid(self.interval) != 0)
    }
}

/// Remove every task unless the push is expanded.
///
/// A push is expanded when it is a backstop push or lands on half the
/// backstop interval.
pub struct SkipUnlessExpanded {
    inner: All,
}

impl SkipUnlessExpanded {
    /// Create the strategy for a backstop interval
    pub fn new(backstop_interval: i64) -> Result<Self> {
        let half = SkipUnlessPushInterval::new(backstop_interval / 2).map_err(|_| {
            ConfigError::invalid(
                "backstop.push_interval",
                format!("must be at least 2, got {}", backstop_interval),
            )
        })?;
        debug!(interval = half.interval(), "expanded push interval");

        let gates: Vec<Arc<dyn OptimizationStrategy>> =
            vec![Arc::new(SkipUnlessBackstop), Arc::new(half)];
        Ok(Self {
            inner: All::new(gates),
        })
    }
}

impl OptimizationStrategy for SkipUnlessExpanded {
    fn description(&self) -> String {
        format!("skip-unless-expanded({})", self.inner.description())
    }

    fn should_remove_task(
        &self,
        task: &Task,
        params: &PushParams,
        ctx: &OptimizationContext,
    ) -> Result<bool> {
        self.inner.should_remove_task(task, params, ctx)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_support::{default_tasks, params};

    fn removes_all(strategy: &dyn OptimizationStrategy, params: &PushParams) -> bool {
        let tasks = default_tasks();
        let ctx = OptimizationContext::for_tasks(&tasks);
        tasks
            .iter()
            .all(|t| strategy.should_remove_task(t, params, &ctx).unwrap())
    }

    fn keeps_all(strategy: &dyn OptimizationStrategy, params: &PushParams) -> bool {
        let tasks = default_tasks();
        let ctx = OptimizationContext::for_tasks(&tasks);
        tasks
            .iter()
            .all(|t| !strategy.should_remove_task(t, params, &ctx).unwrap())
    }

    #[test]
    fn test_backstop() {
        assert!(removes_all(&SkipUnlessBackstop, &params()));
        assert!(keeps_all(&SkipUnlessBackstop, &params().with_backstop(true)));
    }

    #[test]
    fn test_push_interval() {
        let strategy = SkipUnlessPushInterval::new(10).unwrap();
        assert!(removes_all(&strategy, &params().with_pushlog_id(9)));
        assert!(keeps_all(&strategy, &params().with_pushlog_id(10)));
        assert!(keeps_all(&strategy, &params().with_pushlog_id(20)));
    }

    #[test]
    fn test_push_interval_rejects_non_positive() {
        assert!(SkipUnlessPushInterval::new(0).is_err());
        assert!(SkipUnlessPushInterval::new(-5).is_err());
    }

    #[test]
    fn test_push_interval_restricted_projects() {
        let strategy = SkipUnlessPushInterval::new(10)
            .unwrap()
            .remove_on_projects(["mozilla-central"]);
        // autoland is outside the list, so nothing is removed
        assert!(keeps_all(&strategy, &params().with_pushlog_id(9)));

        let mut central = params().with_pushlog_id(9);
        central.project = "mozilla-central".to_string();
        assert!(removes_all(&strategy, &central));
    }

    #[test]
    fn test_expanded() {
        let strategy = SkipUnlessExpanded::new(20).unwrap();
        assert!(keeps_all(&strategy, &params().with_pushlog_id(10)));
        assert!(removes_all(&strategy, &params().with_pushlog_id(11)));
        assert!(keeps_all(
            &strategy,
            &params().with_pushlog_id(11).with_backstop(true)
        ));
    }

    #[test]
    fn test_expanded_rejects_tiny_interval() {
        assert!(SkipUnlessExpanded::new(1).is_err());
    }
}
