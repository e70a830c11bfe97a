//! Composite strategies

use std::sync::Arc;

use gantry_core::config::StrategySpec;
use gantry_core::{PushParams, Result, Task};

use crate::context::OptimizationContext;
use crate::registry::StrategyRegistry;
use crate::traits::OptimizationStrategy;

/// Removes a task when any child removes it
pub struct Any {
    children: Vec<Arc<dyn OptimizationStrategy>>,
}

impl Any {
    pub fn new(children: Vec<Arc<dyn OptimizationStrategy>>) -> Self {
        Self { children }
    }
}

impl OptimizationStrategy for Any {
    fn description(&self) -> String {
        format!("any({})", describe(&self.children))
    }

    fn should_remove_task(
        &self,
        task: &Task,
        params: &PushParams,
        ctx: &OptimizationContext,
    ) -> Result<bool> {
        for child in &self.children {
            if child.should_remove_task(task, params, ctx)? {
                return Ok(true);
            }
        }
        Ok(false)
    }
}

/// Removes a task only when every child removes it.
///
/// A single child voting keep keeps the task, which is how gating strategies
/// force a full run. With no children nothing is removed.
pub struct All {
    children: Vec<Arc<dyn OptimizationStrategy>>,
}

impl All {
    pub fn new(children: Vec<Arc<dyn OptimizationStrategy>>) -> Self {
        Self { children }
    }
}

impl OptimizationStrategy for All {
    fn description(&self) -> String {
        format!("all({})", describe(&self.children))
    }

    fn should_remove_task(
        &self,
        task: &Task,
        params: &PushParams,
        ctx: &OptimizationContext,
    ) -> Result<bool> {
        if self.children.is_empty() {
            return Ok(false);
        }
        for child in &self.children {
            if !child.should_remove_task(task, params, ctx)? {
                return Ok(false);
            }
        }
        Ok(true)
    }
}

/// Inverts a child's decision
pub struct Not {
    inner: Arc<dyn OptimizationStrategy>,
}

impl Not {
    pub fn new(inner: Arc<dyn OptimizationStrategy>) -> Self {
        Self { inner }
    }
}

impl OptimizationStrategy for Not {
    fn description(&self) -> String {
        format!("not({})", self.inner.description())
    }

    fn should_remove_task(
        &self,
        task: &Task,
        params: &PushParams,
        ctx: &OptimizationContext,
    ) -> Result<bool> {
        Ok(!self.inner.should_remove_task(task, params, ctx)?)
    }
}

fn describe(children: &[Arc<dyn OptimizationStrategy>]) -> String {
    children
        .iter()
        .map(|c| c.description())
        .collect::<Vec<_>>()
        .join(", ")
}

/// Build a strategy from a composition tree, resolving names in `registry`
pub fn build_strategy(
    spec: &StrategySpec,
    registry: &StrategyRegistry,
) -> Result<Arc<dyn OptimizationStrategy>> {
    let strategy: Arc<dyn OptimizationStrategy> = match spec {
        StrategySpec::Named(name) => return registry.require(name),
        StrategySpec::Any { any } => Arc::new(Any::new(build_all(any, registry)?)),
        StrategySpec::All { all } => Arc::new(All::new(build_all(all, registry)?)),
        StrategySpec::Not { not } => Arc::new(Not::new(build_strategy(not, registry)?)),
    };
    Ok(strategy)
}

fn build_all(
    specs: &[StrategySpec],
    registry: &StrategyRegistry,
) -> Result<Vec<Arc<dyn OptimizationStrategy>>> {
    specs.iter().map(|s| build_strategy(s, registry)).collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::attributes::SkipUnlessDebug;
    use crate::backstop::SkipUnlessBackstop;
    use crate::test_support::{default_tasks, params};
    use gantry_core::{GantryError, StrategyError};

    struct Fixed(bool);

    impl OptimizationStrategy for Fixed {
        fn description(&self) -> String {
            self.0.to_string()
        }

        fn should_remove_task(
            &self,
            _: &Task,
            _: &PushParams,
            _: &OptimizationContext,
        ) -> Result<bool> {
            Ok(self.0)
        }
    }

    fn decide(strategy: &dyn OptimizationStrategy) -> bool {
        let task = Task::new("t");
        strategy
            .should_remove_task(&task, &params(), &OptimizationContext::new())
            .unwrap()
    }

    fn fixed(values: &[bool]) -> Vec<Arc<dyn OptimizationStrategy>> {
        values
            .iter()
            .map(|v| Arc::new(Fixed(*v)) as Arc<dyn OptimizationStrategy>)
            .collect()
    }

    #[test]
    fn test_any() {
        assert!(decide(&Any::new(fixed(&[false, true]))));
        assert!(!decide(&Any::new(fixed(&[false, false]))));
        assert!(!decide(&Any::new(Vec::new())));
    }

    #[test]
    fn test_all() {
        assert!(decide(&All::new(fixed(&[true, true]))));
        assert!(!decide(&All::new(fixed(&[true, false]))));
        assert!(!decide(&All::new(Vec::new())));
    }

    #[test]
    fn test_not() {
        assert!(decide(&Not::new(Arc::new(Fixed(false)))));
        assert!(!decide(&Not::new(Arc::new(Fixed(true)))));
    }

    #[test]
    fn test_build_from_spec() {
        let mut registry = StrategyRegistry::empty();
        registry.register("skip-unless-backstop", SkipUnlessBackstop).unwrap();
        registry.register("skip-unless-debug", SkipUnlessDebug).unwrap();

        let spec: StrategySpec = serde_json::from_str(
            r#"{"all": ["skip-unless-debug", {"not": "skip-unless-backstop"}]}"#,
        )
        .unwrap();
        let strategy = build_strategy(&spec, &registry).unwrap();
        assert_eq!(strategy.description(), "all(skip-unless-debug, not(skip-unless-backstop))");

        // Removes non-debug tasks, but only on backstop pushes
        let tasks = default_tasks();
        let ctx = OptimizationContext::for_tasks(&tasks);
        let backstop = params().with_backstop(true);
        let removed: Vec<&str> = tasks
            .iter()
            .filter(|t| strategy.should_remove_task(t, &backstop, &ctx).unwrap())
            .map(|t| t.label.as_str())
            .collect();
        assert_eq!(removed, vec!["task-0", "task-3", "task-4"]);
        assert!(tasks
            .iter()
            .all(|t| !strategy.should_remove_task(t, &params(), &ctx).unwrap()));
    }

    #[test]
    fn test_build_unknown_name() {
        let spec = StrategySpec::Any {
            any: vec![StrategySpec::Named("missing".to_string())],
        };
        let err = build_strategy(&spec, &StrategyRegistry::empty()).err().unwrap();
        assert!(matches!(err, GantryError::Strategy(StrategyError::Unknown(_))));
    }
}
