//! Strategy registry

use std::collections::BTreeMap;
use std::sync::Arc;

use tracing::debug;

use gantry_core::config::defaults::{CT_HIGH, CT_LOW, CT_MEDIUM};
use gantry_core::config::Config;
use gantry_core::{Result, StrategyError};
use gantry_evidence::PushScheduleClient;

use crate::attributes::{SkipUnlessDebug, SkipUnlessHasRelevantTests, SkipUnlessSchedules};
use crate::backstop::{SkipUnlessBackstop, SkipUnlessExpanded, SkipUnlessPushInterval};
use crate::bugbug::BugBugPushSchedules;
use crate::disperse::DisperseGroups;
use crate::traits::OptimizationStrategy;

/// Name of the strategy predictor presets fall back to on timeout
pub const FALLBACK: &str = "skip-unless-has-relevant-tests";

/// Registry of optimization strategies keyed by stable name
#[derive(Default)]
pub struct StrategyRegistry {
    strategies: BTreeMap<String, Arc<dyn OptimizationStrategy>>,
}

impl StrategyRegistry {
    /// Create an empty registry
    pub fn empty() -> Self {
        Self::default()
    }

    /// Create a registry with every built-in strategy.
    ///
    /// Predictor strategies share `client`, and with it its evidence cache.
    pub fn builtin(config: &Config, client: Arc<PushScheduleClient>) -> Result<Self> {
        let mut registry = Self::empty();
        let interval = config.backstop.push_interval;

        registry.register("skip-unless-backstop", SkipUnlessBackstop)?;
        let mut push_interval = SkipUnlessPushInterval::new(interval)?;
        if let Some(projects) = &config.backstop.remove_on_projects {
            push_interval = push_interval.remove_on_projects(projects.iter().cloned());
        }
        registry.register("skip-unless-push-interval", push_interval)?;
        registry.register("skip-unless-expanded", SkipUnlessExpanded::new(interval)?)?;
        registry.register("skip-unless-debug", SkipUnlessDebug)?;
        registry.register("skip-unless-schedules", SkipUnlessSchedules)?;
        registry.register(FALLBACK, SkipUnlessHasRelevantTests)?;

        let disperse = Arc::new(DisperseGroups::from_config(&config.dispersal));
        registry.register_arc("disperse-groups", disperse.clone())?;
        registry.register_arc("platform-disperse", disperse)?;

        let fallback = registry.require(FALLBACK)?;
        let projects = config.predictor.projects.clone();
        let bugbug = |threshold: f64| -> Result<BugBugPushSchedules> {
            Ok(BugBugPushSchedules::new(Arc::clone(&client), threshold)?
                .only_projects(projects.clone()))
        };

        registry.register(
            "bugbug-push-schedules",
            bugbug(config.selection.default_threshold)?,
        )?;
        registry.register("bugbug-low", bugbug(CT_LOW)?)?;
        registry.register("bugbug-medium", bugbug(CT_MEDIUM)?)?;
        registry.register("bugbug-high", bugbug(CT_HIGH)?)?;
        registry.register("bugbug-tasks-medium", bugbug(CT_MEDIUM)?.tasks_only(true))?;
        registry.register("bugbug-tasks-high", bugbug(CT_HIGH)?.tasks_only(true))?;
        registry.register(
            "bugbug-reduced",
            bugbug(CT_MEDIUM)?.tasks_only(true).reduced_tasks(true),
        )?;
        registry.register(
            "bugbug-reduced-high",
            bugbug(CT_HIGH)?.tasks_only(true).reduced_tasks(true),
        )?;
        registry.register(
            "bugbug-reduced-fallback",
            bugbug(CT_MEDIUM)?
                .tasks_only(true)
                .reduced_tasks(true)
                .with_fallback(Arc::clone(&fallback)),
        )?;
        registry.register(
            "bugbug-reduced-manifests-fallback",
            bugbug(CT_MEDIUM)?
                .reduced_tasks(true)
                .with_fallback(Arc::clone(&fallback)),
        )?;
        registry.register(
            "bugbug-reduced-manifests-fallback-last-10-pushes",
            bugbug(0.3)?
                .reduced_tasks(true)
                .with_fallback(fallback)
                .with_num_pushes(10)?,
        )?;

        debug!(count = registry.len(), "registered built-in strategies");
        Ok(registry)
    }

    /// Register a strategy under `name`
    pub fn register<S: OptimizationStrategy + 'static>(
        &mut self,
        name: impl Into<String>,
        strategy: S,
    ) -> Result<()> {
        self.register_arc(name, Arc::new(strategy))
    }

    /// Register an already shared strategy under `name`
    pub fn register_arc(
        &mut self,
        name: impl Into<String>,
        strategy: Arc<dyn OptimizationStrategy>,
    ) -> Result<()> {
        let name = name.into();
        if self.strategies.contains_key(&name) {
            return Err(StrategyError::Duplicate(name).into());
        }
        self.strategies.insert(name, strategy);
        Ok(())
    }

    /// Get strategy by name
    pub fn get(&self, name: &str) -> Option<Arc<dyn OptimizationStrategy>> {
        let result = self.strategies.get(name).cloned();
        debug!(
            strategy = name,
            found = result.is_some(),
            "strategy registry lookup"
        );
        result
    }

    /// Get strategy by name, failing when it is not registered
    pub fn require(&self, name: &str) -> Result<Arc<dyn OptimizationStrategy>> {
        self.get(name)
            .ok_or_else(|| StrategyError::Unknown(name.to_string()).into())
    }

    /// Registered names in sorted order
    pub fn names(&self) -> Vec<&str> {
        self.strategies.keys().map(String::as_str).collect()
    }

    /// Iterate over `(name, strategy)` pairs in name order
    pub fn iter(&self) -> impl Iterator<Item = (&str, &Arc<dyn OptimizationStrategy>)> {
        self.strategies.iter().map(|(k, v)| (k.as_str(), v))
    }

    /// Number of registered strategies
    pub fn len(&self) -> usize {
        self.strategies.len()
    }

    /// Whether the registry is empty
    pub fn is_empty(&self) -> bool {
        self.strategies.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::context::OptimizationContext;
    use crate::test_support::params;
    use gantry_core::{GantryError, Task};
    use gantry_evidence::EvidenceCache;

    fn builtin() -> StrategyRegistry {
        let config = Config::default();
        let client =
            PushScheduleClient::from_config(&config, Arc::new(EvidenceCache::new())).unwrap();
        StrategyRegistry::builtin(&config, Arc::new(client)).unwrap()
    }

    #[test]
    fn test_empty_registry() {
        let registry = StrategyRegistry::empty();
        assert!(registry.is_empty());
        assert!(registry.names().is_empty());
        assert!(registry.get("skip-unless-backstop").is_none());
    }

    #[test]
    fn test_builtin_names() {
        let registry = builtin();
        for name in [
            "skip-unless-backstop",
            "skip-unless-push-interval",
            "skip-unless-expanded",
            "skip-unless-debug",
            "skip-unless-schedules",
            FALLBACK,
            "bugbug-push-schedules",
            "bugbug-low",
            "bugbug-medium",
            "bugbug-high",
            "bugbug-tasks-medium",
            "bugbug-tasks-high",
            "bugbug-reduced",
            "bugbug-reduced-high",
            "bugbug-reduced-fallback",
            "bugbug-reduced-manifests-fallback",
            "bugbug-reduced-manifests-fallback-last-10-pushes",
            "disperse-groups",
            "platform-disperse",
        ] {
            assert!(registry.get(name).is_some(), "missing {}", name);
        }
        assert_eq!(registry.len(), 19);
    }

    #[test]
    fn test_duplicate_registration_fails() {
        let mut registry = StrategyRegistry::empty();
        registry.register("backstop", SkipUnlessBackstop).unwrap();

        let err = registry.register("backstop", SkipUnlessDebug).unwrap_err();
        assert!(matches!(
            err,
            GantryError::Strategy(StrategyError::Duplicate(ref name)) if name == "backstop"
        ));
        assert_eq!(registry.len(), 1);
    }

    #[test]
    fn test_require_unknown() {
        let registry = StrategyRegistry::empty();
        let err = registry.require("nope").err().unwrap();
        assert!(matches!(
            err,
            GantryError::Strategy(StrategyError::Unknown(ref name)) if name == "nope"
        ));
    }

    #[test]
    fn test_push_interval_projects_from_config() {
        let mut config = Config::default();
        config.backstop.remove_on_projects = Some(vec!["mozilla-central".to_string()]);
        let client =
            PushScheduleClient::from_config(&config, Arc::new(EvidenceCache::new())).unwrap();
        let registry = StrategyRegistry::builtin(&config, Arc::new(client)).unwrap();
        let strategy = registry.require("skip-unless-push-interval").unwrap();

        let task = Task::new("test-linux/opt-mochitest-1");
        let ctx = OptimizationContext::new();
        let mut push = params().with_pushlog_id(9);
        assert!(!strategy.should_remove_task(&task, &push, &ctx).unwrap());

        push.project = "mozilla-central".to_string();
        assert!(strategy.should_remove_task(&task, &push, &ctx).unwrap());
    }

    #[test]
    fn test_invalid_interval_fails_construction() {
        let mut config = Config::default();
        config.backstop.push_interval = 0;
        let client =
            PushScheduleClient::from_config(&config, Arc::new(EvidenceCache::new())).unwrap();
        assert!(StrategyRegistry::builtin(&config, Arc::new(client)).is_err());
    }
}
