//! Per-project optimization policies

use std::collections::BTreeMap;
use std::sync::Arc;

use tracing::{debug, info};

use gantry_core::config::{Config, StrategySpec};
use gantry_core::{Result, StrategyError};

use crate::composite::build_strategy;
use crate::registry::StrategyRegistry;
use crate::traits::OptimizationStrategy;

/// Composition tree of the built-in `autoland`/`test` policy.
///
/// Backstop pushes keep everything. Expanded pushes use evidence from the
/// last ten pushes, regular pushes the evidence of the push alone.
fn autoland_test() -> StrategySpec {
    fn named(name: &str) -> StrategySpec {
        StrategySpec::Named(name.to_string())
    }

    StrategySpec::Any {
        any: vec![
            StrategySpec::All {
                all: vec![
                    named("skip-unless-backstop"),
                    StrategySpec::Not {
                        not: Box::new(named("skip-unless-expanded")),
                    },
                    StrategySpec::Any {
                        any: vec![
                            named("skip-unless-schedules"),
                            named("bugbug-reduced-manifests-fallback-last-10-pushes"),
                            named("platform-disperse"),
                        ],
                    },
                ],
            },
            StrategySpec::All {
                all: vec![
                    named("skip-unless-expanded"),
                    StrategySpec::Any {
                        any: vec![
                            named("skip-unless-schedules"),
                            named("bugbug-reduced-manifests-fallback"),
                            named("platform-disperse"),
                        ],
                    },
                ],
            },
        ],
    }
}

/// Strategies keyed by project and purpose
#[derive(Default)]
pub struct ProjectPolicies {
    policies: BTreeMap<(String, String), Arc<dyn OptimizationStrategy>>,
}

impl ProjectPolicies {
    /// Create an empty policy table
    pub fn empty() -> Self {
        Self::default()
    }

    /// Create the built-in policies
    pub fn builtin(registry: &StrategyRegistry) -> Result<Self> {
        let mut policies = Self::empty();
        policies.insert("autoland", "test", build_strategy(&autoland_test(), registry)?);
        Ok(policies)
    }

    /// Create the built-in policies plus those declared in `config`.
    ///
    /// A configured policy replaces a built-in one for the same project and
    /// purpose.
    pub fn from_config(config: &Config, registry: &StrategyRegistry) -> Result<Self> {
        let mut policies = Self::builtin(registry)?;
        for policy in &config.policies {
            let strategy = build_strategy(&policy.strategy, registry)?;
            info!(
                project = %policy.project,
                purpose = %policy.purpose,
                strategy = %strategy.description(),
                "loaded project policy"
            );
            policies.insert(&policy.project, &policy.purpose, strategy);
        }
        Ok(policies)
    }

    /// Set the strategy for a project and purpose
    pub fn insert(
        &mut self,
        project: impl Into<String>,
        purpose: impl Into<String>,
        strategy: Arc<dyn OptimizationStrategy>,
    ) {
        self.policies
            .insert((project.into(), purpose.into()), strategy);
    }

    /// Get the strategy for a project and purpose
    pub fn get(&self, project: &str, purpose: &str) -> Option<Arc<dyn OptimizationStrategy>> {
        let result = self
            .policies
            .get(&(project.to_string(), purpose.to_string()))
            .cloned();
        debug!(project, purpose, found = result.is_some(), "policy lookup");
        result
    }

    /// Get the strategy for a project and purpose, failing when there is none
    pub fn require(&self, project: &str, purpose: &str) -> Result<Arc<dyn OptimizationStrategy>> {
        self.get(project, purpose).ok_or_else(|| {
            StrategyError::NoPolicy {
                project: project.to_string(),
                purpose: purpose.to_string(),
            }
            .into()
        })
    }

    /// `(project, purpose)` pairs with a policy, sorted
    pub fn keys(&self) -> impl Iterator<Item = (&str, &str)> {
        self.policies
            .keys()
            .map(|(project, purpose)| (project.as_str(), purpose.as_str()))
    }
}
