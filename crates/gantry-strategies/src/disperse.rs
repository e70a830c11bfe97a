//! Test group dispersal
//!
//! Test groups (manifests) usually run on many platform and variant
//! combinations. Given an importance per group, dispersal keeps only enough
//! combinations to cover the group at that importance and removes the rest.
//!
//! Candidates are walked in a fixed order:
//!
//! 1. base variant (multi-process, no `unittest_variant`)
//! 2. alternate variants
//! 3. single-process (`e10s = false`)
//!
//! with ties broken by test platform, variant and label. Each group keeps up
//! to its target count of tasks, plus `unseen_modifier` extra slots for a
//! configuration it has not covered yet.

use std::collections::{BTreeMap, BTreeSet};

use tracing::debug;

use gantry_core::config::DispersalConfig;
use gantry_core::{Importance, PushParams, Result, Task};

use crate::context::OptimizationContext;
use crate::traits::OptimizationStrategy;

/// Tasks retained for a push, computed once from the whole task set
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct DispersalPlan {
    considered: BTreeSet<String>,
    retained: BTreeSet<String>,
}

impl DispersalPlan {
    /// Compute the plan for `tasks` under `importance`
    pub fn compute(
        tasks: &[Task],
        importance: &BTreeMap<String, Importance>,
        targets: &DispersalConfig,
    ) -> Self {
        let mut candidates: Vec<Candidate<'_>> = tasks
            .iter()
            .filter_map(|task| Candidate::new(task, importance))
            .collect();
        candidates.sort_by(|a, b| a.sort_key().cmp(&b.sort_key()));

        let mut counts: BTreeMap<&str, usize> = BTreeMap::new();
        let mut covered: BTreeMap<&str, BTreeSet<String>> = BTreeMap::new();
        let mut plan = Self::default();

        for candidate in &candidates {
            plan.considered.insert(candidate.task.label.clone());

            let retain = candidate.groups.iter().any(|(group, level)| {
                let count = counts.get(group).copied().unwrap_or(0);
                let seen = covered
                    .get(group)
                    .is_some_and(|configs| configs.contains(&candidate.config));
                let mut limit = target(targets, *level);
                if !seen {
                    limit += targets.unseen_modifier;
                }
                count < limit
            });

            if retain {
                for (group, _) in &candidate.groups {
                    *counts.entry(*group).or_insert(0) += 1;
                    covered
                        .entry(*group)
                        .or_default()
                        .insert(candidate.config.clone());
                }
                plan.retained.insert(candidate.task.label.clone());
            }
        }

        debug!(
            considered = plan.considered.len(),
            retained = plan.retained.len(),
            "computed dispersal plan"
        );
        plan
    }

    /// Whether the plan made a decision for `label`
    pub fn considers(&self, label: &str) -> bool {
        self.considered.contains(label)
    }

    /// Whether the plan keeps `label`
    pub fn retains(&self, label: &str) -> bool {
        self.retained.contains(label)
    }

    /// Labels retained by the plan, sorted
    pub fn retained(&self) -> impl Iterator<Item = &str> {
        self.retained.iter().map(String::as_str)
    }
}

fn target(targets: &DispersalConfig, level: Importance) -> usize {
    match level {
        Importance::Low => targets.low,
        Importance::Medium => targets.medium,
        Importance::High => targets.high,
    }
}

struct Candidate<'a> {
    task: &'a Task,
    platform: &'a str,
    variant: &'a str,
    rank: u8,
    config: String,
    groups: Vec<(&'a str, Importance)>,
}

impl<'a> Candidate<'a> {
    fn new(task: &'a Task, importance: &'a BTreeMap<String, Importance>) -> Option<Self> {
        let attrs = &task.attributes;
        let platform = attrs.test_platform.as_deref()?;
        let groups: Vec<(&str, Importance)> = task
            .test_manifests()
            .iter()
            .filter_map(|m| importance.get_key_value(m))
            .map(|(m, level)| (m.as_str(), *level))
            .collect();
        if groups.is_empty() {
            return None;
        }

        let variant = attrs.unittest_variant.as_deref().unwrap_or("");
        let rank = if !attrs.e10s {
            2
        } else if variant.is_empty() {
            0
        } else {
            1
        };

        let mut config = platform.to_string();
        if !variant.is_empty() {
            config.push('-');
            config.push_str(variant);
        }
        if !attrs.e10s {
            config.push_str("-1proc");
        }

        Some(Self {
            task,
            platform,
            variant,
            rank,
            config,
            groups,
        })
    }

    fn sort_key(&self) -> (u8, &str, &str, &str) {
        (self.rank, self.platform, self.variant, self.task.label.as_str())
    }
}

/// Removes redundant platform/variant combinations of important test groups
#[derive(Debug, Clone)]
pub struct DisperseGroups {
    targets: DispersalConfig,
}

impl DisperseGroups {
    /// Create the strategy with default target counts
    pub fn new() -> Self {
        Self::from_config(&DispersalConfig::default())
    }

    /// Create the strategy from configured target counts
    pub fn from_config(config: &DispersalConfig) -> Self {
        Self {
            targets: config.clone(),
        }
    }

    fn plan_key(&self) -> String {
        format!(
            "dispersal-plan:{}:{}:{}:{}",
            self.targets.low, self.targets.medium, self.targets.high, self.targets.unseen_modifier
        )
    }
}

impl Default for DisperseGroups {
    fn default() -> Self {
        Self::new()
    }
}

impl OptimizationStrategy for DisperseGroups {
    fn description(&self) -> String {
        format!(
            "disperse-groups(low={}, medium={}, high={})",
            self.targets.low, self.targets.medium, self.targets.high
        )
    }

    fn should_remove_task(
        &self,
        task: &Task,
        _params: &PushParams,
        ctx: &OptimizationContext,
    ) -> Result<bool> {
        if ctx.importance().is_empty() {
            return Ok(false);
        }

        let plan = ctx.derived(&self.plan_key(), || {
            DispersalPlan::compute(ctx.candidates(), ctx.importance(), &self.targets)
        });
        Ok(plan.considers(&task.label) && !plan.retains(&task.label))
    }
}
