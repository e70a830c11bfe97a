//! Strategies driven by task attributes

use std::collections::BTreeSet;

use tracing::debug;

use gantry_core::{PushParams, Result, Task};

use crate::context::OptimizationContext;
use crate::traits::OptimizationStrategy;

/// Remove every task that is not a debug build
#[derive(Debug, Clone, Copy, Default)]
pub struct SkipUnlessDebug;

impl OptimizationStrategy for SkipUnlessDebug {
    fn description(&self) -> String {
        "skip-unless-debug".to_string()
    }

    fn should_remove_task(
        &self,
        task: &Task,
        _params: &PushParams,
        _ctx: &OptimizationContext,
    ) -> Result<bool> {
        Ok(!task.attributes.is_debug())
    }
}

/// Remove tasks whose components were not touched by the push.
///
/// Tasks that declare no components, pushes outside the push log and
/// contexts without component data are always kept.
#[derive(Debug, Clone, Copy, Default)]
pub struct SkipUnlessSchedules;

impl OptimizationStrategy for SkipUnlessSchedules {
    fn description(&self) -> String {
        "skip-unless-schedules".to_string()
    }

    fn should_remove_task(
        &self,
        task: &Task,
        params: &PushParams,
        ctx: &OptimizationContext,
    ) -> Result<bool> {
        if params.pushlog_id == -1 {
            return Ok(false);
        }
        let Some(scheduled) = ctx.scheduled_components() else {
            return Ok(false);
        };
        let components = &task.attributes.schedules;
        if components.is_empty() {
            return Ok(false);
        }

        let remove = !components.iter().any(|c| scheduled.contains(c));
        debug!(task = %task.label, remove, "component schedule check");
        Ok(remove)
    }
}

/// Remove test tasks none of whose manifests sit under a changed directory
#[derive(Debug, Clone, Copy, Default)]
pub struct SkipUnlessHasRelevantTests;

impl OptimizationStrategy for SkipUnlessHasRelevantTests {
    fn description(&self) -> String {
        "skip-unless-has-relevant-tests".to_string()
    }

    fn should_remove_task(
        &self,
        task: &Task,
        _params: &PushParams,
        ctx: &OptimizationContext,
    ) -> Result<bool> {
        if task.attributes.unittest_suite.is_none() {
            return Ok(false);
        }
        let Some(files) = ctx.changed_files() else {
            return Ok(false);
        };

        let dirs = ctx.derived("changed-dirs", || changed_dirs(files));
        let relevant = task
            .test_manifests()
            .iter()
            .any(|manifest| dirs.iter().any(|dir| is_under(manifest, dir)));
        Ok(!relevant)
    }
}

fn changed_dirs(files: &[String]) -> BTreeSet<String> {
    files
        .iter()
        .filter_map(|f| f.rsplit_once('/').map(|(dir, _)| dir))
        .filter(|dir| !dir.is_empty())
        .map(str::to_string)
        .collect()
}

fn is_under(manifest: &str, dir: &str) -> bool {
    manifest == dir
        || manifest
            .strip_prefix(dir)
            .is_some_and(|rest| rest.starts_with('/'))
}
