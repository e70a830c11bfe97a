//! Per-push evaluation context

use std::any::Any;
use std::collections::{BTreeMap, BTreeSet, HashMap};
use std::sync::{Arc, Mutex};

use gantry_core::{Importance, Task};

/// Data shared by every strategy while evaluating one push.
///
/// Besides the caller supplied inputs, the context memoizes values derived
/// from the whole task set so they are computed once per push.
#[derive(Debug, Default)]
pub struct OptimizationContext {
    candidates: Vec<Task>,
    importance: BTreeMap<String, Importance>,
    changed_files: Option<Vec<String>>,
    scheduled_components: Option<BTreeSet<String>>,
    derived: Mutex<HashMap<String, Arc<dyn Any + Send + Sync>>>,
}

impl OptimizationContext {
    /// Create an empty context
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a context for a push's full task set
    pub fn for_tasks(tasks: &[Task]) -> Self {
        Self {
            candidates: tasks.to_vec(),
            ..Self::default()
        }
    }

    /// Set per-group importance
    pub fn with_importance(mut self, importance: BTreeMap<String, Importance>) -> Self {
        self.importance = importance;
        self
    }

    /// Set the files changed by the push
    pub fn with_changed_files(mut self, files: Vec<String>) -> Self {
        self.changed_files = Some(files);
        self
    }

    /// Set the components scheduled by the push
    pub fn with_scheduled_components<I, S>(mut self, components: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.scheduled_components = Some(components.into_iter().map(Into::into).collect());
        self
    }

    /// All tasks of the push
    pub fn candidates(&self) -> &[Task] {
        &self.candidates
    }

    /// Per-group importance, empty when none was supplied
    pub fn importance(&self) -> &BTreeMap<String, Importance> {
        &self.importance
    }

    /// Files changed by the push, if known
    pub fn changed_files(&self) -> Option<&[String]> {
        self.changed_files.as_deref()
    }

    /// Components scheduled by the push, if known
    pub fn scheduled_components(&self) -> Option<&BTreeSet<String>> {
        self.scheduled_components.as_ref()
    }

    /// Value derived once per context under `key`
    pub fn derived<T, F>(&self, key: &str, init: F) -> Arc<T>
    where
        T: Any + Send + Sync,
        F: FnOnce() -> T,
    {
        if let Some(existing) = self.lookup::<T>(key) {
            return existing;
        }

        let value = Arc::new(init());
        let mut derived = self.derived.lock().unwrap_or_else(|e| e.into_inner());
        let entry = derived
            .entry(key.to_string())
            .or_insert_with(|| Arc::clone(&value) as Arc<dyn Any + Send + Sync>);
        Arc::clone(entry).downcast::<T>().unwrap_or(value)
    }

    fn lookup<T: Any + Send + Sync>(&self, key: &str) -> Option<Arc<T>> {
        let derived = self.derived.lock().unwrap_or_else(|e| e.into_inner());
        derived
            .get(key)
            .and_then(|value| Arc::clone(value).downcast::<T>().ok())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::cell::Cell;

    #[test]
    fn test_derived_computed_once() {
        let ctx = OptimizationContext::new();
        let calls = Cell::new(0);

        let first = ctx.derived("answer", || {
            calls.set(calls.get() + 1);
            42u32
        });
        let second = ctx.derived("answer", || {
            calls.set(calls.get() + 1);
            7u32
        });

        assert_eq!(*first, 42);
        assert_eq!(*second, 42);
        assert_eq!(calls.get(), 1);
    }

    #[test]
    fn test_builder() {
        let ctx = OptimizationContext::for_tasks(&[Task::new("a")])
            .with_importance(BTreeMap::from([("g".to_string(), Importance::High)]))
            .with_changed_files(vec!["dom/base/foo.cpp".to_string()])
            .with_scheduled_components(["linux"]);

        assert_eq!(ctx.candidates().len(), 1);
        assert_eq!(ctx.importance()["g"], Importance::High);
        assert_eq!(ctx.changed_files().unwrap().len(), 1);
        assert!(ctx.scheduled_components().unwrap().contains("linux"));
        assert!(OptimizationContext::new().changed_files().is_none());
    }
}
