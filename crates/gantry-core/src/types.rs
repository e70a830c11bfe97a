//! Core types for gantry

use std::collections::BTreeMap;
use std::fmt;

use chrono::{DateTime, TimeZone, Utc};
use serde::{Deserialize, Deserializer, Serialize};

/// A task from the already-built task graph.
///
/// Tasks are produced once per push by the graph builder and only read by
/// the optimizer.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Task {
    /// Unique task label
    pub label: String,
    /// Kind the task was generated from (e.g. "test")
    #[serde(default)]
    pub kind: String,
    /// Task attributes
    #[serde(default)]
    pub attributes: TaskAttributes,
    /// Hard dependencies, keyed by dependency name
    #[serde(default)]
    pub dependencies: BTreeMap<String, String>,
    /// Soft dependencies (labels)
    #[serde(default)]
    pub soft_dependencies: Vec<String>,
}

impl Task {
    /// Create a new test task with default attributes
    pub fn new(label: impl Into<String>) -> Self {
        Self {
            label: label.into(),
            kind: "test".to_string(),
            attributes: TaskAttributes::default(),
            dependencies: BTreeMap::new(),
            soft_dependencies: Vec::new(),
        }
    }

    /// Set the attributes
    pub fn with_attributes(mut self, attributes: TaskAttributes) -> Self {
        self.attributes = attributes;
        self
    }

    /// Test manifests of this task, empty when it is not manifest driven
    pub fn test_manifests(&self) -> &[String] {
        self.attributes.test_manifests.as_deref().unwrap_or(&[])
    }
}

/// Attributes the optimizer reads from a task
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct TaskAttributes {
    /// Test groups (manifests) run by this task
    pub test_manifests: Option<Vec<String>>,
    /// Build type (opt, debug, ...)
    pub build_type: Option<String>,
    /// Test platform, e.g. "linux/opt"
    pub test_platform: Option<String>,
    /// Test variant, e.g. "fission"
    pub unittest_variant: Option<String>,
    /// Test suite name
    pub unittest_suite: Option<String>,
    /// Whether the task runs multi-process
    pub e10s: bool,
    /// Components that schedule this task
    pub schedules: Vec<String>,
    /// Any other attribute
    #[serde(flatten)]
    pub extra: BTreeMap<String, serde_json::Value>,
}

impl Default for TaskAttributes {
    fn default() -> Self {
        Self {
            test_manifests: None,
            build_type: None,
            test_platform: None,
            unittest_variant: None,
            unittest_suite: None,
            e10s: true,
            schedules: Vec::new(),
            extra: BTreeMap::new(),
        }
    }
}

impl TaskAttributes {
    /// Set the test manifests
    pub fn with_test_manifests<I, S>(mut self, manifests: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.test_manifests = Some(manifests.into_iter().map(Into::into).collect());
        self
    }

    /// Set the build type
    pub fn with_build_type(mut self, build_type: impl Into<String>) -> Self {
        self.build_type = Some(build_type.into());
        self
    }

    /// Set the test platform
    pub fn with_test_platform(mut self, platform: impl Into<String>) -> Self {
        self.test_platform = Some(platform.into());
        self
    }

    /// Set the test variant
    pub fn with_unittest_variant(mut self, variant: impl Into<String>) -> Self {
        self.unittest_variant = Some(variant.into());
        self
    }

    /// Set the test suite
    pub fn with_unittest_suite(mut self, suite: impl Into<String>) -> Self {
        self.unittest_suite = Some(suite.into());
        self
    }

    /// Set whether the task runs multi-process
    pub fn with_e10s(mut self, e10s: bool) -> Self {
        self.e10s = e10s;
        self
    }

    /// Set the scheduling components
    pub fn with_schedules<I, S>(mut self, components: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.schedules = components.into_iter().map(Into::into).collect();
        self
    }

    /// Whether this is a debug build
    pub fn is_debug(&self) -> bool {
        self.build_type.as_deref() == Some("debug")
    }
}

/// Per-push parameters
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PushParams {
    /// Branch the push landed on, e.g. "integration/autoland"
    pub branch: String,
    /// Repository URL
    pub head_repository: String,
    /// Changeset id of the push head
    pub head_rev: String,
    /// Project name, e.g. "autoland"
    pub project: String,
    /// Push log id, `-1` when the push is not in the push log
    #[serde(deserialize_with = "deserialize_push_id")]
    pub pushlog_id: i64,
    /// Push time (unix seconds)
    #[serde(default)]
    pub pushdate: i64,
    /// Whether this push runs the full, unoptimized task set
    #[serde(default)]
    pub backstop: bool,
}

impl PushParams {
    /// Create push parameters for a project
    pub fn new(
        project: impl Into<String>,
        branch: impl Into<String>,
        head_repository: impl Into<String>,
        head_rev: impl Into<String>,
        pushlog_id: i64,
    ) -> Self {
        Self {
            branch: branch.into(),
            head_repository: head_repository.into(),
            head_rev: head_rev.into(),
            project: project.into(),
            pushlog_id,
            pushdate: 0,
            backstop: false,
        }
    }

    /// Set the push log id
    pub fn with_pushlog_id(mut self, pushlog_id: i64) -> Self {
        self.pushlog_id = pushlog_id;
        self
    }

    /// Set the backstop flag
    pub fn with_backstop(mut self, backstop: bool) -> Self {
        self.backstop = backstop;
        self
    }

    /// Push time as a UTC timestamp, `None` when the push date is unset
    pub fn pushdate_utc(&self) -> Option<DateTime<Utc>> {
        if self.pushdate <= 0 {
            return None;
        }
        Utc.timestamp_opt(self.pushdate, 0).single()
    }
}

/// Push log ids show up both as numbers and as strings in parameter files
fn deserialize_push_id<'de, D>(deserializer: D) -> std::result::Result<i64, D::Error>
where
    D: Deserializer<'de>,
{
    #[derive(Deserialize)]
    #[serde(untagged)]
    enum PushId {
        Number(i64),
        Text(String),
    }

    match PushId::deserialize(deserializer)? {
        PushId::Number(n) => Ok(n),
        PushId::Text(s) => s.trim().parse().map_err(serde::de::Error::custom),
    }
}

/// Assessed risk of skipping a test group
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Importance {
    /// Coarsest coverage
    Low,
    /// Intermediate coverage
    Medium,
    /// Closest to full coverage
    High,
}

impl Importance {
    /// Returns the string representation of the importance
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Low => "low",
            Self::Medium => "medium",
            Self::High => "high",
        }
    }
}

impl fmt::Display for Importance {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_task_from_json_defaults() {
        let task: Task = serde_json::from_str(
            r#"{"label": "test-linux/opt-mochitest-1", "attributes": {"test_manifests": ["a/b.ini"], "flavor": "plain"}}"#,
        )
        .unwrap();

        assert_eq!(task.kind, "");
        assert!(task.attributes.e10s);
        assert_eq!(task.test_manifests(), ["a/b.ini".to_string()]);
        assert_eq!(task.attributes.extra["flavor"], "plain");
        assert!(task.dependencies.is_empty());
    }

    #[test]
    fn test_missing_manifests_is_empty_slice() {
        let task = Task::new("build");
        assert!(task.attributes.test_manifests.is_none());
        assert!(task.test_manifests().is_empty());
    }

    #[test]
    fn test_push_params_accepts_string_push_id() {
        let params: PushParams = serde_json::from_str(
            r#"{
                "branch": "integration/autoland",
                "head_repository": "https://hg.mozilla.org/integration/autoland",
                "head_rev": "abcdef",
                "project": "autoland",
                "pushlog_id": "42",
                "pushdate": 1590000000
            }"#,
        )
        .unwrap();

        assert_eq!(params.pushlog_id, 42);
        assert!(!params.backstop);
        assert_eq!(params.pushdate_utc().unwrap().timestamp(), 1590000000);

        let mut unset = params.clone();
        unset.pushdate = 0;
        assert!(unset.pushdate_utc().is_none());
    }

    #[test]
    fn test_importance_order() {
        let level: Importance = serde_json::from_str(r#""medium""#).unwrap();
        assert_eq!(level, Importance::Medium);
        assert!(Importance::Low < Importance::High);
    }
}
