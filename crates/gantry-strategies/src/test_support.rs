//! Shared fixtures for strategy tests

use gantry_core::{PushParams, Task, TaskAttributes};

pub fn params() -> PushParams {
    PushParams::new(
        "autoland",
        "integration/autoland",
        "https://hg.mozilla.org/integration/autoland",
        "abcdef",
        1,
    )
}

fn numbered(attributes: Vec<TaskAttributes>) -> Vec<Task> {
    attributes
        .into_iter()
        .enumerate()
        .map(|(i, attrs)| Task::new(format!("task-{}", i)).with_attributes(attrs))
        .collect()
}

/// task-0: foo+bar manifests, task-1: bar (debug), task-2: debug build,
/// task-3: empty manifests (opt), task-4: opt build
pub fn default_tasks() -> Vec<Task> {
    numbered(vec![
        TaskAttributes::default().with_test_manifests(["foo/test.ini", "bar/test.ini"]),
        TaskAttributes::default()
            .with_test_manifests(["bar/test.ini"])
            .with_build_type("debug"),
        TaskAttributes::default().with_build_type("debug"),
        TaskAttributes::default()
            .with_test_manifests(Vec::<String>::new())
            .with_build_type("opt"),
        TaskAttributes::default().with_build_type("opt"),
    ])
}

/// Five tasks sharing "bar/test.ini" across platforms and variants
pub fn disperse_tasks() -> Vec<Task> {
    numbered(vec![
        TaskAttributes::default()
            .with_test_manifests(["foo/test.ini", "bar/test.ini"])
            .with_test_platform("linux/opt"),
        TaskAttributes::default()
            .with_test_manifests(["bar/test.ini"])
            .with_test_platform("linux/opt"),
        TaskAttributes::default()
            .with_test_manifests(["bar/test.ini"])
            .with_test_platform("windows/debug"),
        TaskAttributes::default()
            .with_test_manifests(["bar/test.ini"])
            .with_test_platform("linux/opt")
            .with_unittest_variant("fission"),
        TaskAttributes::default()
            .with_test_manifests(["bar/test.ini"])
            .with_test_platform("linux/opt")
            .with_e10s(false),
    ])
}

pub fn labels(tasks: &[Task]) -> Vec<String> {
    tasks.iter().map(|t| t.label.clone()).collect()
}
