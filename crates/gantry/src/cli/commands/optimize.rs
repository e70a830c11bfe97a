//! Optimize command

use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

use anyhow::Context;
use clap::Args;
use console::style;
use serde::de::DeserializeOwned;
use serde::Deserialize;
use tracing::info;

use gantry_core::{Importance, PushParams, Task};
use gantry_strategies::{evaluate, OptimizationContext, OptimizationOutcome};

use crate::cli::output;
use crate::cli::{Cli, OutputFormat};

/// Decide which tasks of a push to run
#[derive(Debug, Args)]
pub struct OptimizeCommand {
    /// Push parameters (JSON)
    #[arg(long)]
    pub params: PathBuf,

    /// Task set (JSON list of tasks, or a map of label to task)
    #[arg(long)]
    pub tasks: PathBuf,

    /// Project whose policy to apply (defaults to the push's project)
    #[arg(long)]
    pub project: Option<String>,

    /// Policy purpose
    #[arg(long, default_value = "test")]
    pub purpose: String,

    /// Evaluate a single registered strategy instead of the project policy
    #[arg(long, conflicts_with = "project")]
    pub strategy: Option<String>,

    /// Per-group importance (JSON map of group to low/medium/high)
    #[arg(long)]
    pub importance: Option<PathBuf>,

    /// Files changed by the push, one path per line
    #[arg(long)]
    pub changed_files: Option<PathBuf>,

    /// Components scheduled by the push (JSON list)
    #[arg(long)]
    pub components: Option<PathBuf>,

    /// Only print removed tasks
    #[arg(long)]
    pub removed_only: bool,
}

#[derive(Deserialize)]
#[serde(untagged)]
enum TaskSet {
    List(Vec<Task>),
    Map(BTreeMap<String, Task>),
}

impl TaskSet {
    fn into_tasks(self) -> Vec<Task> {
        match self {
            Self::List(tasks) => tasks,
            Self::Map(tasks) => tasks.into_values().collect(),
        }
    }
}

impl OptimizeCommand {
    /// Execute the optimize command
    pub fn execute(&self, cli: &Cli) -> anyhow::Result<()> {
        let params: PushParams = read_json(&self.params)?;
        let tasks = read_json::<TaskSet>(&self.tasks)?.into_tasks();
        let project = self.project.as_deref().unwrap_or(&params.project);

        info!(
            project,
            purpose = %self.purpose,
            pushlog_id = params.pushlog_id,
            tasks = tasks.len(),
            "executing optimize command"
        );

        let engine = cli.engine()?;
        let (name, strategy) = match &self.strategy {
            Some(name) => (name.clone(), engine.registry.require(name)?),
            None => (
                format!("{}/{}", project, self.purpose),
                engine.policies.require(project, &self.purpose)?,
            ),
        };

        let ctx = self.context(&tasks)?;
        let outcome = evaluate(strategy.as_ref(), &tasks, &params, &ctx).with_context(|| {
            format!(
                "unable to optimize push {} of {}, run the full task set",
                params.pushlog_id, params.project
            )
        })?;

        match cli.format {
            OutputFormat::Json => {
                let output = json_report(project, &self.purpose, &name, &params, &outcome);
                println!("{}", serde_json::to_string_pretty(&output)?);
            }
            OutputFormat::Text => {
                if !cli.quiet {
                    println!("{}", output::header("Optimization Results"));
                    println!();
                    let strategy = output::name_style().apply_to(&name).to_string();
                    println!("{}", output::key_value("Strategy", &strategy));
                    println!("{}", output::key_value("Push", &params.pushlog_id.to_string()));
                    if let Some(pushed) = params.pushdate_utc() {
                        println!("{}", output::key_value("Pushed", &pushed.to_rfc3339()));
                    }
                    println!(
                        "{}",
                        output::key_value(
                            "Tasks",
                            &format!(
                                "{} kept, {} removed",
                                outcome.kept.len(),
                                outcome.removed.len()
                            )
                        )
                    );
                    println!();
                }

                if !self.removed_only {
                    for label in &outcome.kept {
                        println!(
                            "  {} {}",
                            style("+").green(),
                            output::kept_style().apply_to(label)
                        );
                    }
                }
                for label in &outcome.removed {
                    println!("  {} {}", style("-").dim(), output::removed_style().apply_to(label));
                }

                if !cli.quiet {
                    println!();
                    output::success(&format!("Evaluated {} tasks", outcome.total()));
                }
            }
        }

        Ok(())
    }

    fn context(&self, tasks: &[Task]) -> anyhow::Result<OptimizationContext> {
        let mut ctx = OptimizationContext::for_tasks(tasks);

        if let Some(path) = &self.importance {
            let importance: BTreeMap<String, Importance> = read_json(path)?;
            ctx = ctx.with_importance(importance);
        }
        if let Some(path) = &self.changed_files {
            ctx = ctx.with_changed_files(read_lines(path)?);
        }
        if let Some(path) = &self.components {
            let components: Vec<String> = read_json(path)?;
            ctx = ctx.with_scheduled_components(components);
        }

        Ok(ctx)
    }
}

fn json_report(
    project: &str,
    purpose: &str,
    strategy: &str,
    params: &PushParams,
    outcome: &OptimizationOutcome,
) -> serde_json::Value {
    serde_json::json!({
        "project": project,
        "purpose": purpose,
        "strategy": strategy,
        "pushlog_id": params.pushlog_id,
        "pushdate": params.pushdate_utc().map(|d| d.to_rfc3339()),
        "kept": outcome.kept,
        "removed": outcome.removed,
    })
}

fn read_json<T: DeserializeOwned>(path: &Path) -> anyhow::Result<T> {
    let content = std::fs::read_to_string(path)
        .with_context(|| format!("failed to read {}", path.display()))?;
    serde_json::from_str(&content).with_context(|| format!("failed to parse {}", path.display()))
}

fn read_lines(path: &Path) -> anyhow::Result<Vec<String>> {
    let content = std::fs::read_to_string(path)
        .with_context(|| format!("failed to read {}", path.display()))?;
    Ok(content
        .lines()
        .map(str::trim)
        .filter(|line| !line.is_empty())
        .map(str::to_string)
        .collect())
}
