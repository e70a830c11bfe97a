//! CLI definition and command handling

pub mod commands;
pub mod output;

use std::path::PathBuf;
use std::sync::Arc;

use clap::{Parser, Subcommand};
use tracing::info;

use gantry_core::config::{load_config, load_config_or_default, Config};
use gantry_evidence::{EvidenceCache, PushScheduleClient};
use gantry_strategies::{ProjectPolicies, StrategyRegistry};

use commands::{OptimizeCommand, StrategiesCommand};

/// Gantry - task optimization decision engine for CI pushes
#[derive(Debug, Parser)]
#[command(name = "gantry")]
#[command(author, version, about, long_about = None)]
#[command(propagate_version = true)]
pub struct Cli {
    /// Enable verbose output
    #[arg(short, long, global = true)]
    pub verbose: bool,

    /// Suppress output except errors
    #[arg(short, long, global = true)]
    pub quiet: bool,

    /// Output format
    #[arg(long, global = true, default_value = "text")]
    pub format: OutputFormat,

    /// Working directory
    #[arg(short = 'C', long, global = true)]
    pub directory: Option<PathBuf>,

    /// Configuration file (searched upward from the working directory by default)
    #[arg(long, global = true, env = "GANTRY_CONFIG")]
    pub config: Option<PathBuf>,

    #[command(subcommand)]
    pub command: Commands,
}

/// Output format for CLI
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, clap::ValueEnum)]
pub enum OutputFormat {
    /// Human-readable text output
    #[default]
    Text,
    /// JSON output
    Json,
}

/// Available commands
#[derive(Debug, Subcommand)]
pub enum Commands {
    /// Decide which tasks of a push to run
    Optimize(OptimizeCommand),

    /// List registered strategies and project policies
    Strategies(StrategiesCommand),
}

/// Configuration, registry and policies shared by the commands
pub struct Engine {
    pub config: Config,
    pub config_path: Option<PathBuf>,
    pub registry: StrategyRegistry,
    pub policies: ProjectPolicies,
}

impl Cli {
    /// Execute the CLI command
    pub fn execute(&self) -> anyhow::Result<()> {
        // Change to specified directory if provided
        if let Some(dir) = &self.directory {
            std::env::set_current_dir(dir)?;
        }

        match &self.command {
            Commands::Optimize(cmd) => cmd.execute(self),
            Commands::Strategies(cmd) => cmd.execute(self),
        }
    }

    /// Load configuration and build the registry and policies from it
    pub fn engine(&self) -> anyhow::Result<Engine> {
        let (config, config_path) = match &self.config {
            Some(path) => (load_config(path)?, Some(path.clone())),
            None => load_config_or_default(&std::env::current_dir()?)?,
        };
        info!(
            config = ?config_path,
            predictor = %config.predictor.base_url,
            "loaded configuration"
        );

        let client = PushScheduleClient::from_config(&config, Arc::new(EvidenceCache::new()))?;
        let registry = StrategyRegistry::builtin(&config, Arc::new(client))?;
        let policies = ProjectPolicies::from_config(&config, &registry)?;

        Ok(Engine {
            config,
            config_path,
            registry,
            policies,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_optimize() {
        let cli = Cli::try_parse_from([
            "gantry",
            "--format",
            "json",
            "optimize",
            "--params",
            "params.json",
            "--tasks",
            "tasks.json",
        ])
        .unwrap();

        assert_eq!(cli.format, OutputFormat::Json);
        match cli.command {
            Commands::Optimize(cmd) => {
                assert_eq!(cmd.params, PathBuf::from("params.json"));
                assert_eq!(cmd.purpose, "test");
                assert!(cmd.importance.is_none());
            }
            other => panic!("expected optimize, got {:?}", other),
        }
    }

    #[test]
    fn test_engine_from_config_file() {
        let temp = tempfile::TempDir::new().unwrap();
        let path = temp.path().join("gantry.toml");
        std::fs::write(
            &path,
            r#"
[[policies]]
project = "mozilla-central"
purpose = "test"
strategy = "skip-unless-backstop"
"#,
        )
        .unwrap();

        let cli = Cli::try_parse_from([
            "gantry",
            "--config",
            path.to_str().unwrap(),
            "strategies",
        ])
        .unwrap();
        let engine = cli.engine().unwrap();

        assert_eq!(engine.config_path, Some(path));
        assert!(engine.policies.get("mozilla-central", "test").is_some());
        assert!(engine.policies.get("autoland", "test").is_some());
        assert!(engine.registry.get("bugbug-low").is_some());
    }
}
