//! Strategies command

use clap::Args;
use tracing::info;

use crate::cli::output;
use crate::cli::{Cli, OutputFormat};

/// List registered strategies and project policies
#[derive(Debug, Args)]
pub struct StrategiesCommand {
    /// Also show each strategy's description
    #[arg(short, long)]
    pub long: bool,
}

impl StrategiesCommand {
    /// Execute the strategies command
    pub fn execute(&self, cli: &Cli) -> anyhow::Result<()> {
        info!(long = self.long, "executing strategies command");
        let engine = cli.engine()?;

        match cli.format {
            OutputFormat::Json => {
                let strategies: Vec<_> = engine
                    .registry
                    .iter()
                    .map(|(name, strategy)| {
                        serde_json::json!({
                            "name": name,
                            "description": strategy.description(),
                        })
                    })
                    .collect();
                let policies: Vec<_> = engine
                    .policies
                    .keys()
                    .map(|(project, purpose)| {
                        serde_json::json!({ "project": project, "purpose": purpose })
                    })
                    .collect();
                let output = serde_json::json!({
                    "config_path": engine.config_path.map(|p| p.to_string_lossy().to_string()),
                    "strategies": strategies,
                    "policies": policies,
                });
                println!("{}", serde_json::to_string_pretty(&output)?);
            }
            OutputFormat::Text => {
                if !cli.quiet {
                    println!("{}", output::header("Strategies"));
                }
                for (name, strategy) in engine.registry.iter() {
                    if self.long {
                        println!(
                            "  {} {}",
                            output::name_style().apply_to(name),
                            console::style(strategy.description()).dim()
                        );
                    } else {
                        println!("  {}", output::name_style().apply_to(name));
                    }
                }

                if !cli.quiet {
                    println!();
                    println!("{}", output::header("Policies"));
                    for (project, purpose) in engine.policies.keys() {
                        println!("  {}/{}", project, purpose);
                    }
                    if engine.config_path.is_none() {
                        println!();
                        output::warning("No configuration file found, using defaults");
                    }
                }
            }
        }

        Ok(())
    }
}
