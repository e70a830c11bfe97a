//! CLI commands

mod optimize;
mod strategies;

pub use optimize::OptimizeCommand;
pub use strategies::StrategiesCommand;
