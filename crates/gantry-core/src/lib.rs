//! Gantry Core - shared foundation for the task optimizer
//!
//! This crate provides the task and push records the optimizer reads, the
//! error taxonomy shared by every gantry crate, and the configuration system.

pub mod config;
pub mod error;
pub mod types;

pub use config::Config;
pub use error::{ConfigError, EvidenceError, GantryError, PushLogError, Result, StrategyError};
pub use types::{Importance, PushParams, Task, TaskAttributes};
