//! Gantry Strategies - task optimization decision engine
//!
//! Every strategy answers one question for a task on a push: can it be
//! skipped? Strategies live in a [`StrategyRegistry`] under stable names and
//! are combined into per-project policies with the [`Any`], [`All`] and
//! [`Not`] composites.

mod attributes;
mod backstop;
mod bugbug;
mod composite;
mod context;
mod disperse;
pub mod optimize;
mod project;
mod registry;
mod selection;
mod traits;

#[cfg(test)]
mod test_support;

pub use attributes::{SkipUnlessDebug, SkipUnlessHasRelevantTests, SkipUnlessSchedules};
pub use backstop::{SkipUnlessBackstop, SkipUnlessExpanded, SkipUnlessPushInterval};
pub use bugbug::BugBugPushSchedules;
pub use composite::{build_strategy, All, Any, Not};
pub use context::OptimizationContext;
pub use disperse::{DispersalPlan, DisperseGroups};
pub use optimize::{evaluate, OptimizationOutcome};
pub use project::ProjectPolicies;
pub use registry::{StrategyRegistry, FALLBACK};
pub use selection::ConfidenceSelector;
pub use traits::OptimizationStrategy;
