//! Gantry Evidence - relevance predictor client
//!
//! This crate fetches per-push relevance evidence from the predictor service,
//! polls while results are pending, aggregates evidence across recent pushes
//! and memoizes everything in an explicit [`EvidenceCache`].

pub mod cache;
pub mod client;
pub mod clock;
pub mod pushlog;
pub mod source;
pub mod types;

pub use cache::{CacheKey, CachedEvidence, EvidenceCache};
pub use client::{PollPolicy, PushScheduleClient};
pub use clock::{Clock, ManualClock, SystemClock};
pub use pushlog::{resolve_revisions, HgPushLog, PushInfo, PushLog};
pub use source::{HttpScheduleSource, ScheduleReply, ScheduleSource};
pub use types::EvidenceResult;
