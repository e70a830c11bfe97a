//! Predictor client with polling, aggregation and caching

use std::sync::Arc;
use std::time::Duration;

use tracing::{debug, info, warn};

use gantry_core::config::Config;
use gantry_core::{ConfigError, EvidenceError, PushParams, Result};

use crate::cache::{CacheKey, CachedEvidence, EvidenceCache};
use crate::clock::{Clock, SystemClock};
use crate::pushlog::{resolve_revisions, HgPushLog, PushLog};
use crate::source::{HttpScheduleSource, ScheduleReply, ScheduleSource};
use crate::types::EvidenceResult;

/// How long and how often to poll a pending push
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PollPolicy {
    retry_interval: Duration,
    timeout: Duration,
}

impl PollPolicy {
    /// Create a poll policy, rejecting a zero interval
    pub fn new(retry_interval: Duration, timeout: Duration) -> Result<Self> {
        if retry_interval.is_zero() {
            return Err(
                ConfigError::invalid("predictor.retry_interval_secs", "must be positive").into(),
            );
        }
        Ok(Self {
            retry_interval,
            timeout,
        })
    }

    /// Delay between polls
    pub fn retry_interval(&self) -> Duration {
        self.retry_interval
    }

    /// Maximum total wait for a branch. Try pushes get a third more time.
    pub fn timeout_for(&self, branch: &str) -> Duration {
        if branch == "try" {
            self.timeout.saturating_add(self.timeout / 3)
        } else {
            self.timeout
        }
    }
}

/// Client for per-push relevance evidence
pub struct PushScheduleClient {
    source: Arc<dyn ScheduleSource>,
    pushlog: Arc<dyn PushLog>,
    cache: Arc<EvidenceCache>,
    clock: Arc<dyn Clock>,
    policy: PollPolicy,
}

impl PushScheduleClient {
    /// Create a client from its collaborators
    pub fn new(
        source: Arc<dyn ScheduleSource>,
        pushlog: Arc<dyn PushLog>,
        cache: Arc<EvidenceCache>,
        clock: Arc<dyn Clock>,
        policy: PollPolicy,
    ) -> Self {
        Self {
            source,
            pushlog,
            cache,
            clock,
            policy,
        }
    }

    /// Create an HTTP backed client from configuration
    pub fn from_config(config: &Config, cache: Arc<EvidenceCache>) -> Result<Self> {
        let policy = PollPolicy::new(
            config.predictor.retry_interval(),
            config.predictor.timeout(),
        )?;
        Ok(Self::new(
            Arc::new(HttpScheduleSource::from_config(&config.predictor)?),
            Arc::new(HgPushLog::from_config(&config.pushlog)?),
            cache,
            Arc::new(SystemClock),
            policy,
        ))
    }

    /// The shared evidence cache
    pub fn cache(&self) -> &Arc<EvidenceCache> {
        &self.cache
    }

    /// Evidence for a single push, polled until ready and memoized
    pub fn push_schedules(&self, branch: &str, rev: &str) -> Result<Arc<EvidenceResult>> {
        let key = CacheKey::new(branch, rev, 1);
        if let Some(cached) = self.cache.get(&key) {
            return from_cached(cached, branch, rev);
        }

        match self.poll(branch, rev) {
            Ok(evidence) => {
                let evidence = Arc::new(evidence);
                self.cache
                    .insert(key, CachedEvidence::Ready(Arc::clone(&evidence)));
                Ok(evidence)
            }
            Err(EvidenceError::Timeout { elapsed, .. }) => {
                self.cache.insert(key, CachedEvidence::TimedOut { elapsed });
                Err(timeout(branch, rev, elapsed))
            }
            Err(e) => Err(e.into()),
        }
    }

    /// Evidence merged over the `num_pushes` most recent pushes ending at
    /// `params.pushlog_id`.
    pub fn evidence_for_push(
        &self,
        params: &PushParams,
        num_pushes: usize,
    ) -> Result<Arc<EvidenceResult>> {
        if num_pushes <= 1 {
            return self.push_schedules(&params.branch, &params.head_rev);
        }

        let key = CacheKey::new(params.branch.as_str(), params.head_rev.as_str(), num_pushes);
        if let Some(cached) = self.cache.get(&key) {
            return from_cached(cached, &params.branch, &params.head_rev);
        }

        let current = params.pushlog_id;
        let wanted_start = current - (num_pushes as i64) + 1;
        let start = wanted_start.max(1);
        if start != wanted_start {
            warn!(
                pushlog_id = current,
                num_pushes,
                available = (current - start + 1).max(1),
                "not enough earlier pushes, shrinking evidence window"
            );
        }

        let mut revisions = if current > start {
            resolve_revisions(self.pushlog.as_ref(), &params.head_repository, start, current - 1)?
        } else {
            Vec::new()
        };
        revisions.push((current, params.head_rev.clone()));

        info!(
            branch = %params.branch,
            rev = %params.head_rev,
            pushes = revisions.len(),
            "aggregating predictor evidence"
        );

        let mut merged = EvidenceResult::default();
        for (push_id, rev) in &revisions {
            match self.push_schedules(&params.branch, rev) {
                Ok(evidence) => {
                    debug!(push_id, rev = %rev, "merging push evidence");
                    merged.merge(&evidence);
                }
                Err(gantry_core::GantryError::Evidence(EvidenceError::Timeout { elapsed, .. })) => {
                    self.cache.insert(key, CachedEvidence::TimedOut { elapsed });
                    return Err(timeout(&params.branch, rev, elapsed));
                }
                Err(e) => return Err(e),
            }
        }

        let merged = Arc::new(merged);
        self.cache
            .insert(key, CachedEvidence::Ready(Arc::clone(&merged)));
        Ok(merged)
    }

    fn poll(&self, branch: &str, rev: &str) -> std::result::Result<EvidenceResult, EvidenceError> {
        let timeout = self.policy.timeout_for(branch);
        let interval = self.policy.retry_interval();
        let start = self.clock.now();
        let mut attempts = 0usize;

        loop {
            attempts += 1;
            match self.source.fetch(branch, rev)? {
                ScheduleReply::Ready(evidence) => {
                    let elapsed = self.clock.now().saturating_duration_since(start);
                    info!(
                        branch,
                        rev,
                        attempts,
                        elapsed_secs = elapsed.as_secs(),
                        "predictor results ready"
                    );
                    return Ok(evidence);
                }
                ScheduleReply::Pending => {
                    let elapsed = self.clock.now().saturating_duration_since(start);
                    if elapsed.saturating_add(interval) > timeout {
                        warn!(
                            branch,
                            rev,
                            attempts,
                            elapsed_secs = elapsed.as_secs(),
                            "predictor timed out"
                        );
                        return Err(EvidenceError::Timeout {
                            branch: branch.to_string(),
                            rev: rev.to_string(),
                            elapsed,
                        });
                    }
                    debug!(branch, rev, attempts, "predictor results pending");
                    self.clock.sleep(interval);
                }
            }
        }
    }
}

fn from_cached(cached: CachedEvidence, branch: &str, rev: &str) -> Result<Arc<EvidenceResult>> {
    match cached {
        CachedEvidence::Ready(evidence) => Ok(evidence),
        CachedEvidence::TimedOut { elapsed } => Err(timeout(branch, rev, elapsed)),
    }
}

fn timeout(branch: &str, rev: &str, elapsed: Duration) -> gantry_core::GantryError {
    EvidenceError::Timeout {
        branch: branch.to_string(),
        rev: rev.to_string(),
        elapsed,
    }
    .into()
}
