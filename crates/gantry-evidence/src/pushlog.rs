//! Push log resolution for multi-push aggregation

use std::collections::BTreeMap;
use std::time::Duration;

use serde::{Deserialize, Serialize};
use tracing::debug;

use gantry_core::config::PushLogConfig;
use gantry_core::PushLogError;

/// One push from the push log
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PushInfo {
    /// Changesets in push order
    #[serde(default)]
    pub changesets: Vec<String>,
}

/// Resolves a range of push ids to their changesets
pub trait PushLog: Send + Sync {
    /// Pushes with ids in `start..=end`, keyed by push id
    fn pushes(
        &self,
        repository: &str,
        start: i64,
        end: i64,
    ) -> Result<BTreeMap<i64, PushInfo>, PushLogError>;
}

/// Mercurial `json-pushes` push log
#[derive(Debug, Clone)]
pub struct HgPushLog {
    client: reqwest::blocking::Client,
}

#[derive(Debug, Deserialize)]
struct PushLogReply {
    #[serde(default)]
    pushes: BTreeMap<i64, PushInfo>,
}

impl HgPushLog {
    /// Create a push log client with the given request timeout
    pub fn new(timeout: Duration) -> Result<Self, PushLogError> {
        let client = reqwest::blocking::Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| PushLogError::Http {
                url: String::new(),
                message: e.to_string(),
            })?;
        Ok(Self { client })
    }

    /// Create a push log client from configuration
    pub fn from_config(config: &PushLogConfig) -> Result<Self, PushLogError> {
        Self::new(Duration::from_secs(config.timeout_secs))
    }

    /// URL listing pushes `start..=end` (`startID` is exclusive)
    pub fn pushes_url(repository: &str, start: i64, end: i64) -> String {
        format!(
            "{}/json-pushes/?version=2&startID={}&endID={}",
            repository.trim_end_matches('/'),
            start - 1,
            end
        )
    }
}

impl PushLog for HgPushLog {
    fn pushes(
        &self,
        repository: &str,
        start: i64,
        end: i64,
    ) -> Result<BTreeMap<i64, PushInfo>, PushLogError> {
        let url = Self::pushes_url(repository, start, end);
        debug!(url = %url, "querying push log");

        let response = self
            .client
            .get(&url)
            .send()
            .and_then(|r| r.error_for_status())
            .map_err(|e| PushLogError::Http {
                url: url.clone(),
                message: e.to_string(),
            })?;

        let reply: PushLogReply = response.json().map_err(|e| PushLogError::Decode {
            url,
            message: e.to_string(),
        })?;

        Ok(reply.pushes)
    }
}

/// Resolve the head revision of every push in `start..=end`, oldest first.
///
/// Every push in the range must be present; a shortfall is an error rather
/// than a smaller window.
pub fn resolve_revisions(
    log: &dyn PushLog,
    repository: &str,
    start: i64,
    end: i64,
) -> Result<Vec<(i64, String)>, PushLogError> {
    if start > end {
        return Ok(Vec::new());
    }

    let pushes = log.pushes(repository, start, end)?;
    (start..=end)
        .map(|push_id| {
            let push = pushes
                .get(&push_id)
                .ok_or(PushLogError::MissingPush { push_id, start, end })?;
            let rev = push
                .changesets
                .last()
                .ok_or(PushLogError::EmptyPush(push_id))?;
            Ok((push_id, rev.clone()))
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    struct FixedLog(BTreeMap<i64, PushInfo>);

    impl PushLog for FixedLog {
        fn pushes(
            &self,
            _repository: &str,
            _start: i64,
            _end: i64,
        ) -> Result<BTreeMap<i64, PushInfo>, PushLogError> {
            Ok(self.0.clone())
        }
    }

    fn push(changesets: &[&str]) -> PushInfo {
        PushInfo {
            changesets: changesets.iter().map(|c| c.to_string()).collect(),
        }
    }

    #[test]
    fn test_pushes_url_start_is_exclusive() {
        assert_eq!(
            HgPushLog::pushes_url("https://hg.mozilla.org/integration/autoland", 9, 9),
            "https://hg.mozilla.org/integration/autoland/json-pushes/?version=2&startID=8&endID=9"
        );
    }

    #[test]
    fn test_resolve_takes_last_changeset() {
        let log = FixedLog(BTreeMap::from([
            (7, push(&["a7"])),
            (8, push(&["a8", "b8"])),
            (9, push(&["c9"])),
        ]));

        let revs = resolve_revisions(&log, "repo", 8, 9).unwrap();
        assert_eq!(revs, vec![(8, "b8".to_string()), (9, "c9".to_string())]);
    }

    #[test]
    fn test_resolve_missing_push_is_error() {
        let log = FixedLog(BTreeMap::from([(9, push(&["c9"]))]));

        let err = resolve_revisions(&log, "repo", 8, 9).unwrap_err();
        assert!(matches!(err, PushLogError::MissingPush { push_id: 8, .. }));
    }

    #[test]
    fn test_resolve_empty_push_is_error() {
        let log = FixedLog(BTreeMap::from([(9, push(&[]))]));
        assert!(matches!(
            resolve_revisions(&log, "repo", 9, 9).unwrap_err(),
            PushLogError::EmptyPush(9)
        ));
    }

    #[test]
    fn test_empty_range() {
        let log = FixedLog(BTreeMap::new());
        assert!(resolve_revisions(&log, "repo", 10, 9).unwrap().is_empty());
    }

    #[test]
    fn test_hg_push_log_over_http() {
        let mut server = mockito::Server::new();
        let mock = server
            .mock("GET", "/integration/autoland/json-pushes/")
            .match_query(mockito::Matcher::AllOf(vec![
                mockito::Matcher::UrlEncoded("version".into(), "2".into()),
                mockito::Matcher::UrlEncoded("startID".into(), "8".into()),
                mockito::Matcher::UrlEncoded("endID".into(), "9".into()),
            ]))
            .with_status(200)
            .with_header("content-type", "application/json")
            .with_body(r#"{"lastpushid": 9, "pushes": {"9": {"changesets": ["c9"], "user": "someone"}}}"#)
            .create();

        let log = HgPushLog::new(Duration::from_secs(5)).unwrap();
        let repo = format!("{}/integration/autoland", server.url());
        let revs = resolve_revisions(&log, &repo, 9, 9).unwrap();

        mock.assert();
        assert_eq!(revs, vec![(9, "c9".to_string())]);
    }
}
