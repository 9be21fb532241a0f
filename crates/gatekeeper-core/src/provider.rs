//! Provider client contract.
//!
//! The core never talks HTTP itself. Anything that can list the check runs
//! and workflow runs of a ref implements [`CheckProvider`]; the GitHub REST
//! implementation lives in `gatekeeper-github` and an in-memory one in
//! [`crate::fakes`].
//!
//! The entity types below deserialize straight from GitHub's JSON payloads.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Errors surfaced by a provider. The validator propagates them unchanged.
#[derive(Debug, Error)]
pub enum ProviderError {
    /// The provider answered with a non-success status (auth, rate limit, not found).
    #[error("provider returned HTTP {status}: {message}")]
    Status { status: u16, message: String },

    /// The request never produced a response.
    #[error("provider transport error: {0}")]
    Transport(String),

    /// The response body could not be decoded.
    #[error("failed to decode provider response: {0}")]
    Decode(String),

    #[error("provider error: {0}")]
    Other(String),
}

/// Lifecycle state of a check run.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CheckRunStatus {
    Queued,
    InProgress,
    Completed,
    /// `waiting`, `requested`, `pending` and anything newer.
    #[serde(other)]
    Other,
}

impl CheckRunStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            CheckRunStatus::Queued => "queued",
            CheckRunStatus::InProgress => "in_progress",
            CheckRunStatus::Completed => "completed",
            CheckRunStatus::Other => "other",
        }
    }
}

impl std::fmt::Display for CheckRunStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Final outcome of a completed check run.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CheckRunConclusion {
    Success,
    Neutral,
    Skipped,
    Failure,
    TimedOut,
    Cancelled,
    ActionRequired,
    Stale,
    StartupFailure,
    #[serde(other)]
    Other,
}

/// Reference to the check suite a run belongs to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct CheckSuiteRef {
    pub id: i64,
}

/// One execution of a named job against a ref.
///
/// Fields are optional because providers are not trusted to send them;
/// the correlator rejects runs that lack a name or status.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct CheckRun {
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub status: Option<CheckRunStatus>,
    #[serde(default)]
    pub conclusion: Option<CheckRunConclusion>,
    #[serde(default)]
    pub check_suite: Option<CheckSuiteRef>,
}

impl CheckRun {
    /// A run that has not finished yet.
    pub fn in_flight(name: impl Into<String>, status: CheckRunStatus, suite_id: i64) -> Self {
        CheckRun {
            name: Some(name.into()),
            status: Some(status),
            conclusion: None,
            check_suite: Some(CheckSuiteRef { id: suite_id }),
        }
    }

    /// A completed run with the given conclusion.
    pub fn completed(
        name: impl Into<String>,
        conclusion: CheckRunConclusion,
        suite_id: i64,
    ) -> Self {
        CheckRun {
            name: Some(name.into()),
            status: Some(CheckRunStatus::Completed),
            conclusion: Some(conclusion),
            check_suite: Some(CheckSuiteRef { id: suite_id }),
        }
    }

    /// Owning check suite id; 0 when the provider omitted it.
    pub fn check_suite_id(&self) -> i64 {
        self.check_suite.map(|s| s.id).unwrap_or_default()
    }
}

/// One page of check runs together with the provider-reported total.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct CheckRunPage {
    #[serde(default)]
    pub total_count: usize,
    #[serde(default)]
    pub check_runs: Vec<CheckRun>,
}

/// One workflow invocation. Each maps to exactly one check suite.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct WorkflowRun {
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub check_suite_id: i64,
}

impl WorkflowRun {
    pub fn new(name: impl Into<String>, check_suite_id: i64) -> Self {
        WorkflowRun {
            name: Some(name.into()),
            check_suite_id,
        }
    }
}

/// Capability interface over a check-run host.
///
/// Implementations must return runs most-recent-first; the correlator relies
/// on that order to keep only the latest attempt of each job.
#[async_trait]
pub trait CheckProvider: Send + Sync {
    /// List one page (1-based) of check runs for `git_ref`.
    async fn list_check_runs(
        &self,
        owner: &str,
        repo: &str,
        git_ref: &str,
        page: u32,
        per_page: u32,
    ) -> Result<CheckRunPage, ProviderError>;

    /// List every workflow run whose head is `git_ref`.
    async fn list_workflow_runs(
        &self,
        owner: &str,
        repo: &str,
        git_ref: &str,
    ) -> Result<Vec<WorkflowRun>, ProviderError>;
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_check_run_page_from_github_payload() {
        let payload = json!({
            "total_count": 2,
            "check_runs": [
                {
                    "id": 4,
                    "name": "build",
                    "status": "completed",
                    "conclusion": "timed_out",
                    "check_suite": { "id": 5 }
                },
                {
                    "id": 5,
                    "name": "lint",
                    "status": "waiting",
                    "conclusion": null,
                    "check_suite": { "id": 5 }
                }
            ]
        });

        let page: CheckRunPage = serde_json::from_value(payload).unwrap();
        assert_eq!(page.total_count, 2);
        assert_eq!(
            page.check_runs[0],
            CheckRun::completed("build", CheckRunConclusion::TimedOut, 5)
        );
        assert_eq!(page.check_runs[1].status, Some(CheckRunStatus::Other));
        assert_eq!(page.check_runs[1].conclusion, None);
    }

    #[test]
    fn test_unknown_conclusion_is_other() {
        let run: CheckRun = serde_json::from_value(json!({
            "name": "deploy",
            "status": "completed",
            "conclusion": "something_new"
        }))
        .unwrap();
        assert_eq!(run.conclusion, Some(CheckRunConclusion::Other));
    }

    #[test]
    fn test_missing_check_suite_defaults_to_zero() {
        let run: CheckRun = serde_json::from_value(json!({ "name": "x" })).unwrap();
        assert_eq!(run.check_suite_id(), 0);
        assert_eq!(run.status, None);
    }

    #[test]
    fn test_workflow_run_with_null_name() {
        let wf: WorkflowRun =
            serde_json::from_value(json!({ "name": null, "check_suite_id": 9 })).unwrap();
        assert_eq!(wf.name, None);
        assert_eq!(wf.check_suite_id, 9);
    }
}
