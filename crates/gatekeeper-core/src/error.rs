//! Error types for gate validation

use thiserror::Error;

use crate::provider::ProviderError;
use crate::status::Status;

/// A single problem found while building a validator.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConfigIssue {
    EmptyRepository,
    EmptyOwner,
    EmptyRef,
    EmptySelfJob,
    MissingClient,
}

impl std::fmt::Display for ConfigIssue {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let msg = match self {
            ConfigIssue::EmptyRepository => "repository name is empty",
            ConfigIssue::EmptyOwner => "repository owner is empty",
            ConfigIssue::EmptyRef => "reference of repository is empty",
            ConfigIssue::EmptySelfJob => "self job name is empty",
            ConfigIssue::MissingClient => "github client is empty",
        };
        f.write_str(msg)
    }
}

fn join_issues(issues: &[ConfigIssue]) -> String {
    issues
        .iter()
        .map(ToString::to_string)
        .collect::<Vec<_>>()
        .join("; ")
}

/// Everything that can go wrong while validating a ref.
#[derive(Debug, Error)]
pub enum GateError {
    /// Required validator fields were missing; lists all of them.
    #[error("invalid validator configuration: {}", join_issues(.issues))]
    Configuration { issues: Vec<ConfigIssue> },

    /// The provider call failed.
    #[error(transparent)]
    Provider(#[from] ProviderError),

    /// A check run arrived without a name or status.
    #[error("github checkRun response is invalid name: {name:?}, status: {status:?}")]
    MalformedCheckRun {
        name: Option<String>,
        status: Option<String>,
    },

    /// A check run points at a check suite no workflow run owns.
    #[error("workflow name not found for check suite ID: {suite_id} of run {job}")]
    WorkflowNotFound { suite_id: i64, job: String },

    /// At least one job failed. The message is the status detail report.
    #[error("{}", .status.detail())]
    GateFailure { status: Box<Status> },

    /// The cancellation token fired while a fetch was in flight.
    #[error("validation cancelled")]
    Cancelled,
}

impl GateError {
    /// True when the gate is red, as opposed to a system error.
    pub fn is_gate_failure(&self) -> bool {
        matches!(self, GateError::GateFailure { .. })
    }

    /// The failed status, if this is a gate failure.
    pub fn status(&self) -> Option<&Status> {
        match self {
            GateError::GateFailure { status } => Some(status.as_ref()),
            _ => None,
        }
    }
}

/// Result type for gate operations
pub type Result<T> = std::result::Result<T, GateError>;
