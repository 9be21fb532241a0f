//! Normalizes a check run's raw status/conclusion into a job state.

use serde::{Deserialize, Serialize};

use crate::provider::{CheckRunConclusion, CheckRunStatus};

/// Normalized job state.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum JobState {
    Pending,
    Success,
    Error,
}

/// Classify a run. `None` means the run is excluded entirely (skipped).
///
/// | status          | conclusion            | state    |
/// |-----------------|-----------------------|----------|
/// | not completed   | any                   | Pending  |
/// | completed       | success, neutral      | Success  |
/// | completed       | skipped               | excluded |
/// | completed       | anything else or none | Error    |
pub fn classify(
    status: CheckRunStatus,
    conclusion: Option<CheckRunConclusion>,
) -> Option<JobState> {
    if status != CheckRunStatus::Completed {
        return Some(JobState::Pending);
    }

    match conclusion {
        Some(CheckRunConclusion::Success | CheckRunConclusion::Neutral) => Some(JobState::Success),
        Some(CheckRunConclusion::Skipped) => None,
        // A completed run with no conclusion cannot vouch for the ref.
        Some(_) | None => Some(JobState::Error),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_unfinished_runs_are_pending() {
        for status in [
            CheckRunStatus::Queued,
            CheckRunStatus::InProgress,
            CheckRunStatus::Other,
        ] {
            assert_eq!(classify(status, None), Some(JobState::Pending));
        }
        // A stray conclusion does not matter until the run completes.
        assert_eq!(
            classify(CheckRunStatus::InProgress, Some(CheckRunConclusion::Failure)),
            Some(JobState::Pending)
        );
    }

    #[test]
    fn test_success_and_neutral_pass() {
        assert_eq!(
            classify(CheckRunStatus::Completed, Some(CheckRunConclusion::Success)),
            Some(JobState::Success)
        );
        assert_eq!(
            classify(CheckRunStatus::Completed, Some(CheckRunConclusion::Neutral)),
            Some(JobState::Success)
        );
    }

    #[test]
    fn test_skipped_is_excluded() {
        assert_eq!(
            classify(CheckRunStatus::Completed, Some(CheckRunConclusion::Skipped)),
            None
        );
    }

    #[test]
    fn test_other_conclusions_are_errors() {
        for conclusion in [
            CheckRunConclusion::Failure,
            CheckRunConclusion::TimedOut,
            CheckRunConclusion::Cancelled,
            CheckRunConclusion::ActionRequired,
            CheckRunConclusion::Stale,
            CheckRunConclusion::StartupFailure,
            CheckRunConclusion::Other,
        ] {
            assert_eq!(
                classify(CheckRunStatus::Completed, Some(conclusion)),
                Some(JobState::Error),
                "{conclusion:?}"
            );
        }
    }

    #[test]
    fn test_completed_without_conclusion_is_error() {
        assert_eq!(
            classify(CheckRunStatus::Completed, None),
            Some(JobState::Error)
        );
    }
}
