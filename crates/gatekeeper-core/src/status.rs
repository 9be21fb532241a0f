//! Verdict aggregation.
//!
//! Folds correlated jobs into a [`Status`]. Jobs named after the gate itself
//! or listed as ignored count as satisfied and never reach `total_jobs`.
//! Any error job makes [`aggregate`] fail with [`GateError::GateFailure`],
//! even while other jobs are still pending.

use serde::{Deserialize, Serialize};
use tracing::info;

use crate::classify::JobState;
use crate::correlate::CorrelatedJob;
use crate::error::{GateError, Result};

/// Outcome of one validation pass. Lists keep encounter order.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Status {
    total_jobs: Vec<String>,
    complete_jobs: Vec<String>,
    err_jobs: Vec<String>,
    ignored_jobs: Vec<String>,
    succeeded: bool,
}

impl Status {
    /// Build a status from its parts. `succeeded` is taken as given.
    pub fn new(
        total_jobs: Vec<String>,
        complete_jobs: Vec<String>,
        err_jobs: Vec<String>,
        ignored_jobs: Vec<String>,
        succeeded: bool,
    ) -> Self {
        Status {
            total_jobs,
            complete_jobs,
            err_jobs,
            ignored_jobs,
            succeeded,
        }
    }

    /// Every non-exempt job, as `"Workflow / job"`.
    pub fn total_jobs(&self) -> &[String] {
        &self.total_jobs
    }

    pub fn complete_jobs(&self) -> &[String] {
        &self.complete_jobs
    }

    pub fn err_jobs(&self) -> &[String] {
        &self.err_jobs
    }

    /// Configured ignore list, by job name.
    pub fn ignored_jobs(&self) -> &[String] {
        &self.ignored_jobs
    }

    pub fn is_success(&self) -> bool {
        self.succeeded
    }

    /// Multi-line report of every job list. Deterministic for a given input.
    pub fn detail(&self) -> String {
        format!(
            "{} out of {}

  Total job count:     {}
    jobs: {:?}
  Completed job count: {}
    jobs: {:?}
  Failed job count:    {}
    jobs: {:?}
  Ignored job count:   {}
    jobs: {:?}
",
            self.complete_jobs.len(),
            self.total_jobs.len(),
            self.total_jobs.len(),
            self.total_jobs,
            self.complete_jobs.len(),
            self.complete_jobs,
            self.err_jobs.len(),
            self.err_jobs,
            self.ignored_jobs.len(),
            self.ignored_jobs,
        )
    }
}

/// Aggregate correlated jobs into a verdict.
///
/// Returns `Err(GateError::GateFailure)` when any non-exempt job errored,
/// `Ok` with `is_success() == false` while jobs are pending, and `Ok` with
/// `is_success() == true` once every job has passed.
pub fn aggregate(
    jobs: &[CorrelatedJob],
    self_job_name: &str,
    ignored_jobs: &[String],
) -> Result<Status> {
    let mut status = Status {
        total_jobs: Vec::with_capacity(jobs.len()),
        complete_jobs: Vec::with_capacity(jobs.len()),
        err_jobs: Vec::new(),
        ignored_jobs: ignored_jobs.to_vec(),
        succeeded: true,
    };

    let mut success_count = 0usize;
    for job in jobs {
        // Ignored jobs and the gate itself count as passed whatever their state.
        if job.job == self_job_name || ignored_jobs.iter().any(|ignored| *ignored == job.job) {
            success_count += 1;
            continue;
        }

        let key = job.key();
        status.total_jobs.push(key.clone());
        match job.state {
            JobState::Success => {
                status.complete_jobs.push(key);
                success_count += 1;
            }
            JobState::Error => status.err_jobs.push(key),
            JobState::Pending => {}
        }
    }

    if !status.err_jobs.is_empty() {
        status.succeeded = false;
        info!(failed = status.err_jobs.len(), "gate failed");
        return Err(GateError::GateFailure {
            status: Box::new(status),
        });
    }

    status.succeeded = success_count == jobs.len();
    info!(
        complete = status.complete_jobs.len(),
        total = status.total_jobs.len(),
        succeeded = status.succeeded,
        "aggregated job statuses"
    );
    Ok(status)
}
