//! Correlates check runs with the workflows that produced them.
//!
//! GitHub check runs only know their check suite; workflow runs know both the
//! suite and the workflow name. Joining the two yields a `"Workflow / job"`
//! key per run, which is also the deduplication key for re-runs.

use std::collections::{HashMap, HashSet};

use serde::Serialize;
use tracing::debug;

use crate::classify::{classify, JobState};
use crate::error::{GateError, Result};
use crate::provider::{CheckRun, WorkflowRun};

/// One distinct `(workflow, job)` pair with its normalized state.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct CorrelatedJob {
    pub job: String,
    pub workflow: String,
    pub state: JobState,
}

impl CorrelatedJob {
    /// Display key, `"{workflow} / {job}"`.
    pub fn key(&self) -> String {
        check_key(&self.workflow, &self.job)
    }
}

impl std::fmt::Display for CorrelatedJob {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{} / {}", self.workflow, self.job)
    }
}

fn check_key(workflow: &str, job: &str) -> String {
    format!("{} / {}", workflow, job)
}

/// Map check suite id to workflow name. A workflow run without a name maps
/// to the empty string; a later run with the same suite id overwrites it.
pub fn suite_workflow_map(workflow_runs: &[WorkflowRun]) -> HashMap<i64, String> {
    let mut map = HashMap::with_capacity(workflow_runs.len());
    for wf in workflow_runs {
        let name = wf.name.clone().unwrap_or_default();
        debug!(workflow = %name, check_suite_id = wf.check_suite_id, "found workflow");
        map.insert(wf.check_suite_id, name);
    }
    map
}

/// Correlate, deduplicate and classify check runs.
///
/// `check_runs` must be in provider order (most recent first): the first run
/// seen for a key wins, so reordering the input changes which attempt counts.
/// Skipped runs still claim their key. Any malformed run or unknown suite
/// aborts the whole pass.
pub fn correlate(
    check_runs: &[CheckRun],
    workflow_runs: &[WorkflowRun],
) -> Result<Vec<CorrelatedJob>> {
    let suite_to_workflow = suite_workflow_map(workflow_runs);
    let mut seen: HashSet<String> = HashSet::new();
    let mut jobs = Vec::with_capacity(check_runs.len());

    for run in check_runs {
        let (name, status) = match (&run.name, run.status) {
            (Some(name), Some(status)) => (name, status),
            _ => {
                return Err(GateError::MalformedCheckRun {
                    name: run.name.clone(),
                    status: run.status.map(|s| s.to_string()),
                })
            }
        };

        let suite_id = run.check_suite_id();
        let workflow = suite_to_workflow
            .get(&suite_id)
            .ok_or_else(|| GateError::WorkflowNotFound {
                suite_id,
                job: name.clone(),
            })?;

        if !seen.insert(check_key(workflow, name)) {
            debug!(job = %name, workflow = %workflow, "dropping older attempt");
            continue;
        }

        if let Some(state) = classify(status, run.conclusion) {
            jobs.push(CorrelatedJob {
                job: name.clone(),
                workflow: workflow.clone(),
                state,
            });
        }
    }

    Ok(jobs)
}
