//! Status validator: fetches, correlates and aggregates.
//!
//! One [`Validator::validate`] call is one sequential pass: page through the
//! check runs, fetch the workflow runs once, correlate, aggregate. Nothing is
//! retried or cached; a poll loop around the validator owns that.

use std::future::Future;
use std::sync::Arc;

use async_trait::async_trait;
use tokio_util::sync::CancellationToken;
use tracing::{debug, instrument, warn};

use crate::config::{ValidatorBuilder, ValidatorConfig};
use crate::correlate::correlate;
use crate::error::{GateError, Result};
use crate::provider::{CheckProvider, CheckRun, ProviderError};
use crate::status::{aggregate, Status};

/// Page size requested from the provider.
pub const MAX_CHECK_RUNS_PER_PAGE: u32 = 100;

/// Something that can judge whether a ref is mergeable.
#[async_trait]
pub trait Validator: Send + Sync {
    /// Name of the job running this validator.
    fn name(&self) -> &str;

    /// Run one validation pass.
    ///
    /// * `Ok(status)` with `status.is_success()` — every job passed.
    /// * `Ok(status)` otherwise — some jobs are still pending.
    /// * `Err(GateError::GateFailure)` — at least one job failed.
    /// * any other `Err` — configuration, provider or data problem.
    async fn validate(&self, cancel: &CancellationToken) -> Result<Status>;
}

/// Validator backed by a [`CheckProvider`].
pub struct StatusValidator {
    client: Arc<dyn CheckProvider>,
    config: ValidatorConfig,
}

impl std::fmt::Debug for StatusValidator {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("StatusValidator")
            .field("config", &self.config)
            .finish_non_exhaustive()
    }
}

impl StatusValidator {
    pub fn builder() -> ValidatorBuilder {
        ValidatorBuilder::new()
    }

    pub(crate) fn from_parts(client: Arc<dyn CheckProvider>, config: ValidatorConfig) -> Self {
        StatusValidator { client, config }
    }

    pub fn config(&self) -> &ValidatorConfig {
        &self.config
    }

    /// Fetch every check run for the ref, most recent first.
    ///
    /// Stops once the accumulated count reaches the provider-reported total,
    /// so a total of zero ends after the first page.
    pub async fn list_check_runs(&self, cancel: &CancellationToken) -> Result<Vec<CheckRun>> {
        let ValidatorConfig {
            owner,
            repo,
            git_ref,
            ..
        } = &self.config;

        let mut runs: Vec<CheckRun> = Vec::new();
        let mut page = 1u32;
        loop {
            let result = cancellable(
                cancel,
                self.client
                    .list_check_runs(owner, repo, git_ref, page, MAX_CHECK_RUNS_PER_PAGE),
            )
            .await?;

            let fetched = result.check_runs.len();
            runs.extend(result.check_runs);
            debug!(page, fetched, total = result.total_count, "fetched check runs");

            if result.total_count <= runs.len() {
                break;
            }
            if fetched == 0 {
                warn!(
                    page,
                    retrieved = runs.len(),
                    total = result.total_count,
                    "provider returned an empty page before reaching the reported total"
                );
                break;
            }
            page += 1;
        }
        Ok(runs)
    }
}

/// Race a provider call against the cancellation token.
async fn cancellable<T, F>(cancel: &CancellationToken, fut: F) -> Result<T>
where
    F: Future<Output = std::result::Result<T, ProviderError>>,
{
    tokio::select! {
        biased;
        _ = cancel.cancelled() => Err(GateError::Cancelled),
        result = fut => result.map_err(GateError::from),
    }
}

#[async_trait]
impl Validator for StatusValidator {
    fn name(&self) -> &str {
        &self.config.self_job_name
    }

    #[instrument(
        skip_all,
        fields(owner = %self.config.owner, repo = %self.config.repo, git_ref = %self.config.git_ref)
    )]
    async fn validate(&self, cancel: &CancellationToken) -> Result<Status> {
        let check_runs = self.list_check_runs(cancel).await?;

        let ValidatorConfig {
            owner,
            repo,
            git_ref,
            self_job_name,
            ignored_jobs,
        } = &self.config;
        let workflow_runs =
            cancellable(cancel, self.client.list_workflow_runs(owner, repo, git_ref)).await?;
        debug!(
            check_runs = check_runs.len(),
            workflow_runs = workflow_runs.len(),
            "correlating"
        );

        let jobs = correlate(&check_runs, &workflow_runs)?;
        aggregate(&jobs, self_job_name, ignored_jobs)
    }
}
