//! In-memory provider fake (testing only)
//!
//! `MemoryCheckProvider` serves check runs page by page the way GitHub
//! does, counts calls, and can be told to misreport totals, fail, or hang.

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Mutex;

use async_trait::async_trait;

use crate::provider::{CheckProvider, CheckRun, CheckRunPage, ProviderError, WorkflowRun};

/// Failure to inject into the next provider calls.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum InjectedFailure {
    CheckRuns { status: u16, message: String },
    WorkflowRuns { status: u16, message: String },
}

/// In-memory provider backed by fixed check-run and workflow-run lists.
#[derive(Debug, Default)]
pub struct MemoryCheckProvider {
    check_runs: Vec<CheckRun>,
    workflow_runs: Vec<WorkflowRun>,
    reported_total: Option<usize>,
    failure: Option<InjectedFailure>,
    stall: bool,
    check_run_calls: AtomicUsize,
    workflow_run_calls: AtomicUsize,
    requested_pages: Mutex<Vec<(u32, u32)>>,
}

impl MemoryCheckProvider {
    pub fn new() -> Self {
        Self::default()
    }

    /// Runs to serve, most recent first.
    pub fn with_check_runs(mut self, runs: Vec<CheckRun>) -> Self {
        self.check_runs = runs;
        self
    }

    pub fn with_workflow_runs(mut self, runs: Vec<WorkflowRun>) -> Self {
        self.workflow_runs = runs;
        self
    }

    /// Report this total instead of the real run count.
    pub fn with_reported_total(mut self, total: usize) -> Self {
        self.reported_total = Some(total);
        self
    }

    pub fn with_failure(mut self, failure: InjectedFailure) -> Self {
        self.failure = Some(failure);
        self
    }

    /// Never answer; every call waits forever.
    pub fn stalled(mut self) -> Self {
        self.stall = true;
        self
    }

    pub fn check_run_calls(&self) -> usize {
        self.check_run_calls.load(Ordering::SeqCst)
    }

    pub fn workflow_run_calls(&self) -> usize {
        self.workflow_run_calls.load(Ordering::SeqCst)
    }

    /// `(page, per_page)` of every check-run request, in order.
    pub fn requested_pages(&self) -> Vec<(u32, u32)> {
        self.requested_pages.lock().unwrap().clone()
    }

    async fn maybe_stall(&self) {
        if self.stall {
            std::future::pending::<()>().await;
        }
    }
}

#[async_trait]
impl CheckProvider for MemoryCheckProvider {
    async fn list_check_runs(
        &self,
        _owner: &str,
        _repo: &str,
        _git_ref: &str,
        page: u32,
        per_page: u32,
    ) -> Result<CheckRunPage, ProviderError> {
        self.check_run_calls.fetch_add(1, Ordering::SeqCst);
        self.requested_pages.lock().unwrap().push((page, per_page));
        self.maybe_stall().await;

        if let Some(InjectedFailure::CheckRuns { status, message }) = &self.failure {
            return Err(ProviderError::Status {
                status: *status,
                message: message.clone(),
            });
        }

        let per_page = per_page.max(1) as usize;
        let start = (page.max(1) as usize - 1) * per_page;
        let check_runs = self
            .check_runs
            .iter()
            .skip(start)
            .take(per_page)
            .cloned()
            .collect();

        Ok(CheckRunPage {
            total_count: self.reported_total.unwrap_or(self.check_runs.len()),
            check_runs,
        })
    }

    async fn list_workflow_runs(
        &self,
        _owner: &str,
        _repo: &str,
        _git_ref: &str,
    ) -> Result<Vec<WorkflowRun>, ProviderError> {
        self.workflow_run_calls.fetch_add(1, Ordering::SeqCst);
        self.maybe_stall().await;

        if let Some(InjectedFailure::WorkflowRuns { status, message }) = &self.failure {
            return Err(ProviderError::Status {
                status: *status,
                message: message.clone(),
            });
        }
        Ok(self.workflow_runs.clone())
    }
}
