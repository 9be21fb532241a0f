//! Merge Gatekeeper Core
//!
//! Decides whether a git ref is safe to merge by reading its GitHub Actions
//! check runs and workflow runs:
//! - `provider`: the capability trait a check-run host must implement
//! - `correlate`: maps check suites to workflows and drops re-run duplicates
//! - `classify`: folds raw status/conclusion pairs into pending/success/error
//! - `status`: aggregates classified jobs into a verdict and detail report
//! - `validator`: drives pagination and returns the verdict
//!
//! `fakes` holds an in-memory provider for tests.

pub mod classify;
pub mod config;
pub mod correlate;
pub mod error;
pub mod fakes;
pub mod provider;
pub mod status;
pub mod telemetry;
pub mod validator;

// Re-export key types
pub use classify::{classify, JobState};
pub use config::{parse_ignored_jobs, parse_repository, ValidatorBuilder, ValidatorConfig};
pub use correlate::{correlate, suite_workflow_map, CorrelatedJob};
pub use error::{ConfigIssue, GateError, Result};
pub use provider::{
    CheckProvider, CheckRun, CheckRunConclusion, CheckRunPage, CheckRunStatus, CheckSuiteRef,
    ProviderError, WorkflowRun,
};
pub use status::{aggregate, Status};
pub use telemetry::init_tracing;
pub use validator::{StatusValidator, Validator, MAX_CHECK_RUNS_PER_PAGE};

pub use tokio_util::sync::CancellationToken;
