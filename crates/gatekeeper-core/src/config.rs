//! Validator configuration.
//!
//! Options are collected by [`ValidatorBuilder`] (repeatable, last write
//! wins) and checked once in [`ValidatorBuilder::build`]. A validator that
//! exists is always fully configured.

use std::sync::Arc;

use serde::Serialize;

use crate::error::{ConfigIssue, GateError, Result};
use crate::provider::CheckProvider;
use crate::validator::StatusValidator;

/// Immutable settings for one repository/ref pair.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ValidatorConfig {
    pub owner: String,
    pub repo: String,
    pub git_ref: String,
    pub self_job_name: String,
    pub ignored_jobs: Vec<String>,
}

/// Split a comma-separated job list, trimming each entry and dropping empties.
pub fn parse_ignored_jobs(raw: &str) -> Vec<String> {
    raw.split(',')
        .map(str::trim)
        .filter(|job| !job.is_empty())
        .map(str::to_string)
        .collect()
}

/// Split `owner/repo`. Returns `None` unless both halves are non-empty.
pub fn parse_repository(raw: &str) -> Option<(&str, &str)> {
    let (owner, repo) = raw.trim().split_once('/')?;
    if owner.is_empty() || repo.is_empty() || repo.contains('/') {
        return None;
    }
    Some((owner, repo))
}

/// Collects validator options.
#[derive(Default)]
pub struct ValidatorBuilder {
    client: Option<Arc<dyn CheckProvider>>,
    owner: String,
    repo: String,
    git_ref: String,
    self_job_name: String,
    ignored_jobs: Vec<String>,
}

impl ValidatorBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn client(mut self, client: Arc<dyn CheckProvider>) -> Self {
        self.client = Some(client);
        self
    }

    pub fn owner_and_repo(mut self, owner: impl Into<String>, repo: impl Into<String>) -> Self {
        self.owner = owner.into();
        self.repo = repo.into();
        self
    }

    pub fn git_ref(mut self, git_ref: impl Into<String>) -> Self {
        self.git_ref = git_ref.into();
        self
    }

    /// Name of the job running the gate; always treated as passed.
    pub fn self_job(mut self, name: impl Into<String>) -> Self {
        self.self_job_name = name.into();
        self
    }

    /// Comma-separated list of job names to ignore, e.g. `"lint, docs"`.
    pub fn ignored_jobs(mut self, raw: &str) -> Self {
        self.ignored_jobs = parse_ignored_jobs(raw);
        self
    }

    pub fn ignored_job_list<I, S>(mut self, jobs: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.ignored_jobs = jobs.into_iter().map(Into::into).collect();
        self
    }

    /// Every problem with the collected options, in a fixed order.
    pub fn issues(&self) -> Vec<ConfigIssue> {
        let mut issues = Vec::new();
        if self.repo.is_empty() {
            issues.push(ConfigIssue::EmptyRepository);
        }
        if self.owner.is_empty() {
            issues.push(ConfigIssue::EmptyOwner);
        }
        if self.git_ref.is_empty() {
            issues.push(ConfigIssue::EmptyRef);
        }
        if self.self_job_name.is_empty() {
            issues.push(ConfigIssue::EmptySelfJob);
        }
        if self.client.is_none() {
            issues.push(ConfigIssue::MissingClient);
        }
        issues
    }

    pub fn build(self) -> Result<StatusValidator> {
        let issues = self.issues();
        let client = match self.client {
            Some(client) if issues.is_empty() => client,
            _ => return Err(GateError::Configuration { issues }),
        };

        let config = ValidatorConfig {
            owner: self.owner,
            repo: self.repo,
            git_ref: self.git_ref,
            self_job_name: self.self_job_name,
            ignored_jobs: self.ignored_jobs,
        };
        Ok(StatusValidator::from_parts(client, config))
    }
}
