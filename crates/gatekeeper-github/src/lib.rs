//! GitHub provider for Merge Gatekeeper
//!
//! Implements [`gatekeeper_core::CheckProvider`] over the GitHub REST API:
//! - check runs: `GET /repos/{owner}/{repo}/commits/{ref}/check-runs`
//! - workflow runs: `GET /repos/{owner}/{repo}/actions/runs?head_sha={ref}`

pub mod client;

pub use client::{GithubClient, GithubConfig, DEFAULT_API_URL};
