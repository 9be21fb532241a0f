//! Merge Gatekeeper CLI
//!
//! The `gatekeeper` command blocks a pull request until every GitHub Actions
//! job on its head commit has passed.
//!
//! ## Commands
//!
//! - `validate`: poll the check runs of a ref until green, red, or timeout

mod poll;

use std::sync::Arc;
use std::time::Duration;

use anyhow::{anyhow, Context, Result};
use chrono::{DateTime, Utc};
use clap::{Parser, Subcommand};
use gatekeeper_core::{parse_repository, Status, StatusValidator, Validator};
use gatekeeper_github::{GithubClient, GithubConfig, DEFAULT_API_URL};
use serde::Serialize;
use tokio_util::sync::CancellationToken;
use tracing::{info, Level};

use crate::poll::{poll_until_done, PollError, PollSettings};

#[derive(Parser)]
#[command(name = "gatekeeper")]
#[command(version = env!("CARGO_PKG_VERSION"))]
#[command(about = "Merge Gatekeeper: wait for every CI job on a ref to pass", long_about = None)]
struct Cli {
    /// Enable verbose output
    #[arg(short, long, global = true)]
    verbose: bool,

    /// Emit JSON-formatted log lines and a JSON report
    #[arg(long, global = true)]
    json: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Validate the check runs of a ref
    Validate(ValidateArgs),
}

#[derive(clap::Args)]
struct ValidateArgs {
    /// GitHub token
    #[arg(long, env = "GITHUB_TOKEN", hide_env_values = true)]
    token: Option<String>,

    /// Repository as owner/repo
    #[arg(long, env = "GITHUB_REPOSITORY")]
    repository: String,

    /// Commit SHA or ref to validate
    #[arg(long = "ref", env = "GITHUB_SHA")]
    git_ref: String,

    /// Name of the job running the gatekeeper itself
    #[arg(
        long = "self",
        env = "GATEKEEPER_SELF_JOB",
        default_value = "merge-gatekeeper"
    )]
    self_job: String,

    /// Comma-separated job names to ignore
    #[arg(long, env = "GATEKEEPER_IGNORED", default_value = "")]
    ignored: String,

    /// Seconds between validation passes
    #[arg(long, env = "GATEKEEPER_INTERVAL", default_value = "5")]
    interval: u64,

    /// Seconds before giving up
    #[arg(long, env = "GATEKEEPER_TIMEOUT", default_value = "600")]
    timeout: u64,

    /// GitHub API base URL
    #[arg(long, env = "GITHUB_API_URL", default_value = DEFAULT_API_URL)]
    api_url: String,
}

/// Machine-readable result printed with `--json`.
#[derive(Debug, Serialize)]
struct GateReport<'a> {
    repository: &'a str,
    git_ref: &'a str,
    verdict: &'static str,
    attempts: u32,
    checked_at: DateTime<Utc>,
    status: Option<&'a Status>,
    error: Option<String>,
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    let level = if cli.verbose {
        Level::DEBUG
    } else {
        Level::INFO
    };
    gatekeeper_core::init_tracing(cli.json, level);

    match cli.command {
        Commands::Validate(args) => cmd_validate(args, cli.json).await,
    }
}

fn build_validator(args: &ValidateArgs) -> Result<StatusValidator> {
    let (owner, repo) = parse_repository(&args.repository)
        .ok_or_else(|| anyhow!("repository must be owner/repo, got {:?}", args.repository))?;

    let client =
        GithubClient::new(github_config(args)).context("Failed to create GitHub client")?;

    let validator = StatusValidator::builder()
        .client(Arc::new(client))
        .owner_and_repo(owner, repo)
        .git_ref(args.git_ref.as_str())
        .self_job(args.self_job.as_str())
        .ignored_jobs(&args.ignored)
        .build()?;
    Ok(validator)
}

/// Environment defaults, overridden by whatever the flags carry.
fn github_config(args: &ValidateArgs) -> GithubConfig {
    let mut config = GithubConfig::from_env().with_api_url(&args.api_url);
    if let Some(token) = args.token.as_deref().filter(|t| !t.is_empty()) {
        config = config.with_token(token);
    }
    config
}

/// Poll the ref until its gate resolves
async fn cmd_validate(args: ValidateArgs, json: bool) -> Result<()> {
    let validator = build_validator(&args)?;
    info!(
        repository = %args.repository,
        git_ref = %args.git_ref,
        self_job = %validator.name(),
        "validating"
    );

    let shutdown = CancellationToken::new();
    let on_signal = shutdown.clone();
    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            on_signal.cancel();
        }
    });

    let settings = PollSettings {
        interval: Duration::from_secs(args.interval),
        timeout: Duration::from_secs(args.timeout),
    };
    let result = poll_until_done(&validator, settings, shutdown).await;

    if json {
        let report = match &result {
            Ok(outcome) => GateReport {
                repository: &args.repository,
                git_ref: &args.git_ref,
                verdict: "success",
                attempts: outcome.attempts,
                checked_at: Utc::now(),
                status: Some(&outcome.status),
                error: None,
            },
            Err(err) => GateReport {
                repository: &args.repository,
                git_ref: &args.git_ref,
                verdict: verdict_of(err),
                attempts: err.attempts(),
                checked_at: Utc::now(),
                status: failed_status(err),
                error: Some(err.to_string()),
            },
        };
        println!("{}", serde_json::to_string_pretty(&report)?);
    }

    match result {
        Ok(outcome) => {
            if !json {
                println!("all validations successful\n\n{}", outcome.status.detail());
            }
            Ok(())
        }
        Err(err) => Err(err.into()),
    }
}

fn verdict_of(err: &PollError) -> &'static str {
    match err {
        PollError::Validation { source, .. } if source.is_gate_failure() => "failure",
        PollError::Validation { .. } => "error",
        PollError::Timeout { .. } => "timeout",
        PollError::Interrupted { .. } => "interrupted",
    }
}

fn failed_status(err: &PollError) -> Option<&Status> {
    match err {
        PollError::Validation { source, .. } => source.status(),
        PollError::Timeout { last, .. } => last.as_ref(),
        PollError::Interrupted { .. } => None,
    }
}
