//! Poll loop around a [`Validator`].
//!
//! Calls the validator every `interval` until the gate is green, red, or the
//! deadline passes. Pending results are logged and retried; every error is
//! terminal.

use std::time::Duration;

use gatekeeper_core::{GateError, Status, Validator};
use thiserror::Error;
use tokio_util::sync::CancellationToken;
use tracing::{info, warn};

#[derive(Debug, Clone, Copy)]
pub struct PollSettings {
    pub interval: Duration,
    pub timeout: Duration,
}

/// Green verdict plus how many validation passes it took.
#[derive(Debug, Clone)]
pub struct PollOutcome {
    pub status: Status,
    pub attempts: u32,
}

#[derive(Debug, Error)]
pub enum PollError {
    #[error("{source}")]
    Validation {
        attempts: u32,
        #[source]
        source: GateError,
    },

    #[error("timed out after {elapsed:?} waiting for jobs to complete\n\n{}", last_detail(.last))]
    Timeout {
        elapsed: Duration,
        attempts: u32,
        last: Option<Status>,
    },

    #[error("validation interrupted")]
    Interrupted { attempts: u32 },
}

fn last_detail(last: &Option<Status>) -> String {
    last.as_ref()
        .map(Status::detail)
        .unwrap_or_else(|| "no status retrieved".to_string())
}

impl PollError {
    pub fn attempts(&self) -> u32 {
        match self {
            PollError::Validation { attempts, .. }
            | PollError::Timeout { attempts, .. }
            | PollError::Interrupted { attempts } => *attempts,
        }
    }
}

/// Poll `validator` until it is green, fails, times out, or `shutdown` fires.
///
/// The first pass runs immediately. The deadline cancels an in-flight pass.
pub async fn poll_until_done(
    validator: &dyn Validator,
    settings: PollSettings,
    shutdown: CancellationToken,
) -> Result<PollOutcome, PollError> {
    let started = tokio::time::Instant::now();
    let deadline = started + settings.timeout;
    let cancel = shutdown.child_token();

    let timer = cancel.clone();
    let watchdog = tokio::spawn(async move {
        tokio::select! {
            _ = tokio::time::sleep_until(deadline) => timer.cancel(),
            _ = timer.cancelled() => {}
        }
    });

    let mut attempts = 0u32;
    let mut last: Option<Status> = None;
    let result = loop {
        attempts += 1;
        match validator.validate(&cancel).await {
            Ok(status) if status.is_success() => {
                info!(attempts, "all validations successful");
                break Ok(PollOutcome { status, attempts });
            }
            Ok(status) => {
                info!(attempts, "jobs still pending\n{}", status.detail());
                last = Some(status);
            }
            Err(GateError::Cancelled) => break Err(stopped(&shutdown, started, attempts, last)),
            Err(source) => {
                warn!(attempts, "validation failed");
                break Err(PollError::Validation { attempts, source });
            }
        }

        tokio::select! {
            _ = cancel.cancelled() => break Err(stopped(&shutdown, started, attempts, last)),
            _ = tokio::time::sleep(settings.interval) => {}
        }
    };

    cancel.cancel();
    watchdog.abort();
    result
}

fn stopped(
    shutdown: &CancellationToken,
    started: tokio::time::Instant,
    attempts: u32,
    last: Option<Status>,
) -> PollError {
    if shutdown.is_cancelled() {
        PollError::Interrupted { attempts }
    } else {
        PollError::Timeout {
            elapsed: started.elapsed(),
            attempts,
            last,
        }
    }
}
