//! Analysis job orchestration.
//!
//! The backend has no completion event, so after starting a job we poll the
//! user's game count until it reaches the requested target or grows well past
//! the starting count. Transient poll failures are retried up to a budget;
//! every run ends with one full data refresh unless it was abandoned.

use std::time::Duration;

use chess_core::Game;
use tokio_util::sync::CancellationToken;
use tracing::{debug, error, info, warn};

use crate::backend::{DashboardBackend, PlayerStats};
use crate::error::{DashboardError, Result};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum JobState {
    #[default]
    Idle,
    Running,
    Succeeded,
    Failed,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FailureReason {
    /// The start request was refused or never reached the backend.
    StartRejected(String),
    /// Too many consecutive polls failed.
    PollBudgetExhausted,
    /// The job was abandoned before it settled.
    Cancelled,
}

/// Tuning for the completion poll.
#[derive(Debug, Clone, PartialEq)]
pub struct PollPolicy {
    pub interval: Duration,
    pub overshoot_factor: f64,
    pub max_consecutive_errors: u32,
}

impl Default for PollPolicy {
    fn default() -> Self {
        Self {
            interval: Duration::from_secs(5),
            overshoot_factor: 1.5,
            max_consecutive_errors: 5,
        }
    }
}

/// A validated request to analyze more games.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AnalysisRequest {
    pub username: String,
    pub count: u32,
    pub opponent: Option<String>,
}

impl AnalysisRequest {
    pub fn new(username: &str, count: u32, opponent: Option<&str>, max_batch: u32) -> Result<Self> {
        let username = username.trim();
        if username.is_empty() {
            return Err(DashboardError::BadRequest("Username is required".into()));
        }
        if count == 0 || count > max_batch {
            return Err(DashboardError::BadRequest(format!(
                "Number of games must be between 1 and {max_batch}"
            )));
        }
        let opponent = opponent
            .map(str::trim)
            .filter(|o| !o.is_empty())
            .map(str::to_string);
        Ok(Self {
            username: username.to_string(),
            count,
            opponent,
        })
    }
}

/// Full replacement data for the page after a refresh.
#[derive(Debug, Clone, PartialEq)]
pub struct Snapshot {
    pub games: Vec<Game>,
    pub stats: Option<PlayerStats>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct JobOutcome {
    pub state: JobState,
    pub failure: Option<FailureReason>,
    /// Present when the final refresh succeeded.
    pub snapshot: Option<Snapshot>,
    pub polls: u32,
    pub last_count: Option<usize>,
}

impl JobOutcome {
    fn failed(reason: FailureReason, polls: u32, last_count: Option<usize>) -> Self {
        Self {
            state: JobState::Failed,
            failure: Some(reason),
            snapshot: None,
            polls,
            last_count,
        }
    }
}

/// Loop exit condition, evaluated on successful polls only.
///
/// Done when the target is reached, or when the count has grown past
/// `initial * overshoot_factor`. The growth clause needs a non-zero starting
/// count: from zero only the target counts.
pub fn is_complete(initial: usize, target: usize, current: usize, overshoot_factor: f64) -> bool {
    if current >= target {
        return true;
    }
    initial > 0 && (current as f64) > (initial as f64) * overshoot_factor
}

/// Fetch games and stats together; either failing leaves the caller's data as is.
pub async fn refresh<B>(backend: &B, username: &str) -> Result<Snapshot>
where
    B: DashboardBackend + ?Sized,
{
    let games = backend.list_games(username).await?;
    let stats = backend.player_stats(username).await?;
    Ok(Snapshot { games, stats })
}

enum PollExit {
    Complete,
    ErrorBudget,
    Cancelled,
}

pub struct Orchestrator<'a, B: ?Sized> {
    backend: &'a B,
    policy: &'a PollPolicy,
}

impl<'a, B> Orchestrator<'a, B>
where
    B: DashboardBackend + ?Sized,
{
    pub fn new(backend: &'a B, policy: &'a PollPolicy) -> Self {
        Self { backend, policy }
    }

    /// Start a job and wait for it to settle. Never returns an error: every
    /// failure is folded into the outcome.
    pub async fn run(
        &self,
        request: &AnalysisRequest,
        initial_count: usize,
        cancel: &CancellationToken,
    ) -> JobOutcome {
        let target = initial_count + request.count as usize;
        info!(
            username = %request.username,
            count = request.count,
            opponent = ?request.opponent,
            initial_count,
            target,
            "Starting analysis"
        );

        if let Err(e) = self
            .backend
            .start_analysis(&request.username, request.count, request.opponent.as_deref())
            .await
        {
            error!(username = %request.username, error = %e, "Analysis request failed");
            return JobOutcome::failed(FailureReason::StartRejected(e.to_string()), 0, None);
        }

        let mut consecutive_errors = 0u32;
        let mut polls = 0u32;
        let mut last_count = None;

        let exit = loop {
            tokio::select! {
                _ = cancel.cancelled() => break PollExit::Cancelled,
                _ = tokio::time::sleep(self.policy.interval) => {}
            }
            if cancel.is_cancelled() {
                break PollExit::Cancelled;
            }

            polls += 1;
            let polled = tokio::select! {
                _ = cancel.cancelled() => break PollExit::Cancelled,
                result = self.backend.list_games(&request.username) => result,
            };
            // A cancel raised while the request was in flight wins over its result.
            if cancel.is_cancelled() {
                break PollExit::Cancelled;
            }
            match polled {
                Ok(games) => {
                    consecutive_errors = 0;
                    let current = games.len();
                    last_count = Some(current);
                    debug!(polls, current, target, "Poll");
                    if is_complete(initial_count, target, current, self.policy.overshoot_factor) {
                        break PollExit::Complete;
                    }
                }
                Err(e) => {
                    consecutive_errors += 1;
                    if consecutive_errors >= self.policy.max_consecutive_errors {
                        error!(
                            error = %e,
                            attempts = consecutive_errors,
                            "Max consecutive polling errors reached, aborting analysis wait"
                        );
                        break PollExit::ErrorBudget;
                    }
                    warn!(
                        error = %e,
                        attempt = consecutive_errors,
                        max = self.policy.max_consecutive_errors,
                        "Polling failed, retrying"
                    );
                }
            }
        };

        if let PollExit::Cancelled = exit {
            info!(username = %request.username, polls, "Analysis wait abandoned");
            return JobOutcome::failed(FailureReason::Cancelled, polls, last_count);
        }

        // Best effort: partial data beats an empty page.
        let refreshed = tokio::select! {
            _ = cancel.cancelled() => None,
            result = refresh(self.backend, &request.username) => Some(result),
        };
        let snapshot = match refreshed {
            _ if cancel.is_cancelled() => {
                info!(username = %request.username, polls, "Analysis abandoned during final refresh");
                return JobOutcome::failed(FailureReason::Cancelled, polls, last_count);
            }
            Some(Ok(snapshot)) => Some(snapshot),
            Some(Err(e)) => {
                warn!(error = %e, "Final refresh failed, keeping previous data");
                None
            }
            None => None,
        };

        match exit {
            PollExit::Complete => {
                info!(polls, last_count = ?last_count, "Analysis complete");
                JobOutcome {
                    state: JobState::Succeeded,
                    failure: None,
                    snapshot,
                    polls,
                    last_count,
                }
            }
            _ => JobOutcome {
                snapshot,
                ..JobOutcome::failed(FailureReason::PollBudgetExhausted, polls, last_count)
            },
        }
    }
}
