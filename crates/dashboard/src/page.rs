//! Page coordinator: owns all dashboard state and hands read-only views and
//! entry points to the subsystems.

use chess_core::Game;
use tokio::sync::watch;
use tokio_util::sync::CancellationToken;
use tracing::{error, info, warn};

use crate::backend::{DashboardBackend, PlayerStats};
use crate::config::DashboardConfig;
use crate::orchestrator::{
    refresh, AnalysisRequest, FailureReason, JobState, Orchestrator, PollPolicy, Snapshot,
};

pub const ANALYSIS_FAILED_ALERT: &str = "Analysis failed. Please try again.";
pub const OPPONENT_REQUIRED_ALERT: &str = "Please enter an opponent username.";

/// What the page is currently blocked on, if anything.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Activity {
    #[default]
    Idle,
    Fetching,
    Analyzing,
}

impl Activity {
    pub fn overlay_message(&self) -> Option<&'static str> {
        match self {
            Activity::Idle => None,
            Activity::Fetching => Some("Loading Data..."),
            Activity::Analyzing => Some("Connecting to Chess.com & Initializing Stockfish..."),
        }
    }
}

/// Resets the activity signal when dropped, whatever path the caller takes.
struct ActivityGuard<'a> {
    tx: &'a watch::Sender<Activity>,
}

impl<'a> ActivityGuard<'a> {
    fn enter(tx: &'a watch::Sender<Activity>, activity: Activity) -> Self {
        tx.send_replace(activity);
        Self { tx }
    }
}

impl Drop for ActivityGuard<'_> {
    fn drop(&mut self) {
        self.tx.send_replace(Activity::Idle);
    }
}

/// One card of the game list, seen from the page user's side.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GameCard {
    pub id: i64,
    pub title: String, // "white vs black"
    pub time_control: Option<String>,
    pub result: Option<String>,
}

pub struct Dashboard<B> {
    backend: B,
    policy: PollPolicy,
    max_batch: u32,
    username: String,
    games: Vec<Game>,
    stats: Option<PlayerStats>,
    activity: watch::Sender<Activity>,
    job_state: JobState,
    last_failure: Option<FailureReason>,
    alert: Option<String>,
    abandon: CancellationToken,
}

impl<B: DashboardBackend> Dashboard<B> {
    pub fn new(backend: B, config: &DashboardConfig) -> Self {
        let (activity, _) = watch::channel(Activity::Idle);
        Self {
            backend,
            policy: config.poll_policy(),
            max_batch: config.max_batch,
            username: config.username.clone(),
            games: Vec::new(),
            stats: None,
            activity,
            job_state: JobState::Idle,
            last_failure: None,
            alert: None,
            abandon: CancellationToken::new(),
        }
    }

    pub fn backend(&self) -> &B {
        &self.backend
    }

    pub fn username(&self) -> &str {
        &self.username
    }

    pub fn set_username(&mut self, username: &str) {
        self.username = username.trim().to_string();
    }

    pub fn games(&self) -> &[Game] {
        &self.games
    }

    pub fn game_cards(&self) -> Vec<GameCard> {
        self.games
            .iter()
            .map(|g| GameCard {
                id: g.id,
                title: format!("{} vs {}", g.white_username, g.black_username),
                time_control: g.time_control.clone(),
                result: g.result_for(&self.username).map(str::to_string),
            })
            .collect()
    }

    pub fn stats(&self) -> Option<&PlayerStats> {
        self.stats.as_ref()
    }

    pub fn job_state(&self) -> JobState {
        self.job_state
    }

    pub fn last_failure(&self) -> Option<&FailureReason> {
        self.last_failure.as_ref()
    }

    pub fn is_busy(&self) -> bool {
        *self.activity.borrow() == Activity::Analyzing
    }

    pub fn activity(&self) -> Activity {
        *self.activity.borrow()
    }

    /// Watch the activity signal (busy overlay, disabled triggers).
    pub fn subscribe_activity(&self) -> watch::Receiver<Activity> {
        self.activity.subscribe()
    }

    /// Token that abandons the page: in-flight polling stops before its next
    /// tick and no further jobs start.
    pub fn abandon_token(&self) -> CancellationToken {
        self.abandon.clone()
    }

    /// Pending user-visible alert, cleared on read.
    pub fn take_alert(&mut self) -> Option<String> {
        self.alert.take()
    }

    /// Load games and stats for `username`, replacing the current data.
    /// Failures are logged and the previous data stays on screen.
    pub async fn load(&mut self, username: &str) -> bool {
        let username = username.trim();
        if username.is_empty() {
            return false;
        }
        self.username = username.to_string();

        let _guard = ActivityGuard::enter(&self.activity, Activity::Fetching);
        match refresh(&self.backend, &self.username).await {
            Ok(snapshot) => {
                apply_snapshot(&mut self.games, &mut self.stats, snapshot);
                true
            }
            Err(e) => {
                error!(username = %self.username, error = %e, "Failed to fetch data");
                false
            }
        }
    }

    /// Analyze the user's next `count` games.
    pub async fn start_analysis(&mut self, count: u32) -> JobState {
        self.run_analysis(count, None).await
    }

    /// Analyze up to `count` games against one opponent.
    pub async fn start_opponent_analysis(&mut self, count: u32, opponent: &str) -> JobState {
        if opponent.trim().is_empty() {
            self.alert = Some(OPPONENT_REQUIRED_ALERT.to_string());
            return self.job_state;
        }
        self.run_analysis(count, Some(opponent)).await
    }

    async fn run_analysis(&mut self, count: u32, opponent: Option<&str>) -> JobState {
        if self.is_busy() {
            warn!("Analysis already running, request ignored");
            return self.job_state;
        }
        if self.abandon.is_cancelled() {
            warn!("Page abandoned, request ignored");
            return self.job_state;
        }

        let request = match AnalysisRequest::new(&self.username, count, opponent, self.max_batch) {
            Ok(request) => request,
            Err(e) => {
                warn!(error = %e, "Invalid analysis request");
                self.alert = Some(e.to_string());
                return self.job_state;
            }
        };

        let guard = ActivityGuard::enter(&self.activity, Activity::Analyzing);
        self.job_state = JobState::Running;
        self.last_failure = None;

        let cancel = self.abandon.child_token();
        let outcome = Orchestrator::new(&self.backend, &self.policy)
            .run(&request, self.games.len(), &cancel)
            .await;
        drop(guard);

        match outcome.snapshot {
            Some(_) if self.abandon.is_cancelled() => {
                warn!("Page abandoned, discarding refreshed data");
            }
            Some(snapshot) => apply_snapshot(&mut self.games, &mut self.stats, snapshot),
            None => {}
        }
        if let Some(FailureReason::StartRejected(_)) = outcome.failure {
            self.alert = Some(ANALYSIS_FAILED_ALERT.to_string());
        }

        info!(state = ?outcome.state, polls = outcome.polls, "Analysis settled");
        self.job_state = outcome.state;
        self.last_failure = outcome.failure;
        self.job_state
    }
}

fn apply_snapshot(games: &mut Vec<Game>, stats: &mut Option<PlayerStats>, snapshot: Snapshot) {
    *games = snapshot.games;
    *stats = snapshot.stats;
}
