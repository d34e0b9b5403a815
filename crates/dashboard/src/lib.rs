pub mod backend;
pub mod clients;
pub mod config;
pub mod error;
pub mod orchestrator;
pub mod page;
pub mod review;
pub mod stats;

pub use backend::{DashboardBackend, GameDetail, GameHistoryEntry, PlayerStats};
pub use clients::ApiClient;
pub use config::DashboardConfig;
pub use error::{DashboardError, Result};
pub use orchestrator::{AnalysisRequest, FailureReason, JobOutcome, JobState, Orchestrator, PollPolicy};
pub use page::{Activity, Dashboard, GameCard};
pub use review::{fetch_review, ClassificationBrowser, GameReview};
