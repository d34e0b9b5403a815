//! Dashboard client error types

use thiserror::Error;

#[derive(Error, Debug)]
pub enum DashboardError {
    #[error("{0}")]
    BadRequest(String),

    #[error("{0}")]
    NotFound(String),

    #[error("Backend returned HTTP {status}: {body}")]
    Status { status: u16, body: String },

    #[error("Request error: {0}")]
    Transport(#[from] reqwest::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("Invalid backend URL: {0}")]
    Url(String),
}

pub type Result<T> = std::result::Result<T, DashboardError>;
