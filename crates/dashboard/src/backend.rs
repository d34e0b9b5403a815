//! Boundary to the analysis backend.
//!
//! Response schemas are owned by the backend; only the fields the dashboard
//! reads are modelled here and everything else is ignored.

use std::collections::HashMap;

use async_trait::async_trait;
use chess_core::{AnalyzedMove, Classification, Game};
use serde::{Deserialize, Deserializer, Serialize};

use crate::error::Result;

/// Aggregate stats for one player (`GET /stats/{user}`).
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PlayerStats {
    pub username: Option<String>,
    pub total_games: u32,
    pub win_rate: f64,
    pub record: String,
    pub avg_accuracy: f64,
    pub style: String,
    #[serde(deserialize_with = "classification_counts")]
    pub classifications: HashMap<Classification, u32>,
    pub history: Vec<GameHistoryEntry>,
    pub ai_insight: Option<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct GameHistoryEntry {
    pub id: i64,
    pub is_white: bool,
    pub opponent: String,
    pub result: String, // "Win", "Loss", "Draw"
    pub accuracy: f64,
    pub opening: String,
}

/// Count map keyed by label. Labels this client does not know are summed
/// under `Classification::Unknown`.
fn classification_counts<'de, D>(
    deserializer: D,
) -> std::result::Result<HashMap<Classification, u32>, D::Error>
where
    D: Deserializer<'de>,
{
    let raw = HashMap::<String, u32>::deserialize(deserializer)?;
    let mut counts = HashMap::new();
    for (label, n) in raw {
        let class = Classification::from_label(&label).unwrap_or(Classification::Unknown);
        *counts.entry(class).or_insert(0) += n;
    }
    Ok(counts)
}

/// A single game with its per-move analysis (`GET /game/{id}`).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GameDetail {
    pub game: Game,
    #[serde(default)]
    pub analysis: Vec<AnalyzedMove>,
}

/// Everything the dashboard consumes from the backend.
#[async_trait]
pub trait DashboardBackend: Send + Sync {
    /// Analyzed games for a user. The list length is the job progress signal.
    async fn list_games(&self, username: &str) -> Result<Vec<Game>>;

    /// `None` when the backend has nothing for this user yet.
    async fn player_stats(&self, username: &str) -> Result<Option<PlayerStats>>;

    /// Ask the backend to analyze up to `limit` more games. Returns once accepted.
    async fn start_analysis(&self, username: &str, limit: u32, opponent: Option<&str>)
        -> Result<()>;

    async fn game_detail(&self, game_id: i64) -> Result<GameDetail>;

    /// Narrative review of one analyzed move.
    async fn review_move(&self, move_id: i64) -> Result<String>;

    async fn moves_by_classification(
        &self,
        username: &str,
        classification: Classification,
    ) -> Result<Vec<AnalyzedMove>>;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_stats_tolerate_missing_and_extra_fields() {
        let json = r#"{
            "username": "choys1211",
            "total_games": 3,
            "win_rate": 66.7,
            "record": "2W - 1L - 0D",
            "classifications": {"Brilliant": 1, "Blunder": 4, "Sparkling": 2, "Dazzling": 3},
            "history": [{"id": 9, "is_white": true, "opponent": "x", "result": "Win",
                         "accuracy": 81.5, "opening": "Sicilian Defense"}],
            "something_new": true
        }"#;
        let stats: PlayerStats = serde_json::from_str(json).unwrap();
        assert_eq!(stats.total_games, 3);
        assert_eq!(stats.classifications[&Classification::Blunder], 4);
        assert_eq!(stats.classifications[&Classification::Unknown], 5);
        assert_eq!(stats.history[0].opening, "Sicilian Defense");
        assert!(stats.ai_insight.is_none());
        assert_eq!(stats.style, "");
    }
}
