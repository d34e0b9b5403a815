use std::time::Duration;

use async_trait::async_trait;
use chess_core::{AnalyzedMove, Classification, Game};
use reqwest::{Client, Response, Url};
use serde::de::DeserializeOwned;
use serde::Deserialize;
use serde_json::json;

use crate::backend::{DashboardBackend, GameDetail, PlayerStats};
use crate::error::{DashboardError, Result};

/// JSON-over-HTTP client for the analysis backend.
#[derive(Clone, Debug)]
pub struct ApiClient {
    client: Client,
    base_url: Url,
}

#[derive(Deserialize)]
struct GamesEnvelope {
    #[serde(default)]
    games: Vec<Game>,
}

#[derive(Deserialize)]
struct StatsEnvelope {
    #[serde(default)]
    stats: Option<PlayerStats>,
}

#[derive(Deserialize)]
struct GameEnvelope {
    #[serde(default)]
    game: Option<Game>,
    #[serde(default)]
    analysis: Vec<AnalyzedMove>,
    #[serde(default)]
    error: Option<String>,
}

#[derive(Deserialize)]
struct ReviewEnvelope {
    #[serde(default)]
    review: Option<String>,
    #[serde(default)]
    error: Option<String>,
}

#[derive(Deserialize)]
struct MovesEnvelope {
    #[serde(default)]
    moves: Vec<AnalyzedMove>,
}

impl ApiClient {
    pub fn new(base_url: &str, timeout: Duration) -> Result<Self> {
        let base_url = Url::parse(base_url).map_err(|e| DashboardError::Url(format!("{base_url}: {e}")))?;
        if base_url.cannot_be_a_base() {
            return Err(DashboardError::Url(base_url.to_string()));
        }
        let client = Client::builder()
            .user_agent("ChessDashboard/1.0")
            .timeout(timeout)
            .build()?;
        Ok(Self { client, base_url })
    }

    /// Join path segments onto the base URL, percent-encoding each one.
    fn url(&self, segments: &[&str]) -> Result<Url> {
        let mut url = self.base_url.clone();
        url.path_segments_mut()
            .map_err(|_| DashboardError::Url(self.base_url.to_string()))?
            .pop_if_empty()
            .extend(segments);
        Ok(url)
    }

    async fn check(resp: Response) -> Result<Response> {
        let status = resp.status();
        if status.is_success() {
            return Ok(resp);
        }
        let body = resp.text().await.unwrap_or_default();
        if status == reqwest::StatusCode::NOT_FOUND {
            return Err(DashboardError::NotFound(body));
        }
        Err(DashboardError::Status {
            status: status.as_u16(),
            body,
        })
    }

    async fn get_json<T: DeserializeOwned>(&self, segments: &[&str]) -> Result<T> {
        let url = self.url(segments)?;
        tracing::debug!(%url, "GET");
        let resp = self.client.get(url).send().await?;
        let resp = Self::check(resp).await?;
        let bytes = resp.bytes().await?;
        Ok(serde_json::from_slice(&bytes)?)
    }
}

#[async_trait]
impl DashboardBackend for ApiClient {
    async fn list_games(&self, username: &str) -> Result<Vec<Game>> {
        let envelope: GamesEnvelope = self.get_json(&["games", username]).await?;
        Ok(envelope.games)
    }

    async fn player_stats(&self, username: &str) -> Result<Option<PlayerStats>> {
        let envelope: StatsEnvelope = self.get_json(&["stats", username]).await?;
        Ok(envelope.stats)
    }

    async fn start_analysis(
        &self,
        username: &str,
        limit: u32,
        opponent: Option<&str>,
    ) -> Result<()> {
        let url = self.url(&["analyze", username])?;

        let mut params = vec![("limit", limit.to_string())];
        if let Some(opponent) = opponent {
            params.push(("opponent", opponent.to_string()));
        }

        tracing::debug!(%url, limit, ?opponent, "POST analyze");
        let resp = self
            .client
            .post(url)
            .query(&params)
            .json(&json!({ "username": username }))
            .send()
            .await?;
        Self::check(resp).await?;
        Ok(())
    }

    async fn game_detail(&self, game_id: i64) -> Result<GameDetail> {
        let id = game_id.to_string();
        let envelope: GameEnvelope = self.get_json(&["game", &id]).await?;
        if let Some(message) = envelope.error {
            return Err(DashboardError::NotFound(message));
        }
        let game = envelope
            .game
            .ok_or_else(|| DashboardError::NotFound(format!("Game {game_id} not found")))?;
        Ok(GameDetail {
            game,
            analysis: envelope.analysis,
        })
    }

    async fn review_move(&self, move_id: i64) -> Result<String> {
        let url = self.url(&["review", "move", &move_id.to_string()])?;
        tracing::debug!(%url, "POST review");
        let resp = self.client.post(url).send().await?;
        let resp = Self::check(resp).await?;
        let envelope: ReviewEnvelope = serde_json::from_slice(&resp.bytes().await?)?;
        if let Some(message) = envelope.error {
            return Err(DashboardError::BadRequest(message));
        }
        envelope
            .review
            .filter(|r| !r.trim().is_empty())
            .ok_or_else(|| DashboardError::NotFound(format!("No review for move {move_id}")))
    }

    async fn moves_by_classification(
        &self,
        username: &str,
        classification: Classification,
    ) -> Result<Vec<AnalyzedMove>> {
        let envelope: MovesEnvelope = self
            .get_json(&["moves", username, classification.as_str()])
            .await?;
        Ok(envelope.moves)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_url_segments_are_encoded() {
        let client = ApiClient::new("http://localhost:8000", Duration::from_secs(1)).unwrap();
        let url = client.url(&["games", "some user/x"]).unwrap();
        assert_eq!(url.as_str(), "http://localhost:8000/games/some%20user%2Fx");
    }

    #[test]
    fn test_base_path_is_kept() {
        let client = ApiClient::new("http://host/api/", Duration::from_secs(1)).unwrap();
        let url = client.url(&["stats", "bob"]).unwrap();
        assert_eq!(url.as_str(), "http://host/api/stats/bob");
    }

    #[test]
    fn test_rejects_non_base_url() {
        assert!(ApiClient::new("mailto:someone@example.com", Duration::from_secs(1)).is_err());
        assert!(ApiClient::new("not a url", Duration::from_secs(1)).is_err());
    }
}
