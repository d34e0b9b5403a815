//! In-process fake of the analysis backend for integration tests.

use std::collections::HashMap;
use std::sync::{Arc, Mutex};
use std::time::Duration;

use axum::extract::{Path, Query, State};
use axum::http::StatusCode;
use axum::routing::{get, post};
use axum::{Json, Router};
use dashboard::{ApiClient, DashboardConfig};
use serde_json::{json, Value};

/// Users whose analyze requests the fake refuses.
pub const REJECTED_USER: &str = "broken";

#[derive(Default)]
pub struct BackendState {
    /// Games currently stored for every user.
    pub games: usize,
    /// Games the running job has yet to deliver, one per games listing.
    pub pending: usize,
    pub analyze_calls: Vec<(String, HashMap<String, String>)>,
    pub games_calls: usize,
}

pub type Shared = Arc<Mutex<BackendState>>;

pub struct FakeServer {
    pub base_url: String,
    pub state: Shared,
}

impl FakeServer {
    /// Bind on an ephemeral port and serve until the test runtime ends.
    pub async fn start(games: usize) -> FakeServer {
        let state: Shared = Arc::new(Mutex::new(BackendState {
            games,
            ..BackendState::default()
        }));

        let app = Router::new()
            .route("/games/{user}", get(list_games))
            .route("/stats/{user}", get(stats))
            .route("/analyze/{user}", post(analyze))
            .route("/game/{id}", get(game_detail))
            .route("/review/move/{id}", post(review_move).get(review_move))
            .route("/moves/{user}/{classification}", get(moves))
            .with_state(state.clone());

        let listener = tokio::net::TcpListener::bind("127.0.0.1:0")
            .await
            .expect("bind fake backend");
        let addr = listener.local_addr().expect("local addr");
        tokio::spawn(async move {
            axum::serve(listener, app).await.expect("fake backend");
        });

        FakeServer {
            base_url: format!("http://{addr}"),
            state,
        }
    }

    pub fn client(&self) -> ApiClient {
        ApiClient::new(&self.base_url, Duration::from_secs(5)).expect("client")
    }

    /// Config with a short poll interval so jobs settle quickly.
    pub fn config(&self, username: &str) -> DashboardConfig {
        DashboardConfig {
            api_url: self.base_url.clone(),
            username: username.to_string(),
            poll_interval: Duration::from_millis(20),
            ..DashboardConfig::default()
        }
    }
}

fn game_json(id: usize) -> Value {
    json!({
        "id": id,
        "white_username": "hero",
        "black_username": format!("opp{id}"),
        "white_result": "win",
        "black_result": "checkmated",
        "time_control": "600",
        "opening": "Italian Game",
        "pgn": "1. e4 e5 2. Nf3 Nc6 3. Bc4 *",
        "url": null
    })
}

fn move_json(id: i64, n: u32, color: &str, san: &str, uci: &str, class: &str) -> Value {
    json!({
        "id": id,
        "game_id": 7,
        "move_number": n,
        "color": color,
        "move_san": san,
        "move_uci": uci,
        "score": id * 15,
        "classification": class,
        "best_move": "b1c3"
    })
}

pub fn analysis_json() -> Vec<Value> {
    vec![
        move_json(1, 1, "white", "e4", "e2e4", "Book"),
        move_json(2, 1, "black", "e5", "e7e5", "Book"),
        move_json(3, 2, "white", "Nf3", "g1f3", "Best"),
        move_json(4, 2, "black", "f6", "f7f6", "Mistake"),
        move_json(5, 3, "white", "Nxe5", "f3e5", "Brilliant"),
    ]
}

async fn list_games(State(state): State<Shared>, Path(_user): Path<String>) -> Json<Value> {
    let mut s = state.lock().unwrap();
    s.games_calls += 1;
    if s.pending > 0 {
        s.pending -= 1;
        s.games += 1;
    }
    let games: Vec<Value> = (0..s.games).map(game_json).collect();
    Json(json!({ "games": games }))
}

async fn stats(State(state): State<Shared>, Path(user): Path<String>) -> Json<Value> {
    let total = state.lock().unwrap().games;
    Json(json!({
        "stats": {
            "username": user,
            "total_games": total,
            "win_rate": 50.0,
            "record": "1W - 1L - 0D",
            "avg_accuracy": 77.2,
            "style": "Positional",
            "classifications": { "Best": 10, "Blunder": 2 },
            "history": [
                { "id": 1, "is_white": true, "opponent": "a", "result": "Win", "accuracy": 80.0, "opening": "Italian Game" },
                { "id": 2, "is_white": false, "opponent": "b", "result": "Loss", "accuracy": 70.0, "opening": "" }
            ]
        }
    }))
}

async fn analyze(
    State(state): State<Shared>,
    Path(user): Path<String>,
    Query(params): Query<HashMap<String, String>>,
) -> (StatusCode, Json<Value>) {
    let mut s = state.lock().unwrap();
    s.analyze_calls.push((user.clone(), params.clone()));
    if user == REJECTED_USER {
        return (
            StatusCode::INTERNAL_SERVER_ERROR,
            Json(json!({ "detail": "engine offline" })),
        );
    }
    let limit: usize = params.get("limit").and_then(|l| l.parse().ok()).unwrap_or(0);
    s.pending += limit;
    (StatusCode::OK, Json(json!({ "status": "started" })))
}

async fn game_detail(Path(id): Path<i64>) -> Json<Value> {
    if id != 7 {
        return Json(json!({ "error": "Game not found" }));
    }
    Json(json!({ "game": game_json(7), "analysis": analysis_json() }))
}

async fn review_move(Path(id): Path<i64>) -> (StatusCode, Json<Value>) {
    if id == 5 {
        return (
            StatusCode::OK,
            Json(json!({ "review": "Nxe5 wins a pawn because the f6 push left e8 exposed." })),
        );
    }
    (
        StatusCode::INTERNAL_SERVER_ERROR,
        Json(json!({ "detail": "review service down" })),
    )
}

async fn moves(Path((_user, classification)): Path<(String, String)>) -> Json<Value> {
    let moves: Vec<Value> = analysis_json()
        .into_iter()
        .filter(|m| m["classification"] == classification.as_str())
        .collect();
    Json(json!({ "moves": moves }))
}
