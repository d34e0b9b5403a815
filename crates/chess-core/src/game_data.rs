use std::fmt;

use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Side {
    White,
    Black,
}

/// Move quality label assigned by the backend's evaluation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Classification {
    Brilliant,
    Great,
    Book,
    Best,
    Excellent,
    Good,
    Inaccuracy,
    Mistake,
    Blunder,
    Miss,
    Forced,
    Normal,
    #[serde(other)]
    Unknown,
}

impl Classification {
    /// Labels shown in the move-quality breakdown, best to worst.
    pub const QUALITY_ORDER: [Classification; 9] = [
        Classification::Brilliant,
        Classification::Great,
        Classification::Best,
        Classification::Excellent,
        Classification::Good,
        Classification::Inaccuracy,
        Classification::Mistake,
        Classification::Blunder,
        Classification::Miss,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            Classification::Brilliant => "Brilliant",
            Classification::Great => "Great",
            Classification::Book => "Book",
            Classification::Best => "Best",
            Classification::Excellent => "Excellent",
            Classification::Good => "Good",
            Classification::Inaccuracy => "Inaccuracy",
            Classification::Mistake => "Mistake",
            Classification::Blunder => "Blunder",
            Classification::Miss => "Miss",
            Classification::Forced => "Forced",
            Classification::Normal => "Normal",
            Classification::Unknown => "Unknown",
        }
    }

    /// Parse a label as it appears in URLs and API payloads (case-insensitive).
    pub fn from_label(label: &str) -> Option<Self> {
        let all = [
            Classification::Brilliant,
            Classification::Great,
            Classification::Book,
            Classification::Best,
            Classification::Excellent,
            Classification::Good,
            Classification::Inaccuracy,
            Classification::Mistake,
            Classification::Blunder,
            Classification::Miss,
            Classification::Forced,
            Classification::Normal,
        ];
        all.into_iter()
            .find(|c| c.as_str().eq_ignore_ascii_case(label.trim()))
    }
}

impl fmt::Display for Classification {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// One analyzed half-move as produced by the backend. Never mutated client-side.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AnalyzedMove {
    #[serde(default)]
    pub id: i64,
    #[serde(default)]
    pub game_id: i64,
    pub move_number: u32, // full-move number, 1-based
    pub color: Side,
    #[serde(default)]
    pub move_san: Option<String>,
    pub move_uci: String,
    #[serde(default)]
    pub score: Option<i32>,
    pub classification: Classification,
    #[serde(default)]
    pub best_move: Option<String>,
    #[serde(default)]
    pub opening: Option<String>,
}

impl AnalyzedMove {
    /// Cursor value that shows the position right after this move.
    pub fn ply_index(&self) -> usize {
        let n = self.move_number.max(1) as usize;
        match self.color {
            Side::White => n * 2 - 1,
            Side::Black => n * 2,
        }
    }

    /// Short form when the backend supplied one, coordinate form otherwise.
    pub fn display_notation(&self) -> &str {
        self.move_san
            .as_deref()
            .filter(|s| !s.is_empty())
            .unwrap_or(&self.move_uci)
    }
}

/// A stored game as listed by the backend.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Game {
    pub id: i64,
    pub white_username: String,
    pub black_username: String,
    #[serde(default)]
    pub white_result: Option<String>,
    #[serde(default)]
    pub black_result: Option<String>,
    #[serde(default)]
    pub time_control: Option<String>,
    #[serde(default)]
    pub opening: Option<String>,
    #[serde(default)]
    pub pgn: Option<String>,
    #[serde(default)]
    pub url: Option<String>,
}

impl Game {
    pub fn is_white(&self, username: &str) -> bool {
        self.white_username.eq_ignore_ascii_case(username)
    }

    /// The result string from `username`'s side of the board.
    pub fn result_for(&self, username: &str) -> Option<&str> {
        if self.is_white(username) {
            self.white_result.as_deref()
        } else {
            self.black_result.as_deref()
        }
    }

    pub fn opponent_of(&self, username: &str) -> &str {
        if self.is_white(username) {
            &self.black_username
        } else {
            &self.white_username
        }
    }
}

/// Header fields of a portable game record.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct RecordHeaders {
    pub white: String,
    pub black: String,
    pub result: String, // "1-0", "0-1", "1/2-1/2", "*"
    pub date: Option<String>,
    pub time_control: Option<String>,
    pub eco: Option<String>,
    pub opening: Option<String>,
    pub link: Option<String>,
}

/// A parsed portable game record: headers plus mainline move tokens.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GameRecord {
    pub headers: RecordHeaders,
    pub moves: Vec<String>, // short-form or coordinate notation, in order
}
