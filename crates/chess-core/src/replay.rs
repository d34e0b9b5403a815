//! Move replay: rebuild the position after the first N plies of a game.
//!
//! Short-form notation is tried first; the coordinate form is authoritative
//! when the short form does not apply. A ply that fails in both forms is
//! skipped and logged, so callers always get a position back.

use std::fmt;

use serde::{Deserialize, Serialize};
use shakmaty::fen::Fen;
use shakmaty::san::SanPlus;
use shakmaty::uci::UciMove;
use shakmaty::{Chess, EnPassantMode, Move, Position};

use crate::game_data::AnalyzedMove;

/// One half-move in whichever notations are available.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Ply {
    pub san: Option<String>,
    pub uci: Option<String>,
}

impl Ply {
    pub fn from_san(san: impl Into<String>) -> Self {
        Self { san: Some(san.into()), uci: None }
    }

    pub fn from_uci(uci: impl Into<String>) -> Self {
        Self { san: None, uci: Some(uci.into()) }
    }

    /// Classify a bare move token by its shape.
    pub fn from_token(token: &str) -> Self {
        let token = token.trim();
        if looks_like_coordinate(token) {
            Self::from_uci(token)
        } else {
            Self::from_san(token)
        }
    }

    pub fn from_tokens<S: AsRef<str>>(tokens: &[S]) -> Vec<Ply> {
        tokens.iter().map(|t| Ply::from_token(t.as_ref())).collect()
    }
}

impl From<&AnalyzedMove> for Ply {
    fn from(mv: &AnalyzedMove) -> Self {
        Self {
            san: mv.move_san.clone().filter(|s| !s.is_empty()),
            uci: Some(mv.move_uci.clone()).filter(|s| !s.is_empty()),
        }
    }
}

fn looks_like_coordinate(token: &str) -> bool {
    let b = token.as_bytes();
    let square = |f: u8, r: u8| (b'a'..=b'h').contains(&f) && (b'1'..=b'8').contains(&r);
    match b.len() {
        4 => square(b[0], b[1]) && square(b[2], b[3]),
        5 => square(b[0], b[1]) && square(b[2], b[3]) && b"qrbn".contains(&b[4]),
        _ => false,
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NotationForm {
    Short,
    Coordinate,
}

impl fmt::Display for NotationForm {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            NotationForm::Short => f.write_str("short-form"),
            NotationForm::Coordinate => f.write_str("coordinate"),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum NotationError {
    #[error("no {0} notation supplied")]
    Missing(NotationForm),

    #[error("unparseable {form} move '{text}'")]
    Unparseable { form: NotationForm, text: String },

    #[error("{form} move '{text}' is not legal here")]
    Illegal { form: NotationForm, text: String },
}

/// A ply that could not be applied in either notation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ReplayFault {
    pub ply: usize, // 0-based
    pub short: NotationError,
    pub coordinate: NotationError,
}

#[derive(Debug, Clone)]
pub struct Replay {
    pub position: Chess,
    pub applied: usize,
    pub faults: Vec<ReplayFault>,
}

impl Replay {
    pub fn fen(&self) -> String {
        Fen::from_position(&self.position, EnPassantMode::Legal).to_string()
    }

    pub fn is_clean(&self) -> bool {
        self.faults.is_empty()
    }
}

/// Resolve a ply against `pos`, short form first.
pub fn resolve_ply(pos: &Chess, ply: &Ply) -> Result<Move, (NotationError, NotationError)> {
    let short = match resolve_san(pos, ply.san.as_deref()) {
        Ok(mv) => return Ok(mv),
        Err(e) => e,
    };
    resolve_uci(pos, ply.uci.as_deref()).map_err(|coordinate| (short, coordinate))
}

fn resolve_san(pos: &Chess, san: Option<&str>) -> Result<Move, NotationError> {
    let form = NotationForm::Short;
    let text = san
        .map(|s| s.trim().trim_end_matches(['!', '?']))
        .filter(|s| !s.is_empty())
        .ok_or(NotationError::Missing(form))?;
    let parsed: SanPlus = text.parse().map_err(|_| NotationError::Unparseable {
        form,
        text: text.to_string(),
    })?;
    parsed.san.to_move(pos).map_err(|_| NotationError::Illegal {
        form,
        text: text.to_string(),
    })
}

fn resolve_uci(pos: &Chess, uci: Option<&str>) -> Result<Move, NotationError> {
    let form = NotationForm::Coordinate;
    let text = uci
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .ok_or(NotationError::Missing(form))?;
    let parsed: UciMove = text.parse().map_err(|_| NotationError::Unparseable {
        form,
        text: text.to_string(),
    })?;
    parsed.to_move(pos).map_err(|_| NotationError::Illegal {
        form,
        text: text.to_string(),
    })
}

/// Replay `plies[..upto]` from the standard initial position.
///
/// `upto` is clamped to `plies.len()`. Never fails: a ply that applies in
/// neither notation leaves the position where it was and is recorded in
/// `Replay::faults`.
pub fn replay(plies: &[Ply], upto: usize) -> Replay {
    let upto = upto.min(plies.len());
    let mut pos = Chess::default();
    let mut applied = 0;
    let mut faults = Vec::new();

    for (i, ply) in plies[..upto].iter().enumerate() {
        match resolve_ply(&pos, ply) {
            Ok(mv) => {
                pos.play_unchecked(mv);
                applied += 1;
            }
            Err((short, coordinate)) => {
                tracing::warn!(
                    ply = i,
                    san = ?ply.san,
                    uci = ?ply.uci,
                    short_error = %short,
                    coordinate_error = %coordinate,
                    "Move could not be replayed, keeping previous position"
                );
                faults.push(ReplayFault { ply: i, short, coordinate });
            }
        }
    }

    Replay { position: pos, applied, faults }
}
