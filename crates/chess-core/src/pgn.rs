//! Portable game record (PGN) parsing with a lightweight regex-based parser.

use std::sync::OnceLock;

use regex::Regex;

use crate::game_data::{GameRecord, RecordHeaders};

const STANDARD_START_FEN: &str = "rnbqkbnr/pppppppp/8/8/8/8/PPPPPPPP/RNBQKBNR w KQkq - 0 1";

fn header_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r#"\[(\w+)\s+"([^"]*)"\]"#).expect("header regex"))
}

fn move_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| {
        Regex::new(
            r"\b[a-h][1-8][a-h][1-8][qrbn]?\b|[KQRBN]?[a-h]?[1-8]?x?[a-h][1-8](?:=?[QRBN])?[+#]?|O-O-O[+#]?|O-O[+#]?",
        )
        .expect("move regex")
    })
}

/// Parse a PGN string into headers and mainline move tokens.
///
/// Returns `None` when the record has no moves and no players, or when it
/// starts from a non-standard position (SetUp "1" with a custom FEN).
pub fn parse_pgn(pgn: &str) -> Option<GameRecord> {
    let mut headers = RecordHeaders {
        white: "Unknown".to_string(),
        black: "Unknown".to_string(),
        result: "*".to_string(),
        ..RecordHeaders::default()
    };
    let mut setup = None;
    let mut fen = None;
    let mut saw_header = false;

    for cap in header_re().captures_iter(pgn) {
        saw_header = true;
        let value = cap[2].to_string();
        match &cap[1] {
            "White" => headers.white = value,
            "Black" => headers.black = value,
            "Result" => headers.result = value,
            "Date" => headers.date = Some(value),
            "TimeControl" => headers.time_control = Some(value),
            "ECO" => headers.eco = Some(value),
            "Opening" => headers.opening = Some(value),
            "Link" => headers.link = Some(value),
            "SetUp" => setup = Some(value),
            "FEN" => fen = Some(value),
            _ => {}
        }
    }

    if setup.as_deref() == Some("1") {
        if let Some(ref f) = fen {
            if f != STANDARD_START_FEN {
                return None;
            }
        }
    }

    let moves = extract_moves(pgn);
    if moves.is_empty() && !saw_header {
        return None;
    }

    Some(GameRecord { headers, moves })
}

/// Extract mainline move tokens (after removing headers, comments, variations).
pub fn extract_moves(pgn: &str) -> Vec<String> {
    let no_headers = header_re().replace_all(pgn, "");

    let mut text = strip_delimited(&no_headers, '{', '}');
    text = strip_delimited(&text, '(', ')');
    // Rest-of-line comments
    let text: String = text
        .lines()
        .map(|line| line.split(';').next().unwrap_or(""))
        .collect::<Vec<_>>()
        .join(" ");

    move_re()
        .find_iter(&text)
        .map(|m| m.as_str().to_string())
        .collect()
}

/// Remove every `open … close` span, honouring nesting.
fn strip_delimited(text: &str, open: char, close: char) -> String {
    let mut out = String::with_capacity(text.len());
    let mut depth = 0usize;
    for ch in text.chars() {
        if ch == open {
            depth += 1;
        } else if ch == close && depth > 0 {
            depth -= 1;
            out.push(' ');
        } else if depth == 0 {
            out.push(ch);
        }
    }
    out
}
