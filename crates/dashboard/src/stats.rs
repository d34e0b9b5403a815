//! Chart data derived from player stats.

use std::collections::HashMap;

use chess_core::Classification;

use crate::backend::{GameHistoryEntry, PlayerStats};

const UNKNOWN_OPENING: &str = "Unknown";

/// Most played openings, most frequent first. Ties keep first-seen order.
pub fn top_openings(history: &[GameHistoryEntry], limit: usize) -> Vec<(String, usize)> {
    let mut order: Vec<&str> = Vec::new();
    let mut counts: HashMap<&str, usize> = HashMap::new();

    for entry in history {
        let name = entry.opening.trim();
        let name = if name.is_empty() { UNKNOWN_OPENING } else { name };
        let count = counts.entry(name).or_insert(0);
        if *count == 0 {
            order.push(name);
        }
        *count += 1;
    }

    let mut ranked: Vec<(String, usize)> = order
        .into_iter()
        .map(|name| (name.to_string(), counts[name]))
        .collect();
    // stable sort keeps first-seen order among equals
    ranked.sort_by(|a, b| b.1.cmp(&a.1));
    ranked.truncate(limit);
    ranked
}

/// Move-quality bars in chart order. `None` when there is nothing to draw.
pub fn move_quality(counts: &HashMap<Classification, u32>) -> Option<Vec<(Classification, u32)>> {
    let bars: Vec<(Classification, u32)> = Classification::QUALITY_ORDER
        .iter()
        .map(|c| (*c, counts.get(c).copied().unwrap_or(0)))
        .collect();
    if bars.iter().all(|(_, n)| *n == 0) {
        return None;
    }
    Some(bars)
}

/// Headline numbers for the stats cards.
#[derive(Debug, Clone, PartialEq)]
pub struct Summary {
    pub total_games: u32,
    pub win_rate: f64,
    pub record: String,
    pub avg_accuracy: f64,
    pub style: String,
}

impl From<&PlayerStats> for Summary {
    fn from(stats: &PlayerStats) -> Self {
        Self {
            total_games: stats.total_games,
            win_rate: stats.win_rate,
            record: stats.record.clone(),
            avg_accuracy: stats.avg_accuracy,
            style: stats.style.clone(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn entry(opening: &str) -> GameHistoryEntry {
        GameHistoryEntry {
            opening: opening.to_string(),
            ..GameHistoryEntry::default()
        }
    }

    #[test]
    fn test_top_openings_ranked_with_ties_in_first_seen_order() {
        let history: Vec<_> = ["Caro-Kann", "Sicilian", "", "Sicilian", "Caro-Kann", "  ", "London"]
            .iter()
            .map(|o| entry(o))
            .collect();
        let top = top_openings(&history, 10);
        assert_eq!(
            top,
            vec![
                ("Caro-Kann".to_string(), 2),
                ("Sicilian".to_string(), 2),
                ("Unknown".to_string(), 2),
                ("London".to_string(), 1),
            ]
        );
        assert_eq!(top_openings(&history, 1).len(), 1);
        assert!(top_openings(&[], 10).is_empty());
    }

    #[test]
    fn test_move_quality_order_and_empty() {
        let mut counts = HashMap::new();
        assert!(move_quality(&counts).is_none());

        counts.insert(Classification::Blunder, 3);
        counts.insert(Classification::Book, 7); // not charted
        let bars = move_quality(&counts).unwrap();
        assert_eq!(bars.len(), 9);
        assert_eq!(bars[0], (Classification::Brilliant, 0));
        assert_eq!(bars[7], (Classification::Blunder, 3));

        let mut only_book = HashMap::new();
        only_book.insert(Classification::Book, 4);
        assert!(move_quality(&only_book).is_none());
    }
}
