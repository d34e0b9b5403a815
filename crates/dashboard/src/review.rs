//! Game review: a board cursor kept in step with the move list and score
//! panel, plus the per-classification move browser.

use chess_core::pgn::parse_pgn;
use chess_core::{AnalyzedMove, Classification, CursorStart, Game, Navigation, Ply, SyncedCursor};
use tracing::warn;

use crate::backend::{DashboardBackend, GameDetail};
use crate::error::{DashboardError, Result};

pub const REVIEW_PLACEHOLDER: &str = "Review unavailable right now.";

/// One row of the move list.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MoveRow {
    pub cursor: usize, // cursor value that displays this move
    pub label: String, // "12." or "12..."
    pub notation: String,
    pub classification: Classification,
    pub active: bool,
}

/// Coordinator for one game: owns the shared cursor value and derives the
/// board, move list and score panel from it.
pub struct GameReview {
    game: Game,
    analysis: Vec<AnalyzedMove>,
    selected: usize,
    board: SyncedCursor,
}

impl GameReview {
    pub fn new(detail: GameDetail, start: CursorStart) -> Self {
        let GameDetail { game, mut analysis } = detail;
        analysis.sort_by_key(AnalyzedMove::ply_index);

        let plies: Vec<Ply> = if analysis.is_empty() {
            record_plies(&game)
        } else {
            analysis.iter().map(Ply::from).collect()
        };

        let mut board = SyncedCursor::new(plies, start);
        let selected = board.cursor();
        board.observe(selected);
        Self {
            game,
            analysis,
            selected,
            board,
        }
    }

    pub async fn load<B>(backend: &B, game_id: i64, start: CursorStart) -> Result<Self>
    where
        B: DashboardBackend + ?Sized,
    {
        let detail = backend.game_detail(game_id).await?;
        Ok(Self::new(detail, start))
    }

    pub fn game(&self) -> &Game {
        &self.game
    }

    pub fn analysis(&self) -> &[AnalyzedMove] {
        &self.analysis
    }

    pub fn len(&self) -> usize {
        self.board.len()
    }

    pub fn is_empty(&self) -> bool {
        self.board.is_empty()
    }

    /// The shared cursor value.
    pub fn cursor(&self) -> usize {
        self.selected
    }

    /// Move-list click: the parent value changes and the board follows on sync.
    pub fn select_cursor(&mut self, cursor: usize) -> usize {
        self.selected = cursor.min(self.board.len());
        self.sync()
    }

    /// Show the position after `mv`, located by its row in this game's analysis.
    pub fn select_move(&mut self, mv: &AnalyzedMove) -> usize {
        let cursor = self
            .analysis
            .iter()
            .position(|m| m.id == mv.id && m.game_id == mv.game_id)
            .map(|i| i + 1)
            .unwrap_or_else(|| mv.ply_index());
        self.select_cursor(cursor)
    }

    /// Board controls: the board moves first and reports back on sync.
    pub fn navigate(&mut self, nav: Navigation) -> usize {
        self.board.navigate(nav);
        self.sync()
    }

    /// One update cycle between the parent value and the board.
    pub fn sync(&mut self) -> usize {
        if let Some(value) = self.board.observe(self.selected) {
            self.selected = value;
            self.board.observe(self.selected);
        }
        self.selected
    }

    pub fn fen(&self) -> String {
        self.board.fen()
    }

    pub fn board(&self) -> &SyncedCursor {
        &self.board
    }

    /// "cursor / total" as shown between the board controls.
    pub fn counter(&self) -> String {
        format!("{} / {}", self.selected, self.board.len())
    }

    /// The analyzed move behind the displayed position: the board replays
    /// `analysis[..cursor]`, so this is `analysis[cursor - 1]`.
    pub fn selected_move(&self) -> Option<&AnalyzedMove> {
        self.selected
            .checked_sub(1)
            .and_then(|i| self.analysis.get(i))
    }

    pub fn score(&self) -> Option<i32> {
        self.selected_move().and_then(|m| m.score)
    }

    pub fn move_list(&self) -> Vec<MoveRow> {
        self.analysis
            .iter()
            .enumerate()
            .map(|(i, m)| {
                let cursor = i + 1;
                MoveRow {
                    cursor,
                    label: move_label(m),
                    notation: m.display_notation().to_string(),
                    classification: m.classification,
                    active: cursor == self.selected,
                }
            })
            .collect()
    }
}

/// Plies from the game's PGN. Records that start from a custom position
/// cannot be replayed and yield no plies.
fn record_plies(game: &Game) -> Vec<Ply> {
    let Some(pgn) = game.pgn.as_deref().filter(|p| !p.trim().is_empty()) else {
        return Vec::new();
    };
    match parse_pgn(pgn) {
        Some(record) => Ply::from_tokens(record.moves.as_slice()),
        None => {
            warn!(game_id = game.id, "Game record cannot be replayed from the standard start");
            Vec::new()
        }
    }
}

fn move_label(mv: &AnalyzedMove) -> String {
    match mv.color {
        chess_core::Side::White => format!("{}.", mv.move_number),
        chess_core::Side::Black => format!("{}...", mv.move_number),
    }
}

/// Narrative review for one move, or a placeholder when it cannot be fetched.
pub async fn fetch_review<B>(backend: &B, move_id: i64) -> String
where
    B: DashboardBackend + ?Sized,
{
    match backend.review_move(move_id).await {
        Ok(text) if !text.trim().is_empty() => text,
        Ok(_) => REVIEW_PLACEHOLDER.to_string(),
        Err(e) => {
            warn!(move_id, error = %e, "Move review failed");
            REVIEW_PLACEHOLDER.to_string()
        }
    }
}

/// All of a user's moves with one classification, with a board for the
/// selected one.
pub struct ClassificationBrowser {
    username: String,
    classification: Classification,
    moves: Vec<AnalyzedMove>,
    selected: Option<usize>,
    review: Option<GameReview>,
}

impl ClassificationBrowser {
    pub async fn load<B>(backend: &B, username: &str, classification: Classification) -> Result<Self>
    where
        B: DashboardBackend + ?Sized,
    {
        let moves = backend
            .moves_by_classification(username, classification)
            .await?;
        Ok(Self {
            username: username.to_string(),
            classification,
            moves,
            selected: None,
            review: None,
        })
    }

    pub fn username(&self) -> &str {
        &self.username
    }

    pub fn title(&self) -> String {
        format!("{} Moves ({})", self.classification, self.moves.len())
    }

    pub fn moves(&self) -> &[AnalyzedMove] {
        &self.moves
    }

    pub fn selected_move(&self) -> Option<&AnalyzedMove> {
        self.selected.and_then(|i| self.moves.get(i))
    }

    pub fn review(&self) -> Option<&GameReview> {
        self.review.as_ref()
    }

    pub fn review_mut(&mut self) -> Option<&mut GameReview> {
        self.review.as_mut()
    }

    /// Select the `index`-th move: load its game and put the board right
    /// after that move. The previous board stays if the game cannot load.
    pub async fn open<B>(&mut self, backend: &B, index: usize) -> Result<&GameReview>
    where
        B: DashboardBackend + ?Sized,
    {
        let mv = self
            .moves
            .get(index)
            .cloned()
            .ok_or_else(|| DashboardError::BadRequest(format!("No move at position {index}")))?;
        self.selected = Some(index);

        let mut review = GameReview::load(backend, mv.game_id, CursorStart::End).await?;
        review.select_move(&mv);
        let review: &GameReview = self.review.insert(review);
        Ok(review)
    }

    /// Engine suggestion for the selected move, hidden when it was already best.
    pub fn best_move_hint(&self) -> Option<&str> {
        let mv = self.selected_move()?;
        if mv.classification == Classification::Best {
            return None;
        }
        mv.best_move.as_deref().filter(|b| !b.is_empty())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::orchestrator::tests::{game, FakeBackend};
    use chess_core::{replay, Side};

    fn mv(id: i64, n: u32, color: Side, san: &str, uci: &str, class: Classification) -> AnalyzedMove {
        AnalyzedMove {
            id,
            game_id: 3,
            move_number: n,
            color,
            move_san: Some(san.into()),
            move_uci: uci.into(),
            score: Some(id as i32 * 10),
            classification: class,
            best_move: Some("d2d4".into()),
            opening: None,
        }
    }

    fn detail() -> GameDetail {
        GameDetail {
            game: game(3),
            analysis: vec![
                mv(1, 1, Side::White, "e4", "e2e4", Classification::Book),
                mv(2, 1, Side::Black, "e5", "e7e5", Classification::Book),
                mv(3, 2, Side::White, "Nf3", "g1f3", Classification::Best),
                mv(4, 2, Side::Black, "Qh4", "d8h4", Classification::Blunder),
                mv(5, 3, Side::White, "Nxh4", "f3h4", Classification::Best),
            ],
        }
    }

    #[test]
    fn test_opens_at_chosen_end() {
        let review = GameReview::new(detail(), CursorStart::End);
        assert_eq!(review.cursor(), 5);
        assert_eq!(review.counter(), "5 / 5");
        assert_eq!(review.selected_move().unwrap().id, 5);

        let review = GameReview::new(detail(), CursorStart::Beginning);
        assert_eq!(review.cursor(), 0);
        assert!(review.selected_move().is_none());
        assert!(review.score().is_none());
    }

    #[test]
    fn test_list_click_moves_board_and_siblings() {
        let mut review = GameReview::new(detail(), CursorStart::End);
        let blunder = review.analysis()[3].clone();
        review.select_move(&blunder);

        assert_eq!(review.cursor(), 4);
        assert_eq!(review.board().cursor(), 4);
        assert_eq!(review.score(), Some(40));
        let plies: Vec<Ply> = review.analysis().iter().map(Ply::from).collect();
        assert_eq!(review.fen(), replay(&plies, 4).fen());

        let active: Vec<usize> = review
            .move_list()
            .iter()
            .filter(|r| r.active)
            .map(|r| r.cursor)
            .collect();
        assert_eq!(active, vec![4]);
    }

    #[test]
    fn test_board_controls_update_parent() {
        let mut review = GameReview::new(detail(), CursorStart::End);
        review.navigate(Navigation::Back);
        review.navigate(Navigation::Back);
        assert_eq!(review.cursor(), 3);
        assert_eq!(review.selected_move().unwrap().move_san.as_deref(), Some("Nf3"));
        for _ in 0..10 {
            review.navigate(Navigation::Forward);
        }
        assert_eq!(review.cursor(), 5);
        review.navigate(Navigation::Start);
        assert_eq!(review.cursor(), 0);
    }

    #[test]
    fn test_same_list_item_twice_after_navigation() {
        let mut review = GameReview::new(detail(), CursorStart::End);
        review.select_cursor(2);
        review.navigate(Navigation::Forward);
        assert_eq!(review.cursor(), 3);
        review.select_cursor(2);
        assert_eq!(review.board().cursor(), 2);
    }

    #[test]
    fn test_pgn_fallback_when_no_analysis() {
        let detail = GameDetail {
            game: game(9),
            analysis: Vec::new(),
        };
        let review = GameReview::new(detail, CursorStart::End);
        assert_eq!(review.len(), 5);
        assert!(review.move_list().is_empty());
        assert!(review.fen().starts_with("r1bqkbnr/pppp1ppp/2n5/4p3/2B1P3/5N2/PPPP1PPP/RNBQK2R b"));
    }

    #[test]
    fn test_custom_start_record_has_no_plies() {
        let mut g = game(11);
        g.pgn = Some(
            "[SetUp \"1\"]\n[FEN \"8/8/8/8/8/8/1K6/7k w - - 0 1\"]\n\n1. Kc3 Kg2 2. Kd4 *".into(),
        );
        let review = GameReview::new(GameDetail { game: g, analysis: Vec::new() }, CursorStart::End);
        assert!(review.is_empty());
        assert_eq!(review.cursor(), 0);
        assert!(review.board().position().is_clean());
        assert_eq!(review.counter(), "0 / 0");
    }

    #[test]
    fn test_selected_move_follows_row_order_with_gaps() {
        // 2. Nf3 is missing from the analysis rows
        let mut d = detail();
        d.analysis.remove(2);
        let mut review = GameReview::new(d, CursorStart::Beginning);

        let cursors: Vec<usize> = review.move_list().iter().map(|r| r.cursor).collect();
        assert_eq!(cursors, vec![1, 2, 3, 4]);

        review.select_cursor(3);
        assert_eq!(review.selected_move().unwrap().id, 4);
        assert_eq!(review.score(), Some(40));

        let last = review.analysis()[3].clone();
        assert_eq!(review.select_move(&last), 4);
    }

    #[test]
    fn test_move_labels() {
        let review = GameReview::new(detail(), CursorStart::End);
        let labels: Vec<String> = review.move_list().into_iter().map(|r| r.label).collect();
        assert_eq!(labels, vec!["1.", "1...", "2.", "2...", "3."]);
    }

    #[tokio::test]
    async fn test_review_placeholder_on_failure() {
        let backend = FakeBackend::new().with_review(1, "This move is Best because...");
        assert_eq!(fetch_review(&backend, 1).await, "This move is Best because...");
        assert_eq!(fetch_review(&backend, 2).await, REVIEW_PLACEHOLDER);
    }

    #[tokio::test]
    async fn test_browser_opens_game_at_move() {
        let d = detail();
        let blunders = vec![d.analysis[3].clone()];
        let backend = FakeBackend::new().with_detail(d).with_moves(blunders);

        let mut browser = ClassificationBrowser::load(&backend, "hero", Classification::Blunder)
            .await
            .unwrap();
        assert_eq!(browser.title(), "Blunder Moves (1)");
        assert!(browser.review().is_none());

        let review = browser.open(&backend, 0).await.unwrap();
        assert_eq!(review.cursor(), 4);
        assert_eq!(browser.best_move_hint(), Some("d2d4"));
        assert!(browser.open(&backend, 5).await.is_err());
    }

    #[tokio::test]
    async fn test_browser_missing_game_is_an_error() {
        let backend = FakeBackend::new().with_moves(vec![mv(
            1,
            1,
            Side::White,
            "e4",
            "e2e4",
            Classification::Best,
        )]);
        let mut browser = ClassificationBrowser::load(&backend, "hero", Classification::Best)
            .await
            .unwrap();
        assert!(browser.open(&backend, 0).await.is_err());
        assert_eq!(browser.best_move_hint(), None); // Best moves carry no hint
    }
}
