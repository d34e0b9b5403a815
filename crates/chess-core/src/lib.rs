//! Chess model shared by the dashboard: game data, portable game records,
//! move replay and the move cursor.

pub mod cursor;
pub mod game_data;
pub mod pgn;
pub mod replay;

pub use cursor::{CursorStart, MoveCursor, Navigation, SyncedCursor};
pub use game_data::{AnalyzedMove, Classification, Game, GameRecord, RecordHeaders, Side};
pub use replay::{replay, Ply, Replay, ReplayFault};
