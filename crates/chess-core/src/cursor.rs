//! Move cursor over a fixed sequence of plies.
//!
//! The cursor is the only navigation state. The displayed position is derived
//! by replaying from the initial position on every read, so no incremental
//! board state can drift out of sync with the cursor.

use crate::replay::{replay, Ply, Replay};

/// Where a freshly opened board starts.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum CursorStart {
    Beginning,
    #[default]
    End,
}

/// Board navigation controls.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Navigation {
    Start,
    Back,
    Forward,
    End,
    Jump(usize),
}

/// Cursor in `[0, len]` over an immutable ply sequence.
#[derive(Debug, Clone)]
pub struct MoveCursor {
    plies: Vec<Ply>,
    cursor: usize,
}

impl MoveCursor {
    pub fn new(plies: Vec<Ply>, start: CursorStart) -> Self {
        let cursor = match start {
            CursorStart::Beginning => 0,
            CursorStart::End => plies.len(),
        };
        Self { plies, cursor }
    }

    pub fn len(&self) -> usize {
        self.plies.len()
    }

    pub fn is_empty(&self) -> bool {
        self.plies.is_empty()
    }

    pub fn cursor(&self) -> usize {
        self.cursor
    }

    pub fn plies(&self) -> &[Ply] {
        &self.plies
    }

    /// Set the cursor, clamping silently to `[0, len]`. Returns the stored value.
    pub fn set_cursor(&mut self, value: usize) -> usize {
        self.cursor = value.min(self.plies.len());
        self.cursor
    }

    pub fn step_start(&mut self) -> usize {
        self.set_cursor(0)
    }

    pub fn step_back(&mut self) -> usize {
        self.set_cursor(self.cursor.saturating_sub(1))
    }

    pub fn step_forward(&mut self) -> usize {
        self.set_cursor(self.cursor.saturating_add(1))
    }

    pub fn step_end(&mut self) -> usize {
        self.set_cursor(self.plies.len())
    }

    pub fn apply(&mut self, nav: Navigation) -> usize {
        match nav {
            Navigation::Start => self.step_start(),
            Navigation::Back => self.step_back(),
            Navigation::Forward => self.step_forward(),
            Navigation::End => self.step_end(),
            Navigation::Jump(n) => self.set_cursor(n),
        }
    }

    /// Full replay up to the cursor.
    pub fn position(&self) -> Replay {
        replay(&self.plies, self.cursor)
    }

    pub fn fen(&self) -> String {
        self.position().fen()
    }

    /// The ply that produced the displayed position, if any.
    pub fn current_ply(&self) -> Option<&Ply> {
        self.cursor.checked_sub(1).and_then(|i| self.plies.get(i))
    }
}

/// A board cursor kept in step with a value owned by a parent.
///
/// The parent passes its value down on every update cycle through
/// [`SyncedCursor::observe`]. Navigation from the board's own controls is held
/// as a pending notification until the next cycle, where it is handed to the
/// parent, unless the parent has supplied a new value in the meantime, in which
/// case the parent's value wins and the pending one is dropped.
#[derive(Debug, Clone)]
pub struct SyncedCursor {
    inner: MoveCursor,
    seen_external: Option<usize>,
    pending: Option<usize>,
}

impl SyncedCursor {
    pub fn new(plies: Vec<Ply>, start: CursorStart) -> Self {
        Self {
            inner: MoveCursor::new(plies, start),
            seen_external: None,
            pending: None,
        }
    }

    pub fn cursor(&self) -> usize {
        self.inner.cursor()
    }

    pub fn len(&self) -> usize {
        self.inner.len()
    }

    pub fn is_empty(&self) -> bool {
        self.inner.is_empty()
    }

    pub fn engine(&self) -> &MoveCursor {
        &self.inner
    }

    pub fn has_pending(&self) -> bool {
        self.pending.is_some()
    }

    /// Navigation from the board's own controls.
    pub fn navigate(&mut self, nav: Navigation) -> usize {
        let before = self.inner.cursor();
        let after = self.inner.apply(nav);
        if after != before || self.pending.is_some() {
            self.pending = Some(after);
        }
        after
    }

    /// Run one update cycle against the parent's current value.
    ///
    /// Returns the value the parent should store when the board's own
    /// navigation is the newest change, `None` otherwise.
    pub fn observe(&mut self, external: usize) -> Option<usize> {
        if self.seen_external != Some(external) {
            self.seen_external = Some(external);
            self.pending = None;
            self.inner.set_cursor(external);
            return None;
        }
        self.pending.take()
    }

    pub fn position(&self) -> Replay {
        self.inner.position()
    }

    pub fn fen(&self) -> String {
        self.inner.fen()
    }
}
