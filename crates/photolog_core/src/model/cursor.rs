//! Positional cursor into the ordered entry collection.
//!
//! # Invariants
//! - `At(i)` is only produced with `i < len` for the `len` it was computed from.
//! - `Empty` is produced iff `len == 0`.
//! - The cursor holds no collection logic; the journal re-clamps it after
//!   every structural mutation.

use crate::model::entry::Entry;

/// Current selection within the journal.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Cursor {
    /// No selection; the collection is empty.
    #[default]
    Empty,
    At(usize),
}

impl Cursor {
    /// Cursor on the most recent entry, or `Empty`.
    pub fn last(len: usize) -> Self {
        match len {
            0 => Self::Empty,
            len => Self::At(len - 1),
        }
    }

    pub fn index(self) -> Option<usize> {
        match self {
            Self::Empty => None,
            Self::At(index) => Some(index),
        }
    }

    pub fn is_empty(self) -> bool {
        matches!(self, Self::Empty)
    }

    /// Moves by `step` positions, wrapping circularly in both directions.
    ///
    /// An `Empty` cursor over a non-empty collection is treated as index 0
    /// before moving, so `Empty.advance(1, len)` lands on index 1.
    pub fn advance(self, step: isize, len: usize) -> Self {
        if len == 0 {
            return Self::Empty;
        }
        let origin = self.clamp(len).index().unwrap_or(0);
        // Reduced first so any `isize` step is safe to add.
        let offset = step.rem_euclid(len as isize) as usize;
        Self::At((origin + offset) % len)
    }

    /// Pulls an out-of-range cursor back onto the collection.
    pub fn clamp(self, len: usize) -> Self {
        match self {
            _ if len == 0 => Self::Empty,
            Self::Empty => Self::Empty,
            Self::At(index) if index >= len => Self::At(len - 1),
            at => at,
        }
    }

    /// Position after the entry at `removed` was deleted.
    ///
    /// Removing the last entry selects the new last one; otherwise the same
    /// numeric index now selects the following entry.
    pub fn after_removal(removed: usize, new_len: usize) -> Self {
        if new_len == 0 {
            return Self::Empty;
        }
        Self::At(removed.min(new_len - 1))
    }

    pub fn current(self, entries: &[Entry]) -> Option<&Entry> {
        self.index().and_then(|index| entries.get(index))
    }
}
