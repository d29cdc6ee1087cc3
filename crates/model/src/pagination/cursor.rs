use serde::{Deserialize, Serialize};
use thiserror::Error;

#[derive(Debug, Clone, Copy, Error, PartialEq, Eq)]
#[error("Invalid page size: {0} (must be at least 1)")]
pub struct InvalidPageSize(pub u64);

/// Offset tracker driving successive page fetches.
///
/// `offset` starts at zero and only moves forward, by exactly `page_size`,
/// once a non-empty page has been consumed. `page_size` never changes.
#[derive(Serialize, Deserialize, Debug, Clone, Copy, PartialEq, Eq)]
pub struct CursorState {
    page_size: u64,
    offset: u64,
}

impl CursorState {
    pub fn new(page_size: u64) -> Result<Self, InvalidPageSize> {
        if page_size == 0 {
            return Err(InvalidPageSize(page_size));
        }

        Ok(CursorState {
            page_size,
            offset: 0,
        })
    }

    pub fn page_size(&self) -> u64 {
        self.page_size
    }

    pub fn offset(&self) -> u64 {
        self.offset
    }

    /// Moves past the page just consumed. Returns the new offset, or `None`
    /// if it would not fit in a `u64` (the state is left untouched).
    pub fn advance(&mut self) -> Option<u64> {
        let next = self.offset.checked_add(self.page_size)?;
        self.offset = next;
        Some(next)
    }
}
