use model::pagination::cursor::InvalidPageSize;
use thiserror::Error;

/// Errors surfaced by a paged cursor. `E` is the fetcher's own error type.
#[derive(Debug, Error)]
pub enum CursorError<E> {
    /// The cursor was configured with a page size below one.
    #[error("Invalid page size: {0} (must be at least 1)")]
    InvalidPageSize(u64),

    /// The fetcher failed; the cursor is finished after this.
    #[error("Data source error at offset {offset}: {source}")]
    DataSource {
        offset: u64,
        #[source]
        source: E,
    },

    /// The next offset does not fit in a `u64`.
    #[error("Offset overflow: cannot advance {offset} by {page_size}")]
    OffsetOverflow { offset: u64, page_size: u64 },
}

impl<E> CursorError<E> {
    pub fn is_data_source(&self) -> bool {
        matches!(self, CursorError::DataSource { .. })
    }

    /// Returns the fetcher error, if that is what this is.
    pub fn into_source(self) -> Option<E> {
        match self {
            CursorError::DataSource { source, .. } => Some(source),
            _ => None,
        }
    }
}

impl<E> From<InvalidPageSize> for CursorError<E> {
    fn from(err: InvalidPageSize) -> Self {
        CursorError::InvalidPageSize(err.0)
    }
}
