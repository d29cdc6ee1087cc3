//! Lazy, pull-based pagination over a fallible `fetch_page(page_size, offset)`
//! primitive.
//!
//! A cursor starts at offset zero, asks its fetcher for one page at a time and
//! stops for good the first time an empty page comes back. Rows are produced
//! only as the consumer pulls them; nothing is read ahead.

pub mod cache;
pub mod cursor;
pub mod error;
pub mod fetch;
pub mod retry;
pub mod stream;

pub use cursor::{PagedCursor, Pages, Rows, pages, rows};
pub use error::CursorError;
pub use fetch::{AsyncPageFetcher, FnFetcher, PageFetcher, from_fn};
pub use model::pagination::{
    cursor::{CursorState, InvalidPageSize},
    page::Page,
};
pub use stream::{PageStream, RowStream, page_stream, row_stream};
