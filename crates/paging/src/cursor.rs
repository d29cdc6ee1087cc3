use crate::{
    error::CursorError,
    fetch::{AsyncPageFetcher, PageFetcher},
    stream::{self, PageStream, RowStream},
};
use model::pagination::{
    cursor::{CursorState, InvalidPageSize},
    page::Page,
};
use std::iter::FusedIterator;
use tracing::{debug, warn};

/// A fetcher paired with a fresh cursor state (offset zero).
///
/// Consumed by [`PagedCursor::pages`], [`PagedCursor::rows`] or one of the
/// stream conversions; a cursor cannot be rewound.
pub struct PagedCursor<F> {
    fetcher: F,
    state: CursorState,
}

impl<F> PagedCursor<F> {
    /// Fails before any fetch if `page_size` is zero.
    pub fn new(fetcher: F, page_size: u64) -> Result<Self, InvalidPageSize> {
        let state = CursorState::new(page_size)?;
        Ok(PagedCursor { fetcher, state })
    }

    pub fn state(&self) -> &CursorState {
        &self.state
    }

    pub fn pages(self) -> Pages<F>
    where
        F: PageFetcher,
    {
        Pages {
            fetcher: self.fetcher,
            next: Next::Fetch(self.state),
        }
    }

    pub fn rows(self) -> Rows<F>
    where
        F: PageFetcher,
    {
        Rows {
            pages: self.pages(),
            current: Vec::new().into_iter(),
        }
    }

    pub fn into_page_stream(self) -> PageStream<F::Row, F::Error>
    where
        F: AsyncPageFetcher + 'static,
        F::Row: 'static,
        F::Error: 'static,
    {
        stream::unfold_pages(self.fetcher, self.state)
    }

    pub fn into_row_stream(self) -> RowStream<F::Row, F::Error>
    where
        F: AsyncPageFetcher + 'static,
        F::Row: 'static,
        F::Error: 'static,
    {
        stream::flatten_pages(self.into_page_stream())
    }
}

/// Lazy sequence of pages, see [`pages`].
pub fn pages<F: PageFetcher>(
    fetcher: F,
    page_size: u64,
) -> Result<Pages<F>, CursorError<F::Error>> {
    Ok(PagedCursor::new(fetcher, page_size)?.pages())
}

/// Lazy sequence of rows: [`pages`] flattened in order.
pub fn rows<F: PageFetcher>(fetcher: F, page_size: u64) -> Result<Rows<F>, CursorError<F::Error>> {
    Ok(PagedCursor::new(fetcher, page_size)?.rows())
}

/// What the next pull does.
#[derive(Debug, Clone, Copy)]
pub(crate) enum Next {
    Fetch(CursorState),
    Overflow { offset: u64, page_size: u64 },
    Done,
}

impl Next {
    /// Transition after a non-empty page was read with `state`.
    pub(crate) fn after_page(mut state: CursorState) -> Next {
        let (offset, page_size) = (state.offset(), state.page_size());
        match state.advance() {
            Some(_) => Next::Fetch(state),
            None => Next::Overflow { offset, page_size },
        }
    }
}

/// Iterator over non-empty pages.
///
/// Each `next()` issues exactly one fetch. The iterator is fused: after an
/// empty page or an error it returns `None` without touching the fetcher.
pub struct Pages<F> {
    fetcher: F,
    next: Next,
}

impl<F> Pages<F> {
    /// Offset the next pull will fetch from, if the sequence is still live.
    pub fn offset(&self) -> Option<u64> {
        match self.next {
            Next::Fetch(state) => Some(state.offset()),
            _ => None,
        }
    }

    pub fn is_finished(&self) -> bool {
        matches!(self.next, Next::Done)
    }
}

impl<F: PageFetcher> Iterator for Pages<F> {
    type Item = Result<Page<F::Row>, CursorError<F::Error>>;

    fn next(&mut self) -> Option<Self::Item> {
        let state = match std::mem::replace(&mut self.next, Next::Done) {
            Next::Fetch(state) => state,
            Next::Overflow { offset, page_size } => {
                return Some(Err(CursorError::OffsetOverflow { offset, page_size }));
            }
            Next::Done => return None,
        };

        let (page_size, offset) = (state.page_size(), state.offset());
        let rows = match self.fetcher.fetch_page(page_size, offset) {
            Ok(rows) => rows,
            Err(source) => {
                warn!(offset, page_size, "Page fetch failed, cursor closed");
                return Some(Err(CursorError::DataSource { offset, source }));
            }
        };

        debug!(offset, page_size, rows = rows.len(), "Fetched page");

        if rows.is_empty() {
            debug!(offset, "Empty page, cursor exhausted");
            return None;
        }

        self.next = Next::after_page(state);
        Some(Ok(Page::new(offset, rows)))
    }
}

impl<F: PageFetcher> FusedIterator for Pages<F> {}

/// Iterator over individual rows, page boundaries flattened away.
pub struct Rows<F: PageFetcher> {
    pages: Pages<F>,
    current: std::vec::IntoIter<F::Row>,
}

impl<F: PageFetcher> Rows<F> {
    pub fn is_finished(&self) -> bool {
        self.pages.is_finished() && self.current.len() == 0
    }
}

impl<F: PageFetcher> Iterator for Rows<F> {
    type Item = Result<F::Row, CursorError<F::Error>>;

    fn next(&mut self) -> Option<Self::Item> {
        loop {
            if let Some(row) = self.current.next() {
                return Some(Ok(row));
            }

            match self.pages.next()? {
                Ok(page) => self.current = page.into_iter(),
                Err(err) => return Some(Err(err)),
            }
        }
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        let buffered = self.current.len();
        if self.pages.is_finished() {
            (buffered, Some(buffered))
        } else {
            (buffered, None)
        }
    }
}

impl<F: PageFetcher> FusedIterator for Rows<F> {}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::fetch::from_fn;
    use std::convert::Infallible;
    use tracing_test::traced_test;

    #[test]
    fn new_rejects_zero_page_size() {
        let called = std::cell::Cell::new(false);
        let fetch = from_fn(|_, _| {
            called.set(true);
            Ok::<Vec<u8>, Infallible>(Vec::new())
        });
        assert!(PagedCursor::new(fetch, 0).is_err());
        assert!(!called.get());
    }

    #[test]
    fn state_starts_at_zero() {
        let fetch = from_fn(|_, _| Ok::<Vec<u8>, Infallible>(Vec::new()));
        let cursor = PagedCursor::new(fetch, 7).unwrap();
        assert_eq!(cursor.state().offset(), 0);
        assert_eq!(cursor.state().page_size(), 7);
    }

    #[test]
    fn pages_report_their_offsets() {
        let data: Vec<u32> = (0..7).collect();
        let fetch = from_fn(|size: u64, offset: u64| {
            let start = (offset as usize).min(data.len());
            let end = (start + size as usize).min(data.len());
            Ok::<_, Infallible>(data[start..end].to_vec())
        });

        let offsets: Vec<u64> = pages(fetch, 3)
            .unwrap()
            .map(|page| page.unwrap().offset)
            .collect();
        assert_eq!(offsets, vec![0, 3, 6]);
    }

    #[test]
    fn overflow_is_reported_after_last_page() {
        let mut state = CursorState::new(u64::MAX).unwrap();
        state.advance();
        let mut pages = Pages {
            fetcher: from_fn(|_, _| Ok::<_, Infallible>(vec![1u8])),
            next: Next::Fetch(state),
        };

        let first = pages.next().unwrap().unwrap();
        assert_eq!(first.offset, u64::MAX);
        assert!(matches!(
            pages.next(),
            Some(Err(CursorError::OffsetOverflow { .. }))
        ));
        assert!(pages.next().is_none());
        assert!(pages.is_finished());
    }

    #[traced_test]
    #[test]
    fn fetch_failure_is_logged() {
        let fetch = from_fn(|_, _| Err::<Vec<u8>, _>("connection reset"));
        let mut pages = pages(fetch, 2).unwrap();
        assert!(matches!(pages.next(), Some(Err(CursorError::DataSource { offset: 0, .. }))));
        assert!(logs_contain("Page fetch failed"));
    }
}
