use crate::{
    cursor::{Next, PagedCursor},
    error::CursorError,
    fetch::AsyncPageFetcher,
};
use futures::{
    StreamExt, TryStreamExt,
    stream::{self, BoxStream},
};
use model::pagination::{cursor::CursorState, page::Page};
use tracing::{debug, warn};

pub type PageStream<R, E> = BoxStream<'static, Result<Page<R>, CursorError<E>>>;
pub type RowStream<R, E> = BoxStream<'static, Result<R, CursorError<E>>>;

/// Async counterpart of [`crate::pages`]: a stream of non-empty pages that
/// ends on the first empty page or after the first error.
pub fn page_stream<F>(
    fetcher: F,
    page_size: u64,
) -> Result<PageStream<F::Row, F::Error>, CursorError<F::Error>>
where
    F: AsyncPageFetcher + 'static,
    F::Row: 'static,
    F::Error: 'static,
{
    Ok(PagedCursor::new(fetcher, page_size)?.into_page_stream())
}

/// Async counterpart of [`crate::rows`].
pub fn row_stream<F>(
    fetcher: F,
    page_size: u64,
) -> Result<RowStream<F::Row, F::Error>, CursorError<F::Error>>
where
    F: AsyncPageFetcher + 'static,
    F::Row: 'static,
    F::Error: 'static,
{
    Ok(PagedCursor::new(fetcher, page_size)?.into_row_stream())
}

pub(crate) fn unfold_pages<F>(fetcher: F, state: CursorState) -> PageStream<F::Row, F::Error>
where
    F: AsyncPageFetcher + 'static,
    F::Row: 'static,
    F::Error: 'static,
{
    stream::try_unfold(
        (fetcher, Next::Fetch(state)),
        |(fetcher, next)| async move {
            let state = match next {
                Next::Fetch(state) => state,
                Next::Overflow { offset, page_size } => {
                    return Err(CursorError::OffsetOverflow { offset, page_size });
                }
                Next::Done => return Ok(None),
            };

            let (page_size, offset) = (state.page_size(), state.offset());
            let rows = fetcher
                .fetch_page(page_size, offset)
                .await
                .map_err(|source| {
                    warn!(offset, page_size, "Page fetch failed, stream closed");
                    CursorError::DataSource { offset, source }
                })?;

            debug!(offset, page_size, rows = rows.len(), "Fetched page");

            if rows.is_empty() {
                debug!(offset, "Empty page, stream exhausted");
                return Ok(None);
            }

            Ok(Some((Page::new(offset, rows), (fetcher, Next::after_page(state)))))
        },
    )
    .boxed()
}

pub(crate) fn flatten_pages<R, E>(pages: PageStream<R, E>) -> RowStream<R, E>
where
    R: Send + 'static,
    E: Send + 'static,
{
    pages
        .map_ok(|page| stream::iter(page.into_iter().map(Ok::<R, CursorError<E>>)))
        .try_flatten()
        .boxed()
}
