use async_trait::async_trait;
use std::sync::Arc;

/// Blocking page-fetch primitive.
///
/// Returns at most `page_size` rows starting at `offset`, in a stable order.
/// An empty result means there is nothing left to read.
pub trait PageFetcher {
    type Row;
    type Error;

    fn fetch_page(&mut self, page_size: u64, offset: u64) -> Result<Vec<Self::Row>, Self::Error>;
}

impl<F: PageFetcher + ?Sized> PageFetcher for &mut F {
    type Row = F::Row;
    type Error = F::Error;

    fn fetch_page(&mut self, page_size: u64, offset: u64) -> Result<Vec<Self::Row>, Self::Error> {
        (**self).fetch_page(page_size, offset)
    }
}

impl<F: PageFetcher + ?Sized> PageFetcher for Box<F> {
    type Row = F::Row;
    type Error = F::Error;

    fn fetch_page(&mut self, page_size: u64, offset: u64) -> Result<Vec<Self::Row>, Self::Error> {
        (**self).fetch_page(page_size, offset)
    }
}

/// Async page-fetch primitive, for sources behind a database driver.
///
/// Takes `&self` so one fetcher (and its connection pool) can be shared; the
/// cursor still issues one fetch at a time.
#[async_trait]
pub trait AsyncPageFetcher: Send + Sync {
    type Row: Send;
    type Error: Send;

    async fn fetch_page(&self, page_size: u64, offset: u64)
    -> Result<Vec<Self::Row>, Self::Error>;
}

#[async_trait]
impl<F: AsyncPageFetcher + ?Sized> AsyncPageFetcher for Arc<F> {
    type Row = F::Row;
    type Error = F::Error;

    async fn fetch_page(
        &self,
        page_size: u64,
        offset: u64,
    ) -> Result<Vec<Self::Row>, Self::Error> {
        self.as_ref().fetch_page(page_size, offset).await
    }
}

/// Fetcher backed by a closure, see [`from_fn`].
#[derive(Clone)]
pub struct FnFetcher<F>(F);

/// Wraps a `(page_size, offset) -> Result<Vec<Row>, E>` closure as a
/// [`PageFetcher`].
pub fn from_fn<F, R, E>(f: F) -> FnFetcher<F>
where
    F: FnMut(u64, u64) -> Result<Vec<R>, E>,
{
    FnFetcher(f)
}

impl<F, R, E> PageFetcher for FnFetcher<F>
where
    F: FnMut(u64, u64) -> Result<Vec<R>, E>,
{
    type Row = R;
    type Error = E;

    fn fetch_page(&mut self, page_size: u64, offset: u64) -> Result<Vec<R>, E> {
        (self.0)(page_size, offset)
    }
}
