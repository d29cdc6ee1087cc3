use crate::fetch::{AsyncPageFetcher, PageFetcher};
use async_trait::async_trait;
use std::{
    collections::HashMap,
    sync::{
        Arc, Mutex, MutexGuard, PoisonError,
        atomic::{AtomicU64, Ordering},
    },
};
use tracing::trace;

/// Pages already read from one source, keyed by `(page_size, offset)`.
///
/// The cache is an explicit object owned by the caller and shared with a
/// [`Cached`] fetcher through an `Arc`. It knows nothing about which source
/// it belongs to, so never hand the same cache to two different sources.
pub struct PageCache<R> {
    entries: Mutex<HashMap<(u64, u64), Vec<R>>>,
    hits: AtomicU64,
    misses: AtomicU64,
}

impl<R: Clone> PageCache<R> {
    pub fn new() -> Self {
        PageCache {
            entries: Mutex::new(HashMap::new()),
            hits: AtomicU64::new(0),
            misses: AtomicU64::new(0),
        }
    }

    pub fn get(&self, page_size: u64, offset: u64) -> Option<Vec<R>> {
        let cached = self.lock().get(&(page_size, offset)).cloned();
        match cached {
            Some(_) => self.hits.fetch_add(1, Ordering::Relaxed),
            None => self.misses.fetch_add(1, Ordering::Relaxed),
        };
        cached
    }

    pub fn insert(&self, page_size: u64, offset: u64, rows: Vec<R>) {
        self.lock().insert((page_size, offset), rows);
    }

    pub fn hits(&self) -> u64 {
        self.hits.load(Ordering::Relaxed)
    }

    pub fn misses(&self) -> u64 {
        self.misses.load(Ordering::Relaxed)
    }

    pub fn len(&self) -> usize {
        self.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.lock().is_empty()
    }

    pub fn clear(&self) {
        self.lock().clear();
    }

    fn lock(&self) -> MutexGuard<'_, HashMap<(u64, u64), Vec<R>>> {
        // Poisoning is ignored: entries are only ever replaced whole.
        self.entries.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

impl<R: Clone> Default for PageCache<R> {
    fn default() -> Self {
        Self::new()
    }
}

/// Fetcher decorator serving repeated `(page_size, offset)` requests from a
/// [`PageCache`]. Empty pages are cached too; errors never are.
pub struct Cached<F, R> {
    inner: F,
    cache: Arc<PageCache<R>>,
}

impl<F, R> Cached<F, R> {
    pub fn new(inner: F, cache: Arc<PageCache<R>>) -> Self {
        Cached { inner, cache }
    }

    pub fn cache(&self) -> &Arc<PageCache<R>> {
        &self.cache
    }
}

impl<F> PageFetcher for Cached<F, F::Row>
where
    F: PageFetcher,
    F::Row: Clone,
{
    type Row = F::Row;
    type Error = F::Error;

    fn fetch_page(&mut self, page_size: u64, offset: u64) -> Result<Vec<Self::Row>, Self::Error> {
        if let Some(rows) = self.cache.get(page_size, offset) {
            trace!(page_size, offset, "Serving page from cache");
            return Ok(rows);
        }

        let rows = self.inner.fetch_page(page_size, offset)?;
        self.cache.insert(page_size, offset, rows.clone());
        Ok(rows)
    }
}

#[async_trait]
impl<F> AsyncPageFetcher for Cached<F, F::Row>
where
    F: AsyncPageFetcher,
    F::Row: Clone,
{
    type Row = F::Row;
    type Error = F::Error;

    async fn fetch_page(
        &self,
        page_size: u64,
        offset: u64,
    ) -> Result<Vec<Self::Row>, Self::Error> {
        if let Some(rows) = self.cache.get(page_size, offset) {
            trace!(page_size, offset, "Serving page from cache");
            return Ok(rows);
        }

        let rows = self.inner.fetch_page(page_size, offset).await?;
        self.cache.insert(page_size, offset, rows.clone());
        Ok(rows)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn counts_hits_and_misses() {
        let cache: PageCache<u32> = PageCache::new();
        assert!(cache.get(2, 0).is_none());
        cache.insert(2, 0, vec![1, 2]);
        assert_eq!(cache.get(2, 0), Some(vec![1, 2]));
        assert!(cache.get(3, 0).is_none());

        assert_eq!(cache.hits(), 1);
        assert_eq!(cache.misses(), 2);
        assert_eq!(cache.len(), 1);

        cache.clear();
        assert!(cache.is_empty());
    }
}
