#![allow(dead_code)]

use async_trait::async_trait;
use paging::{AsyncPageFetcher, PageFetcher};
use std::sync::{Arc, Mutex};
use thiserror::Error;

#[derive(Debug, Error, Clone, PartialEq, Eq)]
#[error("source unavailable on call {call}")]
pub struct SourceDown {
    pub call: usize,
}

/// In-memory table that records every `(page_size, offset)` it is asked
/// for and can be told to fail on a given call (1-based).
#[derive(Clone)]
pub struct Table {
    rows: Arc<Vec<u32>>,
    calls: Arc<Mutex<Vec<(u64, u64)>>>,
    fail_on: Option<usize>,
}

impl Table {
    pub fn with_rows(n: u32) -> Self {
        Table {
            rows: Arc::new((0..n).collect()),
            calls: Arc::new(Mutex::new(Vec::new())),
            fail_on: None,
        }
    }

    pub fn failing_on(mut self, call: usize) -> Self {
        self.fail_on = Some(call);
        self
    }

    pub fn calls(&self) -> Vec<(u64, u64)> {
        self.calls.lock().unwrap().clone()
    }

    pub fn offsets(&self) -> Vec<u64> {
        self.calls().into_iter().map(|(_, offset)| offset).collect()
    }

    fn read(&self, page_size: u64, offset: u64) -> Result<Vec<u32>, SourceDown> {
        let call = {
            let mut calls = self.calls.lock().unwrap();
            calls.push((page_size, offset));
            calls.len()
        };

        if self.fail_on == Some(call) {
            return Err(SourceDown { call });
        }

        let start = (offset as usize).min(self.rows.len());
        let end = start.saturating_add(page_size as usize).min(self.rows.len());
        Ok(self.rows[start..end].to_vec())
    }
}

impl PageFetcher for Table {
    type Row = u32;
    type Error = SourceDown;

    fn fetch_page(&mut self, page_size: u64, offset: u64) -> Result<Vec<u32>, SourceDown> {
        self.read(page_size, offset)
    }
}

#[async_trait]
impl AsyncPageFetcher for Table {
    type Row = u32;
    type Error = SourceDown;

    async fn fetch_page(&self, page_size: u64, offset: u64) -> Result<Vec<u32>, SourceDown> {
        tokio::task::yield_now().await;
        self.read(page_size, offset)
    }
}
