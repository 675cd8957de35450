use crate::error::{Result, ScanError};
use crate::fetch::Fetcher;
use crate::result::CrawlResult;
use crate::traverse::{Branches, Traversal};
use crate::visited::VisitedSet;
use std::sync::Arc;
use tokio::sync::Semaphore;
use tracing::info;

pub type ResultCallback = Arc<dyn Fn(&CrawlResult) + Send + Sync>;

pub const DEFAULT_MAX_DEPTH: i64 = 4;

pub struct Crawler<F> {
    fetcher: Arc<F>,
    max_depth: i64,
    max_concurrency: usize,
    result_callback: Option<ResultCallback>,
}

impl<F: Fetcher> Crawler<F> {
    pub fn new(fetcher: F) -> Self {
        Self::from_shared(Arc::new(fetcher))
    }

    pub fn from_shared(fetcher: Arc<F>) -> Self {
        Self {
            fetcher,
            max_depth: DEFAULT_MAX_DEPTH,
            max_concurrency: 0,
            result_callback: None,
        }
    }

    pub fn with_max_depth(mut self, depth: i64) -> Self {
        self.max_depth = depth;
        self
    }

    /// Cap the number of fetches in flight at once. Zero means no cap.
    pub fn with_max_concurrency(mut self, max: usize) -> Self {
        self.max_concurrency = max;
        self
    }

    pub fn with_result_callback(mut self, callback: ResultCallback) -> Self {
        self.result_callback = Some(callback);
        self
    }

    /// Start a traversal from `seed` with a fresh visited set.
    pub fn stream(&self, seed: &str) -> Traversal {
        self.stream_with_visited(seed, Arc::new(VisitedSet::new()))
    }

    /// Start a traversal that claims addresses in `visited`.
    pub fn stream_with_visited(&self, seed: &str, visited: Arc<VisitedSet>) -> Traversal {
        let fetch_limit =
            (self.max_concurrency > 0).then(|| Arc::new(Semaphore::new(self.max_concurrency)));
        Branches::new(self.fetcher.clone(), visited, fetch_limit)
            .spawn(seed.to_string(), self.max_depth)
    }

    /// Crawl `seed` to completion and return every page found, in stream
    /// order.
    pub async fn crawl(&self, seed: &str) -> Result<Vec<CrawlResult>> {
        if seed.trim().is_empty() {
            return Err(ScanError::InvalidUrl("empty seed address".to_string()));
        }

        info!("Starting crawl of {} to depth {}", seed, self.max_depth);
        let mut traversal = self.stream(seed);

        let mut results = Vec::new();
        while let Some(result) = traversal.recv().await {
            if let Some(ref callback) = self.result_callback {
                callback(&result);
            }
            results.push(result);
        }

        info!("Crawl complete. Visited {} pages", results.len());
        Ok(results)
    }
}
