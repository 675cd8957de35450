use crate::fetch::Fetcher;
use crate::result::CrawlResult;
use crate::visited::VisitedSet;
use futures::Stream;
use futures::future::{BoxFuture, FutureExt};
use std::pin::Pin;
use std::sync::Arc;
use std::task::{Context, Poll};
use tokio::sync::{Semaphore, mpsc};
use tracing::{debug, trace, warn};

// A branch can run one result ahead of its parent before it suspends.
const BRANCH_BUFFER: usize = 1;

/// The output of one branch and, transitively, of all its descendants.
///
/// The stream closes once every result of the subtree has been forwarded;
/// there is no other completion signal. Dropping it abandons the subtree:
/// branches stop forwarding and expanding as soon as they notice.
#[derive(Debug)]
pub struct Traversal {
    rx: mpsc::Receiver<CrawlResult>,
}

impl Traversal {
    fn closed() -> Self {
        let (_, rx) = mpsc::channel(1);
        Self { rx }
    }

    pub async fn recv(&mut self) -> Option<CrawlResult> {
        self.rx.recv().await
    }

    /// Drain the stream to completion.
    pub async fn collect_all(mut self) -> Vec<CrawlResult> {
        let mut results = Vec::new();
        while let Some(result) = self.rx.recv().await {
            results.push(result);
        }
        results
    }
}

impl Stream for Traversal {
    type Item = CrawlResult;

    fn poll_next(mut self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<Option<Self::Item>> {
        self.rx.poll_recv(cx)
    }
}

/// Crawl from `url`, following links up to `depth` hops.
///
/// A depth of 1 fetches only `url`; zero or less fetches nothing. Every
/// address is fetched at most once per `visited`, no matter how many pages
/// link to it. Must be called from within a tokio runtime.
pub fn traverse<F: Fetcher>(
    url: impl Into<String>,
    depth: i64,
    fetcher: Arc<F>,
    visited: Arc<VisitedSet>,
) -> Traversal {
    Branches::new(fetcher, visited, None).spawn(url.into(), depth)
}

/// State shared by every branch of one traversal.
pub(crate) struct Branches<F> {
    fetcher: Arc<F>,
    visited: Arc<VisitedSet>,
    fetch_limit: Option<Arc<Semaphore>>,
}

impl<F> Clone for Branches<F> {
    fn clone(&self) -> Self {
        Self {
            fetcher: self.fetcher.clone(),
            visited: self.visited.clone(),
            fetch_limit: self.fetch_limit.clone(),
        }
    }
}

impl<F: Fetcher> Branches<F> {
    pub(crate) fn new(
        fetcher: Arc<F>,
        visited: Arc<VisitedSet>,
        fetch_limit: Option<Arc<Semaphore>>,
    ) -> Self {
        Self {
            fetcher,
            visited,
            fetch_limit,
        }
    }

    /// Claim `url` and start a branch for it. Branches that run out of depth
    /// or lose the claim get an already-closed stream and no task.
    pub(crate) fn spawn(&self, url: String, depth: i64) -> Traversal {
        if depth <= 0 {
            trace!("Depth exhausted at {}", url);
            return Traversal::closed();
        }
        if !self.visited.try_claim(&url) {
            trace!("Already claimed: {}", url);
            return Traversal::closed();
        }

        let (tx, rx) = mpsc::channel(BRANCH_BUFFER);
        tokio::spawn(self.clone().explore(url, depth, tx));
        Traversal { rx }
    }

    fn explore(
        self,
        url: String,
        depth: i64,
        tx: mpsc::Sender<CrawlResult>,
    ) -> BoxFuture<'static, ()> {
        async move {
            let fetched = {
                // Held for the fetch only, never while draining children.
                let _permit = match &self.fetch_limit {
                    Some(limit) => match limit.acquire().await {
                        Ok(permit) => Some(permit),
                        Err(_) => {
                            debug!("Fetch limiter closed, fetching {} uncapped", url);
                            None
                        }
                    },
                    None => None,
                };
                self.fetcher.fetch(&url).await
            };

            let page = match fetched {
                Ok(page) => page,
                Err(e) => {
                    warn!("Fetch failed for {}: {}", url, e);
                    return;
                }
            };

            if tx.is_closed() {
                debug!("Receiver for {} went away, not expanding", url);
                return;
            }

            let links = page.links;
            if tx.send(CrawlResult::new(url.clone(), page.body)).await.is_err() {
                return;
            }

            debug!("Expanding {} ({} links, depth {})", url, links.len(), depth);
            let children: Vec<Traversal> = links
                .into_iter()
                .map(|link| self.spawn(link, depth - 1))
                .collect();

            // Siblings are forwarded as contiguous blocks, in spawn order.
            for mut child in children {
                while let Some(result) = child.recv().await {
                    if tx.send(result).await.is_err() {
                        debug!("Receiver for {} went away, abandoning subtree", url);
                        return;
                    }
                }
            }
        }
        .boxed()
    }
}
