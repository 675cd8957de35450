use crate::error::{Result, ScanError};
use std::collections::HashMap;
use std::future::Future;
use tracing::debug;

/// Body and outgoing links of a fetched page.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Page {
    pub body: String,
    /// Links in document order. Duplicates are kept; the traversal dedups at
    /// claim time.
    pub links: Vec<String>,
}

impl Page {
    pub fn new<I, S>(body: impl Into<String>, links: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            body: body.into(),
            links: links.into_iter().map(Into::into).collect(),
        }
    }
}

/// Retrieves a page's content and links. Shared by every branch of a
/// traversal, so implementations must tolerate concurrent calls.
pub trait Fetcher: Send + Sync + 'static {
    fn fetch(&self, url: &str) -> impl Future<Output = Result<Page>> + Send;
}

/// Fetcher backed by a fixed in-memory link graph.
#[derive(Debug, Clone, Default)]
pub struct StaticFetcher {
    pages: HashMap<String, Page>,
}

impl StaticFetcher {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_page<I, S>(mut self, url: impl Into<String>, body: impl Into<String>, links: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.pages.insert(url.into(), Page::new(body, links));
        self
    }

    /// A small slice of golang.org. `http://golang.org/cmd/` is linked but
    /// missing, so crawling it exercises the fetch failure path.
    pub fn demo() -> Self {
        Self::new()
            .with_page(
                DEMO_SEED,
                "The Go Programming Language",
                ["http://golang.org/pkg/", "http://golang.org/cmd/"],
            )
            .with_page(
                "http://golang.org/pkg/",
                "Packages",
                [
                    "http://golang.org/",
                    "http://golang.org/cmd/",
                    "http://golang.org/pkg/fmt/",
                    "http://golang.org/pkg/os/",
                ],
            )
            .with_page(
                "http://golang.org/pkg/fmt/",
                "Package fmt",
                ["http://golang.org/", "http://golang.org/pkg/"],
            )
            .with_page(
                "http://golang.org/pkg/os/",
                "Package os",
                ["http://golang.org/", "http://golang.org/pkg/"],
            )
    }
}

/// Seed address of [`StaticFetcher::demo`].
pub const DEMO_SEED: &str = "http://golang.org/";

impl Fetcher for StaticFetcher {
    async fn fetch(&self, url: &str) -> Result<Page> {
        debug!("Looking up {}", url);
        self.pages
            .get(url)
            .cloned()
            .ok_or_else(|| ScanError::NotFound(url.to_string()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_static_fetcher_known_page() {
        let fetcher = StaticFetcher::new().with_page("a", "alpha", ["b", "c", "b"]);
        let page = fetcher.fetch("a").await.unwrap();
        assert_eq!(page.body, "alpha");
        assert_eq!(page.links, vec!["b", "c", "b"]);
    }

    #[tokio::test]
    async fn test_static_fetcher_unknown_page() {
        let fetcher = StaticFetcher::new();
        let err = fetcher.fetch("http://nowhere/").await.unwrap_err();
        assert!(matches!(err, ScanError::NotFound(_)));
        assert_eq!(err.to_string(), "not found: http://nowhere/");
    }

    #[tokio::test]
    async fn test_demo_graph_is_missing_cmd() {
        let fetcher = StaticFetcher::demo();
        assert!(fetcher.fetch(DEMO_SEED).await.is_ok());
        assert!(fetcher.fetch("http://golang.org/cmd/").await.is_err());
    }
}
