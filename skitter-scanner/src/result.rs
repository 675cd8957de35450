use serde::{Deserialize, Serialize};

/// A page that was claimed and fetched during a traversal.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CrawlResult {
    pub url: String,
    pub body: String,
}

impl CrawlResult {
    pub fn new(url: impl Into<String>, body: impl Into<String>) -> Self {
        Self {
            url: url.into(),
            body: body.into(),
        }
    }
}
