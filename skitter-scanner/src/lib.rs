pub mod crawler;
pub mod error;
pub mod fetch;
pub mod http;
pub mod result;
pub mod traverse;
pub mod visited;

pub use crawler::{Crawler, ResultCallback};
pub use error::ScanError;
pub use fetch::{DEMO_SEED, Fetcher, Page, StaticFetcher};
pub use http::{HttpFetcher, LinkScope};
pub use result::CrawlResult;
pub use traverse::{Traversal, traverse};
pub use visited::VisitedSet;
