pub mod crawl;
pub mod report;

pub use crawl::{CrawlOptions, FetchSource, ScopeMode, execute_crawl};
pub use report::{ReportFormat, generate_crawl_report, save_report};
