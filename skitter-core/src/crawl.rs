use indicatif::{ProgressBar, ProgressStyle};
use skitter_scanner::{
    CrawlResult, Crawler, DEMO_SEED, Fetcher, HttpFetcher, LinkScope, ResultCallback,
    StaticFetcher,
};
use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::time::Duration;
use tracing::warn;
use url::Url;

/// Options for configuring a crawl operation
pub struct CrawlOptions {
    pub urls: Vec<String>,
    pub max_depth: i64,
    /// Fetches allowed in flight at once; 0 for no limit.
    pub max_concurrency: usize,
    pub source: FetchSource,
    pub show_progress_bars: bool,
}

impl Default for CrawlOptions {
    fn default() -> Self {
        Self {
            urls: Vec::new(),
            max_depth: skitter_scanner::crawler::DEFAULT_MAX_DEPTH,
            max_concurrency: 0,
            source: FetchSource::Http {
                timeout_secs: 10,
                scope: ScopeMode::SameHost,
            },
            show_progress_bars: false,
        }
    }
}

/// Where page content comes from
pub enum FetchSource {
    /// Live HTTP requests
    Http { timeout_secs: u64, scope: ScopeMode },
    /// The built-in golang.org sample graph, no network access
    Demo,
}

/// Which links discovered over HTTP are followed
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ScopeMode {
    /// Stay on the seed's host and its subdomains
    SameHost,
    /// Follow every http(s) link
    Any,
    /// Follow links starting with the given prefix
    Prefix(String),
}

impl ScopeMode {
    pub fn from_str(s: &str) -> Self {
        match s {
            "same-host" => ScopeMode::SameHost,
            "any" => ScopeMode::Any,
            prefix => ScopeMode::Prefix(prefix.to_string()),
        }
    }

    fn for_seed(&self, seed: &str) -> Result<LinkScope, String> {
        match self {
            ScopeMode::SameHost => LinkScope::same_host_as(seed).map_err(|e| e.to_string()),
            ScopeMode::Any => Ok(LinkScope::Any),
            ScopeMode::Prefix(prefix) => Ok(LinkScope::Prefix(prefix.clone())),
        }
    }
}

/// Callback for reporting crawl progress
pub type CrawlProgressCallback = Arc<dyn Fn(String) + Send + Sync>;

/// Extract the path component from a URL
pub fn extract_url_path(url: &str) -> String {
    Url::parse(url)
        .ok()
        .map(|u| {
            let path = u.path().to_string();
            if path.is_empty() || path == "/" {
                "/".to_string()
            } else {
                path
            }
        })
        .unwrap_or_else(|| url.to_string())
}

/// Seeds to crawl for `options`: the demo seed when crawling the sample
/// graph without explicit seeds.
pub fn seeds_for(options: &CrawlOptions) -> Vec<String> {
    match options.source {
        FetchSource::Demo if options.urls.is_empty() => vec![DEMO_SEED.to_string()],
        _ => options.urls.clone(),
    }
}

/// Execute a crawl with the given options
/// Returns the crawl results of every seed, seed by seed
pub async fn execute_crawl(
    options: CrawlOptions,
    progress_callback: Option<CrawlProgressCallback>,
    result_callback: Option<ResultCallback>,
) -> Result<Vec<CrawlResult>, String> {
    let seeds = seeds_for(&options);
    if seeds.is_empty() {
        return Err("No seed URLs to crawl".to_string());
    }

    // Set up single progress bar for overall crawl progress (only if enabled)
    let progress_bar = if options.show_progress_bars {
        let pb = ProgressBar::new_spinner();
        let style = ProgressStyle::default_spinner()
            .template("{spinner:.cyan} {msg}")
            .map_err(|e| e.to_string())?;
        pb.set_style(style);
        pb.enable_steady_tick(Duration::from_millis(100));
        pb.set_message("Starting crawl...");
        Some(pb)
    } else {
        None
    };

    let found_count = Arc::new(AtomicUsize::new(0));
    let per_result: ResultCallback = {
        let pb = progress_bar.clone();
        let count = found_count.clone();
        Arc::new(move |result: &CrawlResult| {
            let found = count.fetch_add(1, Ordering::Relaxed) + 1;
            if let Some(ref pb) = pb {
                pb.set_message(format!("Crawling... {} pages found", found));
            }
            if let Some(ref callback) = result_callback {
                callback(result);
            }
        })
    };

    let mut all_results = Vec::new();
    for (idx, seed) in seeds.iter().enumerate() {
        if let Some(ref callback) = progress_callback
            && seeds.len() > 1
        {
            callback(format!("Crawling host {}/{}: {}", idx + 1, seeds.len(), seed));
        }

        let outcome = match options.source {
            FetchSource::Demo => {
                crawl_seed(StaticFetcher::demo(), &options, seed, per_result.clone()).await
            }
            FetchSource::Http {
                timeout_secs,
                ref scope,
            } => match scope
                .for_seed(seed)
                .and_then(|scope| HttpFetcher::new(timeout_secs, scope).map_err(|e| e.to_string()))
            {
                Ok(fetcher) => crawl_seed(fetcher, &options, seed, per_result.clone()).await,
                Err(e) => Err(e),
            },
        };

        match outcome {
            Ok(results) => all_results.extend(results),
            Err(e) => {
                warn!("Failed to crawl {}: {}", seed, e);
                if let Some(ref callback) = progress_callback {
                    callback(format!("[!]  Failed to crawl {}: {}", seed, e));
                }
            }
        }
    }

    if let Some(ref pb) = progress_bar {
        let total = found_count.load(Ordering::Relaxed);
        pb.finish_with_message(format!("Crawl complete! {} pages found", total));
    }

    Ok(all_results)
}

async fn crawl_seed<F: Fetcher>(
    fetcher: F,
    options: &CrawlOptions,
    seed: &str,
    result_callback: ResultCallback,
) -> Result<Vec<CrawlResult>, String> {
    Crawler::new(fetcher)
        .with_max_depth(options.max_depth)
        .with_max_concurrency(options.max_concurrency)
        .with_result_callback(result_callback)
        .crawl(seed)
        .await
        .map_err(|e| e.to_string())
}
