use crate::error::{Result, ScanError};
use crate::fetch::{Fetcher, Page};
use reqwest::Client;
use reqwest::header::CONTENT_TYPE;
use scraper::{Html, Selector};
use std::time::Duration;
use tracing::debug;
use url::Url;

const USER_AGENT: &str = concat!("Skitter/", env!("CARGO_PKG_VERSION"));

/// Which discovered links an [`HttpFetcher`] hands back to the traversal.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LinkScope {
    /// Every http(s) link.
    Any,
    /// Links on this host or one of its subdomains.
    SameHost(String),
    /// Links whose absolute form starts with this prefix.
    Prefix(String),
}

impl LinkScope {
    /// Restrict to the host of `url`.
    pub fn same_host_as(url: &str) -> Result<Self> {
        let parsed = Url::parse(url).map_err(|e| ScanError::InvalidUrl(format!("{}: {}", url, e)))?;
        let host = parsed
            .host_str()
            .ok_or_else(|| ScanError::InvalidUrl(format!("{} has no host", url)))?;
        Ok(LinkScope::SameHost(host.to_string()))
    }

    pub fn allows(&self, url: &str) -> bool {
        match self {
            LinkScope::Any => true,
            LinkScope::SameHost(base) => Url::parse(url)
                .ok()
                .and_then(|u| u.host_str().map(|h| h == base || h.ends_with(&format!(".{}", base))))
                .unwrap_or(false),
            LinkScope::Prefix(prefix) => url.starts_with(prefix.as_str()),
        }
    }
}

/// Fetches pages over HTTP and extracts their `<a href>` links.
#[derive(Debug, Clone)]
pub struct HttpFetcher {
    client: Client,
    scope: LinkScope,
}

impl HttpFetcher {
    pub fn new(timeout_secs: u64, scope: LinkScope) -> Result<Self> {
        let client = Client::builder()
            .user_agent(USER_AGENT)
            .timeout(Duration::from_secs(timeout_secs))
            .connect_timeout(Duration::from_secs(timeout_secs.div_ceil(2)))
            .pool_max_idle_per_host(50)
            .redirect(reqwest::redirect::Policy::limited(5))
            .build()?;

        Ok(Self { client, scope })
    }
}

impl Fetcher for HttpFetcher {
    async fn fetch(&self, url: &str) -> Result<Page> {
        debug!("Visiting {}", url);

        let response = self.client.get(url).send().await?;
        let status = response.status();
        if !status.is_success() {
            return Err(ScanError::HttpStatus {
                url: url.to_string(),
                status: status.as_u16(),
            });
        }

        let is_html = response
            .headers()
            .get(CONTENT_TYPE)
            .and_then(|v| v.to_str().ok())
            .map(|ct| ct.contains("text/html"))
            .unwrap_or(false);

        let body = response.text().await?;
        let links = if is_html {
            extract_links(&body, url, &self.scope)
        } else {
            Vec::new()
        };

        Ok(Page { body, links })
    }
}

/// Absolute, in-scope link targets of `html`, in document order.
pub fn extract_links(html: &str, page_url: &str, scope: &LinkScope) -> Vec<String> {
    let Ok(selector) = Selector::parse("a[href]") else {
        return Vec::new();
    };
    let document = Html::parse_document(html);

    document
        .select(&selector)
        .filter_map(|element| element.value().attr("href"))
        .filter_map(|href| resolve_url(page_url, href))
        .filter(|absolute| {
            let allowed = scope.allows(absolute);
            if !allowed {
                debug!("  -> Out of scope, skipping {}", absolute);
            }
            allowed
        })
        .collect()
}

fn resolve_url(base: &str, href: &str) -> Option<String> {
    // Skip empty, javascript:, mailto:, tel:, etc.
    if href.is_empty()
        || href.starts_with("javascript:")
        || href.starts_with("mailto:")
        || href.starts_with("tel:")
        || href.starts_with('#')
    {
        return None;
    }

    let base_url = Url::parse(base).ok()?;
    let mut resolved = base_url.join(href).ok()?;
    if resolved.scheme() != "http" && resolved.scheme() != "https" {
        return None;
    }
    resolved.set_fragment(None);

    Some(resolved.to_string())
}
