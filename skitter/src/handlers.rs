use clap::ArgMatches;
use skitter_core::crawl::{CrawlOptions, FetchSource, ScopeMode};
use skitter_core::report::ReportFormat;
use std::fs;
use std::path::{Path, PathBuf};
use url::Url;

/// Everything `crawl` needs, pulled out of the parsed arguments
pub struct CrawlRequest {
    pub options: CrawlOptions,
    pub format: ReportFormat,
    pub output: Option<PathBuf>,
    pub quiet: bool,
}

impl CrawlRequest {
    /// Print `found:` lines as results arrive instead of after the crawl
    pub fn streams_results(&self) -> bool {
        self.format == ReportFormat::Found && self.output.is_none()
    }
}

/// Load URLs from either a file or a single URL argument
pub fn load_urls_from_source(
    url: Option<&Url>,
    hosts_file: Option<&PathBuf>,
) -> Result<Vec<String>, String> {
    if let Some(hosts_file_path) = hosts_file {
        load_urls_from_file(hosts_file_path)
    } else if let Some(url) = url {
        Ok(vec![url.as_str().to_string()])
    } else {
        Err("Either --url, --hosts-file or --demo must be provided".to_string())
    }
}

/// Load and parse URLs from a file
pub fn load_urls_from_file(path: &Path) -> Result<Vec<String>, String> {
    let content = fs::read_to_string(path)
        .map_err(|e| format!("Failed to read hosts file {}: {}", path.display(), e))?;

    let urls: Vec<String> = content
        .lines()
        .map(str::trim)
        .filter(|line| !line.is_empty() && !line.starts_with('#'))
        .filter_map(parse_url_line)
        .collect();

    if urls.is_empty() {
        return Err(format!("No valid URLs found in {}", path.display()));
    }

    Ok(urls)
}

/// Parse a single line as a URL, trying to add http:// if needed
pub fn parse_url_line(line: &str) -> Option<String> {
    if let Ok(url) = Url::parse(line)
        && url.has_host()
    {
        return Some(line.to_string());
    }

    let with_scheme = format!("http://{}", line);
    Url::parse(&with_scheme).ok().map(|_| with_scheme)
}

/// Build a crawl request from the `crawl` subcommand's arguments
pub fn crawl_request_from_args(sub_matches: &ArgMatches, quiet: bool) -> Result<CrawlRequest, String> {
    let demo = sub_matches.get_flag("demo");
    let url = sub_matches.get_one::<Url>("url");
    let hosts_file = sub_matches
        .get_one::<String>("hosts-file")
        .map(|p| PathBuf::from(shellexpand::tilde(p).as_ref()));

    let urls = if demo && url.is_none() && hosts_file.is_none() {
        Vec::new()
    } else {
        load_urls_from_source(url, hosts_file.as_ref())?
    };

    let source = if demo {
        FetchSource::Demo
    } else {
        let scope = sub_matches
            .get_one::<String>("scope")
            .map(|s| ScopeMode::from_str(s))
            .unwrap_or(ScopeMode::SameHost);
        FetchSource::Http {
            timeout_secs: *sub_matches.get_one::<u64>("timeout").unwrap_or(&10),
            scope,
        }
    };

    let format_name = sub_matches
        .get_one::<String>("format")
        .map(String::as_str)
        .unwrap_or("found");
    let format = ReportFormat::from_str(format_name)
        .ok_or_else(|| format!("Unknown report format: {}", format_name))?;

    let output = sub_matches
        .get_one::<String>("output")
        .map(|p| PathBuf::from(shellexpand::tilde(p).as_ref()));

    let mut request = CrawlRequest {
        options: CrawlOptions {
            urls,
            max_depth: *sub_matches.get_one::<i64>("depth").unwrap_or(&4),
            max_concurrency: *sub_matches.get_one::<usize>("max-concurrency").unwrap_or(&0),
            source,
            show_progress_bars: false,
        },
        format,
        output,
        quiet,
    };
    request.options.show_progress_bars = !quiet && !request.streams_results();

    Ok(request)
}
