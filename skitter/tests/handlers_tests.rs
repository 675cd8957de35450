use skitter::commands::command_argument_builder;
use skitter::handlers::*;
use skitter::{FetchSource, ReportFormat, ScopeMode};
use std::io::Write;
use std::path::PathBuf;
use tempfile::NamedTempFile;
use url::Url;

fn crawl_request(args: &[&str]) -> Result<CrawlRequest, String> {
    let matches = command_argument_builder()
        .try_get_matches_from(args)
        .map_err(|e| e.to_string())?;
    let quiet = matches.get_flag("quiet");
    let (_, sub_matches) = matches.subcommand().ok_or("no subcommand")?;
    crawl_request_from_args(sub_matches, quiet)
}

#[test]
fn test_parse_url_line_with_scheme() {
    let result = parse_url_line("https://example.com");
    assert_eq!(result, Some("https://example.com".to_string()));
}

#[test]
fn test_parse_url_line_without_scheme() {
    assert_eq!(parse_url_line("example.com"), Some("http://example.com".to_string()));
    assert_eq!(
        parse_url_line("localhost:8080"),
        Some("http://localhost:8080".to_string())
    );
}

#[test]
fn test_parse_url_line_invalid() {
    let result = parse_url_line("not a valid url!!!");
    assert_eq!(result, None);
}

#[test]
fn test_load_urls_from_file() -> Result<(), Box<dyn std::error::Error>> {
    let mut temp_file = NamedTempFile::new()?;
    writeln!(temp_file, "https://example.com")?;
    writeln!(temp_file, "golang.org")?;
    writeln!(temp_file)?; // Empty line
    writeln!(temp_file, "# a comment")?;
    writeln!(temp_file, "  https://api.example.com  ")?;

    let path = PathBuf::from(temp_file.path());
    let urls = load_urls_from_file(&path)?;

    assert_eq!(
        urls,
        vec![
            "https://example.com",
            "http://golang.org",
            "https://api.example.com",
        ]
    );

    Ok(())
}

#[test]
fn test_load_urls_from_file_empty() {
    let mut temp_file = NamedTempFile::new().unwrap();
    writeln!(temp_file).unwrap();
    writeln!(temp_file, "   ").unwrap();

    let result = load_urls_from_file(temp_file.path());

    assert!(result.is_err());
    assert!(result.unwrap_err().contains("No valid URLs"));
}

#[test]
fn test_load_urls_from_missing_file() {
    let result = load_urls_from_file(&PathBuf::from("/definitely/not/here.txt"));
    assert!(result.unwrap_err().contains("Failed to read hosts file"));
}

#[test]
fn test_load_urls_from_source_single_url() {
    let url = Url::parse("https://example.com").unwrap();
    let result = load_urls_from_source(Some(&url), None).unwrap();

    assert_eq!(result, vec!["https://example.com/"]);
}

#[test]
fn test_load_urls_from_source_no_input() {
    let result = load_urls_from_source(None, None);
    assert!(
        result
            .unwrap_err()
            .contains("Either --url, --hosts-file or --demo must be provided")
    );
}

// ============================================================================
// Argument handling
// ============================================================================

#[test]
fn test_crawl_defaults() {
    let request = crawl_request(&["skitter", "crawl", "-u", "https://example.com"]).unwrap();

    assert_eq!(request.options.urls, vec!["https://example.com/"]);
    assert_eq!(request.options.max_depth, 4);
    assert_eq!(request.options.max_concurrency, 0);
    assert_eq!(request.format, ReportFormat::Found);
    assert!(request.output.is_none());
    assert!(request.streams_results());
    assert!(!request.options.show_progress_bars);
    assert!(matches!(
        request.options.source,
        FetchSource::Http {
            timeout_secs: 10,
            scope: ScopeMode::SameHost
        }
    ));
}

#[test]
fn test_crawl_demo_needs_no_url() {
    let request = crawl_request(&["skitter", "crawl", "--demo", "-d", "2"]).unwrap();

    assert!(request.options.urls.is_empty());
    assert_eq!(request.options.max_depth, 2);
    assert!(matches!(request.options.source, FetchSource::Demo));
}

#[test]
fn test_crawl_negative_depth_is_accepted() {
    let request = crawl_request(&["skitter", "crawl", "--demo", "--depth", "-1"]).unwrap();
    assert_eq!(request.options.max_depth, -1);
}

#[test]
fn test_crawl_without_seed_fails() {
    let err = crawl_request(&["skitter", "crawl"]).err().unwrap();
    assert!(err.contains("must be provided"));
}

#[test]
fn test_crawl_report_to_file_shows_progress() {
    let request = crawl_request(&[
        "skitter",
        "crawl",
        "-u",
        "https://example.com",
        "-f",
        "json",
        "-o",
        "/tmp/skitter-report.json",
        "-c",
        "8",
        "-s",
        "https://example.com/docs",
        "--timeout",
        "3",
    ])
    .unwrap();

    assert_eq!(request.format, ReportFormat::Json);
    assert_eq!(request.output, Some(PathBuf::from("/tmp/skitter-report.json")));
    assert_eq!(request.options.max_concurrency, 8);
    assert!(!request.streams_results());
    assert!(request.options.show_progress_bars);
    match request.options.source {
        FetchSource::Http {
            timeout_secs,
            scope,
        } => {
            assert_eq!(timeout_secs, 3);
            assert_eq!(scope, ScopeMode::Prefix("https://example.com/docs".to_string()));
        }
        FetchSource::Demo => panic!("expected an HTTP source"),
    }
}

#[test]
fn test_quiet_hides_progress() {
    let request =
        crawl_request(&["skitter", "-q", "crawl", "--demo", "-f", "text"]).unwrap();
    assert!(request.quiet);
    assert!(!request.options.show_progress_bars);
}

#[test]
fn test_url_conflicts_with_hosts_file() {
    let result = crawl_request(&[
        "skitter",
        "crawl",
        "-u",
        "https://example.com",
        "-H",
        "hosts.txt",
    ]);
    assert!(result.is_err());
}
