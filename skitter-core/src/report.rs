// Report generation from crawl results

use crate::crawl::extract_url_path;
use serde::{Deserialize, Serialize};
use skitter_scanner::CrawlResult;
use std::fs::File;
use std::io::Write;
use std::path::Path;
use url::Url;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ReportFormat {
    Text,
    Json,
    /// One `found: <url> "<body>"` line per page, in crawl order
    Found,
}

impl ReportFormat {
    pub fn from_str(s: &str) -> Option<Self> {
        match s.to_lowercase().as_str() {
            "text" => Some(ReportFormat::Text),
            "json" => Some(ReportFormat::Json),
            "found" | "lines" => Some(ReportFormat::Found),
            _ => None,
        }
    }
}

pub fn generate_crawl_report(results: &[CrawlResult], format: ReportFormat) -> Result<String, String> {
    match format {
        ReportFormat::Text => Ok(generate_text_report(results)),
        ReportFormat::Json => generate_json_report(results).map_err(|e| e.to_string()),
        ReportFormat::Found => Ok(results.iter().map(|r| format_found_line(r) + "\n").collect()),
    }
}

pub fn format_found_line(result: &CrawlResult) -> String {
    format!("found: {} {:?}", result.url, result.body)
}

pub fn generate_text_report(results: &[CrawlResult]) -> String {
    let mut report = String::new();
    report.push_str("━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━\n\n");
    report.push_str("# Summary:\n");
    report.push_str(&format!("  Pages crawled: {}\n", results.len()));

    let total_bytes: usize = results.iter().map(|r| r.body.len()).sum();
    report.push_str(&format!("  Total content: {} bytes\n", total_bytes));

    report.push_str("\n━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━\n\n");

    // Hosts in order of first appearance
    let mut by_host: Vec<(String, Vec<&CrawlResult>)> = Vec::new();
    for result in results {
        let host = Url::parse(&result.url)
            .ok()
            .and_then(|u| u.host_str().map(str::to_string))
            .unwrap_or_else(|| "(no host)".to_string());

        match by_host.iter_mut().find(|(h, _)| *h == host) {
            Some((_, pages)) => pages.push(result),
            None => by_host.push((host, vec![result])),
        }
    }

    for (host, host_results) in &by_host {
        report.push_str(&format!("## {}\n", host));
        report.push_str(&format!("  {} pages found\n\n", host_results.len()));

        for result in host_results {
            report.push_str(&format!(
                "  {} ({} bytes)\n",
                extract_url_path(&result.url),
                result.body.len()
            ));
        }
        report.push('\n');
    }

    report
}

pub fn generate_json_report(results: &[CrawlResult]) -> Result<String, serde_json::Error> {
    let json_report = serde_json::json!({
        "report": {
            "metadata": {
                "generator": "Skitter",
                "version": env!("CARGO_PKG_VERSION"),
                "generated_at": chrono::Utc::now().to_rfc3339(),
                "format": "json"
            },
            "summary": {
                "total_pages": results.len(),
                "total_bytes": results.iter().map(|r| r.body.len()).sum::<usize>()
            },
            "pages": results
        }
    });

    serde_json::to_string_pretty(&json_report)
}

pub fn save_report(content: &str, path: &Path) -> std::io::Result<()> {
    let mut file = File::create(path)?;
    file.write_all(content.as_bytes())?;
    Ok(())
}
