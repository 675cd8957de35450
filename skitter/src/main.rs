use clap::ArgMatches;
use colored::Colorize;
use skitter::commands::command_argument_builder;
use skitter::handlers::{CrawlRequest, crawl_request_from_args};
use skitter_core::crawl::{CrawlProgressCallback, FetchSource, execute_crawl, seeds_for};
use skitter_core::report::{format_found_line, generate_crawl_report, save_report};
use skitter_scanner::{CrawlResult, ResultCallback};
use std::sync::Arc;
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() {
    let cmd = command_argument_builder();
    let chosen_command = cmd.get_matches();
    let quiet = chosen_command.get_flag("quiet");

    // Logs go to stderr so results on stdout stay pipeable
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn")),
        )
        .with_writer(std::io::stderr)
        .init();

    match chosen_command.subcommand() {
        Some(("crawl", primary_command)) => handle_crawl(primary_command, quiet).await,
        _ => unreachable!("clap should ensure we don't get here"),
    }
}

async fn handle_crawl(sub_matches: &ArgMatches, quiet: bool) {
    let request = match crawl_request_from_args(sub_matches, quiet) {
        Ok(request) => request,
        Err(e) => {
            eprintln!("{} {}", "✗".red().bold(), e);
            std::process::exit(1);
        }
    };

    if !quiet {
        print_crawl_configuration(&request);
    }

    let progress_callback: CrawlProgressCallback = Arc::new(move |msg: String| {
        if !quiet {
            eprintln!("{}", msg);
        }
    });

    // Found lines are printed the moment a page arrives
    let streamed = request.streams_results();
    let result_callback: Option<ResultCallback> = if streamed {
        Some(Arc::new(|result: &CrawlResult| {
            println!("{}", format_found_line(result));
        }))
    } else {
        None
    };

    let CrawlRequest {
        options,
        format,
        output,
        ..
    } = request;

    let all_results = match execute_crawl(options, Some(progress_callback), result_callback).await {
        Ok(results) => results,
        Err(e) => {
            eprintln!("{} Crawl failed: {}", "✗".red().bold(), e);
            std::process::exit(1);
        }
    };

    if !quiet {
        eprintln!(
            "\n{} Crawl complete! {} page(s) found\n",
            "✓".green().bold(),
            all_results.len().to_string().cyan()
        );
    }

    if streamed {
        return;
    }

    let report = match generate_crawl_report(&all_results, format) {
        Ok(report) => report,
        Err(e) => {
            eprintln!("{} Failed to generate report: {}", "✗".red().bold(), e);
            std::process::exit(1);
        }
    };

    match output {
        Some(path) => {
            if let Err(e) = save_report(&report, &path) {
                eprintln!(
                    "{} Failed to save report to {}: {}",
                    "✗".red().bold(),
                    path.display(),
                    e
                );
                std::process::exit(1);
            }
            if !quiet {
                eprintln!(
                    "{} Report saved: {}",
                    "✓".green().bold(),
                    path.display().to_string().bright_white()
                );
            }
        }
        None => print!("{}", report),
    }
}

fn print_crawl_configuration(request: &CrawlRequest) {
    let options = &request.options;
    let seeds = seeds_for(options);

    eprintln!("\n🕷️  Crawling {} host(s)", seeds.len());
    eprintln!("Max depth: {}", options.max_depth);
    if options.max_concurrency == 0 {
        eprintln!("Fetch concurrency: unlimited");
    } else {
        eprintln!("Fetch concurrency: {}", options.max_concurrency);
    }
    let source = match &options.source {
        FetchSource::Demo => "demo (built-in golang.org sample)".to_string(),
        FetchSource::Http {
            timeout_secs,
            scope,
        } => format!("http (timeout {}s, scope {:?})", timeout_secs, scope),
    };
    eprintln!("Source: {}\n", source);
}
