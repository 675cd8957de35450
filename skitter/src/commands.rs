use clap::{arg, command};
use url::Url;

pub const CLAP_STYLING: clap::builder::styling::Styles = clap::builder::styling::Styles::styled()
    .header(clap_cargo::style::HEADER)
    .usage(clap_cargo::style::USAGE)
    .literal(clap_cargo::style::LITERAL)
    .placeholder(clap_cargo::style::PLACEHOLDER)
    .error(clap_cargo::style::ERROR)
    .valid(clap_cargo::style::VALID)
    .invalid(clap_cargo::style::INVALID);

pub fn command_argument_builder() -> clap::Command {
    clap::Command::new("skitter")
        .version(env!("CARGO_PKG_VERSION"))
        .bin_name("skitter")
        .styles(CLAP_STYLING)
        .arg(arg!(-q --"quiet" "Suppress progress and non-essential output").required(false))
        .subcommand_required(true)
        .subcommand(
            command!("crawl")
                .about(
                    "Crawl a host or collection of hosts up to a fixed link depth, fetching \
                every page at most once.",
                )
                .arg(
                    arg!(-u --"url" <URL>)
                        .required(false)
                        .help("The URL to crawl")
                        .value_parser(clap::value_parser!(Url))
                        .conflicts_with("hosts-file"),
                )
                .arg(
                    arg!(-H --"hosts-file" <PATH>)
                        .required(false)
                        .help("Path to a newline-delimited file of URLs to crawl")
                        .conflicts_with("url"),
                )
                .arg(
                    arg!(--"demo")
                        .required(false)
                        .help("Crawl a built-in sample of golang.org without touching the network")
                        .action(clap::ArgAction::SetTrue),
                )
                .arg(
                    arg!(-d --"depth" <DEPTH>)
                        .required(false)
                        .help("Maximum link depth; 1 fetches only the seed")
                        .value_parser(clap::value_parser!(i64))
                        .allow_negative_numbers(true)
                        .default_value("4"),
                )
                .arg(
                    arg!(-c --"max-concurrency" <NUM>)
                        .required(false)
                        .help("Maximum fetches in flight at once (0 = unlimited)")
                        .value_parser(clap::value_parser!(usize))
                        .default_value("0"),
                )
                .arg(
                    arg!(--"timeout" <SECONDS>)
                        .required(false)
                        .help("Request timeout in seconds")
                        .value_parser(clap::value_parser!(u64))
                        .default_value("10"),
                )
                .arg(
                    arg!(-s --"scope" <SCOPE>)
                        .required(false)
                        .help("Links to follow: same-host, any, or a URL prefix")
                        .default_value("same-host"),
                )
                .arg(
                    arg!(-f --"format" <FORMAT>)
                        .required(false)
                        .help("Report format: found, text, json")
                        .value_parser(["found", "text", "json"])
                        .default_value("found"),
                )
                .arg(
                    arg!(-o --"output" <PATH>)
                        .required(false)
                        .help("Save report to file (default: display to screen)"),
                ),
        )
}
