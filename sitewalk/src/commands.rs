use clap::{arg, command};
use std::net::SocketAddr;
use std::path::PathBuf;

pub const CLAP_STYLING: clap::builder::styling::Styles = clap::builder::styling::Styles::styled()
    .header(clap_cargo::style::HEADER)
    .usage(clap_cargo::style::USAGE)
    .literal(clap_cargo::style::LITERAL)
    .placeholder(clap_cargo::style::PLACEHOLDER)
    .error(clap_cargo::style::ERROR)
    .valid(clap_cargo::style::VALID)
    .invalid(clap_cargo::style::INVALID);

pub fn command_argument_builder() -> clap::Command {
    clap::Command::new("sitewalk")
        .version(env!("CARGO_PKG_VERSION"))
        .bin_name("sitewalk")
        .styles(CLAP_STYLING)
        .arg(
            arg!(-q --"quiet" "Suppress banner and progress output")
                .required(false)
                .global(true),
        )
        .subcommand_required(false)
        .subcommand(
            command!("crawl")
                .about(
                    "Crawl every page on the seed's host and port, then write status reports \
                and optionally a sitemap.",
                )
                .arg(
                    arg!(-u --"url" <URL>)
                        .required(true)
                        .help("The seed URL to crawl"),
                )
                .arg(
                    arg!(-t --"threads" <MAX_CONCURRENT>)
                        .required(false)
                        .help("Maximum number of fetches in flight (default: 10)")
                        .value_parser(clap::value_parser!(usize)),
                )
                .arg(
                    arg!(--"timeout" <SECONDS>)
                        .required(false)
                        .help("Per-request timeout in seconds (default: 10)")
                        .value_parser(clap::value_parser!(u64)),
                )
                .arg(
                    arg!(-f --"format" <FORMAT>)
                        .required(false)
                        .help("Status report format: csv, json, markdown (default: csv)")
                        .value_parser(["csv", "json", "markdown", "md"]),
                )
                .arg(
                    arg!(-o --"output" <PREFIX>)
                        .required(false)
                        .help("Prefix for the status report files (default: crawler_report)"),
                )
                .arg(
                    arg!(--"sitemap")
                        .required(false)
                        .help("Also write a Markdown sitemap (sitemap_report.md)")
                        .action(clap::ArgAction::SetTrue),
                )
                .arg(
                    arg!(--"markdown")
                        .required(false)
                        .help("Also write a Markdown status table (crawler_report.md)")
                        .action(clap::ArgAction::SetTrue),
                ),
        )
        .subcommand(
            command!("serve")
                .about("Run the crawl agent: skill relay, crawl tool and result files over HTTP")
                .arg(
                    arg!(-b --"bind" <ADDR>)
                        .required(false)
                        .help("Address to listen on")
                        .value_parser(clap::value_parser!(SocketAddr))
                        .default_value("0.0.0.0:9000"),
                )
                .arg(
                    arg!(-r --"results-dir" <PATH>)
                        .required(false)
                        .help("Directory for report files")
                        .value_parser(clap::value_parser!(PathBuf))
                        .default_value("results"),
                )
                .arg(
                    arg!(--"interval" <SECONDS>)
                        .required(false)
                        .help("Default interval for periodic crawls")
                        .value_parser(clap::value_parser!(u64).range(1..))
                        .default_value("3600"),
                )
                .arg(
                    arg!(-t --"threads" <MAX_CONCURRENT>)
                        .required(false)
                        .help("Default concurrency for periodic crawls")
                        .value_parser(clap::value_parser!(usize))
                        .default_value("10"),
                ),
        )
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_command_is_well_formed() {
        command_argument_builder().debug_assert();
    }

    #[test]
    fn test_crawl_args() {
        let matches = command_argument_builder()
            .try_get_matches_from([
                "sitewalk", "crawl", "-u", "https://a.test/", "-t", "4", "-f", "json", "--sitemap",
            ])
            .unwrap();
        let (name, crawl) = matches.subcommand().unwrap();
        assert_eq!(name, "crawl");
        assert_eq!(crawl.get_one::<String>("url").unwrap(), "https://a.test/");
        assert_eq!(*crawl.get_one::<usize>("threads").unwrap(), 4);
        assert_eq!(crawl.get_one::<String>("format").unwrap(), "json");
        assert!(crawl.get_flag("sitemap"));
        assert!(!crawl.get_flag("markdown"));
        assert!(crawl.get_one::<String>("output").is_none());
    }

    #[test]
    fn test_crawl_requires_url() {
        assert!(
            command_argument_builder()
                .try_get_matches_from(["sitewalk", "crawl"])
                .is_err()
        );
    }

    #[test]
    fn test_serve_defaults() {
        let matches = command_argument_builder()
            .try_get_matches_from(["sitewalk", "-q", "serve"])
            .unwrap();
        assert!(matches.get_flag("quiet"));
        let serve = matches.subcommand_matches("serve").unwrap();
        assert_eq!(
            *serve.get_one::<SocketAddr>("bind").unwrap(),
            SocketAddr::from(([0, 0, 0, 0], 9000))
        );
        assert_eq!(*serve.get_one::<u64>("interval").unwrap(), 3600);
    }
}
