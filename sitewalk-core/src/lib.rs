use colored::Colorize;

pub mod agent;
pub mod config;
pub mod crawl;
pub mod error;
pub mod files;
pub mod relay;
pub mod report;
pub mod schedule;
pub mod sitemap;

pub use error::{CoreError, Result};

pub fn print_banner() {
    println!(
        "{} {}",
        "sitewalk".bright_cyan().bold(),
        env!("CARGO_PKG_VERSION").bright_black()
    );
    println!("{}", "same-domain crawler, status reports and sitemaps".bright_black());
    println!();
}
