pub mod crawler;
pub mod error;
pub mod extract;
pub mod fetch;
pub mod result;

pub use crawler::{Crawler, ProgressCallback, RoundCallback, RoundProgress};
pub use error::ScanError;
pub use extract::Scope;
pub use fetch::{HttpFetcher, PageFetcher, PageReport};
pub use result::{CrawlOutput, FetchOutcome, LinkGraph, StatusMap};
