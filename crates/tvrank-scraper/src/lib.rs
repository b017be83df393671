pub mod client;
pub mod error;
pub mod extract;
pub mod normalize;
mod retry;
pub mod scrape;
pub mod transport;

pub use client::HttpClient;
pub use error::{ExtractionGap, TransportError};
pub use extract::{extract_table, RawRow};
pub use normalize::{normalize_row, parse_count, parse_rank};
pub use scrape::{scrape_source, SourceScrape};
pub use transport::{HttpRequest, HttpResponse, Transport};
