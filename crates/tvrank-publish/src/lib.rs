pub mod airtable;
pub mod error;
pub mod github;
pub mod publisher;
pub mod shape;
pub mod workbook;

use std::sync::Arc;

use tvrank_core::PublisherConfig;
use tvrank_scraper::Transport;

pub use airtable::AirtablePublisher;
pub use error::PublishError;
pub use github::{GitHubPublisher, Lookup};
pub use publisher::{PublishReceipt, Publisher};
pub use workbook::build_workbook;

/// Builds the publisher selected by `TVRANK_PUBLISHER`.
#[must_use]
pub fn build_publisher<T>(config: &PublisherConfig, transport: Arc<T>) -> Box<dyn Publisher>
where
    T: Transport + ?Sized + 'static,
{
    match config {
        PublisherConfig::GitHub(gh) => Box::new(GitHubPublisher::new(transport, gh.clone())),
        PublisherConfig::Airtable(at) => Box::new(AirtablePublisher::new(transport, at.clone())),
    }
}
