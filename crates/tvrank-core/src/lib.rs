pub mod aggregate;
pub mod app_config;
pub mod config;
pub mod error;
pub mod sources;
pub mod types;

pub use aggregate::aggregate;
pub use app_config::{AirtableConfig, AppConfig, GitHubConfig, HttpConfig, PublisherConfig};
pub use config::{load_app_config, load_app_config_from_env, load_sources_path};
pub use error::ConfigError;
pub use sources::{infer_service_name, load_sources, parse_sources};
pub use types::{
    PublishTarget, RecordFragment, ResultSet, SourceDescriptor, SourceFragments, SourceGroup,
    TableVariant, ViewershipRecord,
};
