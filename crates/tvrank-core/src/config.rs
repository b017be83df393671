use std::path::PathBuf;

use crate::app_config::{AirtableConfig, AppConfig, GitHubConfig, HttpConfig, PublisherConfig};
use crate::ConfigError;

/// Reads `.env` (if present) into the process environment, then builds the
/// configuration from it.
///
/// # Errors
///
/// Returns [`ConfigError`] for a missing credential of the selected
/// publisher or an unparseable value.
pub fn load_app_config() -> Result<AppConfig, ConfigError> {
    dotenvy::dotenv().ok();
    load_app_config_from_env()
}

/// Builds the configuration from the current process environment only.
///
/// # Errors
///
/// Same as [`load_app_config`].
pub fn load_app_config_from_env() -> Result<AppConfig, ConfigError> {
    build_app_config(|key| std::env::var(key))
}

/// Path of the source groups file from `TVRANK_SOURCES_PATH`, reading
/// `.env` first. Needs no publisher credentials.
#[must_use]
pub fn load_sources_path() -> PathBuf {
    dotenvy::dotenv().ok();
    resolve_sources_path(|key| std::env::var(key))
}

fn resolve_sources_path<F>(lookup: F) -> PathBuf
where
    F: Fn(&str) -> Result<String, std::env::VarError>,
{
    lookup("TVRANK_SOURCES_PATH")
        .ok()
        .filter(|v| !v.trim().is_empty())
        .map_or_else(|| PathBuf::from(DEFAULT_SOURCES_PATH), PathBuf::from)
}

const DEFAULT_SOURCES_PATH: &str = "./config/sources.yaml";

/// Builds the configuration through `lookup`; blank values count as unset.
///
/// Tests pass a `HashMap`-backed lookup instead of touching the process
/// environment.
fn build_app_config<F>(lookup: F) -> Result<AppConfig, ConfigError>
where
    F: Fn(&str) -> Result<String, std::env::VarError>,
{
    let require = |var: &str| -> Result<String, ConfigError> {
        lookup(var)
            .ok()
            .filter(|v| !v.trim().is_empty())
            .ok_or_else(|| ConfigError::MissingEnvVar(var.to_string()))
    };

    let optional = |var: &str| -> Option<String> {
        lookup(var).ok().filter(|v| !v.trim().is_empty())
    };

    let or_default = |var: &str, default: &str| -> String {
        optional(var).unwrap_or_else(|| default.to_string())
    };

    let parse_u32 = |var: &str, default: &str| -> Result<u32, ConfigError> {
        let raw = or_default(var, default);
        raw.parse::<u32>().map_err(|e| ConfigError::InvalidEnvVar {
            var: var.to_string(),
            reason: e.to_string(),
        })
    };

    let parse_u64 = |var: &str, default: &str| -> Result<u64, ConfigError> {
        let raw = or_default(var, default);
        raw.parse::<u64>().map_err(|e| ConfigError::InvalidEnvVar {
            var: var.to_string(),
            reason: e.to_string(),
        })
    };

    let log_level = or_default("TVRANK_LOG_LEVEL", "info");
    let sources_path = resolve_sources_path(&lookup);

    let timeout_secs = parse_u64("TVRANK_HTTP_TIMEOUT_SECS", "30")?;
    if timeout_secs == 0 {
        return Err(ConfigError::InvalidEnvVar {
            var: "TVRANK_HTTP_TIMEOUT_SECS".to_string(),
            reason: "timeout must be at least 1 second".to_string(),
        });
    }

    let http = HttpConfig {
        timeout_secs,
        max_retries: parse_u32("TVRANK_HTTP_MAX_RETRIES", "5")?,
        backoff_base_ms: parse_u64("TVRANK_HTTP_BACKOFF_BASE_MS", "100")?,
        user_agent: or_default("TVRANK_HTTP_USER_AGENT", "tvrank/0.1 (viewership-rankings)"),
    };

    let publisher = match or_default("TVRANK_PUBLISHER", "github").as_str() {
        "github" => PublisherConfig::GitHub(GitHubConfig {
            token: require("GITHUB_TOKEN")?,
            owner: optional("TVRANK_GITHUB_OWNER"),
            repo: or_default("TVRANK_GITHUB_REPO", "Finnpanel-Scraper"),
            branch: optional("TVRANK_GITHUB_BRANCH"),
            dir: or_default("TVRANK_GITHUB_DIR", "")
                .trim_matches('/')
                .to_string(),
            api_url: or_default("TVRANK_GITHUB_API_URL", "https://api.github.com"),
        }),
        "airtable" => PublisherConfig::Airtable(AirtableConfig {
            api_key: require("AIRTABLE_API_KEY")?,
            base_id: require("TVRANK_AIRTABLE_BASE_ID")?,
            table: or_default("TVRANK_AIRTABLE_TABLE", "Finnpanel Views"),
            api_url: or_default("TVRANK_AIRTABLE_API_URL", "https://api.airtable.com"),
        }),
        other => {
            return Err(ConfigError::InvalidEnvVar {
                var: "TVRANK_PUBLISHER".to_string(),
                reason: format!("unknown publisher '{other}'; expected 'github' or 'airtable'"),
            })
        }
    };

    Ok(AppConfig {
        log_level,
        sources_path,
        http,
        publisher,
    })
}

#[cfg(test)]
#[path = "config_test.rs"]
mod tests;
