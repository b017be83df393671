use std::collections::HashSet;
use std::path::Path;

use reqwest::Url;
use serde::Deserialize;

use crate::types::{SourceDescriptor, SourceGroup, TableVariant};
use crate::ConfigError;

#[derive(Debug, Deserialize)]
struct SourcesFile {
    groups: Vec<GroupEntry>,
}

#[derive(Debug, Deserialize)]
struct GroupEntry {
    name: String,
    #[serde(default = "default_variant")]
    variant: TableVariant,
    artifact_prefix: String,
    sources: Vec<SourceEntry>,
}

#[derive(Debug, Deserialize)]
struct SourceEntry {
    service: Option<String>,
    endpoint: String,
}

fn default_variant() -> TableVariant {
    TableVariant::Detailed
}

/// Guess the service name from a Finnpanel endpoint when the config omits it.
#[must_use]
pub fn infer_service_name(endpoint: &str) -> &'static str {
    let lower = endpoint.to_lowercase();
    if lower.contains("mtv") {
        "MTV Katsomo"
    } else if lower.contains("sanoma") {
        "Ruutu"
    } else if lower.contains("yle") {
        "Yle Areena"
    } else {
        "Unknown"
    }
}

/// Load and validate the source groups from a YAML file.
///
/// # Errors
///
/// Returns `ConfigError` if the file cannot be read, parsed, or fails validation.
pub fn load_sources(path: &Path) -> Result<Vec<SourceGroup>, ConfigError> {
    let content = std::fs::read_to_string(path).map_err(|e| ConfigError::SourcesFileIo {
        path: path.display().to_string(),
        source: e,
    })?;
    parse_sources(&content)
}

/// Parse and validate source groups from YAML text.
///
/// # Errors
///
/// Returns [`ConfigError::SourcesFileParse`] on malformed YAML and
/// [`ConfigError::Validation`] when the groups break an invariant.
pub fn parse_sources(content: &str) -> Result<Vec<SourceGroup>, ConfigError> {
    let file: SourcesFile = serde_yaml::from_str(content)?;

    if file.groups.is_empty() {
        return Err(ConfigError::Validation(
            "at least one source group must be configured".to_string(),
        ));
    }

    let mut seen_names = HashSet::new();
    let mut seen_prefixes = HashSet::new();
    let mut groups = Vec::with_capacity(file.groups.len());

    for entry in file.groups {
        let name = entry.name.trim().to_string();
        if name.is_empty() {
            return Err(ConfigError::Validation(
                "group name must be non-empty".to_string(),
            ));
        }
        if !seen_names.insert(name.to_lowercase()) {
            return Err(ConfigError::Validation(format!(
                "duplicate group name: '{name}'"
            )));
        }

        let artifact_prefix = entry.artifact_prefix.trim().to_string();
        if artifact_prefix.is_empty() {
            return Err(ConfigError::Validation(format!(
                "group '{name}' has an empty artifact_prefix"
            )));
        }
        if !seen_prefixes.insert(artifact_prefix.clone()) {
            return Err(ConfigError::Validation(format!(
                "duplicate artifact_prefix '{artifact_prefix}' (group '{name}')"
            )));
        }

        if entry.sources.is_empty() {
            return Err(ConfigError::Validation(format!(
                "group '{name}' has no sources"
            )));
        }

        let sources = entry
            .sources
            .into_iter()
            .map(|s| to_descriptor(&name, s))
            .collect::<Result<Vec<_>, _>>()?;

        groups.push(SourceGroup {
            name,
            variant: entry.variant,
            artifact_prefix,
            sources,
        });
    }

    Ok(groups)
}

fn to_descriptor(group: &str, entry: SourceEntry) -> Result<SourceDescriptor, ConfigError> {
    let endpoint = Url::parse(entry.endpoint.trim()).map_err(|e| {
        ConfigError::Validation(format!(
            "group '{group}' has invalid endpoint '{}': {e}",
            entry.endpoint
        ))
    })?;
    if !matches!(endpoint.scheme(), "http" | "https") {
        return Err(ConfigError::Validation(format!(
            "group '{group}' endpoint '{endpoint}' must use http or https"
        )));
    }

    let service = match entry.service.map(|s| s.trim().to_string()) {
        Some(s) if !s.is_empty() => s,
        _ => {
            let inferred = infer_service_name(endpoint.as_str());
            tracing::debug!(group, %endpoint, service = inferred, "inferred service name");
            inferred.to_string()
        }
    };

    Ok(SourceDescriptor { service, endpoint })
}

#[cfg(test)]
#[path = "sources_test.rs"]
mod tests;
