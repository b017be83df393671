//! Publishes dated workbooks as files in a GitHub repository through the
//! contents API.
//!
//! Every publish looks the file up first. A miss creates it; a hit replaces
//! it using the blob sha from the lookup, so reruns on the same day update
//! the same file instead of failing or duplicating it.

use std::sync::Arc;

use async_trait::async_trait;
use base64::engine::general_purpose::STANDARD;
use base64::Engine as _;
use chrono::NaiveDate;
use percent_encoding::{utf8_percent_encode, AsciiSet, NON_ALPHANUMERIC};
use reqwest::Method;
use serde::Deserialize;
use tokio::sync::OnceCell;
use tvrank_core::{GitHubConfig, PublishTarget, ResultSet, SourceGroup};
use tvrank_scraper::{HttpRequest, Transport};

use crate::error::PublishError;
use crate::publisher::{PublishReceipt, Publisher};
use crate::workbook::build_workbook;

const API_VERSION: &str = "2022-11-28";

/// Path segment characters left as-is; everything else is escaped.
const SEGMENT: &AsciiSet = &NON_ALPHANUMERIC
    .remove(b'-')
    .remove(b'.')
    .remove(b'_')
    .remove(b'~');

/// Result of looking up an artifact before writing it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Lookup {
    Found { sha: String },
    NotFound,
}

#[derive(Debug, Deserialize)]
struct ContentEntry {
    sha: String,
}

#[derive(Debug, Deserialize)]
struct PutResponse {
    content: ContentEntry,
}

#[derive(Debug, Deserialize)]
struct AuthenticatedUser {
    login: String,
}

pub struct GitHubPublisher<T: ?Sized> {
    transport: Arc<T>,
    config: GitHubConfig,
    owner: OnceCell<String>,
}

impl<T> GitHubPublisher<T>
where
    T: Transport + ?Sized,
{
    #[must_use]
    pub fn new(transport: Arc<T>, config: GitHubConfig) -> Self {
        let owner = OnceCell::new_with(config.owner.clone());
        Self {
            transport,
            config,
            owner,
        }
    }

    fn request(&self, method: Method, url: String) -> HttpRequest {
        HttpRequest::new(method, url)
            .header("Accept", "application/vnd.github+json")
            .header("X-GitHub-Api-Version", API_VERSION)
            .bearer(&self.config.token)
    }

    /// The repository owner, asking `GET /user` once when none is configured.
    async fn owner(&self) -> Result<&str, PublishError> {
        let owner = self
            .owner
            .get_or_try_init(|| async {
                let url = format!("{}/user", self.config.api_url);
                let response = self
                    .transport
                    .execute(self.request(Method::GET, url))
                    .await
                    .map_err(|e| PublishError::from_transport("resolve owner", e))?;
                let user: AuthenticatedUser =
                    response
                        .json()
                        .map_err(|source| PublishError::Json {
                            context: "GET /user".to_string(),
                            source,
                        })?;
                tracing::debug!(owner = %user.login, "resolved repository owner");
                Ok::<_, PublishError>(user.login)
            })
            .await?;
        Ok(owner.as_str())
    }

    /// Repository-relative path of `artifact`, with the configured directory
    /// prepended.
    fn repo_path(&self, artifact: &str) -> String {
        if self.config.dir.is_empty() {
            artifact.to_string()
        } else {
            format!("{}/{artifact}", self.config.dir)
        }
    }

    fn contents_url(&self, owner: &str, repo_path: &str) -> String {
        let encoded: Vec<String> = repo_path
            .split('/')
            .map(|segment| utf8_percent_encode(segment, SEGMENT).to_string())
            .collect();
        format!(
            "{}/repos/{}/{}/contents/{}",
            self.config.api_url,
            utf8_percent_encode(owner, SEGMENT),
            utf8_percent_encode(&self.config.repo, SEGMENT),
            encoded.join("/")
        )
    }

    /// Looks up `artifact` in the configured repository and branch.
    ///
    /// # Errors
    ///
    /// Returns [`PublishError`] for anything other than a found file or a 404.
    pub async fn lookup(&self, artifact: &str) -> Result<Lookup, PublishError> {
        let owner = self.owner().await?;
        let mut url = self.contents_url(owner, &self.repo_path(artifact));
        if let Some(branch) = &self.config.branch {
            url.push_str("?ref=");
            url.push_str(&utf8_percent_encode(branch, SEGMENT).to_string());
        }

        match self.transport.execute(self.request(Method::GET, url)).await {
            Ok(response) => {
                let entry: ContentEntry =
                    response
                        .json()
                        .map_err(|source| PublishError::Json {
                            context: format!("lookup of {artifact}"),
                            source,
                        })?;
                Ok(Lookup::Found { sha: entry.sha })
            }
            Err(err) if err.is_not_found() => Ok(Lookup::NotFound),
            Err(err) => Err(PublishError::from_transport("lookup", err)),
        }
    }
}

fn validate_artifact(name: &str) -> Result<(), PublishError> {
    let reason = if name.trim().is_empty() {
        "name is empty"
    } else if name.split('/').any(|part| part == ".." || part.is_empty()) {
        "name must be a plain relative path"
    } else {
        return Ok(());
    };
    Err(PublishError::InvalidTarget {
        artifact: name.to_string(),
        reason: reason.to_string(),
    })
}

#[async_trait]
impl<T> Publisher for GitHubPublisher<T>
where
    T: Transport + ?Sized,
{
    fn kind(&self) -> &'static str {
        "github"
    }

    fn target_for(&self, group: &SourceGroup, run_date: NaiveDate) -> PublishTarget {
        PublishTarget::new(group.artifact_name(run_date))
    }

    async fn publish(
        &self,
        result: &ResultSet,
        target: &mut PublishTarget,
    ) -> Result<PublishReceipt, PublishError> {
        validate_artifact(&target.artifact_name)?;
        let bytes = build_workbook(result)?;

        let existing = match self.lookup(&target.artifact_name).await? {
            Lookup::Found { sha } => Some(sha),
            Lookup::NotFound => None,
        };
        let (operation, verb) = if existing.is_some() {
            ("update", "Update")
        } else {
            ("create", "Create")
        };

        let mut body = serde_json::json!({
            "message": format!("{verb} {}", target.artifact_name),
            "content": STANDARD.encode(&bytes),
        });
        if let Some(sha) = &existing {
            body["sha"] = serde_json::Value::String(sha.clone());
        }
        if let Some(branch) = &self.config.branch {
            body["branch"] = serde_json::Value::String(branch.clone());
        }

        let owner = self.owner().await?;
        let url = self.contents_url(owner, &self.repo_path(&target.artifact_name));
        let response = self
            .transport
            .execute(self.request(Method::PUT, url).json(&body))
            .await
            .map_err(|e| PublishError::from_transport(operation, e))?;

        match response.json::<PutResponse>() {
            Ok(put) => target.remote_id = Some(put.content.sha),
            Err(err) => {
                tracing::warn!(artifact = %target.artifact_name, error = %err, "unreadable PUT response");
                target.remote_id = existing.clone();
            }
        }

        let artifact = target.artifact_name.clone();
        let rows = result.len();
        tracing::info!(
            artifact = %artifact,
            owner,
            repo = %self.config.repo,
            rows,
            operation,
            "published workbook"
        );

        Ok(if existing.is_some() {
            PublishReceipt::Updated { artifact, rows }
        } else {
            PublishReceipt::Created { artifact, rows }
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn artifact_names_must_be_plain_paths() {
        assert!(validate_artifact("finnpanel_data_14d_2024-05-01.xlsx").is_ok());
        assert!(validate_artifact("reports/a.xlsx").is_ok());
        assert!(validate_artifact("").is_err());
        assert!(validate_artifact("  ").is_err());
        assert!(validate_artifact("../a.xlsx").is_err());
        assert!(validate_artifact("/a.xlsx").is_err());
    }

    #[test]
    fn segment_set_keeps_file_name_characters() {
        let encoded = utf8_percent_encode("data_14d 2024-05-01.xlsx", SEGMENT).to_string();
        assert_eq!(encoded, "data_14d%202024-05-01.xlsx");
    }
}
