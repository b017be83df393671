use std::path::PathBuf;

/// Transport settings shared by every outbound request.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HttpConfig {
    pub timeout_secs: u64,
    pub max_retries: u32,
    pub backoff_base_ms: u64,
    pub user_agent: String,
}

/// Credentials and location of the GitHub repository that receives the
/// dated workbooks.
#[derive(Clone)]
pub struct GitHubConfig {
    pub token: String,
    /// `None` means "the authenticated user", resolved at publish time.
    pub owner: Option<String>,
    pub repo: String,
    pub branch: Option<String>,
    /// Directory inside the repository; empty for the repository root.
    pub dir: String,
    pub api_url: String,
}

impl std::fmt::Debug for GitHubConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("GitHubConfig")
            .field("token", &"[redacted]")
            .field("owner", &self.owner)
            .field("repo", &self.repo)
            .field("branch", &self.branch)
            .field("dir", &self.dir)
            .field("api_url", &self.api_url)
            .finish()
    }
}

#[derive(Clone)]
pub struct AirtableConfig {
    pub api_key: String,
    pub base_id: String,
    pub table: String,
    pub api_url: String,
}

impl std::fmt::Debug for AirtableConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AirtableConfig")
            .field("api_key", &"[redacted]")
            .field("base_id", &self.base_id)
            .field("table", &self.table)
            .field("api_url", &self.api_url)
            .finish()
    }
}

/// Which remote store receives the result sets.
#[derive(Debug, Clone)]
pub enum PublisherConfig {
    GitHub(GitHubConfig),
    Airtable(AirtableConfig),
}

impl PublisherConfig {
    #[must_use]
    pub fn kind(&self) -> &'static str {
        match self {
            PublisherConfig::GitHub(_) => "github",
            PublisherConfig::Airtable(_) => "airtable",
        }
    }
}

#[derive(Debug, Clone)]
pub struct AppConfig {
    pub log_level: String,
    pub sources_path: PathBuf,
    pub http: HttpConfig,
    pub publisher: PublisherConfig,
}
