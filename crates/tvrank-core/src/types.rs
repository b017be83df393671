use chrono::NaiveDate;
use reqwest::Url;
use serde::{Deserialize, Serialize};

/// One upstream provider page. Built once from configuration, never mutated.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SourceDescriptor {
    pub service: String,
    pub endpoint: Url,
}

/// Column layout family of a group's results tables.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TableVariant {
    /// Rank, program, optional episode, ..., duration, viewers. Header and
    /// data cells (`th` and `td`) both count as columns.
    Detailed,
    /// Rank, title, views. Only `td` cells count.
    Simplified,
}

impl TableVariant {
    /// Rows with fewer cells than this are dropped during extraction.
    #[must_use]
    pub fn min_columns(self) -> usize {
        match self {
            TableVariant::Detailed => 5,
            TableVariant::Simplified => 3,
        }
    }
}

impl std::fmt::Display for TableVariant {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            TableVariant::Detailed => write!(f, "detailed"),
            TableVariant::Simplified => write!(f, "simplified"),
        }
    }
}

/// A named set of sources scraped, ranked and published together.
#[derive(Debug, Clone)]
pub struct SourceGroup {
    pub name: String,
    pub variant: TableVariant,
    pub artifact_prefix: String,
    pub sources: Vec<SourceDescriptor>,
}

impl SourceGroup {
    /// Remote artifact name for a run on `run_date`, e.g.
    /// `finnpanel_data_14d_2024-05-01.xlsx`.
    #[must_use]
    pub fn artifact_name(&self, run_date: NaiveDate) -> String {
        format!("{}_{}.xlsx", self.artifact_prefix, run_date.format("%Y-%m-%d"))
    }
}

/// A per-source record before global ranking.
///
/// Numeric fields that failed to parse are `None`; such fragments are
/// dropped by [`crate::aggregate`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RecordFragment {
    pub source_rank: Option<u32>,
    pub service: String,
    pub program: String,
    pub episode: String,
    pub duration: String,
    pub viewers: Option<u64>,
}

/// All fragments scraped from one source, in extraction order.
#[derive(Debug, Clone)]
pub struct SourceFragments {
    pub service: String,
    pub fragments: Vec<RecordFragment>,
}

/// A ranked, dated viewership row as published.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ViewershipRecord {
    pub rank: u32,
    pub service: String,
    pub program: String,
    pub episode: String,
    pub duration: String,
    pub viewers: u64,
    pub date: NaiveDate,
}

/// The ranked output of one pipeline pass over one source group.
///
/// Only [`crate::aggregate`] builds these, so `records` is never empty and
/// ranks are dense `1..=N`.
#[derive(Debug, Clone)]
pub struct ResultSet {
    pub group: String,
    pub run_date: NaiveDate,
    pub records: Vec<ViewershipRecord>,
}

impl ResultSet {
    #[must_use]
    pub fn len(&self) -> usize {
        self.records.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }
}

/// Where a result set is published. `remote_id` is discovered by the
/// publisher's lookup and cached here for subsequent calls.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PublishTarget {
    pub artifact_name: String,
    pub remote_id: Option<String>,
}

impl PublishTarget {
    #[must_use]
    pub fn new(artifact_name: impl Into<String>) -> Self {
        Self {
            artifact_name: artifact_name.into(),
            remote_id: None,
        }
    }
}
