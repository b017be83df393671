//! Row shapes expected by the remote stores.

use serde::Serialize;
use tvrank_core::ViewershipRecord;

/// Column order of the spreadsheet artifact.
pub const FULL_COLUMNS: [&str; 7] = [
    "Date", "Rank", "Service", "Program", "Episode", "Duration", "Viewers",
];

/// Field names of the row-oriented store.
pub const REDUCED_COLUMNS: [&str; 6] = ["Group", "Service", "Date", "Rank", "Title", "Views"];

fn format_date(record: &ViewershipRecord) -> String {
    record.date.format("%Y-%m-%d").to_string()
}

/// One spreadsheet row, fields in [`FULL_COLUMNS`] order.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "PascalCase")]
pub struct FullRow<'a> {
    pub date: String,
    pub rank: u32,
    pub service: &'a str,
    pub program: &'a str,
    pub episode: &'a str,
    pub duration: &'a str,
    pub viewers: u64,
}

impl<'a> From<&'a ViewershipRecord> for FullRow<'a> {
    fn from(record: &'a ViewershipRecord) -> Self {
        Self {
            date: format_date(record),
            rank: record.rank,
            service: &record.service,
            program: &record.program,
            episode: &record.episode,
            duration: &record.duration,
            viewers: record.viewers,
        }
    }
}

/// One record for single-table consumers: the program becomes `Title`,
/// viewers become `Views`. `Group` keeps rows of different source groups
/// apart when they share a table.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "PascalCase")]
pub struct ReducedRow<'a> {
    pub group: &'a str,
    pub service: &'a str,
    pub date: String,
    pub rank: u32,
    pub title: &'a str,
    pub views: u64,
}

impl<'a> ReducedRow<'a> {
    #[must_use]
    pub fn new(group: &'a str, record: &'a ViewershipRecord) -> Self {
        Self {
            group,
            service: &record.service,
            date: format_date(record),
            rank: record.rank,
            title: &record.program,
            views: record.viewers,
        }
    }
}
