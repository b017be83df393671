use async_trait::async_trait;
use chrono::NaiveDate;
use tvrank_core::{PublishTarget, ResultSet, SourceGroup};

use crate::error::PublishError;

/// What a successful publish did remotely.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PublishReceipt {
    /// A new artifact was created.
    Created { artifact: String, rows: usize },
    /// An existing artifact was replaced.
    Updated { artifact: String, rows: usize },
    /// Rows were merged into a row-oriented store in `batches` requests;
    /// `removed` leftover rows from an earlier, longer run were deleted.
    Upserted {
        artifact: String,
        rows: usize,
        batches: usize,
        removed: usize,
    },
}

impl std::fmt::Display for PublishReceipt {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            PublishReceipt::Created { artifact, rows } => {
                write!(f, "created {artifact} ({rows} rows)")
            }
            PublishReceipt::Updated { artifact, rows } => {
                write!(f, "updated {artifact} ({rows} rows)")
            }
            PublishReceipt::Upserted {
                artifact,
                rows,
                batches,
                removed,
            } => write!(
                f,
                "upserted {rows} rows into {artifact} in {batches} batches, removed {removed} stale rows"
            ),
        }
    }
}

/// Idempotent create-or-update of a [`ResultSet`] in a remote store.
///
/// Publishing the same result set to the same target twice leaves exactly
/// one artifact behind. Transport failures surface as [`PublishError`];
/// implementations do not retry beyond what their transport does.
#[async_trait]
pub trait Publisher: Send + Sync {
    /// Short store name for logs.
    fn kind(&self) -> &'static str;

    /// The artifact a group's run on `run_date` publishes to.
    fn target_for(&self, group: &SourceGroup, run_date: NaiveDate) -> PublishTarget;

    /// Publishes `result` to `target`, recording any identifier discovered
    /// during lookup in `target.remote_id`.
    async fn publish(
        &self,
        result: &ResultSet,
        target: &mut PublishTarget,
    ) -> Result<PublishReceipt, PublishError>;
}
