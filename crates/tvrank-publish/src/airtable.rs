//! Upserts ranked rows into an Airtable table.
//!
//! Rows are merged on `(Date, Group, Service, Rank)`, so republishing a
//! day's result set rewrites the same rows instead of appending new ones,
//! and groups sharing a table never overwrite each other. After the upsert,
//! rows of the same day and group ranked below the new result set are
//! deleted, leaving exactly the published rows behind.

use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use chrono::NaiveDate;
use percent_encoding::{utf8_percent_encode, NON_ALPHANUMERIC};
use reqwest::Method;
use serde::{Deserialize, Serialize};
use tvrank_core::{AirtableConfig, PublishTarget, ResultSet, SourceGroup};
use tvrank_scraper::{HttpRequest, Transport};

use crate::error::PublishError;
use crate::publisher::{PublishReceipt, Publisher};
use crate::shape::ReducedRow;

/// Airtable accepts at most this many records per write.
pub const MAX_BATCH: usize = 10;

/// Fields identifying a row for upsert.
pub const MERGE_FIELDS: [&str; 4] = ["Date", "Group", "Service", "Rank"];

const DEFAULT_BATCH_DELAY: Duration = Duration::from_millis(200);

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct PerformUpsert {
    fields_to_merge_on: [&'static str; 4],
}

#[derive(Serialize)]
struct UpsertRecord<'a> {
    fields: ReducedRow<'a>,
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct UpsertBody<'a> {
    perform_upsert: PerformUpsert,
    records: Vec<UpsertRecord<'a>>,
    typecast: bool,
}

#[derive(Debug, Deserialize)]
struct ListPage {
    records: Vec<ListedRecord>,
    #[serde(default)]
    offset: Option<String>,
}

#[derive(Debug, Deserialize)]
struct ListedRecord {
    id: String,
}

/// Quotes `value` for use inside a single-quoted formula string.
fn formula_string(value: &str) -> String {
    format!("'{}'", value.replace('\\', "\\\\").replace('\'', "\\'"))
}

/// Matches rows of `result`'s day and group ranked below its last record.
fn stale_rows_formula(result: &ResultSet) -> String {
    format!(
        "AND(DATESTR({{Date}})={},{{Group}}={},{{Rank}}>{})",
        formula_string(&result.run_date.format("%Y-%m-%d").to_string()),
        formula_string(&result.group),
        result.len()
    )
}

pub struct AirtablePublisher<T: ?Sized> {
    transport: Arc<T>,
    config: AirtableConfig,
    batch_delay: Duration,
}

impl<T> AirtablePublisher<T>
where
    T: Transport + ?Sized,
{
    #[must_use]
    pub fn new(transport: Arc<T>, config: AirtableConfig) -> Self {
        Self {
            transport,
            config,
            batch_delay: DEFAULT_BATCH_DELAY,
        }
    }

    /// Pause between batch requests, to stay under the per-base rate limit.
    #[must_use]
    pub fn with_batch_delay(mut self, delay: Duration) -> Self {
        self.batch_delay = delay;
        self
    }

    async fn pause(&self, index: usize) {
        if index > 0 && !self.batch_delay.is_zero() {
            tokio::time::sleep(self.batch_delay).await;
        }
    }

    /// Ids of rows left over from an earlier, longer run of the same day
    /// and group.
    async fn stale_record_ids(
        &self,
        url: &str,
        result: &ResultSet,
    ) -> Result<Vec<String>, PublishError> {
        let formula = utf8_percent_encode(&stale_rows_formula(result), NON_ALPHANUMERIC).to_string();
        let mut ids = Vec::new();
        let mut offset: Option<String> = None;

        for index in 0.. {
            self.pause(index).await;
            let mut page_url = format!("{url}?filterByFormula={formula}&pageSize=100");
            if let Some(next) = &offset {
                page_url.push_str("&offset=");
                page_url.push_str(&utf8_percent_encode(next, NON_ALPHANUMERIC).to_string());
            }

            let response = self
                .transport
                .execute(HttpRequest::get(page_url).bearer(&self.config.api_key))
                .await
                .map_err(|e| PublishError::from_transport("list stale rows", e))?;
            let page: ListPage = response.json().map_err(|source| PublishError::Json {
                context: "stale row listing".to_string(),
                source,
            })?;

            ids.extend(page.records.into_iter().map(|r| r.id));
            match page.offset {
                Some(next) => offset = Some(next),
                None => break,
            }
        }
        Ok(ids)
    }

    async fn delete_records(&self, url: &str, ids: &[String]) -> Result<(), PublishError> {
        for (index, chunk) in ids.chunks(MAX_BATCH).enumerate() {
            self.pause(index).await;
            let query: Vec<String> = chunk
                .iter()
                .map(|id| format!("records%5B%5D={}", utf8_percent_encode(id, NON_ALPHANUMERIC)))
                .collect();
            self.transport
                .execute(
                    HttpRequest::new(Method::DELETE, format!("{url}?{}", query.join("&")))
                        .bearer(&self.config.api_key),
                )
                .await
                .map_err(|e| PublishError::from_transport("delete stale rows", e))?;
        }
        Ok(())
    }

    fn table_url(&self, table: &str) -> String {
        format!(
            "{}/v0/{}/{}",
            self.config.api_url,
            utf8_percent_encode(&self.config.base_id, NON_ALPHANUMERIC),
            utf8_percent_encode(table, NON_ALPHANUMERIC)
        )
    }
}

#[async_trait]
impl<T> Publisher for AirtablePublisher<T>
where
    T: Transport + ?Sized,
{
    fn kind(&self) -> &'static str {
        "airtable"
    }

    fn target_for(&self, _group: &SourceGroup, _run_date: NaiveDate) -> PublishTarget {
        PublishTarget::new(self.config.table.clone())
    }

    async fn publish(
        &self,
        result: &ResultSet,
        target: &mut PublishTarget,
    ) -> Result<PublishReceipt, PublishError> {
        if target.artifact_name.trim().is_empty() {
            return Err(PublishError::InvalidTarget {
                artifact: target.artifact_name.clone(),
                reason: "table name is empty".to_string(),
            });
        }

        let url = self.table_url(&target.artifact_name);
        let mut batches = 0usize;

        for (index, chunk) in result.records.chunks(MAX_BATCH).enumerate() {
            self.pause(index).await;

            let body = UpsertBody {
                perform_upsert: PerformUpsert {
                    fields_to_merge_on: MERGE_FIELDS,
                },
                records: chunk
                    .iter()
                    .map(|record| UpsertRecord {
                        fields: ReducedRow::new(&result.group, record),
                    })
                    .collect(),
                typecast: true,
            };
            let body = serde_json::to_value(&body).map_err(|source| PublishError::Json {
                context: "upsert body".to_string(),
                source,
            })?;

            self.transport
                .execute(
                    HttpRequest::new(Method::PATCH, url.clone())
                        .bearer(&self.config.api_key)
                        .json(&body),
                )
                .await
                .map_err(|e| PublishError::from_transport("upsert", e))?;

            batches += 1;
            tracing::debug!(
                table = %target.artifact_name,
                batch = batches,
                rows = chunk.len(),
                "upserted batch"
            );
        }

        let stale = self.stale_record_ids(&url, result).await?;
        if !stale.is_empty() {
            self.delete_records(&url, &stale).await?;
        }

        let rows = result.len();
        tracing::info!(
            table = %target.artifact_name,
            group = %result.group,
            rows,
            batches,
            removed = stale.len(),
            "published rows"
        );

        Ok(PublishReceipt::Upserted {
            artifact: target.artifact_name.clone(),
            rows,
            batches,
            removed: stale.len(),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn upsert_body_shape() {
        let body = UpsertBody {
            perform_upsert: PerformUpsert {
                fields_to_merge_on: MERGE_FIELDS,
            },
            records: Vec::new(),
            typecast: true,
        };
        let json = serde_json::to_value(&body).unwrap();
        assert_eq!(
            json["performUpsert"]["fieldsToMergeOn"],
            serde_json::json!(["Date", "Group", "Service", "Rank"])
        );
        assert_eq!(json["typecast"], true);
        assert!(json["records"].as_array().unwrap().is_empty());
    }

    #[test]
    fn stale_formula_scopes_to_day_group_and_tail() {
        let date = NaiveDate::from_ymd_opt(2024, 5, 1).unwrap();
        let result = ResultSet {
            group: "o'14d".to_string(),
            run_date: date,
            records: Vec::new(),
        };
        assert_eq!(
            stale_rows_formula(&result),
            r"AND(DATESTR({Date})='2024-05-01',{Group}='o\'14d',{Rank}>0)"
        );
    }
}
