//! One scrape → rank → publish pass over the configured source groups.
//!
//! Groups run one after another and sources within a group are fetched in
//! configured order. A source that yields nothing is recorded and skipped;
//! a group whose publish fails is recorded and does not stop its siblings.

use chrono::NaiveDate;
use tvrank_core::{aggregate, SourceGroup};
use tvrank_publish::{PublishError, PublishReceipt, Publisher};
use tvrank_scraper::{scrape_source, Transport};

/// What one source contributed to its group.
#[derive(Debug)]
pub(crate) struct SourceSummary {
    pub service: String,
    pub rows: usize,
    /// Why the source contributed nothing, if it didn't.
    pub gap: Option<String>,
}

#[derive(Debug)]
pub(crate) enum GroupOutcome {
    Published(PublishReceipt),
    /// Every source came back empty; nothing was published.
    NoData,
    /// Dry run: `rows` ranked records would have been published.
    DryRun { rows: usize },
    Failed(PublishError),
}

impl GroupOutcome {
    pub(crate) fn succeeded(&self) -> bool {
        matches!(self, GroupOutcome::Published(_) | GroupOutcome::DryRun { .. })
    }
}

#[derive(Debug)]
pub(crate) struct GroupReport {
    pub group: String,
    pub sources: Vec<SourceSummary>,
    pub outcome: GroupOutcome,
}

impl std::fmt::Display for GroupReport {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match &self.outcome {
            GroupOutcome::Published(receipt) => write!(f, "{}: {receipt}", self.group)?,
            GroupOutcome::NoData => write!(f, "{}: no data", self.group)?,
            GroupOutcome::DryRun { rows } => {
                write!(f, "{}: dry-run, would publish {rows} rows", self.group)?;
            }
            GroupOutcome::Failed(err) => write!(f, "{}: failed: {err}", self.group)?,
        }
        for source in &self.sources {
            match &source.gap {
                Some(gap) => write!(f, "\n  {}: no rows ({gap})", source.service)?,
                None => write!(f, "\n  {}: {} rows", source.service, source.rows)?,
            }
        }
        Ok(())
    }
}

/// Narrows `groups` to the one named `filter` (case-insensitive), or returns
/// them all when no filter is given.
///
/// # Errors
///
/// Returns an error naming the configured groups if `filter` matches none.
pub(crate) fn select_groups(
    groups: Vec<SourceGroup>,
    filter: Option<&str>,
) -> anyhow::Result<Vec<SourceGroup>> {
    let Some(name) = filter else {
        return Ok(groups);
    };

    let known: Vec<String> = groups.iter().map(|g| g.name.clone()).collect();
    let selected: Vec<SourceGroup> = groups
        .into_iter()
        .filter(|g| g.name.eq_ignore_ascii_case(name))
        .collect();

    if selected.is_empty() {
        anyhow::bail!(
            "group '{name}' not found; configured groups: [{}]",
            known.join(", ")
        );
    }
    Ok(selected)
}

/// Scrapes every source of `group`, ranks the union and publishes it once.
pub(crate) async fn run_group<T, P>(
    transport: &T,
    publisher: &P,
    group: &SourceGroup,
    run_date: NaiveDate,
    dry_run: bool,
) -> GroupReport
where
    T: Transport + ?Sized,
    P: Publisher + ?Sized,
{
    let mut sources = Vec::with_capacity(group.sources.len());
    let mut collected = Vec::with_capacity(group.sources.len());

    for source in &group.sources {
        let scrape = scrape_source(transport, source, group.variant).await;
        sources.push(SourceSummary {
            service: scrape.service.clone(),
            rows: scrape.fragments.len(),
            gap: scrape.gap.as_ref().map(ToString::to_string),
        });
        collected.push(scrape.into_fragments());
    }

    let report = |outcome| GroupReport {
        group: group.name.clone(),
        sources,
        outcome,
    };

    let Some(result) = aggregate(&group.name, collected, run_date) else {
        tracing::warn!(group = %group.name, "no usable rows from any source, nothing to publish");
        return report(GroupOutcome::NoData);
    };

    if dry_run {
        tracing::info!(group = %group.name, rows = result.len(), "dry-run: skipping publish");
        return report(GroupOutcome::DryRun { rows: result.len() });
    }

    let mut target = publisher.target_for(group, run_date);
    match publisher.publish(&result, &mut target).await {
        Ok(receipt) => {
            tracing::info!(
                group = %group.name,
                publisher = publisher.kind(),
                %receipt,
                "group published"
            );
            report(GroupOutcome::Published(receipt))
        }
        Err(e) => {
            tracing::error!(
                group = %group.name,
                publisher = publisher.kind(),
                artifact = %target.artifact_name,
                error = %e,
                "publish failed"
            );
            report(GroupOutcome::Failed(e))
        }
    }
}

/// Runs every group in order and collects their reports.
pub(crate) async fn run_all<T, P>(
    transport: &T,
    publisher: &P,
    groups: &[SourceGroup],
    run_date: NaiveDate,
    dry_run: bool,
) -> Vec<GroupReport>
where
    T: Transport + ?Sized,
    P: Publisher + ?Sized,
{
    let mut reports = Vec::with_capacity(groups.len());
    for group in groups {
        tracing::info!(group = %group.name, sources = group.sources.len(), "running group");
        reports.push(run_group(transport, publisher, group, run_date, dry_run).await);
    }
    reports
}

/// Fails unless at least one group published (or, in a dry run, produced
/// data).
///
/// # Errors
///
/// Returns an error summarising every group's outcome when none succeeded.
pub(crate) fn ensure_any_succeeded(reports: &[GroupReport], dry_run: bool) -> anyhow::Result<()> {
    let succeeded = reports.iter().filter(|r| r.outcome.succeeded()).count();
    let failed = reports
        .iter()
        .filter(|r| matches!(r.outcome, GroupOutcome::Failed(_)))
        .count();

    if failed > 0 {
        tracing::warn!(failed, total = reports.len(), "some groups failed to publish");
    }

    if succeeded == 0 {
        let outcomes: Vec<String> = reports
            .iter()
            .map(|r| match &r.outcome {
                GroupOutcome::Failed(e) => format!("{}: {e}", r.group),
                _ => format!("{}: no data", r.group),
            })
            .collect();
        anyhow::bail!(
            "no group {} ({})",
            if dry_run { "produced data" } else { "was published" },
            outcomes.join("; ")
        );
    }
    Ok(())
}

#[cfg(test)]
#[path = "pipeline_test.rs"]
mod tests;
