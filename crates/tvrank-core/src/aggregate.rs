//! Cross-source merge and global re-ranking.

use chrono::NaiveDate;

use crate::types::{RecordFragment, ResultSet, SourceFragments, ViewershipRecord};

/// Merges every source's fragments into one ranked [`ResultSet`].
///
/// Sources are concatenated in the order given (the configured order), so
/// that order is the tie-break for equal viewer counts. Fragments missing a
/// source rank or a viewer count are dropped. The surviving records are
/// stable-sorted by descending viewers, re-ranked `1..=N`, and stamped with
/// `run_date`; any rank reported by the source is discarded.
///
/// Returns `None` when no valid fragment remains, so callers can tell
/// "nothing to publish" apart from a published empty set.
#[must_use]
pub fn aggregate(
    group: &str,
    sources: Vec<SourceFragments>,
    run_date: NaiveDate,
) -> Option<ResultSet> {
    let mut dropped = 0usize;
    let mut valid: Vec<(u64, RecordFragment)> = Vec::new();

    for source in sources {
        for fragment in source.fragments {
            match (fragment.source_rank, fragment.viewers) {
                (Some(_), Some(viewers)) => valid.push((viewers, fragment)),
                _ => dropped += 1,
            }
        }
    }

    if dropped > 0 {
        tracing::debug!(group, dropped, "dropped rows with unparseable rank or viewers");
    }

    if valid.is_empty() {
        return None;
    }

    // `sort_by` is stable: equal counts keep their concatenation order.
    valid.sort_by(|(a, _), (b, _)| b.cmp(a));

    let records = valid
        .into_iter()
        .zip(1u32..)
        .map(|((viewers, fragment), rank)| ViewershipRecord {
            rank,
            service: fragment.service,
            program: fragment.program,
            episode: fragment.episode,
            duration: fragment.duration,
            viewers,
            date: run_date,
        })
        .collect();

    Some(ResultSet {
        group: group.to_string(),
        run_date,
        records,
    })
}
