//! Conversion of raw cell text into typed record fields.
//!
//! Normalization is permissive: an unparseable number becomes `None` on the
//! fragment and the row is later dropped by the aggregator. Nothing here
//! returns an error.

use tvrank_core::RecordFragment;

use crate::extract::RawRow;

/// Characters removed anywhere in a numeric cell: the rank marker, thousands
/// separators, and the non-breaking spaces Finnpanel uses for grouping.
const NUMERIC_NOISE: [char; 5] = ['#', '.', ',', '\u{a0}', '\u{202f}'];

fn clean_numeric(text: &str) -> String {
    text.chars()
        .filter(|c| !NUMERIC_NOISE.contains(c))
        .collect::<String>()
        .trim()
        .to_string()
}

/// Parses a viewer count such as `"512.300"` or `"1\u{a0}024"`.
#[must_use]
pub fn parse_count(text: &str) -> Option<u64> {
    clean_numeric(text).parse().ok()
}

/// Parses a source rank such as `"#12"`.
#[must_use]
pub fn parse_rank(text: &str) -> Option<u32> {
    clean_numeric(text).parse().ok()
}

/// Converts one extracted row into a fragment attributed to `service`.
///
/// Text fields are trimmed only; an empty episode is valid.
#[must_use]
pub fn normalize_row(row: &RawRow, service: &str) -> RecordFragment {
    RecordFragment {
        source_rank: parse_rank(row.rank_text()),
        service: service.to_string(),
        program: row.program_text().trim().to_string(),
        episode: row.episode_text().trim().to_string(),
        duration: row.duration_text().trim().to_string(),
        viewers: parse_count(row.viewers_text()),
    }
}

#[cfg(test)]
mod tests {
    use tvrank_core::TableVariant;

    use super::*;

    #[test]
    fn strips_rank_marker_and_thousands_separators() {
        assert_eq!(parse_count("#12.345"), Some(12_345));
        assert_eq!(parse_count("12,345"), Some(12_345));
        assert_eq!(parse_count("1.234.567"), Some(1_234_567));
    }

    #[test]
    fn strips_non_breaking_spaces() {
        assert_eq!(parse_count("12\u{a0}345"), Some(12_345));
        assert_eq!(parse_count("\u{a0}512\u{202f}300\u{a0}"), Some(512_300));
    }

    #[test]
    fn trims_surrounding_whitespace() {
        assert_eq!(parse_count("  42 \n"), Some(42));
        assert_eq!(parse_rank(" #7 "), Some(7));
    }

    #[test]
    fn non_numeric_residue_is_none() {
        assert_eq!(parse_count("n/a"), None);
        assert_eq!(parse_count(""), None);
        assert_eq!(parse_count("#"), None);
        assert_eq!(parse_count("12 345"), None);
        assert_eq!(parse_count("-5"), None);
        assert_eq!(parse_rank("1."), Some(1));
        assert_eq!(parse_rank("first"), None);
    }

    #[test]
    fn normalize_detailed_row() {
        let row = RawRow::new(
            vec![
                "#3".into(),
                " Salatut elämät ".into(),
                "Jakso 12".into(),
                "MTV3".into(),
                "0:25".into(),
                "512.300".into(),
            ],
            TableVariant::Detailed,
        );
        let fragment = normalize_row(&row, "MTV Katsomo");
        assert_eq!(fragment.source_rank, Some(3));
        assert_eq!(fragment.service, "MTV Katsomo");
        assert_eq!(fragment.program, "Salatut elämät");
        assert_eq!(fragment.episode, "Jakso 12");
        assert_eq!(fragment.duration, "0:25");
        assert_eq!(fragment.viewers, Some(512_300));
    }

    #[test]
    fn bad_viewer_cell_only_affects_its_row() {
        let good = RawRow::new(
            vec!["1".into(), "A".into(), "x".into(), "0:10".into(), "100".into()],
            TableVariant::Detailed,
        );
        let bad = RawRow::new(
            vec!["2".into(), "B".into(), "x".into(), "0:10".into(), "–".into()],
            TableVariant::Detailed,
        );
        assert_eq!(normalize_row(&good, "S").viewers, Some(100));
        assert_eq!(normalize_row(&bad, "S").viewers, None);
        assert_eq!(normalize_row(&bad, "S").source_rank, Some(2));
    }

    #[test]
    fn simplified_row_has_empty_episode_and_duration() {
        let row = RawRow::new(
            vec!["1".into(), "Uutiset".into(), "1.200".into()],
            TableVariant::Simplified,
        );
        let fragment = normalize_row(&row, "Yle Areena");
        assert_eq!(fragment.program, "Uutiset");
        assert_eq!(fragment.episode, "");
        assert_eq!(fragment.duration, "");
        assert_eq!(fragment.viewers, Some(1_200));
    }
}
