//! Spreadsheet serialization of a result set.

use rust_xlsxwriter::{Format, Workbook, XlsxError};
use tvrank_core::ResultSet;

use crate::shape::{FullRow, FULL_COLUMNS};

/// Renders `result` as an `.xlsx` workbook: one sheet, one bold header row
/// with [`FULL_COLUMNS`], then one row per record in rank order.
///
/// # Errors
///
/// Returns [`XlsxError`] if the workbook cannot be written.
pub fn build_workbook(result: &ResultSet) -> Result<Vec<u8>, XlsxError> {
    let mut workbook = Workbook::new();
    let header = Format::new().set_bold();

    {
        let sheet = workbook.add_worksheet();
        for (col, name) in (0u16..).zip(FULL_COLUMNS) {
            sheet.write_string_with_format(0, col, name, &header)?;
        }

        for (row, record) in (1u32..).zip(&result.records) {
            let line = FullRow::from(record);
            sheet.write_string(row, 0, &line.date)?;
            sheet.write_number(row, 1, f64::from(line.rank))?;
            sheet.write_string(row, 2, line.service)?;
            sheet.write_string(row, 3, line.program)?;
            sheet.write_string(row, 4, line.episode)?;
            sheet.write_string(row, 5, line.duration)?;
            #[allow(clippy::cast_precision_loss)]
            let viewers = line.viewers as f64;
            sheet.write_number(row, 6, viewers)?;
        }
    }

    workbook.save_to_buffer()
}

#[cfg(test)]
mod tests {
    use chrono::NaiveDate;
    use tvrank_core::ViewershipRecord;

    use super::*;

    fn result_set(n: u32) -> ResultSet {
        let date = NaiveDate::from_ymd_opt(2024, 5, 1).unwrap();
        ResultSet {
            group: "14d".to_string(),
            run_date: date,
            records: (1..=n)
                .map(|rank| ViewershipRecord {
                    rank,
                    service: "Yle Areena".to_string(),
                    program: format!("Ohjelma {rank}"),
                    episode: String::new(),
                    duration: "0:30".to_string(),
                    viewers: u64::from(1000 - rank),
                    date,
                })
                .collect(),
        }
    }

    #[test]
    fn produces_a_zip_container() {
        let bytes = build_workbook(&result_set(3)).expect("workbook should build");
        assert!(bytes.len() > 100);
        assert_eq!(&bytes[..2], b"PK", "xlsx files are zip archives");
    }

    #[test]
    fn header_only_workbook_builds() {
        let bytes = build_workbook(&result_set(0)).expect("workbook should build");
        assert_eq!(&bytes[..2], b"PK");
    }
}
