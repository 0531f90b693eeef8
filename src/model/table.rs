use crate::error::Res;
use crate::model::record::Column;
use crate::model::ExpenseRecord;
use anyhow::{bail, Context};
use serde::{Deserialize, Serialize};
use std::collections::hash_map::DefaultHasher;
use std::collections::{BTreeSet, HashSet};
use std::hash::{Hash, Hasher};
use tracing::warn;

/// What to do with a row that cannot be parsed into an `ExpenseRecord`.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MalformedPolicy {
    /// Log a warning and leave the row out of every aggregation. The row is still written back,
    /// untouched, when the table is persisted.
    #[default]
    Skip,
    /// Fail the whole load.
    Fail,
}

serde_plain::derive_display_from_serialize!(MalformedPolicy);
serde_plain::derive_fromstr_from_deserialize!(MalformedPolicy);

/// A row that could not be parsed, kept verbatim.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct MalformedRow {
    /// The 1-based row number in the sheet (the header is row 1).
    line: usize,
    cells: Vec<String>,
    reason: String,
}

impl MalformedRow {
    pub fn line(&self) -> usize {
        self.line
    }

    pub fn cells(&self) -> &[String] {
        &self.cells
    }

    pub fn reason(&self) -> &str {
        &self.reason
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
enum Row {
    Record(ExpenseRecord),
    Malformed(MalformedRow),
}

/// An immutable snapshot of every row of the expenses sheet, in sheet order.
///
/// There is no primary key and no uniqueness constraint. The table is always loaded in full and
/// written back in full, so it also remembers a fingerprint of the rows it was loaded from; the
/// store compares it against the live sheet before overwriting.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ExpenseTable {
    headers: Vec<String>,
    rows: Vec<Row>,
    fingerprint: u64,
}

impl Default for ExpenseTable {
    fn default() -> Self {
        let headers = default_headers();
        let fingerprint = fingerprint(&[headers.clone()]);
        Self {
            headers,
            rows: Vec::new(),
            fingerprint,
        }
    }
}

impl ExpenseTable {
    /// Parses the raw rows of a sheet. The first row is the header. An empty sheet yields an empty
    /// table with the default header.
    pub fn parse(sheet_data: Vec<Vec<String>>, policy: MalformedPolicy) -> Res<Self> {
        let fingerprint = fingerprint(&sheet_data);
        let mut rows = sheet_data.into_iter();
        let mut headers = match rows.next() {
            Some(header_row) if !is_blank(&header_row) => trim_trailing_empty(header_row),
            _ => {
                return Ok(Self {
                    fingerprint,
                    ..Self::default()
                })
            }
        };
        check_headers(&mut headers)?;

        // Cells past the last named header belong to unlabeled columns. Pad the header so that
        // every cell has a position to round-trip through.
        let rows: Vec<Vec<String>> = rows.collect();
        let width = rows
            .iter()
            .filter_map(|row| row.iter().rposition(|c| !c.is_empty()))
            .map(|last| last + 1)
            .max()
            .unwrap_or_default();
        if headers.len() < width {
            headers.resize(width, String::new());
        }

        let mut parsed = Vec::new();
        for (ix, cells) in rows.into_iter().enumerate() {
            let line = ix + 2;
            if is_blank(&cells) {
                parsed.push(Row::Malformed(MalformedRow {
                    line,
                    cells,
                    reason: "blank row".to_string(),
                }));
                continue;
            }
            let cells = trim_trailing_empty(cells);
            match ExpenseRecord::from_cells(&headers, &cells) {
                Ok(record) => parsed.push(Row::Record(record)),
                Err(e) => match policy {
                    MalformedPolicy::Fail => {
                        return Err(e).with_context(|| format!("Unable to parse row {line}"))
                    }
                    MalformedPolicy::Skip => {
                        warn!("Skipping row {line}: {e:#}");
                        parsed.push(Row::Malformed(MalformedRow {
                            line,
                            cells,
                            reason: format!("{e:#}"),
                        }));
                    }
                },
            }
        }

        Ok(Self {
            headers,
            rows: parsed,
            fingerprint,
        })
    }

    /// Returns a new table with `record` appended. The fingerprint is that of the rows the new
    /// table serializes to.
    pub(crate) fn append(mut self, record: ExpenseRecord) -> Self {
        self.rows.push(Row::Record(record));
        self.fingerprint = fingerprint(&self.to_rows());
        self
    }

    /// The header row followed by every row, both parsed and malformed, in sheet order.
    pub fn to_rows(&self) -> Vec<Vec<String>> {
        let mut rows = Vec::with_capacity(self.rows.len() + 1);
        rows.push(self.headers.clone());
        rows.extend(self.rows.iter().map(|row| match row {
            Row::Record(record) => record.to_cells(&self.headers),
            Row::Malformed(malformed) => malformed.cells.clone(),
        }));
        rows
    }

    pub fn headers(&self) -> &[String] {
        &self.headers
    }

    /// Every parsed record, in sheet order.
    pub fn records(&self) -> impl Iterator<Item = &ExpenseRecord> {
        self.rows.iter().filter_map(|row| match row {
            Row::Record(record) => Some(record),
            Row::Malformed(_) => None,
        })
    }

    pub fn malformed(&self) -> impl Iterator<Item = &MalformedRow> {
        self.rows.iter().filter_map(|row| match row {
            Row::Malformed(malformed) => Some(malformed),
            Row::Record(_) => None,
        })
    }

    /// The number of data rows, malformed ones included.
    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    /// The distinct categories present in the table, sorted.
    pub fn categories(&self) -> BTreeSet<&str> {
        self.records().map(ExpenseRecord::category).collect()
    }

    /// The last `n` records, oldest first.
    pub fn tail(&self, n: usize) -> Vec<&ExpenseRecord> {
        let records: Vec<&ExpenseRecord> = self.records().collect();
        let start = records.len().saturating_sub(n);
        records[start..].to_vec()
    }

    pub(crate) fn fingerprint(&self) -> u64 {
        self.fingerprint
    }
}

fn default_headers() -> Vec<String> {
    Column::ALL.iter().map(|c| c.header().to_string()).collect()
}

/// Validates the header row: the insert date, category and value columns must be present, and no
/// header may repeat. A missing comments column is appended.
fn check_headers(headers: &mut Vec<String>) -> Res<()> {
    let mut seen = HashSet::new();
    for header in headers.iter() {
        let key = header.trim().to_lowercase();
        if !key.is_empty() && !seen.insert(key) {
            bail!("Encountered a duplicate header '{header}'");
        }
    }
    for column in [Column::InsertDate, Column::Category, Column::Value] {
        if !headers.iter().any(|h| Column::of(h) == Some(column)) {
            bail!("The header row is missing the '{}' column", column.header());
        }
    }
    if !headers.iter().any(|h| Column::of(h) == Some(Column::Comments)) {
        headers.push(Column::Comments.header().to_string());
    }
    Ok(())
}

fn is_blank(cells: &[String]) -> bool {
    cells.iter().all(|c| c.trim().is_empty())
}

fn trim_trailing_empty(mut cells: Vec<String>) -> Vec<String> {
    while cells.last().is_some_and(|c| c.is_empty()) {
        cells.pop();
    }
    cells
}

/// Hashes sheet rows in the shape the Sheets API returns them: trailing empty cells and trailing
/// empty rows do not count.
pub(crate) fn fingerprint(rows: &[Vec<String>]) -> u64 {
    let mut normalized: Vec<Vec<&str>> = rows
        .iter()
        .map(|row| {
            let mut cells: Vec<&str> = row.iter().map(String::as_str).collect();
            while cells.last().is_some_and(|c| c.is_empty()) {
                cells.pop();
            }
            cells
        })
        .collect();
    while normalized.last().is_some_and(|r| r.is_empty()) {
        normalized.pop();
    }
    let mut hasher = DefaultHasher::new();
    normalized.hash(&mut hasher);
    hasher.finish()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::Amount;
    use chrono::NaiveDateTime;
    use std::str::FromStr;

    fn sheet(rows: &[&[&str]]) -> Vec<Vec<String>> {
        rows.iter()
            .map(|r| r.iter().map(|s| s.to_string()).collect())
            .collect()
    }

    fn sample() -> Vec<Vec<String>> {
        sheet(&[
            &["Insert_date", "Category", "Value", "Comments"],
            &["2024-01-05 09:00:00", "Food", "10.00", ""],
            &["2024-01-20 19:30:00", "Food", "5.00", "dinner"],
            &["2024-01-10 08:15:00", "Transport", "7.00"],
        ])
    }

    #[test]
    fn test_parse() {
        let table = ExpenseTable::parse(sample(), MalformedPolicy::Skip).unwrap();
        assert_eq!(table.len(), 3);
        assert_eq!(table.records().count(), 3);
        assert_eq!(
            table.categories().into_iter().collect::<Vec<_>>(),
            vec!["Food", "Transport"]
        );
    }

    #[test]
    fn test_parse_empty_sheet() {
        let table = ExpenseTable::parse(Vec::new(), MalformedPolicy::Skip).unwrap();
        assert!(table.is_empty());
        assert_eq!(table.headers(), default_headers().as_slice());
    }

    #[test]
    fn test_parse_missing_required_header() {
        let data = sheet(&[&["Insert_date", "Category", "Comments"]]);
        let err = ExpenseTable::parse(data, MalformedPolicy::Skip).unwrap_err();
        assert!(err.to_string().contains("'Value'"));
    }

    #[test]
    fn test_parse_duplicate_header() {
        let data = sheet(&[&["Insert_date", "Category", "Value", "category"]]);
        assert!(ExpenseTable::parse(data, MalformedPolicy::Skip).is_err());
    }

    #[test]
    fn test_missing_comments_column_is_added() {
        let data = sheet(&[
            &["Insert_date", "Category", "Value"],
            &["2024-01-05 09:00:00", "Food", "10.00"],
        ]);
        let table = ExpenseTable::parse(data, MalformedPolicy::Skip).unwrap();
        assert_eq!(table.headers().last().unwrap(), "Comments");
        assert_eq!(table.to_rows()[1].len(), 4);
    }

    #[test]
    fn test_malformed_rows_are_skipped_but_kept() {
        let mut data = sample();
        data.insert(2, sheet(&[&["2024-01-06 09:00:00", "Food", "None", ""]]).remove(0));
        let table = ExpenseTable::parse(data, MalformedPolicy::Skip).unwrap();
        assert_eq!(table.len(), 4);
        assert_eq!(table.records().count(), 3);
        let malformed: Vec<&MalformedRow> = table.malformed().collect();
        assert_eq!(malformed.len(), 1);
        assert_eq!(malformed[0].line(), 3);
        assert!(malformed[0].reason().contains("None"));
        // The bad row is written back untouched, in place.
        assert_eq!(table.to_rows()[2][2], "None");
    }

    #[test]
    fn test_malformed_rows_fail() {
        let mut data = sample();
        data.push(sheet(&[&["not a date", "Food", "1", ""]]).remove(0));
        let err = ExpenseTable::parse(data, MalformedPolicy::Fail).unwrap_err();
        assert!(err.to_string().contains("row 5"));
    }

    #[test]
    fn test_unlabeled_column_round_trips() {
        let mut data = sample();
        data.push(sheet(&[&["2024-01-05 09:00:00", "Food", "1", "", "paid cash"]]).remove(0));
        let table = ExpenseTable::parse(data.clone(), MalformedPolicy::Fail).unwrap();
        assert_eq!(table.records().count(), 4);
        assert_eq!(table.headers().len(), 5);
        assert_eq!(table.headers()[4], "");

        let rows = table.to_rows();
        assert_eq!(rows[4][4], "paid cash");
        assert_eq!(fingerprint(&rows), fingerprint(&data));
        let again = ExpenseTable::parse(rows, MalformedPolicy::Fail).unwrap();
        assert_eq!(again, table);
    }

    #[test]
    fn test_trailing_blank_headers() {
        // A rectangular range: the header is padded with empty cells, as are short rows.
        let data = sheet(&[
            &["Insert_date", "Category", "Value", "Comments", "", ""],
            &["2024-01-05 09:00:00", "Food", "10.00", "", "", ""],
            &["2024-01-06 09:00:00", "Food", "2.00", "snack", "", ""],
        ]);
        let table = ExpenseTable::parse(data.clone(), MalformedPolicy::Fail).unwrap();
        assert_eq!(table.records().count(), 2);
        assert_eq!(table.headers(), default_headers().as_slice());
        assert_eq!(fingerprint(&table.to_rows()), fingerprint(&data));
    }

    #[test]
    fn test_blank_header_between_columns() {
        let data = sheet(&[
            &["Insert_date", "", "Category", "Value", "", "Comments"],
            &["2024-01-05 09:00:00", "a", "Food", "10.00", "b", "lunch"],
            &["2024-01-06 09:00:00", "", "Food", "2.00", "c"],
        ]);
        let table = ExpenseTable::parse(data.clone(), MalformedPolicy::Fail).unwrap();
        let records: Vec<&ExpenseRecord> = table.records().collect();
        assert_eq!(records[0].comments(), "lunch");
        assert_eq!(records[0].other_fields().len(), 2);
        assert_eq!(records[1].other_fields().len(), 1);

        let rows = table.to_rows();
        assert_eq!(rows[0], data[0]);
        assert_eq!(rows[1], data[1]);
        assert_eq!(fingerprint(&rows), fingerprint(&data));
    }

    #[test]
    fn test_wide_malformed_row_is_skipped() {
        let mut data = sample();
        data.push(sheet(&[&["not a date", "Food", "1", "", "extra"]]).remove(0));
        let table = ExpenseTable::parse(data, MalformedPolicy::Skip).unwrap();
        assert_eq!(table.malformed().count(), 1);
        assert_eq!(table.to_rows()[4][4], "extra");
    }

    #[test]
    fn test_append() {
        let table = ExpenseTable::parse(sample(), MalformedPolicy::Skip).unwrap();
        let before = table.fingerprint();
        let ts = NaiveDateTime::from_str("2024-02-01T12:00:00").unwrap();
        let record =
            ExpenseRecord::new(ts, "Health", Amount::from_str("20").unwrap(), "pharmacy").unwrap();
        let table = table.append(record.clone());
        assert_eq!(table.len(), 4);
        assert_eq!(table.records().last().unwrap(), &record);
        assert_ne!(table.fingerprint(), before);
        assert_eq!(table.fingerprint(), fingerprint(&table.to_rows()));
    }

    #[test]
    fn test_tail() {
        let table = ExpenseTable::parse(sample(), MalformedPolicy::Skip).unwrap();
        let tail = table.tail(2);
        assert_eq!(tail.len(), 2);
        assert_eq!(tail[1].category(), "Transport");
        assert_eq!(table.tail(10).len(), 3);
    }

    #[test]
    fn test_fingerprint_ignores_trailing_empties() {
        let a = sheet(&[&["a", "b", ""], &["c"]]);
        let b = sheet(&[&["a", "b"], &["c", "", ""], &[]]);
        assert_eq!(fingerprint(&a), fingerprint(&b));
        let c = sheet(&[&["a", "b"], &["d"]]);
        assert_ne!(fingerprint(&a), fingerprint(&c));
    }

    #[test]
    fn test_rows_round_trip() {
        let table = ExpenseTable::parse(sample(), MalformedPolicy::Skip).unwrap();
        let again = ExpenseTable::parse(table.to_rows(), MalformedPolicy::Skip).unwrap();
        assert_eq!(
            table.records().collect::<Vec<_>>(),
            again.records().collect::<Vec<_>>()
        );
        assert_eq!(table.fingerprint(), again.fingerprint());
    }

    #[test]
    fn test_policy_display() {
        assert_eq!(MalformedPolicy::Skip.to_string(), "skip");
        assert_eq!(
            "fail".parse::<MalformedPolicy>().unwrap(),
            MalformedPolicy::Fail
        );
    }
}
