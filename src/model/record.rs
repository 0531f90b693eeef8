use crate::error::Res;
use crate::model::{Amount, YearMonth};
use anyhow::{bail, Context};
use chrono::{Datelike, NaiveDate, NaiveDateTime, Timelike};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::str::FromStr;

/// Header of the column holding the moment the record was entered.
pub const INSERT_DATE: &str = "Insert_date";
/// Header of the category column.
pub const CATEGORY: &str = "Category";
/// Header of the amount column.
pub const VALUE: &str = "Value";
/// Header of the free-text comments column.
pub const COMMENTS: &str = "Comments";

/// The format used when writing `inserted_at` to the sheet.
pub const TIMESTAMP_FORMAT: &str = "%Y-%m-%d %H:%M:%S";

/// Formats accepted when reading `inserted_at`, tried in order.
const READ_FORMATS: &[&str] = &[
    TIMESTAMP_FORMAT,
    "%Y-%m-%dT%H:%M:%S",
    "%Y-%m-%d %H:%M:%S%.f",
    "%Y-%m-%dT%H:%M:%S%.f",
    "%Y-%m-%d %H:%M",
    "%Y/%m/%d %H:%M:%S",
];

/// One logged expense.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub struct ExpenseRecord {
    /// When the record was entered, not when the money was spent.
    inserted_at: NaiveDateTime,
    category: String,
    value: Amount,
    comments: String,
    /// Cells from columns this program does not know about, keyed by header. Kept so that a
    /// full-table rewrite does not lose them.
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    other_fields: BTreeMap<String, String>,
}

impl ExpenseRecord {
    /// Creates a record. The category is trimmed and must not be empty; `inserted_at` is truncated
    /// to whole seconds, the precision the sheet stores.
    pub fn new(
        inserted_at: NaiveDateTime,
        category: impl Into<String>,
        value: Amount,
        comments: impl Into<String>,
    ) -> Res<Self> {
        let category = category.into().trim().to_string();
        if category.is_empty() {
            bail!("The category of an expense cannot be empty");
        }
        Ok(Self {
            inserted_at: inserted_at.with_nanosecond(0).unwrap_or(inserted_at),
            category,
            value,
            comments: comments.into(),
            other_fields: BTreeMap::new(),
        })
    }

    pub fn inserted_at(&self) -> NaiveDateTime {
        self.inserted_at
    }

    pub fn category(&self) -> &str {
        &self.category
    }

    pub fn value(&self) -> Amount {
        self.value
    }

    pub fn comments(&self) -> &str {
        &self.comments
    }

    pub fn other_fields(&self) -> &BTreeMap<String, String> {
        &self.other_fields
    }

    pub fn year_month(&self) -> YearMonth {
        YearMonth::of(&self.inserted_at)
    }

    /// Day of the month, `1..=31`.
    pub fn day(&self) -> u32 {
        self.inserted_at.day()
    }

    /// Builds a record from a row of cells. `headers` gives the name of each cell position.
    /// Missing trailing cells are treated as empty, which is how the Sheets API returns them.
    pub(crate) fn from_cells(headers: &[String], cells: &[String]) -> Res<Self> {
        let mut inserted_at = None;
        let mut category = None;
        let mut value = None;
        let mut comments = String::new();
        let mut other_fields = BTreeMap::new();

        for (ix, header) in headers.iter().enumerate() {
            let cell = cells.get(ix).map(String::as_str).unwrap_or_default();
            match Column::of(header) {
                Some(Column::InsertDate) => inserted_at = Some(parse_timestamp(cell)?),
                Some(Column::Category) => category = Some(cell.to_string()),
                Some(Column::Value) => {
                    value = Some(
                        Amount::from_str(cell)
                            .with_context(|| format!("Invalid value in column '{header}'"))?,
                    )
                }
                Some(Column::Comments) => comments = cell.to_string(),
                None if cell.is_empty() => {}
                None => {
                    other_fields.insert(field_key(ix, header), cell.to_string());
                }
            }
        }

        let inserted_at = inserted_at.context("The insert date column is missing")?;
        let category = category.context("The category column is missing")?;
        let value = value.context("The value column is missing")?;
        let mut record = ExpenseRecord::new(inserted_at, category, value, comments)?;
        record.other_fields = other_fields;
        Ok(record)
    }

    /// Given the order of the `headers`, converts this record to cells in that order.
    pub(crate) fn to_cells(&self, headers: &[String]) -> Vec<String> {
        headers
            .iter()
            .enumerate()
            .map(|(ix, header)| match Column::of(header) {
                Some(Column::InsertDate) => self.inserted_at.format(TIMESTAMP_FORMAT).to_string(),
                Some(Column::Category) => self.category.clone(),
                Some(Column::Value) => self.value.to_string(),
                Some(Column::Comments) => self.comments.clone(),
                None => self
                    .other_fields
                    .get(&field_key(ix, header))
                    .cloned()
                    .unwrap_or_default(),
            })
            .collect()
    }
}

/// The `other_fields` key of the cell at `ix`. Cells under a blank header are keyed by their
/// 1-based column position.
fn field_key(ix: usize, header: &str) -> String {
    if header.trim().is_empty() {
        format!("#{}", ix + 1)
    } else {
        header.to_string()
    }
}

/// The columns this program understands.
#[derive(Debug, Clone, Copy, Eq, PartialEq)]
pub(crate) enum Column {
    InsertDate,
    Category,
    Value,
    Comments,
}

impl Column {
    pub(crate) const ALL: [Column; 4] = [
        Column::InsertDate,
        Column::Category,
        Column::Value,
        Column::Comments,
    ];

    /// Matches a header case-insensitively, ignoring surrounding whitespace.
    pub(crate) fn of(header: &str) -> Option<Column> {
        let header = header.trim();
        Column::ALL
            .into_iter()
            .find(|c| c.header().eq_ignore_ascii_case(header))
    }

    pub(crate) fn header(&self) -> &'static str {
        match self {
            Column::InsertDate => INSERT_DATE,
            Column::Category => CATEGORY,
            Column::Value => VALUE,
            Column::Comments => COMMENTS,
        }
    }
}

/// Parses the `inserted_at` cell. A bare date is taken as midnight.
pub fn parse_timestamp(s: &str) -> Res<NaiveDateTime> {
    let s = s.trim();
    if s.is_empty() {
        bail!("The insert date is empty");
    }
    for format in READ_FORMATS {
        if let Ok(ts) = NaiveDateTime::parse_from_str(s, format) {
            return Ok(ts);
        }
    }
    if let Ok(date) = NaiveDate::parse_from_str(s, "%Y-%m-%d") {
        return Ok(date.and_time(chrono::NaiveTime::MIN));
    }
    bail!("'{s}' is not a recognized date-time")
}
