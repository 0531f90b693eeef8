use anyhow::bail;
use chrono::{Datelike, Month, NaiveDate, NaiveDateTime};
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use std::fmt::{Display, Formatter};
use std::str::FromStr;

/// A calendar month of a specific year, i.e. a timestamp truncated to year+month granularity.
/// Orders chronologically.
#[derive(Debug, Clone, Copy, Eq, PartialEq, Ord, PartialOrd, Hash)]
pub struct YearMonth {
    year: i32,
    month: u32,
}

impl YearMonth {
    /// Returns `None` unless `month` is in `1..=12`.
    pub fn new(year: i32, month: u32) -> Option<Self> {
        (1..=12).contains(&month).then_some(Self { year, month })
    }

    pub fn of(timestamp: &NaiveDateTime) -> Self {
        Self {
            year: timestamp.year(),
            month: timestamp.month(),
        }
    }

    pub fn year(&self) -> i32 {
        self.year
    }

    /// The month number, `1..=12`.
    pub fn month(&self) -> u32 {
        self.month
    }

    pub fn first_day(&self) -> NaiveDate {
        // Both fields are validated on construction.
        NaiveDate::from_ymd_opt(self.year, self.month, 1).unwrap_or_default()
    }

    /// The display label, abbreviated month and two-digit year, e.g. `Jan 24`.
    pub fn label(&self) -> String {
        self.first_day().format("%b %y").to_string()
    }
}

impl Display for YearMonth {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(f, "{:04}-{:02}", self.year, self.month)
    }
}

impl FromStr for YearMonth {
    type Err = anyhow::Error;

    /// Parses `YYYY-MM`.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let Some((year, month)) = s.trim().split_once('-') else {
            bail!("Expected a year and month like 2024-01, got '{s}'");
        };
        let year: i32 = year.parse()?;
        let month: u32 = month.parse()?;
        match YearMonth::new(year, month) {
            Some(ym) => Ok(ym),
            None => bail!("Month must be between 1 and 12, got {month}"),
        }
    }
}

impl Serialize for YearMonth {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        serializer.serialize_str(&self.to_string())
    }
}

impl<'de> Deserialize<'de> for YearMonth {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        let s = String::deserialize(deserializer)?;
        YearMonth::from_str(&s).map_err(serde::de::Error::custom)
    }
}

/// Parses a month given either as a number `1..=12` or an English name such as `March` or `mar`.
pub fn parse_month(s: &str) -> anyhow::Result<Month> {
    let s = s.trim();
    if let Ok(n) = s.parse::<u8>() {
        return match Month::try_from(n) {
            Ok(month) => Ok(month),
            Err(_) => bail!("Month must be between 1 and 12, got {n}"),
        };
    }
    match Month::from_str(s) {
        Ok(month) => Ok(month),
        Err(_) => bail!("Unrecognized month '{s}'"),
    }
}
