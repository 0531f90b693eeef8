//! Implements the `Sheet` trait using in-memory data for testing purposes.
//!
//! Note: this is compiled even in the "production" version of this app so that we can run the whole
//! app, top-to-bottom, without using Google Sheets. Data lives in a process-wide map keyed by
//! spreadsheet ID, so separate `TestSheet` instances for the same ID see each other's writes.

use crate::api::Sheet;
use crate::config::DEFAULT_SHEET_NAME;
use crate::error::Res;
use anyhow::{anyhow, Context};
use std::collections::hash_map::Entry;
use std::collections::HashMap;
use std::io::Cursor;
use std::sync::{Mutex, OnceLock};

/// The tabs of one spreadsheet: tab name to rows.
pub(crate) type TestSheetState = HashMap<String, Vec<Vec<String>>>;

static SPREADSHEETS: OnceLock<Mutex<HashMap<String, TestSheetState>>> = OnceLock::new();

/// An implementation of the `Sheet` trait that does not use Google sheets. A spreadsheet that has
/// not been touched yet is seeded with some existing data.
pub(crate) struct TestSheet {
    spreadsheet_id: String,
}

impl TestSheet {
    pub(crate) fn new(spreadsheet_id: impl Into<String>) -> Self {
        Self {
            spreadsheet_id: spreadsheet_id.into(),
        }
    }

    #[cfg(test)]
    pub(crate) fn get_state(&self) -> Res<TestSheetState> {
        self.with_state(|state| state.clone())
    }

    #[cfg(test)]
    pub(crate) fn set_state(&self, new_state: TestSheetState) -> Res<()> {
        self.with_state(|state| *state = new_state)
    }

    fn with_state<T>(&self, f: impl FnOnce(&mut TestSheetState) -> T) -> Res<T> {
        let mut spreadsheets = SPREADSHEETS
            .get_or_init(|| Mutex::new(HashMap::new()))
            .lock()
            .map_err(|_| anyhow!("The test sheet state lock is poisoned"))?;
        let state = match spreadsheets.entry(self.spreadsheet_id.clone()) {
            Entry::Occupied(entry) => entry.into_mut(),
            Entry::Vacant(entry) => entry.insert(default_data()?),
        };
        Ok(f(state))
    }
}

#[async_trait::async_trait]
impl Sheet for TestSheet {
    async fn get(&mut self, sheet_name: &str) -> Res<Vec<Vec<String>>> {
        self.with_state(|state| state.get(sheet_name).cloned())?
            .with_context(|| format!("Sheet '{sheet_name}' not found"))
    }

    /// Stores `rows` the way the Sheets API would hand them back: without trailing empty cells or
    /// trailing empty rows.
    async fn replace(&mut self, sheet_name: &str, rows: &[Vec<String>]) -> Res<()> {
        let mut stored: Vec<Vec<String>> = rows
            .iter()
            .map(|row| {
                let mut row = row.clone();
                while row.last().is_some_and(|c| c.is_empty()) {
                    row.pop();
                }
                row
            })
            .collect();
        while stored.last().is_some_and(|r| r.is_empty()) {
            stored.pop();
        }
        self.with_state(|state| state.insert(sheet_name.to_string(), stored))?;
        Ok(())
    }
}

/// Provides the seed data from this module.
fn default_data() -> Res<TestSheetState> {
    let mut map = HashMap::new();
    map.insert(DEFAULT_SHEET_NAME.to_string(), load_csv(EXPENSE_DATA)?);
    Ok(map)
}

/// Loads data from a CSV-formatted string.
fn load_csv(csv_data: &str) -> Res<Vec<Vec<String>>> {
    let mut rdr = csv::ReaderBuilder::new()
        .has_headers(false)
        .flexible(true)
        .from_reader(Cursor::new(csv_data.as_bytes()));

    let mut rows: Vec<Vec<String>> = Vec::new();
    for result in rdr.records() {
        let record = result.context("Unable to read CSV seed data")?;
        rows.push(record.iter().map(|field| field.to_string()).collect());
    }
    Ok(rows)
}

/// Seed expense data.
const EXPENSE_DATA: &str = r##"Insert_date,Category,Value,Comments
2025-08-02 09:14:03,Groceries,54.20,Weekly shop
2025-08-05 19:40:11,Restaurants,32.50,
2025-08-09 08:02:45,Transport,2.40,Bus
2025-08-09 12:30:00,Groceries,18.75,
2025-08-17 21:05:59,Utilities,61.00,Electricity
2025-08-28 10:10:10,Restaurants,14.90,Lunch
2025-09-01 07:55:20,Transport,45.00,Monthly pass
2025-09-03 18:22:37,Groceries,71.35,
2025-09-12 13:00:00,Restaurants,27.80,
2025-09-12 20:45:09,Groceries,9.99,Bakery
2025-09-20 11:11:11,Utilities,58.40,Electricity
2025-10-01 08:00:00,Transport,45.00,Monthly pass
2025-10-04 17:35:42,Groceries,63.10,
2025-10-11 14:20:05,Leisure,25.00,Cinema
2025-10-11 22:10:00,Restaurants,41.60,Dinner out
"##;
