//! The record store: a `Sheet` moves raw rows in and out of a spreadsheet tab, and a `Store`
//! turns those rows into an `ExpenseTable` and back.

mod auth;
mod sheet;
mod store;
mod test_sheet;

use crate::error::{IntoResult, Res};
use crate::model::{ExpenseRecord, ExpenseTable};
use crate::{Config, ErrorType, Result};

pub use auth::SERVICE_ACCOUNT_ENV;
pub(crate) use auth::TokenProvider;
pub(crate) use sheet::GoogleSheet;
pub(crate) use store::SheetStore;
pub(crate) use test_sheet::TestSheet;
#[cfg(test)]
pub(crate) use test_sheet::TestSheetState;

/// When this environment variable is set and non-empty, the in-memory test sheet is used instead
/// of Google Sheets.
pub const TEST_MODE_ENV: &str = "EXPENSES_IN_TEST_MODE";

/// Which `Sheet` implementation backs the store.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Mode {
    Google,
    Testing,
}

impl Mode {
    pub fn from_env() -> Self {
        match std::env::var(TEST_MODE_ENV) {
            Ok(value) if !value.is_empty() => Mode::Testing,
            _ => Mode::Google,
        }
    }
}

/// Reads and replaces the raw rows of a spreadsheet tab.
#[async_trait::async_trait]
pub(crate) trait Sheet {
    /// Every row of the tab, header first. Trailing empty cells may be missing.
    async fn get(&mut self, sheet_name: &str) -> Res<Vec<Vec<String>>>;

    /// Overwrites the tab so that it holds exactly `rows`.
    async fn replace(&mut self, sheet_name: &str, rows: &[Vec<String>]) -> Res<()>;
}

/// Loads and persists the expense table.
#[async_trait::async_trait]
pub(crate) trait Store {
    /// Reads the whole table.
    async fn load_all(&mut self) -> Result<ExpenseTable>;

    /// Appends `record` to `table` and writes the whole table back, returning the new snapshot.
    /// Fails with `ErrorType::Conflict` if the sheet no longer matches `table`.
    async fn append_and_persist(
        &mut self,
        table: ExpenseTable,
        record: ExpenseRecord,
    ) -> Result<ExpenseTable>;
}

/// Creates the store for `config`, backed by Google Sheets or by the in-memory test sheet.
pub(crate) async fn store(config: &Config, mode: Mode) -> Result<Box<dyn Store + Send>> {
    let sheet: Box<dyn Sheet + Send> = match mode {
        Mode::Google => {
            let token_provider = TokenProvider::load(&config.service_account_path())
                .await
                .pub_result(ErrorType::Auth)?;
            Box::new(GoogleSheet::new(config.spreadsheet_id(), token_provider))
        }
        Mode::Testing => Box::new(TestSheet::new(config.spreadsheet_id())),
    };
    Ok(Box::new(SheetStore::new(sheet, config)))
}
