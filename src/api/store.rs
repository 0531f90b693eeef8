//! Implements the `Store` trait on top of any `Sheet`.

use crate::api::{Sheet, Store};
use crate::backup::{Backup, PRE_APPEND};
use crate::error::IntoResult;
use crate::model::{fingerprint, ExpenseRecord, ExpenseTable, MalformedPolicy};
use crate::{Config, Error, ErrorType, Result};
use anyhow::anyhow;
use tracing::{debug, info, trace};

/// Loads the expenses tab into an `ExpenseTable` and writes it back in full.
pub(crate) struct SheetStore {
    sheet: Box<dyn Sheet + Send>,
    sheet_name: String,
    policy: MalformedPolicy,
    backup: Backup,
}

impl SheetStore {
    /// Create a new `SheetStore` that will use a dynamically-dispatched `sheet` to get and send
    /// its data.
    pub(crate) fn new(sheet: Box<dyn Sheet + Send>, config: &Config) -> Self {
        Self {
            sheet,
            sheet_name: config.sheet_name().to_string(),
            policy: config.malformed_rows(),
            backup: config.backup(),
        }
    }
}

#[async_trait::async_trait]
impl Store for SheetStore {
    async fn load_all(&mut self) -> Result<ExpenseTable> {
        trace!("Loading the '{}' sheet", self.sheet_name);
        let rows = self
            .sheet
            .get(&self.sheet_name)
            .await
            .pub_result(ErrorType::StoreUnavailable)?;
        let table = ExpenseTable::parse(rows, self.policy).pub_result(ErrorType::MalformedRecord)?;
        debug!(
            "Loaded {} records ({} malformed rows) from '{}'",
            table.records().count(),
            table.malformed().count(),
            self.sheet_name
        );
        Ok(table)
    }

    async fn append_and_persist(
        &mut self,
        table: ExpenseTable,
        record: ExpenseRecord,
    ) -> Result<ExpenseTable> {
        let current = self
            .sheet
            .get(&self.sheet_name)
            .await
            .pub_result(ErrorType::StoreUnavailable)?;
        if fingerprint(&current) != table.fingerprint() {
            return Err(Error::new(
                ErrorType::Conflict,
                anyhow!(
                    "The '{}' sheet changed after it was loaded, reload it and try again",
                    self.sheet_name
                ),
            ));
        }

        let backup_path = self
            .backup
            .save_json(PRE_APPEND, &table)
            .await
            .pub_result(ErrorType::Internal)?;
        debug!("Saved a backup of the sheet to {}", backup_path.display());

        let table = table.append(record);
        let rows = table.to_rows();
        self.sheet
            .replace(&self.sheet_name, &rows)
            .await
            .pub_result(ErrorType::StoreUnavailable)?;
        info!("Wrote {} rows to '{}'", rows.len(), self.sheet_name);
        Ok(table)
    }
}
