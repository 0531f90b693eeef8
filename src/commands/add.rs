use crate::api::Mode;
use crate::commands::Out;
use crate::dashboard::RECENT_COUNT;
use crate::form::{category_choices, ExpenseForm};
use crate::model::ExpenseRecord;
use crate::{Config, Result};
use chrono::Local;
use serde::Serialize;
use tracing::debug;

/// What `add` returns: the new record and the most recent records after the append.
#[derive(Debug, Clone, Serialize)]
pub struct Added {
    pub record: ExpenseRecord,
    pub recent: Vec<ExpenseRecord>,
}

/// Loads the table, builds a record from `form` stamped with the current local time, appends it
/// and writes the table back.
pub async fn add(config: &Config, mode: Mode, form: ExpenseForm) -> Result<Out<Added>> {
    let mut store = crate::api::store(config, mode).await?;
    let table = store.load_all().await?;
    let choices = category_choices(&table);
    debug!("Available categories: {choices:?}");

    let record = form.submit(&choices, Local::now().naive_local())?;
    let table = store.append_and_persist(table, record.clone()).await?;

    let added = Added {
        recent: table.tail(RECENT_COUNT).into_iter().cloned().collect(),
        record,
    };
    let message = format!(
        "Added {} {} to '{}'",
        added.record.category(),
        added.record.value(),
        config.sheet_name()
    );
    Ok(Out::new(message, added))
}
