use crate::api::Mode;
use crate::commands::Out;
use crate::model::ExpenseRecord;
use crate::{Config, Result};

/// Returns the last `count` records, oldest first.
pub async fn recent(config: &Config, mode: Mode, count: usize) -> Result<Out<Vec<ExpenseRecord>>> {
    let table = crate::api::store(config, mode).await?.load_all().await?;
    let records: Vec<ExpenseRecord> = table.tail(count).into_iter().cloned().collect();
    let lines: Vec<String> = records
        .iter()
        .map(|r| {
            format!(
                "{} | {} | {} | {}",
                r.inserted_at(),
                r.category(),
                r.value(),
                r.comments()
            )
        })
        .collect();
    Ok(Out::new(
        format!("Last {} records:\n{}", records.len(), lines.join("\n")),
        records,
    ))
}
