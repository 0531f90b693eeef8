//! Local JSON backups of the sheet, taken before every full-table overwrite.

use crate::error::Res;
use crate::model::ExpenseTable;
use crate::{utils, Config};
use anyhow::Context;
use chrono::Local;
use serde::Serialize;
use std::path::PathBuf;

/// Prefix for the snapshot saved just before appending a record.
pub const PRE_APPEND: &str = "pre-append";

const EXTENSION: &str = "json";

/// Manages backup file creation and rotation.
#[derive(Debug, Clone)]
pub struct Backup {
    backups_dir: PathBuf,
    backup_copies: u32,
    sheet_name: String,
}

/// What a backup file holds: the raw rows, header first, exactly as they will be written back.
#[derive(Serialize)]
struct Snapshot<'a> {
    sheet_name: &'a str,
    rows: Vec<Vec<String>>,
}

impl Backup {
    pub fn new(config: &Config) -> Self {
        Self {
            backups_dir: config.backups().to_path_buf(),
            backup_copies: config.backup_copies(),
            sheet_name: config.sheet_name().to_string(),
        }
    }

    /// Saves `table` as `{prefix}.YYYY-MM-DD-NNN.json`, where NNN is a per-day sequence number,
    /// then deletes the oldest files so that only `backup_copies` remain.
    ///
    /// Returns the path to the created backup file.
    pub async fn save_json(&self, prefix: &str, table: &ExpenseTable) -> Res<PathBuf> {
        let date = Local::now().format("%Y-%m-%d").to_string();
        let seq = self.next_sequence_number(prefix, &date).await?;
        let path = self
            .backups_dir
            .join(format!("{prefix}.{date}-{seq:03}.{EXTENSION}"));

        let snapshot = Snapshot {
            sheet_name: &self.sheet_name,
            rows: table.to_rows(),
        };
        let json = serde_json::to_string_pretty(&snapshot)
            .context("Failed to serialize the sheet snapshot to JSON")?;
        utils::write(&path, json).await?;

        self.rotate(prefix).await?;
        Ok(path)
    }

    async fn backup_file_names(&self, prefix: &str) -> Res<Vec<(PathBuf, String)>> {
        let mut files = Vec::new();
        let mut dir = utils::read_dir(&self.backups_dir).await?;
        while let Some(entry) = dir
            .next_entry()
            .await
            .context("Failed to read directory entry")?
        {
            let name = entry.file_name().to_string_lossy().to_string();
            if is_backup_file(&name, prefix) {
                files.push((entry.path(), name));
            }
        }
        Ok(files)
    }

    async fn next_sequence_number(&self, prefix: &str, date: &str) -> Res<u32> {
        let max = self
            .backup_file_names(prefix)
            .await?
            .iter()
            .filter_map(|(_, name)| parse_sequence_number(name, prefix, date))
            .max()
            .unwrap_or(0);
        Ok(max + 1)
    }

    async fn rotate(&self, prefix: &str) -> Res<()> {
        let mut files = self.backup_file_names(prefix).await?;
        // Sequence numbers outgrow their padding after 999 saves in a day, so compare parsed keys.
        files.sort_by(|a, b| backup_key(&a.1, prefix).cmp(&backup_key(&b.1, prefix)));
        let to_delete = files.len().saturating_sub(self.backup_copies as usize);
        for (path, _) in files.into_iter().take(to_delete) {
            utils::remove_file(&path).await?;
        }
        Ok(())
    }
}

/// Splits `{prefix}.{date}-{NNN}.json` into its date and sequence number.
fn backup_key<'a>(filename: &'a str, prefix: &str) -> Option<(&'a str, u32)> {
    let (date, seq) = filename
        .strip_prefix(prefix)?
        .strip_prefix('.')?
        .strip_suffix(&format!(".{EXTENSION}"))?
        .rsplit_once('-')?;
    Some((date, seq.parse().ok()?))
}

/// Parses NNN out of `{prefix}.{date}-{NNN}.json`.
fn parse_sequence_number(filename: &str, prefix: &str, date: &str) -> Option<u32> {
    backup_key(filename, prefix)
        .filter(|(d, _)| *d == date)
        .map(|(_, seq)| seq)
}

fn is_backup_file(filename: &str, prefix: &str) -> bool {
    filename.starts_with(&format!("{prefix}.")) && filename.ends_with(&format!(".{EXTENSION}"))
}
