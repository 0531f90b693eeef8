use crate::commands::Out;
use crate::error::{ErrorType, IntoResult};
use crate::{Config, Result};
use anyhow::Context;
use std::path::Path;

/// Creates the home directory, its subdirectories and:
/// - Creates an initial `config.json` file using `sheet_url` along with default settings
/// - Moves `service_account` into its default location in the home directory.
///
/// # Arguments
/// - `expenses_home` - The directory that will be the root of the home directory, e.g.
///   `$HOME/expenses`
/// - `service_account` - The JSON key of a Google service account that can edit the sheet. The
///   file is moved, not copied, so the key does not linger in e.g. a downloads folder.
/// - `sheet_url` - The URL of the Google Sheet where the expenses are stored.
///   e.g. https://docs.google.com/spreadsheets/d/1a7Km9FxQwRbPt82JvN4LzYpH5OcGnWsT6iDuE3VhMjX
/// - `sheet_name` - The tab holding the expenses.
///
/// # Errors
/// - Returns an error if any file operations fail.
pub async fn init(
    expenses_home: &Path,
    service_account: &Path,
    sheet_url: &str,
    sheet_name: &str,
) -> Result<Out<()>> {
    let config = Config::create(expenses_home, service_account, sheet_url, sheet_name)
        .await
        .context("Unable to create the home directory and configs")
        .pub_result(ErrorType::Config)?;
    Ok(format!(
        "Successfully created the expenses directory at {}",
        config.root().display()
    )
    .into())
}
