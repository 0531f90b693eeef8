//! Service account authentication for the Google Sheets API.

use crate::error::Res;
use anyhow::Context;
use std::path::Path;
use tracing::debug;
use yup_oauth2::{ServiceAccountAuthenticator, ServiceAccountKey};

/// When set and non-empty, holds the service account key JSON and takes precedence over the key
/// file in the home directory.
pub const SERVICE_ACCOUNT_ENV: &str = "EXPENSES_SERVICE_ACCOUNT_JSON";

const OAUTH_SCOPES: &[&str] = &["https://www.googleapis.com/auth/spreadsheets"];

/// Exchanges a service account key for access tokens.
pub(crate) struct TokenProvider {
    key: ServiceAccountKey,
}

impl TokenProvider {
    /// Loads the key from `SERVICE_ACCOUNT_ENV` if present, otherwise from `path`.
    pub(crate) async fn load(path: &Path) -> Res<Self> {
        let key = match std::env::var(SERVICE_ACCOUNT_ENV) {
            Ok(blob) if !blob.trim().is_empty() => {
                yup_oauth2::parse_service_account_key(blob).with_context(|| {
                    format!("Unable to parse the service account key in {SERVICE_ACCOUNT_ENV}")
                })?
            }
            _ => yup_oauth2::read_service_account_key(path)
                .await
                .with_context(|| {
                    format!(
                        "Unable to read the service account key at {}",
                        path.display()
                    )
                })?,
        };
        debug!("Using service account {}", key.client_email);
        Ok(Self { key })
    }

    /// Returns a fresh access token.
    pub(crate) async fn token(&self) -> Res<String> {
        let auth = ServiceAccountAuthenticator::builder(self.key.clone())
            .build()
            .await
            .context("Failed to create the service account authenticator")?;
        let token = auth
            .token(OAUTH_SCOPES)
            .await
            .context("Failed to obtain an access token for the service account")?;
        token
            .token()
            .map(str::to_string)
            .context("The token response did not include an access token")
    }
}
