//! Error types.
//!
//! Internally the crate uses `anyhow` (see `Res`) so that every failure carries a chain of
//! context. At the boundary of a command the error is classified with an `ErrorType` so callers can
//! tell a store outage from a bad request.

use serde::{Deserialize, Serialize};
use std::fmt::{Display, Formatter};

/// The internal result type.
pub(crate) type Res<T> = std::result::Result<T, anyhow::Error>;

/// The public result type.
pub type Result<T> = std::result::Result<T, Error>;

/// Broad classification of what went wrong.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ErrorType {
    /// The configuration directory or file is missing or invalid.
    Config,
    /// The service account credential could not be loaded or exchanged for a token.
    Auth,
    /// A read or write against the remote sheet failed.
    StoreUnavailable,
    /// The remote sheet changed between the read and the write.
    Conflict,
    /// A row could not be parsed into an expense record.
    MalformedRecord,
    /// The request itself was invalid, e.g. a missing value.
    Request,
    /// Anything else.
    Internal,
}

serde_plain::derive_display_from_serialize!(ErrorType);
serde_plain::derive_fromstr_from_deserialize!(ErrorType);

/// The public error type: an `anyhow::Error` tagged with an `ErrorType`.
#[derive(Debug)]
pub struct Error {
    error_type: ErrorType,
    inner: anyhow::Error,
}

impl Error {
    pub fn new(error_type: ErrorType, inner: impl Into<anyhow::Error>) -> Self {
        Self {
            error_type,
            inner: inner.into(),
        }
    }

    pub fn error_type(&self) -> ErrorType {
        self.error_type
    }

    pub fn inner(&self) -> &anyhow::Error {
        &self.inner
    }
}

impl Display for Error {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}: {:#}", self.error_type, self.inner)
    }
}

impl std::error::Error for Error {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        self.inner.source()
    }
}

impl From<anyhow::Error> for Error {
    fn from(inner: anyhow::Error) -> Self {
        Self::new(ErrorType::Internal, inner)
    }
}

/// Converts any result into the public `Result` with the given `ErrorType`.
pub(crate) trait IntoResult<T> {
    fn pub_result(self, error_type: ErrorType) -> Result<T>;
}

impl<T, E> IntoResult<T> for std::result::Result<T, E>
where
    E: Into<anyhow::Error>,
{
    fn pub_result(self, error_type: ErrorType) -> Result<T> {
        self.map_err(|e| Error::new(error_type, e))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use anyhow::Context;

    #[test]
    fn test_pub_result_keeps_context() {
        let res: Res<()> = Err(anyhow::anyhow!("connection reset")).context("Failed to read sheet");
        let err = res.pub_result(ErrorType::StoreUnavailable).unwrap_err();
        assert_eq!(err.error_type(), ErrorType::StoreUnavailable);
        let message = err.to_string();
        assert!(message.starts_with("store_unavailable: "));
        assert!(message.contains("Failed to read sheet"));
        assert!(message.contains("connection reset"));
    }

    #[test]
    fn test_from_anyhow_is_internal() {
        let err: Error = anyhow::anyhow!("boom").into();
        assert_eq!(err.error_type(), ErrorType::Internal);
    }

    #[test]
    fn test_error_type_from_str() {
        let t: ErrorType = "malformed_record".parse().unwrap();
        assert_eq!(t, ErrorType::MalformedRecord);
        assert_eq!(ErrorType::Conflict.to_string(), "conflict");
    }
}
