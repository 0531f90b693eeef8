//! Logs personal expenses to a Google sheet and projects them into dashboard charts.
//!
//! The sheet is the only store. Every command loads it in full into an `ExpenseTable`, runs the
//! aggregation pipelines in `aggregate` and turns their results into chart options with `chart`.

pub mod aggregate;
mod api;
pub mod args;
mod backup;
pub mod chart;
pub mod commands;
mod config;
pub mod dashboard;
mod error;
pub mod form;
pub mod model;
mod utils;


pub use api::{Mode, SERVICE_ACCOUNT_ENV, TEST_MODE_ENV};
pub use config::{Config, DEFAULT_SHEET_NAME};
pub use error::{Error, ErrorType, Result};
