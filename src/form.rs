//! The ingestion form: turns what the user typed into an `ExpenseRecord`.

use crate::aggregate::TOTAL;
use crate::error::IntoResult;
use crate::model::{Amount, ExpenseRecord, ExpenseTable};
use crate::{Error, ErrorType, Result};
use anyhow::anyhow;
use chrono::NaiveDateTime;
use std::collections::BTreeSet;

/// The categories the user can pick from: every distinct category in the table, sorted.
pub fn category_choices(table: &ExpenseTable) -> BTreeSet<String> {
    table.categories().into_iter().map(str::to_string).collect()
}

/// The values of the form's input fields.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ExpenseForm {
    /// The category picked from the existing ones.
    pub category: Option<String>,
    /// Free text that, when not blank, replaces `category`. This is how a new category is created.
    pub new_category: Option<String>,
    pub value: Option<Amount>,
    pub comments: String,
}

impl ExpenseForm {
    /// The category the record will get: the trimmed override when it is not blank, otherwise the
    /// selection.
    pub fn resolved_category(&self) -> Option<&str> {
        let new_category = self
            .new_category
            .as_deref()
            .map(str::trim)
            .filter(|s| !s.is_empty());
        new_category.or_else(|| self.category.as_deref().map(str::trim))
    }

    /// Builds the record to append, stamped with `now`.
    ///
    /// The selection must be one of the `choices` unless it is overridden. A new category may not
    /// be named like the monthly chart's `Total` series. The value must be present; zero and
    /// negative values are accepted.
    pub fn submit(
        &self,
        choices: &BTreeSet<String>,
        now: NaiveDateTime,
    ) -> Result<ExpenseRecord> {
        let overridden = self
            .new_category
            .as_deref()
            .is_some_and(|s| !s.trim().is_empty());
        let category = self
            .resolved_category()
            .filter(|c| !c.is_empty())
            .ok_or_else(|| request_error("A category is required"))?;
        if overridden && category.eq_ignore_ascii_case(TOTAL) {
            return Err(request_error(format!(
                "'{category}' is reserved for the monthly total and cannot be a category"
            )));
        }
        if !overridden && !choices.contains(category) {
            return Err(request_error(format!(
                "'{category}' is not an existing category, use a new category to create it"
            )));
        }
        let value = self
            .value
            .ok_or_else(|| request_error("A value is required"))?;
        ExpenseRecord::new(now, category, value, self.comments.as_str())
            .pub_result(ErrorType::Request)
    }
}

fn request_error(message: impl Into<String>) -> Error {
    Error::new(ErrorType::Request, anyhow!(message.into()))
}
