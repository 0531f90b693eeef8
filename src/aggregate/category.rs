use crate::model::ExpenseTable;
use chrono::{Datelike, Month};
use rust_decimal::{Decimal, RoundingStrategy};
use serde::Serialize;
use std::collections::BTreeMap;

/// The summed value of one category.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct CategoryTotal {
    pub category: String,
    /// Rounded to two decimal places after summation.
    pub sum: Decimal,
}

/// Per-category sums for one calendar month.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct CategoryBreakdown {
    pub month: Month,
    /// `None` when records of every year falling in `month` were included.
    pub year: Option<i32>,
    /// The exact, unrounded sum of every included record.
    pub total: Decimal,
    /// Sorted by `sum` descending, then by category name ascending.
    pub categories: Vec<CategoryTotal>,
}

/// Sums the records of `month` by category.
///
/// With `year: None` every record whose calendar month is `month` is included, whatever its year.
pub fn month_category_totals(
    table: &ExpenseTable,
    month: Month,
    year: Option<i32>,
) -> CategoryBreakdown {
    let month_number = month.number_from_month();
    let mut sums: BTreeMap<&str, Decimal> = BTreeMap::new();
    let mut total = Decimal::ZERO;

    for record in table.records().filter(|r| {
        let ts = r.inserted_at();
        ts.month() == month_number && year.map_or(true, |y| ts.year() == y)
    }) {
        let value = record.value().decimal();
        *sums.entry(record.category()).or_default() += value;
        total += value;
    }

    let mut categories: Vec<CategoryTotal> = sums
        .into_iter()
        .map(|(category, sum)| CategoryTotal {
            category: category.to_string(),
            sum: sum.round_dp_with_strategy(2, RoundingStrategy::MidpointNearestEven),
        })
        .collect();
    // The map iterates in name order and the sort is stable, so ties stay alphabetical.
    categories.sort_by(|a, b| b.sum.cmp(&a.sum));

    CategoryBreakdown {
        month,
        year,
        total,
        categories,
    }
}
