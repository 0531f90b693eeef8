//! One refresh cycle's worth of output: every chart plus the most recent records.

use crate::aggregate::{daily_cumulative, month_category_totals, monthly_pivot};
use crate::chart::{self, ChartOption};
use crate::model::{ExpenseRecord, ExpenseTable};
use chrono::Month;
use serde::Serialize;

/// How many records the recent-entries list shows.
pub const RECENT_COUNT: usize = 5;

#[derive(Debug, Clone, Serialize)]
pub struct Dashboard {
    pub categories: ChartOption,
    pub monthly: ChartOption,
    pub daily: ChartOption,
    pub recent: Vec<ExpenseRecord>,
}

impl Dashboard {
    /// Runs the three pipelines over `table` and projects them. `month` and `year` select the
    /// month shown by the category chart.
    pub fn build(table: &ExpenseTable, month: Month, year: Option<i32>) -> Self {
        let breakdown = month_category_totals(table, month, year);
        let pivot = monthly_pivot(table);
        let daily = daily_cumulative(table);
        Self {
            categories: chart::category_pie(&breakdown),
            monthly: chart::monthly_evolution(&pivot),
            daily: chart::daily_evolution(&daily),
            recent: table.tail(RECENT_COUNT).into_iter().cloned().collect(),
        }
    }
}
