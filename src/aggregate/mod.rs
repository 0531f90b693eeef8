//! The aggregation pipelines. Each is a pure function over an `ExpenseTable` snapshot and only
//! sees the records that parsed cleanly.
mod category;
mod daily;
mod pivot;

pub use category::{month_category_totals, CategoryBreakdown, CategoryTotal};
pub use daily::{daily_cumulative, DailyCumulative, DailyPoint};
pub use pivot::{monthly_pivot, MonthlyPivot, PivotRow, TOTAL};
