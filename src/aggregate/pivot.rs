use crate::model::{ExpenseTable, YearMonth};
use rust_decimal::Decimal;
use serde::Serialize;
use std::collections::{BTreeMap, BTreeSet};

/// Name of the synthetic column holding each month's total.
pub const TOTAL: &str = "Total";

/// One month of the pivot. `values` lines up with `MonthlyPivot::categories`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct PivotRow {
    pub month: YearMonth,
    pub values: Vec<Decimal>,
    /// The row-wise sum of `values`.
    pub total: Decimal,
}

impl PivotRow {
    /// The display label of `month`, e.g. `Jan 24`.
    pub fn label(&self) -> String {
        self.month.label()
    }
}

/// Month-by-category sums. Rows are dense: a category without records in a month is an explicit
/// zero.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct MonthlyPivot {
    /// Every category in the table, sorted by name.
    pub categories: Vec<String>,
    /// One row per month that has records, in chronological order.
    pub rows: Vec<PivotRow>,
}

impl MonthlyPivot {
    /// The values of one category across all rows, or of the `Total` column when `category` is
    /// `None`.
    pub fn column(&self, category: Option<&str>) -> Option<Vec<Decimal>> {
        match category {
            None => Some(self.rows.iter().map(|r| r.total).collect()),
            Some(name) => {
                let ix = self.categories.iter().position(|c| c == name)?;
                Some(self.rows.iter().map(|r| r.values[ix]).collect())
            }
        }
    }

    pub fn labels(&self) -> Vec<String> {
        self.rows.iter().map(PivotRow::label).collect()
    }
}

/// Pivots the table into months (rows) by categories (columns) and appends a total per month.
pub fn monthly_pivot(table: &ExpenseTable) -> MonthlyPivot {
    let mut cells: BTreeMap<YearMonth, BTreeMap<&str, Decimal>> = BTreeMap::new();
    let mut categories: BTreeSet<&str> = BTreeSet::new();

    for record in table.records() {
        categories.insert(record.category());
        *cells
            .entry(record.year_month())
            .or_default()
            .entry(record.category())
            .or_default() += record.value().decimal();
    }

    let rows = cells
        .into_iter()
        .map(|(month, sums)| {
            let values: Vec<Decimal> = categories
                .iter()
                .map(|c| sums.get(c).copied().unwrap_or(Decimal::ZERO))
                .collect();
            let total = values.iter().copied().sum();
            PivotRow {
                month,
                values,
                total,
            }
        })
        .collect();

    MonthlyPivot {
        categories: categories.into_iter().map(str::to_string).collect(),
        rows,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::aggregate::tests::{example_table, table};
    use std::str::FromStr;

    fn dec(s: &str) -> Decimal {
        Decimal::from_str(s).unwrap()
    }

    #[test]
    fn test_example() {
        let pivot = monthly_pivot(&example_table());
        assert_eq!(pivot.categories, vec!["Food", "Transport"]);
        assert_eq!(pivot.rows.len(), 1);
        let row = &pivot.rows[0];
        assert_eq!(row.label(), "Jan 24");
        assert_eq!(row.values, vec![dec("15.00"), dec("7.00")]);
        assert_eq!(row.total, dec("22.00"));
    }

    #[test]
    fn test_dense_rows_and_chronological_order() {
        let t = table(&[
            ("2024-02-03 10:00:00", "Rent", "700"),
            ("2023-12-24 10:00:00", "Gifts", "80"),
            ("2024-01-05 10:00:00", "Food", "12.5"),
            ("2024-02-06 10:00:00", "Food", "7.5"),
        ]);
        let pivot = monthly_pivot(&t);
        assert_eq!(pivot.labels(), vec!["Dec 23", "Jan 24", "Feb 24"]);
        assert_eq!(pivot.categories, vec!["Food", "Gifts", "Rent"]);
        for row in &pivot.rows {
            assert_eq!(row.values.len(), pivot.categories.len());
        }
        assert_eq!(
            pivot.column(Some("Food")).unwrap(),
            vec![Decimal::ZERO, dec("12.5"), dec("7.5")]
        );
        assert_eq!(
            pivot.column(None).unwrap(),
            vec![dec("80"), dec("12.5"), dec("707.5")]
        );
        assert!(pivot.column(Some("Travel")).is_none());
    }

    #[test]
    fn test_total_is_row_sum() {
        let t = table(&[
            ("2024-01-01 10:00:00", "A", "1.11"),
            ("2024-01-02 10:00:00", "B", "-2.22"),
            ("2024-02-01 10:00:00", "C", "3.33"),
            ("2024-03-01 10:00:00", "A", "4.44"),
        ]);
        for row in monthly_pivot(&t).rows {
            let sum: Decimal = row.values.iter().copied().sum();
            assert_eq!(row.total, sum);
        }
    }

    #[test]
    fn test_same_month_different_years_are_separate_rows() {
        let t = table(&[
            ("2023-01-01 10:00:00", "A", "1"),
            ("2024-01-01 10:00:00", "A", "2"),
        ]);
        assert_eq!(monthly_pivot(&t).labels(), vec!["Jan 23", "Jan 24"]);
    }

    #[test]
    fn test_idempotent() {
        let t = example_table();
        let before = t.clone();
        assert_eq!(monthly_pivot(&t), monthly_pivot(&t));
        assert_eq!(t, before);
    }

    #[test]
    fn test_empty() {
        let pivot = monthly_pivot(&ExpenseTable::default());
        assert!(pivot.rows.is_empty());
        assert!(pivot.categories.is_empty());
    }
}
