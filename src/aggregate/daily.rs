use crate::model::{ExpenseTable, YearMonth};
use rust_decimal::Decimal;
use serde::Serialize;
use std::collections::BTreeMap;

/// The spend of one day and the running total of its month up to and including that day.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct DailyPoint {
    pub day: u32,
    pub total: Decimal,
    pub cumulative: Decimal,
}

/// The cumulative daily series of one month.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct DailyCumulative {
    pub month: YearMonth,
    /// Only days with records appear, in ascending order. A day without records is not repeated
    /// with the previous cumulative value.
    pub points: Vec<DailyPoint>,
}

impl DailyCumulative {
    /// `(day, cumulative)` pairs.
    pub fn pairs(&self) -> Vec<(u32, Decimal)> {
        self.points.iter().map(|p| (p.day, p.cumulative)).collect()
    }
}

/// Groups the table by month and day and accumulates each month's spend day by day.
/// Months are returned in chronological order.
pub fn daily_cumulative(table: &ExpenseTable) -> Vec<DailyCumulative> {
    let mut days: BTreeMap<YearMonth, BTreeMap<u32, Decimal>> = BTreeMap::new();
    for record in table.records() {
        *days
            .entry(record.year_month())
            .or_default()
            .entry(record.day())
            .or_default() += record.value().decimal();
    }

    days.into_iter()
        .map(|(month, sums)| {
            let mut running = Decimal::ZERO;
            let points = sums
                .into_iter()
                .map(|(day, total)| {
                    running += total;
                    DailyPoint {
                        day,
                        total,
                        cumulative: running,
                    }
                })
                .collect();
            DailyCumulative { month, points }
        })
        .collect()
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
        let series = daily_cumulative(&example_table());
        assert_eq!(series.len(), 1);
        assert_eq!(series[0].month.label(), "Jan 24");
        assert_eq!(
            series[0].pairs(),
            vec![(5, dec("10.00")), (10, dec("17.00")), (20, dec("22.00"))]
        );
    }

    #[test]
    fn test_same_day_is_summed() {
        let t = table(&[
            ("2024-03-02 08:00:00", "Food", "2"),
            ("2024-03-02 20:00:00", "Fun", "3"),
            ("2024-03-01 12:00:00", "Food", "1"),
        ]);
        let series = daily_cumulative(&t);
        assert_eq!(
            series[0].points,
            vec![
                DailyPoint {
                    day: 1,
                    total: dec("1"),
                    cumulative: dec("1"),
                },
                DailyPoint {
                    day: 2,
                    total: dec("5"),
                    cumulative: dec("6"),
                },
            ]
        );
    }

    #[test]
    fn test_months_restart_and_are_ordered() {
        let t = table(&[
            ("2024-02-01 10:00:00", "Food", "4"),
            ("2023-02-01 10:00:00", "Food", "1"),
            ("2024-01-31 10:00:00", "Food", "9"),
        ]);
        let series = daily_cumulative(&t);
        let labels: Vec<String> = series.iter().map(|s| s.month.label()).collect();
        assert_eq!(labels, vec!["Feb 23", "Jan 24", "Feb 24"]);
        assert_eq!(series[2].pairs(), vec![(1, dec("4"))]);
    }

    #[test]
    fn test_non_decreasing_for_non_negative_values() {
        let t = table(&[
            ("2024-04-09 10:00:00", "A", "0"),
            ("2024-04-01 10:00:00", "B", "3.10"),
            ("2024-04-30 10:00:00", "A", "0.01"),
            ("2024-04-15 10:00:00", "C", "12"),
        ]);
        for series in daily_cumulative(&t) {
            for pair in series.points.windows(2) {
                assert!(pair[1].cumulative >= pair[0].cumulative);
            }
        }
    }

    #[test]
    fn test_gaps_are_not_filled() {
        let series = daily_cumulative(&example_table());
        let days: Vec<u32> = series[0].points.iter().map(|p| p.day).collect();
        assert_eq!(days, vec![5, 10, 20]);
    }
}
