//! Projects aggregation results into chart options.
//!
//! Values become `f64` here; they are display values and all arithmetic is already done.

mod option;

pub use option::{
    AreaStyle, Axis, AxisData, AxisType, ChartOption, Emphasis, ItemStyle, Legend, PieSlice,
    Series, SeriesData, SeriesType, Title, Tooltip, Trigger,
};

use crate::aggregate::{CategoryBreakdown, DailyCumulative, MonthlyPivot, TOTAL};
use rust_decimal::prelude::ToPrimitive;
use rust_decimal::Decimal;
use std::collections::BTreeMap;

/// Series colors for the daily chart, one per calendar month starting with January.
pub const MONTH_PALETTE: [&str; 12] = [
    "#ADD8E6", // light blue
    "#90EE90", // light green
    "#FFB6C1", // light pink
    "#FFD700", // gold
    "#D3D3D3", // light gray
    "#FFA07A", // light salmon
    "#E6E6FA", // lavender
    "#F0E68C", // khaki
    "#DDA0DD", // plum
    "#B0E0E6", // powder blue
    "#FFDEAD", // navajo white
    "#98FB98", // pale green
];

/// The x-axis of the daily chart covers every possible day number.
const LAST_DAY: u32 = 31;

fn to_f64(d: Decimal) -> f64 {
    d.to_f64().unwrap_or_default()
}

/// A pie chart with one slice per category of the selected month.
pub fn category_pie(breakdown: &CategoryBreakdown) -> ChartOption {
    let month = match breakdown.year {
        Some(year) => format!("{} {year}", breakdown.month.name()),
        None => breakdown.month.name().to_string(),
    };
    let total = format_num::format_num!(",.2", to_f64(breakdown.total));
    let slices = breakdown
        .categories
        .iter()
        .map(|c| PieSlice {
            name: c.category.clone(),
            value: to_f64(c.sum),
        })
        .collect();

    ChartOption {
        title: Title {
            text: "Spending by category".to_string(),
            subtext: Some(format!("Total for {month}: {total}")),
            left: Some("center".to_string()),
        },
        tooltip: Tooltip {
            trigger: Trigger::Item,
            formatter: None,
        },
        legend: Legend {
            orient: Some("vertical".to_string()),
            left: Some("left".to_string()),
            ..Legend::default()
        },
        series: vec![Series {
            name: "Spending".to_string(),
            series_type: SeriesType::Pie,
            radius: Some("50%".to_string()),
            area_style: None,
            emphasis: Some(Emphasis {
                item_style: ItemStyle {
                    shadow_blur: 10,
                    shadow_offset_x: 0,
                    shadow_color: "rgba(0, 0, 0, 0.5)".to_string(),
                },
            }),
            data: SeriesData::Slices(slices),
        }],
        ..ChartOption::default()
    }
}

/// A line chart with one series per category plus `Total`. Only `Total` is initially visible;
/// the legend toggles the others.
pub fn monthly_evolution(pivot: &MonthlyPivot) -> ChartOption {
    let mut series: Vec<Series> = pivot
        .categories
        .iter()
        .enumerate()
        .map(|(ix, name)| {
            let values = pivot.rows.iter().map(|r| to_f64(r.values[ix])).collect();
            Series::line(name, SeriesData::Values(values))
        })
        .collect();
    let totals = pivot.rows.iter().map(|r| to_f64(r.total)).collect();
    series.push(Series::line(TOTAL, SeriesData::Values(totals)));

    let names: Vec<String> = series.iter().map(|s| s.name.clone()).collect();
    let selected: BTreeMap<String, bool> = names
        .iter()
        .map(|name| (name.clone(), name == TOTAL))
        .collect();

    ChartOption {
        title: Title {
            text: "Monthly evolution".to_string(),
            ..Title::default()
        },
        tooltip: Tooltip {
            trigger: Trigger::Axis,
            formatter: None,
        },
        legend: Legend {
            data: Some(names),
            selected: Some(selected),
            ..Legend::default()
        },
        x_axis: Some(Axis::category(AxisData::Labels(pivot.labels()))),
        y_axis: Some(Axis::value()),
        series,
        color: None,
    }
}

/// An area chart with one cumulative series per month. Each series is colored by its calendar
/// month, so March is always the same color whatever the year or the set of months shown.
pub fn daily_evolution(months: &[DailyCumulative]) -> ChartOption {
    let series: Vec<Series> = months
        .iter()
        .map(|m| {
            let points = m
                .points
                .iter()
                .map(|p| (p.day, to_f64(p.cumulative)))
                .collect();
            Series {
                area_style: Some(AreaStyle {}),
                ..Series::line(m.month.label(), SeriesData::Points(points))
            }
        })
        .collect();
    let color = months
        .iter()
        .map(|m| month_color(m.month.month()).to_string())
        .collect();

    ChartOption {
        title: Title {
            text: "Daily evolution".to_string(),
            ..Title::default()
        },
        tooltip: Tooltip {
            trigger: Trigger::Axis,
            formatter: Some("{b0}: {c0}".to_string()),
        },
        legend: Legend {
            data: Some(series.iter().map(|s| s.name.clone()).collect()),
            ..Legend::default()
        },
        x_axis: Some(Axis {
            boundary_gap: Some(false),
            ..Axis::category(AxisData::Numbers((0..=LAST_DAY).collect()))
        }),
        y_axis: Some(Axis::value()),
        series,
        color: Some(color),
    }
}

/// The palette color of a calendar month, `1..=12`.
pub fn month_color(month: u32) -> &'static str {
    MONTH_PALETTE[(month.saturating_sub(1) % 12) as usize]
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::aggregate::tests::{example_table, table};
    use crate::aggregate::{daily_cumulative, month_category_totals, monthly_pivot};
    use chrono::Month;
    use serde_json::json;

    #[test]
    fn test_category_pie() {
        let breakdown = month_category_totals(&example_table(), Month::January, None);
        let option = category_pie(&breakdown);
        assert_eq!(
            option.title.subtext.as_deref(),
            Some("Total for January: 22.00")
        );
        let json = serde_json::to_value(&option).unwrap();
        assert_eq!(
            json["series"][0]["data"],
            json!([{"name": "Food", "value": 15.0}, {"name": "Transport", "value": 7.0}])
        );
        assert_eq!(json["series"][0]["type"], "pie");
        assert_eq!(json["series"][0]["radius"], "50%");
        assert_eq!(json["legend"]["orient"], "vertical");
        assert!(json.get("xAxis").is_none());
    }

    #[test]
    fn test_category_pie_with_year_and_thousands() {
        let t = table(&[("2024-02-01 10:00:00", "Rent", "1234.5")]);
        let option = category_pie(&month_category_totals(&t, Month::February, Some(2024)));
        assert_eq!(
            option.title.subtext.as_deref(),
            Some("Total for February 2024: 1,234.50")
        );
    }

    #[test]
    fn test_monthly_evolution() {
        let option = monthly_evolution(&monthly_pivot(&example_table()));
        let names: Vec<&str> = option.series.iter().map(|s| s.name.as_str()).collect();
        assert_eq!(names, vec!["Food", "Transport", "Total"]);
        assert_eq!(
            option.series[2].data,
            SeriesData::Values(vec![22.0])
        );
        let selected = option.legend.selected.unwrap();
        assert_eq!(selected.get("Total"), Some(&true));
        assert_eq!(selected.get("Food"), Some(&false));
        assert_eq!(
            option.x_axis.unwrap().data,
            Some(AxisData::Labels(vec!["Jan 24".to_string()]))
        );
    }

    #[test]
    fn test_monthly_series_match_axis_length() {
        let t = table(&[
            ("2024-01-01 10:00:00", "A", "1"),
            ("2024-02-01 10:00:00", "B", "2"),
            ("2024-04-01 10:00:00", "A", "3"),
        ]);
        let option = monthly_evolution(&monthly_pivot(&t));
        for series in &option.series {
            assert_eq!(series.data.len(), 3);
        }
    }

    #[test]
    fn test_daily_evolution() {
        let option = daily_evolution(&daily_cumulative(&example_table()));
        assert_eq!(option.series.len(), 1);
        assert_eq!(
            option.series[0].data,
            SeriesData::Points(vec![(5, 10.0), (10, 17.0), (20, 22.0)])
        );
        assert!(option.series[0].area_style.is_some());
        assert_eq!(option.color, Some(vec![MONTH_PALETTE[0].to_string()]));
        match option.x_axis.unwrap().data {
            Some(AxisData::Numbers(days)) => {
                assert_eq!(days.first(), Some(&0));
                assert_eq!(days.last(), Some(&31));
                assert_eq!(days.len(), 32);
            }
            other => panic!("unexpected axis data {other:?}"),
        }
    }

    #[test]
    fn test_daily_colors_follow_calendar_month() {
        let t = table(&[
            ("2023-03-01 10:00:00", "A", "1"),
            ("2024-01-01 10:00:00", "A", "1"),
            ("2024-03-01 10:00:00", "A", "1"),
        ]);
        let option = daily_evolution(&daily_cumulative(&t));
        let march = month_color(3).to_string();
        let january = month_color(1).to_string();
        assert_eq!(option.color, Some(vec![march.clone(), january, march]));
    }

    #[test]
    fn test_month_color_wraps() {
        assert_eq!(month_color(1), "#ADD8E6");
        assert_eq!(month_color(12), "#98FB98");
    }
}
