use crate::aggregate::{daily_cumulative, month_category_totals, monthly_pivot};
use crate::api::Mode;
use crate::commands::{current_month, ChartKind, Out};
use crate::dashboard::Dashboard;
use crate::error::{ErrorType, IntoResult};
use crate::model::ExpenseTable;
use crate::{chart, utils, Config, Result};
use anyhow::Context;
use chrono::Month;
use std::path::{Path, PathBuf};
use tracing::debug;

/// What to render.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ReportRequest {
    pub chart: ChartKind,
    /// The month of the category chart. Defaults to the current month.
    pub month: Option<Month>,
    /// Restricts the category chart to one year. When absent the month is matched in every year.
    pub year: Option<i32>,
}

impl ReportRequest {
    fn month(&self) -> Month {
        self.month.unwrap_or_else(current_month)
    }
}

/// Runs one refresh cycle and writes the chart JSON to `output`, or prints it to stdout when
/// `output` is `None`.
pub async fn report(
    config: &Config,
    mode: Mode,
    request: ReportRequest,
    output: Option<&Path>,
) -> Result<Out<Option<PathBuf>>> {
    let json = refresh(config, mode, request).await?;
    match output {
        Some(path) => {
            utils::write(path, json)
                .await
                .pub_result(ErrorType::Internal)?;
            Ok(Out::new(
                format!("Wrote the {} chart to {}", request.chart, path.display()),
                Some(path.to_path_buf()),
            ))
        }
        None => {
            println!("{json}");
            Ok(Out::new(format!("Rendered the {} chart", request.chart), None))
        }
    }
}

/// Loads the table and renders the requested chart as pretty JSON.
pub(super) async fn refresh(config: &Config, mode: Mode, request: ReportRequest) -> Result<String> {
    let table = crate::api::store(config, mode).await?.load_all().await?;
    debug!(
        "Rendering {} from {} records",
        request.chart,
        table.records().count()
    );
    render(&table, request).pub_result(ErrorType::Internal)
}

fn render(table: &ExpenseTable, request: ReportRequest) -> anyhow::Result<String> {
    let value = match request.chart {
        ChartKind::All => {
            serde_json::to_value(Dashboard::build(table, request.month(), request.year))
        }
        ChartKind::Categories => serde_json::to_value(chart::category_pie(
            &month_category_totals(table, request.month(), request.year),
        )),
        ChartKind::Monthly => serde_json::to_value(chart::monthly_evolution(&monthly_pivot(table))),
        ChartKind::Daily => serde_json::to_value(chart::daily_evolution(&daily_cumulative(table))),
    }
    .context("Unable to serialize the chart")?;
    serde_json::to_string_pretty(&value).context("Unable to serialize the chart")
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test::TestEnv;
    use serde_json::Value;

    fn request(chart: ChartKind) -> ReportRequest {
        ReportRequest {
            chart,
            month: Some(Month::September),
            year: Some(2025),
        }
    }

    #[tokio::test]
    async fn test_report_categories() {
        let env = TestEnv::new().await;
        let json = refresh(&env.config(), Mode::Testing, request(ChartKind::Categories))
            .await
            .unwrap();
        let value: Value = serde_json::from_str(&json).unwrap();
        assert_eq!(value["title"]["subtext"], "Total for September 2025: 212.54");
        // Groceries 81.34, Utilities 58.40, Transport 45.00, Restaurants 27.80
        assert_eq!(value["series"][0]["data"][0]["name"], "Groceries");
        assert_eq!(value["series"][0]["data"][3]["name"], "Restaurants");
    }

    #[tokio::test]
    async fn test_report_all_to_file() {
        let env = TestEnv::new().await;
        let path = env.config().root().join("dashboard.json");
        let out = report(
            &env.config(),
            Mode::Testing,
            request(ChartKind::All),
            Some(&path),
        )
        .await
        .unwrap();
        assert_eq!(out.structure(), Some(&Some(path.clone())));

        let value: Value = serde_json::from_str(&utils::read(&path).await.unwrap()).unwrap();
        for key in ["categories", "monthly", "daily", "recent"] {
            assert!(value.get(key).is_some(), "missing {key}");
        }
        assert_eq!(value["monthly"]["xAxis"]["data"], serde_json::json!(["Aug 25", "Sep 25", "Oct 25"]));
        assert_eq!(value["daily"]["series"].as_array().unwrap().len(), 3);
        assert_eq!(value["recent"].as_array().unwrap().len(), 5);
    }

    #[tokio::test]
    async fn test_report_daily() {
        let env = TestEnv::new().await;
        let json = refresh(&env.config(), Mode::Testing, request(ChartKind::Daily))
            .await
            .unwrap();
        let value: Value = serde_json::from_str(&json).unwrap();
        // October: 45.00 on the 1st, 63.10 on the 4th, 25.00 + 41.60 on the 11th.
        assert_eq!(
            value["series"][2]["data"],
            serde_json::json!([[1, 45.0], [4, 108.1], [11, 174.7]])
        );
    }
}
