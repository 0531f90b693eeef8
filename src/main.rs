use clap::Parser;
use expense_dashboard::args::{Args, ChartArgs, Command};
use expense_dashboard::commands::{self, ReportRequest};
use expense_dashboard::form::ExpenseForm;
use expense_dashboard::{Mode, Result};
use std::process::ExitCode;
use std::time::Duration;
use tracing::{debug, error, trace};
use tracing_subscriber::filter::LevelFilter;
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() -> ExitCode {
    let args = Args::parse();
    let log_level = args.common().log_level();
    init_logger(log_level);
    debug!("Log level set to {}", log_level.to_string().to_lowercase());

    match main_inner(args).await {
        Ok(_) => ExitCode::SUCCESS,
        Err(e) => {
            error!("Exiting with error: {e}");
            ExitCode::FAILURE
        }
    }
}

pub async fn main_inner(args: Args) -> Result<()> {
    trace!("{args:?}");
    let home = args.common().expenses_home().path();

    // This allows for testing the program without hitting the Google APIs. When
    // EXPENSES_IN_TEST_MODE is set and non-zero in length, then the mode will be Mode::Testing,
    // otherwise it will be Mode::Google.
    let mode = Mode::from_env();

    // Route to appropriate command handler
    let _: () = match args.command() {
        Command::Init(init_args) => commands::init(
            home,
            init_args.service_account(),
            init_args.sheet_url(),
            init_args.sheet_name(),
        )
        .await?
        .print(),

        Command::Add(add_args) => {
            let config = commands::load_config(home).await?;
            let form = ExpenseForm {
                category: add_args.category().map(str::to_string),
                new_category: add_args.new_category().map(str::to_string),
                value: add_args.value(),
                comments: add_args.comments().to_string(),
            };
            let out = commands::add(&config, mode, form).await?;
            out.print();
            if let Some(added) = out.structure() {
                for record in &added.recent {
                    println!(
                        "{} | {} | {} | {}",
                        record.inserted_at(),
                        record.category(),
                        record.value(),
                        record.comments()
                    );
                }
            }
        }

        Command::Categories => {
            let config = commands::load_config(home).await?;
            let out = commands::categories(&config, mode).await?;
            out.print();
            for category in out.structure().into_iter().flatten() {
                println!("{category}");
            }
        }

        Command::Recent(recent_args) => {
            let config = commands::load_config(home).await?;
            commands::recent(&config, mode, recent_args.count())
                .await?
                .print()
        }

        Command::Report(report_args) => {
            let config = commands::load_config(home).await?;
            commands::report(
                &config,
                mode,
                report_request(report_args.chart()),
                report_args.output(),
            )
            .await?
            .print()
        }

        Command::Watch(watch_args) => {
            let config = commands::load_config(home).await?;
            commands::watch(
                &config,
                mode,
                report_request(watch_args.chart()),
                watch_args.output(),
                Duration::from_secs(watch_args.interval_secs()),
            )
            .await?
            .print()
        }
    };
    Ok(())
}

fn report_request(chart: &ChartArgs) -> ReportRequest {
    ReportRequest {
        chart: chart.chart(),
        month: chart.month(),
        year: chart.year(),
    }
}

/// Initializes the tracing subscriber.
pub fn init_logger(level: LevelFilter) {
    let filter = match std::env::var("RUST_LOG").ok() {
        Some(_) => {
            // RUST_LOG exists; use it.
            EnvFilter::from_default_env()
        }
        None => {
            // RUST_LOG does not exist; use default log level for this crate only.
            EnvFilter::new(format!(
                "{}={},{}={}",
                env!("CARGO_CRATE_NAME"),
                level,
                env!("CARGO_PKG_NAME").replace('-', "_"),
                level
            ))
        }
    };

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();
}
