use crate::api::Mode;
use crate::commands::report::refresh;
use crate::commands::{Out, ReportRequest};
use crate::error::{ErrorType, IntoResult};
use crate::{utils, Config, Error, Result};
use anyhow::anyhow;
use std::future::Future;
use std::path::Path;
use std::time::Duration;
use tokio::time::MissedTickBehavior;
use tracing::{debug, error, info};

/// Re-renders the chart into `output` every `interval` until Ctrl-C is pressed. The first cycle
/// runs immediately.
///
/// A failed cycle is logged and the file keeps its previous contents; the next tick tries again.
pub async fn watch(
    config: &Config,
    mode: Mode,
    request: ReportRequest,
    output: &Path,
    interval: Duration,
) -> Result<Out<u64>> {
    if interval.is_zero() {
        return Err(Error::new(
            ErrorType::Request,
            anyhow!("The refresh interval must be greater than zero"),
        ));
    }
    info!(
        "Refreshing {} every {}s, press Ctrl-C to stop",
        output.display(),
        interval.as_secs()
    );
    let stop = async {
        if let Err(e) = tokio::signal::ctrl_c().await {
            error!("Unable to listen for Ctrl-C: {e}");
        }
    };
    let cycles = run(config, mode, request, output, interval, stop).await;
    Ok(Out::new(
        format!("Stopped after {cycles} refresh cycles"),
        cycles,
    ))
}

/// Runs refresh cycles until `stop` completes. Cycles never overlap: a slow cycle delays the next
/// tick instead of causing a burst.
async fn run(
    config: &Config,
    mode: Mode,
    request: ReportRequest,
    output: &Path,
    interval: Duration,
    stop: impl Future<Output = ()>,
) -> u64 {
    let mut ticker = tokio::time::interval(interval);
    ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);
    tokio::pin!(stop);

    let mut cycles = 0;
    loop {
        tokio::select! {
            _ = &mut stop => break,
            _ = ticker.tick() => {
                cycles += 1;
                match cycle(config, mode, request, output).await {
                    Ok(()) => debug!("Refresh cycle {cycles} wrote {}", output.display()),
                    Err(e) => error!("Refresh cycle {cycles} failed: {e}"),
                }
            }
        }
    }
    cycles
}

async fn cycle(config: &Config, mode: Mode, request: ReportRequest, output: &Path) -> Result<()> {
    let json = refresh(config, mode, request).await?;
    utils::write(output, json)
        .await
        .pub_result(ErrorType::Internal)
}
