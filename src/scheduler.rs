use tokio_util::sync::CancellationToken;
use tracing::{info, warn};

use crate::assembler::assemble;
use crate::config::AppConfig;
use crate::fetch::Transport;
use crate::notifier;
use crate::reporter::build_report;
use crate::wallets::load_wallets;

/// One full pass: load wallets, assemble records, render and dispatch the
/// report. Per-wallet failures never fail the cycle. Returns the report text.
pub async fn run_cycle<T: Transport>(transport: &T, config: &AppConfig) -> String {
    info!("Loading wallets...");
    let wallets = match load_wallets(&config.schedule.wallets_file) {
        Ok(w) => w,
        Err(e) => {
            warn!("{e:#}");
            Vec::new()
        }
    };
    info!("Loaded {} wallet(s)", wallets.len());

    let records = assemble(transport, config, &wallets).await;
    let report = build_report(&records);
    notifier::dispatch(transport, &config.notify, &report).await;
    report
}

/// Repeat cycles separated by the poll interval until `cancel` fires.
///
/// Cancellation is observed between cycles: an in-flight cycle finishes, and a
/// pending sleep is cut short without starting another cycle. With `run_once`
/// set, exactly one cycle runs.
pub async fn run<T: Transport>(transport: &T, config: &AppConfig, cancel: CancellationToken) {
    if config.schedule.run_once {
        run_cycle(transport, config).await;
        return;
    }

    let interval = config.schedule.poll_interval();
    info!(
        "Starting loop. Interval: {}s. Log mode: {}.",
        interval.as_secs(),
        config.notify.mode
    );

    loop {
        run_cycle(transport, config).await;

        tokio::select! {
            biased;
            _ = cancel.cancelled() => {
                info!("Stopped by user");
                break;
            }
            _ = tokio::time::sleep(interval) => {}
        }
    }
}
