use std::path::PathBuf;

use anyhow::Result;
use clap::Parser;
use tokio_util::sync::CancellationToken;
use tracing::{info, warn};

use fortytwo_monitor::config::AppConfig;
use fortytwo_monitor::fetch::HttpTransport;
use fortytwo_monitor::scheduler;

#[derive(Parser)]
#[command(name = "monitor", about = "Fortytwo leaderboard and balance monitor")]
struct Args {
    /// TOML config file (defaults to ./config.toml when present)
    #[arg(long)]
    config: Option<PathBuf>,

    /// Run a single cycle and exit
    #[arg(long)]
    once: bool,
}

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
        )
        .with_writer(std::io::stderr)
        .init();

    dotenvy::dotenv().ok();
    let args = Args::parse();

    let mut config = AppConfig::load_file_layer(args.config.as_deref())?;
    config.apply_env(|key| std::env::var(key).ok())?;
    if args.once {
        config.schedule.run_once = true;
    }
    config.validate()?;

    info!(
        "Loaded config: wallets={} mode={} retries={} interval={}s once={}",
        config.schedule.wallets_file.display(),
        config.notify.mode,
        config.schedule.retry_count,
        config.schedule.poll_interval_secs,
        config.schedule.run_once,
    );

    let transport = HttpTransport::new()?;
    let cancel = CancellationToken::new();

    let on_signal = cancel.clone();
    tokio::spawn(async move {
        match tokio::signal::ctrl_c().await {
            Ok(()) => {
                info!("Shutdown signal received");
                on_signal.cancel();
            }
            Err(e) => warn!("Failed to listen for Ctrl+C: {e}"),
        }
    });

    scheduler::run(&transport, &config, cancel).await;
    Ok(())
}
