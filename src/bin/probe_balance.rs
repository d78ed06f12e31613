//! Probe: eth_getBalance over JSON-RPC
//!
//! Posts a single `eth_getBalance(<addr>, "latest")` to <RPC_URL> and shows the
//! raw envelope next to the converted display value.

use std::path::PathBuf;
use std::time::Instant;

use anyhow::Result;
use clap::Parser;
use serde_json::Value;

use fortytwo_monitor::balance::{balance_request, convert_balance};
use fortytwo_monitor::config::AppConfig;

#[derive(Parser)]
#[command(name = "probe_balance", about = "Dump one raw eth_getBalance response")]
struct Cli {
    /// Wallet address to query
    wallet: String,

    /// TOML config file (defaults to ./config.toml when present)
    #[arg(long)]
    config: Option<PathBuf>,
}

#[tokio::main]
async fn main() -> Result<()> {
    dotenvy::dotenv().ok();
    let cli = Cli::parse();
    let mut config = AppConfig::load_file_layer(cli.config.as_deref())?;
    config.apply_env(|key| std::env::var(key).ok())?;
    let bal = &config.balance;

    println!("=== Probe: Balance ===");
    println!("RPC: {}", bal.rpc_url);
    println!("Wallet: {}", cli.wallet);
    println!(
        "Exponent: {} Precision: {}",
        bal.base_unit_exponent, bal.display_precision
    );
    println!();

    let request = balance_request(&bal.rpc_url, &cli.wallet);
    let client = reqwest::Client::new();
    let start = Instant::now();
    let resp = client
        .post(&request.url)
        .json(&request.body)
        .send()
        .await?;
    let latency = start.elapsed();
    let status = resp.status();
    let body: Value = resp.json().await?;
    println!("Status: {status}");
    println!("Latency: {latency:?}");
    println!("{}", serde_json::to_string_pretty(&body)?);
    println!();

    if let Some(err) = body.get("error").filter(|e| !e.is_null()) {
        println!("RPC error: {err}");
        return Ok(());
    }
    let raw = body.get("result").and_then(Value::as_str);
    println!("Raw: {}", raw.unwrap_or("(missing)"));
    println!(
        "Display: {}",
        convert_balance(raw, bal.base_unit_exponent, bal.display_precision)
    );

    Ok(())
}
