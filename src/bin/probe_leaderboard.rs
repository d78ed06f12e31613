//! Probe: leaderboard endpoint
//!
//! Hits GET <API_URL>?period=&page=&size=&wallet_filter=<addr> once and documents:
//! - Status and latency
//! - Response shape and the fields of the first result
//! - How the monitor would parse that result

use std::path::PathBuf;
use std::time::Instant;

use anyhow::Result;
use clap::Parser;
use serde_json::Value;

use fortytwo_monitor::config::AppConfig;
use fortytwo_monitor::leaderboard::{first_record, leaderboard_request};

#[derive(Parser)]
#[command(name = "probe_leaderboard", about = "Dump one raw leaderboard response")]
struct Cli {
    /// Wallet address to filter on
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
    let lb = &config.leaderboard;

    println!("=== Probe: Leaderboard ===");
    println!("URL: {}", lb.api_url);
    println!("Wallet: {}", cli.wallet);
    println!();

    let request = leaderboard_request(lb, &cli.wallet);
    let client = reqwest::Client::new();
    let start = Instant::now();
    let resp = client
        .get(&request.url)
        .query(&request.query)
        .send()
        .await?;
    let latency = start.elapsed();
    let status = resp.status();
    let body: Value = resp.json().await?;
    println!("Status: {status}");
    println!("Latency: {latency:?}");
    println!();

    match body.get("results").and_then(Value::as_array) {
        Some(arr) => {
            println!("Result count: {}", arr.len());
            if let Some(first) = arr.first() {
                println!("\nSample result (first):");
                println!("{}", serde_json::to_string_pretty(first)?);
                println!("\nFields present:");
                if let Some(obj) = first.as_object() {
                    for key in obj.keys() {
                        println!("  - {key}");
                    }
                }
            }
        }
        None => {
            println!("No `results` array in response:");
            println!("{}", serde_json::to_string_pretty(&body)?);
        }
    }
    println!();

    println!("--- Parsed ---");
    match first_record(&body) {
        Some(record) => println!("{record:#?}"),
        None => println!("(no record)"),
    }

    Ok(())
}
