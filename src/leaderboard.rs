use serde::de::Error as _;
use serde::{Deserialize, Deserializer};
use serde_json::Value;
use tracing::{debug, warn};

use crate::config::LeaderboardConfig;
use crate::fetch::{Request, RetryPolicy, Transport, fetch_json};

/// One participant row as reported by the leaderboard service.
///
/// Fields are coerced leniently: missing or null values become empty text or
/// zero, and numbers sent as strings are accepted.
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct LeaderboardRecord {
    #[serde(default, deserialize_with = "opaque_text")]
    pub participant: String,
    /// Address as the service reports it; casing may differ from the input.
    #[serde(default, rename = "original", deserialize_with = "opaque_text")]
    pub wallet: String,
    #[serde(default, deserialize_with = "count")]
    pub rank: u64,
    /// Passed through verbatim, never reinterpreted numerically.
    #[serde(default, deserialize_with = "opaque_text")]
    pub total_reward: String,
    #[serde(default, deserialize_with = "count")]
    pub wins: u64,
    #[serde(default, deserialize_with = "count")]
    pub events_participated: u64,
    /// Cumulative activity in seconds.
    #[serde(default, rename = "activity_time", deserialize_with = "seconds")]
    pub activity_secs: f64,
}

#[derive(Debug, Deserialize)]
struct LeaderboardPage {
    #[serde(default)]
    results: Option<Vec<Value>>,
}

fn opaque_text<'de, D: Deserializer<'de>>(d: D) -> Result<String, D::Error> {
    Ok(match Value::deserialize(d)? {
        Value::Null => String::new(),
        Value::String(s) => s,
        other => other.to_string(),
    })
}

fn count<'de, D: Deserializer<'de>>(d: D) -> Result<u64, D::Error> {
    match Value::deserialize(d)? {
        Value::Null => Ok(0),
        Value::Number(n) => n
            .as_u64()
            .or_else(|| {
                n.as_f64()
                    .filter(|f| *f >= 0.0 && f.fract() == 0.0)
                    .map(|f| f as u64)
            })
            .ok_or_else(|| D::Error::custom(format!("expected non-negative integer, got {n}"))),
        Value::String(s) if s.trim().is_empty() => Ok(0),
        Value::String(s) => s.trim().parse().map_err(D::Error::custom),
        other => Err(D::Error::custom(format!("expected count, got {other}"))),
    }
}

fn seconds<'de, D: Deserializer<'de>>(d: D) -> Result<f64, D::Error> {
    let secs = match Value::deserialize(d)? {
        Value::Null => 0.0,
        Value::Number(n) => n.as_f64().unwrap_or(0.0),
        Value::String(s) if s.trim().is_empty() => 0.0,
        Value::String(s) => s.trim().parse().map_err(D::Error::custom)?,
        other => return Err(D::Error::custom(format!("expected seconds, got {other}"))),
    };
    Ok(if secs.is_finite() { secs.max(0.0) } else { 0.0 })
}

/// Leaderboard query for a single wallet.
pub fn leaderboard_request(config: &LeaderboardConfig, address: &str) -> Request {
    Request::get(&config.api_url)
        .query("period", &config.period)
        .query("page", config.page)
        .query("size", config.size)
        .query("wallet_filter", address)
}

/// Pick the first record out of a leaderboard response body. Extra results
/// are ignored.
pub fn first_record(body: &Value) -> Option<LeaderboardRecord> {
    let page: LeaderboardPage = match serde_json::from_value(body.clone()) {
        Ok(p) => p,
        Err(e) => {
            warn!("Unexpected leaderboard response shape: {e}");
            return None;
        }
    };
    let results = page.results.unwrap_or_default();
    if results.len() > 1 {
        debug!("Leaderboard returned {} results, using the first", results.len());
    }
    let first = results.into_iter().next()?;
    match serde_json::from_value(first) {
        Ok(record) => Some(record),
        Err(e) => {
            warn!("Malformed leaderboard record: {e}");
            None
        }
    }
}

/// Fetch the leaderboard record for one wallet, or `None` when the service
/// has nothing for it or could not be reached.
pub async fn fetch_record<T: Transport>(
    transport: &T,
    config: &LeaderboardConfig,
    policy: &RetryPolicy,
    address: &str,
) -> Option<LeaderboardRecord> {
    let request = leaderboard_request(config, address);
    let body = fetch_json(transport, &request, policy).await?;
    first_record(&body)
}
