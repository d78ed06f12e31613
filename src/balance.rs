use std::fmt;

use bigdecimal::{BigDecimal, RoundingMode};
use num_bigint::{BigInt, BigUint};
use serde_json::{Value, json};
use tracing::warn;

use crate::config::BalanceConfig;
use crate::fetch::{Request, RetryPolicy, Transport, fetch_rpc};

/// Longest accepted hex quantity: a 256-bit word.
const MAX_HEX_DIGITS: usize = 64;

/// Rendered balance, or the marker shown when it could not be obtained.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DisplayBalance {
    Amount(String),
    Unavailable,
}

impl fmt::Display for DisplayBalance {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Amount(s) => f.write_str(s),
            Self::Unavailable => f.write_str("unavailable"),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ConversionError {
    #[error("missing 0x prefix in {0:?}")]
    MissingPrefix(String),
    #[error("no digits after 0x prefix")]
    Empty,
    #[error("invalid hex digits in {0:?}")]
    InvalidHex(String),
    #[error("quantity wider than 256 bits ({0} hex digits)")]
    OutOfRange(usize),
}

/// Parse a `0x`-prefixed big-endian hex quantity into base units.
pub fn parse_hex_quantity(raw: &str) -> Result<BigUint, ConversionError> {
    let trimmed = raw.trim();
    let digits = trimmed
        .strip_prefix("0x")
        .or_else(|| trimmed.strip_prefix("0X"))
        .ok_or_else(|| ConversionError::MissingPrefix(raw.to_string()))?;
    if digits.is_empty() {
        return Err(ConversionError::Empty);
    }
    if !digits.chars().all(|c| c.is_ascii_hexdigit()) {
        return Err(ConversionError::InvalidHex(raw.to_string()));
    }
    let significant = digits.trim_start_matches('0');
    if significant.len() > MAX_HEX_DIGITS {
        return Err(ConversionError::OutOfRange(significant.len()));
    }
    BigUint::parse_bytes(digits.as_bytes(), 16)
        .ok_or_else(|| ConversionError::InvalidHex(raw.to_string()))
}

/// Scale base units down by `10^exponent` and render with exactly
/// `precision` fractional digits, rounding half-up.
///
/// All arithmetic is exact decimal; no floating point is involved.
pub fn scale_to_display(units: &BigUint, exponent: u32, precision: u32) -> String {
    let exact = BigDecimal::new(BigInt::from(units.clone()), i64::from(exponent));
    let rounded = exact.with_scale_round(i64::from(precision), RoundingMode::HalfUp);
    let (digits, _) = rounded.into_bigint_and_exponent();

    let text = digits.magnitude().to_string();
    let precision = precision as usize;
    if precision == 0 {
        return text;
    }
    let padded = format!("{text:0>width$}", width = precision + 1);
    let (whole, frac) = padded.split_at(padded.len() - precision);
    format!("{whole}.{frac}")
}

/// Convert a raw hex balance into its display form. Any failure degrades to
/// [`DisplayBalance::Unavailable`].
pub fn convert_balance(raw: Option<&str>, exponent: u32, precision: u32) -> DisplayBalance {
    let Some(raw) = raw else {
        warn!("Balance missing from RPC response");
        return DisplayBalance::Unavailable;
    };
    match parse_hex_quantity(raw) {
        Ok(units) => DisplayBalance::Amount(scale_to_display(&units, exponent, precision)),
        Err(e) => {
            warn!("Balance conversion failed: {e}");
            DisplayBalance::Unavailable
        }
    }
}

/// JSON-RPC request body for the latest balance of `address`.
pub fn balance_request(rpc_url: &str, address: &str) -> Request {
    Request::post_json(
        rpc_url,
        json!({
            "jsonrpc": "2.0",
            "id": 1,
            "method": "eth_getBalance",
            "params": [address, "latest"],
        }),
    )
}

/// Fetch and convert the on-chain balance for one wallet.
pub async fn fetch_balance<T: Transport>(
    transport: &T,
    config: &BalanceConfig,
    policy: &RetryPolicy,
    address: &str,
) -> DisplayBalance {
    let request = balance_request(&config.rpc_url, address);
    let Some(body) = fetch_rpc(transport, &request, policy).await else {
        warn!("Balance unavailable for {address}");
        return DisplayBalance::Unavailable;
    };
    convert_balance(
        body.get("result").and_then(Value::as_str),
        config.base_unit_exponent,
        config.display_precision,
    )
}
