use std::fmt;
use std::path::{Path, PathBuf};
use std::str::FromStr;
use std::time::Duration;

use anyhow::{Context, Result, bail};
use serde::Deserialize;
use tracing::warn;

use crate::fetch::{DEFAULT_MAX_ATTEMPTS, RetryPolicy};
use crate::{DEFAULT_LEADERBOARD_URL, DEFAULT_RPC_URL};

/// Default config file path. Missing is fine; it only layers over defaults.
pub const CONFIG_PATH: &str = "config.toml";

/// Where each cycle's report is delivered.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(try_from = "String")]
pub enum NotifyMode {
    ConsoleOnly,
    ConsoleAndTelegram,
}

#[derive(Debug, thiserror::Error)]
#[error("invalid notification mode {0:?}: use CONSOLE_ONLY or CONSOLE_AND_TELEGRAM")]
pub struct InvalidNotifyMode(String);

impl FromStr for NotifyMode {
    type Err = InvalidNotifyMode;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_uppercase().replace('-', "_").as_str() {
            "CONSOLE_ONLY" => Ok(Self::ConsoleOnly),
            "CONSOLE_AND_TELEGRAM" | "CONSOLE_AND_CHAT" => Ok(Self::ConsoleAndTelegram),
            _ => Err(InvalidNotifyMode(s.to_string())),
        }
    }
}

impl TryFrom<String> for NotifyMode {
    type Error = InvalidNotifyMode;

    fn try_from(s: String) -> Result<Self, Self::Error> {
        s.parse()
    }
}

impl fmt::Display for NotifyMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::ConsoleOnly => "CONSOLE_ONLY",
            Self::ConsoleAndTelegram => "CONSOLE_AND_TELEGRAM",
        })
    }
}

/// Top-level application config. Built once at startup, read-only afterwards.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct AppConfig {
    #[serde(default)]
    pub leaderboard: LeaderboardConfig,
    #[serde(default)]
    pub balance: BalanceConfig,
    #[serde(default)]
    pub notify: NotifyConfig,
    #[serde(default)]
    pub schedule: ScheduleConfig,
}

/// Leaderboard service query settings.
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct LeaderboardConfig {
    pub api_url: String,
    pub period: String,
    pub page: u32,
    /// Only the first result is consumed; values other than 1 are warned about.
    pub size: u32,
}

impl Default for LeaderboardConfig {
    fn default() -> Self {
        Self {
            api_url: DEFAULT_LEADERBOARD_URL.to_string(),
            period: "all_time".to_string(),
            page: 1,
            size: 1,
        }
    }
}

/// Balance RPC and display settings.
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct BalanceConfig {
    pub rpc_url: String,
    /// `10^base_unit_exponent` base units make one display unit.
    pub base_unit_exponent: u32,
    /// Fractional digits in the rendered balance.
    pub display_precision: u32,
}

impl Default for BalanceConfig {
    fn default() -> Self {
        Self {
            rpc_url: DEFAULT_RPC_URL.to_string(),
            base_unit_exponent: 18,
            display_precision: 2,
        }
    }
}

/// Report delivery settings.
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct NotifyConfig {
    pub mode: NotifyMode,
    pub bot_token: Option<String>,
    pub chat_id: Option<String>,
}

impl Default for NotifyConfig {
    fn default() -> Self {
        Self {
            mode: NotifyMode::ConsoleOnly,
            bot_token: None,
            chat_id: None,
        }
    }
}

/// Cycle scheduling settings.
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct ScheduleConfig {
    pub wallets_file: PathBuf,
    pub retry_count: u32,
    pub poll_interval_secs: u64,
    pub run_once: bool,
}

impl Default for ScheduleConfig {
    fn default() -> Self {
        Self {
            wallets_file: PathBuf::from("wallets.txt"),
            retry_count: DEFAULT_MAX_ATTEMPTS,
            poll_interval_secs: 1800,
            run_once: false,
        }
    }
}

impl ScheduleConfig {
    pub fn poll_interval(&self) -> Duration {
        Duration::from_secs(self.poll_interval_secs)
    }
}

impl AppConfig {
    /// Load config from the given TOML file path.
    pub fn load(path: &Path) -> Result<Self> {
        let contents = std::fs::read_to_string(path)
            .with_context(|| format!("failed to read {}", path.display()))?;
        let config: Self = toml::from_str(&contents)
            .with_context(|| format!("failed to parse {}", path.display()))?;
        Ok(config)
    }

    /// Resolve the file layer: an explicit path must exist, the default path
    /// is optional.
    pub fn load_file_layer(explicit: Option<&Path>) -> Result<Self> {
        match explicit {
            Some(path) => Self::load(path),
            None => {
                let default = Path::new(CONFIG_PATH);
                if default.exists() {
                    Self::load(default)
                } else {
                    Ok(Self::default())
                }
            }
        }
    }

    /// Overlay environment variables. `lookup` is usually `std::env::var(..).ok()`.
    pub fn apply_env<F>(&mut self, lookup: F) -> Result<()>
    where
        F: Fn(&str) -> Option<String>,
    {
        if let Some(v) = lookup("API_URL") {
            self.leaderboard.api_url = v;
        }
        if let Some(v) = lookup("PERIOD") {
            self.leaderboard.period = v;
        }
        if let Some(v) = lookup("PAGE") {
            self.leaderboard.page = parse_env("PAGE", &v)?;
        }
        if let Some(v) = lookup("SIZE") {
            self.leaderboard.size = parse_env("SIZE", &v)?;
        }
        if let Some(v) = lookup("RPC_URL") {
            self.balance.rpc_url = v;
        }
        if let Some(v) = lookup("BALANCE_DECIMALS") {
            self.balance.base_unit_exponent = parse_env("BALANCE_DECIMALS", &v)?;
        }
        if let Some(v) = lookup("BALANCE_PRECISION") {
            self.balance.display_precision = parse_env("BALANCE_PRECISION", &v)?;
        }
        if let Some(v) = lookup("LOG_MODE") {
            self.notify.mode = v.parse()?;
        }
        if let Some(v) = lookup("BOT_TOKEN") {
            self.notify.bot_token = Some(v);
        }
        if let Some(v) = lookup("CHAT_ID") {
            self.notify.chat_id = Some(v);
        }
        if let Some(v) = lookup("WALLETS_FILE") {
            self.schedule.wallets_file = PathBuf::from(v);
        }
        if let Some(v) = lookup("RETRY_COUNT") {
            self.schedule.retry_count = parse_env("RETRY_COUNT", &v)?;
        }
        if let Some(v) = lookup("POLL_INTERVAL_SEC") {
            self.schedule.poll_interval_secs = parse_env("POLL_INTERVAL_SEC", &v)?;
        }
        if let Some(v) = lookup("RUN_ONCE") {
            self.schedule.run_once = parse_flag(&v);
        }
        Ok(())
    }

    /// Reject settings no cycle could run with. Warns about a page size other
    /// than 1, since only the first result is ever used.
    pub fn validate(&self) -> Result<()> {
        if self.schedule.retry_count == 0 {
            bail!("RETRY_COUNT must be at least 1");
        }
        if self.leaderboard.page == 0 {
            bail!("PAGE must be a positive integer");
        }
        if self.leaderboard.size == 0 {
            bail!("SIZE must be a positive integer");
        }
        if self.leaderboard.size != 1 {
            warn!(
                "SIZE is {}, not 1; only the first result per wallet is used",
                self.leaderboard.size
            );
        }
        Ok(())
    }

    pub fn retry_policy(&self) -> RetryPolicy {
        RetryPolicy::linear(self.schedule.retry_count)
    }
}

fn parse_env<T>(key: &str, value: &str) -> Result<T>
where
    T: FromStr,
    T::Err: std::error::Error + Send + Sync + 'static,
{
    value
        .trim()
        .parse()
        .with_context(|| format!("invalid {key} value {value:?}"))
}

fn parse_flag(value: &str) -> bool {
    matches!(
        value.trim().to_ascii_lowercase().as_str(),
        "1" | "true" | "yes"
    )
}

#[cfg(test)]
mod tests {
    use std::collections::HashMap;
    use std::io::Write;

    use super::*;

    fn env(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let map: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |key: &str| map.get(key).cloned()
    }

    #[test]
    fn defaults_match_documented_values() {
        let cfg = AppConfig::default();
        assert_eq!(cfg.leaderboard.period, "all_time");
        assert_eq!(cfg.leaderboard.page, 1);
        assert_eq!(cfg.leaderboard.size, 1);
        assert_eq!(cfg.balance.base_unit_exponent, 18);
        assert_eq!(cfg.balance.display_precision, 2);
        assert_eq!(cfg.notify.mode, NotifyMode::ConsoleOnly);
        assert_eq!(cfg.schedule.retry_count, 3);
        assert_eq!(cfg.schedule.poll_interval_secs, 1800);
        assert!(!cfg.schedule.run_once);
        assert_eq!(cfg.schedule.wallets_file, PathBuf::from("wallets.txt"));
    }

    #[test]
    fn notify_mode_parsing() {
        assert_eq!("CONSOLE_ONLY".parse::<NotifyMode>().unwrap(), NotifyMode::ConsoleOnly);
        assert_eq!("console_only".parse::<NotifyMode>().unwrap(), NotifyMode::ConsoleOnly);
        assert_eq!(
            "console-and-chat".parse::<NotifyMode>().unwrap(),
            NotifyMode::ConsoleAndTelegram
        );
        assert_eq!(
            "CONSOLE_AND_TELEGRAM".parse::<NotifyMode>().unwrap(),
            NotifyMode::ConsoleAndTelegram
        );
        assert!("EMAIL".parse::<NotifyMode>().is_err());
    }

    #[test]
    fn env_overrides_apply() {
        let mut cfg = AppConfig::default();
        cfg.apply_env(env(&[
            ("API_URL", "http://lb.test"),
            ("PERIOD", "weekly"),
            ("SIZE", "5"),
            ("LOG_MODE", "console_and_telegram"),
            ("BOT_TOKEN", "123:abc"),
            ("CHAT_ID", "-100"),
            ("RETRY_COUNT", "5"),
            ("POLL_INTERVAL_SEC", "60"),
            ("RUN_ONCE", "Yes"),
            ("BALANCE_DECIMALS", "6"),
        ]))
        .unwrap();
        assert_eq!(cfg.leaderboard.api_url, "http://lb.test");
        assert_eq!(cfg.leaderboard.period, "weekly");
        assert_eq!(cfg.leaderboard.size, 5);
        assert_eq!(cfg.notify.mode, NotifyMode::ConsoleAndTelegram);
        assert_eq!(cfg.notify.bot_token.as_deref(), Some("123:abc"));
        assert_eq!(cfg.notify.chat_id.as_deref(), Some("-100"));
        assert_eq!(cfg.schedule.retry_count, 5);
        assert_eq!(cfg.schedule.poll_interval(), Duration::from_secs(60));
        assert!(cfg.schedule.run_once);
        assert_eq!(cfg.balance.base_unit_exponent, 6);
        assert_eq!(cfg.retry_policy().max_attempts, 5);
    }

    #[test]
    fn invalid_log_mode_is_fatal() {
        let mut cfg = AppConfig::default();
        let err = cfg.apply_env(env(&[("LOG_MODE", "SLACK")])).unwrap_err();
        assert!(err.to_string().contains("invalid notification mode"));
    }

    #[test]
    fn invalid_number_is_fatal() {
        let mut cfg = AppConfig::default();
        assert!(cfg.apply_env(env(&[("PAGE", "first")])).is_err());
    }

    #[test]
    fn run_once_flag_values() {
        for (raw, want) in [("1", true), ("TRUE", true), ("yes", true), ("no", false), ("0", false)] {
            assert_eq!(parse_flag(raw), want, "{raw}");
        }
    }

    #[test]
    fn validate_rejects_zero_values() {
        let mut cfg = AppConfig::default();
        cfg.schedule.retry_count = 0;
        assert!(cfg.validate().is_err());

        let mut cfg = AppConfig::default();
        cfg.leaderboard.size = 0;
        assert!(cfg.validate().is_err());

        let mut cfg = AppConfig::default();
        cfg.leaderboard.size = 10;
        assert!(cfg.validate().is_ok());
    }

    #[test]
    fn loads_partial_toml() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(
            file,
            "[leaderboard]\nperiod = \"monthly\"\n\n[notify]\nmode = \"CONSOLE_AND_TELEGRAM\"\nchat_id = \"42\"\n\n[schedule]\npoll_interval_secs = 90"
        )
        .unwrap();
        let cfg = AppConfig::load(file.path()).unwrap();
        assert_eq!(cfg.leaderboard.period, "monthly");
        assert_eq!(cfg.leaderboard.page, 1);
        assert_eq!(cfg.notify.mode, NotifyMode::ConsoleAndTelegram);
        assert_eq!(cfg.notify.chat_id.as_deref(), Some("42"));
        assert_eq!(cfg.schedule.poll_interval_secs, 90);
        assert_eq!(cfg.schedule.retry_count, 3);
    }

    #[test]
    fn invalid_mode_in_toml_is_fatal() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(file, "[notify]\nmode = \"PAGER\"").unwrap();
        assert!(AppConfig::load(file.path()).is_err());
    }

    #[test]
    fn explicit_missing_file_is_error() {
        assert!(AppConfig::load_file_layer(Some(Path::new("/nonexistent/monitor.toml"))).is_err());
    }
}
