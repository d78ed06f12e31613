pub mod assembler;
pub mod balance;
pub mod config;
pub mod fetch;
pub mod leaderboard;
pub mod notifier;
pub mod reporter;
pub mod scheduler;
pub mod wallets;

/// Fortytwo leaderboard endpoint (public, no auth required)
pub const DEFAULT_LEADERBOARD_URL: &str =
    "https://jc1n4ugo1k.execute-api.us-east-2.amazonaws.com/leaderboard_v2";

/// JSON-RPC endpoint used for `eth_getBalance`
pub const DEFAULT_RPC_URL: &str = "https://cloudflare-eth.com";

/// Telegram Bot API base URL
pub const TELEGRAM_API_BASE: &str = "https://api.telegram.org";
