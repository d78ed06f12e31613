use rust_decimal::Decimal;
use tracing::info;

use crate::balance::{DisplayBalance, fetch_balance};
use crate::config::AppConfig;
use crate::fetch::Transport;
use crate::leaderboard::{LeaderboardRecord, fetch_record};

/// Leaderboard fields joined with the wallet's display balance.
#[derive(Debug, Clone, PartialEq)]
pub struct AssembledRecord {
    pub record: LeaderboardRecord,
    pub balance: DisplayBalance,
}

impl AssembledRecord {
    pub fn win_rate(&self) -> Decimal {
        win_rate(self.record.wins, self.record.events_participated)
    }
}

/// Wins as a percentage of events, in `[0, 100]`. Zero events means a rate of
/// exactly zero.
pub fn win_rate(wins: u64, events_participated: u64) -> Decimal {
    if events_participated == 0 {
        return Decimal::ZERO;
    }
    let rate = Decimal::from(wins) * Decimal::ONE_HUNDRED / Decimal::from(events_participated);
    rate.min(Decimal::ONE_HUNDRED)
}

/// Build one record per wallet that has a leaderboard entry, in input order.
///
/// Wallets without an entry are skipped. A missing balance degrades to
/// `unavailable` instead of dropping the record.
pub async fn assemble<T: Transport>(
    transport: &T,
    config: &AppConfig,
    wallets: &[String],
) -> Vec<AssembledRecord> {
    let policy = config.retry_policy();
    let mut records = Vec::with_capacity(wallets.len());

    for wallet in wallets {
        info!("Fetching data for wallet: {wallet}");
        let Some(record) = fetch_record(transport, &config.leaderboard, &policy, wallet).await
        else {
            info!("No result for wallet: {wallet} (skipped)");
            continue;
        };
        let balance = fetch_balance(transport, &config.balance, &policy, wallet).await;
        records.push(AssembledRecord { record, balance });
    }

    records
}
