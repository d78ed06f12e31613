use rust_decimal::{Decimal, RoundingStrategy};

use crate::assembler::AssembledRecord;

/// Shown instead of the stanza list when no wallet produced a record.
pub const NO_RESULTS: &str = "🎯 No results found";

const HEADER: &str = "🎯 Leaderboard Update";

/// Split an activity duration into whole hours and minutes, rounding the
/// total to the nearest minute first (ties to even).
pub fn activity_parts(seconds: f64) -> (u64, u64) {
    let seconds = if seconds.is_finite() { seconds.max(0.0) } else { 0.0 };
    let total_minutes = (seconds / 60.0).round_ties_even() as u64;
    (total_minutes / 60, total_minutes % 60)
}

pub fn format_activity(seconds: f64) -> String {
    let (hours, minutes) = activity_parts(seconds);
    format!("{hours} h {minutes} min")
}

/// Two-decimal percentage, ties to even.
pub fn format_win_rate(rate: Decimal) -> String {
    let rounded = rate.round_dp_with_strategy(2, RoundingStrategy::MidpointNearestEven);
    format!("{rounded:.2}%")
}

/// Render the cycle's report as one text block. Stanzas follow record order.
pub fn build_report(records: &[AssembledRecord]) -> String {
    if records.is_empty() {
        return NO_RESULTS.to_string();
    }

    let mut lines = vec![HEADER.to_string(), String::new()];
    for entry in records {
        let r = &entry.record;
        lines.push(format!("👤 {}", r.participant));
        lines.push(format!("👛 Wallet: {}", r.wallet));
        lines.push(format!("🏆 Rank: {}", r.rank));
        lines.push(format!("💰 Total reward: {}", r.total_reward));
        lines.push(format!("⏱ Activity time: {}", format_activity(r.activity_secs)));
        lines.push(format!("✅ Wins: {}", r.wins));
        lines.push(format!("📊 Win rate: {}", format_win_rate(entry.win_rate())));
        lines.push(format!("💎 Balance: {}", entry.balance));
        lines.push(String::new());
    }

    lines.join("\n").trim_end().to_string()
}
