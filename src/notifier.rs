use serde_json::json;
use tracing::{info, warn};

use crate::TELEGRAM_API_BASE;
use crate::config::{NotifyConfig, NotifyMode};
use crate::fetch::{Request, Transport};

/// Print the report block to stdout. Diagnostics stay on stderr.
pub fn print_report(report: &str) {
    println!("{report}");
}

pub fn telegram_request(bot_token: &str, chat_id: &str, text: &str) -> Request {
    Request::post_json(
        &format!("{TELEGRAM_API_BASE}/bot{bot_token}/sendMessage"),
        json!({
            "chat_id": chat_id,
            "text": text,
            "disable_web_page_preview": true,
        }),
    )
}

/// Send one Telegram message. Single attempt; returns whether it was accepted.
pub async fn send_telegram<T: Transport>(
    transport: &T,
    bot_token: &str,
    chat_id: &str,
    text: &str,
) -> bool {
    let request = telegram_request(bot_token, chat_id, text);
    match transport.send(&request).await {
        Ok(resp) if resp.status == 200 => true,
        Ok(resp) => {
            warn!("Telegram HTTP {}: {}", resp.status, resp.body);
            false
        }
        Err(e) => {
            warn!("Telegram send failed: {e}");
            false
        }
    }
}

/// Deliver the report: console always, Telegram when the mode asks for it
/// and credentials are present.
pub async fn dispatch<T: Transport>(transport: &T, config: &NotifyConfig, report: &str) {
    info!("Summary message ready");
    print_report(report);

    if config.mode != NotifyMode::ConsoleAndTelegram {
        return;
    }
    let (Some(token), Some(chat_id)) = (config.bot_token.as_deref(), config.chat_id.as_deref())
    else {
        warn!("BOT_TOKEN or CHAT_ID is missing; Telegram send skipped");
        return;
    };
    if send_telegram(transport, token, chat_id, report).await {
        info!("Telegram message sent");
    } else {
        warn!("Telegram message failed");
    }
}
