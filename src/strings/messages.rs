//! # Messages
//!
//! Contains constant strings and format functions for user-facing messages.

use crate::application::poller::PollerStatus;

pub const AUTH_DENIED: &str = "🚫 **Authorization Denied**.";
pub const PONG: &str = "pong";

pub const STICKY_USAGE: &str = "Usage: `.sticky status|start|stop|reload`";
pub const STICKY_STARTED: &str = "▶️ Sticky poller started.";
pub const STICKY_ALREADY_RUNNING: &str = "Sticky poller is already running.";
pub const STICKY_STOPPED: &str = "⏹️ Sticky poller stopped.";
pub const STICKY_NOT_RUNNING: &str = "Sticky poller was not running.";

pub fn sticky_start_failed(err: &str) -> String {
    format!("❌ Could not start sticky poller: {err}")
}

pub fn sticky_reloaded(target: &str, interval: u64, channels: usize) -> String {
    format!("🔄 Reloaded: r/{target} every {interval}s, {channels} channel(s).")
}

pub fn sticky_reload_failed(err: &str) -> String {
    format!("❌ Reload failed, keeping previous config: {err}")
}

pub fn sticky_status(status: &PollerStatus) -> String {
    let state = if status.running { "🟢 running" } else { "⚪ stopped" };
    let channels = if status.channels.is_empty() {
        "none configured".to_string()
    } else {
        status.channels.join(", ")
    };
    let last_success = status
        .last_success
        .map(|t| t.format("%Y-%m-%d %H:%M:%S UTC").to_string())
        .unwrap_or_else(|| "never".to_string());
    format!(
        "**Sticky poller**: {state}\n\
         * Feed: r/{}\n\
         * Channels: {channels}\n\
         * Cycles: {} ({} failed fetches)\n\
         * Announced: {}, seen ids: {}\n\
         * Last successful poll: {last_success}",
        status.target_feed, status.cycles, status.failed_fetches, status.announced, status.seen_items
    )
}
