//! # Help Text
//!
//! Header and line formats for the `.help` listing.

pub const HEADER: &str = "**📣 Herald Help**";

pub fn command_line(name: &str, help: &str) -> String {
    if help.is_empty() {
        format!("* {name}")
    } else {
        format!("* {name}: {help}")
    }
}

pub const PING: &str = "Check the bot is alive";
pub const HELP: &str = "Show this message";
pub const STICKY: &str = "Control the sticky-post poller (admin)";
