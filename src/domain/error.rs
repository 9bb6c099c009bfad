//! # Relay Errors
//!
//! Error taxonomy for the poller and command layers. None of these are fatal:
//! each is logged, handed to the error reporter, and execution continues at the
//! narrowest enclosing scope (item, channel or dispatch).

use std::path::PathBuf;

#[derive(Debug, thiserror::Error)]
pub enum RelayError {
    #[error("feed fetch failed for {target}: {reason}")]
    Fetch { target: String, reason: String },

    #[error("could not parse {what} from {input:?}: {reason}")]
    Parse {
        what: &'static str,
        input: String,
        reason: String,
    },

    #[error("failed to persist {}: {source}", path.display())]
    Persist {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to send to {channel}: {reason}")]
    Send { channel: String, reason: String },

    #[error("command {command} failed: {reason}")]
    Handler { command: String, reason: String },

    #[error("configuration error: {0}")]
    Config(String),
}

impl RelayError {
    /// Short label used in log fields and error reports.
    pub fn kind(&self) -> &'static str {
        match self {
            RelayError::Fetch { .. } => "fetch",
            RelayError::Parse { .. } => "parse",
            RelayError::Persist { .. } => "persist",
            RelayError::Send { .. } => "send",
            RelayError::Handler { .. } => "handler",
            RelayError::Config(_) => "config",
        }
    }

    pub fn fetch(target: &str, reason: impl ToString) -> Self {
        RelayError::Fetch {
            target: target.to_string(),
            reason: reason.to_string(),
        }
    }

    pub fn send(channel: &str, reason: impl ToString) -> Self {
        RelayError::Send {
            channel: channel.to_string(),
            reason: reason.to_string(),
        }
    }
}
