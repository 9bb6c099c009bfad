//! # Domain Traits
//!
//! Abstract interfaces for the collaborators around the relay core (chat, feed, reporting).
//! Allows for pluggable implementations in the Infrastructure layer and fakes in tests.

use crate::domain::error::RelayError;
use crate::domain::types::FeedItem;
use async_trait::async_trait;
use std::collections::HashSet;

/// The set of joined channels and the send primitive used for broadcasts.
#[async_trait]
pub trait BroadcastTarget: Send + Sync {
    /// Channels the bot is currently a member of
    fn joined_channels(&self) -> HashSet<String>;

    /// Send one message line to a channel
    async fn send(&self, channel: &str, message: &str) -> Result<(), RelayError>;
}

/// Source of feed snapshots.
#[async_trait]
pub trait FeedSource: Send + Sync {
    /// Fetch the current snapshot of `target`, in the order the feed returns it
    async fn fetch_snapshot(&self, target: &str) -> Result<Vec<FeedItem>, RelayError>;
}

/// Read-only view of another module's last-seen external id.
pub trait ExternalIdSource: Send + Sync {
    fn current_external_id(&self) -> Option<i64>;
}

/// Best-effort remote error sink. Implementations must never block or fail the caller.
pub trait ErrorReporter: Send + Sync {
    fn capture(&self, error: &RelayError, context: &str);
}

/// Abstract interface for replying into a single chat room (e.g., Matrix, Console)
#[async_trait]
pub trait ChatProvider: Send + Sync {
    /// Send a message to the room
    async fn send_message(&self, content: &str) -> Result<String, String>;

    /// Get the current room ID
    fn room_id(&self) -> String;
}
