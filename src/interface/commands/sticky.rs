//! # Sticky Poller Command
//!
//! Handles `.sticky status|start|stop|reload`. Admin only.

use crate::application::poller::FeedPoller;
use crate::application::registry::CommandHandler;
use crate::domain::types::{MatchGroups, MessageEvent};
use crate::strings::messages;
use anyhow::Result;
use async_trait::async_trait;
use std::sync::Arc;

pub const PATTERN: &str = r"^\.sticky(?:\s+(\w+))?\s*$";

pub struct StickyCommand {
    poller: Arc<FeedPoller>,
}

impl StickyCommand {
    pub fn new(poller: Arc<FeedPoller>) -> Self {
        Self { poller }
    }
}

#[async_trait]
impl CommandHandler for StickyCommand {
    async fn run(&self, event: &MessageEvent, args: &MatchGroups, _use_cache: bool) -> Result<Vec<String>> {
        if !event.is_admin {
            tracing::warn!(sender = %event.sender, "Non-admin tried to use .sticky");
            return Ok(vec![messages::AUTH_DENIED.to_string()]);
        }

        let reply = match args.get(1).unwrap_or("status") {
            "status" => messages::sticky_status(&self.poller.status().await),
            "start" => {
                if self.poller.is_alive().await {
                    messages::STICKY_ALREADY_RUNNING.to_string()
                } else {
                    match self.poller.start().await {
                        Ok(()) => messages::STICKY_STARTED.to_string(),
                        Err(e) => messages::sticky_start_failed(&e.to_string()),
                    }
                }
            }
            "stop" => {
                if self.poller.stop().await {
                    messages::STICKY_STOPPED.to_string()
                } else {
                    messages::STICKY_NOT_RUNNING.to_string()
                }
            }
            "reload" => match self.poller.reload_config().await {
                Ok(config) => {
                    messages::sticky_reloaded(&config.target_feed, config.poll_interval_seconds, config.channels.len())
                }
                Err(e) => messages::sticky_reload_failed(&e.to_string()),
            },
            _ => messages::STICKY_USAGE.to_string(),
        };
        Ok(vec![reply])
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::application::poller::PollerContext;
    use crate::domain::error::RelayError;
    use crate::domain::traits::{BroadcastTarget, ExternalIdSource, FeedSource};
    use crate::domain::types::FeedItem;
    use crate::infrastructure::reporting::NullReporter;
    use regex::Regex;
    use std::collections::HashSet;
    use std::fs;
    use tempfile::TempDir;

    struct EmptySource;

    #[async_trait]
    impl FeedSource for EmptySource {
        async fn fetch_snapshot(&self, _target: &str) -> Result<Vec<FeedItem>, RelayError> {
            Ok(Vec::new())
        }
    }

    struct NoRooms;

    #[async_trait]
    impl BroadcastTarget for NoRooms {
        fn joined_channels(&self) -> HashSet<String> {
            HashSet::new()
        }

        async fn send(&self, channel: &str, _message: &str) -> Result<(), RelayError> {
            Err(RelayError::send(channel, "not joined"))
        }
    }

    struct NoId;

    impl ExternalIdSource for NoId {
        fn current_external_id(&self) -> Option<i64> {
            None
        }
    }

    fn setup(dir: &TempDir) -> StickyCommand {
        let config_path = dir.path().join("sticky.yaml");
        fs::write(&config_path, "poll_interval_seconds: 3600\ntarget_feed: news\nchannels: ['!a:x']\n").unwrap();
        let context =
            PollerContext::new(Arc::new(EmptySource), Arc::new(NoRooms), Arc::new(NoId), Arc::new(NullReporter))
                .unwrap();
        let poller = FeedPoller::new(config_path, dir.path().join("seen.json"), context).unwrap();
        StickyCommand::new(Arc::new(poller))
    }

    fn args(text: &str) -> MatchGroups {
        let re = Regex::new(PATTERN).unwrap();
        let caps = re.captures(text).unwrap();
        MatchGroups::from_captures(&re, &caps)
    }

    fn admin() -> MessageEvent {
        MessageEvent::new("!a:x", "@ops:x", "").with_admin(true)
    }

    #[tokio::test]
    async fn test_requires_admin() {
        let dir = TempDir::new().unwrap();
        let command = setup(&dir);
        let event = MessageEvent::new("!a:x", "@u:x", ".sticky stop");

        let reply = command.run(&event, &args(".sticky stop"), true).await.unwrap();
        assert_eq!(reply, vec![messages::AUTH_DENIED]);
    }

    #[tokio::test]
    async fn test_start_status_stop() {
        let dir = TempDir::new().unwrap();
        let command = setup(&dir);

        let reply = command.run(&admin(), &args(".sticky start"), true).await.unwrap();
        assert_eq!(reply, vec![messages::STICKY_STARTED]);
        let reply = command.run(&admin(), &args(".sticky start"), true).await.unwrap();
        assert_eq!(reply, vec![messages::STICKY_ALREADY_RUNNING]);

        let status = command.run(&admin(), &args(".sticky"), true).await.unwrap();
        assert!(status[0].contains("running"));
        assert!(status[0].contains("r/news"));

        let reply = command.run(&admin(), &args(".sticky stop"), true).await.unwrap();
        assert_eq!(reply, vec![messages::STICKY_STOPPED]);
        let reply = command.run(&admin(), &args(".sticky stop"), true).await.unwrap();
        assert_eq!(reply, vec![messages::STICKY_NOT_RUNNING]);
    }

    #[tokio::test]
    async fn test_reload_reports_failure_and_keeps_config() {
        let dir = TempDir::new().unwrap();
        let command = setup(&dir);
        fs::write(dir.path().join("sticky.yaml"), "poll_interval_seconds: 0\ntarget_feed: other\n").unwrap();

        let reply = command.run(&admin(), &args(".sticky reload"), true).await.unwrap();
        assert!(reply[0].starts_with("❌"));
        let status = command.run(&admin(), &args(".sticky status"), true).await.unwrap();
        assert!(status[0].contains("r/news"));

        fs::write(dir.path().join("sticky.yaml"), "poll_interval_seconds: 60\ntarget_feed: other\n").unwrap();
        let reply = command.run(&admin(), &args(".sticky reload"), true).await.unwrap();
        assert!(reply[0].contains("r/other every 60s"));
    }

    #[tokio::test]
    async fn test_unknown_action_shows_usage() {
        let dir = TempDir::new().unwrap();
        let command = setup(&dir);
        let reply = command.run(&admin(), &args(".sticky explode"), true).await.unwrap();
        assert_eq!(reply, vec![messages::STICKY_USAGE]);
    }
}
