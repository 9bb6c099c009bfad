//! # Command Router
//!
//! Glue between the chat transport and the `CommandRegistry`.
//! Filters out the bot's own messages and anything sent before startup, attaches the
//! admin flag, serves cacheable replies from the `ReplyCache`, and sends each reply line.

use std::sync::Arc;
use std::time::{Duration, SystemTime};

use crate::application::cache::ReplyCache;
use crate::application::registry::CommandRegistry;
use crate::domain::config::AppConfig;
use crate::domain::error::RelayError;
use crate::domain::traits::{ChatProvider, ErrorReporter};
use crate::domain::types::MessageEvent;

pub struct CommandRouter {
    config: AppConfig,
    registry: Arc<CommandRegistry>,
    cache: ReplyCache,
    reporter: Arc<dyn ErrorReporter>,
    own_user_id: String,
    started_at: SystemTime,
}

impl CommandRouter {
    pub fn new(
        config: AppConfig,
        registry: Arc<CommandRegistry>,
        reporter: Arc<dyn ErrorReporter>,
        own_user_id: impl Into<String>,
    ) -> Self {
        let cache = ReplyCache::new(Duration::from_secs(config.commands.cache_ttl_seconds));
        Self {
            config,
            registry,
            cache,
            reporter,
            own_user_id: own_user_id.into(),
            started_at: SystemTime::now(),
        }
    }

    /// Treat events older than `started_at` as history.
    pub fn with_start_time(mut self, started_at: SystemTime) -> Self {
        self.started_at = started_at;
        self
    }

    /// Handles one inbound message. Returns the number of reply lines delivered.
    pub async fn route<C>(&self, chat: &C, message: &str, sender: &str, sent_at: SystemTime) -> usize
    where
        C: ChatProvider + ?Sized,
    {
        if sender == self.own_user_id || sent_at < self.started_at {
            return 0;
        }

        let text = message.trim();
        let channel = chat.room_id();
        let event = MessageEvent::new(channel.as_str(), sender, message).with_admin(self.config.is_admin(sender));
        let use_cache = self.config.commands.cache_ttl_seconds > 0;

        let lines = match self.registry.resolve(text) {
            None => return 0,
            Some((command, _)) if use_cache && command.is_cacheable() => match self.cache.get(text) {
                Some(lines) => {
                    tracing::debug!(command = %command.name(), "Serving cached reply");
                    lines
                }
                None => {
                    let outcome = self.registry.dispatch_detailed(&event, text, use_cache).await;
                    if !outcome.lines.is_empty() {
                        self.cache.insert(text, outcome.lines.clone());
                    }
                    outcome.lines
                }
            },
            Some(_) => self.registry.dispatch(&event, text, use_cache).await,
        };

        let mut delivered = 0;
        for line in lines.iter().filter(|l| !l.trim().is_empty()) {
            match chat.send_message(line).await {
                Ok(_) => delivered += 1,
                Err(reason) => {
                    let error = RelayError::send(&channel, reason);
                    tracing::warn!(kind = error.kind(), "{error}");
                    self.reporter.capture(&error, "sending command reply");
                }
            }
        }
        delivered
    }

    /// Drops cached replies, e.g. after the command set's state changed.
    pub fn clear_cache(&self) {
        self.cache.clear();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::application::registry::CommandDefinition;
    use crate::domain::types::MatchGroups;
    use async_trait::async_trait;
    use std::sync::Mutex;
    use std::sync::atomic::{AtomicUsize, Ordering};

    #[derive(Default)]
    struct FakeChat {
        sent: Mutex<Vec<String>>,
        fail_on: Option<&'static str>,
    }

    #[async_trait]
    impl ChatProvider for FakeChat {
        async fn send_message(&self, content: &str) -> Result<String, String> {
            if self.fail_on == Some(content) {
                return Err("rate limited".into());
            }
            self.sent.lock().unwrap().push(content.to_string());
            Ok("$event".into())
        }

        fn room_id(&self) -> String {
            "!room:x".into()
        }
    }

    #[derive(Default)]
    struct CollectingReporter {
        kinds: Mutex<Vec<&'static str>>,
    }

    impl ErrorReporter for CollectingReporter {
        fn capture(&self, error: &RelayError, _context: &str) {
            self.kinds.lock().unwrap().push(error.kind());
        }
    }

    fn config() -> AppConfig {
        AppConfig::from_yaml(
            r#"
services:
  matrix: { username: "@bot:x", password: "p", homeserver: "https://x" }
system:
  admin: ["@ops:x"]
"#,
        )
        .unwrap()
    }

    fn router(registry: CommandRegistry, reporter: Arc<CollectingReporter>) -> CommandRouter {
        CommandRouter::new(config(), Arc::new(registry), reporter, "@bot:x").with_start_time(SystemTime::UNIX_EPOCH)
    }

    #[tokio::test]
    async fn test_routes_and_sends_each_line() {
        let reporter = Arc::new(CollectingReporter::default());
        let mut registry = CommandRegistry::new(reporter.clone());
        let whoami = |event: &MessageEvent, _: &MatchGroups, _: bool| -> anyhow::Result<Vec<String>> {
            Ok(vec![event.sender.clone(), format!("admin={}", event.is_admin)])
        };
        registry
            .register(CommandDefinition::new("whoami", whoami).pattern(r"^\.whoami$").unwrap())
            .unwrap();
        let router = router(registry, reporter);
        let chat = FakeChat::default();

        assert_eq!(router.route(&chat, " .whoami ", "@ops:x", SystemTime::now()).await, 2);
        assert_eq!(*chat.sent.lock().unwrap(), vec!["@ops:x", "admin=true"]);
    }

    #[tokio::test]
    async fn test_ignores_own_and_old_messages() {
        let reporter = Arc::new(CollectingReporter::default());
        let mut registry = CommandRegistry::new(reporter.clone());
        let ping = |_: &MessageEvent, _: &MatchGroups, _: bool| -> anyhow::Result<Vec<String>> { Ok(vec!["pong".to_string()]) };
        registry
            .register(CommandDefinition::new("ping", ping).pattern(r"^\.ping$").unwrap())
            .unwrap();
        let router = CommandRouter::new(config(), Arc::new(registry), reporter, "@bot:x")
            .with_start_time(SystemTime::now());
        let chat = FakeChat::default();

        assert_eq!(router.route(&chat, ".ping", "@bot:x", SystemTime::now()).await, 0);
        assert_eq!(router.route(&chat, ".ping", "@u:x", SystemTime::UNIX_EPOCH).await, 0);
        assert!(chat.sent.lock().unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_cacheable_reply_runs_handler_once() {
        let reporter = Arc::new(CollectingReporter::default());
        let mut registry = CommandRegistry::new(reporter.clone());
        let calls = Arc::new(AtomicUsize::new(0));
        let counter = calls.clone();
        let help = move |_: &MessageEvent, _: &MatchGroups, _: bool| -> anyhow::Result<Vec<String>> {
            counter.fetch_add(1, Ordering::SeqCst);
            Ok(vec!["help text".to_string()])
        };
        registry
            .register(CommandDefinition::new("help", help).pattern(r"^\.help$").unwrap().cacheable())
            .unwrap();
        let router = router(registry, reporter);
        let chat = FakeChat::default();

        router.route(&chat, ".help", "@u:x", SystemTime::now()).await;
        router.route(&chat, ".help", "@u:x", SystemTime::now()).await;
        assert_eq!(calls.load(Ordering::SeqCst), 1);
        assert_eq!(chat.sent.lock().unwrap().len(), 2);

        router.clear_cache();
        router.route(&chat, ".help", "@u:x", SystemTime::now()).await;
        assert_eq!(calls.load(Ordering::SeqCst), 2);
    }

    #[tokio::test]
    async fn test_send_failure_is_reported_and_rest_delivered() {
        let reporter = Arc::new(CollectingReporter::default());
        let mut registry = CommandRegistry::new(reporter.clone());
        let lines = |_: &MessageEvent, _: &MatchGroups, _: bool| -> anyhow::Result<Vec<String>> {
            Ok(vec!["one".to_string(), "two".to_string()])
        };
        registry
            .register(CommandDefinition::new("lines", lines).pattern(r"^\.lines$").unwrap())
            .unwrap();
        let router = router(registry, reporter.clone());
        let chat = FakeChat {
            fail_on: Some("one"),
            ..Default::default()
        };

        assert_eq!(router.route(&chat, ".lines", "@u:x", SystemTime::now()).await, 1);
        assert_eq!(*chat.sent.lock().unwrap(), vec!["two"]);
        assert_eq!(*reporter.kinds.lock().unwrap(), vec!["send"]);
    }
}
