//! # Command Registry
//!
//! Ordered collection of command definitions. Inbound text is matched against them
//! in priority order (High, Normal, Low; registration order within a tier), and the
//! first definition with a matching pattern runs. At most one command runs per dispatch.

use crate::domain::error::RelayError;
use crate::domain::traits::ErrorReporter;
use crate::domain::types::{MatchGroups, MessageEvent, Priority};
use async_trait::async_trait;
use futures::FutureExt;
use regex::Regex;
use std::panic::AssertUnwindSafe;
use std::sync::Arc;

/// Executes a matched command.
#[async_trait]
pub trait CommandHandler: Send + Sync {
    async fn run(&self, event: &MessageEvent, args: &MatchGroups, use_cache: bool) -> anyhow::Result<Vec<String>>;
}

#[async_trait]
impl<F> CommandHandler for F
where
    F: Fn(&MessageEvent, &MatchGroups, bool) -> anyhow::Result<Vec<String>> + Send + Sync,
{
    async fn run(&self, event: &MessageEvent, args: &MatchGroups, use_cache: bool) -> anyhow::Result<Vec<String>> {
        self(event, args, use_cache)
    }
}

pub struct CommandDefinition {
    name: String,
    patterns: Vec<Regex>,
    priority: Priority,
    cacheable: bool,
    hidden: bool,
    help: String,
    handler: Arc<dyn CommandHandler>,
}

impl CommandDefinition {
    pub fn new(name: impl Into<String>, handler: impl CommandHandler + 'static) -> Self {
        Self {
            name: name.into(),
            patterns: Vec::new(),
            priority: Priority::Normal,
            cacheable: false,
            hidden: false,
            help: String::new(),
            handler: Arc::new(handler),
        }
    }

    /// Adds a pattern; patterns are tried in the order they are added.
    pub fn pattern(mut self, pattern: &str) -> Result<Self, RelayError> {
        let regex = Regex::new(pattern)
            .map_err(|e| RelayError::Config(format!("command {}: invalid pattern {pattern:?}: {e}", self.name)))?;
        self.patterns.push(regex);
        Ok(self)
    }

    pub fn priority(mut self, priority: Priority) -> Self {
        self.priority = priority;
        self
    }

    pub fn cacheable(mut self) -> Self {
        self.cacheable = true;
        self
    }

    pub fn hidden(mut self) -> Self {
        self.hidden = true;
        self
    }

    pub fn help(mut self, text: impl Into<String>) -> Self {
        self.help = text.into();
        self
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn is_cacheable(&self) -> bool {
        self.cacheable
    }

    pub fn is_hidden(&self) -> bool {
        self.hidden
    }

    pub fn help_text(&self) -> &str {
        &self.help
    }

    /// First pattern (in registration order) matching `text`.
    fn matches(&self, text: &str) -> Option<MatchGroups> {
        self.patterns
            .iter()
            .find_map(|re| re.captures(text).map(|caps| MatchGroups::from_captures(re, &caps)))
    }
}

/// Result of a dispatch, with the metadata surrounding collaborators need.
#[derive(Debug, Default, Clone, PartialEq)]
pub struct Dispatched {
    pub command: Option<String>,
    pub cacheable: bool,
    pub lines: Vec<String>,
}

pub struct CommandRegistry {
    commands: Vec<CommandDefinition>,
    reporter: Arc<dyn ErrorReporter>,
}

impl CommandRegistry {
    pub fn new(reporter: Arc<dyn ErrorReporter>) -> Self {
        Self {
            commands: Vec::new(),
            reporter,
        }
    }

    /// Adds a definition. Names must be unique.
    pub fn register(&mut self, definition: CommandDefinition) -> Result<(), RelayError> {
        if self.commands.iter().any(|c| c.name == definition.name) {
            return Err(RelayError::Config(format!("command {} registered twice", definition.name)));
        }
        tracing::debug!(command = %definition.name, priority = ?definition.priority, "Registered command");
        self.commands.push(definition);
        // stable sort keeps registration order inside a tier
        self.commands.sort_by_key(|c| c.priority);
        Ok(())
    }

    /// Definitions in dispatch order.
    pub fn commands(&self) -> impl Iterator<Item = &CommandDefinition> {
        self.commands.iter()
    }

    /// The definition that would handle `text`, with its captures.
    pub fn resolve(&self, text: &str) -> Option<(&CommandDefinition, MatchGroups)> {
        self.commands
            .iter()
            .find_map(|command| command.matches(text).map(|groups| (command, groups)))
    }

    pub async fn dispatch(&self, event: &MessageEvent, text: &str, use_cache: bool) -> Vec<String> {
        self.dispatch_detailed(event, text, use_cache).await.lines
    }

    /// Runs the selected command. A handler error or panic is reported and
    /// yields no reply lines.
    pub async fn dispatch_detailed(&self, event: &MessageEvent, text: &str, use_cache: bool) -> Dispatched {
        let Some((command, groups)) = self.resolve(text) else {
            return Dispatched::default();
        };
        tracing::info!(command = %command.name, sender = %event.sender, channel = %event.channel, "Dispatching command");

        let outcome = AssertUnwindSafe(command.handler.run(event, &groups, use_cache))
            .catch_unwind()
            .await;

        let fault = match outcome {
            Ok(Ok(lines)) => {
                return Dispatched {
                    command: Some(command.name.clone()),
                    cacheable: command.cacheable,
                    lines,
                };
            }
            Ok(Err(e)) => format!("{e:#}"),
            Err(panic) => panic_message(panic.as_ref()),
        };

        let error = RelayError::Handler {
            command: command.name.clone(),
            reason: fault,
        };
        tracing::error!(kind = error.kind(), "{error}");
        self.reporter.capture(&error, "running command");

        Dispatched {
            command: Some(command.name.clone()),
            cacheable: command.cacheable,
            lines: Vec::new(),
        }
    }
}

fn panic_message(panic: &(dyn std::any::Any + Send)) -> String {
    if let Some(s) = panic.downcast_ref::<&str>() {
        format!("panicked: {s}")
    } else if let Some(s) = panic.downcast_ref::<String>() {
        format!("panicked: {s}")
    } else {
        "panicked".to_string()
    }
}
