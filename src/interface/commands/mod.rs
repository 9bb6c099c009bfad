//! # Command Handlers
//!
//! Contains the built-in commands (.help, .ping, .sticky) and their registration.
//! The handlers are invoked through the `CommandRegistry`.

pub mod help;
pub mod misc;
pub mod sticky;

use crate::application::poller::FeedPoller;
use crate::application::registry::{CommandDefinition, CommandRegistry};
use crate::domain::error::RelayError;
use crate::domain::types::{MatchGroups, MessageEvent, Priority};
use std::sync::Arc;

const HELP_NAME: &str = ".help";

/// Registers the built-in commands. `.help` is registered last so its listing
/// covers everything else.
pub fn register_builtin(registry: &mut CommandRegistry, poller: Option<Arc<FeedPoller>>) -> Result<(), RelayError> {
    registry.register(
        CommandDefinition::new(".ping", misc::handle_ping)
            .pattern(r"^\.ping$")?
            .help(crate::strings::help::PING),
    )?;

    if let Some(poller) = poller {
        registry.register(
            CommandDefinition::new(".sticky", sticky::StickyCommand::new(poller))
                .pattern(sticky::PATTERN)?
                .priority(Priority::High)
                .hidden()
                .help(crate::strings::help::STICKY),
        )?;
    }

    let listing = help::render(registry, &[(HELP_NAME, crate::strings::help::HELP)]);
    let handler = move |_: &MessageEvent, _: &MatchGroups, _: bool| -> anyhow::Result<Vec<String>> { Ok(listing.clone()) };
    registry.register(
        CommandDefinition::new(HELP_NAME, handler)
            .pattern(r"^\.help$")?
            .cacheable()
            .help(crate::strings::help::HELP),
    )
}
