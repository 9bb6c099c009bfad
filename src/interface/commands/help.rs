//! # Help Command
//!
//! Handles the `.help` command.
//! Lists every command not hidden from help, in dispatch order.

use crate::application::registry::CommandRegistry;
use crate::strings::help;

/// Renders the help listing for the commands currently registered, followed by
/// any `extra` entries (name, help) not yet in the registry.
pub fn render(registry: &CommandRegistry, extra: &[(&str, &str)]) -> Vec<String> {
    let mut lines = vec![help::HEADER.to_string()];
    lines.extend(
        registry
            .commands()
            .filter(|c| !c.is_hidden())
            .map(|c| help::command_line(c.name(), c.help_text())),
    );
    lines.extend(extra.iter().map(|(name, text)| help::command_line(name, text)));
    vec![lines.join("\n")]
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::application::registry::CommandDefinition;
    use crate::domain::types::{MatchGroups, MessageEvent};
    use crate::infrastructure::reporting::NullReporter;
    use std::sync::Arc;

    fn noop(_: &MessageEvent, _: &MatchGroups, _: bool) -> anyhow::Result<Vec<String>> {
        Ok(Vec::new())
    }

    #[test]
    fn test_hidden_commands_are_not_listed() {
        let mut registry = CommandRegistry::new(Arc::new(NullReporter));
        registry
            .register(CommandDefinition::new(".ping", noop).help("Check"))
            .unwrap();
        registry
            .register(CommandDefinition::new(".secret", noop).hidden())
            .unwrap();

        let text = render(&registry, &[(".help", "Show this")]).join("\n");
        assert!(text.contains("* .ping: Check"));
        assert!(text.contains("* .help: Show this"));
        assert!(!text.contains(".secret"));
    }
}
