use std::str::FromStr;

use strum::{AsRefStr, EnumIter, EnumString, IntoEnumIterator, IntoStaticStr};

/// Commands that can be invoked by starting a message with a leading slash.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, EnumString, EnumIter, AsRefStr, IntoStaticStr,
)]
#[strum(serialize_all = "kebab-case")]
pub enum SlashCommand {
    /// Show help
    Help,
    /// Show the model replies come from
    Model,
    /// Exit the application
    Bye,
}

impl SlashCommand {
    /// User-visible description shown in help.
    pub fn description(self) -> &'static str {
        match self {
            SlashCommand::Help => "show available commands",
            SlashCommand::Model => "show the model replies come from",
            SlashCommand::Bye => "exit the application",
        }
    }

    /// Command string without the leading '/'.
    pub fn command(self) -> &'static str {
        self.into()
    }
}

/// Parse a slash command from user input
pub fn parse_slash_command(input: &str) -> Option<SlashCommand> {
    let rest = input.trim().strip_prefix('/')?;
    let head = rest.split_whitespace().next()?;

    SlashCommand::from_str(head)
        .ok()
        .or_else(|| match head.to_lowercase().as_str() {
            "q" | "quit" | "exit" => Some(SlashCommand::Bye),
            "h" | "?" => Some(SlashCommand::Help),
            "m" | "models" => Some(SlashCommand::Model),
            _ => None,
        })
}

/// Get help text for all available commands
pub fn help_text() -> String {
    let mut help = String::from("Available commands:\n\n");
    for command in SlashCommand::iter() {
        help.push_str(&format!("/{} - {}\n", command.command(), command.description()));
    }
    help.push_str("\nAliases: /q for /bye, /? for /help, /m for /model");
    help
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_commands_and_aliases() {
        assert_eq!(parse_slash_command("/help"), Some(SlashCommand::Help));
        assert_eq!(parse_slash_command("/bye"), Some(SlashCommand::Bye));
        assert_eq!(parse_slash_command("/q"), Some(SlashCommand::Bye));
        assert_eq!(parse_slash_command("/model"), Some(SlashCommand::Model));
        assert_eq!(parse_slash_command("  /help  "), Some(SlashCommand::Help));
    }

    #[test]
    fn plain_text_is_not_a_command() {
        assert_eq!(parse_slash_command("hello there"), None);
        assert_eq!(parse_slash_command("/frobnicate"), None);
        assert_eq!(parse_slash_command(""), None);
    }

    #[test]
    fn command_set_is_help_model_bye() {
        // The transcript is append-only, so there is no /clear.
        let commands: Vec<_> = SlashCommand::iter().collect();
        assert_eq!(
            commands,
            [SlashCommand::Help, SlashCommand::Model, SlashCommand::Bye]
        );
        assert_eq!(parse_slash_command("/clear"), None);
    }

    #[test]
    fn help_lists_every_command() {
        let help = help_text();
        for command in SlashCommand::iter() {
            assert!(help.contains(&format!("/{}", command.command())));
        }
    }
}
