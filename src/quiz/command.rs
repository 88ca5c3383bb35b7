use std::fmt;

/// Session-control commands a user can type instead of an answer.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Command {
    Restart,
    Skip,
    Quit,
    Help,
}

impl Command {
    /// Declaration order, which is also the order used by the help text.
    pub const ALL: [Command; 4] = [Command::Restart, Command::Skip, Command::Quit, Command::Help];

    pub fn name(self) -> &'static str {
        match self {
            Command::Restart => "restart",
            Command::Skip => "skip",
            Command::Quit => "quit",
            Command::Help => "help",
        }
    }

    pub fn aliases(self) -> &'static [&'static str] {
        match self {
            Command::Restart => &["restart", "r"],
            Command::Skip => &["skip", "s", "n", "next"],
            Command::Quit => &["quit", "q"],
            Command::Help => &["help", "h", "?"],
        }
    }

    /// Resolves a trimmed input line to a command, ignoring case.
    pub fn resolve(input: &str) -> Option<Command> {
        let input = input.to_lowercase();
        Self::ALL
            .into_iter()
            .find(|command| command.aliases().contains(&input.as_str()))
    }

    pub fn is_command(input: &str) -> bool {
        Self::resolve(input).is_some()
    }

    pub fn help_text() -> String {
        let mut text = String::from("Available commands:\n");
        for command in Self::ALL {
            text.push_str("  ");
            text.push_str(&command.aliases().join(", "));
            text.push('\n');
        }
        text
    }
}

impl fmt::Display for Command {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}
