//! Static catalog of slash commands.

/// Handler selector for a catalog entry.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum CommandKind {
    /// `/block`
    Block,
    /// `/channels`
    Channels,
    /// `/clear`
    Clear,
    /// `/hug`
    Hug,
    /// `/join`
    Join,
    /// `/leave`
    Leave,
    /// `/msg`
    Msg,
    /// `/pass`
    Pass,
    /// `/public`
    Public,
    /// `/slap`
    Slap,
    /// `/transfer`
    Transfer,
    /// `/unblock`
    Unblock,
    /// `/who`
    Who,
}

/// One slash command.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CommandDefinition {
    /// Handler for this command.
    pub kind: CommandKind,
    /// Canonical name, always starting with `/`.
    pub name: &'static str,
    /// Alternate spellings, never containing `name`.
    pub aliases: &'static [&'static str],
    /// Argument hint, e.g. `<channel> [password]`.
    pub syntax: Option<&'static str>,
    /// One-line description.
    pub description: &'static str,
}

impl CommandDefinition {
    /// Returns `true` if `token` is the name or an alias.
    #[must_use]
    pub fn matches(&self, token: &str) -> bool {
        self.name == token || self.aliases.contains(&token)
    }

    /// Returns `true` if the name or an alias starts with `prefix`.
    #[must_use]
    pub fn starts_with(&self, prefix: &str) -> bool {
        self.name.starts_with(prefix) || self.aliases.iter().any(|a| a.starts_with(prefix))
    }

    /// Usage line, e.g. `usage: /join <channel> [password]`.
    #[must_use]
    pub fn usage(&self) -> String {
        self.syntax.map_or_else(
            || format!("usage: {}", self.name),
            |syntax| format!("usage: {} {syntax}", self.name),
        )
    }
}

const BASE_COMMANDS: &[CommandDefinition] = &[
    CommandDefinition {
        kind: CommandKind::Block,
        name: "/block",
        aliases: &[],
        syntax: Some("[nickname]"),
        description: "block or list blocked peers",
    },
    CommandDefinition {
        kind: CommandKind::Channels,
        name: "/channels",
        aliases: &[],
        syntax: None,
        description: "show joined channels",
    },
    CommandDefinition {
        kind: CommandKind::Clear,
        name: "/clear",
        aliases: &[],
        syntax: None,
        description: "clear chat messages",
    },
    CommandDefinition {
        kind: CommandKind::Hug,
        name: "/hug",
        aliases: &[],
        syntax: Some("<nickname>"),
        description: "send someone a warm hug",
    },
    CommandDefinition {
        kind: CommandKind::Join,
        name: "/join",
        aliases: &["/j"],
        syntax: Some("<channel> [password]"),
        description: "join or create a channel",
    },
    CommandDefinition {
        kind: CommandKind::Msg,
        name: "/msg",
        aliases: &["/m"],
        syntax: Some("<nickname> [message]"),
        description: "send private message",
    },
    CommandDefinition {
        kind: CommandKind::Public,
        name: "/public",
        aliases: &[],
        syntax: None,
        description: "return to the public timeline",
    },
    CommandDefinition {
        kind: CommandKind::Slap,
        name: "/slap",
        aliases: &[],
        syntax: Some("<nickname>"),
        description: "slap someone with a trout",
    },
    CommandDefinition {
        kind: CommandKind::Unblock,
        name: "/unblock",
        aliases: &[],
        syntax: Some("<nickname>"),
        description: "unblock a peer",
    },
    CommandDefinition {
        kind: CommandKind::Who,
        name: "/who",
        aliases: &["/w"],
        syntax: None,
        description: "see who's online",
    },
];

const CHANNEL_COMMANDS: &[CommandDefinition] = &[
    CommandDefinition {
        kind: CommandKind::Leave,
        name: "/leave",
        aliases: &[],
        syntax: None,
        description: "leave the current channel",
    },
    CommandDefinition {
        kind: CommandKind::Pass,
        name: "/pass",
        aliases: &[],
        syntax: Some("[password]"),
        description: "change channel password",
    },
    CommandDefinition {
        kind: CommandKind::Transfer,
        name: "/transfer",
        aliases: &[],
        syntax: Some("<nickname>"),
        description: "transfer channel ownership",
    },
];

/// Base commands plus commands offered only inside a channel.
///
/// Every command is dispatchable on every surface; the channel-only set
/// only affects which commands are suggested.
#[derive(Debug, Clone)]
pub struct CommandCatalog {
    base: Vec<CommandDefinition>,
    channel: Vec<CommandDefinition>,
}

impl CommandCatalog {
    /// Builds the standard catalog.
    #[must_use]
    pub fn new() -> Self {
        Self {
            base: BASE_COMMANDS.to_vec(),
            channel: CHANNEL_COMMANDS.to_vec(),
        }
    }

    /// Finds the command whose name or alias equals `token`.
    #[must_use]
    pub fn lookup(&self, token: &str) -> Option<&CommandDefinition> {
        self.all().find(|c| c.matches(token))
    }

    /// Commands offered on a surface, sorted by canonical name.
    #[must_use]
    pub fn available(&self, in_channel: bool) -> Vec<&CommandDefinition> {
        let mut commands: Vec<&CommandDefinition> = self.base.iter().collect();
        if in_channel {
            commands.extend(self.channel.iter());
        }
        commands.sort_by_key(|c| c.name);
        commands
    }

    /// Every command, base first.
    pub fn all(&self) -> impl Iterator<Item = &CommandDefinition> {
        self.base.iter().chain(self.channel.iter())
    }
}

impl Default for CommandCatalog {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn names_start_with_slash_and_aliases_exclude_name() {
        for cmd in CommandCatalog::new().all() {
            assert!(cmd.name.starts_with('/'), "{}", cmd.name);
            assert!(!cmd.aliases.contains(&cmd.name), "{}", cmd.name);
            for alias in cmd.aliases {
                assert!(alias.starts_with('/'));
            }
        }
    }

    #[test]
    fn lookup_by_name_and_alias() {
        let catalog = CommandCatalog::new();
        assert_eq!(catalog.lookup("/join").unwrap().kind, CommandKind::Join);
        assert_eq!(catalog.lookup("/j").unwrap().kind, CommandKind::Join);
        assert_eq!(catalog.lookup("/w").unwrap().kind, CommandKind::Who);
        assert_eq!(catalog.lookup("/pass").unwrap().kind, CommandKind::Pass);
        assert!(catalog.lookup("/nope").is_none());
    }

    #[test]
    fn channel_commands_only_offered_in_channel() {
        let catalog = CommandCatalog::new();
        let outside: Vec<&str> = catalog.available(false).iter().map(|c| c.name).collect();
        let inside: Vec<&str> = catalog.available(true).iter().map(|c| c.name).collect();
        assert!(!outside.contains(&"/pass"));
        assert!(inside.contains(&"/pass"));
        assert!(inside.contains(&"/leave"));
        assert_eq!(inside.len(), outside.len() + 3);
    }

    #[test]
    fn available_is_sorted() {
        let catalog = CommandCatalog::new();
        let names: Vec<&str> = catalog.available(true).iter().map(|c| c.name).collect();
        let mut sorted = names.clone();
        sorted.sort_unstable();
        assert_eq!(names, sorted);
    }

    #[test]
    fn usage_strings() {
        let catalog = CommandCatalog::new();
        assert_eq!(
            catalog.lookup("/join").unwrap().usage(),
            "usage: /join <channel> [password]"
        );
        assert_eq!(catalog.lookup("/who").unwrap().usage(), "usage: /who");
    }
}
