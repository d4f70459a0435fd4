//! Input line editing with live suggestions.

use crate::commands::{CommandCatalog, CommandDefinition};
use crate::suggestion;

/// Default cap on the number of suggestions kept per list.
pub const DEFAULT_MAX_SUGGESTIONS: usize = 8;

/// What the composer needs from the session on every edit.
#[derive(Debug, Clone, Copy)]
pub struct SuggestionSource<'a> {
    /// Command catalog.
    pub catalog: &'a CommandCatalog,
    /// Whether channel-only commands are offered.
    pub in_channel: bool,
    /// Names that can be mentioned.
    pub mention_pool: &'a [String],
}

/// The input line being typed.
///
/// The cursor is a character index, not a byte offset.
#[derive(Debug, Clone)]
pub struct Composer {
    input: String,
    cursor: usize,
    commands: Vec<CommandDefinition>,
    mentions: Vec<String>,
    max_suggestions: usize,
}

impl Composer {
    /// Creates an empty composer.
    #[must_use]
    pub fn new(max_suggestions: usize) -> Self {
        Self {
            input: String::new(),
            cursor: 0,
            commands: Vec::new(),
            mentions: Vec::new(),
            max_suggestions,
        }
    }

    /// Current input text.
    #[must_use]
    pub fn input(&self) -> &str {
        &self.input
    }

    /// Cursor position in characters.
    #[must_use]
    pub const fn cursor(&self) -> usize {
        self.cursor
    }

    /// Current command suggestions.
    #[must_use]
    pub fn command_suggestions(&self) -> &[CommandDefinition] {
        &self.commands
    }

    /// Current mention suggestions.
    #[must_use]
    pub fn mention_suggestions(&self) -> &[String] {
        &self.mentions
    }

    /// Replaces the whole input and moves the cursor to the end.
    pub fn set_input(&mut self, text: &str, source: SuggestionSource<'_>) {
        self.input = text.to_string();
        self.cursor = self.input.chars().count();
        self.refresh(source);
    }

    /// Inserts a character at the cursor.
    pub fn insert_char(&mut self, c: char, source: SuggestionSource<'_>) {
        let at = self.byte_index();
        self.input.insert(at, c);
        self.cursor += 1;
        self.refresh(source);
    }

    /// Deletes the character before the cursor.
    pub fn backspace(&mut self, source: SuggestionSource<'_>) {
        if self.cursor == 0 {
            return;
        }
        self.cursor -= 1;
        let at = self.byte_index();
        self.input.remove(at);
        self.refresh(source);
    }

    /// Accepts command suggestion `index`.
    ///
    /// Returns `false` if there is no such suggestion.
    pub fn select_command(&mut self, index: usize) -> bool {
        let Some(command) = self.commands.get(index) else {
            return false;
        };
        self.input = suggestion::apply_command(command);
        self.cursor = self.input.chars().count();
        self.commands.clear();
        true
    }

    /// Accepts mention suggestion `index`.
    ///
    /// Returns `false` if there is no such suggestion.
    pub fn select_mention(&mut self, index: usize) -> bool {
        let Some(name) = self.mentions.get(index) else {
            return false;
        };
        self.input = suggestion::apply_mention(&self.input, name);
        self.cursor = self.input.chars().count();
        self.mentions.clear();
        true
    }

    /// Takes the input, leaving the composer empty.
    pub fn take(&mut self) -> String {
        self.cursor = 0;
        self.commands.clear();
        self.mentions.clear();
        std::mem::take(&mut self.input)
    }

    fn byte_index(&self) -> usize {
        self.input
            .char_indices()
            .nth(self.cursor)
            .map_or(self.input.len(), |(i, _)| i)
    }

    fn refresh(&mut self, source: SuggestionSource<'_>) {
        self.commands = suggestion::command_suggestions(source.catalog, &self.input, source.in_channel)
            .into_iter()
            .take(self.max_suggestions)
            .cloned()
            .collect();
        self.mentions = suggestion::mention_suggestions(&self.input, source.mention_pool);
        self.mentions.truncate(self.max_suggestions);
    }
}

impl Default for Composer {
    fn default() -> Self {
        Self::new(DEFAULT_MAX_SUGGESTIONS)
    }
}
