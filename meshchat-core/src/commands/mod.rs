//! Slash command dispatch.
//!
//! [`CommandDispatcher::dispatch`] takes a raw input line, looks the first
//! token up in the [`CommandCatalog`] and runs the matching handler against
//! a fresh [`DispatchContext`]. Handlers report every outcome, including
//! failures, as system messages in the active timeline; nothing is returned
//! to the caller except whether the line was a command at all.

pub mod catalog;
pub mod context;

mod channels;
mod peers;

pub use catalog::{CommandCatalog, CommandDefinition, CommandKind};
pub use context::{DispatchContext, PeerSource};

use crate::outbound::OutboundPort;
use crate::state::Surface;
use crate::store::{Action, ChatStore};

/// Parses and runs slash commands.
#[derive(Debug, Clone, Default)]
pub struct CommandDispatcher {
    catalog: CommandCatalog,
}

/// One parsed command line.
struct Invocation<'a> {
    command: &'a CommandDefinition,
    args: Vec<&'a str>,
    /// Everything typed after the command name, untouched.
    tail: &'a str,
    ctx: DispatchContext,
}

impl Invocation<'_> {
    fn arg(&self, index: usize) -> Option<&str> {
        self.args.get(index).copied()
    }

    /// Text from argument `index` to the end of the line, as typed.
    ///
    /// Whitespace inside the text is kept; only the gap before argument
    /// `index` and trailing whitespace are dropped.
    fn rest(&self, index: usize) -> Option<&str> {
        let mut text = self.tail;
        for _ in 0..index {
            text = text.trim_start();
            let end = text.find(char::is_whitespace).unwrap_or(text.len());
            text = &text[end..];
        }
        let text = text.trim();
        (!text.is_empty()).then_some(text)
    }

    fn usage(&self) -> String {
        self.command.usage()
    }
}

impl CommandDispatcher {
    /// Creates a dispatcher with the standard catalog.
    #[must_use]
    pub fn new() -> Self {
        Self {
            catalog: CommandCatalog::new(),
        }
    }

    /// The command catalog, shared with suggestion filtering.
    #[must_use]
    pub const fn catalog(&self) -> &CommandCatalog {
        &self.catalog
    }

    /// Runs `line` if it is a slash command.
    ///
    /// Returns `false` without touching the store when `line` does not
    /// start with `/`. Otherwise returns `true`, whatever the outcome;
    /// usage errors, unknown names and refusals show up as system
    /// messages.
    pub fn dispatch<P: OutboundPort + ?Sized>(
        &self,
        line: &str,
        store: &mut ChatStore,
        port: &mut P,
    ) -> bool {
        if !line.starts_with('/') {
            return false;
        }

        let mut parts = line.split_whitespace();
        let Some(head) = parts.next() else {
            return false;
        };
        let token = head.to_lowercase();

        let Some(command) = self.catalog.lookup(&token) else {
            tracing::debug!(%token, "unknown command");
            store.notify(format!(
                "unknown command: {head}. type / to see available commands."
            ));
            return true;
        };

        let inv = Invocation {
            command,
            args: parts.collect(),
            tail: &line[head.len()..],
            ctx: DispatchContext::capture(store.state()),
        };
        tracing::debug!(
            command = command.name,
            args = inv.args.len(),
            surface = ?inv.ctx.surface,
            "dispatching command"
        );

        match command.kind {
            CommandKind::Join => channels::join(&inv, store),
            CommandKind::Leave => channels::leave(&inv, store),
            CommandKind::Pass => channels::pass(&inv, store),
            CommandKind::Transfer => channels::transfer(&inv, store),
            CommandKind::Channels => channels::list(store),
            CommandKind::Msg => peers::msg(&inv, store, port),
            CommandKind::Who => peers::who(&inv, store),
            CommandKind::Block => peers::block(&inv, store),
            CommandKind::Unblock => peers::unblock(&inv, store),
            CommandKind::Hug | CommandKind::Slap => peers::action(&inv, store, port),
            CommandKind::Clear => clear(&inv, store),
            CommandKind::Public => public(&inv, store),
        }
        true
    }
}

fn clear(inv: &Invocation<'_>, store: &mut ChatStore) {
    // ClearTimeline cannot fail
    let _ = store.apply(Action::ClearTimeline(inv.ctx.surface.clone()));
}

fn public(inv: &Invocation<'_>, store: &mut ChatStore) {
    if inv.ctx.surface == Surface::Public {
        store.notify("already on the public timeline.");
        return;
    }
    let _ = store.apply(Action::SwitchSurface(Surface::Public));
    store.notify("switched to the public timeline");
}
