//! A chat session: store, dispatcher, composer and outbound port together.

use tokio::sync::mpsc;

use crate::commands::CommandDispatcher;
use crate::composer::{Composer, SuggestionSource};
use crate::outbound::{OutboundPort, send_to_surface};
use crate::state::{AppState, Surface};
use crate::store::{Action, ChatStore, StoreEvent};
use crate::suggestion;

/// What [`ChatSession::submit`] did with the input.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Submitted {
    /// The input was blank.
    Nothing,
    /// The input was dispatched as a command.
    Command,
    /// The input was handed to the transport.
    Sent,
    /// The input was refused; the reason is in the timeline.
    Refused,
}

/// Everything behind one input line.
#[derive(Debug)]
pub struct ChatSession<P> {
    store: ChatStore,
    dispatcher: CommandDispatcher,
    composer: Composer,
    port: P,
}

impl<P: OutboundPort> ChatSession<P> {
    /// Creates a session and returns the store event receiver.
    #[must_use]
    pub fn new(
        state: AppState,
        port: P,
        event_capacity: usize,
        max_suggestions: usize,
    ) -> (Self, mpsc::Receiver<StoreEvent>) {
        let (store, events) = ChatStore::with_capacity(state, event_capacity);
        let session = Self {
            store,
            dispatcher: CommandDispatcher::new(),
            composer: Composer::new(max_suggestions),
            port,
        };
        (session, events)
    }

    /// Current state.
    #[must_use]
    pub const fn state(&self) -> &AppState {
        self.store.state()
    }

    /// The store, for feeding network-side updates.
    pub const fn store_mut(&mut self) -> &mut ChatStore {
        &mut self.store
    }

    /// The input line.
    #[must_use]
    pub const fn composer(&self) -> &Composer {
        &self.composer
    }

    /// The outbound port.
    #[must_use]
    pub const fn port(&self) -> &P {
        &self.port
    }

    /// Replaces the input line and refreshes suggestions.
    pub fn set_input(&mut self, text: &str) {
        self.edit(|composer, source| composer.set_input(text, source));
    }

    /// Types one character.
    pub fn insert_char(&mut self, c: char) {
        self.edit(|composer, source| composer.insert_char(c, source));
    }

    /// Deletes the character before the cursor.
    pub fn backspace(&mut self) {
        self.edit(Composer::backspace);
    }

    /// Accepts a command suggestion.
    pub fn select_command(&mut self, index: usize) -> bool {
        self.composer.select_command(index)
    }

    /// Accepts a mention suggestion.
    pub fn select_mention(&mut self, index: usize) -> bool {
        self.composer.select_mention(index)
    }

    /// Shows another surface.
    pub fn switch_surface(&mut self, surface: Surface) {
        let _ = self.store.apply(Action::SwitchSurface(surface));
    }

    /// Runs an edit on the composer with suggestions drawn from the
    /// active surface.
    fn edit(&mut self, edit: impl FnOnce(&mut Composer, SuggestionSource<'_>)) {
        let state = self.store.state();
        let pool = suggestion::mention_pool(state);
        let source = SuggestionSource {
            catalog: self.dispatcher.catalog(),
            in_channel: state.surface.channel().is_some(),
            mention_pool: &pool,
        };
        edit(&mut self.composer, source);
    }

    /// Submits the input line.
    ///
    /// Blank input is ignored. A line starting with `/` is dispatched as a
    /// command; anything else is sent to the active surface.
    pub fn submit(&mut self) -> Submitted {
        let line = self.composer.take();
        let line = line.trim();
        if line.is_empty() {
            return Submitted::Nothing;
        }

        if self.dispatcher.dispatch(line, &mut self.store, &mut self.port) {
            return Submitted::Command;
        }

        let surface = self.store.state().surface.clone();
        if let Surface::PrivateChat(peer) = &surface {
            if self.store.state().is_blocked(peer) {
                let name = self.store.state().peer_name(peer);
                self.store.notify(format!(
                    "cannot send message to {name}: user is blocked."
                ));
                return Submitted::Refused;
            }
        }

        match send_to_surface(&mut self.store, &mut self.port, &surface, line) {
            Ok(_) => Submitted::Sent,
            Err(_) => Submitted::Refused,
        }
    }
}
