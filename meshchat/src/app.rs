//! Line-based front-end over a [`ChatSession`].
//!
//! Each input line is either submitted (message or command) or, when it ends
//! with a tab, used to list completions. The app returns the lines to print
//! so the caller owns stdout.

use std::collections::HashMap;

use tokio::sync::mpsc;

use meshchat_core::channel::{derive_channel_key, key_commitment};
use meshchat_core::geohash::GeoParticipant;
use meshchat_core::message::{ChatMessage, MessageOrigin};
use meshchat_core::outbound::{ChannelPort, OutboundRequest};
use meshchat_core::peer::{Connectivity, PeerId, PeerInfo};
use meshchat_core::session::ChatSession;
use meshchat_core::state::{AppState, Surface};
use meshchat_core::store::{Action, StoreEvent};

use crate::config::ClientConfig;

/// Geohash cell populated by the demo roster when none was requested.
const DEMO_GEOHASH: &str = "u4pruy";

/// Application state for the line-based client.
pub struct App {
    session: ChatSession<ChannelPort>,
    events: mpsc::Receiver<StoreEvent>,
    timestamp_format: String,
    shown: HashMap<Surface, usize>,
    last_surface: Surface,
}

impl App {
    /// Creates the app and returns the receiver the transport task drains.
    #[must_use]
    pub fn new(config: &ClientConfig) -> (Self, mpsc::Receiver<OutboundRequest>) {
        let mut state = AppState::new(config.identity());
        state.surface = config.start_surface();

        let (port, outbound) = ChannelPort::new(config.outbound_capacity);
        let (session, events) =
            ChatSession::new(state, port, config.event_capacity, config.max_suggestions);

        let last_surface = session.state().surface.clone();
        let app = Self {
            session,
            events,
            timestamp_format: config.timestamp_format.clone(),
            shown: HashMap::new(),
            last_surface,
        };
        (app, outbound)
    }

    /// Fills the directory with demo peers, a protected channel, a
    /// location roster and a greeting, for running without a mesh service.
    pub fn seed_demo(&mut self) {
        let cell = match &self.session.state().surface {
            Surface::Geohash(cell) => cell.clone(),
            _ => DEMO_GEOHASH.to_string(),
        };
        let self_pubkey = self.session.state().identity.nostr_pubkey.clone();
        let nickname = self.session.state().identity.nickname.clone();

        let mut participants = vec![
            GeoParticipant::new(
                "7f3a9c2e41d06b58e9a1c4f27d3b8e60a5c91f2d4e7b0a3c6d9e2f5a8b1c4d7e",
                "zoe",
            ),
            GeoParticipant::new(
                "c0ffee00c0ffee00c0ffee00c0ffee00c0ffee00c0ffee00c0ffee00c0ff1234",
                "max",
            ),
        ];
        if let Some(pubkey) = self_pubkey {
            participants.push(GeoParticipant::new(pubkey, nickname));
        }

        let mut actions = vec![
            Action::UpsertPeer(
                PeerInfo::new("a1c3e5f7a9b1c3d5", "alice")
                    .with_fingerprint("a1b2c3d4e5f60718")
                    .verified()
                    .favorite(),
            ),
            Action::UpsertPeer(
                PeerInfo::new("b2d4f6a8c0e2a4b6", "bob").with_fingerprint("b0b0b0b0c1c1c1c1"),
            ),
            Action::UpsertPeer(
                PeerInfo::new("5a5a5a5a00000001", "sam")
                    .with_fingerprint("5a4d0001ffffeeee")
                    .with_connectivity(Connectivity::Direct),
            ),
            Action::UpsertPeer(
                PeerInfo::new("5a5a5a5a00000002", "sam").with_connectivity(Connectivity::Routed),
            ),
            Action::UpsertPeer(
                PeerInfo::new("c4c4c4c4c4c4c4c4", "carol").with_connectivity(Connectivity::Offline),
            ),
            Action::SetGeohashParticipants {
                geohash: cell,
                participants,
            },
        ];
        if let Ok(key) = derive_channel_key("letmein", "#vault") {
            actions.push(Action::AnnounceChannel {
                channel: "#vault".to_string(),
                creator: PeerId::new("a1c3e5f7a9b1c3d5"),
                commitment: Some(key_commitment(&key)),
            });
        }

        let store = self.session.store_mut();
        for action in actions {
            if let Err(e) = store.apply(action) {
                tracing::warn!(error = %e, "demo seed action rejected");
            }
        }
        store.push_message(
            Surface::Public,
            ChatMessage::incoming("alice", "welcome to the mesh! try /who or /join vault"),
        );
        tracing::info!("demo data seeded");
    }

    /// Prompt for the next line, e.g. `[#rust] `.
    #[must_use]
    pub fn prompt(&self) -> String {
        let state = self.session.state();
        format!("[{}] ", state.surface_label(&state.surface))
    }

    /// Handles one input line and returns the lines to print.
    pub fn handle_line(&mut self, line: &str) -> Vec<String> {
        if let Some(text) = line.strip_suffix('\t') {
            return self.complete(text);
        }

        self.session.set_input(line);
        let outcome = self.session.submit();
        tracing::debug!(?outcome, "line submitted");
        self.drain_events();
        self.render_new()
    }

    /// Renders messages not printed yet on the active surface.
    pub fn render_new(&mut self) -> Vec<String> {
        let mut out = Vec::new();
        let state = self.session.state();
        let surface = state.surface.clone();

        if surface != self.last_surface {
            out.push(format!("-- {} --", state.surface_label(&surface)));
            self.last_surface = surface.clone();
        }

        let messages = state.current_messages();
        let start = self
            .shown
            .get(&surface)
            .copied()
            .unwrap_or(0)
            .min(messages.len());
        out.extend(
            messages[start..]
                .iter()
                .map(|m| format_message(m, &self.timestamp_format)),
        );
        self.shown.insert(surface, messages.len());
        out
    }

    fn complete(&mut self, text: &str) -> Vec<String> {
        self.session.set_input(text);
        let composer = self.session.composer();

        let mut out: Vec<String> = composer
            .command_suggestions()
            .iter()
            .map(|c| {
                let usage = c.syntax.map_or_else(|| c.name.to_string(), |s| format!("{} {s}", c.name));
                format!("  {usage:<32} {}", c.description)
            })
            .collect();
        out.extend(composer.mention_suggestions().iter().map(|n| format!("  @{n}")));
        if out.is_empty() {
            out.push("  (no suggestions)".to_string());
        }
        out
    }

    fn drain_events(&mut self) {
        while let Ok(event) = self.events.try_recv() {
            tracing::trace!(?event, "store event");
        }
    }
}

fn format_message(message: &ChatMessage, timestamp_format: &str) -> String {
    let ts = message.format_timestamp(timestamp_format);
    match message.origin {
        MessageOrigin::System => format!("[{ts}] * {}", message.content),
        MessageOrigin::Outgoing | MessageOrigin::Incoming => {
            format!("[{ts}] <{}> {}", message.sender, message.content)
        }
    }
}
