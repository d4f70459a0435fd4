//! Application state read by the command layer.
//!
//! [`AppState`] is a plain value owned by the
//! [`ChatStore`](crate::store::ChatStore); it is only mutated through store
//! actions.

use std::collections::{BTreeMap, HashMap};

use crate::channel::ChannelRegistry;
use crate::geohash::{GeohashRoster, is_nostr_id};
use crate::message::ChatMessage;
use crate::peer::{PeerDirectory, PeerId};

/// The chat context currently shown to the user.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Default)]
pub enum Surface {
    /// The public mesh timeline.
    #[default]
    Public,
    /// A named mesh channel (always `#`-prefixed).
    Channel(String),
    /// A private chat with a mesh or geohash peer.
    PrivateChat(PeerId),
    /// A geohash location chat.
    Geohash(String),
}

impl Surface {
    /// Returns `true` for location chats.
    #[must_use]
    pub const fn is_geohash(&self) -> bool {
        matches!(self, Self::Geohash(_))
    }

    /// The active channel name, if the surface is a channel.
    #[must_use]
    pub fn channel(&self) -> Option<&str> {
        match self {
            Self::Channel(name) => Some(name.as_str()),
            _ => None,
        }
    }
}

/// Local user identity.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Identity {
    /// Nickname announced on the mesh.
    pub nickname: String,
    /// Local mesh peer id.
    pub peer_id: PeerId,
    /// Hex public key used in geohash chats, if location chat is enabled.
    pub nostr_pubkey: Option<String>,
}

impl Identity {
    /// Creates an identity without a geohash key.
    #[must_use]
    pub fn new(nickname: impl Into<String>, peer_id: impl Into<String>) -> Self {
        Self {
            nickname: nickname.into(),
            peer_id: PeerId::new(peer_id),
            nostr_pubkey: None,
        }
    }

    /// Sets the geohash public key.
    #[must_use]
    pub fn with_nostr_pubkey(mut self, pubkey: impl Into<String>) -> Self {
        self.nostr_pubkey = Some(pubkey.into().to_lowercase());
        self
    }
}

/// Blocked peers.
///
/// Mesh peers are blocked by fingerprint so the block survives peer id
/// rotation; geohash participants are blocked by public key. Each entry
/// keeps the name shown when it was blocked, for listing.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct BlockList {
    /// Fingerprint to nickname.
    pub mesh: BTreeMap<String, String>,
    /// Public key to display name.
    pub geohash: BTreeMap<String, String>,
}

/// Per-surface message timelines.
#[derive(Debug, Clone, Default)]
pub struct Timelines {
    public: Vec<ChatMessage>,
    channels: HashMap<String, Vec<ChatMessage>>,
    private: HashMap<PeerId, Vec<ChatMessage>>,
    geohash: HashMap<String, Vec<ChatMessage>>,
}

impl Timelines {
    /// Messages of a surface, oldest first.
    #[must_use]
    pub fn get(&self, surface: &Surface) -> &[ChatMessage] {
        let list = match surface {
            Surface::Public => Some(&self.public),
            Surface::Channel(name) => self.channels.get(name),
            Surface::PrivateChat(peer) => self.private.get(peer),
            Surface::Geohash(geohash) => self.geohash.get(geohash),
        };
        list.map(Vec::as_slice).unwrap_or_default()
    }

    /// Appends a message to a surface.
    pub fn push(&mut self, surface: &Surface, message: ChatMessage) {
        self.list_mut(surface).push(message);
    }

    /// Removes every message of a surface, returning how many were removed.
    pub fn clear(&mut self, surface: &Surface) -> usize {
        let list = self.list_mut(surface);
        let count = list.len();
        list.clear();
        count
    }

    fn list_mut(&mut self, surface: &Surface) -> &mut Vec<ChatMessage> {
        match surface {
            Surface::Public => &mut self.public,
            Surface::Channel(name) => self.channels.entry(name.clone()).or_default(),
            Surface::PrivateChat(peer) => self.private.entry(peer.clone()).or_default(),
            Surface::Geohash(geohash) => self.geohash.entry(geohash.clone()).or_default(),
        }
    }
}

/// Everything the command layer reads.
#[derive(Debug, Clone)]
pub struct AppState {
    /// Local identity.
    pub identity: Identity,
    /// Active surface.
    pub surface: Surface,
    /// Mesh nickname table.
    pub peers: PeerDirectory,
    /// Geohash participants.
    pub geohash: GeohashRoster,
    /// Channel membership and protection.
    pub channels: ChannelRegistry,
    /// Blocked peers.
    pub blocked: BlockList,
    /// Open private chats in the order they were opened.
    pub private_chats: Vec<PeerId>,
    /// Message timelines.
    pub timelines: Timelines,
}

impl AppState {
    /// Creates an empty state on the public surface.
    #[must_use]
    pub fn new(identity: Identity) -> Self {
        Self {
            identity,
            surface: Surface::Public,
            peers: PeerDirectory::new(),
            geohash: GeohashRoster::new(),
            channels: ChannelRegistry::new(),
            blocked: BlockList::default(),
            private_chats: Vec::new(),
            timelines: Timelines::default(),
        }
    }

    /// Messages of the active surface.
    #[must_use]
    pub fn current_messages(&self) -> &[ChatMessage] {
        self.timelines.get(&self.surface)
    }

    /// Returns `true` if `peer` is blocked.
    ///
    /// Mesh peers without an established fingerprint cannot be blocked and
    /// are therefore never reported as blocked.
    #[must_use]
    pub fn is_blocked(&self, peer: &PeerId) -> bool {
        if is_nostr_id(peer) {
            return self
                .geohash
                .by_peer_id(peer)
                .is_some_and(|p| self.blocked.geohash.contains_key(&p.pubkey));
        }
        self.peers
            .get(peer)
            .and_then(|p| p.fingerprint.as_ref())
            .is_some_and(|fp| self.blocked.mesh.contains_key(fp))
    }

    /// Human-readable name for a peer id.
    ///
    /// Falls back to the raw id when the peer is unknown.
    #[must_use]
    pub fn peer_name(&self, peer: &PeerId) -> String {
        if is_nostr_id(peer) {
            if let Some(p) = self.geohash.by_peer_id(peer) {
                return p.display_name();
            }
        } else if let Some(nick) = self.peers.nickname(peer) {
            return nick.to_string();
        }
        peer.to_string()
    }

    /// Short label of a surface, e.g. `#rust`, `@bob`, `public`.
    #[must_use]
    pub fn surface_label(&self, surface: &Surface) -> String {
        match surface {
            Surface::Public => "public".to_string(),
            Surface::Channel(name) => name.clone(),
            Surface::PrivateChat(peer) => format!("@{}", self.peer_name(peer)),
            Surface::Geohash(geohash) => format!("#{geohash}"),
        }
    }
}
