//! Mesh peer directory.
//!
//! The [`PeerDirectory`] is the nickname table for the Bluetooth mesh. It is
//! fed by the mesh service (announcements, session establishment) and read
//! by the command layer to turn a typed nickname into a routable [`PeerId`].

use std::collections::BTreeMap;

/// Length of ids produced by [`PeerId::generate`].
const GENERATED_ID_LEN: usize = 16;

/// Routable identifier of a peer.
///
/// Mesh peers use the short hex id announced on the mesh. Geohash peers use
/// the `nostr_`-prefixed form produced by
/// [`GeoParticipant::peer_id`](crate::geohash::GeoParticipant::peer_id).
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct PeerId(String);

impl PeerId {
    /// Creates a peer identifier from its string form.
    #[must_use]
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    /// Generates a fresh 16-hex-character mesh id.
    ///
    /// Uses the random tail of a v7 UUID.
    #[must_use]
    pub fn generate() -> Self {
        let hex = uuid::Uuid::now_v7().simple().to_string();
        let start = hex.len().saturating_sub(GENERATED_ID_LEN);
        Self(hex[start..].to_string())
    }

    /// Returns the identifier as a string slice.
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl std::fmt::Display for PeerId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.0)
    }
}

/// How a peer is currently reachable.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Connectivity {
    /// Not reachable.
    #[default]
    Offline,
    /// Connected over a direct Bluetooth link.
    Direct,
    /// Reachable through other mesh nodes.
    Routed,
}

impl Connectivity {
    /// Returns `true` unless the peer is offline.
    #[must_use]
    pub const fn is_reachable(self) -> bool {
        !matches!(self, Self::Offline)
    }

    /// Display glyph for this connectivity state.
    #[must_use]
    pub const fn glyph(self) -> &'static str {
        match self {
            Self::Offline => "\u{25cb}",
            Self::Direct => "\u{25cf}",
            Self::Routed => "\u{25d0}",
        }
    }
}

/// Everything the command layer knows about a mesh peer.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PeerInfo {
    /// Routable peer id.
    pub id: PeerId,
    /// Announced nickname.
    pub nickname: String,
    /// Hex fingerprint of the peer's static key, once a session exists.
    pub fingerprint: Option<String>,
    /// Whether the user verified this fingerprint out of band.
    pub verified: bool,
    /// Whether the user marked this peer as a favorite.
    pub favorite: bool,
    /// Current reachability.
    pub connectivity: Connectivity,
}

impl PeerInfo {
    /// Creates an online, directly connected peer with no session yet.
    #[must_use]
    pub fn new(id: impl Into<String>, nickname: impl Into<String>) -> Self {
        Self {
            id: PeerId::new(id),
            nickname: nickname.into(),
            fingerprint: None,
            verified: false,
            favorite: false,
            connectivity: Connectivity::Direct,
        }
    }

    /// Sets the session fingerprint.
    #[must_use]
    pub fn with_fingerprint(mut self, fingerprint: impl Into<String>) -> Self {
        self.fingerprint = Some(fingerprint.into());
        self
    }

    /// Sets the connectivity state.
    #[must_use]
    pub const fn with_connectivity(mut self, connectivity: Connectivity) -> Self {
        self.connectivity = connectivity;
        self
    }

    /// Marks the peer as verified.
    #[must_use]
    pub const fn verified(mut self) -> Self {
        self.verified = true;
        self
    }

    /// Marks the peer as a favorite.
    #[must_use]
    pub const fn favorite(mut self) -> Self {
        self.favorite = true;
        self
    }
}

/// Outcome of resolving a typed name against a peer list.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Resolution<T> {
    /// Exactly one peer matched.
    Found(T),
    /// Several peers share the name.
    Ambiguous(Vec<T>),
    /// No peer matched.
    NotFound,
}

/// Nickname table for the mesh, keyed by peer id.
#[derive(Debug, Clone, Default)]
pub struct PeerDirectory {
    peers: BTreeMap<PeerId, PeerInfo>,
}

impl PeerDirectory {
    /// Creates an empty directory.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Inserts or replaces a peer entry.
    pub fn upsert(&mut self, peer: PeerInfo) {
        self.peers.insert(peer.id.clone(), peer);
    }

    /// Removes a peer entry, returning it if present.
    pub fn remove(&mut self, id: &PeerId) -> Option<PeerInfo> {
        self.peers.remove(id)
    }

    /// Returns a peer by id.
    #[must_use]
    pub fn get(&self, id: &PeerId) -> Option<&PeerInfo> {
        self.peers.get(id)
    }

    /// Returns the nickname for a peer id, if known.
    #[must_use]
    pub fn nickname(&self, id: &PeerId) -> Option<&str> {
        self.peers.get(id).map(|p| p.nickname.as_str())
    }

    /// Returns all peers whose nickname equals `nickname` exactly.
    #[must_use]
    pub fn with_nickname(&self, nickname: &str) -> Vec<&PeerInfo> {
        self.peers
            .values()
            .filter(|p| p.nickname == nickname)
            .collect()
    }

    /// Resolves a typed name to a peer id.
    ///
    /// An exact peer id wins over nicknames so that collisions can be
    /// resolved by typing the id shown in the disambiguation list. Online
    /// peers are preferred: when exactly one of several same-named peers is
    /// reachable it is chosen.
    #[must_use]
    pub fn resolve(&self, name: &str) -> Resolution<PeerId> {
        let id = PeerId::new(name);
        if self.peers.contains_key(&id) {
            return Resolution::Found(id);
        }

        let matches = self.with_nickname(name);
        match matches.as_slice() {
            [] => Resolution::NotFound,
            [single] => Resolution::Found(single.id.clone()),
            many => {
                let online: Vec<&&PeerInfo> = many
                    .iter()
                    .filter(|p| p.connectivity.is_reachable())
                    .collect();
                if let [only] = online.as_slice() {
                    Resolution::Found(only.id.clone())
                } else {
                    Resolution::Ambiguous(many.iter().map(|p| p.id.clone()).collect())
                }
            }
        }
    }

    /// Nicknames of reachable peers, excluding `self_id`, sorted.
    #[must_use]
    pub fn online_nicknames(&self, self_id: &PeerId) -> Vec<String> {
        let mut names: Vec<String> = self
            .peers
            .values()
            .filter(|p| &p.id != self_id && p.connectivity.is_reachable())
            .map(|p| p.nickname.clone())
            .collect();
        names.sort_by_key(|n| n.to_lowercase());
        names.dedup();
        names
    }

    /// All known nicknames excluding `self_id`, for mention completion.
    #[must_use]
    pub fn nicknames(&self, self_id: &PeerId) -> Vec<String> {
        self.peers
            .values()
            .filter(|p| &p.id != self_id)
            .map(|p| p.nickname.clone())
            .collect()
    }
}
