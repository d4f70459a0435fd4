//! Geohash (location) chat participants.
//!
//! Location chats are relayed over Nostr and keyed by a geohash cell.
//! Participants are identified by a hex public key; the command layer shows
//! them as `nickname#abcd` (last four key characters) and routes private
//! messages to `nostr_` plus the first sixteen key characters.

use std::collections::BTreeMap;

use crate::peer::{PeerId, Resolution};

/// Prefix of routable ids for geohash participants.
pub const NOSTR_ID_PREFIX: &str = "nostr_";

/// Number of public key characters kept in the routable id.
const ROUTABLE_KEY_CHARS: usize = 16;

/// Number of trailing public key characters appended to display names.
const DISPLAY_SUFFIX_CHARS: usize = 4;

/// Longest geohash accepted for a location channel.
pub const MAX_GEOHASH_LEN: usize = 12;

const GEOHASH_ALPHABET: &str = "0123456789bcdefghjkmnpqrstuvwxyz";

/// A participant seen in a geohash chat.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GeoParticipant {
    /// Hex-encoded public key.
    pub pubkey: String,
    /// Self-chosen nickname.
    pub nickname: String,
}

impl GeoParticipant {
    /// Creates a participant entry.
    #[must_use]
    pub fn new(pubkey: impl Into<String>, nickname: impl Into<String>) -> Self {
        Self {
            pubkey: pubkey.into().to_lowercase(),
            nickname: nickname.into(),
        }
    }

    /// Display name with a key suffix, e.g. `alice#9f2c`.
    #[must_use]
    pub fn display_name(&self) -> String {
        let start = self.pubkey.len().saturating_sub(DISPLAY_SUFFIX_CHARS);
        let suffix = self.pubkey.get(start..).unwrap_or_default();
        format!("{}#{suffix}", self.nickname)
    }

    /// Routable identifier used for private messages.
    #[must_use]
    pub fn peer_id(&self) -> PeerId {
        let end = self.pubkey.len().min(ROUTABLE_KEY_CHARS);
        let prefix = self.pubkey.get(..end).unwrap_or_default();
        PeerId::new(format!("{NOSTR_ID_PREFIX}{prefix}"))
    }
}

/// Returns `true` if `id` routes to a geohash participant.
#[must_use]
pub fn is_nostr_id(id: &PeerId) -> bool {
    id.as_str().starts_with(NOSTR_ID_PREFIX)
}

/// Normalises and validates a geohash string.
///
/// Returns the lower-cased geohash, or `None` if it is empty, too long, or
/// contains characters outside the geohash base32 alphabet.
#[must_use]
pub fn normalize_geohash(raw: &str) -> Option<String> {
    let geohash = raw.trim().trim_start_matches('#').to_lowercase();
    if geohash.is_empty() || geohash.len() > MAX_GEOHASH_LEN {
        return None;
    }
    geohash
        .chars()
        .all(|c| GEOHASH_ALPHABET.contains(c))
        .then_some(geohash)
}

/// Participants of every geohash chat the client has seen.
#[derive(Debug, Clone, Default)]
pub struct GeohashRoster {
    cells: BTreeMap<String, BTreeMap<String, GeoParticipant>>,
}

impl GeohashRoster {
    /// Creates an empty roster.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Replaces the participant list of a geohash cell.
    pub fn set_participants(&mut self, geohash: &str, participants: Vec<GeoParticipant>) {
        let cell = participants
            .into_iter()
            .map(|p| (p.pubkey.clone(), p))
            .collect();
        self.cells.insert(geohash.to_string(), cell);
    }

    /// Participants of a cell, ordered by public key.
    #[must_use]
    pub fn participants(&self, geohash: &str) -> Vec<&GeoParticipant> {
        self.cells
            .get(geohash)
            .map(|cell| cell.values().collect())
            .unwrap_or_default()
    }

    /// Display names of a cell's participants, excluding `self_pubkey`.
    #[must_use]
    pub fn display_names(&self, geohash: &str, self_pubkey: Option<&str>) -> Vec<String> {
        self.participants(geohash)
            .into_iter()
            .filter(|p| Some(p.pubkey.as_str()) != self_pubkey)
            .map(GeoParticipant::display_name)
            .collect()
    }

    /// Finds a participant of any cell by routable id.
    #[must_use]
    pub fn by_peer_id(&self, id: &PeerId) -> Option<&GeoParticipant> {
        self.cells
            .values()
            .flat_map(BTreeMap::values)
            .find(|p| &p.peer_id() == id)
    }

    /// Geohash cell in which a routable id was seen.
    #[must_use]
    pub fn cell_of(&self, id: &PeerId) -> Option<&str> {
        self.cells
            .iter()
            .find(|(_, cell)| cell.values().any(|p| &p.peer_id() == id))
            .map(|(geohash, _)| geohash.as_str())
    }

    /// Resolves a typed name within a cell.
    ///
    /// The full display name (`nick#abcd`) always identifies one
    /// participant; a bare nickname resolves only when it is unique.
    #[must_use]
    pub fn resolve(&self, geohash: &str, name: &str) -> Resolution<GeoParticipant> {
        let participants = self.participants(geohash);
        if let Some(p) = participants.iter().find(|p| p.display_name() == name) {
            return Resolution::Found((*p).clone());
        }

        let matches: Vec<GeoParticipant> = participants
            .into_iter()
            .filter(|p| p.nickname == name)
            .cloned()
            .collect();
        match matches.len() {
            0 => Resolution::NotFound,
            1 => matches
                .into_iter()
                .next()
                .map_or(Resolution::NotFound, Resolution::Found),
            _ => Resolution::Ambiguous(matches),
        }
    }
}
