//! Presentation of peers that share a nickname.

use crate::peer::{Connectivity, PeerDirectory, PeerId};

/// Number of fingerprint characters shown to the user.
pub const FINGERPRINT_PREVIEW_LEN: usize = 8;

/// Shown instead of a fingerprint while the secure session is pending.
pub const PENDING_FINGERPRINT: &str = "pending";

/// One selectable peer in a nickname collision.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PeerCandidate {
    /// Routable peer id.
    pub id: PeerId,
    /// Shared nickname.
    pub nickname: String,
    /// Fingerprint prefix, or [`PENDING_FINGERPRINT`].
    pub fingerprint: String,
    /// Whether the fingerprint was verified.
    pub verified: bool,
    /// Whether the peer is a favorite.
    pub favorite: bool,
    /// Current reachability.
    pub connectivity: Connectivity,
}

impl PeerCandidate {
    /// Single-line rendering, e.g. `● bob (b1) 1a2b3c4d ✔ ★`.
    #[must_use]
    pub fn render(&self) -> String {
        let mut line = format!(
            "{} {} ({}) {}",
            self.connectivity.glyph(),
            self.nickname,
            self.id,
            self.fingerprint
        );
        if self.verified {
            line.push_str(" \u{2714}");
        }
        if self.favorite {
            line.push_str(" \u{2605}");
        }
        line
    }
}

/// Projects the peers with the given ids into selectable candidates.
///
/// Ids missing from the directory are skipped. Order follows `ids`.
#[must_use]
pub fn candidates(directory: &PeerDirectory, ids: &[PeerId]) -> Vec<PeerCandidate> {
    ids.iter()
        .filter_map(|id| directory.get(id))
        .map(|peer| PeerCandidate {
            id: peer.id.clone(),
            nickname: peer.nickname.clone(),
            fingerprint: peer.fingerprint.as_deref().map_or_else(
                || PENDING_FINGERPRINT.to_string(),
                |fp| fp.chars().take(FINGERPRINT_PREVIEW_LEN).collect(),
            ),
            verified: peer.verified,
            favorite: peer.favorite,
            connectivity: peer.connectivity,
        })
        .collect()
}
