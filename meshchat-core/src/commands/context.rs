//! Per-command snapshot of the dispatch context.

use crate::geohash::is_nostr_id;
use crate::peer::PeerId;
use crate::state::{AppState, Surface};

/// Which peer list a command resolves names against.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PeerSource {
    /// The mesh nickname table.
    Mesh,
    /// Participants of a geohash cell.
    Geohash(String),
}

/// What a command needs to know about where it was typed.
///
/// Captured from the store right before a command runs and dropped
/// afterwards.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DispatchContext {
    /// Surface active when the command was typed.
    pub surface: Surface,
    /// Local nickname.
    pub nickname: String,
    /// Local mesh peer id.
    pub self_id: PeerId,
    /// Local geohash public key.
    pub self_pubkey: Option<String>,
    /// Peer list for name resolution.
    pub peers: PeerSource,
}

impl DispatchContext {
    /// Snapshots the context from the current state.
    ///
    /// A private chat with a geohash participant resolves names against
    /// the cell the participant was seen in.
    #[must_use]
    pub fn capture(state: &AppState) -> Self {
        let peers = match &state.surface {
            Surface::Geohash(geohash) => PeerSource::Geohash(geohash.clone()),
            Surface::PrivateChat(peer) if is_nostr_id(peer) => state
                .geohash
                .cell_of(peer)
                .map_or(PeerSource::Mesh, |cell| PeerSource::Geohash(cell.to_string())),
            _ => PeerSource::Mesh,
        };

        Self {
            surface: state.surface.clone(),
            nickname: state.identity.nickname.clone(),
            self_id: state.identity.peer_id.clone(),
            self_pubkey: state.identity.nostr_pubkey.clone(),
            peers,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::geohash::GeoParticipant;
    use crate::state::Identity;

    const KEY: &str = "0a1b2c3d4e5f60718293a4b5c6d7e8f90a1b2c3d4e5f60718293a4b5c6d7e8f9";

    #[test]
    fn mesh_surfaces_use_mesh_peers() {
        let mut state = AppState::new(Identity::new("me", "m1"));
        assert_eq!(DispatchContext::capture(&state).peers, PeerSource::Mesh);
        state.surface = Surface::Channel("#x".into());
        assert_eq!(DispatchContext::capture(&state).peers, PeerSource::Mesh);
        state.surface = Surface::PrivateChat(PeerId::new("b1"));
        assert_eq!(DispatchContext::capture(&state).peers, PeerSource::Mesh);
    }

    #[test]
    fn geohash_surfaces_use_cell_participants() {
        let mut state = AppState::new(Identity::new("me", "m1"));
        state.surface = Surface::Geohash("u4pruy".into());
        let ctx = DispatchContext::capture(&state);
        assert_eq!(ctx.peers, PeerSource::Geohash("u4pruy".into()));
        assert_eq!(ctx.nickname, "me");
    }

    #[test]
    fn geohash_private_chat_uses_participant_cell() {
        let mut state = AppState::new(Identity::new("me", "m1"));
        let zoe = GeoParticipant::new(KEY, "zoe");
        state.geohash.set_participants("9q8yy", vec![zoe.clone()]);
        state.surface = Surface::PrivateChat(zoe.peer_id());
        assert_eq!(
            DispatchContext::capture(&state).peers,
            PeerSource::Geohash("9q8yy".into())
        );
    }
}
