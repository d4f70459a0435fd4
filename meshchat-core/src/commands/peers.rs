//! Peer commands: `/msg`, `/who`, `/block`, `/unblock`, `/hug`, `/slap`.
//!
//! Names are resolved against the mesh nickname table or, on a location
//! surface, against the participants of the active geohash cell.

use super::{CommandKind, DispatchContext, Invocation, PeerSource};
use crate::disambiguation;
use crate::geohash::GeoParticipant;
use crate::outbound::{OutboundPort, send_to_surface};
use crate::peer::{PeerId, PeerInfo, Resolution};
use crate::state::{AppState, Surface};
use crate::store::{Action, ChatStore, StoreEvent};

/// A resolved command target.
#[derive(Debug, Clone)]
pub(super) enum Target {
    Mesh(PeerInfo),
    Geohash(GeoParticipant),
}

impl Target {
    fn id(&self) -> PeerId {
        match self {
            Self::Mesh(peer) => peer.id.clone(),
            Self::Geohash(participant) => participant.peer_id(),
        }
    }

    fn name(&self) -> String {
        match self {
            Self::Mesh(peer) => peer.nickname.clone(),
            Self::Geohash(participant) => participant.display_name(),
        }
    }

    fn is_self(&self, ctx: &DispatchContext) -> bool {
        match self {
            Self::Mesh(peer) => peer.id == ctx.self_id,
            Self::Geohash(participant) => {
                ctx.self_pubkey.as_deref() == Some(participant.pubkey.as_str())
            }
        }
    }
}

fn not_found(name: &str) -> String {
    format!("user '{name}' not found. they may be offline or using a different nickname.")
}

/// Resolves a typed name (with or without a leading `@`).
///
/// On failure returns the message to show: not found, or the list of
/// candidates sharing the nickname.
pub(super) fn resolve_target(
    ctx: &DispatchContext,
    state: &AppState,
    raw: &str,
) -> Result<Target, String> {
    let name = raw.trim_start_matches('@');
    match &ctx.peers {
        PeerSource::Mesh => match state.peers.resolve(name) {
            Resolution::Found(id) => state
                .peers
                .get(&id)
                .cloned()
                .map(Target::Mesh)
                .ok_or_else(|| not_found(name)),
            Resolution::Ambiguous(ids) => {
                let lines: Vec<String> = disambiguation::candidates(&state.peers, &ids)
                    .iter()
                    .map(|c| format!("  {}", c.render()))
                    .collect();
                Err(format!(
                    "multiple peers are named '{name}'. use a peer id instead:\n{}",
                    lines.join("\n")
                ))
            }
            Resolution::NotFound => Err(not_found(name)),
        },
        PeerSource::Geohash(cell) => match state.geohash.resolve(cell, name) {
            Resolution::Found(participant) => Ok(Target::Geohash(participant)),
            Resolution::Ambiguous(participants) => {
                let names: Vec<String> = participants
                    .iter()
                    .map(GeoParticipant::display_name)
                    .collect();
                Err(format!(
                    "multiple participants are named '{name}': {}",
                    names.join(", ")
                ))
            }
            Resolution::NotFound => Err(not_found(name)),
        },
    }
}

pub(super) fn msg<P: OutboundPort + ?Sized>(
    inv: &Invocation<'_>,
    store: &mut ChatStore,
    port: &mut P,
) {
    let Some(raw) = inv.arg(0) else {
        store.notify(inv.usage());
        return;
    };
    let target = match resolve_target(&inv.ctx, store.state(), raw) {
        Ok(target) => target,
        Err(text) => {
            store.notify(text);
            return;
        }
    };
    if target.is_self(&inv.ctx) {
        store.notify("you cannot message yourself.");
        return;
    }

    let id = target.id();
    let name = target.name();
    if store.state().is_blocked(&id) {
        store.notify(format!(
            "cannot send message to {name}: user is blocked. use /unblock {name} first."
        ));
        return;
    }

    let _ = store.apply(Action::OpenPrivateChat(id.clone()));
    tracing::info!(peer = %id, "opened private chat");

    match inv.rest(1) {
        Some(text) => {
            // refusal is already reported in the timeline
            let _ = send_to_surface(store, port, &Surface::PrivateChat(id), text);
        }
        None => store.notify(format!("started private chat with {name}")),
    }
}

pub(super) fn who(inv: &Invocation<'_>, store: &mut ChatStore) {
    let state = store.state();
    let text = match &inv.ctx.peers {
        PeerSource::Geohash(cell) => {
            let names = state
                .geohash
                .display_names(cell, inv.ctx.self_pubkey.as_deref());
            if names.is_empty() {
                format!("no one else is in #{cell} right now.")
            } else {
                format!("participants in #{cell}: {}", names.join(", "))
            }
        }
        PeerSource::Mesh => {
            let names = state.peers.online_nicknames(&inv.ctx.self_id);
            if names.is_empty() {
                "no one else is online right now.".to_string()
            } else {
                format!("online users: {}", names.join(", "))
            }
        }
    };
    store.notify(text);
}

pub(super) fn block(inv: &Invocation<'_>, store: &mut ChatStore) {
    let Some(raw) = inv.arg(0) else {
        list_blocked(inv, store);
        return;
    };
    let target = match resolve_target(&inv.ctx, store.state(), raw) {
        Ok(target) => target,
        Err(text) => {
            store.notify(text);
            return;
        }
    };
    if target.is_self(&inv.ctx) {
        store.notify("you cannot block yourself.");
        return;
    }

    let blocked = &store.state().blocked;
    let action = match target {
        Target::Mesh(peer) => {
            let Some(fingerprint) = peer.fingerprint else {
                store.notify(format!(
                    "cannot block {}: no secure session established yet.",
                    peer.nickname
                ));
                return;
            };
            if blocked.mesh.contains_key(&fingerprint) {
                store.notify(format!("user {} is already blocked.", peer.nickname));
                return;
            }
            Action::BlockMesh {
                fingerprint,
                nickname: peer.nickname,
            }
        }
        Target::Geohash(participant) => {
            let display_name = participant.display_name();
            if blocked.geohash.contains_key(&participant.pubkey) {
                store.notify(format!("user {display_name} is already blocked."));
                return;
            }
            Action::BlockGeohash {
                pubkey: participant.pubkey,
                display_name,
            }
        }
    };

    if let Ok(StoreEvent::Blocked(name)) = store.apply(action) {
        tracing::info!(%name, "blocked peer");
        store.notify(format!(
            "blocked user {name}. you will no longer receive messages from them."
        ));
    }
}

fn list_blocked(inv: &Invocation<'_>, store: &mut ChatStore) {
    let blocked = &store.state().blocked;
    let mut names: Vec<&str> = match inv.ctx.peers {
        PeerSource::Mesh => blocked.mesh.values().map(String::as_str).collect(),
        PeerSource::Geohash(_) => blocked.geohash.values().map(String::as_str).collect(),
    };
    names.sort_unstable();
    let text = if names.is_empty() {
        "no blocked users.".to_string()
    } else {
        format!("blocked users: {}", names.join(", "))
    };
    store.notify(text);
}

pub(super) fn unblock(inv: &Invocation<'_>, store: &mut ChatStore) {
    let Some(raw) = inv.arg(0) else {
        store.notify(inv.usage());
        return;
    };
    let name = raw.trim_start_matches('@');
    let state = store.state();

    let (action, known) = match &inv.ctx.peers {
        PeerSource::Mesh => {
            let resolution = state.peers.resolve(name);
            let ids = match &resolution {
                Resolution::Found(id) => vec![id.clone()],
                Resolution::Ambiguous(ids) => ids.clone(),
                Resolution::NotFound => Vec::new(),
            };
            // a blocked peer may have gone away; fall back to the stored nickname
            let fingerprint = ids
                .iter()
                .filter_map(|id| state.peers.get(id)?.fingerprint.clone())
                .find(|fp| state.blocked.mesh.contains_key(fp))
                .or_else(|| {
                    state
                        .blocked
                        .mesh
                        .iter()
                        .find(|(_, nick)| nick.as_str() == name)
                        .map(|(fp, _)| fp.clone())
                });
            (
                fingerprint.map(|fingerprint| Action::UnblockMesh { fingerprint }),
                !ids.is_empty(),
            )
        }
        PeerSource::Geohash(cell) => {
            let resolution = state.geohash.resolve(cell, name);
            let participants = match resolution {
                Resolution::Found(p) => vec![p],
                Resolution::Ambiguous(list) => list,
                Resolution::NotFound => Vec::new(),
            };
            let pubkey = participants
                .iter()
                .map(|p| p.pubkey.clone())
                .find(|key| state.blocked.geohash.contains_key(key))
                .or_else(|| {
                    state
                        .blocked
                        .geohash
                        .iter()
                        .find(|(_, display)| {
                            display.as_str() == name
                                || display.split_once('#').is_some_and(|(nick, _)| nick == name)
                        })
                        .map(|(key, _)| key.clone())
                });
            (
                pubkey.map(|pubkey| Action::UnblockGeohash { pubkey }),
                !participants.is_empty(),
            )
        }
    };

    match action {
        Some(action) => {
            if let Ok(StoreEvent::Unblocked(nickname)) = store.apply(action) {
                tracing::info!(%nickname, "unblocked peer");
                store.notify(format!("unblocked {nickname}"));
            }
        }
        None if known => store.notify(format!("user '{name}' is not blocked.")),
        None => store.notify(not_found(name)),
    }
}

/// `/hug` and `/slap`: a themed line sent to the active surface.
pub(super) fn action<P: OutboundPort + ?Sized>(
    inv: &Invocation<'_>,
    store: &mut ChatStore,
    port: &mut P,
) {
    let Some(raw) = inv.arg(0) else {
        store.notify(inv.usage());
        return;
    };
    let target = match resolve_target(&inv.ctx, store.state(), raw) {
        Ok(target) => target.name(),
        Err(text) => {
            store.notify(text);
            return;
        }
    };

    let me = &inv.ctx.nickname;
    let text = if inv.command.kind == CommandKind::Hug {
        format!("* {me} gives {target} a warm hug \u{1fac2} *")
    } else {
        format!("* {me} slaps {target} around a bit with a large trout \u{1f41f} *")
    };
    let _ = send_to_surface(store, port, &inv.ctx.surface, &text);
}
