//! Single owner of [`AppState`] with an action reducer.
//!
//! Every state change goes through [`ChatStore::apply`], which validates the
//! [`Action`], mutates the state and publishes a [`StoreEvent`] on an mpsc
//! channel so a front-end can redraw. Failed actions leave the state
//! untouched and publish nothing.

use tokio::sync::mpsc;

use crate::channel::{ChannelError, JoinOutcome, PasswordChange};
use crate::geohash::GeoParticipant;
use crate::message::{ChatMessage, MessageId};
use crate::peer::{PeerId, PeerInfo};
use crate::state::{AppState, Surface};

/// Default capacity of the store event channel.
pub const DEFAULT_EVENT_CAPACITY: usize = 256;

/// A requested state change.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Action {
    /// Append a message to a surface's timeline.
    AppendMessage {
        /// Target timeline.
        surface: Surface,
        /// Message to append.
        message: ChatMessage,
    },
    /// Remove all messages of a surface.
    ClearTimeline(Surface),
    /// Show another surface.
    SwitchSurface(Surface),
    /// Open (or re-open) a private chat and show it.
    OpenPrivateChat(PeerId),
    /// Join a mesh channel and show it.
    JoinChannel {
        /// Normalised channel name.
        channel: String,
        /// Optional channel password.
        password: Option<String>,
    },
    /// Leave a mesh channel; shows the public timeline if it was active.
    LeaveChannel(String),
    /// Set or remove a channel password as the local user.
    SetChannelPassword {
        /// Channel name.
        channel: String,
        /// New password, `None` to remove protection.
        password: Option<String>,
    },
    /// Hand channel ownership to another peer.
    TransferChannel {
        /// Channel name.
        channel: String,
        /// New creator.
        new_creator: PeerId,
    },
    /// Record a channel announced on the mesh.
    AnnounceChannel {
        /// Channel name.
        channel: String,
        /// Announcing creator.
        creator: PeerId,
        /// Key commitment if the channel is protected.
        commitment: Option<String>,
    },
    /// Block a mesh peer by fingerprint.
    BlockMesh {
        /// Peer fingerprint.
        fingerprint: String,
        /// Nickname at block time.
        nickname: String,
    },
    /// Unblock a mesh fingerprint.
    UnblockMesh {
        /// Peer fingerprint.
        fingerprint: String,
    },
    /// Block a geohash participant by public key.
    BlockGeohash {
        /// Participant public key.
        pubkey: String,
        /// Display name at block time.
        display_name: String,
    },
    /// Unblock a geohash public key.
    UnblockGeohash {
        /// Participant public key.
        pubkey: String,
    },
    /// Insert or update a mesh peer.
    UpsertPeer(PeerInfo),
    /// Forget a mesh peer.
    RemovePeer(PeerId),
    /// Replace the participant list of a geohash cell.
    SetGeohashParticipants {
        /// Geohash cell.
        geohash: String,
        /// Current participants.
        participants: Vec<GeoParticipant>,
    },
}

/// Notification published after an action was applied.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum StoreEvent {
    /// A message was appended to a timeline.
    MessageAppended {
        /// Timeline that changed.
        surface: Surface,
        /// Id of the new message.
        message_id: MessageId,
    },
    /// A timeline was cleared.
    TimelineCleared {
        /// Timeline that was cleared.
        surface: Surface,
        /// Number of removed messages.
        removed: usize,
    },
    /// The active surface changed.
    SurfaceChanged(Surface),
    /// A private chat was opened and is now active.
    PrivateChatOpened(PeerId),
    /// A channel was joined and is now active.
    ChannelJoined {
        /// Channel name.
        channel: String,
        /// How the join came about.
        outcome: JoinOutcome,
    },
    /// A channel was left.
    ChannelLeft(String),
    /// A channel password changed.
    ChannelPasswordChanged {
        /// Channel name.
        channel: String,
        /// What changed.
        change: PasswordChange,
    },
    /// Channel ownership moved.
    ChannelTransferred {
        /// Channel name.
        channel: String,
        /// New creator.
        new_creator: PeerId,
    },
    /// A channel announcement was recorded.
    ChannelAnnounced(String),
    /// A peer was blocked.
    Blocked(String),
    /// A peer was unblocked.
    Unblocked(String),
    /// A mesh peer entry changed.
    PeerUpdated(PeerId),
    /// A mesh peer entry was removed.
    PeerRemoved(PeerId),
    /// A geohash participant list changed.
    ParticipantsUpdated(String),
}

/// Errors returned by [`ChatStore::apply`].
#[derive(Debug, thiserror::Error, PartialEq, Eq)]
pub enum StoreError {
    /// A channel operation failed.
    #[error(transparent)]
    Channel(#[from] ChannelError),

    /// The key to unblock is not on the block list.
    #[error("{0} is not blocked")]
    NotBlocked(String),

    /// The peer to remove is unknown.
    #[error("unknown peer {0}")]
    UnknownPeer(PeerId),
}

/// Owns the application state and applies actions to it.
#[derive(Debug)]
pub struct ChatStore {
    state: AppState,
    event_sender: mpsc::Sender<StoreEvent>,
}

impl ChatStore {
    /// Creates a store and its event receiver.
    ///
    /// The caller should consume events from the returned receiver to
    /// drive redraws; events are dropped if the channel is full.
    #[must_use]
    pub fn new(state: AppState) -> (Self, mpsc::Receiver<StoreEvent>) {
        Self::with_capacity(state, DEFAULT_EVENT_CAPACITY)
    }

    /// Creates a store with a custom event channel capacity.
    #[must_use]
    pub fn with_capacity(state: AppState, capacity: usize) -> (Self, mpsc::Receiver<StoreEvent>) {
        let (tx, rx) = mpsc::channel(capacity.max(1));
        (
            Self {
                state,
                event_sender: tx,
            },
            rx,
        )
    }

    /// Read-only view of the current state.
    #[must_use]
    pub const fn state(&self) -> &AppState {
        &self.state
    }

    /// Applies an action and publishes the resulting event.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError`] if the action is rejected (channel rules,
    /// unblocking a peer that is not blocked, removing an unknown peer).
    /// The state is unchanged in that case.
    pub fn apply(&mut self, action: Action) -> Result<StoreEvent, StoreError> {
        let event = self.reduce(action)?;
        tracing::trace!(?event, "store event");

        // Best-effort; if receiver is dropped or full, silently ignore
        let _ = self.event_sender.try_send(event.clone());
        Ok(event)
    }

    /// Appends a system message to the active surface.
    pub fn notify(&mut self, text: impl Into<String>) {
        let surface = self.state.surface.clone();
        self.push_message(surface, ChatMessage::system(text));
    }

    /// Appends a message to a surface.
    pub fn push_message(&mut self, surface: Surface, message: ChatMessage) {
        // AppendMessage cannot fail
        let _ = self.apply(Action::AppendMessage { surface, message });
    }

    fn reduce(&mut self, action: Action) -> Result<StoreEvent, StoreError> {
        let state = &mut self.state;
        let event = match action {
            Action::AppendMessage { surface, message } => {
                let message_id = message.id;
                state.timelines.push(&surface, message);
                StoreEvent::MessageAppended {
                    surface,
                    message_id,
                }
            }
            Action::ClearTimeline(surface) => {
                let removed = state.timelines.clear(&surface);
                StoreEvent::TimelineCleared { surface, removed }
            }
            Action::SwitchSurface(surface) => {
                state.surface = surface.clone();
                StoreEvent::SurfaceChanged(surface)
            }
            Action::OpenPrivateChat(peer) => {
                if !state.private_chats.contains(&peer) {
                    state.private_chats.push(peer.clone());
                }
                state.surface = Surface::PrivateChat(peer.clone());
                StoreEvent::PrivateChatOpened(peer)
            }
            Action::JoinChannel { channel, password } => {
                let outcome =
                    state
                        .channels
                        .join(&channel, password.as_deref(), &state.identity.peer_id)?;
                state.surface = Surface::Channel(channel.clone());
                StoreEvent::ChannelJoined { channel, outcome }
            }
            Action::LeaveChannel(channel) => {
                state.channels.leave(&channel)?;
                if state.surface.channel() == Some(channel.as_str()) {
                    state.surface = Surface::Public;
                }
                StoreEvent::ChannelLeft(channel)
            }
            Action::SetChannelPassword { channel, password } => {
                let change = state.channels.set_password(
                    &channel,
                    password.as_deref(),
                    &state.identity.peer_id,
                )?;
                StoreEvent::ChannelPasswordChanged { channel, change }
            }
            Action::TransferChannel {
                channel,
                new_creator,
            } => {
                state
                    .channels
                    .transfer(&channel, new_creator.clone(), &state.identity.peer_id)?;
                StoreEvent::ChannelTransferred {
                    channel,
                    new_creator,
                }
            }
            Action::AnnounceChannel {
                channel,
                creator,
                commitment,
            } => {
                state.channels.announce(&channel, creator, commitment);
                StoreEvent::ChannelAnnounced(channel)
            }
            Action::BlockMesh {
                fingerprint,
                nickname,
            } => {
                state.blocked.mesh.insert(fingerprint, nickname.clone());
                StoreEvent::Blocked(nickname)
            }
            Action::UnblockMesh { fingerprint } => {
                let nickname = state
                    .blocked
                    .mesh
                    .remove(&fingerprint)
                    .ok_or(StoreError::NotBlocked(fingerprint))?;
                StoreEvent::Unblocked(nickname)
            }
            Action::BlockGeohash {
                pubkey,
                display_name,
            } => {
                state.blocked.geohash.insert(pubkey, display_name.clone());
                StoreEvent::Blocked(display_name)
            }
            Action::UnblockGeohash { pubkey } => {
                let name = state
                    .blocked
                    .geohash
                    .remove(&pubkey)
                    .ok_or(StoreError::NotBlocked(pubkey))?;
                StoreEvent::Unblocked(name)
            }
            Action::UpsertPeer(peer) => {
                let id = peer.id.clone();
                state.peers.upsert(peer);
                StoreEvent::PeerUpdated(id)
            }
            Action::RemovePeer(id) => {
                state
                    .peers
                    .remove(&id)
                    .ok_or_else(|| StoreError::UnknownPeer(id.clone()))?;
                StoreEvent::PeerRemoved(id)
            }
            Action::SetGeohashParticipants {
                geohash,
                participants,
            } => {
                state.geohash.set_participants(&geohash, participants);
                StoreEvent::ParticipantsUpdated(geohash)
            }
        };
        Ok(event)
    }
}
