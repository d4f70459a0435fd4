//! Outbound message port.
//!
//! The command layer never transmits anything itself. It builds an
//! [`OutboundRequest`] and hands it to an [`OutboundPort`]; the mesh service
//! or Nostr relay client on the other side owns encryption and delivery.
//!
//! Contract: a request is handed over at most once. The layer does not
//! retry and does not deduplicate; a refused request is reported to the
//! user and no local echo is shown for it.

use tokio::sync::mpsc;

use crate::geohash::is_nostr_id;
use crate::message::{ChatMessage, MessageId};
use crate::peer::PeerId;
use crate::state::Surface;
use crate::store::ChatStore;

/// Default capacity of the outbound request channel.
pub const DEFAULT_OUTBOUND_CAPACITY: usize = 64;

/// Where an outbound message is delivered.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Scope {
    /// Broadcast on the public mesh timeline.
    Public,
    /// Broadcast to a mesh channel.
    Channel(String),
    /// Publish to a geohash location chat.
    Geohash(String),
    /// Deliver privately to the listed targets.
    Direct,
}

/// A message handed to the transport.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OutboundRequest {
    /// Id shared with the local echo.
    pub id: MessageId,
    /// Message text.
    pub content: String,
    /// Recipients; empty for broadcasts.
    pub targets: Vec<PeerId>,
    /// Delivery scope.
    pub scope: Scope,
}

impl OutboundRequest {
    /// Builds the request for sending `content` on `surface`.
    #[must_use]
    pub fn for_surface(surface: &Surface, content: impl Into<String>) -> Self {
        let (scope, targets) = match surface {
            Surface::Public => (Scope::Public, Vec::new()),
            Surface::Channel(name) => (Scope::Channel(name.clone()), Vec::new()),
            Surface::PrivateChat(peer) => (Scope::Direct, vec![peer.clone()]),
            Surface::Geohash(geohash) => (Scope::Geohash(geohash.clone()), Vec::new()),
        };
        Self {
            id: MessageId::new(),
            content: content.into(),
            targets,
            scope,
        }
    }

    /// Returns `true` if the request goes to a geohash participant or cell.
    #[must_use]
    pub fn is_nostr(&self) -> bool {
        matches!(self.scope, Scope::Geohash(_))
            || (self.scope == Scope::Direct && self.targets.iter().any(is_nostr_id))
    }
}

/// Errors reported by an [`OutboundPort`].
#[derive(Debug, thiserror::Error, PartialEq, Eq)]
pub enum SendError {
    /// The transport queue is full.
    #[error("network busy")]
    Full,

    /// The transport has shut down.
    #[error("network disconnected")]
    Closed,
}

/// Hands messages to the transport.
pub trait OutboundPort {
    /// Hands over one request.
    ///
    /// # Errors
    ///
    /// Returns [`SendError`] if the transport refuses the request.
    fn send(&mut self, request: OutboundRequest) -> Result<(), SendError>;
}

/// Collects requests in memory; used by tests and offline mode.
impl OutboundPort for Vec<OutboundRequest> {
    fn send(&mut self, request: OutboundRequest) -> Result<(), SendError> {
        self.push(request);
        Ok(())
    }
}

impl<P: OutboundPort + ?Sized> OutboundPort for &mut P {
    fn send(&mut self, request: OutboundRequest) -> Result<(), SendError> {
        (**self).send(request)
    }
}

/// [`OutboundPort`] backed by a bounded tokio mpsc channel.
///
/// Never blocks: a full channel is reported as [`SendError::Full`].
#[derive(Debug, Clone)]
pub struct ChannelPort {
    tx: mpsc::Sender<OutboundRequest>,
}

impl ChannelPort {
    /// Creates a port and the receiver the transport task should drain.
    #[must_use]
    pub fn new(capacity: usize) -> (Self, mpsc::Receiver<OutboundRequest>) {
        let (tx, rx) = mpsc::channel(capacity.max(1));
        (Self { tx }, rx)
    }
}

impl OutboundPort for ChannelPort {
    fn send(&mut self, request: OutboundRequest) -> Result<(), SendError> {
        self.tx.try_send(request).map_err(|e| match e {
            mpsc::error::TrySendError::Full(_) => SendError::Full,
            mpsc::error::TrySendError::Closed(_) => SendError::Closed,
        })
    }
}

/// Sends `content` on `surface` and echoes it into that surface's timeline.
///
/// On refusal nothing is echoed and a system message explains why.
///
/// # Errors
///
/// Returns the port's [`SendError`].
pub fn send_to_surface<P: OutboundPort + ?Sized>(
    store: &mut ChatStore,
    port: &mut P,
    surface: &Surface,
    content: &str,
) -> Result<MessageId, SendError> {
    let request = OutboundRequest::for_surface(surface, content);
    let id = request.id;

    match port.send(request) {
        Ok(()) => {
            tracing::debug!(%id, ?surface, "message handed to transport");
            let sender = store.state().identity.nickname.clone();
            store.push_message(
                surface.clone(),
                ChatMessage::outgoing(id, &sender, content),
            );
            Ok(id)
        }
        Err(e) => {
            tracing::warn!(%id, error = %e, "transport refused message");
            store.push_message(
                surface.clone(),
                ChatMessage::system(format!("message not sent: {e}")),
            );
            Err(e)
        }
    }
}
