//! Integration tests for a full chat session.
//!
//! Types through a `ChatSession` backed by a bounded `ChannelPort` and
//! checks what reaches the transport, what lands in the timelines and how
//! suggestions follow the active surface.
//!
//! Verification command: `cargo test --test session_flow`

use tokio::sync::mpsc;

use meshchat_core::geohash::GeoParticipant;
use meshchat_core::message::MessageOrigin;
use meshchat_core::outbound::{ChannelPort, OutboundRequest, Scope};
use meshchat_core::peer::{PeerId, PeerInfo};
use meshchat_core::session::{ChatSession, Submitted};
use meshchat_core::state::{AppState, Identity, Surface};
use meshchat_core::store::StoreEvent;

// =============================================================================
// Helpers
// =============================================================================

const KEY_ZOE: &str = "7f3a9c2e41d06b58e9a1c4f27d3b8e60a5c91f2d4e7b0a3c6d9e2f5a8b1c4d7e";

type Session = ChatSession<ChannelPort>;

fn session(capacity: usize) -> (Session, mpsc::Receiver<OutboundRequest>, mpsc::Receiver<StoreEvent>) {
    let mut state = AppState::new(Identity::new("me", "m1"));
    state
        .peers
        .upsert(PeerInfo::new("a1", "alice").with_fingerprint("aaaa1111"));
    state.peers.upsert(PeerInfo::new("a2", "albert"));
    state
        .geohash
        .set_participants("u4pruy", vec![GeoParticipant::new(KEY_ZOE, "zoe")]);

    let (port, outbound) = ChannelPort::new(capacity);
    let (session, events) = ChatSession::new(state, port, 64, 8);
    (session, outbound, events)
}

fn submit(session: &mut Session, line: &str) -> Submitted {
    session.set_input(line);
    session.submit()
}

fn type_text(session: &mut Session, text: &str) {
    for c in text.chars() {
        session.insert_char(c);
    }
}

// =============================================================================
// Sending
// =============================================================================

#[test]
fn messages_follow_the_active_surface() {
    let (mut s, mut outbound, _events) = session(8);

    assert_eq!(submit(&mut s, "hello everyone"), Submitted::Sent);
    assert_eq!(submit(&mut s, "/join rust"), Submitted::Command);
    assert_eq!(submit(&mut s, "hello rust"), Submitted::Sent);
    assert_eq!(submit(&mut s, "/msg alice"), Submitted::Command);
    assert_eq!(submit(&mut s, "hello alice"), Submitted::Sent);

    let first = outbound.try_recv().unwrap();
    assert_eq!(first.scope, Scope::Public);
    let second = outbound.try_recv().unwrap();
    assert_eq!(second.scope, Scope::Channel("#rust".into()));
    let third = outbound.try_recv().unwrap();
    assert_eq!(third.scope, Scope::Direct);
    assert_eq!(third.targets, [PeerId::new("a1")]);
    assert!(outbound.try_recv().is_err());

    let public = s.state().timelines.get(&Surface::Public);
    assert_eq!(public.len(), 1);
    assert_eq!(public[0].content, "hello everyone");
}

#[test]
fn full_transport_refuses_without_echo() {
    let (mut s, mut outbound, _events) = session(1);
    assert_eq!(submit(&mut s, "one"), Submitted::Sent);
    assert_eq!(submit(&mut s, "two"), Submitted::Refused);

    let timeline = s.state().current_messages();
    assert_eq!(timeline.len(), 2);
    assert_eq!(timeline[0].origin, MessageOrigin::Outgoing);
    assert_eq!(timeline[1].origin, MessageOrigin::System);
    assert_eq!(timeline[1].content, "message not sent: network busy");

    assert_eq!(outbound.try_recv().unwrap().content, "one");
    assert!(outbound.try_recv().is_err());
}

#[test]
fn closed_transport_refuses() {
    let (mut s, outbound, _events) = session(4);
    drop(outbound);
    assert_eq!(submit(&mut s, "anyone?"), Submitted::Refused);
    assert_eq!(
        s.state().current_messages()[0].content,
        "message not sent: network disconnected"
    );
}

#[test]
fn whitespace_only_input_does_nothing() {
    let (mut s, mut outbound, mut events) = session(4);
    assert_eq!(submit(&mut s, " \t "), Submitted::Nothing);
    assert!(outbound.try_recv().is_err());
    assert!(events.try_recv().is_err());
}

// =============================================================================
// Suggestions
// =============================================================================

#[test]
fn command_completion_round_trip() {
    let (mut s, mut outbound, _events) = session(4);
    type_text(&mut s, "/j");
    let names: Vec<&str> = s
        .composer()
        .command_suggestions()
        .iter()
        .map(|c| c.name)
        .collect();
    assert_eq!(names, ["/join"]);

    assert!(s.select_command(0));
    assert_eq!(s.composer().input(), "/join ");
    type_text(&mut s, "rust");
    assert_eq!(s.submit(), Submitted::Command);
    assert_eq!(s.state().surface, Surface::Channel("#rust".into()));
    assert!(outbound.try_recv().is_err());
}

#[test]
fn mention_completion_round_trip() {
    let (mut s, mut outbound, _events) = session(4);
    type_text(&mut s, "thanks @Al");
    assert_eq!(s.composer().mention_suggestions(), ["albert", "alice"]);

    assert!(s.select_mention(1));
    assert_eq!(s.composer().input(), "thanks @alice ");
    assert!(s.composer().mention_suggestions().is_empty());

    type_text(&mut s, "!");
    assert_eq!(s.submit(), Submitted::Sent);
    assert_eq!(outbound.try_recv().unwrap().content, "thanks @alice !");
}

#[test]
fn geohash_surface_suggests_participants() {
    let (mut s, _outbound, _events) = session(4);
    s.switch_surface(Surface::Geohash("u4pruy".into()));
    type_text(&mut s, "@z");
    assert_eq!(s.composer().mention_suggestions(), ["zoe#4d7e"]);
}

#[test]
fn location_private_chat_mentions_resolve() {
    let (mut s, mut outbound, _events) = session(4);
    let zoe = GeoParticipant::new(KEY_ZOE, "zoe");
    s.switch_surface(Surface::PrivateChat(zoe.peer_id()));

    type_text(&mut s, "/hug @");
    assert_eq!(s.composer().mention_suggestions(), ["zoe#4d7e"]);
    assert!(s.select_mention(0));
    assert_eq!(s.submit(), Submitted::Command);

    let request = outbound.try_recv().unwrap();
    assert_eq!(request.content, "* me gives zoe#4d7e a warm hug \u{1fac2} *");
}

#[test]
fn channel_only_commands_appear_after_join() {
    let (mut s, _outbound, _events) = session(4);
    type_text(&mut s, "/tr");
    assert!(s.composer().command_suggestions().is_empty());
    s.set_input("");

    submit(&mut s, "/join rust");
    type_text(&mut s, "/tr");
    assert_eq!(s.composer().command_suggestions()[0].name, "/transfer");
}

// =============================================================================
// Events
// =============================================================================

#[test]
fn store_events_describe_the_session() {
    let (mut s, _outbound, mut events) = session(4);
    submit(&mut s, "/join rust");
    submit(&mut s, "/leave");

    let mut seen = Vec::new();
    while let Ok(event) = events.try_recv() {
        seen.push(event);
    }
    assert!(seen.iter().any(|e| matches!(e, StoreEvent::ChannelJoined { .. })));
    assert!(seen.iter().any(|e| matches!(e, StoreEvent::ChannelLeft(c) if c == "#rust")));
    assert_eq!(s.state().surface, Surface::Public);
}
