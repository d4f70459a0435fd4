//! Integration tests for slash command dispatch.
//!
//! Drives `CommandDispatcher` against a `ChatStore` and an in-memory
//! outbound port, checking timeline feedback, state changes and the store
//! event stream.
//!
//! Verification command: `cargo test --test command_dispatch`

use tokio::sync::mpsc;

use meshchat_core::channel::ChannelError;
use meshchat_core::commands::CommandDispatcher;
use meshchat_core::geohash::GeoParticipant;
use meshchat_core::message::MessageOrigin;
use meshchat_core::outbound::{OutboundRequest, Scope};
use meshchat_core::peer::{Connectivity, PeerId, PeerInfo};
use meshchat_core::state::{AppState, Identity, Surface};
use meshchat_core::store::{Action, ChatStore, StoreError, StoreEvent};

// =============================================================================
// Helpers
// =============================================================================

const KEY_ZOE: &str = "7f3a9c2e41d06b58e9a1c4f27d3b8e60a5c91f2d4e7b0a3c6d9e2f5a8b1c4d7e";
const KEY_ME: &str = "c0ffee00c0ffee00c0ffee00c0ffee00c0ffee00c0ffee00c0ffee00c0ff1234";

struct Harness {
    dispatcher: CommandDispatcher,
    store: ChatStore,
    events: mpsc::Receiver<StoreEvent>,
    sent: Vec<OutboundRequest>,
}

impl Harness {
    fn new() -> Self {
        let mut state = AppState::new(Identity::new("me", "m1").with_nostr_pubkey(KEY_ME));
        state
            .peers
            .upsert(PeerInfo::new("a1", "alice").with_fingerprint("aaaa1111bbbb2222"));
        state.peers.upsert(PeerInfo::new("b1", "bob"));
        state.geohash.set_participants(
            "u4pruy",
            vec![GeoParticipant::new(KEY_ZOE, "zoe"), GeoParticipant::new(KEY_ME, "me")],
        );
        let (store, events) = ChatStore::new(state);
        Self {
            dispatcher: CommandDispatcher::new(),
            store,
            events,
            sent: Vec::new(),
        }
    }

    fn run(&mut self, line: &str) -> bool {
        self.dispatcher
            .dispatch(line, &mut self.store, &mut self.sent)
    }

    fn state(&self) -> &AppState {
        self.store.state()
    }

    fn messages(&self) -> Vec<String> {
        self.state()
            .current_messages()
            .iter()
            .map(|m| m.content.clone())
            .collect()
    }

    fn last(&self) -> String {
        self.messages().pop().unwrap_or_default()
    }

    fn drain(&mut self) -> Vec<StoreEvent> {
        let mut events = Vec::new();
        while let Ok(event) = self.events.try_recv() {
            events.push(event);
        }
        events
    }
}

// =============================================================================
// Dispatch entry
// =============================================================================

#[test]
fn non_command_lines_are_not_handled() {
    let mut h = Harness::new();
    for line in ["", "hello", "join #x", " /join x", "@alice /who", "#general"] {
        assert!(!h.run(line), "{line:?}");
    }
    assert!(h.messages().is_empty());
    assert!(h.sent.is_empty());
    assert!(h.drain().is_empty());
}

#[test]
fn unknown_command_is_handled_with_feedback() {
    let mut h = Harness::new();
    assert!(h.run("/frobnicate"));
    assert_eq!(
        h.messages(),
        ["unknown command: /frobnicate. type / to see available commands."]
    );
}

#[test]
fn missing_arguments_show_usage_without_side_effects() {
    let mut h = Harness::new();
    for (line, usage) in [
        ("/join", "usage: /join <channel> [password]"),
        ("/msg", "usage: /msg <nickname> [message]"),
        ("/unblock", "usage: /unblock <nickname>"),
        ("/hug", "usage: /hug <nickname>"),
        ("/slap", "usage: /slap <nickname>"),
    ] {
        assert!(h.run(line));
        assert_eq!(h.last(), usage);
    }
    assert_eq!(h.state().surface, Surface::Public);
    assert!(h.sent.is_empty());
}

// =============================================================================
// /join
// =============================================================================

#[test]
fn join_with_and_without_hash_is_the_same_channel() {
    let mut h = Harness::new();
    h.run("/join foo");
    h.run("/join #foo");
    assert_eq!(h.state().channels.joined(), ["#foo".to_string()]);
    assert_eq!(h.state().surface, Surface::Channel("#foo".into()));
    assert_eq!(h.last(), "switched to channel #foo");
}

#[test]
fn join_emits_store_events() {
    let mut h = Harness::new();
    h.run("/j rust");
    let events = h.drain();
    assert!(events.iter().any(|e| matches!(
        e,
        StoreEvent::ChannelJoined { channel, .. } if channel == "#rust"
    )));
    assert!(
        events
            .iter()
            .any(|e| matches!(e, StoreEvent::MessageAppended { .. }))
    );
}

#[test]
fn join_invalid_name_reports_reason() {
    let mut h = Harness::new();
    h.run("/join #");
    assert!(h.last().starts_with("cannot join '#'"));
    assert!(h.state().channels.joined().is_empty());
}

#[test]
fn join_password_creates_protected_channel() {
    let mut h = Harness::new();
    h.run("/join vault s3cret");
    assert!(h.state().channels.is_protected("#vault"));
    assert!(h.state().channels.key("#vault").is_some());
    assert_eq!(h.last(), "created password protected channel #vault");
}

// =============================================================================
// /msg
// =============================================================================

#[test]
fn msg_to_unknown_peer_produces_only_not_found() {
    let mut h = Harness::new();
    assert!(h.run("/msg bobby hi there"));
    assert_eq!(
        h.messages(),
        ["user 'bobby' not found. they may be offline or using a different nickname."]
    );
    assert!(h.state().private_chats.is_empty());
    assert_eq!(h.state().surface, Surface::Public);
    assert!(h.sent.is_empty());
}

#[test]
fn msg_with_text_sends_once_and_echoes() {
    let mut h = Harness::new();
    h.run("/msg alice hi there");
    assert_eq!(h.sent.len(), 1);
    assert_eq!(h.sent[0].scope, Scope::Direct);
    assert_eq!(h.sent[0].targets, [PeerId::new("a1")]);
    assert_eq!(h.sent[0].content, "hi there");

    let timeline = h.state().current_messages();
    assert_eq!(timeline.len(), 1);
    assert_eq!(timeline[0].origin, MessageOrigin::Outgoing);
    assert_eq!(timeline[0].id, h.sent[0].id);
    assert_eq!(h.state().private_chats, [PeerId::new("a1")]);
}

#[test]
fn msg_text_is_sent_as_typed() {
    let mut h = Harness::new();
    h.run("/msg alice  two  spaces\tand a tab");
    assert_eq!(h.sent.len(), 1);
    assert_eq!(h.sent[0].content, "two  spaces\tand a tab");
}

#[test]
fn msg_by_peer_id_resolves_collision() {
    let mut h = Harness::new();
    h.store
        .apply(Action::UpsertPeer(
            PeerInfo::new("a2", "alice").with_connectivity(Connectivity::Routed),
        ))
        .unwrap();

    h.run("/msg alice hello");
    assert!(h.sent.is_empty());
    assert!(h.last().contains("use a peer id instead"));

    h.run("/msg a2 hello");
    assert_eq!(h.sent.len(), 1);
    assert_eq!(h.sent[0].targets, [PeerId::new("a2")]);
}

#[test]
fn msg_prefers_the_only_reachable_peer() {
    let mut h = Harness::new();
    h.store
        .apply(Action::UpsertPeer(
            PeerInfo::new("a0", "alice").with_connectivity(Connectivity::Offline),
        ))
        .unwrap();
    h.run("/m alice ping");
    assert_eq!(h.sent[0].targets, [PeerId::new("a1")]);
}

// =============================================================================
// /who and geohash context
// =============================================================================

#[test]
fn who_switches_source_with_surface() {
    let mut h = Harness::new();
    h.run("/who");
    assert_eq!(h.last(), "online users: alice, bob");

    h.store
        .apply(Action::SwitchSurface(Surface::Geohash("u4pruy".into())))
        .unwrap();
    h.run("/who");
    assert_eq!(h.last(), "participants in #u4pruy: zoe#4d7e");

    h.store
        .apply(Action::SwitchSurface(Surface::Geohash("9q8yy".into())))
        .unwrap();
    h.run("/w");
    assert_eq!(h.last(), "no one else is in #9q8yy right now.");
}

#[test]
fn geohash_hug_goes_to_location_chat() {
    let mut h = Harness::new();
    h.store
        .apply(Action::SwitchSurface(Surface::Geohash("u4pruy".into())))
        .unwrap();
    h.run("/hug zoe");
    assert_eq!(h.sent.len(), 1);
    assert_eq!(h.sent[0].scope, Scope::Geohash("u4pruy".into()));
    assert_eq!(h.sent[0].content, "* me gives zoe#4d7e a warm hug \u{1fac2} *");
    assert!(h.sent[0].is_nostr());
}

#[test]
fn slap_in_channel_goes_to_channel() {
    let mut h = Harness::new();
    h.run("/join rust");
    h.run("/slap bob");
    assert_eq!(h.sent[0].scope, Scope::Channel("#rust".into()));
    assert_eq!(
        h.sent[0].content,
        "* me slaps bob around a bit with a large trout \u{1f41f} *"
    );
}

// =============================================================================
// /pass
// =============================================================================

#[test]
fn pass_by_non_creator_is_denied_and_password_unchanged() {
    let mut h = Harness::new();
    let key = meshchat_core::channel::derive_channel_key("original", "#x").unwrap();
    let commitment = meshchat_core::channel::key_commitment(&key);
    h.store
        .apply(Action::AnnounceChannel {
            channel: "#x".into(),
            creator: PeerId::new("a1"),
            commitment: Some(commitment.clone()),
        })
        .unwrap();
    h.run("/join #x original");
    assert_eq!(h.state().surface, Surface::Channel("#x".into()));

    h.run("/pass secret");
    assert_eq!(h.last(), "only the channel creator can change the password.");
    assert_eq!(h.state().channels.commitment("#x"), Some(commitment.as_str()));
}

#[test]
fn registry_rejects_non_creator_directly() {
    let mut h = Harness::new();
    h.store
        .apply(Action::AnnounceChannel {
            channel: "#x".into(),
            creator: PeerId::new("a1"),
            commitment: None,
        })
        .unwrap();
    h.run("/join x");
    let err = h
        .store
        .apply(Action::SetChannelPassword {
            channel: "#x".into(),
            password: Some("pw".into()),
        })
        .unwrap_err();
    assert!(matches!(
        err,
        StoreError::Channel(ChannelError::NotCreator(_))
    ));
}

// =============================================================================
// /block, /unblock, /clear, /channels
// =============================================================================

#[test]
fn blocking_stops_private_messages() {
    let mut h = Harness::new();
    h.run("/block alice");
    assert_eq!(
        h.last(),
        "blocked user alice. you will no longer receive messages from them."
    );
    h.run("/msg alice hi");
    assert!(h.sent.is_empty());
    assert_eq!(h.state().surface, Surface::Public);

    h.run("/unblock @alice");
    h.run("/msg alice hi");
    assert_eq!(h.sent.len(), 1);
}

#[test]
fn block_listing() {
    let mut h = Harness::new();
    h.run("/block");
    assert_eq!(h.last(), "no blocked users.");
    h.run("/block alice");
    h.run("/block alice");
    assert_eq!(h.last(), "user alice is already blocked.");
    h.run("/block");
    assert_eq!(h.last(), "blocked users: alice");
}

#[test]
fn unblock_unknown_name() {
    let mut h = Harness::new();
    h.run("/unblock ghost");
    assert_eq!(
        h.last(),
        "user 'ghost' not found. they may be offline or using a different nickname."
    );
}

#[test]
fn clear_reports_removed_count_in_event() {
    let mut h = Harness::new();
    h.run("/who");
    h.run("/channels");
    h.drain();
    h.run("/clear");
    assert!(h.messages().is_empty());
    assert!(h.drain().iter().any(|e| matches!(
        e,
        StoreEvent::TimelineCleared { removed: 2, surface: Surface::Public }
    )));
}
