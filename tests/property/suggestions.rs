//! Property-based tests for command and mention completion.
//!
//! Uses proptest to verify:
//! 1. A command is suggested for `/` + prefix iff the prefix (any case)
//!    starts its name or one of its aliases.
//! 2. Mention suggestions are empty without `@` or with whitespace after it.
//! 3. Mention suggestions are sorted, unique and drawn from the pool.
//! 4. Applying a mention keeps everything before the last `@`.
//! 5. Lines without a leading `/` are never dispatched.

use proptest::prelude::*;

use meshchat_core::commands::{CommandCatalog, CommandDispatcher};
use meshchat_core::outbound::OutboundRequest;
use meshchat_core::state::{AppState, Identity};
use meshchat_core::store::ChatStore;
use meshchat_core::suggestion::{apply_mention, command_suggestions, mention_suggestions};

// --- Strategies ---

/// Typed command prefixes, biased towards real command letters.
fn arb_command_prefix() -> impl Strategy<Value = String> {
    prop_oneof![
        "[a-zA-Z]{0,9}",
        "(j|J|m|M|w|W|c|C|p|P|b|B|u|U|h|H|s|S|t|T|l|L)[a-zA-Z]{0,6}",
    ]
}

/// Nickname pools with mixed case and duplicates.
fn arb_pool() -> impl Strategy<Value = Vec<String>> {
    prop::collection::vec("[a-zA-Z][a-zA-Z0-9_]{0,8}", 0..12)
}

// --- Properties ---

proptest! {
    #[test]
    fn command_suggested_iff_prefix_matches(prefix in arb_command_prefix(), in_channel in any::<bool>()) {
        let catalog = CommandCatalog::new();
        let input = format!("/{prefix}");
        let suggested: Vec<&str> = command_suggestions(&catalog, &input, in_channel)
            .iter()
            .map(|c| c.name)
            .collect();

        let typed = input.to_lowercase();
        for cmd in catalog.available(in_channel) {
            let expected = cmd.name.starts_with(&typed)
                || cmd.aliases.iter().any(|a| a.starts_with(&typed));
            prop_assert_eq!(suggested.contains(&cmd.name), expected, "{} for {}", cmd.name, input);
        }

        let mut sorted = suggested.clone();
        sorted.sort_unstable();
        prop_assert_eq!(suggested, sorted);
    }

    #[test]
    fn no_slash_no_command_suggestions(input in "[^/].{0,20}") {
        let catalog = CommandCatalog::new();
        prop_assert!(command_suggestions(&catalog, &input, true).is_empty());
    }

    #[test]
    fn mentions_need_an_open_at(text in "[^@]{0,20}", pool in arb_pool()) {
        prop_assert!(mention_suggestions(&text, &pool).is_empty());
    }

    #[test]
    fn whitespace_after_at_closes_mention(
        head in "[a-z ]{0,10}",
        name in "[a-z]{0,6}",
        tail in "[a-z]{0,6}",
        pool in arb_pool(),
    ) {
        let input = format!("{head}@{name} {tail}");
        prop_assert!(mention_suggestions(&input, &pool).is_empty());
    }

    #[test]
    fn mention_results_are_sorted_unique_prefix_matches(
        head in "[a-z ]{0,10}",
        typed in "[a-zA-Z]{0,2}",
        pool in arb_pool(),
    ) {
        let input = format!("{head}@{typed}");
        let found = mention_suggestions(&input, &pool);

        let lowered = typed.to_lowercase();
        for name in &found {
            prop_assert!(pool.contains(name));
            prop_assert!(name.to_lowercase().starts_with(&lowered));
        }
        for name in &pool {
            if name.to_lowercase().starts_with(&lowered) {
                prop_assert!(found.contains(name));
            }
        }
        for pair in found.windows(2) {
            prop_assert!(pair[0] != pair[1]);
            prop_assert!(pair[0].to_lowercase() <= pair[1].to_lowercase());
        }
    }

    #[test]
    fn applying_mention_keeps_prefix(
        head in "[a-z@ ]{0,12}",
        typed in "[a-z]{0,5}",
        name in "[a-z]{1,8}",
    ) {
        let input = format!("{head}@{typed}");
        let applied = apply_mention(&input, &name);
        prop_assert_eq!(applied, format!("{head}@{name} "));
    }

    #[test]
    fn plain_lines_are_never_dispatched(line in "[^/].{0,40}") {
        let dispatcher = CommandDispatcher::new();
        let (mut store, _rx) = ChatStore::new(AppState::new(Identity::new("me", "m1")));
        let mut sent: Vec<OutboundRequest> = Vec::new();

        prop_assert!(!dispatcher.dispatch(&line, &mut store, &mut sent));
        prop_assert!(store.state().current_messages().is_empty());
        prop_assert!(sent.is_empty());
    }
}
