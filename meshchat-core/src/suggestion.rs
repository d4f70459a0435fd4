//! Command and `@mention` completion.
//!
//! Both filters are pure and recomputed from scratch on every edit.

use crate::commands::{CommandCatalog, CommandDefinition, DispatchContext, PeerSource};
use crate::state::AppState;

/// Commands whose name or an alias starts with `input`, ignoring case.
///
/// Empty unless `input` starts with `/`. Channel-only commands are offered
/// when `in_channel` is set. Sorted by canonical name.
#[must_use]
pub fn command_suggestions<'a>(
    catalog: &'a CommandCatalog,
    input: &str,
    in_channel: bool,
) -> Vec<&'a CommandDefinition> {
    if !input.starts_with('/') {
        return Vec::new();
    }
    let prefix = input.to_lowercase();
    catalog
        .available(in_channel)
        .into_iter()
        .filter(|c| c.starts_with(&prefix))
        .collect()
}

/// Text after the last `@`, if a mention is being typed.
fn mention_prefix(input: &str) -> Option<&str> {
    let at = input.rfind('@')?;
    let typed = &input[at + 1..];
    (!typed.contains(char::is_whitespace)).then_some(typed)
}

/// Names from `pool` that complete the mention being typed.
///
/// Empty when `input` has no `@` or whitespace follows the last one.
/// Matching ignores case; the result is sorted and de-duplicated.
#[must_use]
pub fn mention_suggestions(input: &str, pool: &[String]) -> Vec<String> {
    let Some(typed) = mention_prefix(input) else {
        return Vec::new();
    };
    let typed = typed.to_lowercase();

    let mut names: Vec<String> = pool
        .iter()
        .filter(|name| name.to_lowercase().starts_with(&typed))
        .cloned()
        .collect();
    names.sort_by(|a, b| a.to_lowercase().cmp(&b.to_lowercase()).then_with(|| a.cmp(b)));
    names.dedup();
    names
}

/// Input after choosing a command suggestion.
#[must_use]
pub fn apply_command(command: &CommandDefinition) -> String {
    format!("{} ", command.name)
}

/// Input after choosing mention `name`: everything from the last `@` is
/// replaced by `@name `.
#[must_use]
pub fn apply_mention(input: &str, name: &str) -> String {
    let head = input.rfind('@').map_or(input, |at| &input[..at]);
    format!("{head}@{name} ")
}

/// Names that can be mentioned on the active surface.
///
/// Drawn from the same peer list commands resolve names against: the
/// cell's display names on a location surface or in a private chat with
/// one of its participants, mesh nicknames otherwise. The local user is
/// never included.
#[must_use]
pub fn mention_pool(state: &AppState) -> Vec<String> {
    let ctx = DispatchContext::capture(state);
    match &ctx.peers {
        PeerSource::Geohash(cell) => state
            .geohash
            .display_names(cell, ctx.self_pubkey.as_deref()),
        PeerSource::Mesh => state.peers.nicknames(&ctx.self_id),
    }
}
