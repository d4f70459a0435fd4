//! Channel commands: `/join`, `/leave`, `/pass`, `/transfer`, `/channels`.

use super::Invocation;
use super::peers::{Target, resolve_target};
use crate::channel::{ChannelError, JoinOutcome, PasswordChange, normalize_channel_name};
use crate::store::{Action, ChatStore, StoreError, StoreEvent};

pub(super) fn join(inv: &Invocation<'_>, store: &mut ChatStore) {
    if inv.ctx.surface.is_geohash() {
        store.notify("channels are only available on the mesh. use /public to leave the location chat first.");
        return;
    }
    let Some(raw) = inv.arg(0) else {
        store.notify(inv.usage());
        return;
    };
    let channel = match normalize_channel_name(raw) {
        Ok(channel) => channel,
        Err(e) => {
            store.notify(format!("cannot join '{raw}': {e}"));
            return;
        }
    };
    let password = inv.arg(1).map(str::to_string);
    let protected = password.is_some();

    let result = store.apply(Action::JoinChannel {
        channel: channel.clone(),
        password,
    });
    match result {
        Ok(StoreEvent::ChannelJoined { outcome, .. }) => {
            tracing::info!(%channel, ?outcome, "joined channel");
            let text = match outcome {
                JoinOutcome::Created if protected => {
                    format!("created password protected channel {channel}")
                }
                JoinOutcome::Created => format!("created channel {channel}"),
                JoinOutcome::Joined => format!("joined channel {channel}"),
                JoinOutcome::Rejoined => format!("switched to channel {channel}"),
            };
            store.notify(text);
        }
        Ok(_) => {}
        Err(StoreError::Channel(ChannelError::PasswordRequired(_))) => store.notify(format!(
            "channel {channel} is password protected. use /join {channel} <password>"
        )),
        Err(StoreError::Channel(ChannelError::WrongPassword(_))) => {
            store.notify(format!("wrong password for channel {channel}."));
        }
        Err(e) => {
            tracing::warn!(%channel, error = %e, "join failed");
            store.notify(format!("cannot join {channel}: {e}"));
        }
    }
}

pub(super) fn leave(inv: &Invocation<'_>, store: &mut ChatStore) {
    let Some(channel) = inv.ctx.surface.channel() else {
        store.notify("you are not in a channel.");
        return;
    };
    match store.apply(Action::LeaveChannel(channel.to_string())) {
        Ok(_) => {
            tracing::info!(%channel, "left channel");
            store.notify(format!("left channel {channel}"));
        }
        Err(e) => store.notify(format!("cannot leave {channel}: {e}")),
    }
}

pub(super) fn pass(inv: &Invocation<'_>, store: &mut ChatStore) {
    let Some(channel) = inv.ctx.surface.channel() else {
        store.notify("you must be in a channel to set a password.");
        return;
    };
    if store.state().channels.creator(channel) != Some(&inv.ctx.self_id) {
        store.notify("only the channel creator can change the password.");
        return;
    }

    let result = store.apply(Action::SetChannelPassword {
        channel: channel.to_string(),
        password: inv.arg(0).map(str::to_string),
    });
    match result {
        Ok(StoreEvent::ChannelPasswordChanged { change, .. }) => {
            tracing::info!(%channel, ?change, "channel password changed");
            store.notify(match change {
                PasswordChange::Set => format!("password changed for channel {channel}"),
                PasswordChange::Removed => format!("password removed from channel {channel}"),
            });
        }
        Ok(_) => {}
        Err(StoreError::Channel(ChannelError::NotCreator(_))) => {
            store.notify("only the channel creator can change the password.");
        }
        Err(e) => store.notify(format!("cannot change password: {e}")),
    }
}

pub(super) fn transfer(inv: &Invocation<'_>, store: &mut ChatStore) {
    let Some(channel) = inv.ctx.surface.channel() else {
        store.notify("you must be in a channel to transfer ownership.");
        return;
    };
    let Some(raw) = inv.arg(0) else {
        store.notify(inv.usage());
        return;
    };
    if store.state().channels.creator(channel) != Some(&inv.ctx.self_id) {
        store.notify("only the channel creator can transfer ownership.");
        return;
    }

    let peer = match resolve_target(&inv.ctx, store.state(), raw) {
        Ok(Target::Mesh(peer)) => peer,
        Ok(Target::Geohash(_)) => {
            store.notify("ownership can only be transferred to a mesh peer.");
            return;
        }
        Err(text) => {
            store.notify(text);
            return;
        }
    };
    if peer.id == inv.ctx.self_id {
        store.notify(format!("you already own {channel}."));
        return;
    }

    let result = store.apply(Action::TransferChannel {
        channel: channel.to_string(),
        new_creator: peer.id.clone(),
    });
    match result {
        Ok(_) => {
            tracing::info!(%channel, peer = %peer.id, "channel ownership transferred");
            store.notify(format!(
                "transferred ownership of {channel} to {}",
                peer.nickname
            ));
        }
        Err(e) => store.notify(format!("cannot transfer {channel}: {e}")),
    }
}

pub(super) fn list(store: &mut ChatStore) {
    let joined = store.state().channels.joined();
    let text = if joined.is_empty() {
        "no channels joined.".to_string()
    } else {
        format!("joined channels: {}", joined.join(", "))
    };
    store.notify(text);
}
