//! Mesh channel membership and password protection.
//!
//! Contains the [`ChannelRegistry`], which tracks the channels the local user
//! has joined, who created each channel, and which channels are protected by
//! a password.
//!
//! # Password protection
//!
//! A channel password is never stored. It is stretched into a 32-byte
//! channel key with HKDF-SHA256 (salt = channel name) and only the key
//! commitment, `hex(SHA-256(key))`, is kept for verification. Keys for
//! joined channels are held in [`Zeroizing`] buffers so they are wiped when
//! the channel is left.

use std::collections::HashMap;

use hkdf::Hkdf;
use sha2::{Digest, Sha256};
use zeroize::Zeroizing;

use crate::peer::PeerId;

/// Maximum number of channels that can be joined at once.
pub const MAX_CHANNELS: usize = 64;

/// Maximum length of a channel name in characters, including the `#`.
pub const MAX_NAME_LEN: usize = 32;

/// HKDF info string binding derived keys to their purpose.
const CHANNEL_KEY_INFO: &[u8] = b"meshchat-channel-key";

/// A derived 32-byte channel key, wiped on drop.
pub type ChannelKey = Zeroizing<[u8; 32]>;

/// Errors that can occur during channel operations.
#[derive(Debug, thiserror::Error, PartialEq, Eq)]
pub enum ChannelError {
    /// Channel name is empty (or only `#`).
    #[error("channel name cannot be empty")]
    NameEmpty,

    /// Channel name exceeds the maximum allowed length.
    #[error("channel name too long (max {MAX_NAME_LEN} characters)")]
    NameTooLong,

    /// Channel name contains whitespace or control characters.
    #[error("channel name '{0}' contains invalid characters")]
    NameInvalidChars(String),

    /// Maximum number of joined channels reached.
    #[error("channel limit reached (max {MAX_CHANNELS})")]
    ChannelLimitReached,

    /// The local user is not a member of the channel.
    #[error("not a member of channel {0}")]
    NotJoined(String),

    /// The operation requires the channel creator.
    #[error("only the channel creator can change {0}")]
    NotCreator(String),

    /// The channel is protected and no password was given.
    #[error("channel {0} is password protected")]
    PasswordRequired(String),

    /// The given password does not match the channel's commitment.
    #[error("wrong password for channel {0}")]
    WrongPassword(String),

    /// Deriving the channel key failed.
    #[error("key derivation failed for channel {channel}: {reason}")]
    KeyDerivation {
        /// Channel whose key could not be derived.
        channel: String,
        /// Underlying failure.
        reason: String,
    },
}

/// How a successful join came about.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum JoinOutcome {
    /// The channel did not exist and the local user is now its creator.
    Created,
    /// Joined an existing channel.
    Joined,
    /// The channel was already joined; it was only re-selected.
    Rejoined,
}

/// Result of a password change.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PasswordChange {
    /// A password was set or replaced.
    Set,
    /// Password protection was removed.
    Removed,
}

/// Normalises a typed channel name and validates it.
///
/// Adds a leading `#` when missing, so `foo` and `#foo` name the same
/// channel. Names are case-sensitive.
///
/// # Errors
///
/// Returns [`ChannelError`] if the name is empty, too long, or contains
/// whitespace or control characters.
pub fn normalize_channel_name(raw: &str) -> Result<String, ChannelError> {
    let trimmed = raw.trim();
    let name = if trimmed.starts_with('#') {
        trimmed.to_string()
    } else {
        format!("#{trimmed}")
    };

    if name.len() == 1 {
        return Err(ChannelError::NameEmpty);
    }

    if name.chars().count() > MAX_NAME_LEN {
        return Err(ChannelError::NameTooLong);
    }

    if name[1..]
        .chars()
        .any(|c| c.is_whitespace() || c.is_control() || c == '#')
    {
        return Err(ChannelError::NameInvalidChars(name));
    }

    Ok(name)
}

/// Derives the channel key for `password` in `channel`.
///
/// # Errors
///
/// Returns [`ChannelError::KeyDerivation`] if HKDF rejects the output
/// length.
pub fn derive_channel_key(password: &str, channel: &str) -> Result<ChannelKey, ChannelError> {
    let hk = Hkdf::<Sha256>::new(Some(channel.as_bytes()), password.as_bytes());
    let mut okm = Zeroizing::new([0u8; 32]);
    hk.expand(CHANNEL_KEY_INFO, &mut okm[..])
        .map_err(|e| ChannelError::KeyDerivation {
            channel: channel.to_string(),
            reason: e.to_string(),
        })?;
    Ok(okm)
}

/// Hex-encoded SHA-256 commitment to a channel key.
#[must_use]
pub fn key_commitment(key: &ChannelKey) -> String {
    hex::encode(Sha256::digest(key.as_slice()))
}

/// Tracks joined channels, creators and password commitments.
#[derive(Clone, Default)]
pub struct ChannelRegistry {
    /// Joined channels in join order.
    joined: Vec<String>,
    /// Known channel creators, including channels not joined.
    creators: HashMap<String, PeerId>,
    /// Key commitments of password-protected channels.
    commitments: HashMap<String, String>,
    /// Derived keys of joined protected channels.
    keys: HashMap<String, ChannelKey>,
}

impl std::fmt::Debug for ChannelRegistry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ChannelRegistry")
            .field("joined", &self.joined)
            .field("creators", &self.creators)
            .field("protected", &self.commitments.keys().collect::<Vec<_>>())
            .finish_non_exhaustive()
    }
}

impl ChannelRegistry {
    /// Creates an empty registry.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Records a channel announced by another peer.
    ///
    /// Does not join the channel. A `commitment` marks it as protected.
    pub fn announce(&mut self, channel: &str, creator: PeerId, commitment: Option<String>) {
        self.creators.entry(channel.to_string()).or_insert(creator);
        if let Some(commitment) = commitment {
            self.commitments.insert(channel.to_string(), commitment);
        }
    }

    /// Joins (or creates) a channel.
    ///
    /// `channel` must already be normalised. A channel nobody has announced
    /// is created with `self_id` as creator, protected by `password` if one
    /// is given. A protected channel requires the matching password unless
    /// its key is already held.
    ///
    /// # Errors
    ///
    /// Returns [`ChannelError`] if:
    /// - The channel is protected and no password was given
    /// - The password does not match the channel's commitment
    /// - The channel limit ([`MAX_CHANNELS`]) has been reached
    /// - Key derivation fails
    pub fn join(
        &mut self,
        channel: &str,
        password: Option<&str>,
        self_id: &PeerId,
    ) -> Result<JoinOutcome, ChannelError> {
        let already_joined = self.is_joined(channel);

        if let Some(expected) = self.commitments.get(channel) {
            let has_key = self.keys.contains_key(channel);
            let key = match (password, has_key) {
                (Some(pw), _) => {
                    let key = derive_channel_key(pw, channel)?;
                    if key_commitment(&key) != *expected {
                        return Err(ChannelError::WrongPassword(channel.to_string()));
                    }
                    Some(key)
                }
                (None, true) => None,
                (None, false) => return Err(ChannelError::PasswordRequired(channel.to_string())),
            };

            if !already_joined {
                self.ensure_capacity()?;
                self.joined.push(channel.to_string());
            }
            if let Some(key) = key {
                self.keys.insert(channel.to_string(), key);
            }
            return Ok(if already_joined {
                JoinOutcome::Rejoined
            } else {
                JoinOutcome::Joined
            });
        }

        if already_joined {
            return Ok(JoinOutcome::Rejoined);
        }

        self.ensure_capacity()?;
        let created = !self.creators.contains_key(channel);
        if created {
            if let Some(pw) = password {
                let key = derive_channel_key(pw, channel)?;
                self.commitments
                    .insert(channel.to_string(), key_commitment(&key));
                self.keys.insert(channel.to_string(), key);
            }
            self.creators.insert(channel.to_string(), self_id.clone());
        }
        self.joined.push(channel.to_string());

        Ok(if created {
            JoinOutcome::Created
        } else {
            JoinOutcome::Joined
        })
    }

    /// Leaves a joined channel and wipes its key.
    ///
    /// # Errors
    ///
    /// Returns [`ChannelError::NotJoined`] if the channel is not joined.
    pub fn leave(&mut self, channel: &str) -> Result<(), ChannelError> {
        let pos = self
            .joined
            .iter()
            .position(|c| c == channel)
            .ok_or_else(|| ChannelError::NotJoined(channel.to_string()))?;
        self.joined.remove(pos);
        self.keys.remove(channel);
        Ok(())
    }

    /// Sets or removes the password of a channel.
    ///
    /// # Errors
    ///
    /// Returns [`ChannelError`] if:
    /// - The channel is not joined ([`ChannelError::NotJoined`])
    /// - `requester` is not the creator ([`ChannelError::NotCreator`])
    /// - Key derivation fails
    pub fn set_password(
        &mut self,
        channel: &str,
        password: Option<&str>,
        requester: &PeerId,
    ) -> Result<PasswordChange, ChannelError> {
        self.require_creator(channel, requester, "the password")?;

        match password {
            Some(pw) => {
                let key = derive_channel_key(pw, channel)?;
                self.commitments
                    .insert(channel.to_string(), key_commitment(&key));
                self.keys.insert(channel.to_string(), key);
                Ok(PasswordChange::Set)
            }
            None => {
                self.commitments.remove(channel);
                self.keys.remove(channel);
                Ok(PasswordChange::Removed)
            }
        }
    }

    /// Hands channel ownership to another peer.
    ///
    /// # Errors
    ///
    /// Returns [`ChannelError::NotJoined`] or [`ChannelError::NotCreator`].
    pub fn transfer(
        &mut self,
        channel: &str,
        new_creator: PeerId,
        requester: &PeerId,
    ) -> Result<(), ChannelError> {
        self.require_creator(channel, requester, "ownership")?;
        self.creators.insert(channel.to_string(), new_creator);
        Ok(())
    }

    /// Returns `true` if the channel is joined.
    #[must_use]
    pub fn is_joined(&self, channel: &str) -> bool {
        self.joined.iter().any(|c| c == channel)
    }

    /// Joined channels in join order.
    #[must_use]
    pub fn joined(&self) -> &[String] {
        &self.joined
    }

    /// Creator of a channel, if known.
    #[must_use]
    pub fn creator(&self, channel: &str) -> Option<&PeerId> {
        self.creators.get(channel)
    }

    /// Returns `true` if the channel is password protected.
    #[must_use]
    pub fn is_protected(&self, channel: &str) -> bool {
        self.commitments.contains_key(channel)
    }

    /// Key commitment of a protected channel.
    #[must_use]
    pub fn commitment(&self, channel: &str) -> Option<&str> {
        self.commitments.get(channel).map(String::as_str)
    }

    /// Derived key of a joined protected channel.
    #[must_use]
    pub fn key(&self, channel: &str) -> Option<&ChannelKey> {
        self.keys.get(channel)
    }

    fn ensure_capacity(&self) -> Result<(), ChannelError> {
        if self.joined.len() >= MAX_CHANNELS {
            return Err(ChannelError::ChannelLimitReached);
        }
        Ok(())
    }

    fn require_creator(
        &self,
        channel: &str,
        requester: &PeerId,
        what: &str,
    ) -> Result<(), ChannelError> {
        if !self.is_joined(channel) {
            return Err(ChannelError::NotJoined(channel.to_string()));
        }
        if self.creators.get(channel) != Some(requester) {
            return Err(ChannelError::NotCreator(what.to_string()));
        }
        Ok(())
    }
}
