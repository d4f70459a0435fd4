//! Configuration for the `MeshChat` client.
//!
//! Supports layered configuration with the following priority (highest first):
//! 1. CLI arguments
//! 2. Environment variables (via clap `env` attribute)
//! 3. TOML config file (`~/.config/meshchat/config.toml`)
//! 4. Compiled defaults
//!
//! Missing config file is not an error (defaults are used). An explicit
//! `--config` path that doesn't exist is an error.

use std::path::PathBuf;

use meshchat_core::composer::DEFAULT_MAX_SUGGESTIONS;
use meshchat_core::geohash::normalize_geohash;
use meshchat_core::outbound::DEFAULT_OUTBOUND_CAPACITY;
use meshchat_core::peer::PeerId;
use meshchat_core::state::{Identity, Surface};
use meshchat_core::store::DEFAULT_EVENT_CAPACITY;

/// Errors that can occur when loading configuration.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    /// Failed to read the configuration file.
    #[error("failed to read config file {path}: {source}")]
    ReadFile {
        /// Path that was attempted.
        path: PathBuf,
        /// Underlying I/O error.
        source: std::io::Error,
    },

    /// Failed to parse the TOML configuration.
    #[error("failed to parse config file: {0}")]
    ParseToml(#[from] toml::de::Error),

    /// Nickname is empty or contains whitespace.
    #[error("invalid nickname '{0}': must be non-empty without spaces")]
    InvalidNickname(String),

    /// The starting geohash is not a valid geohash.
    #[error("invalid geohash '{0}'")]
    InvalidGeohash(String),
}

// ---------------------------------------------------------------------------
// TOML file structs (all fields Option for partial overrides)
// ---------------------------------------------------------------------------

/// Top-level TOML config file structure.
#[derive(Debug, Default, serde::Deserialize)]
#[serde(default)]
struct ConfigFile {
    identity: IdentityFileConfig,
    network: NetworkFileConfig,
    ui: UiFileConfig,
}

/// `[identity]` section of the config file.
#[derive(Debug, Default, serde::Deserialize)]
#[serde(default)]
struct IdentityFileConfig {
    nickname: Option<String>,
    peer_id: Option<String>,
    nostr_pubkey: Option<String>,
}

/// `[network]` section of the config file.
#[derive(Debug, Default, serde::Deserialize)]
#[serde(default)]
struct NetworkFileConfig {
    outbound_capacity: Option<usize>,
    event_capacity: Option<usize>,
}

/// `[ui]` section of the config file.
#[derive(Debug, Default, serde::Deserialize)]
#[serde(default)]
struct UiFileConfig {
    timestamp_format: Option<String>,
    max_suggestions: Option<usize>,
}

// ---------------------------------------------------------------------------
// Resolved configuration
// ---------------------------------------------------------------------------

/// Fully resolved client configuration.
#[derive(Debug, Clone)]
pub struct ClientConfig {
    // -- Identity --
    /// Nickname announced on the mesh.
    pub nickname: String,
    /// Local mesh peer id; generated per run when unset.
    pub peer_id: Option<String>,
    /// Hex public key for geohash chats.
    pub nostr_pubkey: Option<String>,

    // -- Network --
    /// Capacity of the outbound request channel.
    pub outbound_capacity: usize,
    /// Capacity of the store event channel.
    pub event_capacity: usize,

    // -- UI --
    /// Timestamp display format string (chrono).
    pub timestamp_format: String,
    /// Maximum suggestions shown per list.
    pub max_suggestions: usize,
    /// Geohash cell to start in instead of the public timeline.
    pub geohash: Option<String>,
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self {
            nickname: "anon".to_string(),
            peer_id: None,
            nostr_pubkey: None,
            outbound_capacity: DEFAULT_OUTBOUND_CAPACITY,
            event_capacity: DEFAULT_EVENT_CAPACITY,
            timestamp_format: "%H:%M".to_string(),
            max_suggestions: DEFAULT_MAX_SUGGESTIONS,
            geohash: None,
        }
    }
}

impl ClientConfig {
    /// Load configuration by merging CLI args, env vars, and a TOML file.
    ///
    /// If `--config` is given and the file does not exist, returns an
    /// error. Otherwise the default path (`~/.config/meshchat/config.toml`)
    /// is tried and silently ignored if missing.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError`] if the config file cannot be read or parsed,
    /// or if the resolved nickname or geohash is invalid.
    pub fn load(cli: &CliArgs) -> Result<Self, ConfigError> {
        let file = load_config_file(cli.config.as_deref())?;
        let config = Self::resolve(cli, &file);
        config.validate()
    }

    /// Resolve a `ClientConfig` from CLI args and a parsed config file.
    ///
    /// Priority: CLI > file > default. Separated from `load()` to enable
    /// unit testing without CLI parsing.
    #[must_use]
    fn resolve(cli: &CliArgs, file: &ConfigFile) -> Self {
        let defaults = Self::default();

        Self {
            nickname: cli
                .nickname
                .clone()
                .or_else(|| file.identity.nickname.clone())
                .unwrap_or(defaults.nickname),
            peer_id: cli
                .peer_id
                .clone()
                .or_else(|| file.identity.peer_id.clone()),
            nostr_pubkey: file.identity.nostr_pubkey.clone(),
            outbound_capacity: file
                .network
                .outbound_capacity
                .unwrap_or(defaults.outbound_capacity),
            event_capacity: file
                .network
                .event_capacity
                .unwrap_or(defaults.event_capacity),
            timestamp_format: cli
                .timestamp_format
                .clone()
                .or_else(|| file.ui.timestamp_format.clone())
                .unwrap_or(defaults.timestamp_format),
            max_suggestions: file
                .ui
                .max_suggestions
                .unwrap_or(defaults.max_suggestions),
            geohash: cli.geohash.clone(),
        }
    }

    /// Checks the nickname and normalises the starting geohash.
    fn validate(mut self) -> Result<Self, ConfigError> {
        if self.nickname.is_empty() || self.nickname.contains(char::is_whitespace) {
            return Err(ConfigError::InvalidNickname(self.nickname));
        }
        if let Some(raw) = self.geohash.take() {
            let geohash = normalize_geohash(&raw).ok_or(ConfigError::InvalidGeohash(raw))?;
            self.geohash = Some(geohash);
        }
        Ok(self)
    }

    /// Local identity; a fresh peer id is generated if none is configured.
    #[must_use]
    pub fn identity(&self) -> Identity {
        let peer_id = self
            .peer_id
            .clone()
            .map_or_else(PeerId::generate, PeerId::new);
        let identity = Identity {
            nickname: self.nickname.clone(),
            peer_id,
            nostr_pubkey: None,
        };
        match &self.nostr_pubkey {
            Some(key) => identity.with_nostr_pubkey(key),
            None => identity,
        }
    }

    /// Surface shown at startup.
    #[must_use]
    pub fn start_surface(&self) -> Surface {
        self.geohash
            .clone()
            .map_or(Surface::Public, Surface::Geohash)
    }
}

/// CLI arguments parsed by clap.
#[derive(clap::Parser, Debug, Default)]
#[command(version, about = "Mesh and location chat command shell")]
pub struct CliArgs {
    /// Nickname announced on the mesh.
    #[arg(short, long, env = "MESHCHAT_NICKNAME")]
    pub nickname: Option<String>,

    /// Local mesh peer id (default: generated per run).
    #[arg(long, env = "MESHCHAT_PEER_ID")]
    pub peer_id: Option<String>,

    /// Start in the location chat of this geohash cell.
    #[arg(long)]
    pub geohash: Option<String>,

    /// Path to config file (default: `~/.config/meshchat/config.toml`).
    #[arg(short, long)]
    pub config: Option<PathBuf>,

    /// Timestamp display format (chrono format string).
    #[arg(long)]
    pub timestamp_format: Option<String>,

    /// Log level filter (trace, debug, info, warn, error).
    #[arg(long, default_value = "info", env = "MESHCHAT_LOG")]
    pub log_level: String,

    /// Path to log file (default: `$TMPDIR/meshchat.log`).
    #[arg(long)]
    pub log_file: Option<PathBuf>,
}

// ---------------------------------------------------------------------------
// Internal helpers
// ---------------------------------------------------------------------------

/// Load and parse a TOML config file.
///
/// If `explicit_path` is `Some`, the file must exist (error if not).
/// If `explicit_path` is `None`, the default path is tried and a missing
/// file is treated as empty config.
fn load_config_file(explicit_path: Option<&std::path::Path>) -> Result<ConfigFile, ConfigError> {
    if let Some(p) = explicit_path {
        let contents = std::fs::read_to_string(p).map_err(|e| ConfigError::ReadFile {
            path: p.to_path_buf(),
            source: e,
        })?;
        return Ok(toml::from_str(&contents)?);
    }

    let Some(config_dir) = dirs::config_dir() else {
        return Ok(ConfigFile::default());
    };
    let path = config_dir.join("meshchat").join("config.toml");

    match std::fs::read_to_string(&path) {
        Ok(contents) => Ok(toml::from_str(&contents)?),
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(ConfigFile::default()),
        Err(e) => Err(ConfigError::ReadFile { path, source: e }),
    }
}
