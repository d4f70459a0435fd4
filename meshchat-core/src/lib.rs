//! `MeshChat` core: slash commands, completion and chat state for a mesh
//! and location chat client.

pub mod channel;
pub mod commands;
pub mod composer;
pub mod disambiguation;
pub mod geohash;
pub mod message;
pub mod outbound;
pub mod peer;
pub mod session;
pub mod state;
pub mod store;
pub mod suggestion;
