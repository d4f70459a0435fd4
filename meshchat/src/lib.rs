//! `MeshChat` client: configuration and the line-based app loop.

pub mod app;
pub mod config;
