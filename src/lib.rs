//! Thin HTTP relay between a browser wallet UI and blockchain nodes: cached
//! network snapshots, token enumeration and metadata, and server-side mints.

pub mod api;
pub mod app;
pub mod domain;
pub mod infrastructure;
pub mod validators;
