//! Glue between the CLI and the staycast crates.
//!
//! Artifact directory resolution and the HTTP surface of the gateway.

pub(crate) mod artifacts;
pub(crate) mod server;
