//! Asynchronous Language Server Protocol (LSP) client framework, built on
//! `tower`'s service abstractions and `kestrel-rpc`'s JSON-RPC peer.
//!
//! This crate is deliberately dumb about protocol *state*: it has no notion
//! of "a document", "a diagnostic", or "initialized vs not". It supplies the
//! reusable mechanics a protocol state machine is built from — the
//! `initialize` capability block, process supervision with a freshly-wired
//! [`kestrel_rpc::Peer`] on every restart, and (optionally) position
//! conversion against a rope. `kestrel-lsp` is the layer that turns these
//! into a stateful client.

mod capabilities;
mod error;
mod init;
mod sync_mode;

#[cfg(feature = "client-monitor")]
pub mod process;

#[cfg(feature = "stdio")]
pub mod stdio;

#[cfg(feature = "position")]
mod position;

pub use capabilities::client_capabilities;
pub use error::{Error, Result};
pub use init::{initialize_params, Trace, WorkspaceContext};
pub use sync_mode::{extract_sync_mode, SyncMode};

#[cfg(feature = "position")]
pub use position::{char_to_position, chars_to_range, full_change, incremental_change, position_to_char, range_to_chars};

pub use kestrel_rpc::{Peer, PeerEvent};
