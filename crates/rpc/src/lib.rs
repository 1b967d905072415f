//! Generic, protocol-agnostic JSON-RPC 2.0 message pump.
//!
//! This crate knows nothing about the Language Server Protocol specifically:
//! it frames messages on a byte stream using the `Content-Length` header
//! convention shared by LSP and DAP, and correlates outgoing requests with
//! their responses. `kestrel-lsp-framework` builds the LSP-specific
//! vocabulary (`initialize`, `textDocument/didOpen`, ...) on top of the
//! [`Peer`] exposed here.

mod codec;
mod error;
mod message;
mod peer;

pub use codec::{read_message, write_message};
pub use error::{Error, Result};
pub use message::{AnyNotification, AnyRequest, AnyResponse, JsonValue, Message, RequestId, ResponseError};
pub use peer::{Peer, PeerEvent};
