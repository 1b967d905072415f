//! Registry of per-language LSP clients, document synchronization, and the
//! typed, capability-gated request surface built on top of them.
//!
//! [`registry::Registry`] owns one [`client::ClientHandle`] per configured
//! language, spawned lazily and kept alive for the life of the process.
//! [`sync::DocumentSync`] drives the open/close/change lifecycle for
//! documents against whatever language their path resolves to, and
//! [`client::api`] layers the rest of the protocol (navigation, rename, code
//! actions, formatting, inlay hints, pull diagnostics, file operations) over
//! [`client::ClientHandle`] as typed, capability-gated methods. How a server
//! actually gets spawned and talked to is abstracted behind
//! [`client::transport::LspTransport`]; [`process_transport::ProcessTransport`]
//! is the production implementation, wiring a real child process per
//! language through `kestrel-lsp-framework`'s process supervision.

pub mod client;
pub mod host;
#[cfg(feature = "client-monitor")]
pub mod process_transport;
pub mod registry;
pub mod sync;
mod error;
mod uri;

pub use error::{Error, Result};
pub use host::{BufferEdit, BufferEditor, NoopBufferEditor, NoopProgressSink, ProgressSink};
pub use kestrel_rpc::{AnyNotification, AnyRequest, AnyResponse, JsonValue, RequestId, ResponseError};
pub use registry::{LanguageFeatures, LanguageServerConfig, LanguageServerId, Registry};
pub use uri::uri_from_path;
