use std::time::Duration;

use async_trait::async_trait;
use kestrel_lsp_framework::Trace;
use kestrel_rpc::{AnyNotification, AnyRequest, AnyResponse, JsonValue, RequestId, ResponseError};
use tokio::sync::{mpsc, oneshot};

use crate::error::Result;
use crate::registry::LanguageServerId;

/// What the host tells a freshly-spawned server about the project being opened.
#[derive(Debug, Clone, Default)]
pub struct ServerConfig {
	/// Which configured language this session is for — a real transport
	/// looks this up against its own command table to know what to launch;
	/// the protocol state machine never inspects it itself.
	pub language_id: String,
	pub root_uri: Option<lsp_types::Uri>,
	pub root_path: Option<String>,
	pub workspace_folders: Vec<lsp_types::WorkspaceFolder>,
	pub initialization_options: Option<JsonValue>,
	pub trace: Trace,
}

/// A freshly spawned server's identity, handed back from [`LspTransport::start`].
pub struct StartedServer {
	pub id: LanguageServerId,
}

/// Something a running server sent us that isn't a response to one of our
/// own requests: a notification, a server-initiated request, or the session
/// closing. Scoped by [`LanguageServerId`] so one event stream can multiplex
/// every concurrently-running server.
#[derive(Debug, Clone)]
pub enum TransportEvent {
	Notification { server: LanguageServerId, notif: AnyNotification },
	Request { server: LanguageServerId, req: AnyRequest },
	Closed { server: LanguageServerId },
}

/// The seam between the protocol state machine ([`crate::client::Client`])
/// and however a server actually gets spawned and talked to. Production code
/// wires this to [`kestrel_lsp_framework::process::ServerProcess`] plus a
/// [`kestrel_rpc::Peer`] per language; tests substitute an in-memory double.
#[async_trait]
pub trait LspTransport: Send + Sync {
	/// Subscribes to events for every server this transport manages. Callers
	/// filter by `server` for the session they care about.
	fn subscribe_events(&self) -> Result<mpsc::UnboundedReceiver<TransportEvent>>;

	async fn start(&self, cfg: ServerConfig) -> Result<StartedServer>;

	async fn notify(&self, server: LanguageServerId, notif: AnyNotification) -> Result<()>;

	/// Sends a notification and returns a receiver that resolves once the
	/// server has observably processed it (a commit-boundary acknowledgment),
	/// used to guard `force_full_sync` recovery after a failed `didChange`.
	async fn notify_with_barrier(&self, server: LanguageServerId, notif: AnyNotification) -> Result<oneshot::Receiver<Result<()>>>;

	async fn request(&self, server: LanguageServerId, req: AnyRequest, timeout: Option<Duration>) -> Result<AnyResponse>;

	async fn reply(&self, server: LanguageServerId, id: RequestId, resp: std::result::Result<JsonValue, ResponseError>) -> Result<()>;

	async fn stop(&self, server: LanguageServerId) -> Result<()>;
}
