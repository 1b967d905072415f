//! The per-server protocol state machine: owns the `initialize` handshake,
//! caches negotiated capabilities, and gives feature providers (in
//! [`api`]) a thin, typed surface over the raw transport.

pub mod api;
pub mod handlers;
pub mod transport;

use std::collections::VecDeque;
use std::sync::atomic::{AtomicI64, Ordering};
use std::sync::Arc;

use kestrel_lsp_framework::{initialize_params, SyncMode, WorkspaceContext};
use kestrel_rpc::{AnyNotification, AnyRequest, JsonValue, RequestId};
use lsp_types::{ClientInfo, ServerCapabilities};
use parking_lot::{Mutex, RwLock};
use tokio::sync::{oneshot, watch};

pub use transport::ServerConfig;

use crate::error::{Error, Result};
use crate::registry::LanguageServerId;
use transport::LspTransport;

/// Where a server sits in its lifecycle. Mirrors the client-side states a
/// connection moves through once, in order, never backwards except to
/// [`ClientState::Stopped`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ClientState {
	Created,
	Starting,
	Initializing,
	Ready,
	ShuttingDown,
	Stopped,
}

/// A call/notify issued while the handshake is still in flight, held until
/// the client leaves `Initializing` so nothing but `initialize`/`initialized`
/// itself can cross the wire before then.
enum PendingOp {
	Notify { method: String, params: Option<JsonValue>, reply: oneshot::Sender<Result<()>> },
	NotifyWithBarrier { method: String, params: Option<JsonValue>, reply: oneshot::Sender<Result<oneshot::Receiver<Result<()>>>> },
	Call { method: String, params: Option<JsonValue>, reply: oneshot::Sender<Result<JsonValue>> },
}

struct ClientInner {
	transport: Arc<dyn LspTransport>,
	language_id: String,
	state: Mutex<ClientState>,
	server_id_tx: watch::Sender<Option<LanguageServerId>>,
	server_id_rx: watch::Receiver<Option<LanguageServerId>>,
	capabilities: RwLock<Option<ServerCapabilities>>,
	sync_mode: Mutex<SyncMode>,
	next_id: AtomicI64,
	/// `Some` while queuing (handshake in flight), taken once and left `None`
	/// forever once the handshake concludes, success or failure.
	pending: Mutex<Option<VecDeque<PendingOp>>>,
	/// Held for the entirety of a pending-queue drain so a call that arrives
	/// mid-drain and finds `pending` already `None` still queues up behind
	/// the messages that were waiting before it, instead of jumping ahead.
	send_gate: tokio::sync::Mutex<()>,
}

/// A cheaply cloned, `Send + Sync` reference to a running (or starting)
/// language server connection. Feature providers under [`api`] are all
/// methods on this handle.
#[derive(Clone)]
pub struct ClientHandle {
	inner: Arc<ClientInner>,
}

impl ClientHandle {
	/// Spawns the background task that starts the server and drives it
	/// through the `initialize` handshake, returning a handle immediately —
	/// callers may enqueue work before the handshake completes.
	pub(crate) fn spawn(transport: Arc<dyn LspTransport>, language_id: String, cfg: ServerConfig) -> Self {
		let (server_id_tx, server_id_rx) = watch::channel(None);
		let inner = Arc::new(ClientInner {
			transport,
			language_id,
			state: Mutex::new(ClientState::Created),
			server_id_tx,
			server_id_rx,
			capabilities: RwLock::new(None),
			sync_mode: Mutex::new(SyncMode::default()),
			next_id: AtomicI64::new(1),
			pending: Mutex::new(Some(VecDeque::new())),
			send_gate: tokio::sync::Mutex::new(()),
		});

		let driver = inner.clone();
		kestrel_worker::spawn(kestrel_worker::TaskClass::Background, async move {
			driver.run_lifecycle(cfg).await;
		});

		Self { inner }
	}

	pub fn language_id(&self) -> &str {
		&self.inner.language_id
	}

	pub fn is_initialized(&self) -> bool {
		*self.inner.state.lock() == ClientState::Ready
	}

	pub fn state(&self) -> ClientState {
		*self.inner.state.lock()
	}

	pub fn sync_mode(&self) -> SyncMode {
		*self.inner.sync_mode.lock()
	}

	pub fn capabilities(&self) -> Option<ServerCapabilities> {
		self.inner.capabilities.read().clone()
	}

	/// Sends a request, serializing `params` and deserializing the result.
	/// Used by the feature-provider methods in [`api`].
	pub(crate) async fn call<P: serde::Serialize, R: serde::de::DeserializeOwned>(&self, method: &str, params: P) -> Result<R> {
		let params = serde_json::to_value(params).map_err(|e| Error::Protocol(e.to_string()))?;
		let result = self.inner.call(method, Some(params)).await?;
		serde_json::from_value(result).map_err(|e| Error::Protocol(e.to_string()))
	}

	pub(crate) async fn fire(&self, method: &str, params: impl serde::Serialize) -> Result<()> {
		let params = serde_json::to_value(params).map_err(|e| Error::Protocol(e.to_string()))?;
		self.inner.notify(method, Some(params)).await
	}

	pub(crate) async fn fire_with_barrier(&self, method: &str, params: impl serde::Serialize) -> Result<oneshot::Receiver<Result<()>>> {
		let params = serde_json::to_value(params).map_err(|e| Error::Protocol(e.to_string()))?;
		self.inner.notify_with_barrier(method, Some(params)).await
	}

	/// Gracefully shuts the server down: `shutdown` request, `exit` notification.
	pub async fn stop(&self) -> Result<()> {
		let server_id = match self.inner.server_id_rx.borrow().as_ref() {
			Some(id) => *id,
			None => return Ok(()),
		};
		*self.inner.state.lock() = ClientState::ShuttingDown;
		let id = self.inner.next_request_id();
		let shutdown = self.inner.transport.request(server_id, AnyRequest { id, method: "shutdown".into(), params: None }, None).await;
		if let Err(err) = shutdown {
			tracing::warn!(error = %err, "lsp.client.shutdown_request_failed");
		}
		let _ = self.inner.transport.notify(server_id, AnyNotification { method: "exit".into(), params: None }).await;
		let _ = self.inner.transport.stop(server_id).await;
		*self.inner.state.lock() = ClientState::Stopped;
		Ok(())
	}
}

impl ClientInner {
	fn next_request_id(&self) -> RequestId {
		RequestId::Number(self.next_id.fetch_add(1, Ordering::Relaxed))
	}

	/// Awaits the server identity assigned once `start` resolves. Cheap in
	/// practice — the only real wait is the spawn itself.
	async fn server_id(&self) -> Result<LanguageServerId> {
		let mut rx = self.server_id_rx.clone();
		loop {
			if let Some(id) = *rx.borrow() {
				return Ok(id);
			}
			if rx.changed().await.is_err() {
				return Err(Error::NotConnected);
			}
		}
	}

	async fn run_lifecycle(self: Arc<Self>, cfg: ServerConfig) {
		*self.state.lock() = ClientState::Starting;
		let started = match self.transport.start(cfg.clone()).await {
			Ok(started) => started,
			Err(err) => {
				tracing::error!(language = %self.language_id, error = %err, "lsp.client.start_failed");
				*self.state.lock() = ClientState::Stopped;
				return;
			}
		};
		let _ = self.server_id_tx.send(Some(started.id));

		*self.state.lock() = ClientState::Initializing;
		match self.initialize(started.id, &cfg).await {
			Ok((caps, sync_mode)) => {
				*self.capabilities.write() = Some(caps);
				*self.sync_mode.lock() = sync_mode;
				let _ = self.transport.notify(started.id, AnyNotification { method: "initialized".into(), params: Some(JsonValue::Object(Default::default())) }).await;
				*self.state.lock() = ClientState::Ready;
				tracing::info!(language = %self.language_id, "lsp.client.ready");
			}
			Err(err) => {
				tracing::error!(language = %self.language_id, error = %err, "lsp.client.initialize_failed");
				// Capability-gated callers stay disabled forever (`capabilities`
				// never gets populated), but plain notifications/requests that
				// were held for the handshake are still worth delivering —
				// there's no second handshake attempt coming to unblock them.
				*self.state.lock() = ClientState::Stopped;
			}
		}
		self.flush_pending(started.id).await;
	}

	async fn initialize(&self, server_id: LanguageServerId, cfg: &ServerConfig) -> Result<(ServerCapabilities, SyncMode)> {
		let ctx = WorkspaceContext {
			root_uri: cfg.root_uri.clone().unwrap_or_else(|| "file:///".parse().expect("static uri parses")),
			root_path: cfg.root_path.clone(),
			workspace_folders: cfg.workspace_folders.clone(),
		};
		let client_info = Some(ClientInfo { name: env!("CARGO_PKG_NAME").to_string(), version: Some(env!("CARGO_PKG_VERSION").to_string()) });
		let params = initialize_params(ctx, client_info, cfg.initialization_options.clone(), cfg.trace, &[lsp_types::PositionEncodingKind::UTF16]);
		let params = serde_json::to_value(params).map_err(|e| Error::InitializeFailed(e.to_string()))?;

		let id = self.next_request_id();
		let response = self
			.transport
			.request(server_id, AnyRequest { id, method: "initialize".into(), params: Some(params) }, None)
			.await?;
		let result = response.into_result().map_err(Error::Server)?;
		let result: lsp_types::InitializeResult = serde_json::from_value(result).map_err(|e| Error::InitializeFailed(e.to_string()))?;
		let sync_mode = kestrel_lsp_framework::extract_sync_mode(&result.capabilities);
		Ok((result.capabilities, sync_mode))
	}

	/// Dispatches every operation queued while the handshake was in flight,
	/// in FIFO order, then leaves `pending` permanently `None` so later calls
	/// go straight to the transport. Held behind `send_gate` for its whole
	/// run so a call racing the drain (observing `pending == None` just after
	/// this takes it) still waits its turn instead of overtaking the queue.
	async fn flush_pending(&self, server_id: LanguageServerId) {
		let _gate = self.send_gate.lock().await;
		let Some(mut queue) = self.pending.lock().take() else { return };
		while let Some(op) = queue.pop_front() {
			match op {
				PendingOp::Notify { method, params, reply } => {
					let result = self.transport.notify(server_id, AnyNotification { method, params }).await;
					let _ = reply.send(result);
				}
				PendingOp::NotifyWithBarrier { method, params, reply } => {
					let result = self.transport.notify_with_barrier(server_id, AnyNotification { method, params }).await;
					let _ = reply.send(result);
				}
				PendingOp::Call { method, params, reply } => {
					let result = async {
						let id = self.next_request_id();
						let response = self.transport.request(server_id, AnyRequest { id, method, params }, None).await?;
						response.into_result().map_err(Error::Server)
					}
					.await;
					let _ = reply.send(result);
				}
			}
		}
	}

	/// Sends a request once the server identity exists. Before the handshake
	/// concludes (`Ready` or a failed attempt), the call is queued instead of
	/// dispatched — capability-gated callers check `capabilities` themselves
	/// before reaching this, so queuing never hides a capability mismatch.
	async fn call(&self, method: impl Into<String>, params: Option<JsonValue>) -> Result<JsonValue> {
		let server_id = self.server_id().await?;
		let method = method.into();
		{
			let mut pending = self.pending.lock();
			if let Some(queue) = pending.as_mut() {
				let (tx, rx) = oneshot::channel();
				queue.push_back(PendingOp::Call { method, params, reply: tx });
				drop(pending);
				return rx.await.unwrap_or(Err(Error::NotConnected));
			}
		}
		let _gate = self.send_gate.lock().await;
		let id = self.next_request_id();
		let response = self.transport.request(server_id, AnyRequest { id, method, params }, None).await?;
		response.into_result().map_err(Error::Server)
	}

	async fn notify(&self, method: impl Into<String>, params: Option<JsonValue>) -> Result<()> {
		let server_id = self.server_id().await?;
		let method = method.into();
		{
			let mut pending = self.pending.lock();
			if let Some(queue) = pending.as_mut() {
				let (tx, rx) = oneshot::channel();
				queue.push_back(PendingOp::Notify { method, params, reply: tx });
				drop(pending);
				return rx.await.unwrap_or(Err(Error::NotConnected));
			}
		}
		let _gate = self.send_gate.lock().await;
		self.transport.notify(server_id, AnyNotification { method, params }).await
	}

	async fn notify_with_barrier(&self, method: impl Into<String>, params: Option<JsonValue>) -> Result<oneshot::Receiver<Result<()>>> {
		let server_id = self.server_id().await?;
		let method = method.into();
		{
			let mut pending = self.pending.lock();
			if let Some(queue) = pending.as_mut() {
				let (tx, rx) = oneshot::channel();
				queue.push_back(PendingOp::NotifyWithBarrier { method, params, reply: tx });
				drop(pending);
				return rx.await.unwrap_or(Err(Error::NotConnected));
			}
		}
		let _gate = self.send_gate.lock().await;
		self.transport.notify_with_barrier(server_id, AnyNotification { method, params }).await
	}
}
