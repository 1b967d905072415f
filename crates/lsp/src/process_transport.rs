//! The production [`LspTransport`]: spawns one real child process per
//! language, keeping it alive across crashes via
//! [`kestrel_lsp_framework::process::ServerProcess`], and multiplexes every
//! currently-running server's events onto a single subscriber stream keyed by
//! [`LanguageServerId`].

use std::collections::HashMap;
use std::sync::{Arc, Weak};
use std::time::Duration;

use async_trait::async_trait;
use kestrel_lsp_framework::process::{default_restart_policy, ProcessLifecycleEvent, ServerProcess};
use kestrel_rpc::{AnyNotification, AnyRequest, AnyResponse, JsonValue, PeerEvent, RequestId, ResponseError};
use parking_lot::{Mutex, RwLock};
use tokio::process::Command;
use tokio::sync::{mpsc, oneshot};

use crate::client::transport::{LspTransport, ServerConfig, StartedServer, TransportEvent};
use crate::error::{Error, Result};
use crate::registry::{LanguageServerConfig, LanguageServerId};

/// How to launch a given language's server, registered up front (distinct
/// from [`crate::registry::Registry`]'s copy of the same information, which
/// is used for `initialize`-time settings rather than process launch).
pub struct CommandTable {
	commands: RwLock<HashMap<String, LanguageServerConfig>>,
}

impl Default for CommandTable {
	fn default() -> Self {
		Self::new()
	}
}

impl CommandTable {
	pub fn new() -> Self {
		Self { commands: RwLock::new(HashMap::new()) }
	}

	pub fn register(&self, language_id: impl Into<String>, config: LanguageServerConfig) {
		self.commands.write().insert(language_id.into(), config);
	}

	fn get(&self, language_id: &str) -> Option<LanguageServerConfig> {
		self.commands.read().get(language_id).cloned()
	}
}

struct Session {
	generation: Mutex<u32>,
	peer: Mutex<Option<kestrel_rpc::Peer>>,
	stopping: std::sync::atomic::AtomicBool,
}

/// A real child-process transport. One [`ServerProcess`] runs per occupied
/// slot for as long as the slot's [`crate::client::ClientHandle`] is alive;
/// `generation` bumps every time that process is respawned after a crash, so
/// in-flight calls captured against a stale incarnation fail instead of
/// silently racing the new one.
///
/// Must be constructed via [`ProcessTransport::new`], which wraps it in an
/// `Arc` up front — the transport hands clones of that `Arc` to the
/// background tasks it spawns for each supervised process.
pub struct ProcessTransport {
	commands: Arc<CommandTable>,
	next_slot: Mutex<u32>,
	sessions: Mutex<HashMap<u32, Arc<Session>>>,
	events_tx: mpsc::UnboundedSender<TransportEvent>,
	events_rx: Mutex<Option<mpsc::UnboundedReceiver<TransportEvent>>>,
	self_ref: Weak<ProcessTransport>,
}

impl ProcessTransport {
	pub fn new(commands: Arc<CommandTable>) -> Arc<Self> {
		let (events_tx, events_rx) = mpsc::unbounded_channel();
		Arc::new_cyclic(|self_ref| Self {
			commands,
			next_slot: Mutex::new(0),
			sessions: Mutex::new(HashMap::new()),
			events_tx,
			events_rx: Mutex::new(Some(events_rx)),
			self_ref: self_ref.clone(),
		})
	}

	fn arc(&self) -> Arc<Self> {
		self.self_ref.upgrade().expect("ProcessTransport outlives its own background tasks")
	}

	fn session(&self, id: LanguageServerId) -> Result<Arc<Session>> {
		let sessions = self.sessions.lock();
		let session = sessions.get(&id.slot()).ok_or(Error::NotConnected)?;
		if *session.generation.lock() != id.generation() {
			return Err(Error::NotConnected);
		}
		Ok(session.clone())
	}

	fn peer_of(&self, id: LanguageServerId) -> Result<kestrel_rpc::Peer> {
		self.session(id)?.peer.lock().clone().ok_or(Error::NotConnected)
	}

	/// Drives one language's process for as long as it lives: rewires `Peer`
	/// on every restart and republishes lifecycle + inbound traffic as
	/// [`TransportEvent`]s tagged with the current generation.
	fn drive(self: Arc<Self>, slot: u32, language_id: String, config: LanguageServerConfig, session: Arc<Session>) {
		kestrel_worker::spawn(kestrel_worker::TaskClass::Background, async move {
			let process_name: &'static str = Box::leak(language_id.clone().into_boxed_str());
			let mut process = ServerProcess::spawn(process_name, default_restart_policy(), move || {
				let mut command = Command::new(&config.command);
				command.args(&config.args);
				command
			});
			loop {
				// Polled on a short timeout rather than awaited forever so a
				// `stop()` request is noticed promptly even while the server
				// is healthy and silent.
				let event = match tokio::time::timeout(Duration::from_millis(200), process.recv()).await {
					Ok(Some(event)) => event,
					Ok(None) => return,
					Err(_) => {
						if session.stopping.load(std::sync::atomic::Ordering::Acquire) {
							process.kill();
							return;
						}
						continue;
					}
				};
				match event {
					ProcessLifecycleEvent::Spawned(rewired) => {
						let generation = process.restart_count() as u32;
						*session.generation.lock() = generation;
						*session.peer.lock() = Some(rewired.peer);
						let id = LanguageServerId::new(slot, generation);
						self.clone().pump_peer_events(id, rewired.peer_events);
						tracing::info!(language = %language_id, pid = rewired.pid, "lsp.process.spawned");
					}
					ProcessLifecycleEvent::Exited { code } => {
						tracing::warn!(language = %language_id, ?code, "lsp.process.exited");
						*session.peer.lock() = None;
					}
					ProcessLifecycleEvent::SpawnFailed(err) => {
						tracing::error!(language = %language_id, error = %err, "lsp.process.spawn_failed");
					}
					ProcessLifecycleEvent::GivenUp => {
						tracing::error!(language = %language_id, "lsp.process.given_up");
						let id = LanguageServerId::new(slot, *session.generation.lock());
						let _ = self.events_tx.send(TransportEvent::Closed { server: id });
						return;
					}
				}
			}
		});
	}

	fn pump_peer_events(self: Arc<Self>, id: LanguageServerId, mut events: mpsc::UnboundedReceiver<PeerEvent>) {
		kestrel_worker::spawn(kestrel_worker::TaskClass::Background, async move {
			while let Some(event) = events.recv().await {
				let forwarded = match event {
					PeerEvent::Request(req) => TransportEvent::Request { server: id, req },
					PeerEvent::Notification(notif) => TransportEvent::Notification { server: id, notif },
					PeerEvent::Closed => TransportEvent::Closed { server: id },
				};
				if self.events_tx.send(forwarded).is_err() {
					return;
				}
			}
		});
	}
}

#[async_trait]
impl LspTransport for ProcessTransport {
	fn subscribe_events(&self) -> Result<mpsc::UnboundedReceiver<TransportEvent>> {
		self.events_rx.lock().take().ok_or_else(|| Error::Protocol("process transport events already subscribed".into()))
	}

	async fn start(&self, cfg: ServerConfig) -> Result<StartedServer> {
		let config = self.commands.get(&cfg.language_id).ok_or_else(|| Error::UnknownLanguage(cfg.language_id.clone()))?;
		let slot = {
			let mut next_slot = self.next_slot.lock();
			let slot = *next_slot;
			*next_slot += 1;
			slot
		};
		let session = Arc::new(Session { generation: Mutex::new(0), peer: Mutex::new(None), stopping: std::sync::atomic::AtomicBool::new(false) });
		self.sessions.lock().insert(slot, session.clone());

		self.arc().drive(slot, cfg.language_id.clone(), config, session.clone());

		// Wait for the first `Spawned` event before handing back an id, so
		// callers never race a peer that doesn't exist yet.
		let deadline = Duration::from_millis(25) * 200;
		let waited = tokio::time::timeout(deadline, async {
			loop {
				if session.peer.lock().is_some() {
					return;
				}
				tokio::time::sleep(Duration::from_millis(25)).await;
			}
		})
		.await;
		if waited.is_err() {
			return Err(Error::InitializeFailed(format!("{} did not come up in time", cfg.language_id)));
		}

		let generation = *session.generation.lock();
		Ok(StartedServer { id: LanguageServerId::new(slot, generation) })
	}

	async fn notify(&self, server: LanguageServerId, notif: AnyNotification) -> Result<()> {
		let peer = self.peer_of(server)?;
		peer.notify(notif.method, notif.params).await.map_err(Error::from)
	}

	async fn notify_with_barrier(&self, server: LanguageServerId, notif: AnyNotification) -> Result<oneshot::Receiver<Result<()>>> {
		let peer = self.peer_of(server)?;
		let (tx, rx) = oneshot::channel();
		kestrel_worker::spawn(kestrel_worker::TaskClass::Background, async move {
			let outcome = peer.notify(notif.method, notif.params).await.map_err(Error::from);
			let _ = tx.send(outcome);
		});
		Ok(rx)
	}

	async fn request(&self, server: LanguageServerId, req: AnyRequest, timeout: Option<Duration>) -> Result<AnyResponse> {
		let peer = self.peer_of(server)?;
		let id = req.id.clone();
		let call = peer.call(req.method, req.params);
		let result = match timeout {
			Some(duration) => tokio::time::timeout(duration, call).await.map_err(|_| kestrel_rpc::Error::Timeout)?,
			None => call.await,
		};
		match result {
			Ok(value) => Ok(AnyResponse::new_ok(id, value)),
			Err(kestrel_rpc::Error::Remote(err)) => Ok(AnyResponse { id, result: None, error: Some(err) }),
			Err(err) => Err(Error::from(err)),
		}
	}

	async fn reply(&self, server: LanguageServerId, id: RequestId, resp: std::result::Result<JsonValue, ResponseError>) -> Result<()> {
		let peer = self.peer_of(server)?;
		peer.respond(id, resp).await.map_err(Error::from)
	}

	async fn stop(&self, server: LanguageServerId) -> Result<()> {
		if let Ok(session) = self.session(server) {
			session.stopping.store(true, std::sync::atomic::Ordering::Release);
			*session.peer.lock() = None;
		}
		self.sessions.lock().remove(&server.slot());
		Ok(())
	}
}
