//! Owns document open/close/change lifecycle across however many language
//! servers are running, and the handful of editor-facing refresh flags
//! servers can set via `workspace/*Refresh` requests. This is the only
//! module, besides [`crate::client::api`], allowed to call the low-level
//! `text_document_did_*` notifications directly (enforced by
//! `tests::invariants`).

mod state;
#[cfg(test)]
mod tests;

use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

#[cfg(feature = "position")]
use ropey::Rope;
use lsp_types::{Range, TextDocumentContentChangeEvent};
use tokio::sync::oneshot;

pub use state::{effective_severity, DocumentStateManager, EffectiveSeverity};

use crate::client::transport::{LspTransport, TransportEvent};
use crate::error::Result;
use crate::registry::{LanguageServerId, Registry};

/// A single ranged replacement, carried alongside the always-present full
/// text so a negotiated `SyncMode::Incremental` server gets the minimal
/// `contentChanges` entry instead of a whole-document resend.
pub struct IncrementalEdit {
	pub range: Range,
	pub new_text: String,
}

impl IncrementalEdit {
	pub fn new(range: Range, new_text: impl Into<String>) -> Self {
		Self { range, new_text: new_text.into() }
	}
}

/// A `didChange` to send, with the fallback policy if the document turns
/// out not to be open yet. Always carries the document's full text (used
/// verbatim under `SyncMode::Full`, and as the open-if-needed fallback);
/// `incremental`, if set, is what an `Incremental`-mode server actually
/// receives instead.
pub struct ChangeRequest {
	path: PathBuf,
	language_id: String,
	text: String,
	open_if_needed: bool,
	incremental: Option<IncrementalEdit>,
}

impl ChangeRequest {
	pub fn full_text(path: &Path, language_id: &str, text: String) -> Self {
		Self { path: path.to_path_buf(), language_id: language_id.to_string(), text, open_if_needed: true, incremental: None }
	}

	/// If the document isn't open yet, open it with this text instead of
	/// failing. Defaults to `true`.
	pub fn with_open_if_needed(mut self, open_if_needed: bool) -> Self {
		self.open_if_needed = open_if_needed;
		self
	}

	/// Supplies the ranged edit to send under `SyncMode::Incremental`. Only
	/// consulted in that mode; `SyncMode::Full` always sends `text` in full,
	/// and `SyncMode::None` sends nothing at all.
	pub fn with_incremental_edit(mut self, edit: IncrementalEdit) -> Self {
		self.incremental = Some(edit);
		self
	}
}

pub struct DocumentSync {
	registry: Arc<Registry>,
	documents: Arc<DocumentStateManager>,
	diagnostic_refresh: AtomicBool,
	inlay_hint_refresh: AtomicBool,
}

impl DocumentSync {
	pub fn with_registry(registry: Arc<Registry>, documents: Arc<DocumentStateManager>) -> Self {
		Self { registry, documents, diagnostic_refresh: AtomicBool::new(false), inlay_hint_refresh: AtomicBool::new(false) }
	}

	/// Convenience constructor for a fresh transport: builds a [`Registry`]
	/// and [`DocumentStateManager`] around it and subscribes to its events,
	/// handing the subscription back so the caller can drive
	/// [`crate::client::handlers`] off it.
	pub fn create(transport: Arc<dyn LspTransport>) -> (Self, Arc<Registry>, Arc<DocumentStateManager>, tokio::sync::mpsc::UnboundedReceiver<TransportEvent>) {
		let receiver = transport.subscribe_events().unwrap_or_else(|_| tokio::sync::mpsc::unbounded_channel().1);
		let registry = Arc::new(Registry::new(transport));
		let documents = Arc::new(DocumentStateManager::new());
		let sync = Self::with_registry(registry.clone(), documents.clone());
		(sync, registry, documents, receiver)
	}

	pub fn documents(&self) -> &Arc<DocumentStateManager> {
		&self.documents
	}

	pub fn registry(&self) -> &Arc<Registry> {
		&self.registry
	}

	pub fn take_diagnostic_refresh(&self) -> bool {
		self.diagnostic_refresh.swap(false, Ordering::AcqRel)
	}

	pub fn signal_diagnostic_refresh(&self) {
		self.diagnostic_refresh.store(true, Ordering::Release);
	}

	pub fn take_inlay_hint_refresh(&self) -> bool {
		self.inlay_hint_refresh.swap(false, Ordering::AcqRel)
	}

	pub fn signal_inlay_hint_refresh(&self) {
		self.inlay_hint_refresh.store(true, Ordering::Release);
	}

	#[cfg(feature = "position")]
	pub async fn open_document(&self, path: &Path, language_id: &str, rope: &Rope) -> Result<()> {
		self.open_with_text(path, language_id, rope.to_string()).await
	}

	pub async fn ensure_open_text(&self, path: &Path, language_id: &str, text: String) -> Result<()> {
		self.open_with_text(path, language_id, text).await
	}

	async fn open_with_text(&self, path: &Path, language_id: &str, text: String) -> Result<()> {
		let uri = self.documents.register(path, Some(language_id))?;
		let client = self.registry.get(language_id, path)?;
		match client.text_document_did_open(uri.clone(), language_id, 0, text).await {
			Ok(()) => {
				self.documents.mark_opened(&uri, 0);
				Ok(())
			}
			Err(err) => {
				self.documents.unregister(&uri);
				Err(err)
			}
		}
	}

	/// Sends `textDocument/didSave` with the full text, as required for
	/// documents registered through this manager — servers that only
	/// negotiated `Save: false` still receive the notification; the cost of
	/// an unwanted one is far lower than missing a wanted one, and most
	/// servers treat an unsolicited `didSave` as a no-op.
	pub async fn save_document(&self, path: &Path, language_id: &str, text: String) -> Result<()> {
		let uri = crate::uri::uri_from_path(path)?;
		let client = self.registry.get(language_id, path)?;
		client.text_document_did_save(uri, Some(text)).await
	}

	/// Reports a project-level file create/change/delete to every language
	/// server configured for `language_id`, and drops cached diagnostics for
	/// deleted files so a stale entry doesn't outlive the file it described.
	pub async fn notify_watched_files_changed(&self, language_id: &str, path: &Path, change: lsp_types::FileChangeType) -> Result<()> {
		let uri = crate::uri::uri_from_path(path)?;
		let client = self.registry.get(language_id, path)?;
		let params = lsp_types::DidChangeWatchedFilesParams { changes: vec![lsp_types::FileEvent { uri: uri.clone(), typ: change }] };
		let result = client.fire("workspace/didChangeWatchedFiles", params).await;
		if change == lsp_types::FileChangeType::DELETED {
			self.documents.unregister(&uri);
		}
		result
	}

	pub async fn close_document(&self, path: &Path, language_id: &str) -> Result<()> {
		let uri = crate::uri::uri_from_path(path)?;
		let client = self.registry.get(language_id, path)?;
		let result = client.text_document_did_close(uri.clone()).await;
		self.documents.unregister(&uri);
		result
	}

	/// Closes `old_path` and opens `new_path`, in that order, even across a
	/// language change — each half is routed to whatever server the
	/// respective language id resolves to. The close always runs and its
	/// outcome is returned, but a failed open still aborts before the new
	/// document is registered.
	pub async fn reopen_document(&self, old_path: &Path, old_language: &str, new_path: &Path, new_language: &str, new_text: String) -> Result<()> {
		let close_result = self.close_document(old_path, old_language).await;
		self.open_with_text(new_path, new_language, new_text).await?;
		close_result
	}

	/// Sends a `didChange` for an already-open document (or opens it first,
	/// per [`ChangeRequest::with_open_if_needed`]), gated on the server's
	/// negotiated [`kestrel_lsp_framework::SyncMode`]: `None` drops the
	/// change entirely (no transport write at all — the server asked not to
	/// be told), `Full` always sends the whole document, and `Incremental`
	/// sends the ranged edit from [`ChangeRequest::with_incremental_edit`]
	/// when one was supplied, falling back to a full-text-shaped change
	/// otherwise.
	pub async fn send_change(&self, request: ChangeRequest) -> Result<()> {
		let uri = crate::uri::uri_from_path(&request.path)?;
		if !self.documents.is_opened(&uri) {
			if request.open_if_needed {
				return self.open_with_text(&request.path, &request.language_id, request.text).await;
			}
			return Err(crate::error::Error::Protocol(format!("{uri} is not open")));
		}

		let client = self.registry.get(&request.language_id, &request.path)?;
		let sync_mode = client.sync_mode();
		if sync_mode == kestrel_lsp_framework::SyncMode::None {
			return Ok(());
		}

		let generation = self.documents.queue_change(&uri)?;
		let version = self.documents.bump_version(&uri).unwrap_or(0);

		let changes = match (sync_mode, request.incremental) {
			(kestrel_lsp_framework::SyncMode::Incremental, Some(edit)) => {
				vec![TextDocumentContentChangeEvent { range: Some(edit.range), range_length: None, text: edit.new_text }]
			}
			_ => vec![TextDocumentContentChangeEvent { range: None, range_length: None, text: request.text }],
		};

		match client.text_document_did_change(uri.clone(), version, changes).await {
			Ok(()) => {
				self.documents.ack_change(&uri, generation);
				Ok(())
			}
			Err(err) => {
				self.documents.mark_force_full_sync(&uri, generation);
				Err(err)
			}
		}
	}

	/// Spawns a task that waits for a commit-boundary barrier to resolve and
	/// applies its effect to `uri` only if `generation` still matches —
	/// guards against a barrier that was in flight when the document was
	/// closed or reopened underneath it. Resolves the returned receiver
	/// unconditionally once handled, stale or not.
	pub fn wrap_barrier(&self, uri: lsp_types::Uri, generation: u64, barrier_rx: oneshot::Receiver<Result<()>>) -> oneshot::Receiver<()> {
		let documents = self.documents.clone();
		let (done_tx, done_rx) = oneshot::channel();
		kestrel_worker::spawn(kestrel_worker::TaskClass::Background, async move {
			match barrier_rx.await {
				Ok(Ok(())) => documents.ack_change(&uri, generation),
				Ok(Err(_)) => documents.mark_force_full_sync(&uri, generation),
				Err(_) => {}
			}
			let _ = done_tx.send(());
		});
		done_rx
	}
}
