//! Per-document bookkeeping: open/closed state, pending-change counters, the
//! generation that guards stale barrier acknowledgments, and cached
//! diagnostics.

use std::collections::HashMap;
use std::path::Path;
use std::sync::atomic::{AtomicU64, Ordering};

use lsp_types::{Diagnostic, DiagnosticTag, Uri};
use parking_lot::Mutex;
use tokio::sync::broadcast;

use crate::error::{Error, Result};

/// Capacity of the diagnostics-changed broadcast channel. A lagging
/// subscriber misses intermediate publishes and should just re-read the
/// current set via `get_diagnostics` rather than replay history.
const DIAGNOSTICS_CHANGED_CAPACITY: usize = 256;

/// A diagnostic's severity after applying tag-derived upgrades — distinct
/// from the wire `DiagnosticSeverity`, which only ever carries
/// Error/Warning/Information/Hint and knows nothing about tags.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EffectiveSeverity {
	Error,
	Warning,
	Note,
	/// `tags` contains `Deprecated` and not `Unnecessary`.
	Deprecated,
	/// `tags` contains `Unnecessary` — takes precedence over `Deprecated` when
	/// both are present, since unreachable/unused code is usually the more
	/// actionable signal of the two.
	Unused,
}

/// Maps a wire `Diagnostic`'s `severity` (1=Error, 2=Warning, 3/4=Note) and
/// then applies any tag-derived upgrade on top.
pub fn effective_severity(diagnostic: &Diagnostic) -> EffectiveSeverity {
	let base = match diagnostic.severity {
		Some(lsp_types::DiagnosticSeverity::ERROR) => EffectiveSeverity::Error,
		Some(lsp_types::DiagnosticSeverity::WARNING) => EffectiveSeverity::Warning,
		_ => EffectiveSeverity::Note,
	};
	let tags = diagnostic.tags.as_deref().unwrap_or(&[]);
	if tags.contains(&DiagnosticTag::UNNECESSARY) {
		EffectiveSeverity::Unused
	} else if tags.contains(&DiagnosticTag::DEPRECATED) {
		EffectiveSeverity::Deprecated
	} else {
		base
	}
}

struct DocState {
	language_id: Option<String>,
	generation: u64,
	opened: bool,
	version: i32,
	pending_changes: u32,
	force_full_sync: bool,
}

/// A URI's current published diagnostics, independent of whether that URI
/// is a tracked (`register()`ed) document — a server can `publishDiagnostics`
/// for any file it knows about, open or not.
#[derive(Default)]
struct DiagnosticEntry {
	diagnostics: Vec<Diagnostic>,
	result_id: Option<String>,
}

/// Tracks every currently-registered document by URI. A document's
/// `generation` bumps on every `register()` call, including re-registering a
/// URI that was previously unregistered — this is what lets a commit
/// boundary acknowledgment arriving after a close-then-reopen be recognized
/// as stale and ignored rather than corrupting the new session's state.
pub struct DocumentStateManager {
	docs: Mutex<HashMap<Uri, DocState>>,
	next_generation: AtomicU64,
	/// A standalone URI → Diagnostics map, deliberately not folded into
	/// `docs`: a `publishDiagnostics` for a file this manager never
	/// `register()`ed (never opened, or opened by a different document
	/// manager entirely) still needs somewhere to land.
	diagnostics: Mutex<HashMap<Uri, DiagnosticEntry>>,
	diagnostics_changed: broadcast::Sender<Uri>,
}

impl Default for DocumentStateManager {
	fn default() -> Self {
		Self::new()
	}
}

impl DocumentStateManager {
	pub fn new() -> Self {
		let (diagnostics_changed, _) = broadcast::channel(DIAGNOSTICS_CHANGED_CAPACITY);
		Self { docs: Mutex::new(HashMap::new()), next_generation: AtomicU64::new(1), diagnostics: Mutex::new(HashMap::new()), diagnostics_changed }
	}

	/// Subscribes to diagnostic-cache changes — fired once per
	/// [`Self::update_diagnostics`] call, naming the URI whose entry changed.
	/// Mirrors the Diagnostic Cache's "fans out change events" obligation;
	/// callers read the new set back with `get_diagnostics`.
	pub fn subscribe_diagnostics(&self) -> broadcast::Receiver<Uri> {
		self.diagnostics_changed.subscribe()
	}

	pub fn register(&self, path: &Path, language_id: Option<&str>) -> Result<Uri> {
		let uri = crate::uri::uri_from_path(path)?;
		let generation = self.next_generation.fetch_add(1, Ordering::Relaxed);
		self.docs.lock().insert(
			uri.clone(),
			DocState {
				language_id: language_id.map(str::to_string),
				generation,
				opened: false,
				version: 0,
				pending_changes: 0,
				force_full_sync: false,
			},
		);
		Ok(uri)
	}

	/// Drops tracking for `uri` and its cached diagnostics — a closed or
	/// reopened-under-a-new-identity document shouldn't keep showing
	/// diagnostics published against the session that just ended.
	pub fn unregister(&self, uri: &Uri) {
		self.docs.lock().remove(uri);
		self.diagnostics.lock().remove(uri);
	}

	pub fn mark_opened(&self, uri: &Uri, version: i32) {
		if let Some(doc) = self.docs.lock().get_mut(uri) {
			doc.opened = true;
			doc.version = version;
		}
	}

	pub fn is_opened(&self, uri: &Uri) -> bool {
		self.docs.lock().get(uri).is_some_and(|doc| doc.opened)
	}

	pub fn language_id(&self, uri: &Uri) -> Option<String> {
		self.docs.lock().get(uri).and_then(|doc| doc.language_id.clone())
	}

	/// Records a pending change and returns the document's current
	/// generation, to be threaded through [`super::DocumentSync::wrap_barrier`]
	/// so its eventual acknowledgment can be checked for staleness.
	pub fn queue_change(&self, uri: &Uri) -> Result<u64> {
		let mut docs = self.docs.lock();
		let doc = docs.get_mut(uri).ok_or_else(|| Error::Protocol(format!("{uri} is not a registered document")))?;
		doc.pending_changes += 1;
		Ok(doc.generation)
	}

	/// Allocates the next document version for an outgoing `didChange`.
	pub(crate) fn bump_version(&self, uri: &Uri) -> Option<i32> {
		self.docs.lock().get_mut(uri).map(|doc| {
			doc.version += 1;
			doc.version
		})
	}

	pub fn pending_change_count(&self, uri: &Uri) -> usize {
		self.docs.lock().get(uri).map_or(0, |doc| doc.pending_changes as usize)
	}

	/// Decrements the pending-change count iff `generation` still matches the
	/// document's current generation — a stale ack from a closed or reopened
	/// document is silently dropped.
	pub(crate) fn ack_change(&self, uri: &Uri, generation: u64) {
		if let Some(doc) = self.docs.lock().get_mut(uri) {
			if doc.generation == generation && doc.pending_changes > 0 {
				doc.pending_changes -= 1;
			}
		}
	}

	/// Same staleness guard as [`Self::ack_change`], but for a failed commit
	/// boundary: the document must fall back to a full-text resync.
	pub(crate) fn mark_force_full_sync(&self, uri: &Uri, generation: u64) {
		if let Some(doc) = self.docs.lock().get_mut(uri) {
			if doc.generation == generation {
				doc.force_full_sync = true;
			}
		}
	}

	pub fn take_force_full_sync_by_uri(&self, uri: &Uri) -> bool {
		self.docs.lock().get_mut(uri).is_some_and(|doc| std::mem::take(&mut doc.force_full_sync))
	}

	/// Records a server's published diagnostics for `uri`, independent of
	/// whether that URI is a tracked document — a file that was never
	/// opened here can still receive (and needs to keep) its diagnostics.
	pub fn update_diagnostics(&self, uri: &Uri, diagnostics: Vec<Diagnostic>, result_id: Option<String>) {
		self.diagnostics.lock().insert(uri.clone(), DiagnosticEntry { diagnostics, result_id });
		let _ = self.diagnostics_changed.send(uri.clone());
	}

	pub fn diagnostic_result_id(&self, uri: &Uri) -> Option<String> {
		self.diagnostics.lock().get(uri).and_then(|entry| entry.result_id.clone())
	}

	pub fn get_diagnostics(&self, uri: &Uri) -> Vec<Diagnostic> {
		self.diagnostics.lock().get(uri).map(|entry| entry.diagnostics.clone()).unwrap_or_default()
	}

	/// Same as [`Self::get_diagnostics`], paired with each entry's tag-derived
	/// [`EffectiveSeverity`].
	pub fn get_diagnostics_with_severity(&self, uri: &Uri) -> Vec<(Diagnostic, EffectiveSeverity)> {
		self.get_diagnostics(uri).into_iter().map(|d| { let severity = effective_severity(&d); (d, severity) }).collect()
	}
}
