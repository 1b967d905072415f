//! The seam between this crate's protocol plumbing and whatever actually
//! owns live buffer content and progress UI on the embedding side. This
//! crate tracks document *synchronization* state (open/closed, version,
//! cached diagnostics) but never holds buffer text itself, so a
//! server-initiated `workspace/applyEdit` or `$/progress` notification has
//! to be handed off to a collaborator the host supplies.

use async_trait::async_trait;
use lsp_types::{NumberOrString, Range, Uri};

/// One ranged replacement against a single file, decoded from either
/// encoding a `workspace/applyEdit` request can use
/// (`documentChanges` or `changes`).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BufferEdit {
	pub uri: Uri,
	pub range: Range,
	pub new_text: String,
}

/// Applies a server-initiated workspace edit to live buffer content.
///
/// Mirrors `ide_buffer_manager_apply_edits_async`: the whole edit set is
/// handed over in one call and answered with a single pass/fail, not a
/// per-edit result — a partially-applied edit set is as much a failure as
/// one that never started.
#[async_trait]
pub trait BufferEditor: Send + Sync {
	async fn apply_edits(&self, edits: Vec<BufferEdit>) -> Result<(), String>;
}

/// A `BufferEditor` for hosts that don't wire up live buffers — answers
/// every edit honestly as not applied rather than silently dropping it or
/// lying to the server.
pub struct NoopBufferEditor;

#[async_trait]
impl BufferEditor for NoopBufferEditor {
	async fn apply_edits(&self, _edits: Vec<BufferEdit>) -> Result<(), String> {
		Err("no buffer integration wired up for applyEdit".into())
	}
}

/// Mutates or withdraws a host-side progress record in response to a
/// `$/progress` notification's `kind`.
pub trait ProgressSink: Send + Sync {
	fn begin(&self, token: NumberOrString, title: String, message: Option<String>, percentage: Option<u32>);
	fn report(&self, token: NumberOrString, message: Option<String>, percentage: Option<u32>);
	fn end(&self, token: NumberOrString, message: Option<String>);
}

/// A `ProgressSink` for hosts with nothing to show progress in.
pub struct NoopProgressSink;

impl ProgressSink for NoopProgressSink {
	fn begin(&self, _token: NumberOrString, _title: String, _message: Option<String>, _percentage: Option<u32>) {}
	fn report(&self, _token: NumberOrString, _message: Option<String>, _percentage: Option<u32>) {}
	fn end(&self, _token: NumberOrString, _message: Option<String>) {}
}
