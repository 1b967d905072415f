use lsp_types::{ServerCapabilities, TextDocumentSyncCapability, TextDocumentSyncKind};

/// The negotiated `textDocument/didChange` strategy for a server, extracted
/// from `ServerCapabilities.text_document_sync`. Absent a capability, LSP
/// servers default to `Incremental`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum SyncMode {
	/// The server does not want document contents at all; `didChange` is
	/// never sent.
	None,
	/// Whole-document resync on every change.
	Full,
	#[default]
	/// Minimal range + replacement text per change.
	Incremental,
}

/// Reads the negotiated sync mode out of a server's advertised capabilities.
pub fn extract_sync_mode(caps: &ServerCapabilities) -> SyncMode {
	match &caps.text_document_sync {
		None => SyncMode::default(),
		Some(TextDocumentSyncCapability::Kind(kind)) => from_kind(*kind),
		Some(TextDocumentSyncCapability::Options(opts)) => opts.change.map(from_kind).unwrap_or_default(),
	}
}

fn from_kind(kind: TextDocumentSyncKind) -> SyncMode {
	match kind {
		TextDocumentSyncKind::NONE => SyncMode::None,
		TextDocumentSyncKind::FULL => SyncMode::Full,
		_ => SyncMode::Incremental,
	}
}
