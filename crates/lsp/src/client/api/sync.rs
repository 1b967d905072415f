//! The `textDocument/did{Open,Close,Change}` notifications. Exempted, along
//! with [`crate::sync`], from the rule that nothing else in the crate calls
//! these directly — every other caller goes through [`crate::sync::DocumentSync`].

use lsp_types::{
	DidChangeTextDocumentParams, DidCloseTextDocumentParams, DidOpenTextDocumentParams, DidSaveTextDocumentParams, TextDocumentContentChangeEvent,
	TextDocumentIdentifier, TextDocumentItem, Uri, VersionedTextDocumentIdentifier,
};
use tokio::sync::oneshot;

use crate::client::ClientHandle;
use crate::error::Result;

impl ClientHandle {
	pub async fn text_document_did_open(&self, uri: Uri, language_id: &str, version: i32, text: String) -> Result<()> {
		let params = DidOpenTextDocumentParams {
			text_document: TextDocumentItem { uri, language_id: language_id.to_string(), version, text },
		};
		self.fire("textDocument/didOpen", params).await
	}

	pub async fn text_document_did_save(&self, uri: Uri, text: Option<String>) -> Result<()> {
		let params = DidSaveTextDocumentParams { text_document: TextDocumentIdentifier { uri }, text };
		self.fire("textDocument/didSave", params).await
	}

	pub async fn text_document_did_close(&self, uri: Uri) -> Result<()> {
		let params = DidCloseTextDocumentParams { text_document: TextDocumentIdentifier { uri } };
		self.fire("textDocument/didClose", params).await
	}

	pub async fn text_document_did_change(&self, uri: Uri, version: i32, changes: Vec<TextDocumentContentChangeEvent>) -> Result<()> {
		let params = DidChangeTextDocumentParams {
			text_document: VersionedTextDocumentIdentifier { uri, version },
			content_changes: changes,
		};
		self.fire("textDocument/didChange", params).await
	}

	pub async fn text_document_did_change_full(&self, uri: Uri, version: i32, text: String) -> Result<()> {
		let change = TextDocumentContentChangeEvent { range: None, range_length: None, text };
		self.text_document_did_change(uri, version, vec![change]).await
	}

	/// Same as [`Self::text_document_did_change`], but returns a receiver
	/// resolving once the server has observably processed the change —
	/// the commit-boundary barrier `DocumentStateManager` uses to recover
	/// from a failed incremental edit.
	pub async fn text_document_did_change_with_barrier(
		&self,
		uri: Uri,
		version: i32,
		changes: Vec<TextDocumentContentChangeEvent>,
	) -> Result<oneshot::Receiver<Result<()>>> {
		let params = DidChangeTextDocumentParams {
			text_document: VersionedTextDocumentIdentifier { uri, version },
			content_changes: changes,
		};
		self.fire_with_barrier("textDocument/didChange", params).await
	}
}
