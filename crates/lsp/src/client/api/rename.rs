//! `textDocument/references`, `prepareRename`, and `rename`.

use lsp_types::{
	Location, OneOf, PartialResultParams, Position, PrepareRenameResponse, ReferenceContext, ReferenceParams, RenameOptions, RenameParams,
	TextDocumentIdentifier, TextDocumentPositionParams, Uri, WorkDoneProgressParams, WorkspaceEdit,
};

use crate::client::ClientHandle;
use crate::error::Result;

impl ClientHandle {
	pub fn supports_references(&self) -> bool {
		self.capabilities().is_some_and(|caps| caps.references_provider.is_some())
	}

	pub async fn references(&self, uri: Uri, position: Position, include_declaration: bool) -> Result<Option<Vec<Location>>> {
		if !self.supports_references() {
			return Ok(None);
		}
		let params = ReferenceParams {
			text_document_position: TextDocumentPositionParams { text_document: TextDocumentIdentifier { uri }, position },
			work_done_progress_params: WorkDoneProgressParams::default(),
			partial_result_params: PartialResultParams::default(),
			context: ReferenceContext { include_declaration },
		};
		self.call("textDocument/references", params).await
	}

	pub fn supports_rename(&self) -> bool {
		self.capabilities().is_some_and(|caps| caps.rename_provider.is_some())
	}

	pub fn supports_prepare_rename(&self) -> bool {
		matches!(
			self.capabilities().and_then(|caps| caps.rename_provider),
			Some(OneOf::Right(RenameOptions { prepare_provider: Some(true), .. }))
		)
	}

	pub async fn prepare_rename(&self, uri: Uri, position: Position) -> Result<Option<PrepareRenameResponse>> {
		if !self.supports_prepare_rename() {
			return Ok(None);
		}
		let params = TextDocumentPositionParams { text_document: TextDocumentIdentifier { uri }, position };
		self.call("textDocument/prepareRename", params).await
	}

	pub async fn rename(&self, uri: Uri, position: Position, new_name: String) -> Result<Option<WorkspaceEdit>> {
		if !self.supports_rename() {
			return Ok(None);
		}
		let params = RenameParams {
			text_document_position: TextDocumentPositionParams { text_document: TextDocumentIdentifier { uri }, position },
			new_name,
			work_done_progress_params: WorkDoneProgressParams::default(),
		};
		self.call("textDocument/rename", params).await
	}
}
