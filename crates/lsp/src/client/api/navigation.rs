//! Go-to-X requests: declaration, implementation, type definition, and
//! (for symmetry with the rest of the navigation family) plain definition.

use lsp_types::{
	GotoDefinitionParams, GotoDefinitionResponse, PartialResultParams, Position, TextDocumentIdentifier, TextDocumentPositionParams, Uri,
	WorkDoneProgressParams,
};

use crate::client::ClientHandle;
use crate::error::Result;

fn position_params(uri: Uri, position: Position) -> GotoDefinitionParams {
	GotoDefinitionParams {
		text_document_position_params: TextDocumentPositionParams {
			text_document: TextDocumentIdentifier { uri },
			position,
		},
		work_done_progress_params: WorkDoneProgressParams::default(),
		partial_result_params: PartialResultParams::default(),
	}
}

impl ClientHandle {
	pub fn supports_goto_definition(&self) -> bool {
		self.capabilities().is_some_and(|caps| caps.definition_provider.is_some())
	}

	pub async fn goto_definition(&self, uri: Uri, position: Position) -> Result<Option<GotoDefinitionResponse>> {
		if !self.supports_goto_definition() {
			return Ok(None);
		}
		self.call("textDocument/definition", position_params(uri, position)).await
	}

	pub fn supports_goto_declaration(&self) -> bool {
		self.capabilities().is_some_and(|caps| caps.declaration_provider.is_some())
	}

	pub async fn goto_declaration(&self, uri: Uri, position: Position) -> Result<Option<GotoDefinitionResponse>> {
		if !self.supports_goto_declaration() {
			return Ok(None);
		}
		self.call("textDocument/declaration", position_params(uri, position)).await
	}

	pub fn supports_goto_implementation(&self) -> bool {
		self.capabilities().is_some_and(|caps| caps.implementation_provider.is_some())
	}

	pub async fn goto_implementation(&self, uri: Uri, position: Position) -> Result<Option<GotoDefinitionResponse>> {
		if !self.supports_goto_implementation() {
			return Ok(None);
		}
		self.call("textDocument/implementation", position_params(uri, position)).await
	}

	pub fn supports_goto_type_definition(&self) -> bool {
		self.capabilities().is_some_and(|caps| caps.type_definition_provider.is_some())
	}

	pub async fn goto_type_definition(&self, uri: Uri, position: Position) -> Result<Option<GotoDefinitionResponse>> {
		if !self.supports_goto_type_definition() {
			return Ok(None);
		}
		self.call("textDocument/typeDefinition", position_params(uri, position)).await
	}
}
