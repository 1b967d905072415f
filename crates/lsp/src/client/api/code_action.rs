//! `textDocument/codeAction`, `codeAction/resolve`, and `workspace/executeCommand`.

use lsp_types::{
	CodeAction, CodeActionContext, CodeActionOrCommand, CodeActionParams, CodeActionProviderCapability, ExecuteCommandParams, PartialResultParams, Range,
	TextDocumentIdentifier, Uri, WorkDoneProgressParams,
};
use serde_json::Value as JsonValue;

use crate::client::ClientHandle;
use crate::error::Result;

impl ClientHandle {
	pub fn supports_code_action(&self) -> bool {
		self.capabilities().is_some_and(|caps| caps.code_action_provider.is_some())
	}

	pub fn supports_code_action_resolve(&self) -> bool {
		matches!(
			self.capabilities().and_then(|caps| caps.code_action_provider),
			Some(CodeActionProviderCapability::Options(options)) if options.resolve_provider == Some(true)
		)
	}

	pub async fn code_action(&self, uri: Uri, range: Range, context: CodeActionContext) -> Result<Option<Vec<CodeActionOrCommand>>> {
		if !self.supports_code_action() {
			return Ok(None);
		}
		let params = CodeActionParams {
			text_document: TextDocumentIdentifier { uri },
			range,
			context,
			work_done_progress_params: WorkDoneProgressParams::default(),
			partial_result_params: PartialResultParams::default(),
		};
		self.call("textDocument/codeAction", params).await
	}

	pub async fn code_action_resolve(&self, action: CodeAction) -> Result<CodeAction> {
		self.call("codeAction/resolve", action).await
	}

	pub fn supports_execute_command(&self) -> bool {
		self.capabilities().is_some_and(|caps| caps.execute_command_provider.is_some())
	}

	pub async fn execute_command(&self, command: String, arguments: Option<Vec<JsonValue>>) -> Result<Option<JsonValue>> {
		let params = ExecuteCommandParams {
			command,
			arguments: arguments.unwrap_or_default(),
			work_done_progress_params: WorkDoneProgressParams::default(),
		};
		self.call("workspace/executeCommand", params).await
	}
}
