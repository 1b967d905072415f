//! `textDocument/diagnostic` (pull diagnostics).

use lsp_types::{
	DiagnosticServerCapabilities, DocumentDiagnosticParams, DocumentDiagnosticReportResult, PartialResultParams, TextDocumentIdentifier, Uri,
	WorkDoneProgressParams,
};

use crate::client::ClientHandle;
use crate::error::Result;

impl ClientHandle {
	pub fn supports_pull_diagnostics(&self) -> bool {
		matches!(
			self.capabilities().and_then(|caps| caps.diagnostic_provider),
			Some(DiagnosticServerCapabilities::Options(_)) | Some(DiagnosticServerCapabilities::RegistrationOptions(_))
		)
	}

	pub async fn pull_diagnostics(&self, uri: Uri, previous_result_id: Option<String>) -> Result<Option<DocumentDiagnosticReportResult>> {
		if !self.supports_pull_diagnostics() {
			return Ok(None);
		}
		let params = DocumentDiagnosticParams {
			text_document: TextDocumentIdentifier { uri },
			identifier: None,
			previous_result_id,
			work_done_progress_params: WorkDoneProgressParams::default(),
			partial_result_params: PartialResultParams::default(),
		};
		self.call("textDocument/diagnostic", params).await
	}
}
