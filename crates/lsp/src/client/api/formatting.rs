//! `textDocument/formatting` and `textDocument/rangeFormatting`.

use lsp_types::{
	DocumentFormattingParams, DocumentRangeFormattingParams, FormattingOptions, Range, TextDocumentIdentifier, TextEdit, Uri, WorkDoneProgressParams,
};

use super::one_of_enabled;
use crate::client::ClientHandle;
use crate::error::Result;

impl ClientHandle {
	pub fn supports_formatting(&self) -> bool {
		self.capabilities().is_some_and(|caps| one_of_enabled(&caps.document_formatting_provider))
	}

	pub async fn formatting(&self, uri: Uri, options: FormattingOptions) -> Result<Option<Vec<TextEdit>>> {
		if !self.supports_formatting() {
			return Ok(None);
		}
		let params = DocumentFormattingParams {
			text_document: TextDocumentIdentifier { uri },
			options,
			work_done_progress_params: WorkDoneProgressParams::default(),
		};
		self.call("textDocument/formatting", params).await
	}

	pub fn supports_range_formatting(&self) -> bool {
		self.capabilities().is_some_and(|caps| one_of_enabled(&caps.document_range_formatting_provider))
	}

	pub async fn range_formatting(&self, uri: Uri, range: Range, options: FormattingOptions) -> Result<Option<Vec<TextEdit>>> {
		if !self.supports_range_formatting() {
			return Ok(None);
		}
		let params = DocumentRangeFormattingParams {
			text_document: TextDocumentIdentifier { uri },
			range,
			options,
			work_done_progress_params: WorkDoneProgressParams::default(),
		};
		self.call("textDocument/rangeFormatting", params).await
	}
}
