//! `textDocument/inlayHint` and `inlayHint/resolve`.

use lsp_types::{InlayHint, InlayHintParams, InlayHintServerCapabilities, OneOf, Range, TextDocumentIdentifier, Uri, WorkDoneProgressParams};

use crate::client::ClientHandle;
use crate::error::Result;

impl ClientHandle {
	pub fn supports_inlay_hint(&self) -> bool {
		self.capabilities().is_some_and(|caps| caps.inlay_hint_provider.is_some())
	}

	pub fn supports_inlay_hint_resolve(&self) -> bool {
		matches!(
			self.capabilities().and_then(|caps| caps.inlay_hint_provider),
			Some(OneOf::Right(InlayHintServerCapabilities::Options(options))) if options.resolve_provider == Some(true)
		)
	}

	pub async fn inlay_hints(&self, uri: Uri, range: Range) -> Result<Option<Vec<InlayHint>>> {
		if !self.supports_inlay_hint() {
			return Ok(None);
		}
		let params = InlayHintParams {
			text_document: TextDocumentIdentifier { uri },
			range,
			work_done_progress_params: WorkDoneProgressParams::default(),
		};
		self.call("textDocument/inlayHint", params).await
	}

	pub async fn inlay_hint_resolve(&self, hint: InlayHint) -> Result<InlayHint> {
		self.call("inlayHint/resolve", hint).await
	}
}
