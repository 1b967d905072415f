//! Dispatch for everything a server sends us that isn't a reply to one of
//! our own requests: `publishDiagnostics`, the `*/refresh` family, the
//! handful of requests every server expects the client to answer
//! (`workspace/configuration`, `client/registerCapability`,
//! `workspace/applyEdit`), and the two progress/logging notification
//! families (`$/progress`, `window/logMessage` and friends).

use std::sync::Arc;

use kestrel_rpc::{AnyNotification, AnyRequest, JsonValue, ResponseError};
use lsp_types::{
	ApplyWorkspaceEditParams, ApplyWorkspaceEditResponse, DocumentChangeOperation, DocumentChanges, OneOf, ProgressParams, ProgressParamsValue,
	PublishDiagnosticsParams, TextDocumentEdit, WorkDoneProgress, WorkspaceEdit,
};

use super::transport::{LspTransport, TransportEvent};
use crate::host::{BufferEdit, BufferEditor, ProgressSink};
use crate::registry::LanguageServerId;
use crate::sync::{DocumentStateManager, DocumentSync};

/// Spawns a background task that drains `events` until the channel closes,
/// routing server-initiated traffic to `documents`/`sync` and the host
/// collaborators (`buffer`, `progress`). One dispatcher per transport is
/// enough to cover every server it multiplexes, since events already carry
/// the originating [`LanguageServerId`].
pub fn spawn(
	transport: Arc<dyn LspTransport>,
	mut events: tokio::sync::mpsc::UnboundedReceiver<TransportEvent>,
	documents: Arc<DocumentStateManager>,
	sync: Arc<DocumentSync>,
	buffer: Arc<dyn BufferEditor>,
	progress: Arc<dyn ProgressSink>,
) {
	kestrel_worker::spawn(kestrel_worker::TaskClass::Background, async move {
		while let Some(event) = events.recv().await {
			match event {
				TransportEvent::Notification { server: _, notif } => handle_notification(&documents, &sync, &progress, notif),
				TransportEvent::Request { server, req } => handle_request(&transport, &sync, &buffer, server, req).await,
				TransportEvent::Closed { server } => {
					tracing::warn!(?server, "lsp.transport.closed");
				}
			}
		}
	});
}

fn handle_notification(documents: &DocumentStateManager, sync: &DocumentSync, progress: &Arc<dyn ProgressSink>, notif: AnyNotification) {
	match notif.method.as_str() {
		"textDocument/publishDiagnostics" => {
			let Some(params) = notif.params else { return };
			match serde_json::from_value::<PublishDiagnosticsParams>(params) {
				Ok(params) => documents.update_diagnostics(&params.uri, params.diagnostics, params.version.map(|v| v.to_string())),
				Err(err) => tracing::warn!(error = %err, "lsp.publish_diagnostics_malformed"),
			}
		}
		"window/logMessage" | "window/showMessage" => log_server_message(&notif),
		"$/logTrace" => {
			tracing::trace!(params = ?notif.params, "lsp.log_trace");
		}
		"$/progress" => dispatch_progress(progress, notif.params),
		_ => {
			tracing::debug!(method = %notif.method, "lsp.unhandled_notification");
		}
	}
	// Signaling refresh happens on the *request* variants below; both
	// directions exist in the wild depending on server version, so route
	// the notification form here if a server ever sends one.
	match notif.method.as_str() {
		"workspace/diagnostic/refresh" => sync.signal_diagnostic_refresh(),
		"workspace/inlayHint/refresh" => sync.signal_inlay_hint_refresh(),
		_ => {}
	}
}

/// `type` is 1 (Error), 2 (Warning), 3 (Info) or 4 (Log) on the wire. Only
/// type 4 gets logged at a quieter level — the other three are worth a
/// human noticing, matching `G_LOG_LEVEL_MESSAGE` vs `G_LOG_LEVEL_INFO` in
/// the editors this protocol grew up in.
fn log_server_message(notif: &AnyNotification) {
	let message_type = notif.params.as_ref().and_then(|p| p.get("type")).and_then(|t| t.as_i64()).unwrap_or(3);
	if (1..=3).contains(&message_type) {
		tracing::info!(method = %notif.method, params = ?notif.params, "lsp.server_message");
	} else {
		tracing::debug!(method = %notif.method, params = ?notif.params, "lsp.server_message");
	}
}

fn dispatch_progress(progress: &Arc<dyn ProgressSink>, params: Option<JsonValue>) {
	let Some(params) = params else { return };
	let params: ProgressParams = match serde_json::from_value(params) {
		Ok(params) => params,
		Err(err) => {
			tracing::warn!(error = %err, "lsp.progress_malformed");
			return;
		}
	};
	let token = params.token;
	let ProgressParamsValue::WorkDone(work_done) = params.value;
	match work_done {
		WorkDoneProgress::Begin(begin) => progress.begin(token, begin.title, begin.message, begin.percentage),
		WorkDoneProgress::Report(report) => progress.report(token, report.message, report.percentage),
		WorkDoneProgress::End(end) => progress.end(token, end.message),
	}
}

async fn handle_request(transport: &Arc<dyn LspTransport>, sync: &DocumentSync, buffer: &Arc<dyn BufferEditor>, server: LanguageServerId, req: AnyRequest) {
	let result = match req.method.as_str() {
		"client/registerCapability" | "client/unregisterCapability" => Ok(JsonValue::Null),
		"window/workDoneProgress/create" => Ok(JsonValue::Null),
		"workspace/workspaceFolders" => Ok(JsonValue::Null),
		"workspace/configuration" => Ok(JsonValue::Array(Vec::new())),
		"workspace/diagnostic/refresh" => {
			sync.signal_diagnostic_refresh();
			Ok(JsonValue::Null)
		}
		"workspace/inlayHint/refresh" => {
			sync.signal_inlay_hint_refresh();
			Ok(JsonValue::Null)
		}
		"workspace/applyEdit" => Ok(apply_edit_response(buffer, req.params).await),
		other => Err(ResponseError {
			code: ResponseError::METHOD_NOT_FOUND,
			message: format!("no handler for {other}"),
			data: None,
		}),
	};

	if let Err(err) = transport.reply(server, req.id, result).await {
		tracing::warn!(error = %err, "lsp.reply_failed");
	}
}

/// Forwards a decoded `workspace/applyEdit` to the host's buffer editor and
/// answers from its result, matching `ide_buffer_manager_apply_edits_async`:
/// the whole edit set goes in one call, and the reply carries a single
/// pass/fail with no per-edit index.
async fn apply_edit_response(buffer: &Arc<dyn BufferEditor>, params: Option<JsonValue>) -> JsonValue {
	let decoded = params
		.ok_or_else(|| "missing applyEdit params".to_string())
		.and_then(|p| serde_json::from_value::<ApplyWorkspaceEditParams>(p).map_err(|e| e.to_string()));

	let response = match decoded {
		Ok(params) => match buffer.apply_edits(decode_workspace_edit(params.edit)).await {
			Ok(()) => ApplyWorkspaceEditResponse { applied: true, failure_reason: None, failed_change: None },
			Err(reason) => ApplyWorkspaceEditResponse { applied: false, failure_reason: Some(reason), failed_change: None },
		},
		Err(reason) => ApplyWorkspaceEditResponse { applied: false, failure_reason: Some(reason), failed_change: None },
	};

	serde_json::to_value(response).expect("ApplyWorkspaceEditResponse always serializes")
}

/// Flattens either `WorkspaceEdit` encoding — `documentChanges` (preferred,
/// possibly interleaved with resource operations we don't act on) or the
/// older flat `changes` map — into per-file `(range, new_text)` edits.
fn decode_workspace_edit(edit: WorkspaceEdit) -> Vec<BufferEdit> {
	let mut out = Vec::new();
	if let Some(document_changes) = edit.document_changes {
		match document_changes {
			DocumentChanges::Edits(edits) => {
				for doc_edit in edits {
					push_document_edit(&mut out, doc_edit);
				}
			}
			DocumentChanges::Operations(ops) => {
				for op in ops {
					if let DocumentChangeOperation::Edit(doc_edit) = op {
						push_document_edit(&mut out, doc_edit);
					}
				}
			}
		}
	} else if let Some(changes) = edit.changes {
		for (uri, edits) in changes {
			for text_edit in edits {
				out.push(BufferEdit { uri: uri.clone(), range: text_edit.range, new_text: text_edit.new_text });
			}
		}
	}
	out
}

fn push_document_edit(out: &mut Vec<BufferEdit>, doc_edit: TextDocumentEdit) {
	let uri = doc_edit.text_document.uri;
	for edit in doc_edit.edits {
		let (range, new_text) = match edit {
			OneOf::Left(edit) => (edit.range, edit.new_text),
			OneOf::Right(annotated) => (annotated.text_edit.range, annotated.text_edit.new_text),
		};
		out.push(BufferEdit { uri: uri.clone(), range, new_text });
	}
}
