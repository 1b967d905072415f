use super::*;

#[test]
fn registry_python3_alias_resolves_to_python_registration() {
	use crate::registry::LanguageServerConfig;

	let transport = Arc::new(SimpleStubTransport);
	let registry = Registry::new(transport);
	registry.register("python", LanguageServerConfig { command: "pylsp".into(), ..Default::default() });

	let client = registry.get("python3", Path::new("/a.py")).unwrap();
	assert_eq!(client.language_id(), "python");
	assert_eq!(registry.config("python3").unwrap().command, "pylsp");
}

#[test]
fn registry_get_before_register_is_unknown_language() {
	let transport = Arc::new(SimpleStubTransport);
	let registry = Registry::new(transport);

	let err = registry.get("rust", Path::new("/a.rs")).unwrap_err();
	assert!(matches!(err, crate::Error::UnknownLanguage(lang) if lang == "rust"));
}

#[test]
fn registry_get_is_idempotent_for_the_same_language() {
	use crate::registry::LanguageServerConfig;

	let transport = Arc::new(SimpleStubTransport);
	let registry = Registry::new(transport);
	registry.register("rust", LanguageServerConfig { command: "rust-analyzer".into(), ..Default::default() });

	let first = registry.get("rust", Path::new("/a.rs")).unwrap();
	let second = registry.get("rust", Path::new("/b.rs")).unwrap();
	assert!(first.language_id() == second.language_id());
}

#[test]
fn registry_register_replaces_config_without_touching_a_running_client() {
	use crate::registry::LanguageServerConfig;

	let transport = Arc::new(SimpleStubTransport);
	let registry = Registry::new(transport);
	registry.register("rust", LanguageServerConfig { command: "rust-analyzer".into(), ..Default::default() });
	let _client = registry.get("rust", Path::new("/a.rs")).unwrap();

	registry.register("rust", LanguageServerConfig { command: "rust-analyzer-nightly".into(), ..Default::default() });
	assert_eq!(registry.config("rust").unwrap().command, "rust-analyzer-nightly");
}

#[tokio::test]
async fn open_document_registers_and_sends_did_open_with_full_text() {
	use crate::registry::LanguageServerConfig;

	let transport = Arc::new(RecordingTransport::new());
	let (sync, registry, documents, _receiver) = DocumentSync::create(transport.clone());
	registry.register("rust", LanguageServerConfig { command: "rust-analyzer".into(), ..Default::default() });

	let path = Path::new("/core_open.rs");
	let uri = crate::uri_from_path(path).unwrap();

	sync.open_document(path, "rust", &Rope::from("fn main() {}")).await.unwrap();

	assert!(documents.is_opened(&uri));
	assert_eq!(documents.language_id(&uri).as_deref(), Some("rust"));

	let recs = transport.recorded();
	let open = recs.iter().find(|r| r.method == "textDocument/didOpen").expect("didOpen not sent");
	assert!(open.uri.as_deref().unwrap().contains("core_open.rs"));
}

#[tokio::test]
async fn send_change_opens_the_document_when_open_if_needed() {
	use crate::registry::LanguageServerConfig;

	let transport = Arc::new(RecordingTransport::new());
	let (sync, registry, documents, _receiver) = DocumentSync::create(transport.clone());
	registry.register("rust", LanguageServerConfig { command: "rust-analyzer".into(), ..Default::default() });

	let path = Path::new("/core_change_open.rs");
	let uri = crate::uri_from_path(path).unwrap();
	assert!(!documents.is_opened(&uri));

	sync.send_change(ChangeRequest::full_text(path, "rust", "fn main() {}".into())).await.unwrap();

	assert!(documents.is_opened(&uri));
	let recs = transport.recorded_methods();
	assert!(recs.contains(&"textDocument/didOpen".to_string()));
	assert!(!recs.contains(&"textDocument/didChange".to_string()));
}

#[tokio::test]
async fn send_change_errors_when_not_open_and_open_if_needed_is_false() {
	use crate::registry::LanguageServerConfig;

	let transport = Arc::new(RecordingTransport::new());
	let (sync, registry, _documents, _receiver) = DocumentSync::create(transport);
	registry.register("rust", LanguageServerConfig { command: "rust-analyzer".into(), ..Default::default() });

	let path = Path::new("/core_change_no_open.rs");
	let request = ChangeRequest::full_text(path, "rust", "fn main() {}".into()).with_open_if_needed(false);
	let err = sync.send_change(request).await.unwrap_err();
	assert!(matches!(err, crate::Error::Protocol(_)));
}

#[tokio::test]
async fn send_change_on_open_document_sends_did_change_and_bumps_version() {
	use crate::registry::LanguageServerConfig;

	let transport = Arc::new(RecordingTransport::new());
	let (sync, registry, documents, _receiver) = DocumentSync::create(transport.clone());
	registry.register("rust", LanguageServerConfig { command: "rust-analyzer".into(), ..Default::default() });

	let path = Path::new("/core_change.rs");
	sync.open_document(path, "rust", &Rope::from("fn main() {}")).await.unwrap();
	transport.messages.lock().unwrap().clear();

	sync.send_change(ChangeRequest::full_text(path, "rust", "fn main() { 1 }".into())).await.unwrap();

	let uri = crate::uri_from_path(path).unwrap();
	assert_eq!(documents.pending_change_count(&uri), 0, "successful change should be acked");
	let recs = transport.recorded_methods();
	assert_eq!(recs, vec!["textDocument/didChange".to_string()]);
}

#[tokio::test]
async fn diagnostic_and_inlay_hint_refresh_flags_are_one_shot() {
	use crate::registry::LanguageServerConfig;

	let transport = Arc::new(RecordingTransport::new());
	let (sync, registry, _documents, _receiver) = DocumentSync::create(transport);
	registry.register("rust", LanguageServerConfig::default());

	assert!(!sync.take_diagnostic_refresh());
	assert!(!sync.take_inlay_hint_refresh());

	sync.signal_diagnostic_refresh();
	sync.signal_inlay_hint_refresh();

	assert!(sync.take_diagnostic_refresh());
	assert!(sync.take_inlay_hint_refresh());
	// Taking again without re-signaling must observe no refresh pending.
	assert!(!sync.take_diagnostic_refresh());
	assert!(!sync.take_inlay_hint_refresh());
}

#[test]
fn document_state_manager_register_bumps_generation_on_reregister() {
	let documents = DocumentStateManager::new();
	let path = Path::new("/core_generation.rs");

	let uri_one = documents.register(path, Some("rust")).unwrap();
	let generation_one = documents.queue_change(&uri_one).unwrap();

	documents.unregister(&uri_one);
	let uri_two = documents.register(path, Some("rust")).unwrap();
	let generation_two = documents.queue_change(&uri_two).unwrap();

	assert_ne!(generation_one, generation_two, "re-registering the same path must bump its generation");
}

#[test]
fn document_state_manager_queue_change_rejects_unregistered_uri() {
	let documents = DocumentStateManager::new();
	let uri = crate::uri_from_path(Path::new("/core_unregistered.rs")).unwrap();
	assert!(documents.queue_change(&uri).is_err());
}

#[tokio::test]
async fn save_document_sends_did_save_with_text() {
	use crate::registry::LanguageServerConfig;

	let transport = Arc::new(RecordingTransport::new());
	let (sync, registry, _documents, _receiver) = DocumentSync::create(transport.clone());
	registry.register("rust", LanguageServerConfig { command: "rust-analyzer".into(), ..Default::default() });

	let path = Path::new("/core_save.rs");
	sync.save_document(path, "rust", "fn main() {}".into()).await.unwrap();

	let recs = transport.recorded();
	let save = recs.iter().find(|r| r.method == "textDocument/didSave").expect("didSave not sent");
	assert!(save.uri.as_deref().unwrap().contains("core_save.rs"));
}

#[tokio::test]
async fn notify_watched_files_changed_invalidates_diagnostics_on_delete() {
	use crate::registry::LanguageServerConfig;

	let transport = Arc::new(RecordingTransport::new());
	let (sync, registry, documents, _receiver) = DocumentSync::create(transport.clone());
	registry.register("rust", LanguageServerConfig { command: "rust-analyzer".into(), ..Default::default() });

	let path = Path::new("/core_watched.rs");
	sync.open_document(path, "rust", &Rope::from("fn main() {}")).await.unwrap();
	let uri = crate::uri_from_path(path).unwrap();
	documents.update_diagnostics(
		&uri,
		vec![Diagnostic { range: Range::default(), severity: Some(DiagnosticSeverity::ERROR), message: "stale".into(), ..Diagnostic::default() }],
		None,
	);
	assert_eq!(documents.get_diagnostics(&uri).len(), 1);

	sync.notify_watched_files_changed("rust", path, lsp_types::FileChangeType::DELETED).await.unwrap();

	assert!(documents.get_diagnostics(&uri).is_empty(), "diagnostics for a deleted file must be invalidated");
	let recs = transport.recorded_methods();
	assert!(recs.contains(&"workspace/didChangeWatchedFiles".to_string()));
}

#[test]
fn unnecessary_tag_upgrades_severity_to_unused() {
	let diagnostic = Diagnostic {
		range: Range::default(),
		severity: Some(DiagnosticSeverity::WARNING),
		tags: Some(vec![lsp_types::DiagnosticTag::UNNECESSARY]),
		message: "unused import".into(),
		..Diagnostic::default()
	};
	assert_eq!(crate::sync::effective_severity(&diagnostic), crate::sync::EffectiveSeverity::Unused);
}

#[test]
fn deprecated_tag_upgrades_severity_when_not_also_unnecessary() {
	let diagnostic = Diagnostic {
		range: Range::default(),
		severity: Some(DiagnosticSeverity::WARNING),
		tags: Some(vec![lsp_types::DiagnosticTag::DEPRECATED]),
		message: "use new_api() instead".into(),
		..Diagnostic::default()
	};
	assert_eq!(crate::sync::effective_severity(&diagnostic), crate::sync::EffectiveSeverity::Deprecated);
}

#[test]
fn untagged_diagnostic_keeps_its_wire_severity() {
	let diagnostic =
		Diagnostic { range: Range::default(), severity: Some(DiagnosticSeverity::ERROR), message: "parse error".into(), ..Diagnostic::default() };
	assert_eq!(crate::sync::effective_severity(&diagnostic), crate::sync::EffectiveSeverity::Error);
}

#[tokio::test]
async fn get_diagnostics_with_severity_pairs_each_entry() {
	use crate::registry::LanguageServerConfig;

	let transport = Arc::new(RecordingTransport::new());
	let (sync, registry, documents, _receiver) = DocumentSync::create(transport.clone());
	registry.register("rust", LanguageServerConfig { command: "rust-analyzer".into(), ..Default::default() });

	let path = Path::new("/core_tag_severity.rs");
	sync.open_document(path, "rust", &Rope::from("fn main() {}")).await.unwrap();
	let uri = crate::uri_from_path(path).unwrap();
	documents.update_diagnostics(
		&uri,
		vec![Diagnostic {
			range: Range::default(),
			severity: Some(DiagnosticSeverity::WARNING),
			tags: Some(vec![lsp_types::DiagnosticTag::UNNECESSARY]),
			message: "dead code".into(),
			..Diagnostic::default()
		}],
		None,
	);

	let paired = documents.get_diagnostics_with_severity(&uri);
	assert_eq!(paired.len(), 1);
	assert_eq!(paired[0].1, crate::sync::EffectiveSeverity::Unused);
}

#[tokio::test]
async fn diagnostics_changed_fires_once_per_publish_for_the_right_uri() {
	use crate::registry::LanguageServerConfig;

	let transport = Arc::new(RecordingTransport::new());
	let (sync, registry, documents, _receiver) = DocumentSync::create(transport.clone());
	registry.register("rust", LanguageServerConfig { command: "rust-analyzer".into(), ..Default::default() });

	let path = Path::new("/core_diag_broadcast.rs");
	sync.open_document(path, "rust", &Rope::from("fn main() {}")).await.unwrap();
	let uri = crate::uri_from_path(path).unwrap();

	let mut changed = documents.subscribe_diagnostics();
	documents.update_diagnostics(&uri, vec![Diagnostic { range: Range::default(), message: "x".into(), ..Diagnostic::default() }], None);
	documents.update_diagnostics(&uri, vec![], None);

	let first = changed.recv().await.unwrap();
	let second = changed.recv().await.unwrap();
	assert_eq!(first, uri);
	assert_eq!(second, uri);
}

#[tokio::test]
async fn publish_diagnostics_for_a_never_registered_uri_is_still_cached() {
	let documents = DocumentStateManager::new();
	let uri = crate::uri_from_path(Path::new("/never_opened.c")).unwrap();

	let mut changed = documents.subscribe_diagnostics();
	documents.update_diagnostics(
		&uri,
		vec![Diagnostic { range: Range::default(), severity: Some(DiagnosticSeverity::ERROR), message: "undeclared identifier".into(), ..Diagnostic::default() }],
		None,
	);

	assert_eq!(documents.get_diagnostics(&uri).len(), 1, "diagnostics for an unopened file must not be dropped");
	assert_eq!(changed.recv().await.unwrap(), uri, "diagnostics_changed must still fire for an untracked uri");
}

#[tokio::test]
async fn send_change_in_incremental_mode_sends_the_ranged_edit() {
	use crate::registry::LanguageServerConfig;
	use lsp_types::{Position, Range};

	let transport = Arc::new(RecordingTransport::new());
	let (sync, registry, documents, _receiver) = DocumentSync::create(transport.clone());
	registry.register("rust", LanguageServerConfig { command: "rust-analyzer".into(), ..Default::default() });

	let path = Path::new("/core_incremental.rs");
	sync.open_document(path, "rust", &Rope::from("fn main() {}")).await.unwrap();
	let uri = crate::uri_from_path(path).unwrap();
	transport.messages.lock().unwrap().clear();

	let edit_range = Range::new(Position::new(0, 3), Position::new(0, 7));
	let request = ChangeRequest::full_text(path, "rust", "fn run() {}".into())
		.with_open_if_needed(false)
		.with_incremental_edit(crate::sync::IncrementalEdit::new(edit_range, "run"));
	sync.send_change(request).await.unwrap();

	let recs = transport.recorded();
	let change = recs.iter().find(|r| r.method == "textDocument/didChange").expect("didChange not sent");
	let params = change.params.as_ref().expect("didChange must carry params");
	let content_changes = params.get("contentChanges").and_then(|v| v.as_array()).expect("contentChanges array");
	assert_eq!(content_changes.len(), 1);
	assert_eq!(content_changes[0].get("text").and_then(|v| v.as_str()), Some("run"));
	assert!(content_changes[0].get("range").is_some(), "incremental change must carry a range");

	let _ = uri;
}

#[tokio::test]
async fn send_change_in_none_mode_is_silently_dropped() {
	use crate::registry::LanguageServerConfig;

	let transport = Arc::new(InitRecordingTransport::with_capabilities(lsp_types::ServerCapabilities {
		text_document_sync: Some(lsp_types::TextDocumentSyncCapability::Kind(lsp_types::TextDocumentSyncKind::NONE)),
		..Default::default()
	}));
	let (sync, registry, documents, _receiver) = DocumentSync::create(transport.clone());
	registry.register("rust", LanguageServerConfig { command: "rust-analyzer".into(), ..Default::default() });

	let path = Path::new("/core_sync_none.rs");
	sync.open_document(path, "rust", &Rope::from("fn main() {}")).await.unwrap();
	let uri = crate::uri_from_path(path).unwrap();

	let client = registry.get("rust", path).unwrap();
	for _ in 0..100 {
		if client.is_initialized() {
			break;
		}
		tokio::task::yield_now().await;
	}
	assert_eq!(client.sync_mode(), kestrel_lsp_framework::SyncMode::None);

	transport.inner.messages.lock().unwrap().clear();
	sync.send_change(ChangeRequest::full_text(path, "rust", "fn main() { 1 }".into()).with_open_if_needed(false)).await.unwrap();

	assert!(transport.inner.recorded_methods().is_empty(), "SyncMode::None must never write didChange");
	assert_eq!(documents.pending_change_count(&uri), 0, "a dropped change must never be queued as pending");
}
