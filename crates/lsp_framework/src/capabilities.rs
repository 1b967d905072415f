use lsp_types::{
	ClientCapabilities, CodeActionCapabilityResolveSupport, CodeActionClientCapabilities, CodeActionKindLiteralSupport, CodeActionLiteralSupport,
	CompletionClientCapabilities, DiagnosticClientCapabilities, GeneralClientCapabilities, HoverClientCapabilities, InlayHintClientCapabilities,
	MarkupKind, PositionEncodingKind, PublishDiagnosticsClientCapabilities, RenameClientCapabilities, SymbolKind, SymbolKindCapability, TagSupport,
	TextDocumentClientCapabilities, TextDocumentSyncClientCapabilities, WindowClientCapabilities, WorkspaceClientCapabilities, WorkspaceEditClientCapabilities,
	WorkspaceFileOperationsClientCapabilities, WorkspaceSymbolClientCapabilities,
};

/// All 26 standard `SymbolKind` values (File=1 through TypeParameter=26), so
/// `workspace/symbol` results are never filtered for a kind the IDE doesn't
/// recognize.
const ALL_SYMBOL_KINDS: [SymbolKind; 26] = [
	SymbolKind::FILE,
	SymbolKind::MODULE,
	SymbolKind::NAMESPACE,
	SymbolKind::PACKAGE,
	SymbolKind::CLASS,
	SymbolKind::METHOD,
	SymbolKind::PROPERTY,
	SymbolKind::FIELD,
	SymbolKind::CONSTRUCTOR,
	SymbolKind::ENUM,
	SymbolKind::INTERFACE,
	SymbolKind::FUNCTION,
	SymbolKind::VARIABLE,
	SymbolKind::CONSTANT,
	SymbolKind::STRING,
	SymbolKind::NUMBER,
	SymbolKind::BOOLEAN,
	SymbolKind::ARRAY,
	SymbolKind::OBJECT,
	SymbolKind::KEY,
	SymbolKind::NULL,
	SymbolKind::ENUM_MEMBER,
	SymbolKind::STRUCT,
	SymbolKind::EVENT,
	SymbolKind::OPERATOR,
	SymbolKind::TYPE_PARAMETER,
];

/// Builds the capability block the client advertises during `initialize`.
///
/// Declares exactly what the rest of this runtime can act on: applyEdit,
/// workspace configuration requests, the extension-point requests in the
/// LSP component design, and the documentation/markup formats feature
/// providers know how to render. `offered_position_encodings` lists the
/// encodings the host can decode positions in, most-preferred first.
pub fn client_capabilities(offered_position_encodings: &[PositionEncodingKind]) -> ClientCapabilities {
	ClientCapabilities {
		workspace: Some(WorkspaceClientCapabilities {
			apply_edit: Some(true),
			workspace_edit: Some(WorkspaceEditClientCapabilities {
				document_changes: Some(true),
				..Default::default()
			}),
			did_change_configuration: Some(Default::default()),
			did_change_watched_files: Some(Default::default()),
			symbol: Some(WorkspaceSymbolClientCapabilities {
				symbol_kind: Some(SymbolKindCapability { value_set: Some(ALL_SYMBOL_KINDS.to_vec()) }),
				..Default::default()
			}),
			execute_command: Some(Default::default()),
			workspace_folders: Some(true),
			configuration: Some(true),
			file_operations: Some(WorkspaceFileOperationsClientCapabilities {
				dynamic_registration: Some(false),
				did_create: Some(true),
				will_create: Some(true),
				did_rename: Some(true),
				will_rename: Some(true),
				did_delete: Some(true),
				will_delete: Some(true),
			}),
			..Default::default()
		}),
		text_document: Some(TextDocumentClientCapabilities {
			synchronization: Some(TextDocumentSyncClientCapabilities {
				dynamic_registration: Some(false),
				will_save: Some(true),
				will_save_wait_until: Some(false),
				did_save: Some(true),
			}),
			completion: Some(CompletionClientCapabilities {
				completion_item: Some(lsp_types::CompletionItemCapability {
					snippet_support: Some(true),
					documentation_format: Some(vec![MarkupKind::Markdown, MarkupKind::PlainText]),
					..Default::default()
				}),
				..Default::default()
			}),
			hover: Some(HoverClientCapabilities {
				content_format: Some(vec![MarkupKind::Markdown, MarkupKind::PlainText]),
				..Default::default()
			}),
			publish_diagnostics: Some(PublishDiagnosticsClientCapabilities {
				tag_support: Some(TagSupport {
					value_set: vec![lsp_types::DiagnosticTag::UNNECESSARY, lsp_types::DiagnosticTag::DEPRECATED],
				}),
				..Default::default()
			}),
			diagnostic: Some(DiagnosticClientCapabilities {
				dynamic_registration: Some(false),
				related_document_support: Some(false),
			}),
			code_action: Some(CodeActionClientCapabilities {
				code_action_literal_support: Some(CodeActionLiteralSupport {
					code_action_kind: CodeActionKindLiteralSupport {
						value_set: vec![
							lsp_types::CodeActionKind::QUICKFIX.as_str().to_string(),
							lsp_types::CodeActionKind::REFACTOR.as_str().to_string(),
							lsp_types::CodeActionKind::SOURCE.as_str().to_string(),
							lsp_types::CodeActionKind::SOURCE_ORGANIZE_IMPORTS.as_str().to_string(),
						],
					},
				}),
				resolve_support: Some(CodeActionCapabilityResolveSupport { properties: vec!["edit".into()] }),
				data_support: Some(true),
				..Default::default()
			}),
			rename: Some(RenameClientCapabilities {
				prepare_support: Some(true),
				..Default::default()
			}),
			inlay_hint: Some(InlayHintClientCapabilities {
				resolve_support: Some(lsp_types::InlayHintResolveClientCapabilities {
					properties: vec!["tooltip".into(), "textEdits".into()],
				}),
				..Default::default()
			}),
			..Default::default()
		}),
		window: Some(WindowClientCapabilities {
			work_done_progress: Some(true),
			..Default::default()
		}),
		general: Some(GeneralClientCapabilities {
			position_encodings: Some(offered_position_encodings.to_vec()),
			..Default::default()
		}),
		..Default::default()
	}
}
