use lsp_types::{ClientInfo, InitializeParams, PositionEncodingKind, TraceValue, Uri, WorkspaceFolder};

use crate::capabilities::client_capabilities;

/// Trace verbosity requested of the server, mirrored onto the wire `trace` field.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Trace {
	#[default]
	Off,
	Messages,
	Verbose,
}

impl From<Trace> for TraceValue {
	fn from(trace: Trace) -> Self {
		match trace {
			Trace::Off => TraceValue::Off,
			Trace::Messages => TraceValue::Messages,
			Trace::Verbose => TraceValue::Verbose,
		}
	}
}

/// What the host tells the server about the project being edited.
pub struct WorkspaceContext {
	pub root_uri: Uri,
	pub root_path: Option<String>,
	pub workspace_folders: Vec<WorkspaceFolder>,
}

/// Assembles the `initialize` request body: root context, client identity,
/// the capability block, and the server-specific `initializationOptions`
/// blob (opaque to this layer).
pub fn initialize_params(
	ctx: WorkspaceContext,
	client_info: Option<ClientInfo>,
	initialization_options: Option<serde_json::Value>,
	trace: Trace,
	offered_position_encodings: &[PositionEncodingKind],
) -> InitializeParams {
	#[allow(deprecated)]
	InitializeParams {
		process_id: Some(std::process::id()),
		root_path: ctx.root_path,
		root_uri: Some(ctx.root_uri),
		initialization_options,
		capabilities: client_capabilities(offered_position_encodings),
		trace: Some(trace.into()),
		workspace_folders: Some(ctx.workspace_folders),
		client_info,
		locale: None,
		work_done_progress_params: Default::default(),
	}
}
