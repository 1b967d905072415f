pub type Result<T> = std::result::Result<T, Error>;

/// Everything that can go wrong running a language server connection, from
/// the wire up through document synchronization.
#[derive(Debug, thiserror::Error)]
pub enum Error {
	#[error(transparent)]
	Rpc(#[from] kestrel_rpc::Error),

	#[error(transparent)]
	Framework(#[from] kestrel_lsp_framework::Error),

	#[cfg(feature = "position")]
	#[error(transparent)]
	Position(#[from] kestrel_primitives::Error),

	/// The client has no live connection to forward the call to.
	#[error("the client has no live connection to its language server")]
	NotConnected,

	/// No language server is registered for this language id.
	#[error("no language server registered for language {0:?}")]
	UnknownLanguage(String),

	/// A path could not be expressed as a `file://` URI (not absolute, or not
	/// valid UTF-8).
	#[error("{0:?} cannot be expressed as a file URI")]
	InvalidUri(std::path::PathBuf),

	/// The server rejected a request.
	#[error(transparent)]
	Server(#[from] kestrel_rpc::ResponseError),

	/// A transport- or protocol-level failure that doesn't fit the other
	/// variants — used heavily by test doubles to inject failures.
	#[error("protocol error: {0}")]
	Protocol(String),

	/// The `initialize` handshake itself failed.
	#[error("initialize failed: {0}")]
	InitializeFailed(String),

	/// Applying a server-initiated `workspace/applyEdit` failed on the host side.
	#[error("applying workspace edit failed: {0}")]
	ApplyEditFailed(String),

	/// The operation was cancelled before it completed.
	#[error("operation cancelled")]
	Cancelled,
}
