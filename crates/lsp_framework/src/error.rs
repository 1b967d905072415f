pub type Result<T> = std::result::Result<T, Error>;

/// Errors from the framework layer: process supervision, framing glue, and
/// the handful of pure helpers (capability block, position conversion) that
/// sit underneath the protocol state machine in `kestrel-lsp`.
#[derive(Debug, thiserror::Error)]
pub enum Error {
	#[error("rpc error")]
	Rpc(#[from] kestrel_rpc::Error),
	#[error("io error")]
	Io(#[from] std::io::Error),
	#[error("operation unsupported on this platform: {0}")]
	Unsupported(&'static str),
	#[cfg(feature = "position")]
	#[error("position conversion error")]
	Position(#[from] kestrel_primitives::Error),
}
