use crate::message::ResponseError;

pub type Result<T> = std::result::Result<T, Error>;

/// Everything that can go wrong sending, framing, or correlating a message.
#[derive(Debug, thiserror::Error)]
pub enum Error {
	#[error("i/o error: {0}")]
	Io(#[from] std::io::Error),

	#[error("malformed message: {0}")]
	Codec(String),

	#[error("peer returned an error response: {0}")]
	Remote(#[from] ResponseError),

	#[error("the peer's message pump has shut down")]
	Closed,

	#[error("request timed out waiting for a response")]
	Timeout,

	#[error("response id {0:?} did not match any in-flight request")]
	UnexpectedResponse(crate::message::RequestId),
}
