use serde::{Deserialize, Serialize};

/// Alias kept so call sites don't need to name `serde_json` directly.
pub type JsonValue = serde_json::Value;

/// A JSON-RPC request id: either a number or a string, per the spec.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(untagged)]
pub enum RequestId {
	Number(i64),
	String(String),
}

impl std::fmt::Display for RequestId {
	fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
		match self {
			RequestId::Number(n) => write!(f, "{n}"),
			RequestId::String(s) => write!(f, "{s}"),
		}
	}
}

/// A request whose `method` has not yet been matched against a known handler.
/// The LSP layer deserializes `params` once it knows the expected type.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AnyRequest {
	pub id: RequestId,
	pub method: String,
	#[serde(default, skip_serializing_if = "Option::is_none")]
	pub params: Option<JsonValue>,
}

/// A notification: like [`AnyRequest`] but with no id and no expected reply.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AnyNotification {
	pub method: String,
	#[serde(default, skip_serializing_if = "Option::is_none")]
	pub params: Option<JsonValue>,
}

/// A JSON-RPC error object, also usable as a Rust [`std::error::Error`].
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, thiserror::Error)]
#[error("rpc error {code}: {message}")]
pub struct ResponseError {
	pub code: i64,
	pub message: String,
	#[serde(default, skip_serializing_if = "Option::is_none")]
	pub data: Option<JsonValue>,
}

impl ResponseError {
	pub const PARSE_ERROR: i64 = -32700;
	pub const INVALID_REQUEST: i64 = -32600;
	pub const METHOD_NOT_FOUND: i64 = -32601;
	pub const INVALID_PARAMS: i64 = -32602;
	pub const INTERNAL_ERROR: i64 = -32603;
	pub const REQUEST_CANCELLED: i64 = -32800;
	pub const CONTENT_MODIFIED: i64 = -32801;

	pub fn internal(message: impl Into<String>) -> Self {
		Self {
			code: Self::INTERNAL_ERROR,
			message: message.into(),
			data: None,
		}
	}
}

/// A response to a previously-sent request: either a result or an error, never both.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AnyResponse {
	pub id: RequestId,
	#[serde(default, skip_serializing_if = "Option::is_none")]
	pub result: Option<JsonValue>,
	#[serde(default, skip_serializing_if = "Option::is_none")]
	pub error: Option<ResponseError>,
}

impl AnyResponse {
	/// Builds a successful response carrying `result`.
	pub fn new_ok(id: RequestId, result: JsonValue) -> Self {
		Self { id, result: Some(result), error: None }
	}

	pub fn into_result(self) -> Result<JsonValue, ResponseError> {
		match (self.result, self.error) {
			(_, Some(err)) => Err(err),
			(Some(value), None) => Ok(value),
			(None, None) => Ok(JsonValue::Null),
		}
	}
}

/// Any of the three message shapes that can appear on the wire, framed one per
/// `Content-Length` envelope. JSON-RPC distinguishes them by which fields are
/// present rather than by a type tag, so this mirrors that structurally.
#[derive(Debug, Clone)]
pub enum Message {
	Request(AnyRequest),
	Notification(AnyNotification),
	Response(AnyResponse),
}

#[derive(Debug, Deserialize)]
struct RawMessage {
	#[serde(default)]
	id: Option<RequestId>,
	#[serde(default)]
	method: Option<String>,
	#[serde(default)]
	params: Option<JsonValue>,
	#[serde(default)]
	result: Option<JsonValue>,
	#[serde(default)]
	error: Option<ResponseError>,
}

impl Message {
	pub fn from_json_value(value: JsonValue) -> Result<Self, crate::Error> {
		let raw: RawMessage = serde_json::from_value(value).map_err(|e| crate::Error::Codec(e.to_string()))?;
		match (raw.id, raw.method) {
			(Some(id), Some(method)) => Ok(Message::Request(AnyRequest { id, method, params: raw.params })),
			(None, Some(method)) => Ok(Message::Notification(AnyNotification { method, params: raw.params })),
			(Some(id), None) => Ok(Message::Response(AnyResponse {
				id,
				result: raw.result,
				error: raw.error,
			})),
			(None, None) => Err(crate::Error::Codec("message has neither `id` nor `method`".into())),
		}
	}

	pub fn to_json_value(&self) -> JsonValue {
		#[derive(Serialize)]
		struct Envelope<'a> {
			jsonrpc: &'static str,
			#[serde(flatten)]
			body: Body<'a>,
		}

		#[derive(Serialize)]
		#[serde(untagged)]
		enum Body<'a> {
			Request(&'a AnyRequest),
			Notification(&'a AnyNotification),
			Response(&'a AnyResponse),
		}

		let body = match self {
			Message::Request(r) => Body::Request(r),
			Message::Notification(n) => Body::Notification(n),
			Message::Response(r) => Body::Response(r),
		};
		serde_json::to_value(Envelope { jsonrpc: "2.0", body }).expect("Message serializes to a JSON object")
	}
}
