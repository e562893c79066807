//! JSON-RPC envelope types.

use std::fmt;

use serde::{Deserialize, Serialize};
use serde_json::Value as JsonValue;

/// A request ID, either a number or a string.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(untagged)]
pub enum RequestId {
	/// Numeric ID.
	Number(i32),
	/// String ID.
	String(String),
}

impl fmt::Display for RequestId {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		match self {
			Self::Number(id) => write!(f, "{id}"),
			Self::String(id) => write!(f, "{id:?}"),
		}
	}
}

/// A request with untyped parameters.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AnyRequest {
	/// The request ID.
	pub id: RequestId,
	/// The method to be invoked.
	pub method: String,
	/// The method's parameters.
	#[serde(default)]
	pub params: JsonValue,
}

/// A notification with untyped parameters.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AnyNotification {
	/// The method to be invoked.
	pub method: String,
	/// The notification's parameters.
	#[serde(default)]
	pub params: JsonValue,
}

/// A response carrying either a result or an error.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AnyResponse {
	/// The ID of the request this answers.
	pub id: RequestId,
	/// The result on success.
	#[serde(default, skip_serializing_if = "Option::is_none")]
	pub result: Option<JsonValue>,
	/// The error on failure.
	#[serde(default, skip_serializing_if = "Option::is_none")]
	pub error: Option<ResponseError>,
}

impl AnyResponse {
	/// A successful response.
	#[must_use]
	pub fn ok(id: RequestId, result: JsonValue) -> Self {
		Self {
			id,
			result: Some(result),
			error: None,
		}
	}

	/// A failed response.
	#[must_use]
	pub fn err(id: RequestId, error: ResponseError) -> Self {
		Self {
			id,
			result: None,
			error: Some(error),
		}
	}
}

/// The error object of a failed response.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, thiserror::Error)]
#[error("{message} ({code})")]
pub struct ResponseError {
	/// A number indicating the error type that occurred.
	pub code: ErrorCode,
	/// A short description of the error.
	pub message: String,
	/// Additional information about the error.
	#[serde(default, skip_serializing_if = "Option::is_none")]
	pub data: Option<JsonValue>,
}

impl ResponseError {
	/// Creates an error without extra data.
	#[must_use]
	pub fn new(code: ErrorCode, message: impl fmt::Display) -> Self {
		Self {
			code,
			message: message.to_string(),
			data: None,
		}
	}
}

/// A JSON-RPC error code.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ErrorCode(pub i32);

impl ErrorCode {
	/// Invalid JSON was received.
	pub const PARSE_ERROR: Self = Self(-32700);
	/// The JSON sent is not a valid request object.
	pub const INVALID_REQUEST: Self = Self(-32600);
	/// The method does not exist or is not available.
	pub const METHOD_NOT_FOUND: Self = Self(-32601);
	/// Invalid method parameters.
	pub const INVALID_PARAMS: Self = Self(-32602);
	/// Internal error.
	pub const INTERNAL_ERROR: Self = Self(-32603);
	/// A request arrived before `initialize`.
	pub const SERVER_NOT_INITIALIZED: Self = Self(-32002);
	/// The client cancelled the request.
	pub const REQUEST_CANCELLED: Self = Self(-32800);
}

impl fmt::Display for ErrorCode {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		fmt::Display::fmt(&self.0, f)
	}
}
