//! `Content-Length` framed JSON-RPC messages.

use serde_json::{Value as JsonValue, json};
use tokio::io::{AsyncBufRead, AsyncBufReadExt, AsyncReadExt, AsyncWrite, AsyncWriteExt};

use crate::types::{AnyNotification, AnyRequest, AnyResponse};
use crate::{Error, Result};

const CONTENT_LENGTH: &str = "Content-Length";

/// A JSON-RPC message in either direction.
#[derive(Debug, Clone, PartialEq)]
pub enum Message {
	/// A request expecting a response.
	Request(AnyRequest),
	/// A response to an earlier request.
	Response(AnyResponse),
	/// A notification.
	Notification(AnyNotification),
}

impl Message {
	/// Reads one framed message.
	///
	/// # Errors
	///
	/// - [`Error::Eof`] when the input ends before a header starts.
	/// - [`Error::Protocol`] for a missing or malformed `Content-Length` header.
	/// - [`Error::Deserialize`] when the body is not a JSON-RPC message. The body has been
	///   consumed, so the next read starts at the following frame.
	/// - [`Error::Io`] from the underlying reader.
	pub async fn read(input: &mut (impl AsyncBufRead + Unpin)) -> Result<Self> {
		let mut line = String::new();
		let mut content_length = None;
		loop {
			line.clear();
			if input.read_line(&mut line).await? == 0 {
				return Err(Error::Eof);
			}
			let header = line.trim();
			if header.is_empty() {
				break;
			}
			if let Some((name, value)) = header.split_once(':')
				&& name.trim().eq_ignore_ascii_case(CONTENT_LENGTH)
			{
				let value = value.trim();
				content_length = Some(
					value
						.parse::<usize>()
						.map_err(|_| Error::Protocol(format!("invalid {CONTENT_LENGTH}: {value}")))?,
				);
			}
		}

		let length = content_length.ok_or_else(|| Error::Protocol(format!("missing {CONTENT_LENGTH}")))?;
		let mut body = vec![0u8; length];
		input.read_exact(&mut body).await?;
		Self::from_value(serde_json::from_slice(&body)?)
	}

	/// Writes the message with its `Content-Length` header and flushes.
	///
	/// # Errors
	///
	/// Returns [`Error::Io`] when the output fails.
	pub async fn write(&self, output: &mut (impl AsyncWrite + Unpin)) -> Result<()> {
		let json = serde_json::to_string(&self.to_value())?;
		let frame = format!("{CONTENT_LENGTH}: {}\r\n\r\n{}", json.len(), json);
		output.write_all(frame.as_bytes()).await?;
		output.flush().await?;
		Ok(())
	}

	/// Classifies a decoded body: `id` and `method` make a request, `method` alone a
	/// notification, `id` alone a response.
	fn from_value(value: JsonValue) -> Result<Self> {
		let has_id = value.get("id").is_some();
		let has_method = value.get("method").is_some();
		Ok(match (has_id, has_method) {
			(true, true) => Self::Request(serde_json::from_value(value)?),
			(false, true) => Self::Notification(serde_json::from_value(value)?),
			(true, false) => Self::Response(serde_json::from_value(value)?),
			(false, false) => {
				return Err(Error::Protocol("message has neither `id` nor `method`".into()));
			}
		})
	}

	fn to_value(&self) -> JsonValue {
		match self {
			Self::Request(req) => json!({
				"jsonrpc": "2.0",
				"id": req.id,
				"method": req.method,
				"params": req.params,
			}),
			Self::Notification(notif) => json!({
				"jsonrpc": "2.0",
				"method": notif.method,
				"params": notif.params,
			}),
			Self::Response(AnyResponse {
				id,
				error: Some(error),
				..
			}) => json!({
				"jsonrpc": "2.0",
				"id": id,
				"error": error,
			}),
			Self::Response(AnyResponse { id, result, .. }) => json!({
				"jsonrpc": "2.0",
				"id": id,
				"result": result.clone().unwrap_or(JsonValue::Null),
			}),
		}
	}
}

#[cfg(test)]
mod tests {
	use pretty_assertions::assert_eq;

	use super::*;
	use crate::types::RequestId;

	fn frame(body: &str) -> String {
		format!("Content-Length: {}\r\n\r\n{body}", body.len())
	}

	#[tokio::test]
	async fn reads_consecutive_frames() {
		let input = frame(r#"{"jsonrpc":"2.0","id":1,"method":"shutdown"}"#)
			+ &frame(r#"{"jsonrpc":"2.0","method":"exit"}"#);
		let mut reader = input.as_bytes();

		let first = Message::read(&mut reader).await.unwrap();
		assert_eq!(
			first,
			Message::Request(AnyRequest {
				id: RequestId::Number(1),
				method: "shutdown".into(),
				params: JsonValue::Null,
			})
		);
		let second = Message::read(&mut reader).await.unwrap();
		assert!(matches!(second, Message::Notification(n) if n.method == "exit"));
		assert!(matches!(Message::read(&mut reader).await, Err(Error::Eof)));
	}

	#[tokio::test]
	async fn extra_headers_are_ignored() {
		let body = r#"{"jsonrpc":"2.0","method":"initialized","params":{}}"#;
		let input = format!(
			"content-length: {}\r\nContent-Type: application/vscode-jsonrpc; charset=utf-8\r\n\r\n{body}",
			body.len()
		);
		let msg = Message::read(&mut input.as_bytes()).await.unwrap();
		assert!(matches!(msg, Message::Notification(n) if n.method == "initialized"));
	}

	#[tokio::test]
	async fn missing_length_is_a_protocol_error() {
		let mut reader = "Content-Type: text/plain\r\n\r\n{}".as_bytes();
		assert!(matches!(
			Message::read(&mut reader).await,
			Err(Error::Protocol(_))
		));
	}

	#[tokio::test]
	async fn malformed_body_leaves_stream_aligned() {
		let input = frame("{not json}") + &frame(r#"{"jsonrpc":"2.0","method":"exit"}"#);
		let mut reader = input.as_bytes();
		let err = Message::read(&mut reader).await.unwrap_err();
		assert!(err.is_recoverable());
		let next = Message::read(&mut reader).await.unwrap();
		assert!(matches!(next, Message::Notification(n) if n.method == "exit"));
	}

	#[tokio::test]
	async fn writes_framed_response() {
		let mut out = Vec::new();
		Message::Response(AnyResponse::ok(RequestId::Number(3), JsonValue::Null))
			.write(&mut out)
			.await
			.unwrap();
		let body = r#"{"id":3,"jsonrpc":"2.0","result":null}"#;
		assert_eq!(String::from_utf8(out).unwrap(), frame(body));
	}
}
