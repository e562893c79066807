//! Outgoing channel from handlers to the main loop.

use lsp_types::notification::{Notification, PublishDiagnostics};
use lsp_types::{Diagnostic, PublishDiagnosticsParams, Uri};
use tokio::sync::mpsc;

use crate::message::Message;
use crate::types::AnyNotification;
use crate::{Error, Result};

/// Handle for sending notifications to the client.
///
/// Messages are queued for the [`MainLoop`](crate::MainLoop), which writes them in order
/// between handling inputs.
#[derive(Debug, Clone)]
pub struct ClientSocket {
	tx: mpsc::UnboundedSender<Message>,
}

impl ClientSocket {
	/// Creates a socket and the receiver the main loop drains.
	#[must_use]
	pub fn new() -> (Self, mpsc::UnboundedReceiver<Message>) {
		let (tx, rx) = mpsc::unbounded_channel();
		(Self { tx }, rx)
	}

	/// Queues a notification.
	///
	/// # Errors
	///
	/// - [`Error::Deserialize`] when the parameters cannot be serialized.
	/// - [`Error::ServiceStopped`] when the main loop has gone away.
	pub fn notify<N: Notification>(&self, params: N::Params) -> Result<()> {
		let params = serde_json::to_value(params)?;
		self.tx
			.send(Message::Notification(AnyNotification {
				method: N::METHOD.into(),
				params,
			}))
			.map_err(|_| Error::ServiceStopped)
	}

	/// Replaces the client's diagnostics for `uri`.
	///
	/// # Errors
	///
	/// See [`ClientSocket::notify`].
	pub fn publish_diagnostics(&self, uri: Uri, diagnostics: Vec<Diagnostic>, version: Option<i32>) -> Result<()> {
		self.notify::<PublishDiagnostics>(PublishDiagnosticsParams {
			uri,
			diagnostics,
			version,
		})
	}
}
