//! Single-threaded main loop driving the server.

use std::ops::ControlFlow;

use tokio::io::{AsyncBufRead, AsyncRead, AsyncWrite, AsyncWriteExt, BufReader};
use tokio::sync::mpsc;
use tokio::time::{Instant, sleep_until};
use tracing::{debug, error, warn};

use crate::config::ServerConfig;
use crate::message::Message;
use crate::server::Server;
use crate::session::Session;
use crate::socket::ClientSocket;
use crate::{Error, Result};

/// Main loop driver of the language server.
///
/// Input is read by a separate task so that a partially read frame is never dropped when a
/// timer fires. The loop itself handles one message or deadline at a time, in arrival order.
pub struct MainLoop {
	server: Server,
	/// Notifications queued by handlers.
	outgoing: mpsc::UnboundedReceiver<Message>,
}

impl MainLoop {
	/// Creates a main loop over a fresh session.
	#[must_use]
	pub fn new(config: ServerConfig) -> Self {
		let (client, outgoing) = ClientSocket::new();
		Self {
			server: Server::new(Session::new(config, client)),
			outgoing,
		}
	}

	/// Drive the main loop to provide the service.
	///
	/// Shortcut to [`MainLoop::run`] that wraps `input` in a [`BufReader`].
	#[allow(clippy::missing_errors_doc, reason = "errors documented in Self::run")]
	pub async fn run_buffered(
		self,
		input: impl AsyncRead + Send + Unpin + 'static,
		output: impl AsyncWrite + Unpin,
	) -> Result<()> {
		self.run(BufReader::new(input), output).await
	}

	/// Drive the main loop until the client sends `exit`.
	///
	/// # Errors
	///
	/// - `Error::Io` when the underlying `input` or `output` raises an error.
	/// - `Error::Eof` when the input ends before `exit`.
	/// - `Error::Protocol` when `exit` arrives without a preceding `shutdown`.
	pub async fn run(
		mut self,
		input: impl AsyncBufRead + Send + Unpin + 'static,
		mut output: impl AsyncWrite + Unpin,
	) -> Result<()> {
		let (tx, mut incoming) = mpsc::unbounded_channel();
		let reader = tokio::spawn(read_messages(input, tx));

		let ret = loop {
			let deadline = self.server.session().next_deadline();
			let message = tokio::select! {
				biased;

				Some(message) = self.outgoing.recv() => Some(message),

				() = sleep_until(deadline.unwrap_or_else(Instant::now)), if deadline.is_some() => {
					self.server.session_mut().poll(Instant::now());
					None
				}

				msg = incoming.recv() => match msg {
					Some(Ok(msg)) => match self.dispatch(msg) {
						ControlFlow::Continue(reply) => reply,
						ControlFlow::Break(ret) => break ret,
					},
					Some(Err(err)) if err.is_recoverable() => {
						warn!(error = %err, "skipping malformed message");
						None
					}
					Some(Err(err)) => break Err(err),
					None => break Err(Error::Eof),
				},
			};

			if let Some(message) = message
				&& let Err(err) = message.write(&mut output).await
			{
				break Err(err);
			}
		};

		reader.abort();
		while let Ok(message) = self.outgoing.try_recv() {
			message.write(&mut output).await?;
		}
		output.shutdown().await?;
		ret
	}

	fn dispatch(&mut self, msg: Message) -> ControlFlow<Result<()>, Option<Message>> {
		match msg {
			Message::Request(req) => ControlFlow::Continue(Some(Message::Response(self.server.request(req)))),
			Message::Notification(notif) => {
				self.server.notify(notif)?;
				ControlFlow::Continue(None)
			}
			Message::Response(resp) => {
				debug!(id = %resp.id, "ignoring response to a request never sent");
				ControlFlow::Continue(None)
			}
		}
	}
}

/// Forwards framed messages until the input fails or the loop goes away.
async fn read_messages(mut input: impl AsyncBufRead + Unpin, tx: mpsc::UnboundedSender<Result<Message>>) {
	loop {
		let msg = Message::read(&mut input).await;
		let fatal = msg.as_ref().is_err_and(|err| !err.is_recoverable());
		if let Err(err) = &msg
			&& fatal
			&& !matches!(err, Error::Eof)
		{
			error!(error = %err, "input failed");
		}
		if tx.send(msg).is_err() || fatal {
			break;
		}
	}
}
