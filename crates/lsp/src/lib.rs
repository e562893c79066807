//! Language server for [ALPS] profiles.
//!
//! [ALPS]: https://alps.io
//!
//! The server is a single-threaded worker: one [`MainLoop`] reads framed JSON-RPC messages,
//! dispatches them through a [`router::Router`] to the [`Session`], and drives the per-document
//! diagnostics [`pipeline`] from the same `select!`. Analysis itself lives in
//! [`alps_analysis`]; this crate only owns protocol plumbing, document state and timing.
//!
//! - [`message`]: `Content-Length` framing of JSON-RPC messages.
//! - [`router`]: typed method dispatch with panic containment.
//! - [`server`]: initialization, shutdown and exit handling.
//! - [`session`]: open documents, their dialects and descriptor tables.
//! - [`pipeline`]: the debounce-then-dual-publish diagnostics state machine.
#![warn(missing_docs)]
use std::io;

/// Re-export of the [`lsp_types`] dependency of this crate.
pub use lsp_types;
pub use serde_json::Value as JsonValue;

mod config;
mod document;
mod mainloop;
pub mod message;
mod panic;
pub mod pipeline;
pub mod position;
pub mod router;
pub mod server;
mod session;
mod socket;
mod types;

pub use config::ServerConfig;
pub use document::Document;
pub use mainloop::MainLoop;
pub use message::Message;
pub use session::Session;
pub use socket::ClientSocket;
pub use types::{AnyNotification, AnyRequest, AnyResponse, ErrorCode, RequestId, ResponseError};

/// A convenient type alias for `Result` with `E` = [`enum@crate::Error`].
pub type Result<T, E = Error> = std::result::Result<T, E>;

/// Possible errors.
#[derive(Debug, thiserror::Error)]
#[non_exhaustive]
pub enum Error {
	/// The main loop stopped and no longer accepts outgoing messages.
	#[error("service stopped")]
	ServiceStopped,
	/// The peer sent an undecodable message body.
	#[error("deserialization failed: {0}")]
	Deserialize(#[from] serde_json::Error),
	/// The peer violates the Language Server Protocol.
	#[error("protocol error: {0}")]
	Protocol(String),
	/// Input/output errors from the underlying channels.
	#[error("{0}")]
	Io(#[from] io::Error),
	/// The underlying channel reached EOF (end of file).
	#[error("the underlying channel reached EOF")]
	Eof,
}

impl Error {
	/// Whether the main loop can keep reading after this error.
	///
	/// Malformed bodies and headers consume their frame, so the stream stays aligned.
	#[must_use]
	pub fn is_recoverable(&self) -> bool {
		matches!(self, Self::Deserialize(_) | Self::Protocol(_))
	}
}
