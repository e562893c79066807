//! Server initialization, shutting down, and exit handling.

use std::ops::ControlFlow;

use lsp_types::notification::{
	DidChangeTextDocument, DidCloseTextDocument, DidOpenTextDocument, Exit, Initialized,
	Notification,
};
use lsp_types::request::{Completion, Initialize, Request, ResolveCompletionItem, Shutdown};
use serde_json::Value as JsonValue;
use tokio::time::Instant;
use tracing::{debug, info, warn};

use crate::router::Router;
use crate::session::Session;
use crate::types::{AnyNotification, AnyRequest, AnyResponse, ErrorCode, ResponseError};
use crate::{Error, Result};

/// Position in the server lifecycle.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Lifecycle {
	/// Waiting for `initialize`.
	#[default]
	Uninitialized,
	/// Serving requests.
	Running,
	/// `shutdown` was answered; only `exit` remains meaningful.
	ShuttingDown,
}

/// The session behind the lifecycle gate and the method router.
pub struct Server {
	router: Router<Session>,
	session: Session,
	lifecycle: Lifecycle,
}

impl Server {
	/// Wires the standard handlers to `session`.
	#[must_use]
	pub fn new(session: Session) -> Self {
		let mut router = Router::<Session>::new();
		router
			.request::<Initialize>(|session, params| Ok(session.initialize(params)))
			.request::<Completion>(|session, params| Ok(Some(session.completion(params))))
			.request::<ResolveCompletionItem>(|session, item| Ok(session.resolve(item)))
			.notification::<Initialized>(|_, _| ControlFlow::Continue(()))
			.notification::<DidOpenTextDocument>(|session, params| {
				session.open(params, Instant::now());
				ControlFlow::Continue(())
			})
			.notification::<DidChangeTextDocument>(|session, params| {
				session.change(params, Instant::now());
				ControlFlow::Continue(())
			})
			.notification::<DidCloseTextDocument>(|session, params| {
				session.close(params);
				ControlFlow::Continue(())
			});
		Self {
			router,
			session,
			lifecycle: Lifecycle::Uninitialized,
		}
	}

	/// The current lifecycle state.
	#[must_use]
	pub fn lifecycle(&self) -> Lifecycle {
		self.lifecycle
	}

	/// The session.
	#[must_use]
	pub fn session(&self) -> &Session {
		&self.session
	}

	/// The session, mutably.
	pub fn session_mut(&mut self) -> &mut Session {
		&mut self.session
	}

	/// Answers a request according to the lifecycle state.
	pub fn request(&mut self, req: AnyRequest) -> AnyResponse {
		let method = req.method.as_str();
		match (self.lifecycle, method) {
			(Lifecycle::Uninitialized, Initialize::METHOD) => {
				let resp = self.router.call(&mut self.session, req);
				if resp.error.is_none() {
					self.lifecycle = Lifecycle::Running;
				}
				resp
			}
			(Lifecycle::Uninitialized, _) => reject(req, ErrorCode::SERVER_NOT_INITIALIZED, "server not initialized"),
			(Lifecycle::Running, Initialize::METHOD) => reject(req, ErrorCode::INVALID_REQUEST, "server already initialized"),
			(Lifecycle::Running, Shutdown::METHOD) => {
				info!("shutdown requested");
				self.lifecycle = Lifecycle::ShuttingDown;
				AnyResponse::ok(req.id, JsonValue::Null)
			}
			(Lifecycle::Running, _) => self.router.call(&mut self.session, req),
			(Lifecycle::ShuttingDown, _) => reject(req, ErrorCode::INVALID_REQUEST, "server is shutting down"),
		}
	}

	/// Delivers a notification. `exit` breaks the main loop; other notifications outside the
	/// running state are dropped.
	pub fn notify(&mut self, notif: AnyNotification) -> ControlFlow<Result<()>> {
		if notif.method == Exit::METHOD {
			return match self.lifecycle {
				Lifecycle::ShuttingDown => ControlFlow::Break(Ok(())),
				state => {
					warn!(?state, "exit without shutdown");
					ControlFlow::Break(Err(Error::Protocol("exit without shutdown".into())))
				}
			};
		}
		if self.lifecycle != Lifecycle::Running {
			debug!(method = %notif.method, state = ?self.lifecycle, "dropping notification");
			return ControlFlow::Continue(());
		}
		self.router.notify(&mut self.session, notif)
	}
}

fn reject(req: AnyRequest, code: ErrorCode, message: &str) -> AnyResponse {
	debug!(id = %req.id, method = %req.method, message, "rejecting request");
	AnyResponse::err(req.id, ResponseError::new(code, message))
}

#[cfg(test)]
mod tests {
	use serde_json::json;

	use super::*;
	use crate::config::ServerConfig;
	use crate::socket::ClientSocket;
	use crate::types::RequestId;

	fn server() -> Server {
		let (client, _rx) = ClientSocket::new();
		Server::new(Session::new(ServerConfig::default(), client))
	}

	fn request(id: i32, method: &str, params: JsonValue) -> AnyRequest {
		AnyRequest {
			id: RequestId::Number(id),
			method: method.into(),
			params,
		}
	}

	fn exit() -> AnyNotification {
		AnyNotification {
			method: Exit::METHOD.into(),
			params: JsonValue::Null,
		}
	}

	fn error_code(resp: &AnyResponse) -> Option<ErrorCode> {
		resp.error.as_ref().map(|e| e.code)
	}

	#[test]
	fn requests_before_initialize_are_rejected() {
		let mut server = server();
		let resp = server.request(request(1, Shutdown::METHOD, JsonValue::Null));
		assert_eq!(error_code(&resp), Some(ErrorCode::SERVER_NOT_INITIALIZED));
		assert_eq!(server.lifecycle(), Lifecycle::Uninitialized);
	}

	#[test]
	fn full_lifecycle() {
		let mut server = server();
		let resp = server.request(request(1, Initialize::METHOD, json!({"capabilities": {}})));
		assert!(resp.result.is_some());
		assert_eq!(server.lifecycle(), Lifecycle::Running);

		let again = server.request(request(2, Initialize::METHOD, json!({"capabilities": {}})));
		assert_eq!(error_code(&again), Some(ErrorCode::INVALID_REQUEST));

		let resp = server.request(request(3, Shutdown::METHOD, JsonValue::Null));
		assert_eq!(resp.result, Some(JsonValue::Null));

		let late = server.request(request(4, Completion::METHOD, json!({})));
		assert_eq!(error_code(&late), Some(ErrorCode::INVALID_REQUEST));
		assert!(matches!(server.notify(exit()), ControlFlow::Break(Ok(()))));
	}

	#[test]
	fn exit_without_shutdown_is_an_error() {
		let mut server = server();
		assert!(matches!(
			server.notify(exit()),
			ControlFlow::Break(Err(Error::Protocol(_)))
		));
	}

	#[test]
	fn failed_initialize_keeps_waiting() {
		let mut server = server();
		let resp = server.request(request(1, Initialize::METHOD, json!("nonsense")));
		assert_eq!(error_code(&resp), Some(ErrorCode::INVALID_PARAMS));
		assert_eq!(server.lifecycle(), Lifecycle::Uninitialized);
	}
}
