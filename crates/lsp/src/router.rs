//! Dispatch of requests and notifications to typed handlers.

use std::collections::HashMap;
use std::ops::ControlFlow;

use lsp_types::notification::Notification;
use lsp_types::request::Request;
use serde_json::Value as JsonValue;
use tracing::{debug, error, warn};

use crate::types::{AnyNotification, AnyRequest, AnyResponse, ErrorCode, ResponseError};
use crate::{Result, panic};

type RequestHandler<S> = Box<dyn Fn(&mut S, JsonValue) -> Result<JsonValue, ResponseError>>;
type NotificationHandler<S> = Box<dyn Fn(&mut S, JsonValue) -> ControlFlow<Result<()>>>;

/// Routes messages by method to handlers operating on a state `S`.
///
/// Handler panics are contained: a panicking request answers `InternalError`, a panicking
/// notification is logged and skipped.
pub struct Router<S> {
	requests: HashMap<&'static str, RequestHandler<S>>,
	notifications: HashMap<&'static str, NotificationHandler<S>>,
}

impl<S> Default for Router<S> {
	fn default() -> Self {
		Self {
			requests: HashMap::new(),
			notifications: HashMap::new(),
		}
	}
}

impl<S> Router<S> {
	/// Creates a router without handlers.
	#[must_use]
	pub fn new() -> Self {
		Self::default()
	}

	/// Registers the handler of request `R`, replacing any previous one.
	pub fn request<R: Request>(
		&mut self,
		handler: impl Fn(&mut S, R::Params) -> Result<R::Result, ResponseError> + 'static,
	) -> &mut Self {
		self.requests.insert(
			R::METHOD,
			Box::new(move |state, params| {
				let params = serde_json::from_value::<R::Params>(params)
					.map_err(|err| ResponseError::new(ErrorCode::INVALID_PARAMS, err))?;
				let result = handler(state, params)?;
				serde_json::to_value(result).map_err(|err| ResponseError::new(ErrorCode::INTERNAL_ERROR, err))
			}),
		);
		self
	}

	/// Registers the handler of notification `N`, replacing any previous one.
	///
	/// Notifications with undecodable parameters are logged and dropped.
	pub fn notification<N: Notification>(
		&mut self,
		handler: impl Fn(&mut S, N::Params) -> ControlFlow<Result<()>> + 'static,
	) -> &mut Self {
		self.notifications.insert(
			N::METHOD,
			Box::new(move |state, params| match serde_json::from_value::<N::Params>(params) {
				Ok(params) => handler(state, params),
				Err(err) => {
					warn!(method = N::METHOD, error = %err, "invalid notification params");
					ControlFlow::Continue(())
				}
			}),
		);
		self
	}

	/// Answers a request. Unknown methods answer `MethodNotFound`.
	pub fn call(&self, state: &mut S, req: AnyRequest) -> AnyResponse {
		let AnyRequest { id, method, params } = req;
		let Some(handler) = self.requests.get(method.as_str()) else {
			return AnyResponse::err(
				id,
				ResponseError::new(ErrorCode::METHOD_NOT_FOUND, format!("unhandled request: {method}")),
			);
		};
		debug!(%id, %method, "request");
		match panic::contain(|| handler(state, params)) {
			Ok(Ok(result)) => AnyResponse::ok(id, result),
			Ok(Err(err)) => {
				warn!(%id, %method, error = %err, "request failed");
				AnyResponse::err(id, err)
			}
			Err(panic) => {
				error!(%id, %method, %panic, "request handler panicked");
				AnyResponse::err(id, ResponseError::new(ErrorCode::INTERNAL_ERROR, panic))
			}
		}
	}

	/// Delivers a notification. Unknown `$/` notifications are dropped silently, other
	/// unknown ones with a log line.
	pub fn notify(&self, state: &mut S, notif: AnyNotification) -> ControlFlow<Result<()>> {
		let AnyNotification { method, params } = notif;
		match self.notifications.get(method.as_str()) {
			Some(handler) => panic::contain(|| handler(state, params)).unwrap_or_else(|panic| {
				error!(%method, %panic, "notification handler panicked");
				ControlFlow::Continue(())
			}),
			None if method.starts_with("$/") => ControlFlow::Continue(()),
			None => {
				warn!(%method, "unhandled notification");
				ControlFlow::Continue(())
			}
		}
	}
}
