//! Containment of handler panics.

use std::any::Any;
use std::panic::{AssertUnwindSafe, catch_unwind};

/// Runs `f`, turning a panic into `Err` with the panic message.
pub(crate) fn contain<T>(f: impl FnOnce() -> T) -> Result<T, String> {
	catch_unwind(AssertUnwindSafe(f)).map_err(|payload| message(payload.as_ref()))
}

/// Runs `f`, logging a panic and substituting `fallback()`.
pub(crate) fn or_else<T>(what: &str, f: impl FnOnce() -> T, fallback: impl FnOnce() -> T) -> T {
	contain(f).unwrap_or_else(|panic| {
		tracing::error!(handler = what, %panic, "handler panicked");
		fallback()
	})
}

fn message(payload: &(dyn Any + Send)) -> String {
	if let Some(msg) = payload.downcast_ref::<&str>() {
		(*msg).to_owned()
	} else if let Some(msg) = payload.downcast_ref::<String>() {
		msg.clone()
	} else {
		"unknown panic payload".to_owned()
	}
}

#[cfg(test)]
mod tests {
	use super::*;

	#[test]
	fn panic_message_is_captured() {
		let result: Result<(), _> = contain(|| panic!("boom {}", 1));
		assert_eq!(result, Err("boom 1".to_owned()));
	}

	#[test]
	fn fallback_replaces_panicking_result() {
		let items: Vec<u8> = or_else("test", || panic!("bad input"), Vec::new);
		assert!(items.is_empty());
		assert_eq!(or_else("test", || 3, || 0), 3);
	}
}
