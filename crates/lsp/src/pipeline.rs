//! Debounced, two-stage diagnostics publishing.
//!
//! Every content change restarts a debounce timer. When it expires the document is validated
//! and only error-severity diagnostics are published; the complete set, warnings included,
//! follows after a further delay unless another change supersedes it. A document moves through
//!
//! ```text
//! Idle -> PendingValidation -> ErrorsPublished -> Idle
//!   ^            |                    |
//!   +--- change restarts the debounce-+
//! ```
//!
//! The machine holds no timers of its own: the owner asks for [`Pipeline::deadline`], sleeps
//! until then, and calls [`Pipeline::poll`] with the current time. Tests drive it with
//! explicit instants.

use std::time::Duration;

use alps_analysis::diagnostic::is_error;
use lsp_types::Diagnostic;
use tokio::time::Instant;

/// Delays governing the pipeline.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Timing {
	/// Quiet period after the last change before validating.
	pub debounce: Duration,
	/// Delay between publishing errors and publishing the full set.
	pub warning_delay: Duration,
}

impl Default for Timing {
	fn default() -> Self {
		Self {
			debounce: Duration::from_millis(500),
			warning_delay: Duration::from_millis(1000),
		}
	}
}

#[derive(Debug, Clone, Default)]
enum Stage {
	#[default]
	Idle,
	PendingValidation {
		due: Instant,
	},
	ErrorsPublished {
		due: Instant,
		diagnostics: Vec<Diagnostic>,
	},
}

/// What the owner must do when a deadline passes.
#[derive(Debug, Clone, PartialEq)]
pub enum Step {
	/// Validate the current text and hand the result to [`Pipeline::record`].
	Validate,
	/// Publish the complete diagnostic set.
	PublishAll(Vec<Diagnostic>),
}

/// Per-document diagnostics state machine.
#[derive(Debug, Clone, Default)]
pub struct Pipeline {
	timing: Timing,
	stage: Stage,
}

impl Pipeline {
	/// Creates an idle pipeline.
	#[must_use]
	pub fn new(timing: Timing) -> Self {
		Self {
			timing,
			stage: Stage::Idle,
		}
	}

	/// Restarts the debounce after a content change, dropping any pending publish.
	pub fn schedule(&mut self, now: Instant) {
		self.stage = Stage::PendingValidation {
			due: now + self.timing.debounce,
		};
	}

	/// The instant at which [`Pipeline::poll`] next has work.
	#[must_use]
	pub fn deadline(&self) -> Option<Instant> {
		match &self.stage {
			Stage::Idle => None,
			Stage::PendingValidation { due } | Stage::ErrorsPublished { due, .. } => Some(*due),
		}
	}

	/// Whether nothing is scheduled.
	#[must_use]
	pub fn is_idle(&self) -> bool {
		matches!(self.stage, Stage::Idle)
	}

	/// Advances the machine if its deadline has passed.
	///
	/// After [`Step::Validate`] the pipeline is idle until [`Pipeline::record`] is called.
	pub fn poll(&mut self, now: Instant) -> Option<Step> {
		if self.deadline().is_none_or(|due| due > now) {
			return None;
		}
		match std::mem::take(&mut self.stage) {
			Stage::PendingValidation { .. } => Some(Step::Validate),
			Stage::ErrorsPublished { diagnostics, .. } => Some(Step::PublishAll(diagnostics)),
			Stage::Idle => None,
		}
	}

	/// Stores a validation result and returns the errors to publish immediately.
	pub fn record(&mut self, now: Instant, diagnostics: Vec<Diagnostic>) -> Vec<Diagnostic> {
		let errors = diagnostics.iter().filter(|d| is_error(d)).cloned().collect();
		self.stage = Stage::ErrorsPublished {
			due: now + self.timing.warning_delay,
			diagnostics,
		};
		errors
	}
}
