//! State of one open document.

use alps_analysis::{Descriptor, DescriptorCache, Dialect, OffsetEncoding};
use lsp_types::{Diagnostic, TextDocumentContentChangeEvent, TextDocumentItem, Uri};
use ropey::Rope;
use tokio::time::Instant;
use tracing::debug;

use crate::pipeline::{Pipeline, Step, Timing};
use crate::{Result, panic, position};

/// An open document: its text, dialect, descriptor table and diagnostics pipeline.
#[derive(Debug, Clone)]
pub struct Document {
	uri: Uri,
	dialect: Option<Dialect>,
	version: i32,
	text: Rope,
	descriptors: DescriptorCache,
	pipeline: Pipeline,
}

impl Document {
	/// Creates the state for a newly opened document.
	///
	/// Documents without a dialect are tracked but never analyzed.
	#[must_use]
	pub fn new(item: TextDocumentItem, dialect: Option<Dialect>, timing: Timing) -> Self {
		Self {
			uri: item.uri,
			dialect,
			version: item.version,
			text: Rope::from_str(&item.text),
			descriptors: DescriptorCache::new(),
			pipeline: Pipeline::new(timing),
		}
	}

	/// The document URI.
	#[must_use]
	pub fn uri(&self) -> &Uri {
		&self.uri
	}

	/// The declared dialect.
	#[must_use]
	pub fn dialect(&self) -> Option<Dialect> {
		self.dialect
	}

	/// The client's version of the text.
	#[must_use]
	pub fn version(&self) -> i32 {
		self.version
	}

	/// A snapshot of the text.
	#[must_use]
	pub fn text(&self) -> String {
		self.text.to_string()
	}

	/// The descriptors reference completion draws from.
	#[must_use]
	pub fn descriptors(&self) -> &[Descriptor] {
		self.descriptors.current()
	}

	/// Applies a `didChange` batch in order and records the new version.
	///
	/// # Errors
	///
	/// Stops at the first change whose range lies outside the document. Earlier changes of
	/// the batch stay applied.
	pub fn apply_changes(
		&mut self,
		version: i32,
		changes: &[TextDocumentContentChangeEvent],
		encoding: OffsetEncoding,
	) -> Result<()> {
		self.version = version;
		changes
			.iter()
			.try_for_each(|change| position::apply_change(&mut self.text, change, encoding))
	}

	/// Re-extracts descriptors and restarts the validation debounce.
	pub fn refresh(&mut self, now: Instant) {
		let Some(dialect) = self.dialect else {
			return;
		};
		let text = self.text();
		let extracted = panic::or_else("extract", || alps_analysis::extract(&text, dialect), Vec::new);
		let count = self.descriptors.update(dialect, extracted).len();
		debug!(uri = %self.uri.as_str(), ?dialect, count, "descriptors updated");
		self.pipeline.schedule(now);
	}

	/// The next instant at which [`Document::poll`] has work.
	#[must_use]
	pub fn deadline(&self) -> Option<Instant> {
		self.pipeline.deadline()
	}

	/// Advances the diagnostics pipeline, returning a set to publish when one is due.
	pub fn poll(&mut self, now: Instant, encoding: OffsetEncoding) -> Option<Vec<Diagnostic>> {
		let dialect = self.dialect?;
		match self.pipeline.poll(now)? {
			Step::Validate => {
				let text = self.text();
				let diagnostics = panic::or_else(
					"validate",
					|| dialect.analyzer().validate(&text, encoding),
					Vec::new,
				);
				let errors = self.pipeline.record(now, diagnostics);
				debug!(uri = %self.uri.as_str(), version = self.version, errors = errors.len(), "publishing errors");
				Some(errors)
			}
			Step::PublishAll(diagnostics) => {
				debug!(uri = %self.uri.as_str(), version = self.version, total = diagnostics.len(), "publishing all diagnostics");
				Some(diagnostics)
			}
		}
	}
}
