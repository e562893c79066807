//! Structure-aware analysis for [ALPS] profiles.
//!
//! [ALPS]: https://alps.io
//!
//! ALPS profiles come in two interchangeable serializations, a tag-based XML form and an
//! object-notation JSON form. This crate implements the editor-facing analyses for both:
//!
//! * validation: [`markup::validate`] reports unbalanced tags and scanner-level syntax
//!   errors, [`json::validate`] reports tolerant-parse syntax errors.
//! * descriptor extraction: [`extract`] collects the declared `{id, type}` pairs that drive
//!   reference completion, degrading to an empty list instead of failing.
//! * context classification: [`markup::classify`] and [`json::classify`] decide where the
//!   cursor sits in the grammar and return the matching completion items.
//!
//! Everything here is synchronous and free of I/O. Offsets are byte offsets into the
//! document text; [`LineIndex`] converts them to LSP positions in the negotiated
//! [`OffsetEncoding`].
#![warn(missing_docs)]

pub mod completion;
mod descriptor;
pub mod diagnostic;
mod error;
pub mod json;
mod line_index;
pub mod markup;
pub mod vocabulary;

pub use descriptor::{Descriptor, DescriptorCache, DescriptorType};
pub use error::ExtractError;
pub use line_index::{LineIndex, OffsetEncoding};
/// Re-export of the [`lsp_types`] dependency of this crate.
pub use lsp_types;
use lsp_types::{CompletionItem, Diagnostic};

/// One of the two serializations of an ALPS profile.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Dialect {
	/// Tag-based XML markup (`*.alps.xml`).
	Markup,
	/// Object-notation JSON (`*.alps.json`).
	Object,
}

impl Dialect {
	/// Returns the analyzer implementing this dialect.
	#[must_use]
	pub fn analyzer(self) -> &'static dyn Analyzer {
		match self {
			Self::Markup => &markup::MarkupAnalyzer,
			Self::Object => &json::JsonAnalyzer,
		}
	}

	/// Returns a short, stable name for logs.
	#[must_use]
	pub const fn as_str(self) -> &'static str {
		match self {
			Self::Markup => "markup",
			Self::Object => "object",
		}
	}
}

/// The per-dialect analysis entry points.
///
/// Implementations never fail: malformed input degrades to diagnostics, an empty
/// descriptor list or an empty completion list.
pub trait Analyzer: Send + Sync {
	/// Validates the full document text.
	fn validate(&self, text: &str, encoding: OffsetEncoding) -> Vec<Diagnostic>;

	/// Extracts the declared descriptors, in document order.
	fn extract(&self, text: &str) -> Vec<Descriptor>;

	/// Classifies the cursor context at `offset` and returns the completion items for it.
	///
	/// `descriptors` is the reference table for `href`/`rt` completion.
	fn complete(
		&self,
		text: &str,
		offset: usize,
		descriptors: &[Descriptor],
		encoding: OffsetEncoding,
	) -> Vec<CompletionItem>;
}

/// Extracts the declared descriptors of `text` in the given dialect.
///
/// See [`markup::extract`] and [`json::extract`] for the per-dialect fallback policy.
#[must_use]
pub fn extract(text: &str, dialect: Dialect) -> Vec<Descriptor> {
	dialect.analyzer().extract(text)
}
