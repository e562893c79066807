//! The object-notation JSON dialect.
//!
//! Validation, descriptor extraction and completion all run on one tolerant,
//! error-recovering parser ([`parser`], [`tree`], [`location`]) so half-typed documents
//! still produce useful results.

mod context;
mod extract;
pub mod location;
pub mod parser;
pub mod scanner;
pub mod tree;
mod validate;

pub use context::{JsonContext, classify, context};
pub use extract::extract;
use lsp_types::{CompletionItem, Diagnostic};
pub use validate::validate;

use crate::{Analyzer, Descriptor, OffsetEncoding};

/// [`Analyzer`] for object-notation profiles.
#[derive(Debug, Clone, Copy, Default)]
pub struct JsonAnalyzer;

impl Analyzer for JsonAnalyzer {
	fn validate(&self, text: &str, encoding: OffsetEncoding) -> Vec<Diagnostic> {
		validate(text, encoding)
	}

	fn extract(&self, text: &str) -> Vec<Descriptor> {
		extract(text)
	}

	fn complete(
		&self,
		text: &str,
		offset: usize,
		descriptors: &[Descriptor],
		encoding: OffsetEncoding,
	) -> Vec<CompletionItem> {
		classify(text, offset, descriptors, encoding)
	}
}
