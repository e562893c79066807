//! The tag-based XML dialect.

mod context;
mod extract;
pub mod scanner;
mod validate;

pub use context::{MarkupContext, classify, context};
pub use extract::extract;
use lsp_types::{CompletionItem, Diagnostic};
pub use validate::validate;

use crate::{Analyzer, Descriptor, OffsetEncoding};

/// [`Analyzer`] for markup profiles.
#[derive(Debug, Clone, Copy, Default)]
pub struct MarkupAnalyzer;

impl Analyzer for MarkupAnalyzer {
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
