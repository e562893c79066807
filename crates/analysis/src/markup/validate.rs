use lsp_types::Diagnostic;
use tracing::trace;

use super::scanner::{Event, Scanner};
use crate::diagnostic::{self, MARKUP_SOURCE};
use crate::{LineIndex, OffsetEncoding};

/// Checks tag balance and reports scanner syntax errors.
///
/// Every closing tag pops the innermost open tag; a name mismatch is reported over the
/// closing tag and the stack is not repaired. When two adjacent mismatches are mirror
/// images of each other (`<a><b></a></b>`), only the first is reported. Tags still open
/// at the end of input produce one warning at the end of the document.
#[must_use]
pub fn validate(text: &str, encoding: OffsetEncoding) -> Vec<Diagnostic> {
	let index = LineIndex::new(text, encoding);
	let mut diagnostics = Vec::new();
	let mut open: Vec<&str> = Vec::new();
	let mut crossed: Option<(&str, &str)> = None;

	for event in Scanner::new(text) {
		match event {
			Event::Open(tag) if !tag.self_closing => open.push(tag.name),
			Event::Open(_) => {}
			Event::Close(close) => {
				let range = index.range(close.span.start, close.span.end);
				match open.pop() {
					Some(expected) if expected == close.name => crossed = None,
					Some(expected) => {
						if crossed == Some((close.name, expected)) {
							trace!(tag = close.name, "suppressing mirrored mismatch");
							crossed = None;
							continue;
						}
						diagnostics.push(diagnostic::error(
							range,
							format!(
								"Mismatched closing tag: expected </{expected}>, found </{}>",
								close.name
							),
							MARKUP_SOURCE,
						));
						crossed = Some((expected, close.name));
					}
					None => diagnostics.push(diagnostic::error(
						range,
						format!("Unexpected closing tag </{}>: no element is open", close.name),
						MARKUP_SOURCE,
					)),
				}
			}
			Event::Error(error) => diagnostics.push(diagnostic::error(
				index.range(error.span.start, error.span.end),
				format!("XML syntax error: {}", error.kind),
				MARKUP_SOURCE,
			)),
		}
	}

	if !open.is_empty() {
		diagnostics.push(diagnostic::warning(
			index.range(text.len(), text.len()),
			format!("Unclosed tags: {}", open.join(", ")),
			MARKUP_SOURCE,
		));
	}
	diagnostics
}
