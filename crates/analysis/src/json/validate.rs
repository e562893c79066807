use lsp_types::Diagnostic;

use super::parser::{ParseOptions, parse_errors};
use crate::diagnostic::{self, JSON_SOURCE};
use crate::{LineIndex, OffsetEncoding};

/// Reports every syntax error of an object-notation profile as an error diagnostic.
///
/// Trailing commas and comments are accepted. No warnings are produced.
#[must_use]
pub fn validate(text: &str, encoding: OffsetEncoding) -> Vec<Diagnostic> {
	let index = LineIndex::new(text, encoding);
	parse_errors(text, ParseOptions::default())
		.into_iter()
		.map(|error| {
			diagnostic::error(
				index.range(error.offset, error.offset + error.length),
				error.code.message(),
				JSON_SOURCE,
			)
		})
		.collect()
}

#[cfg(test)]
mod tests {
	use lsp_types::{DiagnosticSeverity, Position, Range};

	use super::*;

	#[test]
	fn well_formed_profile_is_clean() {
		let text = r#"{
	"alps": {
		"version": "1.0",
		"descriptor": [
			{"id": "a", "type": "safe"},
		]
	}
}"#;
		assert!(validate(text, OffsetEncoding::Utf16).is_empty());
	}

	#[test]
	fn errors_are_positioned_on_the_offending_token() {
		let text = "{\n  \"a\": 1\n  \"b\": 2\n}";
		let diagnostics = validate(text, OffsetEncoding::Utf16);
		assert_eq!(diagnostics.len(), 1);
		let diagnostic = &diagnostics[0];
		assert_eq!(diagnostic.message, "Comma expected");
		assert_eq!(diagnostic.severity, Some(DiagnosticSeverity::ERROR));
		assert_eq!(diagnostic.source.as_deref(), Some(JSON_SOURCE));
		assert_eq!(
			diagnostic.range,
			Range::new(Position::new(2, 2), Position::new(2, 5))
		);
	}
}
