//! Diagnostic construction shared by both validators.

use lsp_types::{Diagnostic, DiagnosticSeverity, Range};

/// Source tag of diagnostics produced by [`crate::markup::validate`].
pub const MARKUP_SOURCE: &str = "alps-xml";

/// Source tag of diagnostics produced by [`crate::json::validate`].
pub const JSON_SOURCE: &str = "alps-json";

/// Creates an error diagnostic.
#[must_use]
pub fn error(range: Range, message: impl Into<String>, source: &str) -> Diagnostic {
	build(DiagnosticSeverity::ERROR, range, message.into(), source)
}

/// Creates a warning diagnostic.
#[must_use]
pub fn warning(range: Range, message: impl Into<String>, source: &str) -> Diagnostic {
	build(DiagnosticSeverity::WARNING, range, message.into(), source)
}

/// Returns true for error-severity diagnostics.
#[must_use]
pub fn is_error(diagnostic: &Diagnostic) -> bool {
	diagnostic.severity == Some(DiagnosticSeverity::ERROR)
}

fn build(severity: DiagnosticSeverity, range: Range, message: String, source: &str) -> Diagnostic {
	Diagnostic {
		range,
		severity: Some(severity),
		source: Some(source.to_owned()),
		message,
		..Diagnostic::default()
	}
}
