//! Error types for descriptor extraction.

use quick_xml::events::attributes::AttrError;

/// Errors raised by the strict markup parse that precedes the tolerant fallback scan.
///
/// These never escape the public extraction functions; they select the fallback path.
#[derive(Debug, thiserror::Error)]
pub enum ExtractError {
	/// The XML reader rejected the document.
	#[error("XML parse failed: {0}")]
	Xml(#[from] quick_xml::Error),

	/// An attribute list was malformed.
	#[error("malformed attribute: {0}")]
	Attribute(#[from] AttrError),

	/// An attribute value held a malformed entity.
	#[error("malformed escape: {0}")]
	Escape(#[from] quick_xml::escape::EscapeError),

	/// The document ended while elements were still open.
	#[error("{count} element(s) left unclosed at end of input")]
	Unclosed {
		/// Number of elements still open.
		count: usize,
	},
}
