//! LSP position conversion on [`Rope`]s and application of content changes.
//!
//! Columns are counted in the negotiated [`OffsetEncoding`]. A column past the end of its line
//! clamps to the line end; a line past the end of the document is rejected.

use alps_analysis::OffsetEncoding;
use lsp_types::{Position, Range, TextDocumentContentChangeEvent};
use ropey::{Rope, RopeSlice};

use crate::{Error, Result};

/// Converts an LSP position to a char index.
///
/// Returns `None` when the line does not exist.
#[must_use]
pub fn lsp_position_to_char(text: &Rope, pos: Position, encoding: OffsetEncoding) -> Option<usize> {
	let line = pos.line as usize;
	if line >= text.len_lines() {
		return None;
	}
	let slice = text.line(line);
	let content = content_len(slice);
	let column = pos.character as usize;
	let chars = match encoding {
		OffsetEncoding::Utf8 => slice.byte_to_char(column.min(slice.char_to_byte(content))),
		OffsetEncoding::Utf16 => slice.utf16_cu_to_char(column.min(slice.char_to_utf16_cu(content))),
		OffsetEncoding::Utf32 => column.min(content),
	};
	Some(text.line_to_char(line) + chars)
}

/// Converts an LSP range to a `(start, end)` pair of char indices.
#[must_use]
pub fn lsp_range_to_char_range(text: &Rope, range: Range, encoding: OffsetEncoding) -> Option<(usize, usize)> {
	let start = lsp_position_to_char(text, range.start, encoding)?;
	let end = lsp_position_to_char(text, range.end, encoding)?;
	Some((start, end))
}

/// Applies one `didChange` content change: a ranged replacement, or a full replacement when
/// the change carries no range.
///
/// # Errors
///
/// Returns [`Error::Protocol`] when the range does not lie inside the document.
pub fn apply_change(text: &mut Rope, change: &TextDocumentContentChangeEvent, encoding: OffsetEncoding) -> Result<()> {
	let Some(range) = change.range else {
		*text = Rope::from_str(&change.text);
		return Ok(());
	};
	let (start, end) = lsp_range_to_char_range(text, range, encoding)
		.filter(|(start, end)| start <= end)
		.ok_or_else(|| Error::Protocol(format!("change range {range:?} is outside the document")))?;
	text.remove(start..end);
	text.insert(start, &change.text);
	Ok(())
}

/// Char length of a line without its terminator.
fn content_len(line: RopeSlice<'_>) -> usize {
	let mut len = line.len_chars();
	if len > 0 && line.char(len - 1) == '\n' {
		len -= 1;
		if len > 0 && line.char(len - 1) == '\r' {
			len -= 1;
		}
	}
	len
}
