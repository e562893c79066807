//! Conversion between byte offsets and LSP positions.

use lsp_types::{Position, Range};

/// The unit LSP `character` offsets are counted in.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum OffsetEncoding {
	/// UTF-8 code units (bytes).
	Utf8,
	/// UTF-16 code units, the LSP default.
	#[default]
	Utf16,
	/// Unicode scalar values.
	Utf32,
}

impl OffsetEncoding {
	fn width(self, c: char) -> usize {
		match self {
			Self::Utf8 => c.len_utf8(),
			Self::Utf16 => c.len_utf16(),
			Self::Utf32 => 1,
		}
	}
}

/// Line-start table over a document snapshot.
///
/// Lines are split on `\n`; a preceding `\r` belongs to the line terminator.
#[derive(Debug, Clone)]
pub struct LineIndex<'a> {
	text: &'a str,
	line_starts: Vec<usize>,
	encoding: OffsetEncoding,
}

impl<'a> LineIndex<'a> {
	/// Builds the index for `text`.
	#[must_use]
	pub fn new(text: &'a str, encoding: OffsetEncoding) -> Self {
		let line_starts = std::iter::once(0)
			.chain(text.match_indices('\n').map(|(i, _)| i + 1))
			.collect();
		Self {
			text,
			line_starts,
			encoding,
		}
	}

	/// Returns the indexed text.
	#[must_use]
	pub fn text(&self) -> &'a str {
		self.text
	}

	/// Number of lines (a trailing newline opens a final empty line).
	#[must_use]
	pub fn line_count(&self) -> usize {
		self.line_starts.len()
	}

	/// Converts a byte offset to a position. Offsets past the end clamp to the end and
	/// offsets inside a multi-byte character snap back to its start.
	#[must_use]
	pub fn position(&self, offset: usize) -> Position {
		let offset = floor_char_boundary(self.text, offset.min(self.text.len()));
		let line = self.line_starts.partition_point(|&start| start <= offset) - 1;
		let start = self.line_starts[line];
		let character: usize = self.text[start..offset]
			.chars()
			.map(|c| self.encoding.width(c))
			.sum();
		Position::new(to_u32(line), to_u32(character))
	}

	/// Converts a byte span to a range.
	#[must_use]
	pub fn range(&self, start: usize, end: usize) -> Range {
		Range::new(self.position(start), self.position(end.max(start)))
	}

	/// Converts a position to a byte offset.
	///
	/// Returns `None` for lines past the end; columns past the end of a line clamp to the
	/// line's last character.
	#[must_use]
	pub fn offset(&self, position: Position) -> Option<usize> {
		let line = position.line as usize;
		let start = *self.line_starts.get(line)?;
		let content = line_content(&self.text[start..]);
		let mut remaining = position.character as usize;
		for (i, c) in content.char_indices() {
			let width = self.encoding.width(c);
			if remaining < width {
				return Some(start + i);
			}
			remaining -= width;
		}
		Some(start + content.len())
	}

	/// Returns the text of the line containing `offset`, up to `offset`.
	#[must_use]
	pub fn line_prefix(&self, offset: usize) -> &'a str {
		line_prefix(self.text, offset)
	}

	/// Returns the leading whitespace of the line containing `offset`.
	#[must_use]
	pub fn indentation(&self, offset: usize) -> &'a str {
		indentation(self.text, offset)
	}
}

/// Returns the text between the start of the line containing `offset` and `offset`.
pub(crate) fn line_prefix(text: &str, offset: usize) -> &str {
	let offset = floor_char_boundary(text, offset.min(text.len()));
	let start = text[..offset].rfind('\n').map_or(0, |i| i + 1);
	&text[start..offset]
}

/// Returns the leading whitespace of the line containing `offset`.
pub(crate) fn indentation(text: &str, offset: usize) -> &str {
	let offset = floor_char_boundary(text, offset.min(text.len()));
	let start = text[..offset].rfind('\n').map_or(0, |i| i + 1);
	let line = &text[start..];
	let end = line
		.find(|c: char| c != ' ' && c != '\t')
		.unwrap_or(line.len());
	&line[..end]
}

pub(crate) fn floor_char_boundary(text: &str, mut offset: usize) -> usize {
	while !text.is_char_boundary(offset) {
		offset -= 1;
	}
	offset
}

fn line_content(rest: &str) -> &str {
	let line = rest.split('\n').next().unwrap_or_default();
	line.strip_suffix('\r').unwrap_or(line)
}

fn to_u32(n: usize) -> u32 {
	u32::try_from(n).unwrap_or(u32::MAX)
}

#[cfg(test)]
mod tests {
	use super::*;

	#[test]
	fn positions_follow_lines() {
		let index = LineIndex::new("hello\nworld\n", OffsetEncoding::Utf16);
		assert_eq!(index.position(0), Position::new(0, 0));
		assert_eq!(index.position(3), Position::new(0, 3));
		assert_eq!(index.position(6), Position::new(1, 0));
		assert_eq!(index.position(8), Position::new(1, 2));
		assert_eq!(index.position(12), Position::new(2, 0));
		assert_eq!(index.position(99), Position::new(2, 0));
	}

	#[test]
	fn utf16_counts_surrogate_pairs() {
		let text = "a\u{1F600}b";
		let index = LineIndex::new(text, OffsetEncoding::Utf16);
		assert_eq!(index.position(5), Position::new(0, 3));
		assert_eq!(index.offset(Position::new(0, 3)), Some(5));

		let index = LineIndex::new(text, OffsetEncoding::Utf32);
		assert_eq!(index.position(5), Position::new(0, 2));
		assert_eq!(index.offset(Position::new(0, 2)), Some(5));

		let index = LineIndex::new(text, OffsetEncoding::Utf8);
		assert_eq!(index.position(5), Position::new(0, 5));
	}

	#[test]
	fn offset_clamps_columns_and_rejects_lines() {
		let index = LineIndex::new("hi\r\nthere", OffsetEncoding::Utf16);
		assert_eq!(index.offset(Position::new(0, 100)), Some(2));
		assert_eq!(index.offset(Position::new(1, 2)), Some(6));
		assert_eq!(index.offset(Position::new(5, 0)), None);
	}

	#[test]
	fn line_prefix_and_indentation() {
		let text = "<alps>\n\t  <descriptor id=\"a\"";
		let index = LineIndex::new(text, OffsetEncoding::Utf16);
		assert_eq!(index.line_prefix(text.len()), "\t  <descriptor id=\"a\"");
		assert_eq!(index.indentation(text.len()), "\t  ");
		assert_eq!(index.line_prefix(3), "<al");
	}
}
