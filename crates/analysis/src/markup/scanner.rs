//! Tolerant streaming scanner for XML markup.
//!
//! The scanner reports opening and closing tags in document order and turns every
//! low-level syntax problem into an [`Event::Error`] before resuming, so a single
//! malformed tag never hides the rest of the document. It does not track nesting; that is
//! left to consumers such as the tag-balance validator.

use std::borrow::Cow;
use std::collections::VecDeque;
use std::ops::Range;

/// A scanner event.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Event<'a> {
	/// An opening or self-closing tag.
	Open(Tag<'a>),
	/// A closing tag.
	Close(CloseTag<'a>),
	/// A syntax error; scanning continues after it.
	Error(SyntaxError),
}

/// An opening tag.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Tag<'a> {
	/// Element name.
	pub name: &'a str,
	/// Attributes in source order.
	pub attributes: Vec<Attribute<'a>>,
	/// True for `<name/>`.
	pub self_closing: bool,
	/// Byte span from `<` to `>` inclusive.
	pub span: Range<usize>,
}

impl<'a> Tag<'a> {
	/// Returns the decoded value of the attribute `name`, if present.
	#[must_use]
	pub fn attribute(&self, name: &str) -> Option<Cow<'a, str>> {
		self.attributes
			.iter()
			.find(|attr| attr.name == name)
			.map(Attribute::value)
	}
}

/// An attribute of an opening tag.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Attribute<'a> {
	/// Attribute name.
	pub name: &'a str,
	/// Raw value between the quotes.
	pub raw_value: &'a str,
	/// Byte span of the attribute name.
	pub span: Range<usize>,
}

impl<'a> Attribute<'a> {
	/// Returns the value with predefined and numeric entities decoded.
	#[must_use]
	pub fn value(&self) -> Cow<'a, str> {
		decode_entities(self.raw_value)
	}
}

/// A closing tag.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CloseTag<'a> {
	/// Element name.
	pub name: &'a str,
	/// Byte span from `<` to `>` inclusive.
	pub span: Range<usize>,
}

/// A syntax error with the span of the offending text.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SyntaxError {
	/// What went wrong.
	pub kind: SyntaxErrorKind,
	/// Byte span of the offending token.
	pub span: Range<usize>,
}

/// Kinds of markup syntax errors.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum SyntaxErrorKind {
	/// A `<` that starts no tag.
	#[error("unencoded '<'")]
	UnencodedLessThan,
	/// `</` not followed by a name.
	#[error("closing tag without a name")]
	EmptyClosingTag,
	/// Trailing garbage inside a closing tag.
	#[error("invalid characters in closing tag </{0}>")]
	InvalidClosingTag(String),
	/// A tag left open at a `<` or at the end of input.
	#[error("unterminated tag <{0}>")]
	UnterminatedTag(String),
	/// A character that cannot appear inside a tag.
	#[error("invalid character {0:?} in tag")]
	InvalidTagCharacter(char),
	/// An attribute name not followed by `=`.
	#[error("attribute without value: {0}")]
	AttributeWithoutValue(String),
	/// An attribute value not enclosed in quotes.
	#[error("unquoted attribute value for {0}")]
	UnquotedAttributeValue(String),
	/// An attribute value whose closing quote is missing.
	#[error("unterminated value for attribute {0}")]
	UnterminatedAttributeValue(String),
	/// Two attributes not separated by whitespace.
	#[error("no whitespace between attributes")]
	MissingAttributeWhitespace,
	/// The same attribute twice on one tag.
	#[error("duplicate attribute: {0}")]
	DuplicateAttribute(String),
	/// An `&` that starts no known entity.
	#[error("invalid character entity {0}")]
	InvalidEntity(String),
	/// A comment missing its `-->`.
	#[error("unterminated comment")]
	UnterminatedComment,
	/// A CDATA section missing its `]]>`.
	#[error("unterminated CDATA section")]
	UnterminatedCdata,
	/// A `<!...` declaration missing its `>`.
	#[error("unterminated declaration")]
	UnterminatedDeclaration,
	/// A processing instruction missing its `?>`.
	#[error("unterminated processing instruction")]
	UnterminatedProcessingInstruction,
}

/// Streaming markup scanner; iterate it to receive [`Event`]s.
#[derive(Debug)]
pub struct Scanner<'a> {
	text: &'a str,
	pos: usize,
	queue: VecDeque<Event<'a>>,
	/// General entities declared in a DOCTYPE internal subset.
	declared: Vec<&'a str>,
}

impl<'a> Scanner<'a> {
	/// Creates a scanner over `text`.
	#[must_use]
	pub fn new(text: &'a str) -> Self {
		Self {
			text,
			pos: 0,
			queue: VecDeque::new(),
			declared: Vec::new(),
		}
	}

	fn bytes(&self) -> &'a [u8] {
		self.text.as_bytes()
	}

	fn error(&mut self, kind: SyntaxErrorKind, span: Range<usize>) {
		self.queue.push_back(Event::Error(SyntaxError { kind, span }));
	}

	/// Scans from `self.pos` up to and including the next markup construct.
	fn step(&mut self) {
		let text = self.text;
		let start = self.pos;
		let Some(lt) = text[start..].find('<').map(|i| start + i) else {
			self.check_entities(start, text.len());
			self.pos = text.len();
			return;
		};
		self.check_entities(start, lt);

		let rest = &text[lt..];
		if rest.starts_with("<!--") {
			self.skip_past(lt, "-->", lt + 4, SyntaxErrorKind::UnterminatedComment);
		} else if rest.starts_with("<![CDATA[") {
			self.skip_past(lt, "]]>", lt + 9, SyntaxErrorKind::UnterminatedCdata);
		} else if rest.starts_with("<!") {
			self.scan_declaration(lt);
		} else if rest.starts_with("<?") {
			self.skip_past(
				lt,
				"?>",
				lt + 2,
				SyntaxErrorKind::UnterminatedProcessingInstruction,
			);
		} else if rest.starts_with("</") {
			self.scan_close(lt);
		} else if rest[1..].chars().next().is_some_and(is_name_start) {
			self.scan_open(lt);
		} else {
			self.error(SyntaxErrorKind::UnencodedLessThan, lt..lt + 1);
			self.pos = lt + 1;
		}
	}

	fn skip_past(&mut self, start: usize, terminator: &str, from: usize, kind: SyntaxErrorKind) {
		match self.text[from..].find(terminator) {
			Some(i) => self.pos = from + i + terminator.len(),
			None => {
				self.error(kind, start..self.text.len());
				self.pos = self.text.len();
			}
		}
	}

	/// Skips a `<!...>` declaration, including a bracketed internal subset.
	fn scan_declaration(&mut self, lt: usize) {
		let text = self.text;
		let mut depth = 0usize;
		let mut quote = None;
		let mut end = None;
		for (i, b) in text.bytes().enumerate().skip(lt + 2) {
			match (quote, b) {
				(Some(q), b) if b == q => quote = None,
				(Some(_), _) => {}
				(None, b'"' | b'\'') => quote = Some(b),
				(None, b'[') => depth += 1,
				(None, b']') => depth = depth.saturating_sub(1),
				(None, b'>') if depth == 0 => {
					end = Some(i);
					break;
				}
				_ => {}
			}
		}
		let Some(end) = end else {
			self.error(SyntaxErrorKind::UnterminatedDeclaration, lt..text.len());
			self.pos = text.len();
			return;
		};
		self.pos = end + 1;

		if let Some(open) = text[lt..end].find('[') {
			let subset = &text[lt + open..end];
			let mut rest = subset;
			while let Some(i) = rest.find("<!ENTITY") {
				rest = rest[i + 8..].trim_start();
				if rest.starts_with('%') {
					continue;
				}
				let len = rest.find(|c: char| !is_name_char(c)).unwrap_or(rest.len());
				if len > 0 {
					self.declared.push(&rest[..len]);
				}
			}
		}
	}

	fn scan_close(&mut self, lt: usize) {
		let name_start = lt + 2;
		let name_end = self.name_end(name_start);
		if name_end == name_start {
			self.error(SyntaxErrorKind::EmptyClosingTag, lt..name_start);
			self.pos = name_start;
			return;
		}
		let name = &self.text[name_start..name_end];
		let p = self.skip_whitespace(name_end);

		match self.bytes().get(p) {
			Some(b'>') => {
				self.queue.push_back(Event::Close(CloseTag {
					name,
					span: lt..p + 1,
				}));
				self.pos = p + 1;
			}
			None => {
				self.error(SyntaxErrorKind::UnterminatedTag(name.to_owned()), lt..p);
				self.pos = p;
			}
			Some(_) => {
				let gt = self.text[p..].find(['<', '>']).map(|i| p + i);
				match gt {
					Some(end) if self.bytes()[end] == b'>' => {
						self.error(SyntaxErrorKind::InvalidClosingTag(name.to_owned()), p..end);
						self.queue.push_back(Event::Close(CloseTag {
							name,
							span: lt..end + 1,
						}));
						self.pos = end + 1;
					}
					_ => {
						self.error(SyntaxErrorKind::UnterminatedTag(name.to_owned()), lt..p);
						self.pos = p;
					}
				}
			}
		}
	}

	fn scan_open(&mut self, lt: usize) {
		let text = self.text;
		let name_end = self.name_end(lt + 1);
		let name = &text[lt + 1..name_end];
		let mut attributes: Vec<Attribute<'a>> = Vec::new();
		let mut p = name_end;

		loop {
			let after_ws = self.skip_whitespace(p);
			let separated = after_ws > p;
			p = after_ws;

			let Some(c) = text[p..].chars().next() else {
				self.error(SyntaxErrorKind::UnterminatedTag(name.to_owned()), lt..p);
				self.pos = p;
				return;
			};

			match c {
				'>' => {
					self.finish_open(name, attributes, false, lt..p + 1);
					return;
				}
				'/' if text[p + 1..].starts_with('>') => {
					self.finish_open(name, attributes, true, lt..p + 2);
					return;
				}
				'<' => {
					self.error(SyntaxErrorKind::UnterminatedTag(name.to_owned()), lt..p);
					self.pos = p;
					return;
				}
				c if is_name_start(c) => {
					if !separated {
						self.error(SyntaxErrorKind::MissingAttributeWhitespace, p..p + c.len_utf8());
					}
					match self.scan_attribute(p) {
						AttributeScan::Parsed(attr, next) => {
							if attributes.iter().any(|a| a.name == attr.name) {
								self.error(
									SyntaxErrorKind::DuplicateAttribute(attr.name.to_owned()),
									attr.span.clone(),
								);
							} else {
								attributes.push(attr);
							}
							p = next;
						}
						AttributeScan::Skipped(next) => p = next,
						AttributeScan::Abandoned(next) => {
							self.pos = next;
							return;
						}
					}
				}
				c => {
					self.error(SyntaxErrorKind::InvalidTagCharacter(c), p..p + c.len_utf8());
					p += c.len_utf8();
				}
			}
		}
	}

	fn finish_open(&mut self, name: &'a str, attributes: Vec<Attribute<'a>>, self_closing: bool, span: Range<usize>) {
		self.pos = span.end;
		self.queue.push_back(Event::Open(Tag {
			name,
			attributes,
			self_closing,
			span,
		}));
	}

	fn scan_attribute(&mut self, start: usize) -> AttributeScan<'a> {
		let text = self.text;
		let name_end = self.name_end(start);
		let name = &text[start..name_end];
		let span = start..name_end;

		let p = self.skip_whitespace(name_end);
		if self.bytes().get(p) != Some(&b'=') {
			self.error(SyntaxErrorKind::AttributeWithoutValue(name.to_owned()), span);
			return AttributeScan::Skipped(name_end);
		}
		let p = self.skip_whitespace(p + 1);

		match self.bytes().get(p) {
			Some(&quote @ (b'"' | b'\'')) => {
				let value_start = p + 1;
				let end = text[value_start..]
					.find([quote as char, '<'])
					.map(|i| value_start + i);
				match end {
					Some(end) if self.bytes()[end] == quote => {
						self.check_entities(value_start, end);
						AttributeScan::Parsed(
							Attribute {
								name,
								raw_value: &text[value_start..end],
								span,
							},
							end + 1,
						)
					}
					Some(lt) => {
						self.error(
							SyntaxErrorKind::UnterminatedAttributeValue(name.to_owned()),
							start..lt,
						);
						AttributeScan::Abandoned(lt)
					}
					None => {
						self.error(
							SyntaxErrorKind::UnterminatedAttributeValue(name.to_owned()),
							start..text.len(),
						);
						AttributeScan::Abandoned(text.len())
					}
				}
			}
			Some(_) => {
				let end = text[p..]
					.find(|c: char| c.is_ascii_whitespace() || c == '>' || c == '<' || c == '/')
					.map_or(text.len(), |i| p + i);
				self.error(
					SyntaxErrorKind::UnquotedAttributeValue(name.to_owned()),
					p..end.max(p + 1).min(text.len()),
				);
				AttributeScan::Parsed(
					Attribute {
						name,
						raw_value: &text[p..end],
						span,
					},
					end,
				)
			}
			None => AttributeScan::Skipped(p),
		}
	}

	/// Reports `&` sequences in `start..end` that are not predefined or numeric entities.
	fn check_entities(&mut self, start: usize, end: usize) {
		let text = self.text;
		let mut from = start;
		while let Some(i) = text[from..end].find('&') {
			let amp = from + i;
			let tail = &text[amp + 1..end];
			match tail.find(';') {
				Some(len) if is_entity(&tail[..len]) || self.declared.contains(&&tail[..len]) => {
					from = amp + 1 + len + 1;
				}
				Some(len) if tail[..len].chars().all(is_name_char) && len > 0 => {
					let entity_end = amp + 1 + len + 1;
					self.error(
						SyntaxErrorKind::InvalidEntity(text[amp..entity_end].to_owned()),
						amp..entity_end,
					);
					from = entity_end;
				}
				_ => {
					self.error(SyntaxErrorKind::InvalidEntity("&".to_owned()), amp..amp + 1);
					from = amp + 1;
				}
			}
		}
	}

	fn name_end(&self, start: usize) -> usize {
		let rest = &self.text[start..];
		let mut chars = rest.char_indices();
		match chars.next() {
			Some((_, c)) if is_name_start(c) => {}
			_ => return start,
		}
		chars
			.find(|&(_, c)| !is_name_char(c))
			.map_or(self.text.len(), |(i, _)| start + i)
	}

	fn skip_whitespace(&self, start: usize) -> usize {
		let rest = &self.bytes()[start..];
		start
			+ rest
				.iter()
				.position(|b| !b.is_ascii_whitespace())
				.unwrap_or(rest.len())
	}
}

enum AttributeScan<'a> {
	Parsed(Attribute<'a>, usize),
	Skipped(usize),
	Abandoned(usize),
}

impl<'a> Iterator for Scanner<'a> {
	type Item = Event<'a>;

	fn next(&mut self) -> Option<Self::Item> {
		loop {
			if let Some(event) = self.queue.pop_front() {
				return Some(event);
			}
			if self.pos >= self.text.len() {
				return None;
			}
			self.step();
		}
	}
}

/// Decodes the five predefined entities and numeric character references.
///
/// Unknown entities are kept verbatim.
#[must_use]
pub fn decode_entities(raw: &str) -> Cow<'_, str> {
	if !raw.contains('&') {
		return Cow::Borrowed(raw);
	}
	let mut out = String::with_capacity(raw.len());
	let mut rest = raw;
	while let Some(amp) = rest.find('&') {
		out.push_str(&rest[..amp]);
		let tail = &rest[amp + 1..];
		let decoded = tail
			.find(';')
			.and_then(|len| decode_entity(&tail[..len]).map(|c| (c, len)));
		match decoded {
			Some((c, len)) => {
				out.push(c);
				rest = &tail[len + 1..];
			}
			None => {
				out.push('&');
				rest = tail;
			}
		}
	}
	out.push_str(rest);
	Cow::Owned(out)
}

fn decode_entity(entity: &str) -> Option<char> {
	match entity {
		"amp" => Some('&'),
		"lt" => Some('<'),
		"gt" => Some('>'),
		"quot" => Some('"'),
		"apos" => Some('\''),
		_ => {
			let code = if let Some(hex) = entity.strip_prefix("#x") {
				u32::from_str_radix(hex, 16).ok()?
			} else {
				entity.strip_prefix('#')?.parse().ok()?
			};
			char::from_u32(code)
		}
	}
}

fn is_entity(entity: &str) -> bool {
	decode_entity(entity).is_some()
}

pub(crate) fn is_name_start(c: char) -> bool {
	c.is_alphabetic() || c == '_' || c == ':'
}

pub(crate) fn is_name_char(c: char) -> bool {
	is_name_start(c) || c.is_numeric() || c == '-' || c == '.'
}
