//! Cursor context classification for markup profiles.
//!
//! The classifier tests the text before the cursor against an ordered rule table and the
//! first matching rule decides the [`MarkupContext`]. Rule order is part of the contract:
//! a cursor inside `<doc format="` is a format value even though it is also inside an
//! attribute list.

use std::sync::LazyLock;

use lsp_types::{CompletionItem, CompletionItemKind, Documentation};
use regex::Regex;

use super::scanner::{Event, Scanner};
use crate::completion::{self, indent_lines};
use crate::line_index::floor_char_boundary;
use crate::vocabulary::{
	CHILD_TAGS, DESCRIPTOR_TYPES, DOC_ATTRIBUTES, DOC_CONTENT_TYPES, DOC_FORMATS, SCHEMA_LOCATION,
	SELF_CLOSING_TAGS, SEMANTIC_TERMS, TAG_ATTRIBUTES,
};
use crate::{Descriptor, LineIndex, OffsetEncoding};

macro_rules! pattern {
	($name:ident, $re:literal) => {
		static $name: LazyLock<Regex> = LazyLock::new(|| Regex::new($re).expect("valid pattern"));
	};
}

pattern!(DOC_FORMAT_VALUE, r#"<doc\s[^>]*\bformat=["'][^"']*$"#);
pattern!(DOC_CONTENT_TYPE_VALUE, r#"<doc\s[^>]*\bcontentType=["'][^"']*$"#);
pattern!(CLOSING_TAG, r"</[\w.:-]*$");
pattern!(DOC_OPEN, r"<doc(?:\s[^>]*)?$");
pattern!(TYPE_VALUE, r#"\stype=["'][^"']*$"#);
pattern!(HREF_VALUE, r#"\shref=["']([^"']*)$"#);
pattern!(RT_VALUE, r#"\srt=["']([^"']*)$"#);
pattern!(TAG_OPEN, r"<\s*[a-zA-Z]*$");
pattern!(ATTRIBUTE_START, r"\s\w*$");
pattern!(ID_VALUE, r#"<descriptor\s+(?:[^>]*\s)?id=["'][^"']*$"#);
pattern!(ROOT_OPEN, r"<alps[^>]*>");
pattern!(ATTRIBUTE_NAME, r"([\w:-]+)\s*=");

/// Where the cursor sits in a markup document.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum MarkupContext<'a> {
	/// Inside the `format` value of a `doc` tag.
	DocFormatValue,
	/// Inside the `contentType` value of a `doc` tag.
	DocContentTypeValue,
	/// After `</`; carries the innermost element still open before it.
	ClosingTag {
		/// Name of the element to close, if any is open.
		open: Option<&'a str>,
	},
	/// In the attribute list of a `doc` tag.
	DocAttribute {
		/// Attributes already written on the tag.
		present: Vec<&'a str>,
	},
	/// Inside a `type` value.
	TypeValue,
	/// Inside an `href` value that starts at byte `value_start`.
	HrefValue {
		/// Byte offset of the first character of the value.
		value_start: usize,
	},
	/// Inside an `rt` value that starts at byte `value_start`.
	RtValue {
		/// Byte offset of the first character of the value.
		value_start: usize,
	},
	/// After `<` where an element name is expected.
	TagOpen {
		/// Whether the `alps` root element is already open.
		inside_root: bool,
	},
	/// At a new attribute name inside a tag.
	AttributeName {
		/// Name of the tag being written.
		tag: &'a str,
		/// Attributes already written on the tag.
		present: Vec<&'a str>,
	},
	/// Inside the `id` value of a `descriptor` tag.
	IdValue,
}

struct Cursor<'a> {
	offset: usize,
	/// Document text before the cursor.
	before: &'a str,
	/// Current line up to the cursor.
	line: &'a str,
}

impl<'a> Cursor<'a> {
	fn new(text: &'a str, offset: usize) -> Self {
		let offset = floor_char_boundary(text, offset.min(text.len()));
		let before = &text[..offset];
		let line_start = before.rfind('\n').map_or(0, |i| i + 1);
		Self {
			offset,
			before,
			line: &before[line_start..],
		}
	}

	/// Returns the unterminated tag the cursor is in, starting at its `<`.
	fn open_tag(&self) -> Option<&'a str> {
		let lt = self.before.rfind('<')?;
		match self.before.rfind('>') {
			Some(gt) if gt > lt => None,
			_ => Some(&self.before[lt..]),
		}
	}
}

type Rule = for<'a> fn(&Cursor<'a>) -> Option<MarkupContext<'a>>;

const RULES: [Rule; 10] = [
	doc_format_value,
	doc_content_type_value,
	closing_tag,
	doc_attribute,
	type_value,
	href_value,
	rt_value,
	tag_open,
	attribute_name,
	id_value,
];

/// Classifies the cursor at byte `offset` of `text`.
///
/// Returns `None` when no rule matches.
#[must_use]
pub fn context(text: &str, offset: usize) -> Option<MarkupContext<'_>> {
	let cursor = Cursor::new(text, offset);
	RULES.iter().find_map(|rule| rule(&cursor))
}

/// Returns the completion items for the cursor at byte `offset` of `text`.
///
/// `descriptors` feeds `href` and `rt` reference completion. The result depends only on
/// the arguments.
#[must_use]
pub fn classify(
	text: &str,
	offset: usize,
	descriptors: &[Descriptor],
	encoding: OffsetEncoding,
) -> Vec<CompletionItem> {
	let cursor = Cursor::new(text, offset);
	let Some(context) = RULES.iter().find_map(|rule| rule(&cursor)) else {
		return Vec::new();
	};
	let index = LineIndex::new(text, encoding);
	items(context, &cursor, descriptors, &index)
}

fn doc_format_value<'a>(cursor: &Cursor<'a>) -> Option<MarkupContext<'a>> {
	DOC_FORMAT_VALUE
		.is_match(cursor.line)
		.then_some(MarkupContext::DocFormatValue)
}

fn doc_content_type_value<'a>(cursor: &Cursor<'a>) -> Option<MarkupContext<'a>> {
	DOC_CONTENT_TYPE_VALUE
		.is_match(cursor.line)
		.then_some(MarkupContext::DocContentTypeValue)
}

fn closing_tag<'a>(cursor: &Cursor<'a>) -> Option<MarkupContext<'a>> {
	let found = CLOSING_TAG.find(cursor.line)?;
	let tag_start = cursor.offset - found.as_str().len();
	Some(MarkupContext::ClosingTag {
		open: enclosing_open_tag(&cursor.before[..tag_start]),
	})
}

fn doc_attribute<'a>(cursor: &Cursor<'a>) -> Option<MarkupContext<'a>> {
	if !DOC_OPEN.is_match(cursor.line) {
		return None;
	}
	let tag_text = cursor.open_tag().unwrap_or(cursor.line);
	if in_quoted_value(tag_text) {
		return None;
	}
	Some(MarkupContext::DocAttribute {
		present: present_attributes(tag_text),
	})
}

fn type_value<'a>(cursor: &Cursor<'a>) -> Option<MarkupContext<'a>> {
	TYPE_VALUE
		.is_match(cursor.line)
		.then_some(MarkupContext::TypeValue)
}

fn href_value<'a>(cursor: &Cursor<'a>) -> Option<MarkupContext<'a>> {
	let value = HREF_VALUE.captures(cursor.line)?.get(1)?;
	Some(MarkupContext::HrefValue {
		value_start: cursor.offset - value.as_str().len(),
	})
}

fn rt_value<'a>(cursor: &Cursor<'a>) -> Option<MarkupContext<'a>> {
	let value = RT_VALUE.captures(cursor.line)?.get(1)?;
	Some(MarkupContext::RtValue {
		value_start: cursor.offset - value.as_str().len(),
	})
}

fn tag_open<'a>(cursor: &Cursor<'a>) -> Option<MarkupContext<'a>> {
	TAG_OPEN.is_match(cursor.line).then(|| MarkupContext::TagOpen {
		inside_root: ROOT_OPEN.is_match(cursor.before),
	})
}

fn attribute_name<'a>(cursor: &Cursor<'a>) -> Option<MarkupContext<'a>> {
	if !ATTRIBUTE_START.is_match(cursor.line) {
		return None;
	}
	let tag_text = cursor.open_tag()?;
	if in_quoted_value(tag_text) {
		return None;
	}
	let tag = tag_text[1..]
		.split(|c: char| c.is_whitespace())
		.next()
		.filter(|name| !name.is_empty())?;
	Some(MarkupContext::AttributeName {
		tag,
		present: present_attributes(tag_text),
	})
}

fn id_value<'a>(cursor: &Cursor<'a>) -> Option<MarkupContext<'a>> {
	ID_VALUE
		.is_match(cursor.line)
		.then_some(MarkupContext::IdValue)
}

/// Walks the tags before the cursor backwards to find the innermost unclosed element.
///
/// Closing tags raise the depth, opening tags lower it, and the first opening tag met at
/// depth zero is the answer. Self-closing tags are ignored.
fn enclosing_open_tag(text: &str) -> Option<&str> {
	let events: Vec<_> = Scanner::new(text).collect();
	let mut depth = 0usize;
	for event in events.iter().rev() {
		match event {
			Event::Close(_) => depth += 1,
			Event::Open(tag) if !tag.self_closing => {
				if depth == 0 {
					return Some(tag.name);
				}
				depth -= 1;
			}
			Event::Open(_) | Event::Error(_) => {}
		}
	}
	None
}

fn present_attributes(tag_text: &str) -> Vec<&str> {
	ATTRIBUTE_NAME
		.captures_iter(tag_text)
		.filter_map(|caps| caps.get(1).map(|m| m.as_str()))
		.collect()
}

fn in_quoted_value(tag_text: &str) -> bool {
	let mut quote = None;
	for c in tag_text.chars() {
		match (quote, c) {
			(None, '"' | '\'') => quote = Some(c),
			(Some(q), c) if c == q => quote = None,
			_ => {}
		}
	}
	quote.is_some()
}

fn items(
	context: MarkupContext<'_>,
	cursor: &Cursor<'_>,
	descriptors: &[Descriptor],
	index: &LineIndex<'_>,
) -> Vec<CompletionItem> {
	match context {
		MarkupContext::DocFormatValue => enum_members(&DOC_FORMATS, "format"),
		MarkupContext::DocContentTypeValue => enum_members(&DOC_CONTENT_TYPES, "contentType"),
		MarkupContext::ClosingTag { open } => open.map(close_item).into_iter().collect(),
		MarkupContext::DocAttribute { present } => attribute_items(&DOC_ATTRIBUTES, &present, "doc"),
		MarkupContext::TypeValue => enum_members(&DESCRIPTOR_TYPES, "type"),
		MarkupContext::HrefValue { value_start } => {
			let range = index.range(value_start, cursor.offset);
			descriptors
				.iter()
				.map(|d| {
					let doc = format!("Reference to {} descriptor with id {}", d.kind, d.id);
					completion::reference(d, doc, Some(range))
				})
				.collect()
		}
		MarkupContext::RtValue { value_start } => {
			let range = index.range(value_start, cursor.offset);
			descriptors
				.iter()
				.filter(|d| d.is_semantic())
				.map(|d| completion::reference(d, format!("Transition to {}", d.id), Some(range)))
				.collect()
		}
		MarkupContext::TagOpen { inside_root: false } => {
			vec![root_snippet(index.indentation(cursor.offset))]
		}
		MarkupContext::TagOpen { inside_root: true } => CHILD_TAGS.iter().map(|tag| child_tag(tag)).collect(),
		MarkupContext::AttributeName { tag, present } => attribute_items(&TAG_ATTRIBUTES, &present, tag),
		MarkupContext::IdValue => SEMANTIC_TERMS.iter().map(|term| completion::term(term)).collect(),
	}
}

fn enum_members(values: &[&str], enumeration: &str) -> Vec<CompletionItem> {
	values
		.iter()
		.map(|value| completion::enum_member(value, enumeration))
		.collect()
}

fn attribute_items(names: &[&str], present: &[&str], owner: &str) -> Vec<CompletionItem> {
	names
		.iter()
		.filter(|name| !present.contains(name))
		.map(|name| completion::property_snippet(name, format!("{name}=\"$1\""), owner))
		.collect()
}

fn close_item(name: &str) -> CompletionItem {
	CompletionItem {
		insert_text: Some(format!("{name}>")),
		documentation: Some(Documentation::String(format!("Closes the open <{name}> element."))),
		..completion::property(name, "closing tag")
	}
}

fn child_tag(tag: &str) -> CompletionItem {
	if SELF_CLOSING_TAGS.contains(&tag) {
		completion::snippet(
			tag,
			CompletionItemKind::PROPERTY,
			format!("{tag} $0/>"),
			&format!("Inserts a self-closing <{tag}/> element."),
		)
	} else {
		completion::snippet(
			tag,
			CompletionItemKind::PROPERTY,
			format!("{tag}>$0</{tag}>"),
			&format!("Inserts a <{tag}> element."),
		)
	}
}

fn root_snippet(indent: &str) -> CompletionItem {
	let body = format!(
		"?xml version=\"1.0\" encoding=\"UTF-8\"?>\n\
		 <alps xmlns:xsi=\"http://www.w3.org/2001/XMLSchema-instance\" \
		 xsi:noNamespaceSchemaLocation=\"{SCHEMA_LOCATION}\">\n\
		 \t$0\n\
		 </alps>"
	);
	completion::snippet(
		"alps",
		CompletionItemKind::CLASS,
		indent_lines(&body, indent),
		"Inserts the XML declaration and the alps root element.",
	)
}
