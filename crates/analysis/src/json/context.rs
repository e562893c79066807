//! Cursor context classification for object-notation profiles.
//!
//! Context comes from the structural path at the cursor, computed by the tolerant parser
//! so half-typed documents still classify. Rules are tried in order and the first match
//! wins.

use std::ops::Range;
use std::sync::LazyLock;

use lsp_types::{CompletionItem, CompletionItemKind};
use regex::Regex;

use super::location::{self, Location, Segment};
use super::scanner::{ScanError, Scanner};
use super::tree::{NodeKind, Tree};
use crate::completion::{self, indent_lines};
use crate::line_index::{floor_char_boundary, indentation};
use crate::vocabulary::{
	ALPS_MEMBERS, DESCRIPTOR_MEMBERS, DESCRIPTOR_TYPES, DOC_CONTENT_TYPES, DOC_FORMATS, DOC_MEMBERS,
	ROOT_MEMBERS, SEMANTIC_TERMS,
};
use crate::{Descriptor, LineIndex, OffsetEncoding};

static OBJECT_START: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"\{\s*$").expect("valid pattern"));
static ELEMENT_SLOT: LazyLock<Regex> =
	LazyLock::new(|| Regex::new(r"(?:\}\s*,|(\[))\s*$").expect("valid pattern"));
static AFTER_COLON: LazyLock<Regex> = LazyLock::new(|| Regex::new(r":\s*$").expect("valid pattern"));

/// Members whose values have completions of their own.
const VALUE_MEMBERS: [&str; 6] = ["id", "href", "type", "rt", "format", "contentType"];

/// Where the cursor sits in an object-notation document.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum JsonContext {
	/// Right after `{`.
	ObjectStart {
		/// Path of the object being filled.
		container: Vec<Segment>,
	},
	/// Inside a string value.
	StringValue {
		/// Member the value belongs to.
		key: String,
		/// Member owning that member's object, if any.
		parent_key: Option<String>,
		/// Byte span of the string content.
		content: Range<usize>,
	},
	/// Where a new element of a `descriptor` array goes.
	NewDescriptor {
		/// Text inserted before the element.
		leading: String,
		/// Indentation of the element.
		indent: String,
	},
	/// Right after `"descriptor":`.
	DescriptorArray,
	/// At a member name position.
	PropertyKey {
		/// Path of the object being filled.
		container: Vec<Segment>,
		/// Span of the key string already typed, replaced on insertion.
		replace: Option<Range<usize>>,
	},
}

struct Cursor<'a> {
	text: &'a str,
	offset: usize,
	before: &'a str,
	location: Location,
	tree: Tree,
}

impl<'a> Cursor<'a> {
	fn new(text: &'a str, offset: usize) -> Self {
		let offset = floor_char_boundary(text, offset.min(text.len()));
		Self {
			text,
			offset,
			before: &text[..offset],
			location: location::location(text, offset),
			tree: Tree::parse(text),
		}
	}

	/// Whether the cursor sits between the quotes of a key or value string.
	fn in_string(&self) -> bool {
		self.tree.node_at_offset(self.offset, true).is_some_and(|id| {
			let node = self.tree.node(id);
			node.kind == NodeKind::String
				&& self.offset > node.offset
				&& (self.offset < node.end() || !node.is_terminated())
		})
	}

	fn line_prefix(&self) -> &'a str {
		let start = self.before.rfind('\n').map_or(0, |i| i + 1);
		&self.before[start..]
	}
}

type Rule = fn(&Cursor<'_>) -> Option<JsonContext>;

const RULES: [Rule; 5] = [
	object_start,
	string_value,
	new_descriptor,
	descriptor_array,
	property_key,
];

/// Classifies the cursor at byte `offset` of `text`.
#[must_use]
pub fn context(text: &str, offset: usize) -> Option<JsonContext> {
	let cursor = Cursor::new(text, offset);
	RULES.iter().find_map(|rule| rule(&cursor))
}

/// Returns the completion items for the cursor at byte `offset` of `text`.
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

fn object_start(cursor: &Cursor<'_>) -> Option<JsonContext> {
	if cursor.in_string() {
		return None;
	}
	OBJECT_START
		.is_match(cursor.before)
		.then(|| JsonContext::ObjectStart {
			container: cursor.location.container().to_vec(),
		})
}

fn string_value(cursor: &Cursor<'_>) -> Option<JsonContext> {
	let id = cursor.tree.node_at_offset(cursor.offset, true)?;
	let node = cursor.tree.node(id);
	if node.kind != NodeKind::String || cursor.tree.is_property_key(id) {
		return None;
	}
	let terminated = node.is_terminated();
	let inside = cursor.offset > node.offset && (cursor.offset < node.end() || !terminated);
	if !inside {
		return None;
	}

	let path = cursor.tree.path(id);
	let mut keys = path.iter().rev();
	let key = keys.next()?.as_key()?.to_owned();
	let parent_key = keys.next().and_then(Segment::as_key).map(str::to_owned);
	let content_end = if terminated {
		node.end() - 1
	} else {
		node.end()
	};
	Some(JsonContext::StringValue {
		key,
		parent_key,
		content: node.offset + 1..content_end.max(node.offset + 1),
	})
}

fn new_descriptor(cursor: &Cursor<'_>) -> Option<JsonContext> {
	let location = &cursor.location;
	let in_descriptor_array = matches!(
		location.path.as_slice(),
		[.., Segment::Key(key), Segment::Index(_)] if key == "descriptor"
	);
	if !in_descriptor_array || location.at_property_key || location.previous.is_some() {
		return None;
	}
	let slot = ELEMENT_SLOT.captures(cursor.before)?;

	let line_indent = indentation(cursor.text, cursor.offset);
	if cursor.line_prefix().trim().is_empty() {
		return Some(JsonContext::NewDescriptor {
			leading: String::new(),
			indent: line_indent.to_owned(),
		});
	}
	let indent = if slot.get(1).is_some() {
		format!("{line_indent}\t")
	} else {
		line_indent.to_owned()
	};
	Some(JsonContext::NewDescriptor {
		leading: format!("\n{indent}"),
		indent,
	})
}

fn descriptor_array(cursor: &Cursor<'_>) -> Option<JsonContext> {
	let location = &cursor.location;
	(location.last_key() == Some("descriptor")
		&& !location.at_property_key
		&& AFTER_COLON.is_match(cursor.before))
	.then_some(JsonContext::DescriptorArray)
}

fn property_key(cursor: &Cursor<'_>) -> Option<JsonContext> {
	let location = &cursor.location;
	if !location.at_property_key {
		return None;
	}
	let replace = location
		.previous
		.as_ref()
		.filter(|key| {
			key.kind == NodeKind::Property
				&& key.offset < cursor.offset
				&& cursor.offset <= key.offset + key.length
		})
		.map(|key| {
			let mut scanner = Scanner::new(&cursor.text[key.offset..]);
			scanner.scan();
			if scanner.token_error() == ScanError::UnexpectedEndOfString {
				key.offset..cursor.offset
			} else {
				key.offset..key.offset + key.length
			}
		});
	Some(JsonContext::PropertyKey {
		container: location.container().to_vec(),
		replace,
	})
}

fn items(
	context: JsonContext,
	cursor: &Cursor<'_>,
	descriptors: &[Descriptor],
	index: &LineIndex<'_>,
) -> Vec<CompletionItem> {
	match context {
		JsonContext::ObjectStart { container } => member_items(&container, None, cursor, index),
		JsonContext::PropertyKey { container, replace } => member_items(&container, replace, cursor, index),
		JsonContext::StringValue {
			key,
			parent_key,
			content,
		} => value_items(&key, parent_key.as_deref(), content, descriptors, index),
		JsonContext::NewDescriptor { leading, indent } => {
			let body = format!("{leading}{}", indent_lines("{\n\t$0\n}", &indent));
			vec![completion::chained(completion::snippet(
				"descriptor",
				CompletionItemKind::SNIPPET,
				body,
				"Adds a descriptor object to the array.",
			))]
		}
		JsonContext::DescriptorArray => {
			let indent = index.indentation(cursor.offset);
			vec![completion::chained(completion::snippet(
				"descriptor array",
				CompletionItemKind::SNIPPET,
				indent_lines("[\n\t{\n\t\t$0\n\t}\n]", indent),
				"Starts a descriptor array with one descriptor.",
			))]
		}
	}
}

fn members_of(container: &[Segment]) -> Option<(&'static [&'static str], &'static str)> {
	match container {
		[] => Some((&ROOT_MEMBERS, "root")),
		[Segment::Key(key)] if key == "alps" => Some((&ALPS_MEMBERS, "alps")),
		[.., Segment::Key(key), Segment::Index(_)] if key == "descriptor" => {
			Some((&DESCRIPTOR_MEMBERS, "descriptor"))
		}
		[.., Segment::Key(key)] if key == "doc" => Some((&DOC_MEMBERS, "doc")),
		_ => None,
	}
}

fn member_snippet(name: &str) -> String {
	match name {
		"alps" | "doc" => format!("\"{name}\": {{\n\t$0\n}}"),
		"descriptor" => format!("\"{name}\": [\n\t{{\n\t\t$0\n\t}}\n]"),
		_ => format!("\"{name}\": \"$1\""),
	}
}

fn member_items(
	container: &[Segment],
	replace: Option<Range<usize>>,
	cursor: &Cursor<'_>,
	index: &LineIndex<'_>,
) -> Vec<CompletionItem> {
	let Some((members, owner)) = members_of(container) else {
		return Vec::new();
	};
	let indent = index.indentation(cursor.offset);
	members
		.iter()
		.map(|name| {
			let item = completion::property_snippet(name, indent_lines(&member_snippet(name), indent), owner);
			let item = match &replace {
				Some(span) => completion::with_edit(item, index.range(span.start, span.end)),
				None => item,
			};
			if VALUE_MEMBERS.contains(name) {
				completion::chained(item)
			} else {
				item
			}
		})
		.collect()
}

fn value_items(
	key: &str,
	parent_key: Option<&str>,
	content: Range<usize>,
	descriptors: &[Descriptor],
	index: &LineIndex<'_>,
) -> Vec<CompletionItem> {
	let range = index.range(content.start, content.end);
	let enumerated = |values: &[&str], enumeration: &str| -> Vec<CompletionItem> {
		values
			.iter()
			.map(|value| completion::with_edit(completion::enum_member(value, enumeration), range))
			.collect()
	};

	match (key, parent_key) {
		("type", _) => enumerated(&DESCRIPTOR_TYPES, "type"),
		("format", Some("doc")) => enumerated(&DOC_FORMATS, "format"),
		("contentType", Some("doc")) => enumerated(&DOC_CONTENT_TYPES, "contentType"),
		("href", _) => descriptors
			.iter()
			.map(|d| {
				let doc = format!("Reference to {} descriptor with id {}", d.kind, d.id);
				completion::reference(d, doc, Some(range))
			})
			.collect(),
		("rt", _) => descriptors
			.iter()
			.map(|d| completion::reference(d, format!("Transition to {}", d.id), Some(range)))
			.collect(),
		("id", _) => SEMANTIC_TERMS
			.iter()
			.map(|term| completion::with_edit(completion::term(term), range))
			.collect(),
		_ => Vec::new(),
	}
}

#[cfg(test)]
mod tests {
	use lsp_types::CompletionTextEdit;
	use pretty_assertions::assert_eq;

	use super::*;

	fn split(text: &str) -> (String, usize) {
		let offset = text.find('|').unwrap_or(text.len());
		(text.replace('|', ""), offset)
	}

	fn ctx(text: &str) -> Option<JsonContext> {
		let (text, offset) = split(text);
		context(&text, offset)
	}

	fn labels(text: &str, descriptors: &[Descriptor]) -> Vec<String> {
		let (text, offset) = split(text);
		classify(&text, offset, descriptors, OffsetEncoding::Utf16)
			.into_iter()
			.map(|item| item.label)
			.collect()
	}

	fn key(name: &str) -> Segment {
		Segment::Key(name.to_owned())
	}

	#[test]
	fn object_start_members_follow_path() {
		assert_eq!(labels("{|", &[]), ["alps"]);
		assert_eq!(labels(r#"{"alps": {|}}"#, &[]), ["version", "doc", "descriptor"]);
		assert_eq!(labels(r#"{"alps": {"descriptor": [{|}]}}"#, &[]), DESCRIPTOR_MEMBERS);
		assert_eq!(
			labels(r#"{"alps": {"doc": {|}}}"#, &[]),
			["value", "format", "href", "contentType"]
		);
	}

	#[test]
	fn value_strings_complete_by_member() {
		assert_eq!(
			labels(r#"{"alps": {"descriptor": [{"type": "|"}]}}"#, &[]),
			DESCRIPTOR_TYPES
		);
		assert_eq!(labels(r#"{"alps": {"doc": {"format": "m|"}}}"#, &[]), DOC_FORMATS);
		assert!(labels(r#"{"alps": {"version": "|"}}"#, &[]).is_empty());
	}

	#[test]
	fn references_replace_string_content() {
		let descriptors = [Descriptor::new("a", None), Descriptor::new("b", Some("safe"))];
		assert_eq!(
			labels(r##"{"alps": {"descriptor": [{"href": "#|"}]}}"##, &descriptors),
			["#a", "#b"]
		);
		assert_eq!(
			labels(r##"{"alps": {"descriptor": [{"rt": "#|"}]}}"##, &descriptors),
			["#a", "#b"]
		);

		let (text, offset) = split(r##"{"rt": "#x|y"}"##);
		let items = classify(&text, offset, &descriptors, OffsetEncoding::Utf16);
		let Some(CompletionTextEdit::Edit(edit)) = &items[0].text_edit else {
			panic!("missing text edit");
		};
		assert_eq!((edit.range.start.character, edit.range.end.character), (8, 11));
	}

	#[test]
	fn brace_inside_a_string_is_not_an_object_start() {
		assert_eq!(
			labels(r#"{"alps": {"descriptor": [{"type": "{|"}]}}"#, &[]),
			DESCRIPTOR_TYPES
		);
		assert_eq!(labels(r#"{"alps": {"descriptor": [{"type": "{|"#, &[]), DESCRIPTOR_TYPES);
		assert!(matches!(
			ctx(r#"{"alps": {"descriptor": [{"type": "{|"}]}}"#),
			Some(JsonContext::StringValue { .. })
		));
	}

	#[test]
	fn unterminated_value_string_still_classifies() {
		assert_eq!(
			ctx(r#"{"type": "sa|"#),
			Some(JsonContext::StringValue {
				key: "type".to_owned(),
				parent_key: None,
				content: 10..12,
			})
		);
	}

	#[test]
	fn new_descriptor_after_trailing_comma() {
		let text = "{\"alps\": {\"descriptor\": [\n    {\"id\": \"a\"},|\n]}}";
		assert_eq!(
			ctx(text),
			Some(JsonContext::NewDescriptor {
				leading: "\n    ".to_owned(),
				indent: "    ".to_owned(),
			})
		);
		let (text, offset) = split(text);
		let items = classify(&text, offset, &[], OffsetEncoding::Utf16);
		assert_eq!(items.len(), 1);
		assert_eq!(
			items[0].insert_text.as_deref(),
			Some("\n    {\n    \t$0\n    }")
		);
		assert_eq!(
			items[0].command.as_ref().map(|c| c.command.as_str()),
			Some(completion::TRIGGER_SUGGEST)
		);
	}

	#[test]
	fn new_descriptor_in_empty_array() {
		assert_eq!(
			ctx(r#"{"alps": {"descriptor": [|]}}"#),
			Some(JsonContext::NewDescriptor {
				leading: "\n\t".to_owned(),
				indent: "\t".to_owned(),
			})
		);
	}

	#[test]
	fn descriptor_member_value_offers_array() {
		assert_eq!(
			ctx(r#"{"alps": {"descriptor": |}}"#),
			Some(JsonContext::DescriptorArray)
		);
	}

	#[test]
	fn key_position_after_comma() {
		assert_eq!(
			ctx(r#"{"alps": {"version": "1.0", |}}"#),
			Some(JsonContext::PropertyKey {
				container: vec![key("alps")],
				replace: None,
			})
		);
	}

	#[test]
	fn typed_key_is_replaced() {
		assert_eq!(
			ctx(r#"{"alps": {"ver|"}}"#),
			Some(JsonContext::PropertyKey {
				container: vec![key("alps")],
				replace: Some(10..15),
			})
		);
		assert_eq!(
			ctx(r#"{"alps": {"ver|"#),
			Some(JsonContext::PropertyKey {
				container: vec![key("alps")],
				replace: Some(10..14),
			})
		);
	}

	#[test]
	fn value_members_chain_suggestions() {
		let (text, offset) = split(r#"{"alps": {"descriptor": [{|}]}}"#);
		let items = classify(&text, offset, &[], OffsetEncoding::Utf16);
		let chained: Vec<_> = items
			.iter()
			.filter(|item| item.command.is_some())
			.map(|item| item.label.as_str())
			.collect();
		assert_eq!(chained, ["id", "href", "type", "rt"]);
	}
}
