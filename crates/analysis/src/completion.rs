//! Completion item construction and lazy resolution.
//!
//! Classifiers build items through the helpers here so every item carries an
//! [`ItemData`] payload; [`resolve`] uses it to fill `detail` and `documentation`.

use lsp_types::{
	Command, CompletionItem, CompletionItemKind, CompletionTextEdit, Documentation,
	InsertTextFormat, Range, TextEdit,
};
use serde::{Deserialize, Serialize};

use crate::Descriptor;

/// Client command re-opening the suggestion widget after a snippet is inserted.
pub const TRIGGER_SUGGEST: &str = "editor.action.triggerSuggest";

/// Resolution payload stored in [`CompletionItem::data`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "camelCase")]
pub enum ItemData {
	/// A `#id` reference to a descriptor.
	#[serde(rename_all = "camelCase")]
	Reference {
		/// Referenced descriptor id.
		id: String,
		/// Type of the referenced descriptor.
		descriptor_type: String,
	},
	/// A member of a fixed enumeration.
	EnumMember {
		/// Name of the enumeration, e.g. `type`.
		enumeration: String,
	},
	/// An attribute, member or element name.
	Property {
		/// Element or object owning the name.
		owner: String,
	},
	/// A structural snippet.
	Snippet {
		/// What the snippet inserts.
		description: String,
	},
	/// A term of the controlled semantic vocabulary.
	Term,
}

/// Creates a plain property-name item.
#[must_use]
pub fn property(label: &str, owner: &str) -> CompletionItem {
	CompletionItem {
		label: label.to_owned(),
		kind: Some(CompletionItemKind::PROPERTY),
		data: data(&ItemData::Property {
			owner: owner.to_owned(),
		}),
		..CompletionItem::default()
	}
}

/// Creates a property-name item inserting `snippet`.
#[must_use]
pub fn property_snippet(label: &str, snippet: String, owner: &str) -> CompletionItem {
	CompletionItem {
		insert_text: Some(snippet),
		insert_text_format: Some(InsertTextFormat::SNIPPET),
		..property(label, owner)
	}
}

/// Creates an enumeration-member item.
#[must_use]
pub fn enum_member(label: &str, enumeration: &str) -> CompletionItem {
	CompletionItem {
		label: label.to_owned(),
		kind: Some(CompletionItemKind::ENUM_MEMBER),
		data: data(&ItemData::EnumMember {
			enumeration: enumeration.to_owned(),
		}),
		..CompletionItem::default()
	}
}

/// Creates a `#id` reference item; `replace` is the span of the value typed so far.
#[must_use]
pub fn reference(descriptor: &Descriptor, documentation: String, replace: Option<Range>) -> CompletionItem {
	let label = format!("#{}", descriptor.id);
	CompletionItem {
		text_edit: replace.map(|range| {
			CompletionTextEdit::Edit(TextEdit {
				range,
				new_text: label.clone(),
			})
		}),
		label,
		kind: Some(CompletionItemKind::REFERENCE),
		documentation: Some(Documentation::String(documentation)),
		data: data(&ItemData::Reference {
			id: descriptor.id.clone(),
			descriptor_type: descriptor.kind.as_str().to_owned(),
		}),
		..CompletionItem::default()
	}
}

/// Creates a vocabulary-term item for an id value.
#[must_use]
pub fn term(term: &str) -> CompletionItem {
	CompletionItem {
		label: term.to_owned(),
		kind: Some(CompletionItemKind::TEXT),
		insert_text: Some(term.to_owned()),
		insert_text_format: Some(InsertTextFormat::PLAIN_TEXT),
		documentation: Some(Documentation::String(format!(
			"Inserts the term \"{term}\" as id value."
		))),
		data: data(&ItemData::Term),
		..CompletionItem::default()
	}
}

/// Creates a snippet item.
#[must_use]
pub fn snippet(label: &str, kind: CompletionItemKind, body: String, description: &str) -> CompletionItem {
	CompletionItem {
		label: label.to_owned(),
		kind: Some(kind),
		insert_text: Some(body),
		insert_text_format: Some(InsertTextFormat::SNIPPET),
		documentation: Some(Documentation::String(description.to_owned())),
		data: data(&ItemData::Snippet {
			description: description.to_owned(),
		}),
		..CompletionItem::default()
	}
}

/// Makes the client ask for completions again once `item` is inserted.
#[must_use]
pub fn chained(item: CompletionItem) -> CompletionItem {
	CompletionItem {
		command: Some(Command {
			title: "Suggest".to_owned(),
			command: TRIGGER_SUGGEST.to_owned(),
			arguments: None,
		}),
		..item
	}
}

/// Replaces the insertion of `item` with an edit over `range`.
#[must_use]
pub fn with_edit(item: CompletionItem, range: Range) -> CompletionItem {
	let new_text = item.insert_text.clone().unwrap_or_else(|| item.label.clone());
	CompletionItem {
		text_edit: Some(CompletionTextEdit::Edit(TextEdit { range, new_text })),
		..item
	}
}

/// Prefixes every line after the first with `indent` so multi-line insertions line up with
/// the line the cursor is on.
#[must_use]
pub fn indent_lines(body: &str, indent: &str) -> String {
	body.replace('\n', &format!("\n{indent}"))
}

/// Fills `detail` and `documentation` of an item produced by this crate.
///
/// Items without a recognizable payload are returned unchanged.
#[must_use]
pub fn resolve(mut item: CompletionItem) -> CompletionItem {
	let Some(payload) = item
		.data
		.clone()
		.and_then(|value| serde_json::from_value::<ItemData>(value).ok())
	else {
		return item;
	};

	match (item.kind, payload) {
		(
			Some(CompletionItemKind::REFERENCE),
			ItemData::Reference {
				id,
				descriptor_type,
			},
		) => {
			item.detail = Some(format!("Descriptor ID: {id}"));
			item.documentation = Some(Documentation::String(format!("Type: {descriptor_type}")));
		}
		(Some(CompletionItemKind::ENUM_MEMBER), ItemData::EnumMember { enumeration }) => {
			item.detail = Some(format!("{enumeration} value"));
			item.documentation.get_or_insert_with(|| {
				Documentation::String(format!("Allowed value of `{enumeration}`."))
			});
		}
		(Some(CompletionItemKind::PROPERTY), ItemData::Property { owner }) => {
			item.detail = Some(format!("{owner} member"));
		}
		(Some(CompletionItemKind::TEXT), ItemData::Term) => {
			item.detail = Some("Semantic vocabulary term".to_owned());
		}
		(_, ItemData::Snippet { description }) => {
			item.detail = Some("ALPS snippet".to_owned());
			item.documentation
				.get_or_insert_with(|| Documentation::String(description));
		}
		_ => {}
	}
	item
}

fn data(payload: &ItemData) -> Option<serde_json::Value> {
	serde_json::to_value(payload).ok()
}

#[cfg(test)]
mod tests {
	use lsp_types::Position;

	use super::*;

	#[test]
	fn reference_resolves_to_id_and_type() {
		let item = reference(
			&Descriptor::new("goHome", Some("safe")),
			"Reference".to_owned(),
			None,
		);
		assert_eq!(item.label, "#goHome");

		let item = resolve(item);
		assert_eq!(item.detail.as_deref(), Some("Descriptor ID: goHome"));
		assert_eq!(
			item.documentation,
			Some(Documentation::String("Type: safe".to_owned()))
		);
	}

	#[test]
	fn reference_edit_replaces_typed_value() {
		let range = Range::new(Position::new(0, 10), Position::new(0, 11));
		let item = reference(&Descriptor::new("a", None), String::new(), Some(range));
		assert_eq!(
			item.text_edit,
			Some(CompletionTextEdit::Edit(TextEdit {
				range,
				new_text: "#a".to_owned(),
			}))
		);
	}

	#[test]
	fn resolve_leaves_foreign_items_alone() {
		let item = CompletionItem {
			label: "x".to_owned(),
			..CompletionItem::default()
		};
		assert_eq!(resolve(item.clone()), item);
	}

	#[test]
	fn resolve_fills_detail_by_kind() {
		assert_eq!(
			resolve(enum_member("safe", "type")).detail.as_deref(),
			Some("type value")
		);
		assert_eq!(
			resolve(property("href", "descriptor")).detail.as_deref(),
			Some("descriptor member")
		);
		assert_eq!(
			resolve(term("name")).detail.as_deref(),
			Some("Semantic vocabulary term")
		);
	}

	#[test]
	fn indent_lines_skips_first_line() {
		assert_eq!(indent_lines("{\n\t$0\n}", "    "), "{\n    \t$0\n    }");
	}

	#[test]
	fn chained_sets_trigger_command() {
		let item = chained(property("id", "descriptor"));
		assert_eq!(
			item.command.map(|c| c.command).as_deref(),
			Some(TRIGGER_SUGGEST)
		);
	}
}
