use tracing::debug;

use super::tree::{NodeKind, Tree};
use crate::Descriptor;

/// Extracts descriptors from an object-notation profile.
///
/// Reads the elements of `alps.descriptor` from the same tolerant parse the validator
/// uses, so comments, trailing commas and half-typed documents still yield the
/// descriptors written so far. There is no further fallback: a document without an
/// `alps.descriptor` array yields an empty list, and elements without a non-empty string
/// `id` are skipped.
#[must_use]
pub fn extract(text: &str) -> Vec<Descriptor> {
	let tree = Tree::parse(text);
	let Some(elements) = tree
		.root()
		.and_then(|root| tree.member(root, "alps"))
		.and_then(|alps| tree.member(alps, "descriptor"))
		.filter(|&id| tree.node(id).kind == NodeKind::Array)
	else {
		debug!("no descriptor array in object notation");
		return Vec::new();
	};

	tree.node(elements)
		.children
		.iter()
		.filter_map(|&element| {
			let id = tree
				.member(element, "id")
				.and_then(|id| tree.node(id).as_str())
				.filter(|id| !id.is_empty())?;
			let kind = tree.member(element, "type").and_then(|kind| tree.node(kind).as_str());
			Some(Descriptor::new(id, kind))
		})
		.collect()
}

#[cfg(test)]
mod tests {
	use super::*;

	#[test]
	fn reads_root_descriptors_in_order() {
		let text = r#"{"alps": {"descriptor": [
			{"id": "a"},
			{"id": "b", "type": "unsafe"},
			{"type": "safe"},
			{"id": 7},
			{"id": "c", "descriptor": [{"id": "nested"}]}
		]}}"#;
		assert_eq!(
			extract(text),
			[
				Descriptor::new("a", None),
				Descriptor::new("b", Some("unsafe")),
				Descriptor::new("c", None),
			]
		);
	}

	#[test]
	fn tolerates_what_the_validator_tolerates() {
		let trailing = r#"{"alps": {"descriptor": [{"id": "a"},]}}"#;
		assert!(crate::json::validate(trailing, crate::OffsetEncoding::Utf16).is_empty());
		assert_eq!(extract(trailing), [Descriptor::new("a", None)]);

		let commented = "// profile\n{\"alps\": {\"descriptor\": [{\"id\": \"a\", /* safe */ \"type\": \"safe\"}]}}";
		assert!(crate::json::validate(commented, crate::OffsetEncoding::Utf16).is_empty());
		assert_eq!(extract(commented), [Descriptor::new("a", Some("safe"))]);
	}

	#[test]
	fn unfinished_document_keeps_completed_descriptors() {
		assert_eq!(
			extract(r#"{"alps": {"descriptor": [{"id": "a"}, {"id": "#),
			[Descriptor::new("a", None)]
		);
	}

	#[test]
	fn missing_descriptor_array_yields_nothing() {
		assert!(extract(r#"{"alps": {"version": "1.0"}}"#).is_empty());
		assert!(extract(r#"{"alps": {"descriptor": {"id": "a"}}}"#).is_empty());
		assert!(extract("[]").is_empty());
		assert!(extract("").is_empty());
	}
}
