//! Structural location of an offset inside possibly malformed JSON.

use super::parser::{self, Flow, Literal, ParseOptions, Visitor};
use super::tree::NodeKind;

/// One step of a structural path.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Segment {
	/// An object member name; empty while the name is not yet written.
	Key(String),
	/// An array index.
	Index(usize),
}

impl Segment {
	/// Returns the member name of a key segment.
	#[must_use]
	pub fn as_key(&self) -> Option<&str> {
		match self {
			Self::Key(key) => Some(key),
			Self::Index(_) => None,
		}
	}
}

/// The token immediately before the location, when it is a key or a literal.
#[derive(Debug, Clone, PartialEq)]
pub struct PreviousNode {
	/// `Property` for keys, otherwise the literal's kind.
	pub kind: NodeKind,
	/// Byte offset of the token.
	pub offset: usize,
	/// Byte length of the token.
	pub length: usize,
	/// Key name or literal value.
	pub value: Literal,
}

/// Where an offset sits in the document structure.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct Location {
	/// Keys and indices from the root. Inside an object at a key position the last
	/// segment is the key being written.
	pub path: Vec<Segment>,
	/// The key or literal the offset is in or directly after.
	pub previous: Option<PreviousNode>,
	/// Whether the offset is where an object member name goes.
	pub at_property_key: bool,
}

impl Location {
	/// Path of the object or array whose member is being edited.
	#[must_use]
	pub fn container(&self) -> &[Segment] {
		match self.path.split_last() {
			Some((_, parent)) if self.at_property_key => parent,
			_ => &self.path,
		}
	}

	/// The last key segment of the path.
	#[must_use]
	pub fn last_key(&self) -> Option<&str> {
		self.path.last().and_then(Segment::as_key)
	}
}

/// Computes the location of byte `offset` in `text`.
#[must_use]
pub fn location(text: &str, offset: usize) -> Location {
	let mut finder = Finder {
		offset,
		location: Location::default(),
	};
	parser::visit(text, &mut finder, ParseOptions::default());
	finder.location
}

struct Finder {
	offset: usize,
	location: Location,
}

impl Finder {
	fn stop_at_or_before(&self, offset: usize) -> Flow {
		if self.offset <= offset {
			Flow::Break(())
		} else {
			Flow::Continue(())
		}
	}

	fn set_previous(&mut self, kind: NodeKind, offset: usize, length: usize, value: Literal) -> Flow {
		if self.offset < offset {
			return Flow::Break(());
		}
		self.location.previous = Some(PreviousNode {
			kind,
			offset,
			length,
			value,
		});
		Flow::Continue(())
	}
}

impl Visitor for Finder {
	fn on_object_begin(&mut self, offset: usize, _: usize) -> Flow {
		self.stop_at_or_before(offset)?;
		self.location.previous = None;
		self.location.at_property_key = true;
		self.location.path.push(Segment::Key(String::new()));
		Flow::Continue(())
	}

	fn on_object_property(&mut self, name: &str, offset: usize, length: usize) -> Flow {
		let key = Literal::String {
			value: name.to_owned(),
			terminated: true,
		};
		self.set_previous(NodeKind::Property, offset, length, key)?;
		if let Some(last) = self.location.path.last_mut() {
			*last = Segment::Key(name.to_owned());
		}
		self.stop_at_or_before(offset + length)
	}

	fn on_object_end(&mut self, offset: usize, _: usize) -> Flow {
		self.stop_at_or_before(offset)?;
		self.location.previous = None;
		self.location.path.pop();
		Flow::Continue(())
	}

	fn on_array_begin(&mut self, offset: usize, _: usize) -> Flow {
		self.stop_at_or_before(offset)?;
		self.location.previous = None;
		self.location.path.push(Segment::Index(0));
		Flow::Continue(())
	}

	fn on_array_end(&mut self, offset: usize, _: usize) -> Flow {
		self.stop_at_or_before(offset)?;
		self.location.previous = None;
		self.location.path.pop();
		Flow::Continue(())
	}

	fn on_literal_value(&mut self, value: Literal, offset: usize, length: usize) -> Flow {
		let kind = match value {
			Literal::String { .. } => NodeKind::String,
			Literal::Number(_) => NodeKind::Number,
			Literal::Bool(_) => NodeKind::Boolean,
			Literal::Null => NodeKind::Null,
		};
		self.set_previous(kind, offset, length, value)?;
		self.stop_at_or_before(offset + length)
	}

	fn on_separator(&mut self, separator: char, offset: usize, _: usize) -> Flow {
		self.stop_at_or_before(offset)?;
		match separator {
			':' if self
				.location
				.previous
				.as_ref()
				.is_some_and(|p| p.kind == NodeKind::Property) =>
			{
				self.location.at_property_key = false;
				self.location.previous = None;
			}
			',' => {
				match self.location.path.last_mut() {
					Some(Segment::Index(index)) => *index += 1,
					Some(last) => {
						self.location.at_property_key = true;
						*last = Segment::Key(String::new());
					}
					None => {}
				}
				self.location.previous = None;
			}
			_ => {}
		}
		Flow::Continue(())
	}
}

#[cfg(test)]
mod tests {
	use pretty_assertions::assert_eq;

	use super::*;

	fn at_cursor(text: &str) -> Location {
		let offset = text.find('|').unwrap_or(text.len());
		location(&text.replace('|', ""), offset)
	}

	fn key(name: &str) -> Segment {
		Segment::Key(name.to_owned())
	}

	#[test]
	fn empty_object_is_a_key_position() {
		let loc = at_cursor("{|}");
		assert_eq!(loc.path, [key("")]);
		assert!(loc.at_property_key);
		assert!(loc.container().is_empty());
	}

	#[test]
	fn after_comma_in_object() {
		let loc = at_cursor(r#"{"alps": {"version": "1.0", |}}"#);
		assert_eq!(loc.path, [key("alps"), key("")]);
		assert!(loc.at_property_key);
		assert_eq!(loc.container(), [key("alps")]);
	}

	#[test]
	fn inside_value_string() {
		let loc = at_cursor(r#"{"alps": {"descriptor": [{"id": "a"}, {"type": "sa|"}]}}"#);
		assert_eq!(
			loc.path,
			[key("alps"), key("descriptor"), Segment::Index(1), key("type")]
		);
		assert!(!loc.at_property_key);
		assert_eq!(loc.previous.map(|p| p.kind), Some(NodeKind::String));
	}

	#[test]
	fn inside_key_string() {
		let loc = at_cursor(r#"{"alps": {"ver|"}}"#);
		assert_eq!(loc.path, [key("alps"), key("ver")]);
		assert!(loc.at_property_key);
		assert_eq!(loc.container(), [key("alps")]);
		let previous = loc.previous.map(|p| (p.kind, p.offset, p.length));
		assert_eq!(previous, Some((NodeKind::Property, 10, 5)));
	}

	#[test]
	fn after_comma_in_array() {
		let loc = at_cursor(r#"{"descriptor": [{"id": "a"},|]}"#);
		assert_eq!(loc.path, [key("descriptor"), Segment::Index(1)]);
		assert!(!loc.at_property_key);
		assert_eq!(loc.previous, None);
	}

	#[test]
	fn after_colon() {
		let loc = at_cursor(r#"{"descriptor": |}"#);
		assert_eq!(loc.path, [key("descriptor")]);
		assert!(!loc.at_property_key);
		assert_eq!(loc.last_key(), Some("descriptor"));
	}
}
