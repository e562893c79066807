//! Arena parse tree built by the tolerant parser.

use super::location::Segment;
use super::parser::{self, Flow, Literal, ParseOptions, Visitor};

/// Index of a node in a [`Tree`].
pub type NodeId = usize;

/// Kind of a parse-tree node.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NodeKind {
	/// `{ ... }`
	Object,
	/// `[ ... ]`
	Array,
	/// A `key: value` member; its first child is the key string.
	Property,
	/// A string.
	String,
	/// A number.
	Number,
	/// `true` or `false`.
	Boolean,
	/// `null`.
	Null,
}

/// A parse-tree node.
#[derive(Debug, Clone, PartialEq)]
pub struct Node {
	/// Node kind.
	pub kind: NodeKind,
	/// Byte offset of the first token.
	pub offset: usize,
	/// Byte length, including delimiters.
	pub length: usize,
	/// Enclosing node.
	pub parent: Option<NodeId>,
	/// Children in source order.
	pub children: Vec<NodeId>,
	/// Value of literal nodes and property keys.
	pub value: Option<Literal>,
	/// Offset of the `:` of a property.
	pub colon_offset: Option<usize>,
}

impl Node {
	/// Byte offset one past the node.
	#[must_use]
	pub fn end(&self) -> usize {
		self.offset + self.length
	}

	/// String content of a string node.
	#[must_use]
	pub fn as_str(&self) -> Option<&str> {
		match &self.value {
			Some(Literal::String { value, .. }) => Some(value),
			_ => None,
		}
	}

	/// Whether a string node has its closing quote.
	#[must_use]
	pub fn is_terminated(&self) -> bool {
		!matches!(
			self.value,
			Some(Literal::String {
				terminated: false,
				..
			})
		)
	}
}

/// A parse tree over possibly malformed JSON text.
#[derive(Debug, Clone, Default)]
pub struct Tree {
	nodes: Vec<Node>,
	root: Option<NodeId>,
}

impl Tree {
	/// Parses `text`, recovering from syntax errors.
	#[must_use]
	pub fn parse(text: &str) -> Self {
		let mut builder = Builder::default();
		parser::visit(text, &mut builder, ParseOptions::default());
		Self {
			root: builder.roots.first().copied(),
			nodes: builder.nodes,
		}
	}

	/// The top-level value.
	#[must_use]
	pub fn root(&self) -> Option<NodeId> {
		self.root
	}

	/// Returns node `id`.
	#[must_use]
	pub fn node(&self, id: NodeId) -> &Node {
		&self.nodes[id]
	}

	/// Returns the innermost node containing `offset`.
	///
	/// A node ending exactly at `offset` counts only with `include_right_bound`.
	#[must_use]
	pub fn node_at_offset(&self, offset: usize, include_right_bound: bool) -> Option<NodeId> {
		self.root
			.and_then(|root| self.find_at(root, offset, include_right_bound))
	}

	fn find_at(&self, id: NodeId, offset: usize, include_right_bound: bool) -> Option<NodeId> {
		let node = &self.nodes[id];
		let contains = node.offset <= offset
			&& (offset < node.end() || (include_right_bound && offset == node.end()));
		if !contains {
			return None;
		}
		node.children
			.iter()
			.take_while(|&&child| self.nodes[child].offset <= offset)
			.find_map(|&child| self.find_at(child, offset, include_right_bound))
			.or(Some(id))
	}

	/// Whether `id` is the key string of a property.
	#[must_use]
	pub fn is_property_key(&self, id: NodeId) -> bool {
		self.nodes[id].parent.is_some_and(|parent| {
			self.nodes[parent].kind == NodeKind::Property && self.nodes[parent].children.first() == Some(&id)
		})
	}

	/// Returns the value of member `key` of object `id`; the last one wins on duplicates.
	#[must_use]
	pub fn member(&self, id: NodeId, key: &str) -> Option<NodeId> {
		let node = &self.nodes[id];
		if node.kind != NodeKind::Object {
			return None;
		}
		node.children.iter().rev().find_map(|&property| {
			let children = &self.nodes[property].children;
			let name = children.first().and_then(|&k| self.nodes[k].as_str())?;
			(name == key).then(|| children.get(1).copied()).flatten()
		})
	}

	/// Returns the path from the root to `id`.
	#[must_use]
	pub fn path(&self, id: NodeId) -> Vec<Segment> {
		let mut path = Vec::new();
		let mut current = id;
		while let Some(parent) = self.nodes[current].parent {
			let parent_node = &self.nodes[parent];
			match parent_node.kind {
				NodeKind::Property => {
					if let Some(key) = parent_node.children.first().and_then(|&k| self.nodes[k].as_str()) {
						path.push(Segment::Key(key.to_owned()));
					}
				}
				NodeKind::Array => {
					if let Some(index) = parent_node.children.iter().position(|&c| c == current) {
						path.push(Segment::Index(index));
					}
				}
				_ => {}
			}
			current = parent;
		}
		path.reverse();
		path
	}
}

#[derive(Default)]
struct Builder {
	nodes: Vec<Node>,
	roots: Vec<NodeId>,
	current: Option<NodeId>,
}

impl Builder {
	fn push(&mut self, kind: NodeKind, offset: usize, length: usize, value: Option<Literal>) -> NodeId {
		let id = self.nodes.len();
		self.nodes.push(Node {
			kind,
			offset,
			length,
			parent: self.current,
			children: Vec::new(),
			value,
			colon_offset: None,
		});
		match self.current {
			Some(parent) => self.nodes[parent].children.push(id),
			None => self.roots.push(id),
		}
		id
	}

	fn close_current(&mut self, end: usize) {
		if let Some(id) = self.current {
			let node = &mut self.nodes[id];
			node.length = end - node.offset;
			self.current = node.parent;
		}
	}

	/// Closes an open property once its value is complete.
	fn complete_property(&mut self, end: usize) {
		if self
			.current
			.is_some_and(|id| self.nodes[id].kind == NodeKind::Property)
		{
			self.close_current(end);
		}
	}
}

impl Visitor for Builder {
	fn on_object_begin(&mut self, offset: usize, _: usize) -> Flow {
		self.current = Some(self.push(NodeKind::Object, offset, 0, None));
		Flow::Continue(())
	}

	fn on_object_property(&mut self, name: &str, offset: usize, length: usize) -> Flow {
		self.current = Some(self.push(NodeKind::Property, offset, 0, None));
		let key = Literal::String {
			value: name.to_owned(),
			terminated: true,
		};
		self.push(NodeKind::String, offset, length, Some(key));
		Flow::Continue(())
	}

	fn on_object_end(&mut self, offset: usize, length: usize) -> Flow {
		self.complete_property(offset + length);
		self.close_current(offset + length);
		self.complete_property(offset + length);
		Flow::Continue(())
	}

	fn on_array_begin(&mut self, offset: usize, _: usize) -> Flow {
		self.current = Some(self.push(NodeKind::Array, offset, 0, None));
		Flow::Continue(())
	}

	fn on_array_end(&mut self, offset: usize, length: usize) -> Flow {
		self.close_current(offset + length);
		self.complete_property(offset + length);
		Flow::Continue(())
	}

	fn on_literal_value(&mut self, value: Literal, offset: usize, length: usize) -> Flow {
		let kind = match value {
			Literal::String { .. } => NodeKind::String,
			Literal::Number(_) => NodeKind::Number,
			Literal::Bool(_) => NodeKind::Boolean,
			Literal::Null => NodeKind::Null,
		};
		self.push(kind, offset, length, Some(value));
		self.complete_property(offset + length);
		Flow::Continue(())
	}

	fn on_separator(&mut self, separator: char, offset: usize, _: usize) -> Flow {
		if let Some(id) = self.current
			&& self.nodes[id].kind == NodeKind::Property
		{
			match separator {
				':' => self.nodes[id].colon_offset = Some(offset),
				',' => self.complete_property(offset),
				_ => {}
			}
		}
		Flow::Continue(())
	}
}
