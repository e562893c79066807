//! Descriptor records and the last-known-good cache.

use std::fmt;

use serde::{Deserialize, Serialize};

use crate::Dialect;

/// The `type` of an ALPS descriptor.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DescriptorType {
	/// A state element (the default when `type` is absent).
	#[default]
	Semantic,
	/// A safe transition.
	Safe,
	/// An unsafe transition.
	Unsafe,
	/// An idempotent transition.
	Idempotent,
	/// Any value outside the ALPS enumeration, kept verbatim.
	#[serde(untagged)]
	Other(String),
}

impl DescriptorType {
	/// Parses an attribute or member value; absent or empty values mean
	/// [`DescriptorType::Semantic`].
	#[must_use]
	pub fn from_attr(value: Option<&str>) -> Self {
		match value {
			None | Some("") | Some("semantic") => Self::Semantic,
			Some("safe") => Self::Safe,
			Some("unsafe") => Self::Unsafe,
			Some("idempotent") => Self::Idempotent,
			Some(other) => Self::Other(other.to_owned()),
		}
	}

	/// Returns the value as written in a profile.
	#[must_use]
	pub fn as_str(&self) -> &str {
		match self {
			Self::Semantic => "semantic",
			Self::Safe => "safe",
			Self::Unsafe => "unsafe",
			Self::Idempotent => "idempotent",
			Self::Other(other) => other,
		}
	}
}

impl fmt::Display for DescriptorType {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		f.write_str(self.as_str())
	}
}

/// A declared entity of the profile vocabulary.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Descriptor {
	/// Non-empty identifier, the target of `#id` references.
	pub id: String,
	/// Descriptor type.
	#[serde(rename = "type")]
	pub kind: DescriptorType,
}

impl Descriptor {
	/// Creates a descriptor, mapping an absent `type` to `semantic`.
	#[must_use]
	pub fn new(id: impl Into<String>, kind: Option<&str>) -> Self {
		Self {
			id: id.into(),
			kind: DescriptorType::from_attr(kind),
		}
	}

	/// Returns true for `semantic` descriptors, the only valid `rt` targets.
	#[must_use]
	pub fn is_semantic(&self) -> bool {
		self.kind == DescriptorType::Semantic
	}
}

/// Reference table for cross-id completion.
///
/// Holds the list produced by the latest extraction pass plus the most recent non-empty
/// list. For markup profiles an empty extraction keeps serving the last known good list so
/// reference completion survives transient syntax errors. Object-notation profiles have no
/// such fallback and an empty extraction empties the table.
#[derive(Debug, Clone, Default)]
pub struct DescriptorCache {
	current: Vec<Descriptor>,
	last_good: Vec<Descriptor>,
}

impl DescriptorCache {
	/// Creates an empty cache.
	#[must_use]
	pub fn new() -> Self {
		Self::default()
	}

	/// Installs the result of an extraction pass and returns the list now in effect.
	pub fn update(&mut self, dialect: Dialect, extracted: Vec<Descriptor>) -> &[Descriptor] {
		if !extracted.is_empty() {
			self.last_good.clone_from(&extracted);
			self.current = extracted;
		} else {
			match dialect {
				Dialect::Markup => self.current.clone_from(&self.last_good),
				Dialect::Object => self.current.clear(),
			}
		}
		&self.current
	}

	/// Returns the descriptors completion should draw from.
	#[must_use]
	pub fn current(&self) -> &[Descriptor] {
		&self.current
	}

	/// Returns the most recent non-empty extraction.
	#[must_use]
	pub fn last_good(&self) -> &[Descriptor] {
		&self.last_good
	}
}

#[cfg(test)]
mod tests {
	use super::*;

	#[test]
	fn missing_type_defaults_to_semantic() {
		assert_eq!(Descriptor::new("x", None).kind, DescriptorType::Semantic);
		assert_eq!(Descriptor::new("x", Some("")).kind, DescriptorType::Semantic);
		assert_eq!(
			Descriptor::new("x", Some("unsafe")).kind,
			DescriptorType::Unsafe
		);
	}

	#[test]
	fn unknown_type_is_kept_verbatim() {
		let d = Descriptor::new("x", Some("weird"));
		assert_eq!(d.kind.as_str(), "weird");
		assert!(!d.is_semantic());
	}

	#[test]
	fn markup_keeps_last_good_on_empty_extraction() {
		let mut cache = DescriptorCache::new();
		cache.update(Dialect::Markup, vec![Descriptor::new("a", None)]);
		let current = cache.update(Dialect::Markup, Vec::new());
		assert_eq!(current, [Descriptor::new("a", None)]);
	}

	#[test]
	fn object_notation_empties_on_failed_extraction() {
		let mut cache = DescriptorCache::new();
		cache.update(Dialect::Object, vec![Descriptor::new("a", None)]);
		assert!(cache.update(Dialect::Object, Vec::new()).is_empty());
		assert_eq!(cache.last_good(), [Descriptor::new("a", None)]);
	}

	#[test]
	fn fresh_extraction_replaces_both_lists() {
		let mut cache = DescriptorCache::new();
		cache.update(Dialect::Markup, vec![Descriptor::new("a", None)]);
		cache.update(Dialect::Markup, vec![Descriptor::new("b", Some("safe"))]);
		assert_eq!(cache.current(), [Descriptor::new("b", Some("safe"))]);
		assert_eq!(cache.last_good(), cache.current());
	}
}
