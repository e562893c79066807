//! Server configuration.

use std::time::Duration;

use alps_analysis::Dialect;
use lsp_types::Uri;
use serde::{Deserialize, Serialize};
use serde_json::Value as JsonValue;

use crate::pipeline::Timing;

/// Settings read from `initializationOptions`, seeded by command-line flags.
///
/// Every field is optional on the wire; missing fields keep their current value.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct ServerConfig {
	/// Quiet period after the last edit before validating.
	pub validation_debounce_ms: u64,
	/// Delay between publishing errors and publishing warnings.
	pub warning_delay_ms: u64,
	/// Characters that make the client request completion.
	pub trigger_characters: Vec<String>,
	/// Language identifiers of tag-based profiles.
	pub markup_language_ids: Vec<String>,
	/// Language identifiers of object-notation profiles.
	pub object_language_ids: Vec<String>,
}

impl Default for ServerConfig {
	fn default() -> Self {
		Self {
			validation_debounce_ms: 500,
			warning_delay_ms: 1000,
			trigger_characters: ["<", " ", "\"", "#", "/", ":", ","]
				.map(String::from)
				.to_vec(),
			markup_language_ids: vec!["alps-xml".into()],
			object_language_ids: vec!["alps-json".into()],
		}
	}
}

impl ServerConfig {
	/// Overlays the fields present in `options` on this configuration.
	///
	/// # Errors
	///
	/// Fails when a present field has the wrong type.
	pub fn with_options(&self, options: &JsonValue) -> Result<Self, serde_json::Error> {
		let mut merged = serde_json::to_value(self)?;
		if let (JsonValue::Object(base), JsonValue::Object(overrides)) = (&mut merged, options) {
			base.extend(overrides.iter().map(|(key, value)| (key.clone(), value.clone())));
		}
		serde_json::from_value(merged)
	}

	/// The diagnostics pipeline delays.
	#[must_use]
	pub fn timing(&self) -> Timing {
		Timing {
			debounce: Duration::from_millis(self.validation_debounce_ms),
			warning_delay: Duration::from_millis(self.warning_delay_ms),
		}
	}

	/// Decides the dialect of a document from its language identifier, falling back to the
	/// file name for unknown identifiers.
	#[must_use]
	pub fn dialect(&self, language_id: &str, uri: &Uri) -> Option<Dialect> {
		if self.markup_language_ids.iter().any(|id| id == language_id) {
			return Some(Dialect::Markup);
		}
		if self.object_language_ids.iter().any(|id| id == language_id) {
			return Some(Dialect::Object);
		}
		let uri = uri.to_string().to_ascii_lowercase();
		let path = uri.split(['?', '#']).next().unwrap_or_default();
		if path.ends_with(".xml") {
			Some(Dialect::Markup)
		} else if path.ends_with(".json") {
			Some(Dialect::Object)
		} else {
			None
		}
	}
}

#[cfg(test)]
mod tests {
	use pretty_assertions::assert_eq;
	use rstest::rstest;
	use serde_json::json;

	use super::*;

	#[test]
	fn options_overlay_seeded_values() {
		let seeded = ServerConfig {
			warning_delay_ms: 250,
			..ServerConfig::default()
		};
		let config = seeded
			.with_options(&json!({"validationDebounceMs": 100, "unknown": true}))
			.unwrap();
		assert_eq!(config.validation_debounce_ms, 100);
		assert_eq!(config.warning_delay_ms, 250);
		assert_eq!(config.markup_language_ids, ["alps-xml"]);
	}

	#[test]
	fn null_options_keep_everything() {
		let config = ServerConfig::default().with_options(&JsonValue::Null).unwrap();
		assert_eq!(config, ServerConfig::default());
	}

	#[test]
	fn mistyped_option_is_rejected() {
		let result = ServerConfig::default().with_options(&json!({"warningDelayMs": "soon"}));
		assert!(result.is_err());
	}

	#[rstest]
	#[case::markup_id("alps-xml", "file:///p/profile.txt", Some(Dialect::Markup))]
	#[case::object_id("alps-json", "file:///p/profile.txt", Some(Dialect::Object))]
	#[case::markup_suffix("xml", "file:///p/profile.alps.xml", Some(Dialect::Markup))]
	#[case::object_suffix("json", "file:///p/Profile.ALPS.JSON", Some(Dialect::Object))]
	#[case::fragment_ignored("plaintext", "untitled:profile.json#frag", Some(Dialect::Object))]
	#[case::neither("markdown", "file:///p/README.md", None)]
	fn dialect_resolution(#[case] language_id: &str, #[case] uri: &str, #[case] expected: Option<Dialect>) {
		let uri: Uri = uri.parse().unwrap();
		assert_eq!(ServerConfig::default().dialect(language_id, &uri), expected);
	}
}
