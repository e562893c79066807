//! Behavior of the public analysis entry points on whole profiles.

use alps_analysis::lsp_types::{Diagnostic, DiagnosticSeverity};
use alps_analysis::{Descriptor, DescriptorCache, Dialect, LineIndex, OffsetEncoding, extract, json, markup};
use pretty_assertions::assert_eq;
use rstest::rstest;

const PROFILE_XML: &str = r##"<?xml version="1.0" encoding="UTF-8"?>
<alps version="1.0">
	<title>Contacts</title>
	<doc format="text">A simple contact list.</doc>
	<!-- state -->
	<descriptor id="contact" type="semantic">
		<descriptor id="givenName"/>
		<descriptor id="email"/>
	</descriptor>
	<descriptor id="goHome" type="safe" rt="#contact"/>
	<descriptor id="addContact" type="unsafe" rt="#contact">
		<doc>Adds a contact &amp; returns it.</doc>
	</descriptor>
</alps>
"##;

const PROFILE_JSON: &str = r##"{
	"alps": {
		"version": "1.0",
		"doc": {"format": "text", "value": "A simple contact list."},
		"descriptor": [
			{"id": "contact", "descriptor": [{"id": "givenName"}]},
			{"id": "goHome", "type": "safe", "rt": "#contact"}
		]
	}
}"##;

fn split(text: &str) -> (String, usize) {
	let offset = text.find('|').unwrap_or(text.len());
	(text.replacen('|', "", 1), offset)
}

fn markup_labels(text: &str, descriptors: &[Descriptor]) -> Vec<String> {
	let (text, offset) = split(text);
	markup::classify(&text, offset, descriptors, OffsetEncoding::Utf16)
		.into_iter()
		.map(|item| item.label)
		.collect()
}

fn json_labels(text: &str, descriptors: &[Descriptor]) -> Vec<String> {
	let (text, offset) = split(text);
	json::classify(&text, offset, descriptors, OffsetEncoding::Utf16)
		.into_iter()
		.map(|item| item.label)
		.collect()
}

/// Slices `text` with a diagnostic range.
fn covered<'a>(text: &'a str, diagnostic: &Diagnostic) -> &'a str {
	let index = LineIndex::new(text, OffsetEncoding::Utf16);
	let start = index.offset(diagnostic.range.start).unwrap_or_default();
	let end = index.offset(diagnostic.range.end).unwrap_or_default();
	&text[start..end]
}

#[rstest]
#[case::profile(PROFILE_XML)]
#[case::single_element("<alps/>")]
#[case::nested_same_name("<a><a><a/></a></a>")]
#[case::comments_and_cdata("<a><!-- </b> --><![CDATA[</c>]]></a>")]
#[case::processing_instruction("<?xml version=\"1.0\"?><a b='1' c=\"2\">x &lt; y</a>")]
fn well_formed_markup_is_clean(#[case] text: &str) {
	let diagnostics = markup::validate(text, OffsetEncoding::Utf16);
	assert!(diagnostics.is_empty(), "{diagnostics:#?}");
}

#[test]
fn crossed_tags_report_one_mismatch() {
	let text = "<a><b></a></b>";
	let diagnostics = markup::validate(text, OffsetEncoding::Utf16);
	assert_eq!(diagnostics.len(), 1);
	assert_eq!(diagnostics[0].severity, Some(DiagnosticSeverity::ERROR));
	assert_eq!(
		diagnostics[0].message,
		"Mismatched closing tag: expected </b>, found </a>"
	);
	assert_eq!(covered(text, &diagnostics[0]), "</a>");
}

#[test]
fn unclosed_tags_warn_in_push_order() {
	let diagnostics = markup::validate("<a><b>", OffsetEncoding::Utf16);
	assert_eq!(diagnostics.len(), 1);
	assert_eq!(diagnostics[0].severity, Some(DiagnosticSeverity::WARNING));
	assert_eq!(diagnostics[0].message, "Unclosed tags: a, b");
}

#[test]
fn mismatch_cascades_without_repair() {
	let diagnostics = markup::validate("<a><b></c></b></a>", OffsetEncoding::Utf16);
	let messages: Vec<_> = diagnostics.iter().map(|d| d.message.as_str()).collect();
	assert_eq!(
		messages,
		[
			"Mismatched closing tag: expected </b>, found </c>",
			"Mismatched closing tag: expected </a>, found </b>",
			"Unexpected closing tag </a>: no element is open",
		]
	);
}

#[rstest]
#[case::unencoded_lt("<a>1 < 2</a>", "<")]
#[case::bad_entity("<a>&bogus;</a>", "&bogus;")]
#[case::duplicate_attribute("<a id=\"1\" id=\"2\"/>", "id")]
#[case::mismatch("<alps>\n  <doc>\n  </alps>", "</alps>")]
fn diagnostics_cover_the_offending_token(#[case] text: &str, #[case] token: &str) {
	let diagnostics = markup::validate(text, OffsetEncoding::Utf16);
	let first = diagnostics.first().map(|d| covered(text, d));
	assert_eq!(first, Some(token));
}

#[test]
fn json_diagnostics_cover_the_offending_token() {
	let text = "{\n  \"alps\": {\n    \"version\" \"1.0\"\n  }\n}";
	let diagnostics = json::validate(text, OffsetEncoding::Utf16);
	assert_eq!(diagnostics.len(), 1);
	assert_eq!(diagnostics[0].message, "Colon expected");
	assert_eq!(covered(text, &diagnostics[0]), "\"1.0\"");
}

#[test]
fn diagnostics_respect_utf16_columns() {
	let text = "<a title=\"\u{1F600}\"></b>";
	let diagnostics = markup::validate(text, OffsetEncoding::Utf16);
	assert_eq!(diagnostics[0].range.start.character, 14);
	assert_eq!(covered(text, &diagnostics[0]), "</b>");
}

#[test]
fn object_notation_defaults_type() {
	assert_eq!(
		extract(r#"{"alps": {"descriptor": [{"id": "x"}]}}"#, Dialect::Object),
		[Descriptor::new("x", Some("semantic"))]
	);
}

#[test]
fn markup_fallback_finds_textual_descriptor() {
	let text = r#"<alps><descriptor id="y" type="unsafe"><doc></alps>"#;
	assert_eq!(
		extract(text, Dialect::Markup),
		[Descriptor::new("y", Some("unsafe"))]
	);
}

#[rstest]
#[case::markup(PROFILE_XML, Dialect::Markup)]
#[case::object(PROFILE_JSON, Dialect::Object)]
fn extraction_is_idempotent(#[case] text: &str, #[case] dialect: Dialect) {
	let first = extract(text, dialect);
	assert!(!first.is_empty());
	assert_eq!(first, extract(text, dialect));
}

#[test]
fn markup_profile_extracts_root_descriptors() {
	assert_eq!(
		extract(PROFILE_XML, Dialect::Markup),
		[
			Descriptor::new("contact", None),
			Descriptor::new("goHome", Some("safe")),
			Descriptor::new("addContact", Some("unsafe")),
		]
	);
}

#[test]
fn cache_serves_last_good_markup_list_while_broken() {
	let mut cache = DescriptorCache::new();
	cache.update(Dialect::Markup, extract(PROFILE_XML, Dialect::Markup));
	let broken = "<alps><descriptor";
	let current = cache.update(Dialect::Markup, extract(broken, Dialect::Markup));
	assert_eq!(current.len(), 3);

	cache.update(Dialect::Object, extract(PROFILE_JSON, Dialect::Object));
	assert!(cache.update(Dialect::Object, extract("{", Dialect::Object)).is_empty());
}

#[rstest]
#[case::descriptor_tag("<alps>\n  <descriptor id=\"a\" type=\"|")]
#[case::single_quotes("<alps><descriptor type='|")]
#[case::partial_value("<alps><descriptor id=\"a\" type=\"sa|")]
fn type_value_offers_exactly_the_four_types(#[case] text: &str) {
	assert_eq!(
		markup_labels(text, &[]),
		["semantic", "safe", "unsafe", "idempotent"]
	);
}

#[test]
fn href_offers_all_descriptors_and_rt_only_semantic() {
	let descriptors = [
		Descriptor::new("a", None),
		Descriptor::new("b", Some("semantic")),
		Descriptor::new("c", Some("safe")),
	];
	assert_eq!(
		markup_labels("<descriptor id=\"x\" href=\"#|", &descriptors[..2]),
		["#a", "#b"]
	);
	assert_eq!(
		markup_labels("<descriptor id=\"x\" rt=\"#|", &descriptors),
		["#a", "#b"]
	);
	assert_eq!(
		markup_labels("<descriptor id=\"x\" href=\"#|", &descriptors),
		["#a", "#b", "#c"]
	);
}

#[rstest]
#[case::markup_tag("<alps>\n  <descriptor id=\"a\" |", Dialect::Markup)]
#[case::markup_close("<alps>\n  <doc>\n  </|", Dialect::Markup)]
#[case::object_key(r#"{"alps": {"descriptor": [{"id": "a", |}]}}"#, Dialect::Object)]
#[case::object_value(r#"{"alps": {"descriptor": [{"type": "|"}]}}"#, Dialect::Object)]
fn classification_is_pure(#[case] text: &str, #[case] dialect: Dialect) {
	let descriptors = [Descriptor::new("a", None)];
	let labels = |text: &str| match dialect {
		Dialect::Markup => markup_labels(text, &descriptors),
		Dialect::Object => json_labels(text, &descriptors),
	};
	let first = labels(text);
	assert!(!first.is_empty());
	assert_eq!(first, labels(text));
}

#[test]
fn precedence_prefers_doc_values_over_attribute_names() {
	assert_eq!(
		markup_labels("<alps><doc format=\"|", &[]),
		["text", "html", "asciidoc", "markdown"]
	);
	assert_eq!(
		markup_labels("<alps><doc |", &[]),
		["format", "contentType", "href", "tag"]
	);
	assert_eq!(
		markup_labels("<alps><doc format=\"text\" |", &[]),
		["contentType", "href", "tag"]
	);
}

#[test]
fn json_profile_completion_end_to_end() {
	let descriptors = extract(PROFILE_JSON, Dialect::Object);
	let text = PROFILE_JSON.replacen("\"rt\": \"#contact\"", "\"rt\": \"#|\"", 1);
	assert_eq!(json_labels(&text, &descriptors), ["#contact", "#goHome"]);
}
