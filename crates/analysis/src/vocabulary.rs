//! Fixed vocabularies of the ALPS format.

/// Values of a descriptor's `type`.
pub const DESCRIPTOR_TYPES: [&str; 4] = ["semantic", "safe", "unsafe", "idempotent"];

/// Values of a `doc` element's `format`.
pub const DOC_FORMATS: [&str; 4] = ["text", "html", "asciidoc", "markdown"];

/// Values of a `doc` element's `contentType`, in [`DOC_FORMATS`] order.
pub const DOC_CONTENT_TYPES: [&str; 4] = ["text/plain", "text/html", "text/asciidoc", "text/markdown"];

/// Attributes of a markup `doc` element.
pub const DOC_ATTRIBUTES: [&str; 4] = ["format", "contentType", "href", "tag"];

/// Attributes offered on any other markup element.
pub const TAG_ATTRIBUTES: [&str; 7] = ["id", "href", "type", "rt", "rel", "title", "tag"];

/// Child elements of the markup root.
pub const CHILD_TAGS: [&str; 4] = ["title", "doc", "link", "descriptor"];

/// Child elements inserted self-closing.
pub const SELF_CLOSING_TAGS: [&str; 1] = ["descriptor"];

/// Members of the object-notation root.
pub const ROOT_MEMBERS: [&str; 1] = ["alps"];

/// Members of the object-notation `alps` object.
pub const ALPS_MEMBERS: [&str; 3] = ["version", "doc", "descriptor"];

/// Members of an object-notation descriptor.
pub const DESCRIPTOR_MEMBERS: [&str; 9] = ["id", "href", "name", "type", "rt", "rel", "def", "doc", "descriptor"];

/// Members of an object-notation `doc` object.
pub const DOC_MEMBERS: [&str; 4] = ["value", "format", "href", "contentType"];

/// Location of the ALPS XML schema referenced by new profiles.
pub const SCHEMA_LOCATION: &str = "https://alps-io.github.io/schemas/alps.xsd";

/// Controlled vocabulary of semantic terms offered as descriptor ids.
///
/// Drawn from schema.org so profiles built from these ids interoperate.
pub const SEMANTIC_TERMS: &[&str] = &[
	"about",
	"accountId",
	"additionalName",
	"address",
	"addressCountry",
	"addressLocality",
	"addressRegion",
	"alternateName",
	"author",
	"birthDate",
	"brand",
	"category",
	"comment",
	"contactPoint",
	"content",
	"contentUrl",
	"dateCreated",
	"dateModified",
	"datePublished",
	"description",
	"duration",
	"email",
	"endDate",
	"familyName",
	"gender",
	"givenName",
	"headline",
	"identifier",
	"image",
	"itemListElement",
	"jobTitle",
	"keywords",
	"language",
	"location",
	"logo",
	"name",
	"offers",
	"orderDate",
	"orderNumber",
	"orderStatus",
	"postalCode",
	"price",
	"priceCurrency",
	"productId",
	"quantity",
	"rating",
	"review",
	"sku",
	"startDate",
	"status",
	"streetAddress",
	"telephone",
	"text",
	"thumbnailUrl",
	"title",
	"totalPrice",
	"url",
	"version",
];

/// Returns true when `term` is part of [`SEMANTIC_TERMS`].
#[must_use]
pub fn is_semantic_term(term: &str) -> bool {
	SEMANTIC_TERMS.binary_search(&term).is_ok()
}

#[cfg(test)]
mod tests {
	use super::*;

	#[test]
	fn semantic_terms_are_sorted_and_unique() {
		assert!(SEMANTIC_TERMS.windows(2).all(|w| w[0] < w[1]));
		assert!(is_semantic_term("givenName"));
		assert!(!is_semantic_term("nope"));
	}
}
