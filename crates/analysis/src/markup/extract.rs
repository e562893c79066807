use quick_xml::Reader;
use quick_xml::events::{BytesStart, Event as XmlEvent};
use tracing::debug;

use super::scanner::{Event, Scanner};
use crate::{Descriptor, ExtractError};

/// Extracts descriptors from a markup profile.
///
/// A strict parse collects the `descriptor` children of the `alps` root. If that parse
/// fails or finds nothing, a tolerant scan collects every `descriptor` tag with a non-empty
/// `id` anywhere in the text. Never fails; unreadable input yields an empty list.
#[must_use]
pub fn extract(text: &str) -> Vec<Descriptor> {
	match strict(text) {
		Ok(found) if !found.is_empty() => return found,
		Ok(_) => debug!("strict parse found no descriptors, scanning"),
		Err(err) => debug!(error = %err, "strict parse failed, scanning"),
	}
	scan(text)
}

fn strict(text: &str) -> Result<Vec<Descriptor>, ExtractError> {
	let mut reader = Reader::from_str(text);
	let mut depth = 0usize;
	let mut root_is_alps = false;
	let mut found = Vec::new();

	loop {
		match reader.read_event()? {
			XmlEvent::Start(start) => {
				visit(&start, depth, &mut root_is_alps, &mut found)?;
				depth += 1;
			}
			XmlEvent::Empty(start) => visit(&start, depth, &mut root_is_alps, &mut found)?,
			XmlEvent::End(_) => depth = depth.saturating_sub(1),
			XmlEvent::Eof => break,
			_ => {}
		}
	}

	if depth > 0 {
		return Err(ExtractError::Unclosed { count: depth });
	}
	Ok(found)
}

fn visit(
	start: &BytesStart<'_>,
	depth: usize,
	root_is_alps: &mut bool,
	found: &mut Vec<Descriptor>,
) -> Result<(), ExtractError> {
	if depth == 0 {
		*root_is_alps = start.name().as_ref() == b"alps";
		return Ok(());
	}
	if depth != 1 || !*root_is_alps || start.name().as_ref() != b"descriptor" {
		return Ok(());
	}

	let mut id = None;
	let mut kind = None;
	for attr in start.attributes() {
		let attr = attr?;
		match attr.key.as_ref() {
			b"id" => id = Some(attr.unescape_value()?.into_owned()),
			b"type" => kind = Some(attr.unescape_value()?.into_owned()),
			_ => {}
		}
	}
	if let Some(id) = id.filter(|id| !id.is_empty()) {
		found.push(Descriptor::new(id, kind.as_deref()));
	}
	Ok(())
}

fn scan(text: &str) -> Vec<Descriptor> {
	Scanner::new(text)
		.filter_map(|event| match event {
			Event::Open(tag) if tag.name == "descriptor" => {
				let id = tag.attribute("id").filter(|id| !id.is_empty())?;
				Some(Descriptor::new(id, tag.attribute("type").as_deref()))
			}
			_ => None,
		})
		.collect()
}
