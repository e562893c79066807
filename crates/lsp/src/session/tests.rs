use std::time::Duration;

use lsp_types::{
	CompletionItemKind, Position, TextDocumentIdentifier, TextDocumentItem, TextDocumentPositionParams,
	VersionedTextDocumentIdentifier,
};
use pretty_assertions::assert_eq;
use serde_json::json;
use tokio::sync::mpsc;

use super::*;
use crate::message::Message;

const PROFILE: &str = r#"<alps>
  <descriptor id="contact"/>
  <descriptor id="goHome" type="safe" rt=""/>
</alps>"#;

fn session() -> (Session, mpsc::UnboundedReceiver<Message>) {
	let (client, rx) = ClientSocket::new();
	(Session::new(ServerConfig::default(), client), rx)
}

fn uri(path: &str) -> Uri {
	format!("file:///{path}").parse().unwrap()
}

fn open(session: &mut Session, path: &str, language_id: &str, text: &str, now: Instant) {
	session.open(
		DidOpenTextDocumentParams {
			text_document: TextDocumentItem {
				uri: uri(path),
				language_id: language_id.into(),
				version: 1,
				text: text.into(),
			},
		},
		now,
	);
}

fn published(rx: &mut mpsc::UnboundedReceiver<Message>) -> Vec<(String, usize)> {
	let mut out = Vec::new();
	while let Ok(Message::Notification(notif)) = rx.try_recv() {
		let uri = notif.params["uri"].as_str().unwrap_or_default().to_owned();
		let count = notif.params["diagnostics"].as_array().map_or(0, Vec::len);
		out.push((uri, count));
	}
	out
}

fn complete(session: &Session, path: &str, line: u32, character: u32) -> Vec<CompletionItem> {
	let params = CompletionParams {
		text_document_position: TextDocumentPositionParams {
			text_document: TextDocumentIdentifier { uri: uri(path) },
			position: Position::new(line, character),
		},
		work_done_progress_params: Default::default(),
		partial_result_params: Default::default(),
		context: None,
	};
	match session.completion(params) {
		CompletionResponse::List(list) => list.items,
		CompletionResponse::Array(items) => items,
	}
}

#[test]
fn initialize_negotiates_utf8_and_applies_options() {
	let (mut session, _rx) = session();
	let params: InitializeParams = serde_json::from_value(json!({
		"capabilities": {"general": {"positionEncodings": ["utf-16", "utf-8"]}},
		"initializationOptions": {"warningDelayMs": 10},
	}))
	.unwrap();
	let result = session.initialize(params);

	assert_eq!(session.encoding(), OffsetEncoding::Utf8);
	assert_eq!(session.config().warning_delay_ms, 10);
	assert_eq!(result.capabilities.position_encoding, Some(PositionEncodingKind::UTF8));
	let completion = result.capabilities.completion_provider.unwrap();
	assert_eq!(completion.resolve_provider, Some(true));
	assert_eq!(result.server_info.map(|info| info.name).as_deref(), Some(SERVER_NAME));
}

#[test]
fn initialize_defaults_to_utf16() {
	let (mut session, _rx) = session();
	let params: InitializeParams = serde_json::from_value(json!({
		"capabilities": {},
		"initializationOptions": {"warningDelayMs": "later"},
	}))
	.unwrap();
	let result = session.initialize(params);
	assert_eq!(session.encoding(), OffsetEncoding::Utf16);
	assert_eq!(session.config(), &ServerConfig::default());
	assert_eq!(result.capabilities.position_encoding, Some(PositionEncodingKind::UTF16));
}

#[test]
fn diagnostics_publish_errors_first_then_all() {
	let (mut session, mut rx) = session();
	let t0 = Instant::now();
	open(&mut session, "broken.alps.xml", "alps-xml", "<alps><doc></alps>", t0);
	assert_eq!(session.next_deadline(), Some(t0 + Duration::from_millis(500)));

	session.poll(t0 + Duration::from_millis(499));
	assert!(published(&mut rx).is_empty());

	session.poll(t0 + Duration::from_millis(500));
	let target = uri("broken.alps.xml").to_string();
	assert_eq!(published(&mut rx), [(target.clone(), 1)]);

	session.poll(t0 + Duration::from_millis(1500));
	assert_eq!(published(&mut rx), [(target, 2)]);
	assert_eq!(session.next_deadline(), None);
}

#[test]
fn closing_clears_diagnostics() {
	let (mut session, mut rx) = session();
	open(&mut session, "p.alps.json", "alps-json", "{", Instant::now());
	session.close(DidCloseTextDocumentParams {
		text_document: TextDocumentIdentifier {
			uri: uri("p.alps.json"),
		},
	});
	assert!(session.document(&uri("p.alps.json")).is_none());
	assert_eq!(published(&mut rx), [(uri("p.alps.json").to_string(), 0)]);
	assert_eq!(session.next_deadline(), None);
}

#[test]
fn completion_draws_on_document_descriptors() {
	let (mut session, _rx) = session();
	open(&mut session, "p.alps.xml", "alps-xml", PROFILE, Instant::now());

	let rt_line = 2;
	let rt_column = PROFILE.lines().nth(2).unwrap().find("rt=\"").unwrap() as u32 + 4;
	let labels: Vec<_> = complete(&session, "p.alps.xml", rt_line, rt_column)
		.into_iter()
		.map(|item| item.label)
		.collect();
	assert_eq!(labels, ["#contact"]);
}

#[test]
fn edits_move_the_reference_table() {
	let (mut session, _rx) = session();
	let t0 = Instant::now();
	open(&mut session, "p.alps.json", "alps-json", r#"{"alps": {"descriptor": [{"id": "a"}]}}"#, t0);
	session.change(
		DidChangeTextDocumentParams {
			text_document: VersionedTextDocumentIdentifier {
				uri: uri("p.alps.json"),
				version: 2,
			},
			content_changes: vec![lsp_types::TextDocumentContentChangeEvent {
				range: Some(lsp_types::Range::new(Position::new(0, 33), Position::new(0, 34))),
				range_length: None,
				text: "b".into(),
			}],
		},
		t0 + Duration::from_millis(100),
	);
	let document = session.document(&uri("p.alps.json")).unwrap();
	assert_eq!(document.version(), 2);
	assert_eq!(document.descriptors()[0].id, "b");
	assert_eq!(session.next_deadline(), Some(t0 + Duration::from_millis(600)));
}

#[test]
fn unknown_dialect_and_unknown_document_complete_nothing() {
	let (mut session, _rx) = session();
	open(&mut session, "notes.md", "markdown", "<", Instant::now());
	assert!(complete(&session, "notes.md", 0, 1).is_empty());
	assert!(complete(&session, "missing.alps.xml", 0, 0).is_empty());
	assert!(complete(&session, "notes.md", 9, 0).is_empty());
}

#[test]
fn resolve_fills_reference_detail() {
	let (session, _rx) = session();
	let item = completion::reference(
		&alps_analysis::Descriptor::new("contact", None),
		"Reference".into(),
		None,
	);
	let resolved = session.resolve(item);
	assert_eq!(resolved.kind, Some(CompletionItemKind::REFERENCE));
	assert_eq!(resolved.detail.as_deref(), Some("Descriptor ID: contact"));
}
