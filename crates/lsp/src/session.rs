//! Worker state shared by all handlers.

use std::collections::HashMap;

use alps_analysis::{LineIndex, OffsetEncoding, completion};
use lsp_types::{
	CompletionItem, CompletionList, CompletionOptions, CompletionParams, CompletionResponse,
	DidChangeTextDocumentParams, DidCloseTextDocumentParams, DidOpenTextDocumentParams,
	InitializeParams, InitializeResult, PositionEncodingKind, ServerCapabilities, ServerInfo,
	TextDocumentSyncCapability, TextDocumentSyncKind, TextDocumentSyncOptions, Uri,
};
use tokio::time::Instant;
use tracing::{debug, info, warn};

use crate::config::ServerConfig;
use crate::document::Document;
use crate::panic;
use crate::socket::ClientSocket;

/// Name reported in `serverInfo`.
pub const SERVER_NAME: &str = "alps-language-server";

/// Open documents, negotiated settings and the channel to the client.
///
/// Owned by the main loop; handlers receive it by `&mut`, so there is exactly one writer.
#[derive(Debug)]
pub struct Session {
	config: ServerConfig,
	encoding: OffsetEncoding,
	documents: HashMap<Uri, Document>,
	client: ClientSocket,
}

impl Session {
	/// Creates a session with `config` as the defaults `initializationOptions` overlay.
	#[must_use]
	pub fn new(config: ServerConfig, client: ClientSocket) -> Self {
		Self {
			config,
			encoding: OffsetEncoding::Utf16,
			documents: HashMap::new(),
			client,
		}
	}

	/// The effective configuration.
	#[must_use]
	pub fn config(&self) -> &ServerConfig {
		&self.config
	}

	/// The negotiated position encoding.
	#[must_use]
	pub fn encoding(&self) -> OffsetEncoding {
		self.encoding
	}

	/// Returns an open document.
	#[must_use]
	pub fn document(&self, uri: &Uri) -> Option<&Document> {
		self.documents.get(uri)
	}

	/// Applies client options and capabilities and reports the server capabilities.
	pub fn initialize(&mut self, params: InitializeParams) -> InitializeResult {
		if let Some(options) = &params.initialization_options {
			match self.config.with_options(options) {
				Ok(config) => self.config = config,
				Err(err) => warn!(error = %err, "ignoring invalid initializationOptions"),
			}
		}

		let utf8 = params
			.capabilities
			.general
			.as_ref()
			.and_then(|general| general.position_encodings.as_ref())
			.is_some_and(|encodings| encodings.contains(&PositionEncodingKind::UTF8));
		let position_encoding = if utf8 {
			self.encoding = OffsetEncoding::Utf8;
			PositionEncodingKind::UTF8
		} else {
			self.encoding = OffsetEncoding::Utf16;
			PositionEncodingKind::UTF16
		};
		info!(
			encoding = ?self.encoding,
			debounce_ms = self.config.validation_debounce_ms,
			warning_delay_ms = self.config.warning_delay_ms,
			"session initialized"
		);

		InitializeResult {
			capabilities: ServerCapabilities {
				position_encoding: Some(position_encoding),
				text_document_sync: Some(TextDocumentSyncCapability::Options(TextDocumentSyncOptions {
					open_close: Some(true),
					change: Some(TextDocumentSyncKind::INCREMENTAL),
					..TextDocumentSyncOptions::default()
				})),
				completion_provider: Some(CompletionOptions {
					resolve_provider: Some(true),
					trigger_characters: Some(self.config.trigger_characters.clone()),
					..CompletionOptions::default()
				}),
				..ServerCapabilities::default()
			},
			server_info: Some(ServerInfo {
				name: SERVER_NAME.into(),
				version: Some(env!("CARGO_PKG_VERSION").into()),
			}),
		}
	}

	/// Starts tracking a document and schedules its first validation.
	pub fn open(&mut self, params: DidOpenTextDocumentParams, now: Instant) {
		let item = params.text_document;
		let dialect = self.config.dialect(&item.language_id, &item.uri);
		info!(uri = %item.uri.as_str(), language_id = %item.language_id, ?dialect, "document opened");
		let mut document = Document::new(item, dialect, self.config.timing());
		document.refresh(now);
		self.documents.insert(document.uri().clone(), document);
	}

	/// Applies content changes, re-extracts descriptors and restarts the debounce.
	pub fn change(&mut self, params: DidChangeTextDocumentParams, now: Instant) {
		let uri = params.text_document.uri;
		let Some(document) = self.documents.get_mut(&uri) else {
			warn!(uri = %uri.as_str(), "change for a document that is not open");
			return;
		};
		if let Err(err) =
			document.apply_changes(params.text_document.version, &params.content_changes, self.encoding)
		{
			warn!(uri = %uri.as_str(), error = %err, "could not apply change");
		}
		document.refresh(now);
	}

	/// Stops tracking a document and clears its diagnostics on the client.
	pub fn close(&mut self, params: DidCloseTextDocumentParams) {
		let uri = params.text_document.uri;
		if self.documents.remove(&uri).is_none() {
			debug!(uri = %uri.as_str(), "close for a document that is not open");
		}
		if let Err(err) = self.client.publish_diagnostics(uri, Vec::new(), None) {
			warn!(error = %err, "could not clear diagnostics");
		}
	}

	/// Completion items for a cursor position. Anything unexpected yields an empty list.
	#[must_use]
	pub fn completion(&self, params: CompletionParams) -> CompletionResponse {
		let position = params.text_document_position;
		let items = self
			.documents
			.get(&position.text_document.uri)
			.and_then(|document| Some((document, document.dialect()?)))
			.map(|(document, dialect)| {
				let text = document.text();
				let Some(offset) = LineIndex::new(&text, self.encoding).offset(position.position) else {
					debug!(uri = %document.uri().as_str(), position = ?position.position, "completion outside the document");
					return Vec::new();
				};
				panic::or_else(
					"completion",
					|| dialect.analyzer().complete(&text, offset, document.descriptors(), self.encoding),
					Vec::new,
				)
			})
			.unwrap_or_default();
		debug!(count = items.len(), "completion");
		CompletionResponse::List(CompletionList {
			is_incomplete: false,
			items,
		})
	}

	/// Fills in detail and documentation of a completion item.
	#[must_use]
	pub fn resolve(&self, item: CompletionItem) -> CompletionItem {
		let original = item.clone();
		panic::or_else("completion resolve", || completion::resolve(item), || original)
	}

	/// The earliest pipeline deadline over all documents.
	#[must_use]
	pub fn next_deadline(&self) -> Option<Instant> {
		self.documents.values().filter_map(Document::deadline).min()
	}

	/// Advances every document's pipeline and publishes what is due.
	pub fn poll(&mut self, now: Instant) {
		for document in self.documents.values_mut() {
			let Some(diagnostics) = document.poll(now, self.encoding) else {
				continue;
			};
			let uri = document.uri().clone();
			if let Err(err) = self.client.publish_diagnostics(uri, diagnostics, Some(document.version())) {
				warn!(error = %err, "could not publish diagnostics");
			}
		}
	}
}

#[cfg(test)]
mod tests;
