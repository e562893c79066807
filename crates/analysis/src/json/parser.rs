//! Error-recovering JSON parser driving a [`Visitor`].
//!
//! The parser never stops at the first syntax error. Each error is reported to the visitor
//! and the parser skips ahead to a token it can resume from, so one stray character yields
//! one error instead of a failed parse. Visitors can end the walk early by returning
//! [`ControlFlow::Break`].

use std::ops::ControlFlow;

use super::scanner::{ScanError, Scanner, Token};

/// Result of a visitor callback.
pub type Flow = ControlFlow<()>;

/// A literal value.
#[derive(Debug, Clone, PartialEq)]
pub enum Literal {
	/// A string; `terminated` is false when the closing quote is missing.
	String {
		/// Unescaped content.
		value: String,
		/// Whether the closing quote was found.
		terminated: bool,
	},
	/// A number.
	Number(f64),
	/// `true` or `false`.
	Bool(bool),
	/// `null`.
	Null,
}

/// Structural syntax errors.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ParseErrorCode {
	/// Unknown input between tokens.
	InvalidSymbol,
	/// A number that does not parse.
	InvalidNumberFormat,
	/// An object member without a string key.
	PropertyNameExpected,
	/// A missing value.
	ValueExpected,
	/// A key without `:`.
	ColonExpected,
	/// Two members or elements without `,` between them.
	CommaExpected,
	/// An object missing its `}`.
	CloseBraceExpected,
	/// An array missing its `]`.
	CloseBracketExpected,
	/// Content after the top-level value.
	EndOfFileExpected,
	/// A comment where comments are not allowed.
	InvalidCommentToken,
	/// A block comment missing its `*/`.
	UnexpectedEndOfComment,
	/// A string missing its closing quote.
	UnexpectedEndOfString,
	/// A number missing its fraction or exponent digits.
	UnexpectedEndOfNumber,
	/// A malformed `\u` escape.
	InvalidUnicode,
	/// An unknown `\` escape.
	InvalidEscapeCharacter,
	/// A control character inside a string.
	InvalidCharacter,
}

impl ParseErrorCode {
	/// Human-readable description shown to users.
	#[must_use]
	pub const fn message(self) -> &'static str {
		match self {
			Self::InvalidSymbol => "Invalid symbol",
			Self::InvalidNumberFormat => "Invalid number format",
			Self::PropertyNameExpected => "Property name expected",
			Self::ValueExpected => "Value expected",
			Self::ColonExpected => "Colon expected",
			Self::CommaExpected => "Comma expected",
			Self::CloseBraceExpected => "Closing brace expected",
			Self::CloseBracketExpected => "Closing bracket expected",
			Self::EndOfFileExpected => "End of file expected",
			Self::InvalidCommentToken => "Invalid comment token",
			Self::UnexpectedEndOfComment => "Unexpected end of comment",
			Self::UnexpectedEndOfString => "Unexpected end of string",
			Self::UnexpectedEndOfNumber => "Unexpected end of number",
			Self::InvalidUnicode => "Invalid unicode",
			Self::InvalidEscapeCharacter => "Invalid escape character",
			Self::InvalidCharacter => "Invalid character",
		}
	}
}

/// A syntax error located by byte offset and length.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ParseError {
	/// What went wrong.
	pub code: ParseErrorCode,
	/// Byte offset of the offending token.
	pub offset: usize,
	/// Byte length of the offending token.
	pub length: usize,
}

/// Parser options.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ParseOptions {
	/// Accept `,` before `}` and `]`.
	pub allow_trailing_comma: bool,
	/// Accept `//` and `/* */` comments.
	pub allow_comments: bool,
	/// Accept a document without any value.
	pub allow_empty_content: bool,
}

impl Default for ParseOptions {
	fn default() -> Self {
		Self {
			allow_trailing_comma: true,
			allow_comments: true,
			allow_empty_content: false,
		}
	}
}

/// Callbacks invoked while parsing. Every method defaults to continuing.
#[allow(unused_variables)]
pub trait Visitor {
	/// `{` at `offset`.
	fn on_object_begin(&mut self, offset: usize, length: usize) -> Flow {
		Flow::Continue(())
	}

	/// An object key.
	fn on_object_property(&mut self, name: &str, offset: usize, length: usize) -> Flow {
		Flow::Continue(())
	}

	/// End of an object; `offset` is that of the `}` or of the token where it was expected.
	fn on_object_end(&mut self, offset: usize, length: usize) -> Flow {
		Flow::Continue(())
	}

	/// `[` at `offset`.
	fn on_array_begin(&mut self, offset: usize, length: usize) -> Flow {
		Flow::Continue(())
	}

	/// End of an array; `offset` is that of the `]` or of the token where it was expected.
	fn on_array_end(&mut self, offset: usize, length: usize) -> Flow {
		Flow::Continue(())
	}

	/// A literal value.
	fn on_literal_value(&mut self, value: Literal, offset: usize, length: usize) -> Flow {
		Flow::Continue(())
	}

	/// A `:` or `,`.
	fn on_separator(&mut self, separator: char, offset: usize, length: usize) -> Flow {
		Flow::Continue(())
	}

	/// A syntax error.
	fn on_error(&mut self, error: ParseError) -> Flow {
		Flow::Continue(())
	}
}

/// Parses `text`, reporting its structure to `visitor`.
pub fn visit<V: Visitor>(text: &str, visitor: &mut V, options: ParseOptions) {
	let mut parser = Parser {
		scanner: Scanner::new(text),
		visitor,
		options,
	};
	let _ = parser.document();
}

/// Returns every syntax error in `text`, in document order.
#[must_use]
pub fn parse_errors(text: &str, options: ParseOptions) -> Vec<ParseError> {
	struct Errors(Vec<ParseError>);

	impl Visitor for Errors {
		fn on_error(&mut self, error: ParseError) -> Flow {
			self.0.push(error);
			Flow::Continue(())
		}
	}

	let mut errors = Errors(Vec::new());
	visit(text, &mut errors, options);
	errors.0
}

struct Parser<'a, 'v, V> {
	scanner: Scanner<'a>,
	visitor: &'v mut V,
	options: ParseOptions,
}

const STOP_AT_MEMBER_END: &[Token] = &[Token::CloseBrace, Token::Comma];
const STOP_AT_ELEMENT_END: &[Token] = &[Token::CloseBracket, Token::Comma];

impl<V: Visitor> Parser<'_, '_, V> {
	fn document(&mut self) -> Flow {
		self.scan_next()?;
		if self.scanner.token() == Token::Eof {
			if !self.options.allow_empty_content {
				self.error(ParseErrorCode::ValueExpected, &[], &[])?;
			}
			return Flow::Continue(());
		}
		if !self.value()? {
			return self.error(ParseErrorCode::ValueExpected, &[], &[]);
		}
		if self.scanner.token() != Token::Eof {
			self.error(ParseErrorCode::EndOfFileExpected, &[], &[])?;
		}
		Flow::Continue(())
	}

	/// Scans to the next significant token, reporting scanner errors on the way.
	fn scan_next(&mut self) -> ControlFlow<(), Token> {
		loop {
			let token = self.scanner.scan();
			let code = match self.scanner.token_error() {
				ScanError::None => None,
				ScanError::UnexpectedEndOfComment => self
					.options
					.allow_comments
					.then_some(ParseErrorCode::UnexpectedEndOfComment),
				ScanError::UnexpectedEndOfString => Some(ParseErrorCode::UnexpectedEndOfString),
				ScanError::UnexpectedEndOfNumber => Some(ParseErrorCode::UnexpectedEndOfNumber),
				ScanError::InvalidUnicode => Some(ParseErrorCode::InvalidUnicode),
				ScanError::InvalidEscapeCharacter => Some(ParseErrorCode::InvalidEscapeCharacter),
				ScanError::InvalidCharacter => Some(ParseErrorCode::InvalidCharacter),
			};
			if let Some(code) = code {
				self.report(code)?;
			}

			match token {
				Token::LineComment | Token::BlockComment => {
					if !self.options.allow_comments {
						self.report(ParseErrorCode::InvalidCommentToken)?;
					}
				}
				Token::Unknown => self.report(ParseErrorCode::InvalidSymbol)?,
				Token::Trivia | Token::LineBreak => {}
				token => return ControlFlow::Continue(token),
			}
		}
	}

	fn report(&mut self, code: ParseErrorCode) -> Flow {
		self.visitor.on_error(ParseError {
			code,
			offset: self.scanner.token_offset(),
			length: self.scanner.token_len(),
		})
	}

	/// Reports `code` at the current token, then skips ahead: past the first token in
	/// `skip_after`, or up to the first token in `skip_until`.
	fn error(&mut self, code: ParseErrorCode, skip_after: &[Token], skip_until: &[Token]) -> Flow {
		self.report(code)?;
		if skip_after.is_empty() && skip_until.is_empty() {
			return Flow::Continue(());
		}
		let mut token = self.scanner.token();
		while token != Token::Eof {
			if skip_after.contains(&token) {
				self.scan_next()?;
				break;
			}
			if skip_until.contains(&token) {
				break;
			}
			token = self.scan_next()?;
		}
		Flow::Continue(())
	}

	fn value(&mut self) -> ControlFlow<(), bool> {
		match self.scanner.token() {
			Token::OpenBracket => self.array(),
			Token::OpenBrace => self.object(),
			Token::String => self.string(true),
			_ => self.literal(),
		}
	}

	fn string(&mut self, is_value: bool) -> ControlFlow<(), bool> {
		let offset = self.scanner.token_offset();
		let length = self.scanner.token_len();
		if is_value {
			let value = Literal::String {
				value: self.scanner.token_value().to_owned(),
				terminated: self.scanner.token_error() != ScanError::UnexpectedEndOfString,
			};
			self.visitor.on_literal_value(value, offset, length)?;
		} else {
			let name = self.scanner.token_value().to_owned();
			self.visitor.on_object_property(&name, offset, length)?;
		}
		self.scan_next()?;
		ControlFlow::Continue(true)
	}

	fn literal(&mut self) -> ControlFlow<(), bool> {
		let offset = self.scanner.token_offset();
		let length = self.scanner.token_len();
		let value = match self.scanner.token() {
			Token::Number => match self.scanner.token_value().parse::<f64>() {
				Ok(n) => Literal::Number(n),
				Err(_) => {
					self.error(ParseErrorCode::InvalidNumberFormat, &[], &[])?;
					Literal::Number(0.0)
				}
			},
			Token::Null => Literal::Null,
			Token::True => Literal::Bool(true),
			Token::False => Literal::Bool(false),
			_ => return ControlFlow::Continue(false),
		};
		self.visitor.on_literal_value(value, offset, length)?;
		self.scan_next()?;
		ControlFlow::Continue(true)
	}

	fn separator(&mut self, separator: char) -> Flow {
		self.visitor.on_separator(
			separator,
			self.scanner.token_offset(),
			self.scanner.token_len(),
		)
	}

	fn property(&mut self) -> ControlFlow<(), bool> {
		if self.scanner.token() != Token::String {
			self.error(ParseErrorCode::PropertyNameExpected, &[], STOP_AT_MEMBER_END)?;
			return ControlFlow::Continue(false);
		}
		self.string(false)?;
		if self.scanner.token() == Token::Colon {
			self.separator(':')?;
			self.scan_next()?;
			if !self.value()? {
				self.error(ParseErrorCode::ValueExpected, &[], STOP_AT_MEMBER_END)?;
			}
		} else {
			self.error(ParseErrorCode::ColonExpected, &[], STOP_AT_MEMBER_END)?;
		}
		ControlFlow::Continue(true)
	}

	fn object(&mut self) -> ControlFlow<(), bool> {
		self.visitor
			.on_object_begin(self.scanner.token_offset(), self.scanner.token_len())?;
		self.scan_next()?;
		let mut needs_comma = false;
		while !matches!(self.scanner.token(), Token::CloseBrace | Token::Eof) {
			if self.scanner.token() == Token::Comma {
				if !needs_comma {
					self.error(ParseErrorCode::ValueExpected, &[], &[])?;
				}
				self.separator(',')?;
				self.scan_next()?;
				if self.scanner.token() == Token::CloseBrace && self.options.allow_trailing_comma {
					break;
				}
			} else if needs_comma {
				self.error(ParseErrorCode::CommaExpected, &[], &[])?;
			}
			if !self.property()? {
				self.error(ParseErrorCode::ValueExpected, &[], STOP_AT_MEMBER_END)?;
			}
			needs_comma = true;
		}
		self.visitor
			.on_object_end(self.scanner.token_offset(), self.scanner.token_len())?;
		if self.scanner.token() == Token::CloseBrace {
			self.scan_next()?;
		} else {
			self.error(ParseErrorCode::CloseBraceExpected, &[Token::CloseBrace], &[])?;
		}
		ControlFlow::Continue(true)
	}

	fn array(&mut self) -> ControlFlow<(), bool> {
		self.visitor
			.on_array_begin(self.scanner.token_offset(), self.scanner.token_len())?;
		self.scan_next()?;
		let mut needs_comma = false;
		while !matches!(self.scanner.token(), Token::CloseBracket | Token::Eof) {
			if self.scanner.token() == Token::Comma {
				if !needs_comma {
					self.error(ParseErrorCode::ValueExpected, &[], &[])?;
				}
				self.separator(',')?;
				self.scan_next()?;
				if self.scanner.token() == Token::CloseBracket && self.options.allow_trailing_comma {
					break;
				}
			} else if needs_comma {
				self.error(ParseErrorCode::CommaExpected, &[], &[])?;
			}
			if !self.value()? {
				self.error(ParseErrorCode::ValueExpected, &[], STOP_AT_ELEMENT_END)?;
			}
			needs_comma = true;
		}
		self.visitor
			.on_array_end(self.scanner.token_offset(), self.scanner.token_len())?;
		if self.scanner.token() == Token::CloseBracket {
			self.scan_next()?;
		} else {
			self.error(ParseErrorCode::CloseBracketExpected, &[Token::CloseBracket], &[])?;
		}
		ControlFlow::Continue(true)
	}
}
