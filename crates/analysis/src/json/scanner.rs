//! Tokenizer for the tolerant JSON parser.
//!
//! Never fails: unknown input becomes [`Token::Unknown`] and malformed literals carry a
//! [`ScanError`] next to their token so the parser can report them and keep going.

/// A lexical token.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Token {
	/// `{`
	OpenBrace,
	/// `}`
	CloseBrace,
	/// `[`
	OpenBracket,
	/// `]`
	CloseBracket,
	/// `,`
	Comma,
	/// `:`
	Colon,
	/// `null`
	Null,
	/// `true`
	True,
	/// `false`
	False,
	/// A string literal, terminated or not.
	String,
	/// A number literal.
	Number,
	/// `// ...`
	LineComment,
	/// `/* ... */`
	BlockComment,
	/// A line break.
	LineBreak,
	/// Horizontal whitespace.
	Trivia,
	/// Anything else.
	Unknown,
	/// End of input.
	Eof,
}

/// A problem found while scanning the current token.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ScanError {
	/// No problem.
	#[default]
	None,
	/// A block comment missing its `*/`.
	UnexpectedEndOfComment,
	/// A string missing its closing quote.
	UnexpectedEndOfString,
	/// A number missing its fraction or exponent digits.
	UnexpectedEndOfNumber,
	/// A `\u` escape without four hex digits.
	InvalidUnicode,
	/// An unknown `\` escape.
	InvalidEscapeCharacter,
	/// A control character inside a string.
	InvalidCharacter,
}

/// Pull tokenizer over a JSON text.
#[derive(Debug)]
pub struct Scanner<'a> {
	text: &'a str,
	pos: usize,
	token: Token,
	token_offset: usize,
	value: String,
	error: ScanError,
}

impl<'a> Scanner<'a> {
	/// Creates a scanner positioned at the start of `text`.
	#[must_use]
	pub fn new(text: &'a str) -> Self {
		Self {
			text,
			pos: 0,
			token: Token::Unknown,
			token_offset: 0,
			value: String::new(),
			error: ScanError::None,
		}
	}

	/// The most recently scanned token.
	#[must_use]
	pub fn token(&self) -> Token {
		self.token
	}

	/// Byte offset of the current token.
	#[must_use]
	pub fn token_offset(&self) -> usize {
		self.token_offset
	}

	/// Byte length of the current token.
	#[must_use]
	pub fn token_len(&self) -> usize {
		self.pos - self.token_offset
	}

	/// Decoded value of the current token; the unescaped content for strings.
	#[must_use]
	pub fn token_value(&self) -> &str {
		&self.value
	}

	/// Problem found in the current token.
	#[must_use]
	pub fn token_error(&self) -> ScanError {
		self.error
	}

	fn byte(&self, at: usize) -> Option<u8> {
		self.text.as_bytes().get(at).copied()
	}

	/// Advances to and returns the next token.
	pub fn scan(&mut self) -> Token {
		self.value.clear();
		self.error = ScanError::None;
		self.token_offset = self.pos;
		self.token = self.scan_token();
		self.token
	}

	fn scan_token(&mut self) -> Token {
		let Some(b) = self.byte(self.pos) else {
			self.token_offset = self.text.len();
			return Token::Eof;
		};

		if is_whitespace(b) {
			while self.byte(self.pos).is_some_and(is_whitespace) {
				self.pos += 1;
			}
			self.value.push_str(&self.text[self.token_offset..self.pos]);
			return Token::Trivia;
		}
		if is_line_break(b) {
			self.pos += 1;
			if b == b'\r' && self.byte(self.pos) == Some(b'\n') {
				self.pos += 1;
			}
			self.value.push_str(&self.text[self.token_offset..self.pos]);
			return Token::LineBreak;
		}

		let single = match b {
			b'{' => Some(Token::OpenBrace),
			b'}' => Some(Token::CloseBrace),
			b'[' => Some(Token::OpenBracket),
			b']' => Some(Token::CloseBracket),
			b':' => Some(Token::Colon),
			b',' => Some(Token::Comma),
			_ => None,
		};
		if let Some(token) = single {
			self.pos += 1;
			self.value.push(char::from(b));
			return token;
		}

		match b {
			b'"' => {
				self.pos += 1;
				self.scan_string();
				Token::String
			}
			b'/' => self.scan_comment(),
			b'-' => {
				self.pos += 1;
				self.value.push('-');
				if !self.byte(self.pos).is_some_and(|b| b.is_ascii_digit()) {
					return Token::Unknown;
				}
				self.scan_number();
				Token::Number
			}
			b'0'..=b'9' => {
				self.scan_number();
				Token::Number
			}
			_ => self.scan_word(),
		}
	}

	fn scan_comment(&mut self) -> Token {
		let start = self.pos;
		match self.byte(self.pos + 1) {
			Some(b'/') => {
				self.pos += 2;
				while self.byte(self.pos).is_some_and(|b| !is_line_break(b)) {
					self.pos += 1;
				}
				self.value.push_str(&self.text[start..self.pos]);
				Token::LineComment
			}
			Some(b'*') => {
				match self.text[start + 2..].find("*/") {
					Some(i) => self.pos = start + 2 + i + 2,
					None => {
						self.pos = self.text.len();
						self.error = ScanError::UnexpectedEndOfComment;
					}
				}
				self.value.push_str(&self.text[start..self.pos]);
				Token::BlockComment
			}
			_ => {
				self.pos += 1;
				self.value.push('/');
				Token::Unknown
			}
		}
	}

	fn scan_word(&mut self) -> Token {
		while self.byte(self.pos).is_some_and(is_unknown_content) {
			self.pos += 1;
		}
		if self.pos == self.token_offset {
			let width = self.text[self.pos..]
				.chars()
				.next()
				.map_or(1, char::len_utf8);
			self.pos += width;
		}
		self.value.push_str(&self.text[self.token_offset..self.pos]);
		match self.value.as_str() {
			"true" => Token::True,
			"false" => Token::False,
			"null" => Token::Null,
			_ => Token::Unknown,
		}
	}

	fn scan_number(&mut self) {
		let start = self.pos;
		let digits = |scanner: &mut Self| {
			while scanner.byte(scanner.pos).is_some_and(|b| b.is_ascii_digit()) {
				scanner.pos += 1;
			}
		};

		if self.byte(self.pos) == Some(b'0') {
			self.pos += 1;
		} else {
			digits(self);
		}

		if self.byte(self.pos) == Some(b'.') {
			self.pos += 1;
			if !self.byte(self.pos).is_some_and(|b| b.is_ascii_digit()) {
				self.error = ScanError::UnexpectedEndOfNumber;
				self.value.push_str(&self.text[start..self.pos]);
				return;
			}
			digits(self);
		}

		let mut end = self.pos;
		if matches!(self.byte(self.pos), Some(b'e' | b'E')) {
			self.pos += 1;
			if matches!(self.byte(self.pos), Some(b'+' | b'-')) {
				self.pos += 1;
			}
			if self.byte(self.pos).is_some_and(|b| b.is_ascii_digit()) {
				digits(self);
				end = self.pos;
			} else {
				self.error = ScanError::UnexpectedEndOfNumber;
			}
		}
		self.value.push_str(&self.text[start..end]);
	}

	fn scan_string(&mut self) {
		let mut start = self.pos;
		loop {
			let Some(b) = self.byte(self.pos) else {
				self.value.push_str(&self.text[start..self.pos]);
				self.error = ScanError::UnexpectedEndOfString;
				return;
			};
			match b {
				b'"' => {
					self.value.push_str(&self.text[start..self.pos]);
					self.pos += 1;
					return;
				}
				b'\\' => {
					self.value.push_str(&self.text[start..self.pos]);
					self.pos += 1;
					let Some(escape) = self.byte(self.pos) else {
						self.error = ScanError::UnexpectedEndOfString;
						return;
					};
					self.pos += 1;
					match escape {
						b'"' => self.value.push('"'),
						b'\\' => self.value.push('\\'),
						b'/' => self.value.push('/'),
						b'b' => self.value.push('\u{8}'),
						b'f' => self.value.push('\u{c}'),
						b'n' => self.value.push('\n'),
						b'r' => self.value.push('\r'),
						b't' => self.value.push('\t'),
						b'u' => self.scan_unicode_escape(),
						_ => self.error = ScanError::InvalidEscapeCharacter,
					}
					start = self.pos;
				}
				b if is_line_break(b) => {
					self.value.push_str(&self.text[start..self.pos]);
					self.error = ScanError::UnexpectedEndOfString;
					return;
				}
				b if b < 0x20 => {
					self.error = ScanError::InvalidCharacter;
					self.pos += 1;
				}
				_ => self.pos += 1,
			}
		}
	}

	/// Decodes the four hex digits after `\u`, pairing surrogates when a low surrogate
	/// escape follows. Lone surrogates decode to U+FFFD.
	fn scan_unicode_escape(&mut self) {
		let Some(unit) = self.hex4(self.pos) else {
			self.error = ScanError::InvalidUnicode;
			return;
		};
		self.pos += 4;

		if (0xD800..0xDC00).contains(&unit) && self.text[self.pos..].starts_with("\\u") {
			if let Some(low @ 0xDC00..=0xDFFF) = self.hex4(self.pos + 2) {
				self.pos += 6;
				let code = 0x10000 + ((unit - 0xD800) << 10) + (low - 0xDC00);
				self.value
					.push(char::from_u32(code).unwrap_or(char::REPLACEMENT_CHARACTER));
				return;
			}
		}
		self.value
			.push(char::from_u32(unit).unwrap_or(char::REPLACEMENT_CHARACTER));
	}

	fn hex4(&self, at: usize) -> Option<u32> {
		let digits = self.text.get(at..at + 4)?;
		if !digits.bytes().all(|b| b.is_ascii_hexdigit()) {
			return None;
		}
		u32::from_str_radix(digits, 16).ok()
	}
}

fn is_whitespace(b: u8) -> bool {
	matches!(b, b' ' | b'\t' | 0x0B | 0x0C)
}

fn is_line_break(b: u8) -> bool {
	matches!(b, b'\n' | b'\r')
}

fn is_unknown_content(b: u8) -> bool {
	!is_whitespace(b)
		&& !is_line_break(b)
		&& !matches!(b, b'{' | b'}' | b'[' | b']' | b'"' | b':' | b',' | b'/')
}
