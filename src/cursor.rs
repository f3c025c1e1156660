//! Character cursor over the lexer input.
use crate::lexing::{Error, Token, TokenKind};
use locspan::{Meta, Span};
use std::collections::VecDeque;

/// Cursor over the input of a single lexing pass.
///
/// The cursor keeps track of the start of the pending token, the current
/// reading position and the byte width of the last consumed character, so
/// that one character can be pushed back with [`Cursor::backup`].
/// Emitted tokens are queued until the lexer hands them out.
pub struct Cursor<'a> {
	input: &'a str,
	start: usize,
	pos: usize,
	width: Option<usize>,
	emitted: VecDeque<Meta<Token, Span>>,
}

impl<'a> Cursor<'a> {
	pub fn new(input: &'a str) -> Self {
		Self {
			input,
			start: 0,
			pos: 0,
			width: None,
			emitted: VecDeque::new(),
		}
	}

	/// Returns the next character without consuming it.
	pub fn peek(&self) -> Option<char> {
		self.remaining().chars().next()
	}

	/// Consumes the next character.
	///
	/// Returns `None` at the end of the input, in which case the position is
	/// left untouched.
	pub fn advance(&mut self) -> Option<char> {
		match self.peek() {
			Some(c) => {
				let width = c.len_utf8();
				self.pos += width;
				self.width = Some(width);
				Some(c)
			}
			None => {
				self.width = Some(0);
				None
			}
		}
	}

	/// Consumes characters until `len` bytes have been consumed.
	///
	/// `len` must fall on a character boundary of the remaining input.
	pub fn advance_by(&mut self, len: usize) {
		let target = self.pos + len;
		while self.pos < target {
			if self.advance().is_none() {
				break;
			}
		}
	}

	/// Pushes back the last consumed character.
	///
	/// Only one level of backup is supported.
	pub fn backup(&mut self) {
		debug_assert!(
			self.width.is_some(),
			"backup called twice without advancing"
		);
		if let Some(width) = self.width.take() {
			self.pos -= width;
		}
	}

	pub fn at_end(&self) -> bool {
		self.pos >= self.input.len()
	}

	/// Input from the current position to the end.
	pub fn remaining(&self) -> &'a str {
		&self.input[self.pos..]
	}

	/// Input consumed since the last emitted or ignored token.
	pub fn current(&self) -> &'a str {
		&self.input[self.start..self.pos]
	}

	pub fn position(&self) -> usize {
		self.pos
	}

	/// Span of the pending input.
	pub fn span(&self) -> Span {
		Span::new(self.start, self.pos)
	}

	/// Emits the pending input as a token of the given kind, with surrounding
	/// whitespace trimmed.
	pub fn emit(&mut self, kind: TokenKind) {
		let raw = self.current();
		let text = raw.trim();
		let offset = self.start + (raw.len() - raw.trim_start().len());
		self.push(kind, text.to_owned(), Span::new(offset, offset + text.len()));
	}

	/// Emits the pending input byte for byte.
	///
	/// Used for IRI and literal bodies, whose text must be preserved exactly.
	pub fn emit_verbatim(&mut self, kind: TokenKind) {
		let text = self.current().to_owned();
		let span = self.span();
		self.push(kind, text, span);
	}

	/// Emits an error token covering the pending input.
	pub fn error(&mut self, e: Error) {
		let span = self.span();
		self.push(TokenKind::Error(e), e.to_string(), span);
	}

	/// Discards the pending input.
	pub fn ignore(&mut self) {
		self.start = self.pos;
	}

	/// Skips whitespace.
	///
	/// If the end of input is reached, an `EndOfInput` token is emitted and
	/// `false` is returned.
	pub fn skip_whitespace(&mut self) -> bool {
		if self.skip_blank() {
			true
		} else {
			self.emit(TokenKind::EndOfInput);
			false
		}
	}

	/// Skips whitespace without emitting anything.
	///
	/// Returns `false` if the end of input is reached.
	pub fn skip_blank(&mut self) -> bool {
		while let Some(c) = self.peek() {
			if !c.is_whitespace() {
				break;
			}

			self.advance();
		}

		self.ignore();
		!self.at_end()
	}

	/// Takes the oldest emitted token.
	pub fn take(&mut self) -> Option<Meta<Token, Span>> {
		self.emitted.pop_front()
	}

	fn push(&mut self, kind: TokenKind, text: String, span: Span) {
		self.emitted.push_back(Meta(Token::new(kind, text), span));
		self.start = self.pos;
	}
}
