//! Turtle lexer.
//!
//! The lexer is a state machine. Each [`State`] reads some input through a
//! [`Cursor`], guided by the [`classify`] predicates, and returns the next
//! state. Tokens are handed out lazily: the machine only runs until the next
//! token has been emitted. The stream always ends with an `EndOfInput` or an
//! `Error` token.
use crate::classify;
use crate::cursor::Cursor;
use locspan::{Meta, Span};
use std::fmt;
use std::iter::FusedIterator;
use std::sync::mpsc;
use std::thread;

const PREFIX: &str = "@prefix";
const BASE: &str = "@base";
const SPARQL_PREFIX: &str = "PREFIX";
const SPARQL_BASE: &str = "BASE";

/// Lexing error.
#[derive(Debug, Clone, Copy, PartialEq, Eq, thiserror::Error)]
pub enum Error {
	#[error("unexpected end of input")]
	UnexpectedEndOfInput,

	#[error("unterminated string literal")]
	UnterminatedLiteral,

	#[error("unterminated IRI reference")]
	UnterminatedIri,

	#[error("unknown directive")]
	UnknownDirective,

	#[error("malformed verb")]
	MalformedVerb,

	#[error("unexpected character `{0}`")]
	Unexpected(char),
}

impl From<Option<char>> for Error {
	fn from(value: Option<char>) -> Self {
		match value {
			Some(c) => Self::Unexpected(c),
			None => Self::UnexpectedEndOfInput,
		}
	}
}

/// Token kind.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TokenKind {
	Error(Error),
	EndOfInput,

	/// Label of a prefix declaration, without the `:`.
	PrefixDeclLabel,

	/// `@base` or `BASE` keyword.
	BaseDecl,

	/// IRI reference, without the angle brackets.
	Iri,

	PrefixedName,
	BlankNodeLabel,

	/// String literal, without the quotes.
	Literal,

	/// Language tag, without the `@`.
	LangTag,

	/// `^^`
	DatatypeMarker,

	Numeric,
	Boolean,

	/// The `a` verb.
	A,

	/// `;`
	ObjectSeparator,

	/// `,`
	ObjectListSeparator,

	/// `.`
	EndOfStatement,

	CollectionOpen,
	CollectionClose,
	BlankNodePropertyListOpen,
	BlankNodePropertyListClose,
	Comment,
}

impl fmt::Display for TokenKind {
	fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
		match self {
			Self::Error(e) => write!(f, "error ({e})"),
			Self::EndOfInput => write!(f, "end of input"),
			Self::PrefixDeclLabel => write!(f, "prefix declaration"),
			Self::BaseDecl => write!(f, "base declaration"),
			Self::Iri => write!(f, "IRI reference"),
			Self::PrefixedName => write!(f, "prefixed name"),
			Self::BlankNodeLabel => write!(f, "blank node label"),
			Self::Literal => write!(f, "string literal"),
			Self::LangTag => write!(f, "language tag"),
			Self::DatatypeMarker => write!(f, "carets `^^`"),
			Self::Numeric => write!(f, "numeric literal"),
			Self::Boolean => write!(f, "boolean literal"),
			Self::A => write!(f, "keyword `a`"),
			Self::ObjectSeparator => write!(f, "semicolon `;`"),
			Self::ObjectListSeparator => write!(f, "comma `,`"),
			Self::EndOfStatement => write!(f, "dot `.`"),
			Self::CollectionOpen => write!(f, "opening `(`"),
			Self::CollectionClose => write!(f, "closing `)`"),
			Self::BlankNodePropertyListOpen => write!(f, "opening `[`"),
			Self::BlankNodePropertyListClose => write!(f, "closing `]`"),
			Self::Comment => write!(f, "comment"),
		}
	}
}

/// Token.
///
/// The text is the source text of the token, as written.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Token {
	kind: TokenKind,
	text: String,
}

impl Token {
	pub fn new(kind: TokenKind, text: String) -> Self {
		Self { kind, text }
	}

	pub fn kind(&self) -> TokenKind {
		self.kind
	}

	pub fn text(&self) -> &str {
		&self.text
	}

	pub fn into_text(self) -> String {
		self.text
	}
}

impl fmt::Display for Token {
	fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
		match self.kind {
			TokenKind::Error(e) => e.fmt(f),
			TokenKind::EndOfInput => write!(f, "end of input"),
			TokenKind::Iri => write!(f, "IRI reference <{}>", self.text),
			TokenKind::Literal => write!(f, "string literal \"{}\"", self.text),
			TokenKind::LangTag => write!(f, "language tag `@{}`", self.text),
			kind => write!(f, "{kind} `{}`", self.text),
		}
	}
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Delimiter {
	Parenthesis,
	Bracket,
}

impl Delimiter {
	fn open_kind(&self) -> TokenKind {
		match self {
			Self::Parenthesis => TokenKind::CollectionOpen,
			Self::Bracket => TokenKind::BlankNodePropertyListOpen,
		}
	}

	fn close_kind(&self) -> TokenKind {
		match self {
			Self::Parenthesis => TokenKind::CollectionClose,
			Self::Bracket => TokenKind::BlankNodePropertyListClose,
		}
	}
}

/// Position of a term in the statement being lexed.
///
/// Decides which state follows the term.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Role {
	Directive { dotted: bool },
	Subject,
	Verb,
	Object,
	Datatype,
}

impl Role {
	fn next(self) -> State {
		match self {
			Self::Directive { dotted } => State::DirectiveEnd { dotted },
			Self::Subject => State::Verb,
			Self::Verb => State::Object,
			Self::Object | Self::Datatype => State::AfterObject,
		}
	}
}

/// Collection or blank node property list being lexed.
#[derive(Debug, Clone, Copy)]
struct Frame {
	delimiter: Delimiter,
	role: Role,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum State {
	/// `statement*`, the initial state.
	Statement,
	Comment,
	Directive,
	PrefixLabel { dotted: bool },
	DirectiveEnd { dotted: bool },
	IriRef(Role),
	PrefixedName(Role),
	BlankNodeLabel(Role),
	Subject,
	Verb,

	/// After a `;`, or after a subject blank node property list.
	VerbOrEnd,
	Object,
	Literal,
	LiteralSuffix,
	Datatype,
	AfterObject,
	CollectionItem,
	PropertyListStart,

	/// An `EndOfInput` or `Error` token has been emitted.
	Halted,
}

/// Starts lexing `input`.
pub fn start(input: &str) -> Lexer<'_> {
	Lexer::new(input)
}

/// Lexer.
///
/// Changes a Turtle document into a `Token` iterator.
pub struct Lexer<'a> {
	cursor: Cursor<'a>,
	state: State,

	/// Open collections and blank node property lists, innermost last.
	open: Vec<Frame>,
}

impl<'a> Lexer<'a> {
	pub fn new(input: &'a str) -> Self {
		Self {
			cursor: Cursor::new(input),
			state: State::Statement,
			open: Vec::new(),
		}
	}

	/// Returns the token stream.
	///
	/// The stream is lazy and single-pass.
	pub fn tokens(self) -> impl Iterator<Item = Meta<Token, Span>> + 'a {
		self
	}

	/// Current nesting depth of collections and blank node property lists.
	pub fn depth(&self) -> usize {
		self.open.len()
	}

	pub fn is_halted(&self) -> bool {
		self.state == State::Halted
	}

	fn step(&mut self) {
		let state = self.state;
		log::trace!("{:?} at offset {}", state, self.cursor.position());
		self.state = match self.lex(state) {
			Ok(next) => next,
			Err(e) => {
				log::debug!("lexing error at offset {}: {e}", self.cursor.position());
				self.cursor.error(e);
				State::Halted
			}
		}
	}

	fn lex(&mut self, state: State) -> Result<State, Error> {
		match state {
			State::Statement => self.lex_statement(),
			State::Comment => {
				self.lex_comment();
				Ok(State::Statement)
			}
			State::Directive => self.lex_directive(),
			State::PrefixLabel { dotted } => self.lex_prefix_label(dotted),
			State::DirectiveEnd { dotted } => self.lex_directive_end(dotted),
			State::IriRef(role) => self.lex_iri_ref(role),
			State::PrefixedName(role) => self.lex_prefixed_name(role),
			State::BlankNodeLabel(role) => self.lex_blank_node_label(role),
			State::Subject => self.lex_subject(),
			State::Verb => self.lex_verb(),
			State::VerbOrEnd => self.lex_verb_or_end(),
			State::Object => self.lex_object(),
			State::Literal => self.lex_literal(),
			State::LiteralSuffix => self.lex_literal_suffix(),
			State::Datatype => self.lex_datatype(),
			State::AfterObject => self.lex_after_object(),
			State::CollectionItem => self.lex_collection_item(),
			State::PropertyListStart => self.lex_property_list_start(),
			State::Halted => Ok(State::Halted),
		}
	}

	fn lex_statement(&mut self) -> Result<State, Error> {
		if !self.cursor.skip_whitespace() {
			return Ok(State::Halted);
		}

		let rest = self.cursor.remaining();
		if classify::is_comment(rest) {
			Ok(State::Comment)
		} else if classify::is_directive(rest) {
			Ok(State::Directive)
		} else if classify::is_triples(rest) {
			Ok(State::Subject)
		} else if rest.starts_with('@') {
			Err(self.unknown_directive())
		} else {
			Err(self.unexpected())
		}
	}

	/// Lexes a comment, from the `#` to the end of the line.
	fn lex_comment(&mut self) {
		self.cursor.advance();
		self.cursor.ignore();
		while let Some(c) = self.cursor.advance() {
			if matches!(c, '\n' | '\r') {
				self.cursor.backup();
				break;
			}
		}

		self.cursor.emit(TokenKind::Comment);
	}

	/// Skips whitespace and comments inside a statement.
	fn skip_trivia(&mut self) -> Result<(), Error> {
		loop {
			if !self.cursor.skip_blank() {
				return Err(Error::UnexpectedEndOfInput);
			}

			if classify::is_comment(self.cursor.remaining()) {
				self.lex_comment()
			} else {
				return Ok(());
			}
		}
	}

	fn lex_directive(&mut self) -> Result<State, Error> {
		let rest = self.cursor.remaining();
		if classify::is_prefix_id(rest) {
			self.cursor.advance_by(PREFIX.len());
			self.cursor.ignore();
			Ok(State::PrefixLabel { dotted: true })
		} else if classify::is_base(rest) {
			self.cursor.advance_by(BASE.len());
			self.cursor.emit(TokenKind::BaseDecl);
			Ok(State::IriRef(Role::Directive { dotted: true }))
		} else if classify::is_sparql_prefix(rest) {
			self.cursor.advance_by(SPARQL_PREFIX.len());
			self.cursor.ignore();
			Ok(State::PrefixLabel { dotted: false })
		} else if classify::is_sparql_base(rest) {
			self.cursor.advance_by(SPARQL_BASE.len());
			self.cursor.emit(TokenKind::BaseDecl);
			Ok(State::IriRef(Role::Directive { dotted: false }))
		} else {
			Err(self.unknown_directive())
		}
	}

	fn lex_prefix_label(&mut self, dotted: bool) -> Result<State, Error> {
		if !self.cursor.skip_blank() {
			return Err(Error::UnexpectedEndOfInput);
		}

		self.scan_prefix_label();
		if self.cursor.peek() != Some(':') {
			return Err(self.unexpected());
		}

		self.cursor.emit(TokenKind::PrefixDeclLabel);
		self.cursor.advance();
		self.cursor.ignore();
		Ok(State::IriRef(Role::Directive { dotted }))
	}

	fn lex_directive_end(&mut self, dotted: bool) -> Result<State, Error> {
		if dotted {
			self.skip_trivia()?;
			if self.cursor.peek() != Some('.') {
				return Err(self.unexpected());
			}

			self.cursor.advance();
			self.cursor.ignore();
		}

		Ok(State::Statement)
	}

	/// Lexes an IRI reference, from the `<` to the closing `>`.
	///
	/// Escape sequences are not decoded.
	fn lex_iri_ref(&mut self, role: Role) -> Result<State, Error> {
		if !self.cursor.skip_blank() {
			return Err(Error::UnexpectedEndOfInput);
		}

		if self.cursor.peek() != Some('<') {
			return Err(self.unexpected());
		}

		self.cursor.advance();
		self.cursor.ignore();

		loop {
			match self.cursor.peek() {
				Some('>') => break,
				Some('\\') => {
					self.cursor.advance();
					if self.cursor.advance().is_none() {
						return Err(Error::UnterminatedIri);
					}
				}
				None | Some('\n' | '\r') => return Err(Error::UnterminatedIri),
				Some(
					c @ ('\u{00}'..='\u{20}' | '<' | '"' | '{' | '}' | '|' | '^' | '`'),
				) => return Err(Error::Unexpected(c)),
				Some(_) => {
					self.cursor.advance();
				}
			}
		}

		self.cursor.emit_verbatim(TokenKind::Iri);
		self.cursor.advance();
		self.cursor.ignore();
		Ok(role.next())
	}

	/// Consumes a `PN_PREFIX`, if any.
	fn scan_prefix_label(&mut self) {
		if self.cursor.peek().is_some_and(classify::is_pn_chars_base) {
			self.cursor.advance();
			self.scan_name_chars(classify::is_pn_chars);
		}
	}

	/// Consumes the characters matching `f`, and the dots followed by such a
	/// character.
	fn scan_name_chars(&mut self, f: fn(char) -> bool) {
		while let Some(c) = self.cursor.peek() {
			if f(c) || (c == '.' && classify::dots_then(&self.cursor.remaining()[1..], f)) {
				self.cursor.advance();
			} else {
				break;
			}
		}
	}

	/// Consumes a non empty run of characters matching `f`.
	fn scan_run(&mut self, f: impl Fn(char) -> bool) -> Result<(), Error> {
		match self.cursor.advance() {
			Some(c) if f(c) => (),
			unexpected => return Err(unexpected.into()),
		}

		while self.cursor.peek().is_some_and(&f) {
			self.cursor.advance();
		}

		Ok(())
	}

	/// Consumes one character of a local name, with its escape sequence if
	/// any.
	fn scan_local_char(&mut self) -> Result<(), Error> {
		match self.cursor.advance() {
			Some('%') => {
				for _ in 0..2 {
					match self.cursor.advance() {
						Some(c) if c.is_ascii_hexdigit() => (),
						unexpected => return Err(unexpected.into()),
					}
				}
			}
			Some('\\') => match self.cursor.advance() {
				Some(c) if classify::is_pn_local_escape(c) => (),
				unexpected => return Err(unexpected.into()),
			},
			_ => (),
		}

		Ok(())
	}

	fn lex_prefixed_name(&mut self, role: Role) -> Result<State, Error> {
		self.scan_prefix_label();
		match self.cursor.advance() {
			Some(':') => (),
			_ if role == Role::Verb => return Err(Error::MalformedVerb),
			unexpected => return Err(unexpected.into()),
		}

		// PN_LOCAL
		if self.cursor.peek().is_some_and(|c| {
			classify::is_pn_chars_u(c) || c.is_ascii_digit() || matches!(c, ':' | '%' | '\\')
		}) {
			self.scan_local_char()?;
			loop {
				match self.cursor.peek() {
					Some(c) if classify::is_pn_local_char(c) => self.scan_local_char()?,
					Some('.')
						if classify::dots_then(
							&self.cursor.remaining()[1..],
							classify::is_pn_local_char,
						) =>
					{
						self.cursor.advance();
					}
					_ => break,
				}
			}
		}

		self.cursor.emit(TokenKind::PrefixedName);
		Ok(role.next())
	}

	fn lex_blank_node_label(&mut self, role: Role) -> Result<State, Error> {
		self.cursor.advance_by(2);
		match self.cursor.advance() {
			Some(c) if classify::is_pn_chars_u(c) || c.is_ascii_digit() => (),
			unexpected => return Err(unexpected.into()),
		}

		self.scan_name_chars(classify::is_pn_chars);
		self.cursor.emit(TokenKind::BlankNodeLabel);
		Ok(role.next())
	}

	fn lex_subject(&mut self) -> Result<State, Error> {
		self.skip_trivia()?;
		let rest = self.cursor.remaining();
		if classify::is_iri_ref(rest) {
			Ok(State::IriRef(Role::Subject))
		} else if classify::is_blank_node_label(rest) {
			Ok(State::BlankNodeLabel(Role::Subject))
		} else if classify::is_collection(rest) {
			Ok(self.open(Delimiter::Parenthesis, Role::Subject))
		} else if classify::is_blank_node_property_list(rest) {
			Ok(self.open(Delimiter::Bracket, Role::Subject))
		} else if classify::is_prefixed_name(rest) {
			Ok(State::PrefixedName(Role::Subject))
		} else {
			Err(self.unexpected())
		}
	}

	fn lex_verb(&mut self) -> Result<State, Error> {
		self.skip_trivia()?;
		let rest = self.cursor.remaining();
		if classify::is_a(rest) {
			self.cursor.advance();
			self.cursor.emit(TokenKind::A);
			Ok(State::Object)
		} else if classify::is_iri_ref(rest) {
			Ok(State::IriRef(Role::Verb))
		} else if classify::is_prefixed_name(rest) {
			Ok(State::PrefixedName(Role::Verb))
		} else {
			self.cursor.advance();
			Err(Error::MalformedVerb)
		}
	}

	fn lex_verb_or_end(&mut self) -> Result<State, Error> {
		self.skip_trivia()?;
		match (self.cursor.peek(), self.open.last().copied()) {
			(Some(';'), _) => {
				self.cursor.advance();
				self.cursor.emit(TokenKind::ObjectSeparator);
				Ok(State::VerbOrEnd)
			}
			(Some('.'), None) => Ok(self.end_statement()),
			(Some(']'), Some(frame)) if frame.delimiter == Delimiter::Bracket => {
				Ok(self.close(frame, false))
			}
			_ => Ok(State::Verb),
		}
	}

	fn lex_object(&mut self) -> Result<State, Error> {
		self.skip_trivia()?;
		let rest = self.cursor.remaining();
		if classify::is_iri_ref(rest) {
			Ok(State::IriRef(Role::Object))
		} else if classify::is_blank_node_label(rest) {
			Ok(State::BlankNodeLabel(Role::Object))
		} else if classify::is_collection(rest) {
			Ok(self.open(Delimiter::Parenthesis, Role::Object))
		} else if classify::is_blank_node_property_list(rest) {
			Ok(self.open(Delimiter::Bracket, Role::Object))
		} else if classify::is_string(rest) {
			Ok(State::Literal)
		} else if let Some(len) = classify::boolean_len(rest) {
			self.cursor.advance_by(len);
			self.cursor.emit(TokenKind::Boolean);
			Ok(State::AfterObject)
		} else if let Some((len, _)) = classify::numeric_prefix(rest) {
			self.cursor.advance_by(len);
			self.cursor.emit(TokenKind::Numeric);
			Ok(State::AfterObject)
		} else if classify::is_prefixed_name(rest) {
			Ok(State::PrefixedName(Role::Object))
		} else {
			Err(self.unexpected())
		}
	}

	/// Lexes a string literal, from the opening quotes to the closing ones.
	///
	/// A backslash escapes the following character. Escape sequences are not
	/// decoded.
	fn lex_literal(&mut self) -> Result<State, Error> {
		let long = classify::is_long_string(self.cursor.remaining());
		let quote = match self.cursor.advance() {
			Some(c) => c,
			None => return Err(Error::UnexpectedEndOfInput),
		};

		if long {
			self.cursor.advance_by(2);
		}

		self.cursor.ignore();

		loop {
			match self.cursor.peek() {
				None => return Err(Error::UnterminatedLiteral),
				Some('\\') => {
					self.cursor.advance();
					if self.cursor.advance().is_none() {
						return Err(Error::UnterminatedLiteral);
					}
				}
				Some(c) if c == quote => {
					if !long {
						break;
					}

					// Up to two quotes may precede the closing ones.
					let rest = self.cursor.remaining();
					let closes = rest
						.get(..3)
						.is_some_and(|s| s.chars().all(|c| c == quote))
						&& !rest[3..].starts_with(quote);
					if closes {
						break;
					}

					self.cursor.advance();
				}
				Some('\n' | '\r') if !long => return Err(Error::UnterminatedLiteral),
				Some(_) => {
					self.cursor.advance();
				}
			}
		}

		self.cursor.emit_verbatim(TokenKind::Literal);
		self.cursor.advance_by(if long { 3 } else { 1 });
		self.cursor.ignore();
		Ok(State::LiteralSuffix)
	}

	fn lex_literal_suffix(&mut self) -> Result<State, Error> {
		self.cursor.skip_blank();
		let rest = self.cursor.remaining();
		if classify::is_lang_tag(rest) {
			self.cursor.advance();
			self.cursor.ignore();

			// LANGTAG ::= '@' [a-zA-Z]+ ('-' [a-zA-Z0-9]+)*
			self.scan_run(|c| c.is_ascii_alphabetic())?;
			while self.cursor.peek() == Some('-') {
				self.cursor.advance();
				self.scan_run(|c| c.is_ascii_alphanumeric())?;
			}

			self.cursor.emit(TokenKind::LangTag);
			Ok(State::AfterObject)
		} else if classify::is_datatype_marker(rest) {
			self.cursor.advance_by(2);
			self.cursor.emit(TokenKind::DatatypeMarker);
			Ok(State::Datatype)
		} else {
			Ok(State::AfterObject)
		}
	}

	fn lex_datatype(&mut self) -> Result<State, Error> {
		if !self.cursor.skip_blank() {
			return Err(Error::UnexpectedEndOfInput);
		}

		let rest = self.cursor.remaining();
		if classify::is_iri_ref(rest) {
			Ok(State::IriRef(Role::Datatype))
		} else if classify::is_prefixed_name(rest) {
			Ok(State::PrefixedName(Role::Datatype))
		} else {
			Err(self.unexpected())
		}
	}

	fn lex_after_object(&mut self) -> Result<State, Error> {
		let frame = self.open.last().copied();
		if frame.is_some_and(|frame| frame.delimiter == Delimiter::Parenthesis) {
			return Ok(State::CollectionItem);
		}

		self.skip_trivia()?;
		match (self.cursor.peek(), frame) {
			(Some(','), _) => {
				self.cursor.advance();
				self.cursor.emit(TokenKind::ObjectListSeparator);
				Ok(State::Object)
			}
			(Some(';'), _) => {
				self.cursor.advance();
				self.cursor.emit(TokenKind::ObjectSeparator);
				Ok(State::VerbOrEnd)
			}
			(Some('.'), None) => Ok(self.end_statement()),
			(Some(']'), Some(frame)) => Ok(self.close(frame, false)),
			_ => Err(self.unexpected()),
		}
	}

	fn lex_collection_item(&mut self) -> Result<State, Error> {
		self.skip_trivia()?;
		match (self.cursor.peek(), self.open.last().copied()) {
			(Some(')'), Some(frame)) => Ok(self.close(frame, false)),
			_ => Ok(State::Object),
		}
	}

	fn lex_property_list_start(&mut self) -> Result<State, Error> {
		self.skip_trivia()?;
		match (self.cursor.peek(), self.open.last().copied()) {
			(Some(']'), Some(frame)) => Ok(self.close(frame, true)),
			_ => Ok(State::Verb),
		}
	}

	fn open(&mut self, delimiter: Delimiter, role: Role) -> State {
		self.cursor.advance();
		self.cursor.emit(delimiter.open_kind());
		self.open.push(Frame { delimiter, role });
		match delimiter {
			Delimiter::Parenthesis => State::CollectionItem,
			Delimiter::Bracket => State::PropertyListStart,
		}
	}

	/// Closes the innermost construct, `frame`.
	///
	/// A subject blank node property list may be followed by the end of the
	/// statement, but not an empty one (`[]`), which is a plain blank node.
	fn close(&mut self, frame: Frame, empty: bool) -> State {
		self.cursor.advance();
		self.open.pop();
		self.cursor.emit(frame.delimiter.close_kind());
		match (frame.role, frame.delimiter) {
			(Role::Subject, Delimiter::Bracket) if !empty => State::VerbOrEnd,
			(Role::Subject, _) => State::Verb,
			_ => State::AfterObject,
		}
	}

	fn end_statement(&mut self) -> State {
		self.cursor.advance();
		self.cursor.emit(TokenKind::EndOfStatement);
		State::Statement
	}

	fn unexpected(&mut self) -> Error {
		self.cursor.ignore();
		self.cursor.advance().into()
	}

	fn unknown_directive(&mut self) -> Error {
		self.cursor.ignore();
		while self.cursor.peek().is_some_and(|c| !c.is_whitespace()) {
			self.cursor.advance();
		}

		Error::UnknownDirective
	}
}

impl<'a> Iterator for Lexer<'a> {
	type Item = Meta<Token, Span>;

	fn next(&mut self) -> Option<Self::Item> {
		loop {
			if let Some(token) = self.cursor.take() {
				return Some(token);
			}

			if self.state == State::Halted {
				return None;
			}

			self.step()
		}
	}
}

impl<'a> FusedIterator for Lexer<'a> {}

/// Receiving end of a lexer running on its own thread.
///
/// Dropping the receiver stops the lexer thread and waits for it.
pub struct Receiver {
	tokens: Option<mpsc::Receiver<Meta<Token, Span>>>,
	producer: Option<thread::JoinHandle<()>>,
}

/// Lexes `input` on a separate thread.
///
/// Tokens are sent through a queue holding at most `capacity` tokens, and the
/// lexer blocks while the queue is full. The thread stops after sending the
/// last token of the stream, or as soon as the receiver is dropped.
pub fn spawn(input: String, capacity: usize) -> Receiver {
	let (sender, tokens) = mpsc::sync_channel(capacity);
	let producer = thread::spawn(move || {
		for token in Lexer::new(&input) {
			if sender.send(token).is_err() {
				log::debug!("token receiver dropped, stopping the lexer");
				break;
			}
		}
	});

	Receiver {
		tokens: Some(tokens),
		producer: Some(producer),
	}
}

impl Receiver {
	fn join(&mut self) {
		if let Some(producer) = self.producer.take() {
			if producer.join().is_err() {
				log::warn!("lexer thread panicked");
			}
		}
	}
}

impl Iterator for Receiver {
	type Item = Meta<Token, Span>;

	fn next(&mut self) -> Option<Self::Item> {
		match self.tokens.as_ref()?.recv() {
			Ok(token) => Some(token),
			Err(_) => {
				self.tokens = None;
				self.join();
				None
			}
		}
	}
}

impl FusedIterator for Receiver {}

impl Drop for Receiver {
	fn drop(&mut self) {
		// The producer blocked on a full queue only wakes up once the channel
		// is closed.
		self.tokens = None;
		self.join()
	}
}

#[cfg(test)]
mod tests {
	use super::*;

	fn lex(input: &str) -> Vec<(TokenKind, String)> {
		start(input)
			.map(|Meta(token, _)| (token.kind(), token.into_text()))
			.collect()
	}

	fn kinds(input: &str) -> Vec<TokenKind> {
		lex(input).into_iter().map(|(kind, _)| kind).collect()
	}

	fn token(kind: TokenKind, text: &str) -> (TokenKind, String) {
		(kind, text.to_owned())
	}

	#[test]
	fn empty_input() {
		assert_eq!(kinds(""), vec![TokenKind::EndOfInput]);
		assert_eq!(kinds(" \n\t\r\n "), vec![TokenKind::EndOfInput]);
	}

	#[test]
	fn only_comments() {
		assert_eq!(
			lex("  # one\n\n# two"),
			vec![
				token(TokenKind::Comment, "one"),
				token(TokenKind::Comment, "two"),
				token(TokenKind::EndOfInput, "")
			]
		);
	}

	#[test]
	fn prefix_declaration() {
		assert_eq!(
			lex("@prefix ex: <http://example.org/> ."),
			vec![
				token(TokenKind::PrefixDeclLabel, "ex"),
				token(TokenKind::Iri, "http://example.org/"),
				token(TokenKind::EndOfInput, "")
			]
		);

		assert_eq!(
			lex("@prefix : <http://example.org/> ."),
			vec![
				token(TokenKind::PrefixDeclLabel, ""),
				token(TokenKind::Iri, "http://example.org/"),
				token(TokenKind::EndOfInput, "")
			]
		);
	}

	#[test]
	fn sparql_keywords_are_case_insensitive() {
		let expected = vec![
			token(TokenKind::PrefixDeclLabel, "ex"),
			token(TokenKind::Iri, "http://example.org/"),
			token(TokenKind::EndOfInput, ""),
		];
		assert_eq!(lex("prefix ex: <http://example.org/>"), expected);
		assert_eq!(lex("PrEfIx ex: <http://example.org/>"), expected);
		assert_eq!(lex("PREFIX ex: <http://example.org/>\n"), expected);
	}

	#[test]
	fn at_keywords_are_case_sensitive() {
		assert_eq!(
			kinds("@PREFIX ex: <http://example.org/> ."),
			vec![TokenKind::Error(Error::UnknownDirective)]
		);
		assert_eq!(
			kinds("@version \"1.2\" ."),
			vec![TokenKind::Error(Error::UnknownDirective)]
		);
	}

	#[test]
	fn base_declarations() {
		assert_eq!(
			lex("@base <http://example.org/> .\nBASE <a/>"),
			vec![
				token(TokenKind::BaseDecl, "@base"),
				token(TokenKind::Iri, "http://example.org/"),
				token(TokenKind::BaseDecl, "BASE"),
				token(TokenKind::Iri, "a/"),
				token(TokenKind::EndOfInput, "")
			]
		);
	}

	#[test]
	fn missing_directive_dot() {
		assert_eq!(
			kinds("@prefix ex: <http://example.org/> ex:a"),
			vec![
				TokenKind::PrefixDeclLabel,
				TokenKind::Iri,
				TokenKind::Error(Error::Unexpected('e'))
			]
		);
	}

	#[test]
	fn simple_triple() {
		assert_eq!(
			lex("ex:subject ex:pred ex:object ."),
			vec![
				token(TokenKind::PrefixedName, "ex:subject"),
				token(TokenKind::PrefixedName, "ex:pred"),
				token(TokenKind::PrefixedName, "ex:object"),
				token(TokenKind::EndOfStatement, "."),
				token(TokenKind::EndOfInput, "")
			]
		);
	}

	#[test]
	fn trailing_dot_is_not_part_of_a_name() {
		assert_eq!(
			lex("ex:s ex:p ex:o.\n_:b.c ex:p :x."),
			vec![
				token(TokenKind::PrefixedName, "ex:s"),
				token(TokenKind::PrefixedName, "ex:p"),
				token(TokenKind::PrefixedName, "ex:o"),
				token(TokenKind::EndOfStatement, "."),
				token(TokenKind::BlankNodeLabel, "_:b.c"),
				token(TokenKind::PrefixedName, "ex:p"),
				token(TokenKind::PrefixedName, ":x"),
				token(TokenKind::EndOfStatement, "."),
				token(TokenKind::EndOfInput, "")
			]
		);
	}

	#[test]
	fn local_name_escapes() {
		assert_eq!(
			lex("ex:a\\-b ex:c%20d ex:e:f ."),
			vec![
				token(TokenKind::PrefixedName, "ex:a\\-b"),
				token(TokenKind::PrefixedName, "ex:c%20d"),
				token(TokenKind::PrefixedName, "ex:e:f"),
				token(TokenKind::EndOfStatement, "."),
				token(TokenKind::EndOfInput, "")
			]
		);
	}

	#[test]
	fn iri_text_is_verbatim() {
		let iri = "http://example.org/a%20b?x=1&y=\\u0041#frag";
		let input = format!("<{iri}> <p> <o> .");
		let tokens = lex(&input);
		assert_eq!(tokens[0], token(TokenKind::Iri, iri));
		assert_eq!(tokens[1], token(TokenKind::Iri, "p"));
	}

	#[test]
	fn iri_span_excludes_delimiters() {
		let input = "<http://example.org/s> <p> <o> .";
		let Meta(_, span) = start(input).next().unwrap();
		assert_eq!(&input[span.start()..span.end()], "http://example.org/s");
	}

	#[test]
	fn unterminated_iri() {
		assert_eq!(
			kinds("<http://example.org"),
			vec![TokenKind::Error(Error::UnterminatedIri)]
		);
		assert_eq!(
			kinds("ex:s ex:p <http://example.org\n ."),
			vec![
				TokenKind::PrefixedName,
				TokenKind::PrefixedName,
				TokenKind::Error(Error::UnterminatedIri)
			]
		);
	}

	#[test]
	fn stream_closes_after_error() {
		let mut lexer = start("<http://example.org");
		assert!(matches!(
			lexer.next(),
			Some(Meta(t, _)) if t.kind() == TokenKind::Error(Error::UnterminatedIri)
		));
		assert!(lexer.is_halted());
		assert!(lexer.next().is_none());
		assert!(lexer.next().is_none());
	}

	#[test]
	fn unexpected_end_of_input() {
		assert_eq!(
			kinds("ex:s ex:p"),
			vec![
				TokenKind::PrefixedName,
				TokenKind::PrefixedName,
				TokenKind::Error(Error::UnexpectedEndOfInput)
			]
		);
		assert_eq!(
			kinds("ex:s ex:p ex:o"),
			vec![
				TokenKind::PrefixedName,
				TokenKind::PrefixedName,
				TokenKind::PrefixedName,
				TokenKind::Error(Error::UnexpectedEndOfInput)
			]
		);
	}

	#[test]
	fn malformed_verb() {
		assert_eq!(
			kinds("ex:s \"p\" ex:o ."),
			vec![
				TokenKind::PrefixedName,
				TokenKind::Error(Error::MalformedVerb)
			]
		);
		assert_eq!(
			kinds("ex:s ex:p ex:o ; 42 ex:o ."),
			vec![
				TokenKind::PrefixedName,
				TokenKind::PrefixedName,
				TokenKind::PrefixedName,
				TokenKind::ObjectSeparator,
				TokenKind::Error(Error::MalformedVerb)
			]
		);
	}

	#[test]
	fn a_verb() {
		assert_eq!(
			lex("ex:s a ex:C ; ex:p ex:o , ex:o2 ."),
			vec![
				token(TokenKind::PrefixedName, "ex:s"),
				token(TokenKind::A, "a"),
				token(TokenKind::PrefixedName, "ex:C"),
				token(TokenKind::ObjectSeparator, ";"),
				token(TokenKind::PrefixedName, "ex:p"),
				token(TokenKind::PrefixedName, "ex:o"),
				token(TokenKind::ObjectListSeparator, ","),
				token(TokenKind::PrefixedName, "ex:o2"),
				token(TokenKind::EndOfStatement, "."),
				token(TokenKind::EndOfInput, "")
			]
		);
	}

	#[test]
	fn literals() {
		assert_eq!(
			lex("ex:s ex:p \"chat\"@fr, \"1\"^^xsd:integer, '''long\n''text'''^^<http://x> ."),
			vec![
				token(TokenKind::PrefixedName, "ex:s"),
				token(TokenKind::PrefixedName, "ex:p"),
				token(TokenKind::Literal, "chat"),
				token(TokenKind::LangTag, "fr"),
				token(TokenKind::ObjectListSeparator, ","),
				token(TokenKind::Literal, "1"),
				token(TokenKind::DatatypeMarker, "^^"),
				token(TokenKind::PrefixedName, "xsd:integer"),
				token(TokenKind::ObjectListSeparator, ","),
				token(TokenKind::Literal, "long\n''text"),
				token(TokenKind::DatatypeMarker, "^^"),
				token(TokenKind::Iri, "http://x"),
				token(TokenKind::EndOfStatement, "."),
				token(TokenKind::EndOfInput, "")
			]
		);
	}

	#[test]
	fn literal_text_is_verbatim() {
		let tokens = lex("ex:s ex:p \"  a \\\" b\\n \"@en-GB .");
		assert_eq!(tokens[2], token(TokenKind::Literal, "  a \\\" b\\n "));
		assert_eq!(tokens[3], token(TokenKind::LangTag, "en-GB"));
	}

	#[test]
	fn long_literal_ending_with_quotes() {
		let tokens = lex("ex:s ex:p \"\"\"a\"\"\"\" .");
		assert_eq!(tokens[2], token(TokenKind::Literal, "a\""));
		assert_eq!(tokens[3], token(TokenKind::EndOfStatement, "."));
	}

	#[test]
	fn unterminated_literal() {
		assert_eq!(
			kinds("ex:s ex:p \"abc"),
			vec![
				TokenKind::PrefixedName,
				TokenKind::PrefixedName,
				TokenKind::Error(Error::UnterminatedLiteral)
			]
		);
		assert_eq!(
			kinds("ex:s ex:p 'abc\ndef' ."),
			vec![
				TokenKind::PrefixedName,
				TokenKind::PrefixedName,
				TokenKind::Error(Error::UnterminatedLiteral)
			]
		);
		assert_eq!(
			kinds("ex:s ex:p \"\"\"abc\"\" ."),
			vec![
				TokenKind::PrefixedName,
				TokenKind::PrefixedName,
				TokenKind::Error(Error::UnterminatedLiteral)
			]
		);
	}

	#[test]
	fn numeric_and_boolean_literals() {
		assert_eq!(
			lex("ex:s ex:p 1.5e3, -2, .5, true, false, 4."),
			vec![
				token(TokenKind::PrefixedName, "ex:s"),
				token(TokenKind::PrefixedName, "ex:p"),
				token(TokenKind::Numeric, "1.5e3"),
				token(TokenKind::ObjectListSeparator, ","),
				token(TokenKind::Numeric, "-2"),
				token(TokenKind::ObjectListSeparator, ","),
				token(TokenKind::Numeric, ".5"),
				token(TokenKind::ObjectListSeparator, ","),
				token(TokenKind::Boolean, "true"),
				token(TokenKind::ObjectListSeparator, ","),
				token(TokenKind::Boolean, "false"),
				token(TokenKind::ObjectListSeparator, ","),
				token(TokenKind::Numeric, "4"),
				token(TokenKind::EndOfStatement, "."),
				token(TokenKind::EndOfInput, "")
			]
		);
	}

	#[test]
	fn nested_collections() {
		let mut lexer = start("ex:s ex:p ( ( 1 2 ) 3 ) .");
		let mut closes = Vec::new();
		let mut kinds = Vec::new();
		while let Some(Meta(token, _)) = lexer.next() {
			if token.kind() == TokenKind::CollectionClose {
				closes.push(lexer.depth());
			}
			kinds.push(token.kind());
		}

		assert_eq!(closes, vec![1, 0]);
		assert_eq!(
			kinds,
			vec![
				TokenKind::PrefixedName,
				TokenKind::PrefixedName,
				TokenKind::CollectionOpen,
				TokenKind::CollectionOpen,
				TokenKind::Numeric,
				TokenKind::Numeric,
				TokenKind::CollectionClose,
				TokenKind::Numeric,
				TokenKind::CollectionClose,
				TokenKind::EndOfStatement,
				TokenKind::EndOfInput
			]
		);
	}

	#[test]
	fn premature_end_of_statement_in_collection() {
		assert_eq!(
			kinds("ex:s ex:p ( ( 1 ) ."),
			vec![
				TokenKind::PrefixedName,
				TokenKind::PrefixedName,
				TokenKind::CollectionOpen,
				TokenKind::CollectionOpen,
				TokenKind::Numeric,
				TokenKind::CollectionClose,
				TokenKind::Error(Error::Unexpected('.'))
			]
		);
	}

	#[test]
	fn delimiters_inside_literals() {
		assert_eq!(
			lex("ex:s ex:p ( \"a ) b\" '[' ) ."),
			vec![
				token(TokenKind::PrefixedName, "ex:s"),
				token(TokenKind::PrefixedName, "ex:p"),
				token(TokenKind::CollectionOpen, "("),
				token(TokenKind::Literal, "a ) b"),
				token(TokenKind::Literal, "["),
				token(TokenKind::CollectionClose, ")"),
				token(TokenKind::EndOfStatement, "."),
				token(TokenKind::EndOfInput, "")
			]
		);
	}

	#[test]
	fn blank_node_property_lists() {
		assert_eq!(
			kinds("[ ex:p ex:o ; ex:q 1 ] ex:r [] ."),
			vec![
				TokenKind::BlankNodePropertyListOpen,
				TokenKind::PrefixedName,
				TokenKind::PrefixedName,
				TokenKind::ObjectSeparator,
				TokenKind::PrefixedName,
				TokenKind::Numeric,
				TokenKind::BlankNodePropertyListClose,
				TokenKind::PrefixedName,
				TokenKind::BlankNodePropertyListOpen,
				TokenKind::BlankNodePropertyListClose,
				TokenKind::EndOfStatement,
				TokenKind::EndOfInput
			]
		);

		assert_eq!(
			kinds("[ ex:p ex:o ] ."),
			vec![
				TokenKind::BlankNodePropertyListOpen,
				TokenKind::PrefixedName,
				TokenKind::PrefixedName,
				TokenKind::BlankNodePropertyListClose,
				TokenKind::EndOfStatement,
				TokenKind::EndOfInput
			]
		);
	}

	#[test]
	fn anonymous_subject_needs_predicates() {
		assert_eq!(
			kinds("[] ."),
			vec![
				TokenKind::BlankNodePropertyListOpen,
				TokenKind::BlankNodePropertyListClose,
				TokenKind::Error(Error::MalformedVerb)
			]
		);
	}

	#[test]
	fn comments_inside_statements() {
		assert_eq!(
			lex("ex:s # subject\n ex:p ex:o ; # more\n .\n"),
			vec![
				token(TokenKind::PrefixedName, "ex:s"),
				token(TokenKind::Comment, "subject"),
				token(TokenKind::PrefixedName, "ex:p"),
				token(TokenKind::PrefixedName, "ex:o"),
				token(TokenKind::ObjectSeparator, ";"),
				token(TokenKind::Comment, "more"),
				token(TokenKind::EndOfStatement, "."),
				token(TokenKind::EndOfInput, "")
			]
		);
	}

	#[test]
	fn spawned_lexer_yields_the_same_stream() {
		let input = "@prefix ex: <http://example.org/> .\nex:s ex:p ( 1 [ ex:q \"x\" ] ) .";
		let flatten = |Meta(token, span): Meta<Token, Span>| (token, span.start(), span.end());
		let expected: Vec<_> = start(input).map(flatten).collect();
		for capacity in [0, 1, 16] {
			let tokens: Vec<_> = spawn(input.to_owned(), capacity).map(flatten).collect();
			assert_eq!(tokens, expected);
		}
	}

	#[test]
	fn dropping_the_receiver_stops_the_producer() {
		let input = "ex:s ex:p ex:o .\n".repeat(1000);
		let mut receiver = spawn(input, 1);
		assert!(receiver.next().is_some());

		// Dropping joins the producer, so it only returns once the thread is
		// done, long before the whole input is lexed.
		let (done, dropped) = mpsc::channel();
		thread::spawn(move || {
			drop(receiver);
			done.send(()).ok();
		});
		assert_eq!(
			dropped.recv_timeout(std::time::Duration::from_secs(10)),
			Ok(())
		);
	}

	#[test]
	fn receiver_is_fused() {
		let input = "<s> <p> <o> .";
		let mut receiver = spawn(input.to_owned(), 0);
		assert_eq!(receiver.by_ref().count(), start(input).count());
		assert!(receiver.next().is_none());
		assert!(receiver.producer.is_none());
	}
}
