//! Graph builder.
//!
//! The [`Parser`] consumes a token stream, registers the prefix and base
//! declarations and assembles the triples of the document.
use crate::build::{
	self, BlankNode, Context, Graph, Literal, Object, Subject, Triple, RDF_FIRST, RDF_NIL,
	RDF_REST, RDF_TYPE,
};
use crate::lexing::{self, Token, TokenKind};
use iref::IriBuf;
use locspan::{Meta, Span};
use std::fmt;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Error {
	Lexer(lexing::Error),
	Build(build::Error),

	/// Token out of place, or token stream closed before the end of input.
	Unexpected(Option<TokenKind>),

	/// Declaration label not immediately followed by its IRI.
	MissingDeclarationValue,

	InvalidUtf8,
}

impl fmt::Display for Error {
	fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
		match self {
			Self::Lexer(e) => e.fmt(f),
			Self::Build(e) => e.fmt(f),
			Self::Unexpected(None) => write!(f, "unexpected end of token stream"),
			Self::Unexpected(Some(kind)) => write!(f, "unexpected {kind}"),
			Self::MissingDeclarationValue => write!(f, "missing declaration IRI"),
			Self::InvalidUtf8 => write!(f, "invalid UTF-8 sequence"),
		}
	}
}

impl std::error::Error for Error {
	fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
		match self {
			Self::Lexer(e) => Some(e),
			Self::Build(e) => Some(e),
			_ => None,
		}
	}
}

impl From<build::Error> for Error {
	fn from(e: build::Error) -> Self {
		Self::Build(e)
	}
}

pub type MetaError = Meta<Error, Span>;

fn at(span: Span) -> impl Fn(build::Error) -> MetaError {
	move |e| Meta(Error::Build(e), span)
}

/// Parser phase.
///
/// `Completed` and `Failed` are terminal.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Phase {
	NotStarted,
	Running,
	Completed,
	Failed,
}

/// Parsing options.
#[derive(Debug, Clone, Default)]
pub struct Options {
	/// Base IRI in effect before any base declaration.
	pub base_iri: Option<IriBuf>,

	/// When set, the lexer runs on its own thread, sending tokens through a
	/// queue of this capacity.
	pub queue_capacity: Option<usize>,
}

/// Construct being assembled.
enum Frame {
	Statement {
		subject: Subject,
		predicate: Option<String>,
	},
	PropertyList {
		node: BlankNode,
		predicate: Option<String>,
	},
	Collection {
		items: Vec<Object>,
	},
}

/// Token stream consumer.
pub struct Parser<T> {
	tokens: T,
	lookahead: Option<Meta<Token, Span>>,
	seen: Vec<Meta<Token, Span>>,
	phase: Phase,
	error: Option<MetaError>,
	context: Context,
	triples: Vec<Triple>,
	frames: Vec<Frame>,
}

impl<T: Iterator<Item = Meta<Token, Span>>> Parser<T> {
	pub fn new(tokens: T, base_iri: Option<IriBuf>) -> Self {
		Self {
			tokens,
			lookahead: None,
			seen: Vec::new(),
			phase: Phase::NotStarted,
			error: None,
			context: Context::new(base_iri),
			triples: Vec::new(),
			frames: Vec::new(),
		}
	}

	pub fn phase(&self) -> Phase {
		self.phase
	}

	/// Tokens consumed so far, comments included.
	///
	/// Still available after a failure.
	pub fn tokens(&self) -> &[Meta<Token, Span>] {
		&self.seen
	}

	/// Consumes the token stream up to the end of input or the first error.
	///
	/// Once the parser has completed or failed, no more tokens are read and
	/// the same outcome is returned.
	pub fn run(&mut self) -> Result<(), MetaError> {
		if let Some(e) = &self.error {
			return Err(e.clone());
		}

		if self.phase == Phase::Completed {
			return Ok(());
		}

		self.set_phase(Phase::Running);
		match self.consume() {
			Ok(()) => {
				self.set_phase(Phase::Completed);
				Ok(())
			}
			Err(e) => {
				self.set_phase(Phase::Failed);
				self.error = Some(e.clone());
				Err(e)
			}
		}
	}

	/// Runs the parser and returns the graph.
	pub fn parse(mut self) -> Result<Graph, MetaError> {
		self.run()?;
		Ok(self.finish())
	}

	/// Returns the graph, if the parser has completed.
	pub fn into_graph(self) -> Option<Graph> {
		if self.phase == Phase::Completed {
			Some(self.finish())
		} else {
			None
		}
	}

	fn finish(self) -> Graph {
		Graph::new(self.context, self.triples, self.seen)
	}

	fn set_phase(&mut self, phase: Phase) {
		log::debug!("parser phase: {:?} -> {:?}", self.phase, phase);
		self.phase = phase
	}

	fn pull(&mut self) -> Option<Meta<Token, Span>> {
		let token = self.lookahead.take().or_else(|| self.tokens.next())?;
		self.seen.push(token.clone());
		Some(token)
	}

	fn peek_kind(&mut self) -> Option<TokenKind> {
		if self.lookahead.is_none() {
			self.lookahead = self.tokens.next()
		}

		self.lookahead.as_ref().map(|Meta(token, _)| token.kind())
	}

	fn pull_or_fail(&mut self) -> Result<Meta<Token, Span>, MetaError> {
		match self.pull() {
			Some(token) => Ok(token),
			None => {
				log::warn!("token stream closed before the end of input");
				let end = self.seen.last().map(|Meta(_, span)| span.end()).unwrap_or(0);
				Err(Meta(Error::Unexpected(None), Span::new(end, end)))
			}
		}
	}

	fn consume(&mut self) -> Result<(), MetaError> {
		loop {
			let Meta(token, span) = self.pull_or_fail()?;
			let kind = token.kind();
			match kind {
				TokenKind::EndOfInput => {
					return if self.frames.is_empty() {
						Ok(())
					} else {
						Err(Meta(Error::Unexpected(Some(kind)), span))
					}
				}
				TokenKind::Error(e) => return Err(Meta(Error::Lexer(e), span)),
				TokenKind::Comment => (),
				TokenKind::PrefixDeclLabel => {
					let Meta(iri, iri_span) = self.declaration_value(span)?;
					self.context
						.insert_prefix(token.into_text(), &iri)
						.map_err(at(iri_span))?
				}
				TokenKind::BaseDecl => {
					let Meta(iri, iri_span) = self.declaration_value(span)?;
					self.context.set_base_iri(&iri).map_err(at(iri_span))?
				}
				TokenKind::Iri => {
					let iri = self.context.resolve_iri_ref(token.text()).map_err(at(span))?;
					self.place(Object::Iri(iri), kind, span)?
				}
				TokenKind::PrefixedName => {
					let iri = self.context.expand(token.text()).map_err(at(span))?;
					self.place(Object::Iri(iri), kind, span)?
				}
				TokenKind::BlankNodeLabel => {
					let text = token.into_text();
					let label = match text.strip_prefix("_:") {
						Some(label) => label.to_owned(),
						None => text,
					};
					self.place(Object::Blank(BlankNode::Label(label)), kind, span)?
				}
				TokenKind::A => self.place(Object::Iri(RDF_TYPE.to_string()), kind, span)?,
				TokenKind::Literal => {
					let literal = self.literal(token.into_text())?;
					self.place(Object::Literal(literal), kind, span)?
				}
				TokenKind::Numeric => match Literal::numeric(token.into_text()) {
					Some(literal) => self.place(Object::Literal(literal), kind, span)?,
					None => return Err(Meta(Error::Unexpected(Some(kind)), span)),
				},
				TokenKind::Boolean => {
					let literal = Literal::boolean(token.into_text());
					self.place(Object::Literal(literal), kind, span)?
				}
				TokenKind::CollectionOpen => self.frames.push(Frame::Collection { items: Vec::new() }),
				TokenKind::CollectionClose => match self.frames.pop() {
					Some(Frame::Collection { items }) => {
						let head = self.collection(items);
						self.place(head, kind, span)?
					}
					_ => return Err(Meta(Error::Unexpected(Some(kind)), span)),
				},
				TokenKind::BlankNodePropertyListOpen => {
					let node = self.context.fresh_blank();
					self.frames.push(Frame::PropertyList {
						node,
						predicate: None,
					})
				}
				TokenKind::BlankNodePropertyListClose => match self.frames.pop() {
					Some(Frame::PropertyList { node, .. }) => {
						self.place(Object::Blank(node), kind, span)?
					}
					_ => return Err(Meta(Error::Unexpected(Some(kind)), span)),
				},
				TokenKind::ObjectSeparator => match self.frames.last_mut() {
					Some(
						Frame::Statement { predicate, .. } | Frame::PropertyList { predicate, .. },
					) => *predicate = None,
					_ => return Err(Meta(Error::Unexpected(Some(kind)), span)),
				},
				TokenKind::ObjectListSeparator => match self.frames.last() {
					Some(
						Frame::Statement {
							predicate: Some(_), ..
						}
						| Frame::PropertyList {
							predicate: Some(_), ..
						},
					) => (),
					_ => return Err(Meta(Error::Unexpected(Some(kind)), span)),
				},
				TokenKind::EndOfStatement => match self.frames.pop() {
					Some(Frame::Statement { .. }) => (),
					_ => return Err(Meta(Error::Unexpected(Some(kind)), span)),
				},
				TokenKind::LangTag | TokenKind::DatatypeMarker => {
					return Err(Meta(Error::Unexpected(Some(kind)), span))
				}
			}
		}
	}

	/// Pulls the IRI of a declaration, which must be the very next token.
	fn declaration_value(&mut self, label_span: Span) -> Result<Meta<String, Span>, MetaError> {
		match self.pull() {
			Some(Meta(token, span)) => match token.kind() {
				TokenKind::Iri => Ok(Meta(token.into_text(), span)),
				TokenKind::Error(e) => Err(Meta(Error::Lexer(e), span)),
				_ => Err(Meta(Error::MissingDeclarationValue, span)),
			},
			None => Err(Meta(Error::MissingDeclarationValue, label_span)),
		}
	}

	/// Builds a literal, with the language tag or datatype following it.
	fn literal(&mut self, value: String) -> Result<Literal, MetaError> {
		match self.peek_kind() {
			Some(TokenKind::LangTag) => {
				let Meta(tag, span) = self.pull_or_fail()?;
				Literal::lang_string(value, tag.into_text()).map_err(at(span))
			}
			Some(TokenKind::DatatypeMarker) => {
				self.pull_or_fail()?;
				let Meta(datatype, span) = self.pull_or_fail()?;
				let iri = match datatype.kind() {
					TokenKind::Iri => self.context.resolve_iri_ref(datatype.text()),
					TokenKind::PrefixedName => self.context.expand(datatype.text()),
					TokenKind::Error(e) => return Err(Meta(Error::Lexer(e), span)),
					kind => return Err(Meta(Error::Unexpected(Some(kind)), span)),
				}
				.map_err(at(span))?;
				Ok(Literal::Typed(value, iri))
			}
			_ => Ok(Literal::String(value)),
		}
	}

	/// Expands a collection into its `rdf:first`/`rdf:rest` chain and returns
	/// the head of the list.
	fn collection(&mut self, items: Vec<Object>) -> Object {
		let nodes: Vec<BlankNode> = items.iter().map(|_| self.context.fresh_blank()).collect();

		for (i, item) in items.into_iter().enumerate() {
			let node = Subject::Blank(nodes[i].clone());
			let rest = match nodes.get(i + 1) {
				Some(next) => Object::Blank(next.clone()),
				None => Object::Iri(RDF_NIL.to_string()),
			};

			self.triples
				.push(Triple::new(node.clone(), RDF_FIRST.to_string(), item));
			self.triples
				.push(Triple::new(node, RDF_REST.to_string(), rest));
		}

		match nodes.into_iter().next() {
			Some(head) => Object::Blank(head),
			None => Object::Iri(RDF_NIL.to_string()),
		}
	}

	/// Places a term in the innermost construct.
	fn place(&mut self, term: Object, kind: TokenKind, span: Span) -> Result<(), MetaError> {
		match self.frames.last_mut() {
			None => match term.into_subject() {
				Some(subject) => self.frames.push(Frame::Statement {
					subject,
					predicate: None,
				}),
				None => return Err(Meta(Error::Unexpected(Some(kind)), span)),
			},
			Some(
				Frame::Statement {
					predicate: predicate @ None,
					..
				}
				| Frame::PropertyList {
					predicate: predicate @ None,
					..
				},
			) => match term {
				Object::Iri(iri) => *predicate = Some(iri),
				_ => return Err(Meta(Error::Unexpected(Some(kind)), span)),
			},
			Some(Frame::Statement {
				subject,
				predicate: Some(predicate),
			}) => self
				.triples
				.push(Triple::new(subject.clone(), predicate.clone(), term)),
			Some(Frame::PropertyList {
				node,
				predicate: Some(predicate),
			}) => self.triples.push(Triple::new(
				Subject::Blank(node.clone()),
				predicate.clone(),
				term,
			)),
			Some(Frame::Collection { items }) => items.push(term),
		}

		Ok(())
	}
}
