//! Turtle is a textual syntax for RDF that allows an RDF graph to be completely
//! written in a compact and natural text form, with abbreviations for common
//! usage patterns and datatypes. This library provides a state-machine lexer
//! for Turtle documents and a graph builder consuming its token stream. Tokens
//! and errors carry their byte span in the source using the
//! [`locspan`](https://crates.io/crates/locspan) library.
//!
//! ## Basic usage
//!
//! The [`parse_document`] function lexes and parses a whole document, and
//! returns the resulting [`Graph`]: its prefix table, its triples and the
//! token stream it was built from.
//!
//! ```rust
//! use turtle_lexfn::parse_document;
//!
//! let graph = parse_document(
//!   "@prefix ex: <http://example.org/> .\nex:subject ex:pred ex:object .",
//! )
//! .unwrap();
//!
//! assert_eq!(graph.prefix_table().get("ex"), Some("http://example.org/"));
//! for triple in graph.triples() {
//!   println!("{triple}");
//! }
//! ```
//!
//! The token stream can also be consumed directly:
//!
//! ```rust
//! use locspan::Meta;
//! use turtle_lexfn::lexing::{self, TokenKind};
//!
//! for Meta(token, span) in lexing::start("<http://example.org/s> a <http://example.org/C> .") {
//!   if let TokenKind::Error(e) = token.kind() {
//!     eprintln!("{e} at {}..{}", span.start(), span.end());
//!   }
//! }
//! ```
//!
//! Errors are located with a byte span, which can be given to a diagnostic
//! renderer such as [`codespan_reporting`](https://crates.io/crates/codespan-reporting),
//! as the `dump` demo does.
use locspan::{Meta, Span};

pub mod build;
pub mod classify;
mod cursor;
pub mod lexing;
pub mod parsing;

pub use build::{BlankNode, Graph, Literal, Object, PrefixTable, Subject, Triple};
pub use lexing::{Lexer, Token, TokenKind};
pub use parsing::{Options, Parser, Phase};

/// Parses a Turtle document.
pub fn parse_document(input: &str) -> Result<Graph, parsing::MetaError> {
	parse_document_with(input, Options::default())
}

/// Parses a Turtle document with the given options.
pub fn parse_document_with(input: &str, options: Options) -> Result<Graph, parsing::MetaError> {
	match options.queue_capacity {
		Some(capacity) => {
			Parser::new(lexing::spawn(input.to_owned(), capacity), options.base_iri).parse()
		}
		None => Parser::new(lexing::start(input), options.base_iri).parse(),
	}
}

/// Parses a Turtle document given as bytes.
///
/// The input must be valid UTF-8.
pub fn parse_document_bytes(input: &[u8], options: Options) -> Result<Graph, parsing::MetaError> {
	match std::str::from_utf8(input) {
		Ok(input) => parse_document_with(input, options),
		Err(e) => {
			let start = e.valid_up_to();
			let end = e.error_len().map_or(input.len(), |len| start + len);
			Err(Meta(parsing::Error::InvalidUtf8, Span::new(start, end)))
		}
	}
}
