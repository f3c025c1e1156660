use locspan::Meta;
use turtle_lexfn::{build, lexing, parse_document, parsing::Error, TokenKind};

fn init_logger() {
	stderrlog::new().verbosity(1).init().ok();
}

fn error_of(input: &str) -> Error {
	init_logger();
	match parse_document(input) {
		Ok(_) => panic!("`{input}` should not parse"),
		Err(Meta(e, _)) => e,
	}
}

macro_rules! negative_test {
	($($id:ident: $input:expr => $expected:expr),* $(,)?) => {
		$(
			#[test]
			fn $id () {
				assert_eq!(error_of($input), $expected)
			}
		)*
	};
}

negative_test! {
	unknown_prefix: "unknown:thing <http://example.org/p> <http://example.org/o> ." =>
		Error::Build(build::Error::UnknownPrefix("unknown".to_owned())),
	unknown_object_prefix: "@prefix ex: <http://example.org/> .\nex:s ex:p nope:o ." =>
		Error::Build(build::Error::UnknownPrefix("nope".to_owned())),
	unterminated_iri: "<http://example.org" =>
		Error::Lexer(lexing::Error::UnterminatedIri),
	unterminated_literal: "<s> <p> \"never closed ." =>
		Error::Lexer(lexing::Error::UnterminatedLiteral),
	case_sensitive_at_prefix: "@PREFIX ex: <http://example.org/> ." =>
		Error::Lexer(lexing::Error::UnknownDirective),
	unknown_directive: "@import <http://example.org/> ." =>
		Error::Lexer(lexing::Error::UnknownDirective),
	literal_verb: "<s> \"p\" <o> ." =>
		Error::Lexer(lexing::Error::MalformedVerb),
	missing_object: "<s> <p> ." =>
		Error::Lexer(lexing::Error::Unexpected('.')),
	end_of_input_in_statement: "<s> <p> <o>" =>
		Error::Lexer(lexing::Error::UnexpectedEndOfInput),
	unclosed_collection: "<s> <p> ( ( 1 ) ." =>
		Error::Lexer(lexing::Error::Unexpected('.')),
	unclosed_property_list: "<s> <p> [ <q> <r> ." =>
		Error::Lexer(lexing::Error::Unexpected('.')),
	missing_directive_dot: "@prefix ex: <http://example.org/>\nex:s ex:p ex:o ." =>
		Error::Lexer(lexing::Error::Unexpected('e')),
	space_in_iri: "<http://example.org/a b> <p> <o> ." =>
		Error::Lexer(lexing::Error::Unexpected(' ')),
	bad_percent_escape: "@prefix ex: <http://example.org/> .\nex:s ex:p ex:a%2x ." =>
		Error::Lexer(lexing::Error::Unexpected('x')),
	invalid_lang_tag: "<s> <p> \"chat\"@abcdefghi ." =>
		Error::Build(build::Error::InvalidLangTag("abcdefghi".to_owned())),
	relative_base: "@base <relative/> ." =>
		Error::Build(build::Error::NoBaseIri("relative/".to_owned())),
}

#[test]
fn unterminated_iri_closes_the_stream() {
	let tokens: Vec<_> = lexing::start("<http://example.org")
		.map(|Meta(token, _)| token.kind())
		.collect();
	assert_eq!(
		tokens,
		vec![TokenKind::Error(lexing::Error::UnterminatedIri)]
	);
}

#[test]
fn error_location() {
	init_logger();
	let input = "<s> <p> <o> .\n<s> \"p\" <o> .";
	let Meta(e, span) = parse_document(input).unwrap_err();
	assert_eq!(e, Error::Lexer(lexing::Error::MalformedVerb));
	assert_eq!(&input[span.start()..span.end()], "\"");
}

#[test]
fn prefix_table_is_not_mistaken_for_a_graph() {
	init_logger();
	let mut parser = turtle_lexfn::Parser::new(
		lexing::start("@prefix ex: <http://example.org/> .\nex:s ex:p missing:o ."),
		None,
	);
	assert!(parser.run().is_err());
	assert_eq!(parser.phase(), turtle_lexfn::Phase::Failed);
	assert!(!parser.tokens().is_empty());
	assert!(parser.into_graph().is_none());
}
