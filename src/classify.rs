//! Turtle grammar classification.
//!
//! Every predicate here is a cheap test on the beginning of the remaining
//! input, used by the lexer to select its next state. None of them performs a
//! full parse of the production it tests.
//!
//! See <https://www.w3.org/TR/turtle/#sec-grammar-grammar>.
use regex::Regex;
use std::sync::LazyLock;

static INTEGER: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"^[+-]?[0-9]+").unwrap());

static DECIMAL: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"^[+-]?[0-9]*\.[0-9]+").unwrap());

static DOUBLE: LazyLock<Regex> = LazyLock::new(|| {
	Regex::new(r"^[+-]?(?:[0-9]+\.[0-9]*|\.[0-9]+|[0-9]+)[eE][+-]?[0-9]+").unwrap()
});

/// Numeric literal production.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Numeric {
	Integer,
	Decimal,
	Double,
}

/// Matches the numeric literal at the beginning of `s`.
///
/// Returns the byte length of the literal and its production.
/// `DOUBLE` is tried first, then `DECIMAL`, then `INTEGER`, so that the
/// longest production wins.
pub fn numeric_prefix(s: &str) -> Option<(usize, Numeric)> {
	if let Some(m) = DOUBLE.find(s) {
		return Some((m.end(), Numeric::Double));
	}

	if let Some(m) = DECIMAL.find(s) {
		return Some((m.end(), Numeric::Decimal));
	}

	INTEGER.find(s).map(|m| (m.end(), Numeric::Integer))
}

/// Classifies a complete numeric literal text.
pub fn numeric(s: &str) -> Option<Numeric> {
	match numeric_prefix(s) {
		Some((len, n)) if len == s.len() => Some(n),
		_ => None,
	}
}

// [3] directive ::= prefixID | base | sparqlPrefix | sparqlBase
pub fn is_directive(s: &str) -> bool {
	is_prefix_id(s) || is_base(s) || is_sparql_prefix(s) || is_sparql_base(s)
}

/// `@prefix`, case sensitive.
pub fn is_prefix_id(s: &str) -> bool {
	keyword_then_space(s, "@prefix")
}

/// `@base`, case sensitive.
pub fn is_base(s: &str) -> bool {
	keyword_then_space(s, "@base")
}

/// SPARQL `PREFIX`, case insensitive.
pub fn is_sparql_prefix(s: &str) -> bool {
	sparql_keyword_then_space(s, "PREFIX")
}

/// SPARQL `BASE`, case insensitive.
pub fn is_sparql_base(s: &str) -> bool {
	sparql_keyword_then_space(s, "BASE")
}

fn keyword_then_space(s: &str, keyword: &str) -> bool {
	s.strip_prefix(keyword).is_some_and(starts_with_whitespace)
}

fn sparql_keyword_then_space(s: &str, keyword: &'static str) -> bool {
	match s.get(..keyword.len()) {
		Some(candidate) => {
			candidate == unicase::Ascii::new(keyword)
				&& starts_with_whitespace(&s[keyword.len()..])
		}
		None => false,
	}
}

fn starts_with_whitespace(s: &str) -> bool {
	s.starts_with(char::is_whitespace)
}

// [6] triples ::= subject predicateObjectList | blankNodePropertyList predicateObjectList?
pub fn is_triples(s: &str) -> bool {
	is_subject(s) || is_blank_node_property_list(s)
}

// [7] predicateObjectList ::= verb objectList (';' (verb objectList)?)*
pub fn is_predicate_object_list(s: &str) -> bool {
	is_verb(s)
}

// [9] verb ::= predicate | 'a'
pub fn is_verb(s: &str) -> bool {
	is_iri(s) || is_a(s)
}

/// The `a` shorthand for `rdf:type`.
pub fn is_a(s: &str) -> bool {
	match s.strip_prefix('a') {
		Some(rest) => !rest.starts_with(|c: char| is_pn_chars(c) || matches!(c, ':' | '.')),
		None => false,
	}
}

// [10] subject ::= iri | BlankNode | collection
pub fn is_subject(s: &str) -> bool {
	is_iri(s) || is_blank_node(s) || is_collection(s)
}

// [12] object ::= iri | BlankNode | collection | blankNodePropertyList | literal
pub fn is_object(s: &str) -> bool {
	is_iri(s)
		|| is_blank_node(s)
		|| is_collection(s)
		|| is_blank_node_property_list(s)
		|| is_literal(s)
}

// [13] literal ::= RDFLiteral | NumericLiteral | BooleanLiteral
pub fn is_literal(s: &str) -> bool {
	is_string(s) || is_numeric(s) || is_boolean(s)
}

// [14] blankNodePropertyList ::= '[' predicateObjectList ']'
pub fn is_blank_node_property_list(s: &str) -> bool {
	s.starts_with('[')
}

// [15] collection ::= '(' object* ')'
pub fn is_collection(s: &str) -> bool {
	s.starts_with('(')
}

// [16] NumericLiteral ::= INTEGER | DECIMAL | DOUBLE
pub fn is_numeric(s: &str) -> bool {
	numeric_prefix(s).is_some()
}

pub fn is_integer(s: &str) -> bool {
	matches!(numeric_prefix(s), Some((_, Numeric::Integer)))
}

pub fn is_decimal(s: &str) -> bool {
	matches!(numeric_prefix(s), Some((_, Numeric::Decimal)))
}

pub fn is_double(s: &str) -> bool {
	matches!(numeric_prefix(s), Some((_, Numeric::Double)))
}

// [133s] BooleanLiteral ::= 'true' | 'false'
pub fn is_boolean(s: &str) -> bool {
	boolean_len(s).is_some()
}

/// Byte length of the boolean literal at the beginning of `s`.
pub fn boolean_len(s: &str) -> Option<usize> {
	["true", "false"].into_iter().find_map(|keyword| {
		let rest = s.strip_prefix(keyword)?;
		if rest.starts_with(|c: char| is_pn_chars(c) || c == ':') {
			None
		} else {
			Some(keyword.len())
		}
	})
}

// [17] String ::= STRING_LITERAL_QUOTE | STRING_LITERAL_SINGLE_QUOTE
//              | STRING_LITERAL_LONG_SINGLE_QUOTE | STRING_LITERAL_LONG_QUOTE
pub fn is_string(s: &str) -> bool {
	s.starts_with('"') || s.starts_with('\'')
}

pub fn is_long_string(s: &str) -> bool {
	s.starts_with("\"\"\"") || s.starts_with("'''")
}

// [135s] iri ::= IRIREF | PrefixedName
pub fn is_iri(s: &str) -> bool {
	is_iri_ref(s) || is_prefixed_name(s)
}

pub fn is_iri_ref(s: &str) -> bool {
	s.starts_with('<')
}

// [136s] PrefixedName ::= PNAME_LN | PNAME_NS
//
// Checks that a (possibly empty) prefix label is followed by `:`.
pub fn is_prefixed_name(s: &str) -> bool {
	let mut chars = s.chars();
	match chars.next() {
		Some(':') => true,
		Some(c) if is_pn_chars_base(c) => {
			let rest = chars.as_str();
			let label_end = rest
				.find(|c: char| !(is_pn_chars(c) || c == '.'))
				.unwrap_or(rest.len());
			rest[label_end..].starts_with(':') && !rest[..label_end].ends_with('.')
		}
		_ => false,
	}
}

// [137s] BlankNode ::= BLANK_NODE_LABEL | ANON
pub fn is_blank_node(s: &str) -> bool {
	is_blank_node_label(s) || is_anon(s)
}

pub fn is_blank_node_label(s: &str) -> bool {
	s.starts_with("_:")
}

// [162s] ANON ::= '[' WS* ']'
pub fn is_anon(s: &str) -> bool {
	s.strip_prefix('[')
		.is_some_and(|rest| rest.trim_start().starts_with(']'))
}

pub fn is_lang_tag(s: &str) -> bool {
	s.starts_with('@')
}

pub fn is_datatype_marker(s: &str) -> bool {
	s.starts_with("^^")
}

pub fn is_comment(s: &str) -> bool {
	s.starts_with('#')
}

/// Checks that the dots at the beginning of `s` are followed by a character
/// matching `f`.
///
/// Names may contain dots, but cannot end with one.
pub fn dots_then(s: &str, f: impl Fn(char) -> bool) -> bool {
	s.trim_start_matches('.').starts_with(f)
}

pub fn is_pn_chars_base(c: char) -> bool {
	matches!(c, 'A'..='Z' | 'a'..='z' | '\u{00c0}'..='\u{00d6}' | '\u{00d8}'..='\u{00f6}' | '\u{00f8}'..='\u{02ff}' | '\u{0370}'..='\u{037d}' | '\u{037f}'..='\u{1fff}' | '\u{200c}'..='\u{200d}' | '\u{2070}'..='\u{218f}' | '\u{2c00}'..='\u{2fef}' | '\u{3001}'..='\u{d7ff}' | '\u{f900}'..='\u{fdcf}' | '\u{fdf0}'..='\u{fffd}' | '\u{10000}'..='\u{effff}')
}

pub fn is_pn_chars_u(c: char) -> bool {
	is_pn_chars_base(c) || c == '_'
}

pub fn is_pn_chars(c: char) -> bool {
	is_pn_chars_u(c)
		|| matches!(c, '-' | '0'..='9' | '\u{00b7}' | '\u{0300}'..='\u{036f}' | '\u{203f}'..='\u{2040}')
}

/// Characters that may follow a `\` in a local name.
pub fn is_pn_local_escape(c: char) -> bool {
	matches!(
		c,
		'_' | '~' | '.' | '-' | '!' | '$' | '&' | '\'' | '(' | ')' | '*' | '+' | ',' | ';' | '='
			| '/' | '?' | '#' | '@' | '%'
	)
}

/// Characters that may continue a local name, escapes included.
pub fn is_pn_local_char(c: char) -> bool {
	is_pn_chars(c) || matches!(c, ':' | '%' | '\\')
}
