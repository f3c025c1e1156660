//! RDF terms and graph.
use crate::classify::{self, Numeric};
use crate::lexing::Token;
use iref::{Iri, IriBuf, IriRef};
use langtag::LanguageTagBuf;
use locspan::{Meta, Span};
use static_iref::iri;
use std::borrow::Cow;
use std::collections::BTreeMap;
use std::fmt;

pub const RDF_TYPE: Iri<'static> = iri!("http://www.w3.org/1999/02/22-rdf-syntax-ns#type");
pub const RDF_NIL: Iri<'static> = iri!("http://www.w3.org/1999/02/22-rdf-syntax-ns#nil");
pub const RDF_FIRST: Iri<'static> = iri!("http://www.w3.org/1999/02/22-rdf-syntax-ns#first");
pub const RDF_REST: Iri<'static> = iri!("http://www.w3.org/1999/02/22-rdf-syntax-ns#rest");
pub const XSD_BOOLEAN: Iri<'static> = iri!("http://www.w3.org/2001/XMLSchema#boolean");
pub const XSD_INTEGER: Iri<'static> = iri!("http://www.w3.org/2001/XMLSchema#integer");
pub const XSD_DECIMAL: Iri<'static> = iri!("http://www.w3.org/2001/XMLSchema#decimal");
pub const XSD_DOUBLE: Iri<'static> = iri!("http://www.w3.org/2001/XMLSchema#double");

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum Error {
	#[error("cannot resolve relative IRI <{0}>: no base IRI")]
	NoBaseIri(String),

	#[error("unknown IRI prefix `{0}`")]
	UnknownPrefix(String),

	#[error("invalid IRI reference <{0}>")]
	InvalidIriRef(String),

	#[error("invalid language tag `{0}`")]
	InvalidLangTag(String),
}

#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum BlankNode {
	/// Blank node labelled in the document, without the `_:`.
	Label(String),

	/// Blank node allocated for a collection or a blank node property list.
	Anonymous(usize),
}

impl fmt::Display for BlankNode {
	fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
		match self {
			Self::Label(label) => write!(f, "_:{label}"),
			// No label starts with `-`.
			Self::Anonymous(n) => write!(f, "_:-anon{n}"),
		}
	}
}

#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum Subject {
	Iri(String),
	Blank(BlankNode),
}

impl fmt::Display for Subject {
	fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
		match self {
			Self::Iri(iri) => write!(f, "<{iri}>"),
			Self::Blank(b) => b.fmt(f),
		}
	}
}

/// Literal value.
///
/// The lexical form is the literal text as written, escape sequences
/// included.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum Literal {
	String(String),
	LangString(String, String),
	Typed(String, String),
}

impl Literal {
	/// Creates a language-tagged string, checking the tag.
	pub fn lang_string(value: String, tag: String) -> Result<Self, Error> {
		match LanguageTagBuf::new(tag.clone().into_bytes()) {
			Ok(_) => Ok(Self::LangString(value, tag)),
			Err(_) => Err(Error::InvalidLangTag(tag)),
		}
	}

	/// Creates a numeric literal, typed after its lexical form.
	///
	/// Returns `None` if `value` is not a numeric literal.
	pub fn numeric(value: String) -> Option<Self> {
		let datatype = match classify::numeric(&value)? {
			Numeric::Integer => XSD_INTEGER,
			Numeric::Decimal => XSD_DECIMAL,
			Numeric::Double => XSD_DOUBLE,
		};

		Some(Self::Typed(value, datatype.to_string()))
	}

	pub fn boolean(value: String) -> Self {
		Self::Typed(value, XSD_BOOLEAN.to_string())
	}
}

impl fmt::Display for Literal {
	fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
		match self {
			Self::String(s) => write!(f, "\"{s}\""),
			Self::LangString(s, tag) => write!(f, "\"{s}\"@{tag}"),
			Self::Typed(s, datatype) => write!(f, "\"{s}\"^^<{datatype}>"),
		}
	}
}

#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum Object {
	Iri(String),
	Blank(BlankNode),
	Literal(Literal),
}

impl Object {
	/// Turns this object into a subject, unless it is a literal.
	pub fn into_subject(self) -> Option<Subject> {
		match self {
			Self::Iri(iri) => Some(Subject::Iri(iri)),
			Self::Blank(b) => Some(Subject::Blank(b)),
			Self::Literal(_) => None,
		}
	}
}

impl fmt::Display for Object {
	fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
		match self {
			Self::Iri(iri) => write!(f, "<{iri}>"),
			Self::Blank(b) => b.fmt(f),
			Self::Literal(l) => l.fmt(f),
		}
	}
}

#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Triple {
	pub subject: Subject,
	pub predicate: String,
	pub object: Object,
}

impl Triple {
	pub fn new(subject: Subject, predicate: String, object: Object) -> Self {
		Self {
			subject,
			predicate,
			object,
		}
	}
}

impl fmt::Display for Triple {
	fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
		write!(f, "{} <{}> {} .", self.subject, self.predicate, self.object)
	}
}

/// Prefix declarations, by label.
///
/// The empty label is the default prefix.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PrefixTable(BTreeMap<String, String>);

impl PrefixTable {
	pub fn new() -> Self {
		Self::default()
	}

	pub fn get(&self, label: &str) -> Option<&str> {
		self.0.get(label).map(String::as_str)
	}

	/// Binds `label` to `iri`, returning the previous binding.
	pub fn insert(&mut self, label: String, iri: String) -> Option<String> {
		self.0.insert(label, iri)
	}

	pub fn len(&self) -> usize {
		self.0.len()
	}

	pub fn is_empty(&self) -> bool {
		self.0.is_empty()
	}

	/// Iterates over the declarations, sorted by label.
	pub fn iter(&self) -> impl Iterator<Item = (&str, &str)> {
		self.0
			.iter()
			.map(|(label, iri)| (label.as_str(), iri.as_str()))
	}
}

impl<'a> IntoIterator for &'a PrefixTable {
	type Item = (&'a String, &'a String);
	type IntoIter = std::collections::btree_map::Iter<'a, String, String>;

	fn into_iter(self) -> Self::IntoIter {
		self.0.iter()
	}
}

/// Parsed document.
#[derive(Debug, Clone)]
pub struct Graph {
	prefixes: PrefixTable,
	base_iri: Option<String>,
	triples: Vec<Triple>,
	tokens: Vec<Meta<Token, Span>>,
}

impl Graph {
	pub(crate) fn new(
		context: Context,
		triples: Vec<Triple>,
		tokens: Vec<Meta<Token, Span>>,
	) -> Self {
		Self {
			base_iri: context.base_iri(),
			prefixes: context.prefixes,
			triples,
			tokens,
		}
	}

	pub fn prefix_table(&self) -> &PrefixTable {
		&self.prefixes
	}

	/// Base IRI in effect at the end of the document.
	pub fn base_iri(&self) -> Option<&str> {
		self.base_iri.as_deref()
	}

	/// Triples, in document order.
	pub fn triples(&self) -> &[Triple] {
		&self.triples
	}

	/// Every token of the document, comments included.
	pub fn tokens(&self) -> &[Meta<Token, Span>] {
		&self.tokens
	}
}

/// Expansion context.
///
/// Resolves IRI references against the current base IRI, expands prefixed
/// names and allocates fresh blank nodes.
#[derive(Debug, Default)]
pub struct Context {
	/// Base IRI, with its escape sequences masked.
	base_iri: Option<IriBuf>,
	escaped_base: bool,
	prefixes: PrefixTable,
	blank_ids: usize,
}

/// Stands for the backslash of escape sequences while resolving, since IRI
/// references cannot contain it.
const ESCAPE_MASK: &str = "%5C";

fn mask_escapes(iri_ref: &str) -> Cow<str> {
	if iri_ref.contains('\\') {
		Cow::Owned(iri_ref.replace('\\', ESCAPE_MASK))
	} else {
		Cow::Borrowed(iri_ref)
	}
}

fn unmask_escapes(iri: &str) -> String {
	iri.replace(ESCAPE_MASK, "\\")
}

impl Context {
	pub fn new(base_iri: Option<IriBuf>) -> Self {
		Self {
			base_iri,
			..Self::default()
		}
	}

	pub fn prefixes(&self) -> &PrefixTable {
		&self.prefixes
	}

	/// Resolves an IRI reference against the base IRI.
	///
	/// Without base IRI, the reference is returned unchanged. Escape sequences
	/// (`\u00E9`) are kept as written.
	pub fn resolve_iri_ref(&self, iri_ref: &str) -> Result<String, Error> {
		match &self.base_iri {
			Some(base_iri) => {
				let escaped = iri_ref.contains('\\');
				match IriRef::new(&*mask_escapes(iri_ref)) {
					Ok(r) => {
						let iri = r.resolved(base_iri.as_iri()).to_string();
						if escaped || self.escaped_base {
							Ok(unmask_escapes(&iri))
						} else {
							Ok(iri)
						}
					}
					Err(_) => Err(Error::InvalidIriRef(iri_ref.to_owned())),
				}
			}
			None => Ok(iri_ref.to_owned()),
		}
	}

	pub fn set_base_iri(&mut self, iri_ref: &str) -> Result<(), Error> {
		let masked = mask_escapes(iri_ref);
		let base_iri = match &self.base_iri {
			Some(current) => match IriRef::new(&*masked) {
				Ok(r) => r.resolved(current.as_iri()),
				Err(_) => return Err(Error::InvalidIriRef(iri_ref.to_owned())),
			},
			None => match IriBuf::new(&*masked) {
				Ok(iri) => iri,
				Err(_) if IriRef::new(&*masked).is_ok() => {
					return Err(Error::NoBaseIri(iri_ref.to_owned()))
				}
				Err(_) => return Err(Error::InvalidIriRef(iri_ref.to_owned())),
			},
		};

		self.escaped_base = base_iri.as_str().contains(ESCAPE_MASK);
		log::debug!("base IRI set to <{}>", unmask_escapes(base_iri.as_str()));
		self.base_iri = Some(base_iri);
		Ok(())
	}

	/// Base IRI, escape sequences included.
	fn base_iri(&self) -> Option<String> {
		let base_iri = self.base_iri.as_ref()?;
		if self.escaped_base {
			Some(unmask_escapes(base_iri.as_str()))
		} else {
			Some(base_iri.to_string())
		}
	}

	/// Declares a prefix. The IRI reference is resolved first.
	pub fn insert_prefix(&mut self, label: String, iri_ref: &str) -> Result<(), Error> {
		let iri = self.resolve_iri_ref(iri_ref)?;
		log::debug!("prefix `{label}:` bound to <{iri}>");
		if let Some(previous) = self.prefixes.insert(label, iri) {
			log::debug!("previous binding <{previous}> overwritten");
		}

		Ok(())
	}

	/// Expands a prefixed name, written `label:local`.
	///
	/// Backslash escapes of the local name are removed, percent escapes are
	/// kept.
	pub fn expand(&self, prefixed_name: &str) -> Result<String, Error> {
		let (label, local) = prefixed_name
			.split_once(':')
			.ok_or_else(|| Error::UnknownPrefix(prefixed_name.to_owned()))?;
		let iri = self
			.prefixes
			.get(label)
			.ok_or_else(|| Error::UnknownPrefix(label.to_owned()))?;

		let mut expanded = String::with_capacity(iri.len() + local.len());
		expanded.push_str(iri);
		let mut chars = local.chars();
		while let Some(c) = chars.next() {
			match c {
				'\\' => expanded.extend(chars.next()),
				c => expanded.push(c),
			}
		}

		Ok(expanded)
	}

	pub fn fresh_blank(&mut self) -> BlankNode {
		let b = BlankNode::Anonymous(self.blank_ids);
		self.blank_ids += 1;
		b
	}
}
