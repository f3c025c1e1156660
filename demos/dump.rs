use codespan_reporting::diagnostic::{Diagnostic, Label};
use codespan_reporting::files::SimpleFiles;
use codespan_reporting::term::termcolor::{ColorChoice, StandardStream};
use locspan::Meta;
use std::fs::File;
use std::io::Read;
use turtle_lexfn::{parse_document_bytes, Options};

fn main() -> std::io::Result<()> {
	stderrlog::new()
		.module("turtle_lexfn")
		.verbosity(1)
		.init()
		.ok();

	let mut args = std::env::args();
	args.next();

	let mut files = SimpleFiles::new();

	for filename in args {
		let mut file = File::open(&filename)?;
		let mut bytes = Vec::new();
		file.read_to_end(&mut bytes)?;

		match parse_document_bytes(&bytes, Options::default()) {
			Ok(graph) => {
				for (label, iri) in graph.prefix_table().iter() {
					println!("@prefix {label}: <{iri}> .");
				}

				for Meta(token, span) in graph.tokens() {
					println!("# {}..{}\t{token}", span.start(), span.end());
				}

				for triple in graph.triples() {
					println!("{triple}");
				}
			}
			Err(Meta(e, span)) => {
				let source = String::from_utf8_lossy(&bytes).into_owned();
				let file_id = files.add(filename.clone(), source);
				let diagnostic = Diagnostic::error()
					.with_message(format!("parse error: {e}"))
					.with_labels(vec![Label::primary(file_id, span.start()..span.end())]);

				let writer = StandardStream::stderr(ColorChoice::Auto);
				let config = codespan_reporting::term::Config::default();
				if let Err(e) =
					codespan_reporting::term::emit(&mut writer.lock(), &config, &files, &diagnostic)
				{
					eprintln!("unable to render the diagnostic: {e}");
				}

				std::process::exit(1);
			}
		}
	}

	Ok(())
}
