use std::env;
use std::process::ExitCode;
use std::sync::Arc;
use xflow::{
    BodyChunk, BufferSink, Decl, FilterStatus, RecordedResponse, ScopeOptions, StylesheetCache,
    TransformFilter, parse_options,
};

/// A simple CLI that runs one document through the filter and prints the
/// transformed output, as the filter would stream it to a client.
fn main() -> ExitCode {
    env_logger::init();

    let args: Vec<String> = env::args().collect();
    if args.len() < 2 || args.len() > 4 {
        eprintln!("Transform an XML document the way the response filter would.");
        eprintln!();
        eprintln!(
            "Usage: {} <path/to/document.xml> [path/to/stylesheet.xsl] [options]",
            args[0]
        );
        eprintln!();
        eprintln!("Without a stylesheet argument the document's own xml-stylesheet");
        eprintln!("directive is used. Options use the directive syntax, e.g.:");
        eprintln!("  {} page.xml style.xsl \"XIncludes -NoHostFs\"", args[0]);
        return ExitCode::FAILURE;
    }

    let document_path = &args[1];
    let stylesheet = args.get(2);
    let optstr = args.get(3).map(String::as_str).unwrap_or("");

    let decl = match parse_options(optstr, &Decl::default()) {
        Ok(decl) => decl,
        Err(e) => {
            eprintln!("{e}");
            return ExitCode::FAILURE;
        }
    };
    let mut options = ScopeOptions::new(decl);
    if let Some(id) = stylesheet {
        options = options.with_stylesheet(id.clone());
    }

    let body = match std::fs::read(document_path) {
        Ok(body) => body,
        Err(e) => {
            eprintln!("error reading {document_path}: {e}");
            return ExitCode::FAILURE;
        }
    };

    let filter = TransformFilter::new(options, Arc::new(StylesheetCache::new()));
    let mut request = filter.new_request(document_path.clone(), (1, 1), false);
    let mut sink = BufferSink::new();
    let mut meta = RecordedResponse::new();

    let status = filter.process(
        &mut request,
        [BodyChunk::Data(&body), BodyChunk::End],
        &mut sink,
        &mut meta,
    );
    if status != FilterStatus::Ok {
        eprintln!("transform failed (see log output, RUST_LOG=debug for detail)");
        return ExitCode::FAILURE;
    }

    if let Some(content_type) = &meta.content_type {
        eprintln!("Content-Type: {content_type}");
    }
    print!("{}", String::from_utf8_lossy(&sink.data));
    ExitCode::SUCCESS
}
