//! Turtle ingestion for mapping documents.
//!
//! The heavy lifting is the parser's: it expands prefixes and resolves
//! relative IRIs, and hands us plain triples in document order. We flatten
//! its terms into the pre-shaped strings the rule store works with and keep
//! the document's `@base` around for subject generation.

use sophia::api::prelude::*;
use sophia::api::term::Term;
use sophia::api::triple::Triple as _;
use sophia::turtle::parser::turtle;
use tracing::debug;

use crate::errors::MappingError;
use crate::store::{Triple, TripleStore};


/// Parse a Turtle mapping document into a rule store, together with the
/// `@base` IRI declared by the document (empty when there is none).
pub fn load_document(source: &str) -> Result<(TripleStore, String), MappingError> {
    let base_iri = extract_base_iri(source);

    let mut store = TripleStore::new();
    turtle::parse_bufread(source.as_bytes())
        .for_each_triple(|t| {
            store.insert(Triple::new(term_text(t.s()), term_text(t.p()), term_text(t.o())));
        })
        .map_err(|e| MappingError::Turtle(e.to_string()))?;

    debug!(triples = store.len(), base = %base_iri, "loaded mapping document");

    Ok((store, base_iri))
}

/// Flatten a parsed term into the store's string form: IRIs without angle
/// brackets, blank node labels without the `_:` prefix, literals as their
/// lexical form.
fn term_text<T: Term>(term: T) -> String {
    if let Some(iri) = term.iri() {
        iri.as_str().to_string()
    } else if let Some(label) = term.bnode_id() {
        label.as_str().to_string()
    } else if let Some(lex) = term.lexical_form() {
        lex.to_string()
    } else {
        String::new()
    }
}

/// Recover the base IRI from the raw document text. The parser resolves
/// relative IRIs itself but keeps the base to itself, so we scan for the
/// declaration line the same way the rest of the pipeline reads CSV: one
/// line at a time, whitespace trimmed.
fn extract_base_iri(source: &str) -> String {
    for line in source.lines() {
        let line = line.trim();
        if line.starts_with("@base") || line.starts_with("BASE") {
            if let (Some(open), Some(close)) = (line.find('<'), line.find('>')) {
                if open < close {
                    return line[open + 1..close].to_string();
                }
            }
        }
    }
    String::new()
}
