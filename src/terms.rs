//! Final shaping of generated values into N-Quads terms.

use tracing::warn;

use crate::plan::TermType;

/// Bytes that disqualify a generated IRI outright. Values interpolated into
/// the template were percent-encoded already, so a hit here comes from the
/// template's fixed text or a constant.
const IRI_REJECT: &[char] = &[' ', '!', '"', '\'', '(', ')', ',', '[', ']'];

/// Wrap a generated value according to its term type. Returns `None` for an
/// invalid IRI, which skips the quad rather than aborting the run.
pub fn shape(term_type: TermType, node: &str) -> Option<String> {
    match term_type {
        TermType::Iri => {
            if node.contains(IRI_REJECT) {
                warn!(iri = %node, "invalid IRI, skipped");
                return None;
            }
            Some(format!("<{node}>"))
        }
        TermType::BlankNode => Some(format!("_:{node}")),
        TermType::Literal => {
            // literals lose their backslashes and gain quotes, nothing else
            let cleaned: String = node.chars().filter(|c| *c != '\\').collect();
            Some(format!("\"{cleaned}\""))
        }
    }
}
