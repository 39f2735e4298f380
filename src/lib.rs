pub mod config;
pub mod dedup;
pub mod document;
pub mod errors;
pub mod estimate;
pub mod extract;
pub mod generate;
pub mod index;
pub mod normalize;
pub mod pipeline;
pub mod plan;
pub mod readers;
pub mod store;
pub mod template;
pub mod terms;
pub mod vocab;


use errors::MappingError;
use plan::Plan;
use store::BlankNodes;


/// Compiles an RML mapping document and streams the mapped data out as
/// N-Quads.
///
/// A mapping document is itself an RDF graph: it names the CSV sources to
/// read and, per source, how each row becomes quads. Compilation happens in
/// three steps. The document is parsed into a small in-memory triple store,
/// the store is rewritten until every short-hand in the document has its
/// canonical form, and the canonical graph is walked into immutable plan
/// records. The plan then drives generation: one worker per triples map,
/// rows in, quad batches out, with joins against other sources resolved
/// through indexes built up front.
///
/// ```no_run
/// use materializer::pipeline::{materialize, RunOptions};
///
/// let document = std::fs::read_to_string("mapping.ttl")?;
/// let plan = materializer::compile(&document)?;
/// let out = std::fs::File::create("output.nq")?;
/// let summary = materialize(&plan, &RunOptions::default(), out)?;
/// println!("{} quads", summary.written);
/// # Ok::<(), Box<dyn std::error::Error>>(())
/// ```
pub fn compile(document: &str) -> Result<Plan, MappingError> {
    let (mut store, base_iri) = document::load_document(document)?;

    let mut nodes = BlankNodes::new();
    normalize::normalize(&mut store, &mut nodes);

    extract::extract_plan(&store, &base_iri)
}
