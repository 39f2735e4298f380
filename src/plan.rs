//! The executable plan produced by rule compilation.
//!
//! Everything in here is immutable once extraction finishes: workers share
//! the plan by reference and never write back into it.

use std::collections::HashMap;


/// Where a term map gets its value from. After normalization exactly one
/// source is populated per map, so the tagged enum is the honest shape.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TermSource {
    Template(String),
    Reference(String),
    Constant(String),
}

impl TermSource {
    /// A reference is a one-placeholder template; viewing any source as a
    /// template keeps the evaluator uniform.
    pub fn as_template(&self) -> Option<String> {
        match self {
            TermSource::Template(t) => Some(t.clone()),
            TermSource::Reference(r) => Some(format!("{{{r}}}")),
            TermSource::Constant(_) => None,
        }
    }
}


#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TermType {
    Iri,
    Literal,
    BlankNode,
}


/// How a logical source is materialized: a file on disk or a named
/// in-memory CSV string registered with the engine.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum SourceKind {
    Path(String),
    Named(String),
}


#[derive(Debug, Clone)]
pub struct LogicalSource {
    pub source: SourceKind,
    pub reference_formulation: String,
    pub iterator: String,
}


/// Graph assignment shared by subject maps and predicate-object maps.
/// The term type is always IRI; anything else dies at extraction.
#[derive(Debug, Clone)]
pub struct GraphMap {
    pub source: TermSource,
}


#[derive(Debug, Clone)]
pub struct SubjectMap {
    pub source: TermSource,
    pub term_type: TermType,
    /// Prefix applied when a generated IRI subject does not already start
    /// with `http://` or `https://`. Taken from the document's `@base`.
    pub base_iri: String,
    pub classes: Vec<String>,
    pub graph: Option<GraphMap>,
}


#[derive(Debug, Clone)]
pub struct PredicateMap {
    pub source: TermSource,
}


#[derive(Debug, Clone)]
pub struct JoinDescriptor {
    pub parent_source: SourceKind,
    pub parent_key: String,
    pub child_key: String,
    /// True when the parent's subject template is exactly one placeholder
    /// equal to the parent key. Enables the single-offset reference index in
    /// place of a full cross-lookup.
    pub reference_condition: bool,
}


#[derive(Debug, Clone)]
pub struct ObjectMap {
    pub source: TermSource,
    pub term_type: TermType,
    pub datatype: Option<String>,
    pub language: Option<String>,
    pub join: Option<JoinDescriptor>,
}


/// Per predicate-object map extras; currently only the graph override.
#[derive(Debug, Clone)]
pub struct PredicateObjectMap {
    pub graph: Option<GraphMap>,
}


/// One compiled unit of work: a logical source, a subject map and the
/// parallel predicate/object/predicate-object vectors (index `k` of each
/// describes the same predicate-object map).
#[derive(Debug, Clone)]
pub struct TriplesMap {
    pub node: String,
    pub logical_source: LogicalSource,
    pub subject: SubjectMap,
    pub predicates: Vec<PredicateMap>,
    pub objects: Vec<ObjectMap>,
    pub predicate_objects: Vec<PredicateObjectMap>,
}


#[derive(Debug, Clone, Default)]
pub struct Plan {
    pub triples_maps: Vec<TriplesMap>,
}


/// A generated quad. An empty graph means the default graph and drops the
/// fourth position on output. All four components are already shaped for
/// N-Quads (`<iri>`, `_:label`, `"literal"`).
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Quad {
    pub subject: String,
    pub predicate: String,
    pub object: String,
    pub graph: String,
}

impl Quad {
    /// Render as one N-Quads line, newline included.
    pub fn to_line(&self) -> String {
        if self.graph.is_empty() {
            format!("{} {} {} .\n", self.subject, self.predicate, self.object)
        } else {
            format!("{} {} {} {} .\n", self.subject, self.predicate, self.object, self.graph)
        }
    }
}


/// Named in-memory CSV inputs, addressed by `sd:name`.
pub type NamedInputs = HashMap<String, String>;
