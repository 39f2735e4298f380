//! The slice of the R2RML/RML vocabularies the rule compiler understands,
//! plus the synthetic predicates minted while normalizing.

pub const RDF_TYPE: &str = "http://www.w3.org/1999/02/22-rdf-syntax-ns#type";

pub const TRIPLES_MAP: &str = "http://www.w3.org/ns/r2rml#TriplesMap";
pub const IRI_TERM_TYPE: &str = "http://www.w3.org/ns/r2rml#IRI";
pub const LITERAL_TERM_TYPE: &str = "http://www.w3.org/ns/r2rml#Literal";
pub const BLANK_NODE_TERM_TYPE: &str = "http://www.w3.org/ns/r2rml#BlankNode";

pub const RR_SUBJECT: &str = "http://www.w3.org/ns/r2rml#subject";
pub const RR_PREDICATE: &str = "http://www.w3.org/ns/r2rml#predicate";
pub const RR_OBJECT: &str = "http://www.w3.org/ns/r2rml#object";
pub const RR_GRAPH: &str = "http://www.w3.org/ns/r2rml#graph";
pub const RR_DATATYPE: &str = "http://www.w3.org/ns/r2rml#datatype";
pub const RR_LANGUAGE: &str = "http://www.w3.org/ns/r2rml#language";

pub const RR_SUBJECT_MAP: &str = "http://www.w3.org/ns/r2rml#subjectMap";
pub const RR_PREDICATE_MAP: &str = "http://www.w3.org/ns/r2rml#predicateMap";
pub const RR_OBJECT_MAP: &str = "http://www.w3.org/ns/r2rml#objectMap";
pub const RR_GRAPH_MAP: &str = "http://www.w3.org/ns/r2rml#graphMap";
pub const RR_DATATYPE_MAP: &str = "http://www.w3.org/ns/r2rml#datatypeMap";
pub const RR_LANGUAGE_MAP: &str = "http://www.w3.org/ns/r2rml#languageMap";

pub const RR_CONSTANT: &str = "http://www.w3.org/ns/r2rml#constant";
pub const RR_TEMPLATE: &str = "http://www.w3.org/ns/r2rml#template";
pub const RR_TERM_TYPE: &str = "http://www.w3.org/ns/r2rml#termType";
pub const RR_CLASS: &str = "http://www.w3.org/ns/r2rml#class";
pub const RR_PREDICATE_OBJECT_MAP: &str = "http://www.w3.org/ns/r2rml#predicateObjectMap";
pub const RR_PARENT_TRIPLES_MAP: &str = "http://www.w3.org/ns/r2rml#parentTriplesMap";
pub const RR_JOIN_CONDITION: &str = "http://www.w3.org/ns/r2rml#joinCondition";
pub const RR_PARENT: &str = "http://www.w3.org/ns/r2rml#parent";
pub const RR_CHILD: &str = "http://www.w3.org/ns/r2rml#child";
pub const RR_DEFAULT_GRAPH: &str = "http://www.w3.org/ns/r2rml#defaultGraph";

pub const RML_REFERENCE: &str = "http://semweb.mmlab.be/ns/rml#reference";
pub const RML_LOGICAL_SOURCE: &str = "http://semweb.mmlab.be/ns/rml#logicalSource";
pub const RML_SOURCE: &str = "http://semweb.mmlab.be/ns/rml#source";
pub const RML_ITERATOR: &str = "http://semweb.mmlab.be/ns/rml#iterator";
pub const RML_REFERENCE_FORMULATION: &str = "http://semweb.mmlab.be/ns/rml#referenceFormulation";
pub const CSV_REFERENCE_FORMULATION: &str = "http://semweb.mmlab.be/ns/ql#CSV";

/// Names an in-memory source in place of a file path.
pub const SD_NAME: &str = "https://w3id.org/okn/o/sd#name";

// Synthetic predicates attached while flattening joins. They live under a
// reserved example-scheme authority and never reach the output.
pub const EX_PARENT_SOURCE: &str = "http://www.example.com#parentSource";
pub const EX_PARENT_REFERENCE_FORMULATION: &str = "http://www.example.com#parentRef";
pub const EX_JOIN_REFERENCE_CONDITION: &str = "http://www.example.com#joinReferenceCondition";
