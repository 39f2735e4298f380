//! Walks the normalized rule store and produces the executable plan.
//!
//! Everything schema-shaped dies here: a triples map without a subject map,
//! duplicated singular fields, unknown language subtags, non-IRI graph term
//! types, or a reference formulation other than CSV. Generation downstream
//! can then assume a well-formed plan.

use tracing::debug;

use crate::errors::MappingError;
use crate::plan::{
    GraphMap,
    JoinDescriptor,
    LogicalSource,
    ObjectMap,
    Plan,
    PredicateMap,
    PredicateObjectMap,
    SourceKind,
    SubjectMap,
    TermSource,
    TermType,
    TriplesMap,
};
use crate::store::TripleStore;
use crate::vocab::*;

// Primary language subtags the engine accepts (ISO 639-1).
const VALID_LANGUAGE_SUBTAGS: [&str; 20] = [
    "en", "es", "fr", "de", "zh", "it", "ja", "ko", "no", "pt", "ru", "ar", "cs", "da", "nl",
    "fi", "el", "hi", "hu", "ro",
];


/// Compile the normalized store into plan records, one per triples map.
pub fn extract_plan(store: &TripleStore, base_iri: &str) -> Result<Plan, MappingError> {
    let mut triples_maps = Vec::new();

    for node in store.subjects_of(RDF_TYPE, TRIPLES_MAP) {
        let logical_source = extract_logical_source(store, &node)?;
        let subject = extract_subject_map(store, &node, base_iri)?;

        let mut predicates = Vec::new();
        let mut objects = Vec::new();
        let mut predicate_objects = Vec::new();

        for pom in store.objects_of(&node, RR_PREDICATE_OBJECT_MAP) {
            predicates.push(extract_predicate_map(store, &pom)?);
            objects.push(extract_object_map(store, &pom)?);
            predicate_objects.push(PredicateObjectMap {
                graph: extract_graph_map(store, &pom)?,
            });
        }

        debug!(
            node = %node,
            predicate_object_maps = predicates.len(),
            classes = subject.classes.len(),
            "extracted triples map"
        );

        triples_maps.push(TriplesMap {
            node,
            logical_source,
            subject,
            predicates,
            objects,
            predicate_objects,
        });
    }

    Ok(Plan { triples_maps })
}

/// At most one object for `(node, predicate)`; two or more is a schema
/// violation.
fn at_most_one(
    store: &TripleStore,
    node: &str,
    predicate: &str,
    what: &str,
) -> Result<Option<String>, MappingError> {
    let mut found = store.objects_of(node, predicate);
    match found.len() {
        0 => Ok(None),
        1 => Ok(Some(found.remove(0))),
        _ => Err(MappingError::Ambiguous {
            node: node.to_string(),
            what: what.to_string(),
        }),
    }
}

fn parse_term_type(value: &str) -> Result<TermType, MappingError> {
    match value {
        IRI_TERM_TYPE => Ok(TermType::Iri),
        LITERAL_TERM_TYPE => Ok(TermType::Literal),
        BLANK_NODE_TERM_TYPE => Ok(TermType::BlankNode),
        other => Err(MappingError::UnknownTermType(other.to_string())),
    }
}

/// Resolve a source value: a blank node carrying `sd:name` is a named
/// in-memory input, anything else a file path.
fn resolve_source(store: &TripleStore, value: &str) -> SourceKind {
    match store.objects_of(value, SD_NAME).first() {
        Some(name) => SourceKind::Named(name.clone()),
        None => SourceKind::Path(value.to_string()),
    }
}

fn extract_logical_source(store: &TripleStore, node: &str) -> Result<LogicalSource, MappingError> {
    let logical_source = at_most_one(store, node, RML_LOGICAL_SOURCE, "logical source")?
        .ok_or_else(|| MappingError::MissingLogicalSource(node.to_string()))?;

    let source = at_most_one(store, &logical_source, RML_SOURCE, "source")?
        .ok_or_else(|| MappingError::MissingSource(logical_source.clone()))?;

    let reference_formulation =
        at_most_one(store, &logical_source, RML_REFERENCE_FORMULATION, "reference formulation")?
            .ok_or_else(|| MappingError::MissingReferenceFormulation(logical_source.clone()))?;
    if reference_formulation != CSV_REFERENCE_FORMULATION {
        return Err(MappingError::UnsupportedFormulation(reference_formulation));
    }

    let iterator = at_most_one(store, &logical_source, RML_ITERATOR, "iterator")?.unwrap_or_default();

    Ok(LogicalSource {
        source: resolve_source(store, &source),
        reference_formulation,
        iterator,
    })
}

fn extract_subject_map(
    store: &TripleStore,
    node: &str,
    base_iri: &str,
) -> Result<SubjectMap, MappingError> {
    let subject_maps = store.objects_of(node, RR_SUBJECT_MAP);
    let map_node = match subject_maps.len() {
        0 => return Err(MappingError::MissingSubjectMap(node.to_string())),
        1 => subject_maps[0].clone(),
        _ => return Err(MappingError::MultipleSubjectMaps(node.to_string())),
    };

    let template = at_most_one(store, &map_node, RR_TEMPLATE, "template")?;
    let reference = at_most_one(store, &map_node, RML_REFERENCE, "reference")?;
    let constant = at_most_one(store, &map_node, RR_CONSTANT, "constant")?;

    // a reference is the one-placeholder template over the same column
    let source = if let Some(template) = template {
        TermSource::Template(template)
    } else if let Some(reference) = reference {
        TermSource::Template(format!("{{{reference}}}"))
    } else if let Some(constant) = constant {
        TermSource::Constant(constant)
    } else {
        return Err(MappingError::EmptySubjectMap(node.to_string()));
    };

    let term_type = match at_most_one(store, &map_node, RR_TERM_TYPE, "term type")? {
        Some(value) => parse_term_type(&value)?,
        None => TermType::Iri,
    };
    if term_type == TermType::Literal {
        return Err(MappingError::LiteralSubject);
    }

    Ok(SubjectMap {
        source,
        term_type,
        base_iri: base_iri.to_string(),
        classes: store.objects_of(&map_node, RR_CLASS),
        graph: extract_graph_map(store, &map_node)?,
    })
}

/// Graph assignment hanging off a subject map or a predicate-object map.
fn extract_graph_map(store: &TripleStore, node: &str) -> Result<Option<GraphMap>, MappingError> {
    let Some(graph_node) = at_most_one(store, node, RR_GRAPH_MAP, "graph map")? else {
        return Ok(None);
    };

    if let Some(term_type) = at_most_one(store, &graph_node, RR_TERM_TYPE, "graph term type")? {
        if term_type != IRI_TERM_TYPE {
            return Err(MappingError::GraphTermType(term_type));
        }
    }

    if let Some(template) = at_most_one(store, &graph_node, RR_TEMPLATE, "graph template")? {
        return Ok(Some(GraphMap { source: TermSource::Template(template) }));
    }
    if let Some(constant) = at_most_one(store, &graph_node, RR_CONSTANT, "graph constant")? {
        return Ok(Some(GraphMap { source: TermSource::Constant(constant) }));
    }

    Ok(None)
}

fn extract_predicate_map(store: &TripleStore, pom: &str) -> Result<PredicateMap, MappingError> {
    let map_node = at_most_one(store, pom, RR_PREDICATE_MAP, "predicate map")?
        .ok_or_else(|| MappingError::MissingPredicateMap(pom.to_string()))?;

    let source = if let Some(template) = at_most_one(store, &map_node, RR_TEMPLATE, "template")? {
        TermSource::Template(template)
    } else if let Some(reference) = at_most_one(store, &map_node, RML_REFERENCE, "reference")? {
        TermSource::Template(format!("{{{reference}}}"))
    } else if let Some(constant) = at_most_one(store, &map_node, RR_CONSTANT, "constant")? {
        TermSource::Constant(constant)
    } else {
        return Err(MappingError::EmptyPredicateMap(map_node));
    };

    Ok(PredicateMap { source })
}

fn extract_object_map(store: &TripleStore, pom: &str) -> Result<ObjectMap, MappingError> {
    let map_node = at_most_one(store, pom, RR_OBJECT_MAP, "object map")?
        .ok_or_else(|| MappingError::EmptyObjectMap(pom.to_string()))?;

    let template = at_most_one(store, &map_node, RR_TEMPLATE, "template")?;
    let reference = at_most_one(store, &map_node, RML_REFERENCE, "reference")?;
    let constant = at_most_one(store, &map_node, RR_CONSTANT, "constant")?;

    // defaults depend on the populated source: references make literals,
    // constants make IRIs only when they look like one
    let default_term_type = if reference.is_some() {
        TermType::Literal
    } else if let Some(constant) = &constant {
        if constant.starts_with("http") {
            TermType::Iri
        } else {
            TermType::Literal
        }
    } else {
        TermType::Iri
    };

    let source = if let Some(template) = template {
        TermSource::Template(template)
    } else if let Some(constant) = constant {
        TermSource::Constant(constant)
    } else if let Some(reference) = reference {
        TermSource::Reference(reference)
    } else {
        return Err(MappingError::EmptyObjectMap(map_node));
    };

    let term_type = match at_most_one(store, &map_node, RR_TERM_TYPE, "term type")? {
        Some(value) => parse_term_type(&value)?,
        None => default_term_type,
    };

    let datatype = match at_most_one(store, &map_node, RR_DATATYPE_MAP, "datatype map")? {
        Some(datatype_node) => at_most_one(store, &datatype_node, RR_CONSTANT, "datatype")?,
        None => None,
    };

    let language = match at_most_one(store, &map_node, RR_LANGUAGE_MAP, "language map")? {
        Some(language_node) => match at_most_one(store, &language_node, RR_CONSTANT, "language")? {
            Some(tag) => Some(validate_language(&tag)?),
            None => None,
        },
        None => None,
    };

    let join = match at_most_one(store, &map_node, EX_PARENT_SOURCE, "parent source")? {
        Some(parent_source) => {
            let parent_key = at_most_one(store, &map_node, RR_PARENT, "parent key")?
                .ok_or_else(|| MappingError::EmptyObjectMap(map_node.clone()))?;
            let child_key = at_most_one(store, &map_node, RR_CHILD, "child key")?
                .ok_or_else(|| MappingError::EmptyObjectMap(map_node.clone()))?;
            let reference_condition =
                at_most_one(store, &map_node, EX_JOIN_REFERENCE_CONDITION, "reference condition")?
                    .as_deref()
                    == Some("true");

            Some(JoinDescriptor {
                parent_source: resolve_source(store, &parent_source),
                parent_key,
                child_key,
                reference_condition,
            })
        }
        None => None,
    };

    Ok(ObjectMap {
        source,
        term_type,
        datatype,
        language,
        join,
    })
}

/// Reduce a region-qualified tag to its primary subtag and check it against
/// the allow-list. Unknown primaries are fatal.
fn validate_language(tag: &str) -> Result<String, MappingError> {
    let primary = tag.split('-').next().unwrap_or(tag);
    if !VALID_LANGUAGE_SUBTAGS.contains(&primary) {
        return Err(MappingError::UnknownLanguage(primary.to_string()));
    }
    Ok(primary.to_string())
}
