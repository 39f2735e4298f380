//! Rewrites mapping-document sugar into the canonical form the extractor
//! reads.
//!
//! Every pass is a bounded scan over the store plus targeted removals and
//! additions; fresh blank node labels guarantee a pass never revisits a node
//! it just created, so none of this recurses even though the rule graph can
//! be cyclic. Running the whole sequence on an already-normalized document
//! changes nothing.

use tracing::debug;

use crate::store::{BlankNodes, Triple, TripleStore};
use crate::template::placeholders;
use crate::vocab::*;


/// Run all passes in their fixed order.
pub fn normalize(store: &mut TripleStore, nodes: &mut BlankNodes) {
    add_implicit_types(store);
    expand_constants(store, nodes);
    split_multiple_predicates(store, nodes);
    split_multiple_objects(store, nodes);
    inline_local_parents(store);
    expand_joins(store, nodes);

    for triple in store.iter() {
        debug!(subject = %triple.subject, predicate = %triple.predicate, object = %triple.object, "normalized");
    }
}

/// A subject carrying a logical source is a triples map even when the
/// document never says so.
fn add_implicit_types(store: &mut TripleStore) {
    let with_source = store.subjects_of(RML_LOGICAL_SOURCE, "");
    let typed = store.subjects_of(RDF_TYPE, TRIPLES_MAP);

    for subject in with_source {
        if !typed.contains(&subject) {
            store.insert(Triple::new(subject, RDF_TYPE, TRIPLES_MAP));
        }
    }
}

/// The six constant short-hands, `rr:graph` among them. Each
/// `X rr:subject "v"` becomes `X rr:subjectMap _:b . _:b rr:constant "v"`.
fn expand_constants(store: &mut TripleStore, nodes: &mut BlankNodes) {
    const SHORT_HANDS: [(&str, &str); 6] = [
        (RR_SUBJECT, RR_SUBJECT_MAP),
        (RR_PREDICATE, RR_PREDICATE_MAP),
        (RR_OBJECT, RR_OBJECT_MAP),
        (RR_GRAPH, RR_GRAPH_MAP),
        (RR_DATATYPE, RR_DATATYPE_MAP),
        (RR_LANGUAGE, RR_LANGUAGE_MAP),
    ];

    for (short_hand, map_predicate) in SHORT_HANDS {
        for subject in store.subjects_of(short_hand, "") {
            for value in store.objects_of(&subject, short_hand) {
                store.remove(&subject, short_hand, &value);

                let blank = nodes.fresh();
                store.insert(Triple::new(subject.clone(), map_predicate, blank.clone()));
                store.insert(Triple::new(blank, RR_CONSTANT, value));
            }
        }
    }
}

/// Graph map edges hanging off a predicate-object map node, copied onto the
/// fan-out nodes so a split does not lose the graph assignment.
fn graph_edges(store: &TripleStore, pom: &str) -> Vec<String> {
    store.objects_of(pom, RR_GRAPH_MAP)
}

/// One predicate-object map node per predicate map, each keeping all object
/// maps. The object fan-out below finishes the job.
fn split_multiple_predicates(store: &mut TripleStore, nodes: &mut BlankNodes) {
    for tm in store.subjects_of(RDF_TYPE, TRIPLES_MAP) {
        for pom in store.objects_of(&tm, RR_PREDICATE_OBJECT_MAP) {
            let predicates = store.objects_of(&pom, RR_PREDICATE_MAP);
            if predicates.len() <= 1 {
                continue;
            }

            let objects = store.objects_of(&pom, RR_OBJECT_MAP);
            let graphs = graph_edges(store, &pom);

            store.remove(&tm, RR_PREDICATE_OBJECT_MAP, &pom);
            store.remove_subject(&pom);

            for predicate in &predicates {
                let blank = nodes.fresh();
                store.insert(Triple::new(tm.clone(), RR_PREDICATE_OBJECT_MAP, blank.clone()));
                store.insert(Triple::new(blank.clone(), RR_PREDICATE_MAP, predicate.clone()));
                for object in &objects {
                    store.insert(Triple::new(blank.clone(), RR_OBJECT_MAP, object.clone()));
                }
                for graph in &graphs {
                    store.insert(Triple::new(blank.clone(), RR_GRAPH_MAP, graph.clone()));
                }
            }
        }
    }
}

/// One predicate-object map node per object map.
fn split_multiple_objects(store: &mut TripleStore, nodes: &mut BlankNodes) {
    for tm in store.subjects_of(RDF_TYPE, TRIPLES_MAP) {
        for pom in store.objects_of(&tm, RR_PREDICATE_OBJECT_MAP) {
            let objects = store.objects_of(&pom, RR_OBJECT_MAP);
            if objects.len() <= 1 {
                continue;
            }

            // after the predicate fan-out a split node carries exactly one
            // predicate map
            let predicates = store.objects_of(&pom, RR_PREDICATE_MAP);
            let predicate = predicates.first().cloned().unwrap_or_default();
            let graphs = graph_edges(store, &pom);

            store.remove(&tm, RR_PREDICATE_OBJECT_MAP, &pom);
            store.remove_subject(&pom);

            for object in &objects {
                let blank = nodes.fresh();
                store.insert(Triple::new(tm.clone(), RR_PREDICATE_OBJECT_MAP, blank.clone()));
                store.insert(Triple::new(blank.clone(), RR_PREDICATE_MAP, predicate.clone()));
                store.insert(Triple::new(blank.clone(), RR_OBJECT_MAP, object.clone()));
                for graph in &graphs {
                    store.insert(Triple::new(blank.clone(), RR_GRAPH_MAP, graph.clone()));
                }
            }
        }
    }
}

/// An object map that references a parent triples map without a join
/// condition collapses to the parent's subject map: the parent's subject is
/// generated as the object, against the child's own rows.
fn inline_local_parents(store: &mut TripleStore) {
    for tm in store.subjects_of(RDF_TYPE, TRIPLES_MAP) {
        for pom in store.objects_of(&tm, RR_PREDICATE_OBJECT_MAP) {
            for object_map in store.objects_of(&pom, RR_OBJECT_MAP) {
                let parents = store.objects_of(&object_map, RR_PARENT_TRIPLES_MAP);
                if parents.is_empty() {
                    continue;
                }
                if !store.objects_of(&object_map, RR_JOIN_CONDITION).is_empty() {
                    continue;
                }

                let subject_maps = store.objects_of(&parents[0], RR_SUBJECT_MAP);
                let Some(subject_map) = subject_maps.first() else {
                    continue;
                };

                store.remove(&pom, RR_OBJECT_MAP, &object_map);
                store.remove_subject(&object_map);
                store.insert(Triple::new(pom.clone(), RR_OBJECT_MAP, subject_map.clone()));
            }
        }
    }
}

/// Flatten a join against a parent triples map into a self-contained object
/// map: the parent's subject template with `{parent}` rewritten to `{child}`,
/// the parent's source, both keys, and whether the reference-condition fast
/// path applies.
fn expand_joins(store: &mut TripleStore, nodes: &mut BlankNodes) {
    for tm in store.subjects_of(RDF_TYPE, TRIPLES_MAP) {
        for pom in store.objects_of(&tm, RR_PREDICATE_OBJECT_MAP) {
            for object_map in store.objects_of(&pom, RR_OBJECT_MAP) {
                let parents = store.objects_of(&object_map, RR_PARENT_TRIPLES_MAP);
                if parents.is_empty() {
                    continue;
                }
                let conditions = store.objects_of(&object_map, RR_JOIN_CONDITION);
                let Some(condition) = conditions.first() else {
                    continue;
                };

                let child = store.objects_of(condition, RR_CHILD);
                let parent_key = store.objects_of(condition, RR_PARENT);
                let (Some(child), Some(parent_key)) = (child.first(), parent_key.first()) else {
                    continue;
                };

                // the parent's subject template, rewritten into the child's
                // column space
                let mut new_template = String::new();
                let mut reference_condition = false;
                if let Some(subject_map) = store.objects_of(&parents[0], RR_SUBJECT_MAP).first() {
                    if let Some(template) = store.objects_of(subject_map, RR_TEMPLATE).first() {
                        new_template = template.replace(&format!("{{{parent_key}}}"), &format!("{{{child}}}"));
                        reference_condition = placeholders(template) == [parent_key.as_str()];
                    }
                }

                // the parent's source, carried under the synthetic predicate
                let logical_sources = store.objects_of(&parents[0], RML_LOGICAL_SOURCE);
                let Some(logical_source) = logical_sources.first() else {
                    continue;
                };
                let parent_source = store.objects_of(logical_source, RML_SOURCE);
                let parent_formulation = store.objects_of(logical_source, RML_REFERENCE_FORMULATION);
                let (Some(parent_source), Some(parent_formulation)) =
                    (parent_source.first(), parent_formulation.first())
                else {
                    continue;
                };

                let blank = nodes.fresh();
                store.insert(Triple::new(pom.clone(), RR_OBJECT_MAP, blank.clone()));
                if !new_template.is_empty() {
                    store.insert(Triple::new(blank.clone(), RR_TEMPLATE, new_template));
                }
                store.insert(Triple::new(blank.clone(), EX_PARENT_SOURCE, parent_source.clone()));
                store.insert(Triple::new(blank.clone(), EX_PARENT_REFERENCE_FORMULATION, parent_formulation.clone()));
                store.insert(Triple::new(blank.clone(), RR_PARENT, parent_key.clone()));
                store.insert(Triple::new(blank.clone(), RR_CHILD, child.clone()));
                store.insert(Triple::new(
                    blank,
                    EX_JOIN_REFERENCE_CONDITION,
                    if reference_condition { "true" } else { "false" },
                ));

                let condition = condition.clone();
                store.remove(&pom, RR_OBJECT_MAP, &object_map);
                store.remove_subject(&object_map);
                store.remove_subject(&condition);
            }
        }
    }
}
