//! Row-driven quad generation for one triples map.
//!
//! A generator owns the parent indexes its joins need and evaluates the
//! compiled maps against each child row: subject graph first (its absence
//! suppresses the whole row), then the subject, the class expansion, and one
//! object per predicate-object map, with joins resolved against the indexes.

use std::collections::HashSet;

use tracing::trace;

use crate::errors::MappingError;
use crate::index::{build_index, ParentIndex};
use crate::plan::{GraphMap, NamedInputs, ObjectMap, Quad, TermSource, TermType, TriplesMap};
use crate::template::{expand, SkipTokens};
use crate::terms::shape;
use crate::vocab::{RDF_TYPE, RR_DEFAULT_GRAPH};


pub struct Generator<'a> {
    triples_map: &'a TriplesMap,
    skips: &'a SkipTokens,
    // one slot per object map, filled where a join is declared
    indexes: Vec<Option<ParentIndex>>,
}

impl<'a> Generator<'a> {
    /// Prepare generation for a triples map, building the parent indexes its
    /// object maps join against.
    pub fn new(
        triples_map: &'a TriplesMap,
        inputs: &NamedInputs,
        skips: &'a SkipTokens,
    ) -> Result<Generator<'a>, MappingError> {
        let mut indexes = Vec::with_capacity(triples_map.objects.len());
        for object_map in &triples_map.objects {
            match &object_map.join {
                Some(join) => indexes.push(Some(build_index(object_map, join, inputs)?)),
                None => indexes.push(None),
            }
        }

        Ok(Generator { triples_map, skips, indexes })
    }

    /// All quads for one child row, deduplicated within the row.
    pub fn quads_for_row(
        &self,
        header: &[String],
        row: &[String],
    ) -> Result<HashSet<Quad>, MappingError> {
        let mut quads = HashSet::new();

        let Some(graph) = self.subject_graph(header, row)? else {
            return Ok(quads);
        };
        let Some(subject) = self.subject(header, row)? else {
            return Ok(quads);
        };

        // classes first: one rdf:type quad per class IRI
        for class in &self.triples_map.subject.classes {
            quads.insert(Quad {
                subject: subject.clone(),
                predicate: format!("<{RDF_TYPE}>"),
                object: format!("<{class}>"),
                graph: graph.clone(),
            });
        }

        for k in 0..self.triples_map.predicates.len() {
            let Some(predicate) = self.predicate(k, header, row)? else {
                continue;
            };

            for object in self.objects(k, header, row)? {
                let quad = Quad {
                    subject: subject.clone(),
                    predicate: predicate.clone(),
                    object: object.clone(),
                    graph: graph.clone(),
                };
                trace!(?quad, "generated");
                quads.insert(quad);

                // a graph on the predicate-object map emits an additional
                // quad, it does not replace the subject-graph one
                if let Some(graph_map) = &self.triples_map.predicate_objects[k].graph {
                    if let Some(pom_graph) = self.evaluate_graph(graph_map, header, row)? {
                        quads.insert(Quad {
                            subject: subject.clone(),
                            predicate: predicate.clone(),
                            object,
                            graph: pom_graph,
                        });
                    }
                }
            }
        }

        Ok(quads)
    }

    /// The subject map's graph for this row. `None` suppresses the row; an
    /// empty string is the default graph.
    pub fn subject_graph(&self, header: &[String], row: &[String]) -> Result<Option<String>, MappingError> {
        match &self.triples_map.subject.graph {
            Some(graph_map) => self.evaluate_graph(graph_map, header, row),
            None => Ok(Some(String::new())),
        }
    }

    fn evaluate_graph(
        &self,
        graph_map: &GraphMap,
        header: &[String],
        row: &[String],
    ) -> Result<Option<String>, MappingError> {
        match &graph_map.source {
            TermSource::Constant(constant) if constant == RR_DEFAULT_GRAPH => Ok(Some(String::new())),
            TermSource::Constant(constant) => Ok(shape(TermType::Iri, constant)),
            source => {
                let template = source.as_template().unwrap_or_default();
                match expand(&template, header, row, true, self.skips)? {
                    Some(value) => Ok(shape(TermType::Iri, &value)),
                    None => Ok(None),
                }
            }
        }
    }

    /// The shaped subject for this row, or `None` when the row is skipped.
    pub fn subject(&self, header: &[String], row: &[String]) -> Result<Option<String>, MappingError> {
        let subject_map = &self.triples_map.subject;

        let value = match &subject_map.source {
            TermSource::Constant(constant) => constant.clone(),
            source => {
                let template = source.as_template().unwrap_or_default();
                let Some(mut value) = expand(&template, header, row, true, self.skips)? else {
                    return Ok(None);
                };
                // an IRI subject that does not look absolute gets the
                // document base prefixed
                if subject_map.term_type == TermType::Iri
                    && !value.starts_with("http://")
                    && !value.starts_with("https://")
                {
                    value = format!("{}{}", subject_map.base_iri, value);
                }
                value
            }
        };

        Ok(shape(subject_map.term_type, &value))
    }

    /// The shaped predicate of predicate-object map `k`, always an IRI.
    pub fn predicate(&self, k: usize, header: &[String], row: &[String]) -> Result<Option<String>, MappingError> {
        let value = match &self.triples_map.predicates[k].source {
            TermSource::Constant(constant) => constant.clone(),
            source => {
                let template = source.as_template().unwrap_or_default();
                match expand(&template, header, row, false, self.skips)? {
                    Some(value) => value,
                    None => return Ok(None),
                }
            }
        };

        Ok(shape(TermType::Iri, &value))
    }

    /// The shaped, decorated objects of predicate-object map `k`. Zero, one,
    /// or many values: a full join yields one object per matching parent row.
    pub fn objects(&self, k: usize, header: &[String], row: &[String]) -> Result<Vec<String>, MappingError> {
        let object_map = &self.triples_map.objects[k];

        let Some(join) = &object_map.join else {
            return Ok(self
                .direct_object(object_map, header, row)?
                .into_iter()
                .collect());
        };

        let index = self.indexes[k]
            .as_ref()
            .ok_or_else(|| MappingError::NoColumn(join.parent_key.clone()))?;

        let child_column = header
            .iter()
            .position(|h| h == &join.child_key)
            .ok_or_else(|| MappingError::NoColumn(join.child_key.clone()))?;
        let child_value = row.get(child_column).map(String::as_str).unwrap_or("");

        if join.reference_condition {
            // the rewritten template lives entirely in the child's columns;
            // the index only vouches that a parent row exists
            if !index.contains(child_value) {
                return Ok(Vec::new());
            }
            return Ok(self
                .direct_object(object_map, header, row)?
                .into_iter()
                .collect());
        }

        let mut objects = Vec::new();
        let template = object_map
            .source
            .as_template()
            .ok_or_else(|| MappingError::EmptyObjectMap(self.triples_map.node.clone()))?;
        let encode = object_map.term_type == TermType::Iri;

        for tuple in index.matches(child_value) {
            if let Some(value) = expand(&template, index.columns(), tuple, encode, self.skips)? {
                if let Some(shaped) = shape(object_map.term_type, &value) {
                    objects.push(decorate(object_map, shaped));
                }
            }
        }

        Ok(objects)
    }

    fn direct_object(
        &self,
        object_map: &ObjectMap,
        header: &[String],
        row: &[String],
    ) -> Result<Option<String>, MappingError> {
        let value = match &object_map.source {
            TermSource::Constant(constant) => constant.clone(),
            source => {
                let template = source.as_template().unwrap_or_default();
                let encode = object_map.term_type == TermType::Iri;
                match expand(&template, header, row, encode, self.skips)? {
                    Some(value) => value,
                    None => return Ok(None),
                }
            }
        };

        Ok(shape(object_map.term_type, &value).map(|shaped| decorate(object_map, shaped)))
    }
}

/// Datatype and language decoration; datatype wins when both are present.
fn decorate(object_map: &ObjectMap, shaped: String) -> String {
    if let Some(datatype) = &object_map.datatype {
        return format!("{shaped}^^<{datatype}>");
    }
    if object_map.term_type == TermType::Literal {
        if let Some(language) = &object_map.language {
            return format!("{shaped}@{language}");
        }
    }
    shaped
}


#[cfg(test)]
mod tests {
    use super::*;
    use crate::plan::{
        JoinDescriptor,
        LogicalSource,
        PredicateMap,
        PredicateObjectMap,
        SourceKind,
        SubjectMap,
    };

    fn triples_map(subject: SubjectMap, objects: Vec<ObjectMap>) -> TriplesMap {
        let count = objects.len();
        TriplesMap {
            node: "tm".to_string(),
            logical_source: LogicalSource {
                source: SourceKind::Named("child".to_string()),
                reference_formulation: crate::vocab::CSV_REFERENCE_FORMULATION.to_string(),
                iterator: String::new(),
            },
            subject,
            predicates: (0..count)
                .map(|_| PredicateMap {
                    source: TermSource::Constant("http://ex/p".to_string()),
                })
                .collect(),
            objects,
            predicate_objects: (0..count).map(|_| PredicateObjectMap { graph: None }).collect(),
        }
    }

    fn subject_template(template: &str) -> SubjectMap {
        SubjectMap {
            source: TermSource::Template(template.to_string()),
            term_type: TermType::Iri,
            base_iri: "http://base/".to_string(),
            classes: Vec::new(),
            graph: None,
        }
    }

    fn literal_reference(column: &str) -> ObjectMap {
        ObjectMap {
            source: TermSource::Reference(column.to_string()),
            term_type: TermType::Literal,
            datatype: None,
            language: None,
            join: None,
        }
    }

    fn header() -> Vec<String> {
        vec!["ID".to_string(), "Name".to_string()]
    }

    fn row(id: &str, name: &str) -> Vec<String> {
        vec![id.to_string(), name.to_string()]
    }

    #[test]
    fn generates_subject_and_literal_object() {
        let tm = triples_map(subject_template("http://ex/Student/{ID}"), vec![literal_reference("Name")]);
        let skips = SkipTokens::new();
        let generator = Generator::new(&tm, &NamedInputs::new(), &skips).unwrap();

        let quads = generator.quads_for_row(&header(), &row("7", "Ann")).unwrap();
        assert_eq!(quads.len(), 1);
        let quad = quads.iter().next().unwrap();
        assert_eq!(quad.subject, "<http://ex/Student/7>");
        assert_eq!(quad.predicate, "<http://ex/p>");
        assert_eq!(quad.object, "\"Ann\"");
        assert_eq!(quad.graph, "");
    }

    #[test]
    fn relative_subjects_get_the_base_iri() {
        let tm = triples_map(subject_template("Student/{ID}"), vec![literal_reference("Name")]);
        let skips = SkipTokens::new();
        let generator = Generator::new(&tm, &NamedInputs::new(), &skips).unwrap();

        let subject = generator.subject(&header(), &row("7", "Ann")).unwrap().unwrap();
        assert_eq!(subject, "<http://base/Student/7>");
    }

    #[test]
    fn empty_fields_suppress_the_row() {
        let tm = triples_map(subject_template("http://ex/{ID}"), vec![literal_reference("Name")]);
        let skips = SkipTokens::new();
        let generator = Generator::new(&tm, &NamedInputs::new(), &skips).unwrap();

        assert!(generator.quads_for_row(&header(), &row("", "Ann")).unwrap().is_empty());
    }

    #[test]
    fn classes_expand_to_type_quads() {
        let mut subject = subject_template("http://ex/{ID}");
        subject.classes = vec!["http://ex/Student".to_string(), "http://ex/Person".to_string()];
        let tm = triples_map(subject, vec![literal_reference("Name")]);
        let skips = SkipTokens::new();
        let generator = Generator::new(&tm, &NamedInputs::new(), &skips).unwrap();

        let quads = generator.quads_for_row(&header(), &row("7", "Ann")).unwrap();
        let types: Vec<_> = quads
            .iter()
            .filter(|q| q.predicate == format!("<{RDF_TYPE}>"))
            .collect();
        assert_eq!(types.len(), 2);
        assert_eq!(quads.len(), 3);
    }

    #[test]
    fn datatype_wins_over_language() {
        let mut object = literal_reference("Name");
        object.datatype = Some("http://www.w3.org/2001/XMLSchema#integer".to_string());
        object.language = Some("en".to_string());
        let tm = triples_map(subject_template("http://ex/{ID}"), vec![object]);
        let skips = SkipTokens::new();
        let generator = Generator::new(&tm, &NamedInputs::new(), &skips).unwrap();

        let objects = generator.objects(0, &header(), &row("7", "42")).unwrap();
        assert_eq!(objects, vec!["\"42\"^^<http://www.w3.org/2001/XMLSchema#integer>"]);
    }

    #[test]
    fn language_decorates_literals() {
        let mut object = literal_reference("Name");
        object.language = Some("en".to_string());
        let tm = triples_map(subject_template("http://ex/{ID}"), vec![object]);
        let skips = SkipTokens::new();
        let generator = Generator::new(&tm, &NamedInputs::new(), &skips).unwrap();

        let objects = generator.objects(0, &header(), &row("7", "Ann")).unwrap();
        assert_eq!(objects, vec!["\"Ann\"@en"]);
    }

    #[test]
    fn reference_join_filters_on_the_parent_index() {
        let mut inputs = NamedInputs::new();
        inputs.insert("parent".to_string(), "id,label\nTennis,Ball sport\n".to_string());

        let object = ObjectMap {
            source: TermSource::Template("http://ex/{sport}".to_string()),
            term_type: TermType::Iri,
            datatype: None,
            language: None,
            join: Some(JoinDescriptor {
                parent_source: SourceKind::Named("parent".to_string()),
                parent_key: "id".to_string(),
                child_key: "sport".to_string(),
                reference_condition: true,
            }),
        };
        let tm = triples_map(subject_template("http://ex/{sport}"), vec![object]);
        let skips = SkipTokens::new();
        let generator = Generator::new(&tm, &inputs, &skips).unwrap();

        let header = vec!["sport".to_string()];
        let matched = generator.objects(0, &header, &["Tennis".to_string()]).unwrap();
        assert_eq!(matched, vec!["<http://ex/Tennis>"]);

        let unmatched = generator.objects(0, &header, &["Chess".to_string()]).unwrap();
        assert!(unmatched.is_empty());
    }

    #[test]
    fn full_join_yields_one_object_per_match() {
        let mut inputs = NamedInputs::new();
        inputs.insert(
            "parent".to_string(),
            "teacher,course\nT1,Math\nT1,Physics\nT2,Art\n".to_string(),
        );

        let object = ObjectMap {
            source: TermSource::Template("http://ex/course/{course}".to_string()),
            term_type: TermType::Iri,
            datatype: None,
            language: None,
            join: Some(JoinDescriptor {
                parent_source: SourceKind::Named("parent".to_string()),
                parent_key: "teacher".to_string(),
                child_key: "teacher".to_string(),
                reference_condition: false,
            }),
        };
        let tm = triples_map(subject_template("http://ex/{teacher}"), vec![object]);
        let skips = SkipTokens::new();
        let generator = Generator::new(&tm, &inputs, &skips).unwrap();

        let header = vec!["teacher".to_string()];
        let mut objects = generator.objects(0, &header, &["T1".to_string()]).unwrap();
        objects.sort();
        assert_eq!(objects, vec!["<http://ex/course/Math>", "<http://ex/course/Physics>"]);
    }

    #[test]
    fn reference_and_full_join_agree_on_unique_keys() {
        let mut inputs = NamedInputs::new();
        inputs.insert("parent".to_string(), "id,label\nTennis,Ball sport\nChess,Board game\n".to_string());

        let descriptor = |reference_condition| JoinDescriptor {
            parent_source: SourceKind::Named("parent".to_string()),
            parent_key: "id".to_string(),
            child_key: "sport".to_string(),
            reference_condition,
        };
        let object = |reference_condition| ObjectMap {
            source: TermSource::Template("http://ex/{sport}".to_string()),
            term_type: TermType::Iri,
            datatype: None,
            language: None,
            join: Some(descriptor(reference_condition)),
        };

        let skips = SkipTokens::new();
        let header = vec!["sport".to_string()];
        let reference_tm = triples_map(subject_template("http://ex/{sport}"), vec![object(true)]);
        let full_tm = triples_map(subject_template("http://ex/{sport}"), vec![object(false)]);
        let reference = Generator::new(&reference_tm, &inputs, &skips).unwrap();
        let full = Generator::new(&full_tm, &inputs, &skips).unwrap();

        for key in ["Tennis", "Chess", "Darts"] {
            let row = vec![key.to_string()];
            assert_eq!(
                reference.objects(0, &header, &row).unwrap(),
                full.objects(0, &header, &row).unwrap(),
            );
        }
    }

    #[test]
    fn default_graph_constant_means_no_graph() {
        let mut subject = subject_template("http://ex/{ID}");
        subject.graph = Some(GraphMap {
            source: TermSource::Constant(RR_DEFAULT_GRAPH.to_string()),
        });
        let tm = triples_map(subject, vec![literal_reference("Name")]);
        let skips = SkipTokens::new();
        let generator = Generator::new(&tm, &NamedInputs::new(), &skips).unwrap();

        let graph = generator.subject_graph(&header(), &row("7", "Ann")).unwrap().unwrap();
        assert_eq!(graph, "");
    }

    #[test]
    fn named_graph_is_attached_to_quads() {
        let mut subject = subject_template("http://ex/{ID}");
        subject.graph = Some(GraphMap {
            source: TermSource::Constant("http://ex/g".to_string()),
        });
        let tm = triples_map(subject, vec![literal_reference("Name")]);
        let skips = SkipTokens::new();
        let generator = Generator::new(&tm, &NamedInputs::new(), &skips).unwrap();

        let quads = generator.quads_for_row(&header(), &row("7", "Ann")).unwrap();
        assert!(quads.iter().all(|q| q.graph == "<http://ex/g>"));
    }
}
