//! End-to-end mapping scenarios: compile a Turtle mapping document, run the
//! pipeline, and check the N-Quads that come out.

use std::fs;

use materializer::compile;
use materializer::pipeline::{materialize, RunOptions};
use materializer::template::SkipTokens;

const PREFIXES: &str = r#"
@prefix rr: <http://www.w3.org/ns/r2rml#> .
@prefix rml: <http://semweb.mmlab.be/ns/rml#> .
@prefix ql: <http://semweb.mmlab.be/ns/ql#> .
@prefix sd: <https://w3id.org/okn/o/sd#> .
"#;

fn run(document: &str, options: &RunOptions) -> Vec<String> {
    let plan = compile(document).unwrap();
    let mut out = Vec::new();
    materialize(&plan, options, &mut out).unwrap();

    let mut lines: Vec<String> = String::from_utf8(out).unwrap().lines().map(str::to_string).collect();
    lines.sort();
    lines
}

fn with_input(name: &str, data: &str) -> RunOptions {
    let mut options = RunOptions::default();
    options.inputs.insert(name.to_string(), data.to_string());
    options
}

#[test]
fn constant_only_mapping_repeats_per_row_and_dedups() {
    let document = format!(
        r#"{PREFIXES}
        <http://ex/map> rml:logicalSource [ rml:source [ sd:name "rows" ] ; rml:referenceFormulation ql:CSV ] ;
            rr:subject <http://ex/s> ;
            rr:predicateObjectMap [
                rr:predicate <http://ex/p> ;
                rr:object "v"
            ] .
        "#
    );

    let mut options = with_input("rows", "ID\n1\n2\n3\n");
    let lines = run(&document, &options);
    assert_eq!(lines, vec!["<http://ex/s> <http://ex/p> \"v\" ."; 3]);

    options.dedup = true;
    let lines = run(&document, &options);
    assert_eq!(lines, vec!["<http://ex/s> <http://ex/p> \"v\" ."]);
}

#[test]
fn template_subject_gets_the_document_base() {
    let document = format!(
        r#"@base <http://ex/> .
        {PREFIXES}
        <http://ex/map> rml:logicalSource [ rml:source [ sd:name "students" ] ; rml:referenceFormulation ql:CSV ] ;
            rr:subjectMap [ rr:template "Student/{{ID}}" ] ;
            rr:predicateObjectMap [
                rr:predicate <http://ex/id> ;
                rr:objectMap [ rml:reference "ID" ]
            ] .
        "#
    );

    let lines = run(&document, &with_input("students", "ID\n7\n"));
    assert_eq!(lines, vec!["<http://ex/Student/7> <http://ex/id> \"7\" ."]);
}

#[test]
fn interpolated_iri_values_are_percent_encoded() {
    let document = format!(
        r#"{PREFIXES}
        <http://ex/map> rml:logicalSource [ rml:source [ sd:name "people" ] ; rml:referenceFormulation ql:CSV ] ;
            rr:subjectMap [ rr:template "http://ex/{{Name}}" ] ;
            rr:predicateObjectMap [
                rr:predicate <http://ex/name> ;
                rr:objectMap [ rml:reference "Name" ]
            ] .
        "#
    );

    let lines = run(&document, &with_input("people", "Name\nAnn Smith\n"));
    assert_eq!(lines, vec!["<http://ex/Ann%20Smith> <http://ex/name> \"Ann Smith\" ."]);
}

#[test]
fn reference_condition_join_checks_the_parent_index() {
    let dir = tempfile::tempdir().unwrap();
    let child = dir.path().join("child.csv");
    let parent = dir.path().join("parent.csv");
    fs::write(&child, "sport\nTennis\nChess\n").unwrap();
    fs::write(&parent, "id,label\nTennis,Ball sport\nFootball,Ball sport\n").unwrap();

    let document = format!(
        r#"{PREFIXES}
        <http://ex/child> rml:logicalSource [ rml:source "{child}" ; rml:referenceFormulation ql:CSV ] ;
            rr:subjectMap [ rr:template "http://ex/student/{{sport}}" ] ;
            rr:predicateObjectMap [
                rr:predicate <http://ex/plays> ;
                rr:objectMap [
                    rr:parentTriplesMap <http://ex/parent> ;
                    rr:joinCondition [ rr:child "sport" ; rr:parent "id" ]
                ]
            ] .

        <http://ex/parent> rml:logicalSource [ rml:source "{parent}" ; rml:referenceFormulation ql:CSV ] ;
            rr:subjectMap [ rr:template "http://ex/{{id}}" ] ;
            rr:predicateObjectMap [
                rr:predicate <http://ex/label> ;
                rr:objectMap [ rml:reference "label" ]
            ] .
        "#,
        child = child.display(),
        parent = parent.display(),
    );

    let lines = run(&document, &RunOptions::default());
    assert_eq!(
        lines,
        vec![
            // Chess misses the parent index, only Tennis joins
            "<http://ex/Football> <http://ex/label> \"Ball sport\" .",
            "<http://ex/Tennis> <http://ex/label> \"Ball sport\" .",
            "<http://ex/student/Tennis> <http://ex/plays> <http://ex/Tennis> .",
        ]
    );
}

#[test]
fn full_join_yields_one_quad_per_matching_parent_row() {
    let dir = tempfile::tempdir().unwrap();
    let child = dir.path().join("classes.csv");
    let parent = dir.path().join("teachers.csv");
    fs::write(&child, "teacher\nT1\n").unwrap();
    fs::write(&parent, "teacher,course\nT1,Math\nT1,Physics\nT2,Art\n").unwrap();

    let document = format!(
        r#"{PREFIXES}
        <http://ex/child> rml:logicalSource [ rml:source "{child}" ; rml:referenceFormulation ql:CSV ] ;
            rr:subjectMap [ rr:template "http://ex/teacher/{{teacher}}" ] ;
            rr:predicateObjectMap [
                rr:predicate <http://ex/teaches> ;
                rr:objectMap [
                    rr:parentTriplesMap <http://ex/parent> ;
                    rr:joinCondition [ rr:child "teacher" ; rr:parent "teacher" ]
                ]
            ] .

        <http://ex/parent> rml:logicalSource [ rml:source "{parent}" ; rml:referenceFormulation ql:CSV ] ;
            rr:subjectMap [ rr:template "http://ex/course/{{course}}" ] ;
            rr:predicateObjectMap [
                rr:predicate <http://ex/name> ;
                rr:objectMap [ rml:reference "course" ]
            ] .
        "#,
        child = child.display(),
        parent = parent.display(),
    );

    let lines = run(&document, &RunOptions::default());
    assert_eq!(
        lines,
        vec![
            "<http://ex/course/Art> <http://ex/name> \"Art\" .",
            "<http://ex/course/Math> <http://ex/name> \"Math\" .",
            "<http://ex/course/Physics> <http://ex/name> \"Physics\" .",
            "<http://ex/teacher/T1> <http://ex/teaches> <http://ex/course/Math> .",
            "<http://ex/teacher/T1> <http://ex/teaches> <http://ex/course/Physics> .",
        ]
    );
}

#[test]
fn datatype_wins_over_language() {
    let document = format!(
        r#"{PREFIXES}
        <http://ex/map> rml:logicalSource [ rml:source [ sd:name "ages" ] ; rml:referenceFormulation ql:CSV ] ;
            rr:subjectMap [ rr:template "http://ex/{{ID}}" ] ;
            rr:predicateObjectMap [
                rr:predicate <http://ex/age> ;
                rr:objectMap [
                    rml:reference "age" ;
                    rr:datatype <http://www.w3.org/2001/XMLSchema#integer> ;
                    rr:language "en"
                ]
            ] .
        "#
    );

    let lines = run(&document, &with_input("ages", "ID,age\n1,42\n"));
    assert_eq!(
        lines,
        vec!["<http://ex/1> <http://ex/age> \"42\"^^<http://www.w3.org/2001/XMLSchema#integer> ."]
    );
}

#[test]
fn empty_and_skip_listed_fields_suppress_quads() {
    let document = format!(
        r#"{PREFIXES}
        <http://ex/map> rml:logicalSource [ rml:source [ sd:name "people" ] ; rml:referenceFormulation ql:CSV ] ;
            rr:subjectMap [ rr:template "http://ex/{{ID}}" ] ;
            rr:predicateObjectMap [
                rr:predicate <http://ex/name> ;
                rr:objectMap [ rml:reference "Name" ]
            ] .
        "#
    );

    let mut options = with_input("people", "ID,Name\n1,Ann\n2,\n3,NULL\n");
    options.skips = SkipTokens::from_list("NULL");
    let lines = run(&document, &options);
    assert_eq!(lines, vec!["<http://ex/1> <http://ex/name> \"Ann\" ."]);
}

#[test]
fn classes_expand_before_predicate_object_maps() {
    let document = format!(
        r#"{PREFIXES}
        <http://ex/map> rml:logicalSource [ rml:source [ sd:name "students" ] ; rml:referenceFormulation ql:CSV ] ;
            rr:subjectMap [
                rr:template "http://ex/{{ID}}" ;
                rr:class <http://ex/Student> ;
                rr:class <http://ex/Person>
            ] ;
            rr:predicateObjectMap [
                rr:predicate <http://ex/id> ;
                rr:objectMap [ rml:reference "ID" ]
            ] .
        "#
    );

    let lines = run(&document, &with_input("students", "ID\n1\n2\n"));
    let type_lines = lines
        .iter()
        .filter(|l| l.contains("22-rdf-syntax-ns#type"))
        .count();
    assert_eq!(type_lines, 4);
    assert_eq!(lines.len(), 6);
}

#[test]
fn named_graphs_land_in_the_fourth_position() {
    let document = format!(
        r#"{PREFIXES}
        <http://ex/map> rml:logicalSource [ rml:source [ sd:name "rows" ] ; rml:referenceFormulation ql:CSV ] ;
            rr:subjectMap [
                rr:template "http://ex/{{ID}}" ;
                rr:graph <http://ex/g>
            ] ;
            rr:predicateObjectMap [
                rr:predicate <http://ex/id> ;
                rr:objectMap [ rml:reference "ID" ]
            ] .
        "#
    );

    let lines = run(&document, &with_input("rows", "ID\n1\n"));
    assert_eq!(lines, vec!["<http://ex/1> <http://ex/id> \"1\" <http://ex/g> ."]);
}

#[test]
fn rerunning_dedup_is_idempotent() {
    let document = format!(
        r#"{PREFIXES}
        <http://ex/map> rml:logicalSource [ rml:source [ sd:name "rows" ] ; rml:referenceFormulation ql:CSV ] ;
            rr:subjectMap [ rr:template "http://ex/{{ID}}" ] ;
            rr:predicateObjectMap [
                rr:predicate <http://ex/id> ;
                rr:objectMap [ rml:reference "ID" ]
            ] .
        "#
    );

    // duplicate source rows collapse to the same quads either way
    let mut options = with_input("rows", "ID\n1\n2\n1\n2\n1\n");
    options.dedup = true;

    let first = run(&document, &options);
    assert_eq!(first.len(), 2);
    let second = run(&document, &options);
    assert_eq!(first, second);
}

#[test]
fn multi_threaded_runs_produce_the_same_quads() {
    let dir = tempfile::tempdir().unwrap();
    let a = dir.path().join("a.csv");
    let b = dir.path().join("b.csv");
    fs::write(&a, "ID\n1\n2\n3\n").unwrap();
    fs::write(&b, "ID\n4\n5\n").unwrap();

    let document = format!(
        r#"{PREFIXES}
        <http://ex/a> rml:logicalSource [ rml:source "{a}" ; rml:referenceFormulation ql:CSV ] ;
            rr:subjectMap [ rr:template "http://ex/a/{{ID}}" ] ;
            rr:predicateObjectMap [ rr:predicate <http://ex/id> ; rr:objectMap [ rml:reference "ID" ] ] .

        <http://ex/b> rml:logicalSource [ rml:source "{b}" ; rml:referenceFormulation ql:CSV ] ;
            rr:subjectMap [ rr:template "http://ex/b/{{ID}}" ] ;
            rr:predicateObjectMap [ rr:predicate <http://ex/id> ; rr:objectMap [ rml:reference "ID" ] ] .
        "#,
        a = a.display(),
        b = b.display(),
    );

    let sequential = run(&document, &RunOptions::default());

    let mut threaded_options = RunOptions::default();
    threaded_options.threading = true;
    threaded_options.thread_count = 3;
    let threaded = run(&document, &threaded_options);

    assert_eq!(sequential.len(), 5);
    assert_eq!(sequential, threaded);
}
