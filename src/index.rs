//! Join indexes over parent sources, built in a single pass each before a
//! triples map starts generating.
//!
//! Two shapes, picked per object map: when the join satisfies the reference
//! condition the index only needs to answer membership, so it maps the
//! parent-key value to the position of the first matching record. Otherwise
//! the index keeps every match, projected down to the columns the object
//! template actually references.

use std::collections::HashMap;

use tracing::debug;

use crate::errors::MappingError;
use crate::plan::{JoinDescriptor, NamedInputs, ObjectMap};
use crate::readers::CsvCursor;
use crate::template::placeholders;


pub enum ParentIndex {
    /// Parent-key value → position of a matching record. Later duplicates
    /// overwrite earlier ones; only membership is observable.
    Reference { positions: HashMap<String, csv::Position> },
    /// Parent-key value → all matching rows, projected to the kept columns.
    /// `columns` is the header vector to interpolate the tuples against.
    Full {
        rows: HashMap<String, Vec<Vec<String>>>,
        columns: Vec<String>,
    },
}

impl ParentIndex {
    pub fn contains(&self, key: &str) -> bool {
        match self {
            ParentIndex::Reference { positions } => positions.contains_key(key),
            ParentIndex::Full { rows, .. } => rows.contains_key(key),
        }
    }

    /// The projected parent tuples joining with `key`; empty when nothing
    /// matches.
    pub fn matches(&self, key: &str) -> &[Vec<String>] {
        match self {
            ParentIndex::Full { rows, .. } => rows.get(key).map(Vec::as_slice).unwrap_or(&[]),
            ParentIndex::Reference { .. } => &[],
        }
    }

    pub fn columns(&self) -> &[String] {
        match self {
            ParentIndex::Full { columns, .. } => columns,
            ParentIndex::Reference { .. } => &[],
        }
    }
}


/// Build the index an object map's join needs.
pub fn build_index(
    object_map: &ObjectMap,
    join: &JoinDescriptor,
    inputs: &NamedInputs,
) -> Result<ParentIndex, MappingError> {
    let mut parent = CsvCursor::open(&join.parent_source, inputs)?;

    let key_column = column_index(parent.header(), &join.parent_key)?;

    if join.reference_condition {
        let mut positions = HashMap::new();
        loop {
            let position = parent.position();
            let Some(row) = parent.next_row()? else {
                break;
            };
            if let Some(key) = row.get(key_column) {
                positions.insert(key.clone(), position);
            }
        }
        debug!(parent = ?join.parent_source, keys = positions.len(), "built reference index");
        return Ok(ParentIndex::Reference { positions });
    }

    // the full variant projects the parent down to the columns the object
    // template references; the child key placeholder reads from the parent
    // key column
    let template = object_map
        .source
        .as_template()
        .ok_or_else(|| MappingError::EmptyObjectMap(join.parent_key.clone()))?;
    let columns = placeholders(&template);

    let mut projection = Vec::with_capacity(columns.len());
    for column in &columns {
        let source_column = if *column == join.child_key { &join.parent_key } else { column };
        projection.push(column_index(parent.header(), source_column)?);
    }

    let mut rows: HashMap<String, Vec<Vec<String>>> = HashMap::new();
    while let Some(row) = parent.next_row()? {
        let Some(key) = row.get(key_column) else {
            continue;
        };
        let tuple: Vec<String> = projection
            .iter()
            .map(|i| row.get(*i).cloned().unwrap_or_default())
            .collect();
        rows.entry(key.clone()).or_default().push(tuple);
    }

    debug!(parent = ?join.parent_source, keys = rows.len(), "built full index");
    Ok(ParentIndex::Full { rows, columns })
}

fn column_index(header: &[String], column: &str) -> Result<usize, MappingError> {
    header
        .iter()
        .position(|h| h == column)
        .ok_or_else(|| MappingError::NoColumn(column.to_string()))
}
