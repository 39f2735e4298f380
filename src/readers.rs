//! CSV access for logical sources.
//!
//! Sources come in two flavours: a file on disk or a named in-memory string
//! registered with the engine. Both are read through the same seekable
//! cursor so the join indexes can record a record's position and come back
//! to it later.

use std::fs::File;
use std::io;

use crate::errors::{MappingError, ReaderError};
use crate::plan::{NamedInputs, SourceKind};


pub trait ReadSeek: io::Read + io::Seek {}
impl<T: io::Read + io::Seek> ReadSeek for T {}


/// A cursor over one CSV source. The header line is consumed on open and
/// kept as the field-resolution vector; every subsequent row comes back as
/// owned strings with control characters stripped.
pub struct CsvCursor {
    header: Vec<String>,
    reader: csv::Reader<Box<dyn ReadSeek>>,
    record: csv::StringRecord,
}

impl CsvCursor {
    /// Open whatever kind of source the plan names. Named sources resolve
    /// against the engine's registered in-memory inputs.
    pub fn open(source: &SourceKind, inputs: &NamedInputs) -> Result<CsvCursor, MappingError> {
        match source {
            SourceKind::Path(path) => Ok(CsvCursor::from_path(path)?),
            SourceKind::Named(name) => {
                let data = inputs
                    .get(name)
                    .ok_or_else(|| MappingError::UnknownInput(name.clone()))?;
                Ok(CsvCursor::from_string(data.clone())?)
            }
        }
    }

    pub fn from_path(path: &str) -> Result<CsvCursor, ReaderError> {
        let file = File::open(path)?;
        CsvCursor::from_read_seek(Box::new(file))
    }

    /// The in-memory variant takes a whole file as a string.
    pub fn from_string(data: String) -> Result<CsvCursor, ReaderError> {
        CsvCursor::from_read_seek(Box::new(io::Cursor::new(data)))
    }

    fn from_read_seek(inner: Box<dyn ReadSeek>) -> Result<CsvCursor, ReaderError> {
        let mut reader = csv::ReaderBuilder::new().flexible(true).from_reader(inner);
        let header = reader.headers()?.iter().map(clean_field).collect();

        Ok(CsvCursor {
            header,
            reader,
            record: csv::StringRecord::new(),
        })
    }

    pub fn header(&self) -> &[String] {
        &self.header
    }

    /// The position of the record the next `next_row` call will read.
    pub fn position(&self) -> csv::Position {
        self.reader.position().clone()
    }

    pub fn seek(&mut self, position: csv::Position) -> Result<(), ReaderError> {
        self.reader.seek(position)?;
        Ok(())
    }

    /// The next data row, or `None` at end of input.
    pub fn next_row(&mut self) -> Result<Option<Vec<String>>, ReaderError> {
        if self.reader.read_record(&mut self.record)? {
            Ok(Some(self.record.iter().map(clean_field).collect()))
        } else {
            Ok(None)
        }
    }
}

// control characters inside a field are stripped, the rest passes through
fn clean_field(field: &str) -> String {
    field.chars().filter(|c| !c.is_control()).collect()
}
