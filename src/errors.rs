#[derive(thiserror::Error, Debug)]
pub enum MappingError {
    #[error("Every triples map must have exactly one subject map, found none for {0}")]
    MissingSubjectMap(String),

    #[error("More than one subject map found for {0}")]
    MultipleSubjectMaps(String),

    #[error("More than one {what} found for {node}")]
    Ambiguous { node: String, what: String },

    #[error("No logical source found for triples map {0}")]
    MissingLogicalSource(String),

    #[error("Logical source {0} does not name a source")]
    MissingSource(String),

    #[error("No reference formulation found for logical source {0}")]
    MissingReferenceFormulation(String),

    #[error("Unsupported reference formulation '{0}', only CSV sources are handled")]
    UnsupportedFormulation(String),

    #[error("The subject map of {0} has no template, reference or constant")]
    EmptySubjectMap(String),

    #[error("No predicate map found for {0}")]
    MissingPredicateMap(String),

    #[error("The predicate map {0} has no template, reference or constant")]
    EmptyPredicateMap(String),

    #[error("The object map {0} has no template, reference or constant")]
    EmptyObjectMap(String),

    #[error("Unknown primary language subtag '{0}'")]
    UnknownLanguage(String),

    #[error("The term type of a graph map can only be an IRI, found '{0}'")]
    GraphTermType(String),

    #[error("A subject cannot be a literal")]
    LiteralSubject,

    #[error("Unknown term type '{0}'")]
    UnknownTermType(String),

    #[error("Cannot find the column '{0}' in the source header")]
    NoColumn(String),

    #[error("No in-memory input registered under the name '{0}'")]
    UnknownInput(String),

    #[error("Cannot parse '{0}' as a Turtle document")]
    Turtle(String),

    #[error("A mapping worker terminated abnormally")]
    WorkerFailed,

    #[error("The output writer went away before generation finished")]
    WriterGone,

    #[error(transparent)]
    Reader(#[from] ReaderError),

    #[error(transparent)]
    Io(#[from] std::io::Error),
}


#[derive(thiserror::Error, Debug)]
pub enum ReaderError {
    #[error(transparent)]
    Csv(#[from] csv::Error),

    #[error(transparent)]
    Io(#[from] std::io::Error),
}


#[derive(thiserror::Error, Debug)]
pub enum ConfigError {
    #[error("Cannot read the config file: {0}")]
    Io(#[from] std::io::Error),

    #[error("Malformed config line '{0}', expected key=value")]
    MalformedLine(String),

    #[error("Unknown config key '{0}'")]
    UnknownKey(String),

    #[error("Invalid value '{value}' for {key}")]
    InvalidValue { key: String, value: String },
}
