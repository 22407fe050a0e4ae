use chrono::NaiveDate;

#[derive(thiserror::Error, Debug)]
pub enum TimetableError {
    #[error("malformed duration '{0}'")]
    DurationFormat(String),
    #[error("malformed date value '{0}'")]
    DateFormat(String),
    #[error("failed to deserialize document: {0}")]
    DocumentRead(#[from] quick_xml::DeError),
    #[error("failed to read document source: {0}")]
    Io(#[from] std::io::Error),
    #[error("failed to open document archive: {0}")]
    Archive(#[from] zip::result::ZipError),
    #[error("document contains no {0}")]
    MissingElement(&'static str),
    #[error("not a bus or coach timetable (mode '{0}')")]
    NotBusTimetable(String),
    #[error("dangling reference to '{0}'")]
    DanglingReference(String),
    #[error("could not align stop '{0}' into the row sequence")]
    Reconciliation(String),
    #[error("operating period does not include {0}")]
    NoApplicablePeriod(NaiveDate),
    #[error("{0}")]
    Other(String),
}
