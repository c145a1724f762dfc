//! Error types for rendering and string table ingestion.

/// Errors from parsing or rendering a line template.
#[derive(Debug, thiserror::Error)]
pub enum MarkupError {
    /// The text does not lex or parse as the line grammar.
    #[error("malformed text: {0}")]
    MalformedText(String),

    /// A plural/ordinal format function received input that is not a
    /// number.
    #[error("format function input {0:?} is not a number")]
    FormatInputNotNumber(String),

    /// A format function selected a branch key that was not supplied.
    #[error("branch key {0:?} not found")]
    BranchKeyMissing(String),

    /// A closing tag named a tag that was not open.
    #[error("tag {0:?} not open")]
    UnopenedTag(String),
}

/// Errors from reading or using a string table.
#[derive(Debug, thiserror::Error)]
pub enum StringTableError {
    /// The language code is not a valid BCP 47 tag.
    #[error("invalid language code {0:?}")]
    InvalidLanguage(String),

    /// Plural rule data could not be loaded for the language.
    #[error("plural rules unavailable for {0:?}")]
    PluralRules(String),

    /// The table file could not be read.
    #[error("reading string table: {0}")]
    Io(#[from] std::io::Error),

    /// The CSV structure is invalid.
    #[error("csv: {0}")]
    Csv(#[from] csv::Error),

    /// A row's lineNumber column did not parse as an integer.
    #[error("line number not an integer: {0:?}")]
    BadLineNumber(String),

    /// A row had the wrong number of columns.
    #[error("expected 5 columns, found {0}")]
    WrongColumnCount(usize),

    /// A render was requested for an ID the table does not contain.
    #[error("string table row for id {0:?} not found")]
    RowNotFound(String),

    /// The metadata table mentioned an ID the string table does not
    /// contain.
    #[error("unexpected id in metadata table: {0:?}")]
    UnknownMetadataId(String),

    /// A row's text failed to parse or render.
    #[error("text for id {id:?}: {source}")]
    Markup {
        /// The row's string ID.
        id: String,
        /// The underlying markup error.
        #[source]
        source: MarkupError,
    },
}
