//! String tables: the localized rows behind line IDs.
//!
//! A table is keyed by string ID and carries the locale whose CLDR plural
//! rules the `plural`/`ordinal` format functions use. Row text is parsed
//! at construction so malformed templates fail at load time rather than
//! the first time a line plays.

use std::fs::File;
use std::io::Read;
use std::path::Path;

use icu_locid::Locale;
use rustc_hash::FxHashMap;
use skein_bytecode::metadata_table_path;
use skein_runtime::Line;
use tracing::debug;

use crate::attributed::AttributedString;
use crate::error::StringTableError;
use crate::parser::{parse, ParsedString};
use crate::plural::PluralRuleSet;
use crate::renderer::LineRenderer;

/// One row of a string table.
#[derive(Debug, Clone)]
pub struct StringTableRow {
    /// The string ID.
    pub id: String,
    /// The raw template text, in the line grammar.
    pub text: String,
    /// The source file the line came from.
    pub file: String,
    /// The node the line came from.
    pub node: String,
    /// The line number within the source file.
    pub line_number: i64,
    /// Tags from the metadata table.
    pub tags: Vec<String>,

    parsed: ParsedString,
}

impl StringTableRow {
    /// Creates a row, parsing its text eagerly.
    pub fn new(
        id: impl Into<String>,
        text: impl Into<String>,
        file: impl Into<String>,
        node: impl Into<String>,
        line_number: i64,
    ) -> Result<Self, StringTableError> {
        let id = id.into();
        let text = text.into();
        let parsed = parse(&text).map_err(|source| StringTableError::Markup {
            id: id.clone(),
            source,
        })?;
        Ok(StringTableRow {
            id,
            text,
            file: file.into(),
            node: node.into(),
            line_number,
            tags: Vec::new(),
            parsed,
        })
    }
}

/// All rows of a string table, keyed by string ID, plus the table's
/// locale.
///
/// Build one with [`StringTable::read`] (or [`load_string_table_file`]),
/// or construct it manually with [`StringTable::new`] and
/// [`StringTable::add_row`] when the rows come from somewhere other than
/// a CSV table.
pub struct StringTable {
    locale: Locale,
    rules: PluralRuleSet,
    rows: FxHashMap<String, StringTableRow>,
}

impl StringTable {
    /// Creates an empty table for a BCP 47 language tag.
    pub fn new(lang_code: &str) -> Result<Self, StringTableError> {
        let locale: Locale = lang_code
            .parse()
            .map_err(|_| StringTableError::InvalidLanguage(lang_code.to_string()))?;
        let rules = PluralRuleSet::new(&locale)?;
        Ok(StringTable {
            locale,
            rules,
            rows: FxHashMap::default(),
        })
    }

    /// Reads a CSV string table. The first row is a header; every other
    /// row is exactly `id,text,file,node,lineNumber`. Each text is parsed
    /// now, so malformed rows fail here.
    pub fn read(reader: impl Read, lang_code: &str) -> Result<Self, StringTableError> {
        let mut table = StringTable::new(lang_code)?;
        let mut csv_reader = csv::Reader::from_reader(reader);
        for record in csv_reader.records() {
            let record = record?;
            if record.len() != 5 {
                return Err(StringTableError::WrongColumnCount(record.len()));
            }
            let line_number: i64 = record[4]
                .trim()
                .parse()
                .map_err(|_| StringTableError::BadLineNumber(record[4].to_string()))?;
            let row =
                StringTableRow::new(&record[0], &record[1], &record[2], &record[3], line_number)?;
            table.add_row(row);
        }
        debug!(rows = table.len(), locale = %table.locale, "read string table");
        Ok(table)
    }

    /// Reads a metadata CSV, attaching tags to existing rows. Rows are
    /// variable width; tags start at column 3. Rows with fewer than four
    /// columns carry nothing and are skipped.
    pub fn read_metadata(&mut self, reader: impl Read) -> Result<(), StringTableError> {
        let mut csv_reader = csv::ReaderBuilder::new().flexible(true).from_reader(reader);
        for record in csv_reader.records() {
            let record = record?;
            if record.len() < 4 {
                continue;
            }
            let id = &record[0];
            let row = self
                .rows
                .get_mut(id)
                .ok_or_else(|| StringTableError::UnknownMetadataId(id.to_string()))?;
            row.tags = record.iter().skip(3).map(String::from).collect();
        }
        Ok(())
    }

    /// Adds (or replaces) a row.
    pub fn add_row(&mut self, row: StringTableRow) {
        self.rows.insert(row.id.clone(), row);
    }

    /// Looks up a row by string ID.
    pub fn get(&self, id: &str) -> Option<&StringTableRow> {
        self.rows.get(id)
    }

    /// The table's locale.
    pub fn locale(&self) -> &Locale {
        &self.locale
    }

    /// The number of rows.
    pub fn len(&self) -> usize {
        self.rows.len()
    }

    /// Whether the table has no rows.
    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    /// Renders the row for `line.id`: interpolates the line's
    /// substitutions, applies format functions with this table's plural
    /// rules, and turns markup tags into attribute spans.
    pub fn render(&self, line: &Line) -> Result<AttributedString, StringTableError> {
        let row = self
            .rows
            .get(&line.id)
            .ok_or_else(|| StringTableError::RowNotFound(line.id.clone()))?;
        LineRenderer::new(&line.substitutions, &self.rules)
            .render(&row.parsed)
            .map_err(|source| StringTableError::Markup {
                id: line.id.clone(),
                source,
            })
    }
}

/// Loads a CSV string table from a file, plus the `-Metadata.csv` sibling
/// if one exists.
pub fn load_string_table_file(
    path: impl AsRef<Path>,
    lang_code: &str,
) -> Result<StringTable, StringTableError> {
    let path = path.as_ref();
    let file = File::open(path)?;
    let mut table = StringTable::read(file, lang_code)?;
    let metadata_path = metadata_table_path(path);
    if metadata_path.exists() {
        table.read_metadata(File::open(metadata_path)?)?;
    }
    Ok(table)
}

/// Errors from [`load_files`].
#[derive(Debug, thiserror::Error)]
pub enum LoadFilesError {
    /// The program failed to load.
    #[error(transparent)]
    Program(#[from] skein_bytecode::LoadError),

    /// The string table failed to load.
    #[error(transparent)]
    Strings(#[from] StringTableError),
}

/// Loads a compiled program and its string table in one call.
///
/// For a program at `foo/bar.yarnc` this expects the table at
/// `foo/bar-Lines.csv` (plus the optional `foo/bar-Metadata.csv`).
pub fn load_files(
    program_path: impl AsRef<Path>,
    lang_code: &str,
) -> Result<(skein_bytecode::Program, StringTable), LoadFilesError> {
    let program_path = program_path.as_ref();
    let program = skein_bytecode::load_program_file(program_path)?;
    let table = load_string_table_file(
        skein_bytecode::string_table_path(program_path),
        lang_code,
    )?;
    Ok((program, table))
}
