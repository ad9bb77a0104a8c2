//! Delimited table model and file reading. Writing lives in `table_write`.

use std::collections::HashSet;
use std::fs;
use std::path::Path;

use csv::ReaderBuilder;
use encoding_rs::Encoding;
use indexmap::IndexMap;

use crate::error::{Error, Result};

/// One logical record of tabular data: named fields in a fixed,
/// insertion-ordered set, or bare positional fields.
#[derive(Clone, Debug, PartialEq)]
pub enum Row {
    Mapping(IndexMap<String, String>),
    Sequence(Vec<String>),
}

impl Row {
    /// Build a mapping row from (field, value) pairs, keeping their order.
    pub fn mapping<K, V, I>(pairs: I) -> Self
    where
        K: Into<String>,
        V: Into<String>,
        I: IntoIterator<Item = (K, V)>,
    {
        Self::Mapping(
            pairs
                .into_iter()
                .map(|(field, value)| (field.into(), value.into()))
                .collect(),
        )
    }

    /// Build a positional row from field values.
    pub fn sequence<V, I>(fields: I) -> Self
    where
        V: Into<String>,
        I: IntoIterator<Item = V>,
    {
        Self::Sequence(fields.into_iter().map(Into::into).collect())
    }

    /// Look up a field by name; always `None` for sequence rows.
    pub fn get(&self, field: &str) -> Option<&str> {
        match self {
            Self::Mapping(map) => map.get(field).map(String::as_str),
            Self::Sequence(_) => None,
        }
    }

    pub fn len(&self) -> usize {
        match self {
            Self::Mapping(map) => map.len(),
            Self::Sequence(fields) => fields.len(),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

/// Normalize a header token into a field identifier: spaces and hyphens
/// become underscores, case folds to lowercase.
pub fn normalize_header(raw: &str) -> String {
    raw.replace(['-', ' '], "_").to_lowercase()
}

/// Options for `read_table`.
#[derive(Clone, Debug)]
pub struct ReadOptions {
    /// Field delimiter byte
    pub delimiter: u8,
    /// Text encoding label (WHATWG: "utf-8", "latin1", "windows-1252", …)
    pub encoding: String,
    /// Treat the first line as a header and name the fields
    pub named: bool,
}

impl Default for ReadOptions {
    fn default() -> Self {
        Self {
            delimiter: b',',
            encoding: "utf-8".to_string(),
            named: false,
        }
    }
}

impl ReadOptions {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn delimiter(mut self, delimiter: u8) -> Self {
        self.delimiter = delimiter;
        self
    }

    pub fn encoding(mut self, label: impl Into<String>) -> Self {
        self.encoding = label.into();
        self
    }

    pub fn named(mut self, named: bool) -> Self {
        self.named = named;
        self
    }
}

pub(crate) fn resolve_encoding(label: &str, path: Option<&Path>) -> Result<&'static Encoding> {
    Encoding::for_label(label.as_bytes())
        .ok_or_else(|| Error::decode(label, path, "unknown encoding label"))
}

/// Read a delimited text file into rows.
///
/// With `named` unset every physical record, first line included, comes
/// back as a `Row::Sequence`. With `named` set the first line supplies
/// the field names (normalized via `normalize_header`) and the remaining
/// records come back as fixed-shape `Row::Mapping`s; a record whose field
/// count differs from the header fails with `SchemaMismatch`.
pub fn read_table(path: impl AsRef<Path>, options: &ReadOptions) -> Result<Vec<Row>> {
    let path = path.as_ref();
    let bytes = fs::read(path).map_err(|e| Error::from_io(e, Some(path)))?;
    let encoding = resolve_encoding(&options.encoding, Some(path))?;
    let content = encoding
        .decode_without_bom_handling_and_without_replacement(&bytes)
        .ok_or_else(|| {
            Error::decode(
                &options.encoding,
                Some(path),
                "input bytes are not valid for this encoding",
            )
        })?;

    let mut reader = ReaderBuilder::new()
        .delimiter(options.delimiter)
        .has_headers(false)
        .flexible(true)
        .from_reader(content.as_bytes());

    let mut records: Vec<Vec<String>> = Vec::new();
    for result in reader.records() {
        let record =
            result.map_err(|e| Error::decode(&options.encoding, Some(path), e.to_string()))?;
        records.push(record.iter().map(str::to_string).collect());
    }

    if !options.named {
        return Ok(records.into_iter().map(Row::Sequence).collect());
    }

    let mut records = records.into_iter();
    let header_line = records
        .next()
        .ok_or_else(|| Error::invalid_input("read_table", "a named read needs a header line"))?;
    let headers: Vec<String> = header_line.iter().map(|t| normalize_header(t)).collect();

    let mut seen = HashSet::new();
    for name in &headers {
        if !seen.insert(name.as_str()) {
            return Err(Error::invalid_input(
                "read_table",
                format!("duplicate field name '{}' after normalization", name),
            ));
        }
    }

    let mut rows = Vec::new();
    for (offset, fields) in records.enumerate() {
        if fields.len() != headers.len() {
            // header occupies line 1
            return Err(Error::schema_mismatch(
                offset + 2,
                headers.len(),
                fields.len(),
            ));
        }
        let mapping: IndexMap<String, String> = headers.iter().cloned().zip(fields).collect();
        rows.push(Row::Mapping(mapping));
    }
    Ok(rows)
}
