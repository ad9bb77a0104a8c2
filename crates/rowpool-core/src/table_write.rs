//! Delimited table writing: the counterpart of `table::read_table`.

use std::fs;
use std::path::Path;

use csv::WriterBuilder;

use crate::error::{Error, Result};
use crate::table::{resolve_encoding, Row};

/// Options for `write_table`.
#[derive(Clone, Debug)]
pub struct WriteOptions {
    /// Field delimiter byte
    pub delimiter: u8,
    /// Explicit header names; empty means "derive from the first mapping
    /// row" (mapping rows) or "no header line" (sequence rows)
    pub headers: Vec<String>,
    /// Text encoding label for the output file
    pub encoding: String,
}

impl Default for WriteOptions {
    fn default() -> Self {
        Self {
            delimiter: b',',
            headers: Vec::new(),
            encoding: "utf-8".to_string(),
        }
    }
}

impl WriteOptions {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn delimiter(mut self, delimiter: u8) -> Self {
        self.delimiter = delimiter;
        self
    }

    pub fn headers<I, S>(mut self, headers: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.headers = headers.into_iter().map(Into::into).collect();
        self
    }

    pub fn encoding(mut self, label: impl Into<String>) -> Self {
        self.encoding = label.into();
        self
    }
}

/// Write rows to `path` as delimited text, creating or overwriting the file.
///
/// All rows must share the first row's shape. Mapping rows always get a
/// header line (explicit headers, or the first row's key order) and are
/// emitted in header field order; a row missing a header field fails with
/// `MissingField`, fields absent from the header are dropped. Sequence
/// rows are written verbatim, ragged rows included, with a header line
/// only when one was supplied.
///
/// The record text is built in memory and flushed with a single write, so
/// the file handle is closed on every exit path and nothing is written
/// when validation fails.
pub fn write_table(path: impl AsRef<Path>, rows: &[Row], options: &WriteOptions) -> Result<()> {
    let path = path.as_ref();
    if rows.is_empty() {
        return Err(Error::invalid_input("write_table", "no rows to write"));
    }
    let encoding = resolve_encoding(&options.encoding, Some(path))?;

    let mut writer = WriterBuilder::new()
        .delimiter(options.delimiter)
        .flexible(true)
        .from_writer(Vec::new());

    match &rows[0] {
        Row::Mapping(first) => {
            let headers: Vec<String> = if options.headers.is_empty() {
                first.keys().cloned().collect()
            } else {
                options.headers.clone()
            };
            writer
                .write_record(&headers)
                .map_err(|e| csv_error(e, path))?;
            for (index, row) in rows.iter().enumerate() {
                let map = match row {
                    Row::Mapping(map) => map,
                    Row::Sequence(_) => return Err(mixed_shape(index)),
                };
                let mut record = Vec::with_capacity(headers.len());
                for field in &headers {
                    match map.get(field) {
                        Some(value) => record.push(value.as_str()),
                        None => return Err(Error::missing_field(field.clone(), index)),
                    }
                }
                writer
                    .write_record(&record)
                    .map_err(|e| csv_error(e, path))?;
            }
        }
        Row::Sequence(_) => {
            if !options.headers.is_empty() {
                writer
                    .write_record(&options.headers)
                    .map_err(|e| csv_error(e, path))?;
            }
            for (index, row) in rows.iter().enumerate() {
                let fields = match row {
                    Row::Sequence(fields) => fields,
                    Row::Mapping(_) => return Err(mixed_shape(index)),
                };
                writer
                    .write_record(fields)
                    .map_err(|e| csv_error(e, path))?;
            }
        }
    }

    let buffer = writer.into_inner().map_err(|e| {
        Error::from_io(
            std::io::Error::new(std::io::ErrorKind::Other, e.to_string()),
            Some(path),
        )
    })?;

    let bytes = if encoding == encoding_rs::UTF_8 {
        buffer
    } else {
        let text = String::from_utf8(buffer).map_err(|_| {
            Error::decode(
                &options.encoding,
                Some(path),
                "record buffer was not valid UTF-8",
            )
        })?;
        let (encoded, _, had_unmappable) = encoding.encode(&text);
        if had_unmappable {
            return Err(Error::decode(
                &options.encoding,
                Some(path),
                "a field contains characters this encoding cannot represent",
            ));
        }
        encoded.into_owned()
    };

    fs::write(path, bytes).map_err(|e| Error::from_io(e, Some(path)))
}

fn mixed_shape(index: usize) -> Error {
    Error::invalid_input(
        "write_table",
        format!("row {} does not match the shape of the first row", index),
    )
}

fn csv_error(source: csv::Error, path: &Path) -> Error {
    match source.into_kind() {
        csv::ErrorKind::Io(io) => Error::from_io(io, Some(path)),
        other => Error::invalid_input("write_table", format!("{:?}", other)),
    }
}
