//! CSV reading and writing.
//!
//! Inputs are read by header name, so extra columns are ignored and missing
//! columns read as empty strings. Outputs always carry a header row and quote
//! every field.

use std::fs::File;
use std::io::{BufReader, BufWriter};
use std::path::Path;

use serde::de::DeserializeOwned;

use crate::error::Result;

/// A row type with a fixed output column order.
pub trait CsvRecord {
    /// Column names, in output order.
    const HEADERS: &'static [&'static str];

    /// Field values, in [`HEADERS`](CsvRecord::HEADERS) order.
    fn values(&self) -> Vec<String>;
}

/// Reads every row of a CSV file.
///
/// # Errors
///
/// Returns [`Io`](crate::StoreError::Io) if the file cannot be opened, or
/// [`Csv`](crate::StoreError::Csv) if a row cannot be decoded.
pub fn read_rows<R: DeserializeOwned>(path: impl AsRef<Path>) -> Result<Vec<R>> {
    let file = File::open(path)?;
    let mut reader = csv::ReaderBuilder::new()
        .flexible(true)
        .from_reader(BufReader::new(file));
    let mut rows = Vec::new();
    for row in reader.deserialize() {
        rows.push(row?);
    }
    Ok(rows)
}

/// Reads a CSV file if it exists; a missing file reads as no rows.
pub fn read_rows_if_present<R: DeserializeOwned>(path: impl AsRef<Path>) -> Result<Vec<R>> {
    let path = path.as_ref();
    if !path.exists() {
        return Ok(Vec::new());
    }
    read_rows(path)
}

/// Writes a header row followed by `records`, quoting every field.
///
/// # Errors
///
/// Returns [`Io`](crate::StoreError::Io) or [`Csv`](crate::StoreError::Csv)
/// if the file cannot be written.
pub fn write_records<I>(path: impl AsRef<Path>, headers: &[&str], records: I) -> Result<()>
where
    I: IntoIterator<Item = Vec<String>>,
{
    let file = File::create(path)?;
    let mut writer = csv::WriterBuilder::new()
        .quote_style(csv::QuoteStyle::Always)
        .has_headers(false)
        .from_writer(BufWriter::new(file));
    writer.write_record(headers)?;
    for record in records {
        writer.write_record(&record)?;
    }
    writer.flush()?;
    Ok(())
}

/// Writes typed rows with their own headers.
pub fn write_rows<R: CsvRecord>(path: impl AsRef<Path>, rows: &[R]) -> Result<()> {
    write_records(path, R::HEADERS, rows.iter().map(CsvRecord::values))
}

/// Writes rows extended with extra trailing columns.
pub fn write_extended<R, I>(
    path: impl AsRef<Path>,
    extra_headers: &[&str],
    rows: I,
) -> Result<()>
where
    R: CsvRecord,
    I: IntoIterator<Item = (R, Vec<String>)>,
{
    let headers: Vec<&str> = R::HEADERS
        .iter()
        .chain(extra_headers.iter())
        .copied()
        .collect();
    write_records(
        path,
        &headers,
        rows.into_iter().map(|(row, extra)| {
            let mut values = row.values();
            values.extend(extra);
            values
        }),
    )
}

/// Removes a previously written output so a stale file never outlives a run
/// that produced no rows.
pub fn remove_stale(path: impl AsRef<Path>) -> Result<()> {
    match std::fs::remove_file(path) {
        Ok(()) => Ok(()),
        Err(err) if err.kind() == std::io::ErrorKind::NotFound => Ok(()),
        Err(err) => Err(err.into()),
    }
}
