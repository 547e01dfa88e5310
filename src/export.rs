use std::{
    fs::File,
    io::{BufWriter, Write},
    path::Path,
};

use log::info;
use serde::Serialize;

use crate::PaddockError;

/// Writes one JSON document per line for each record.
pub fn write_json_lines<T: Serialize>(
    writer: &mut impl Write,
    records: &[T],
) -> Result<usize, PaddockError> {
    for record in records {
        serde_json::to_writer(&mut *writer, record)
            .map_err(|e| PaddockError::OutputSerializeError { source: e })?;
        writeln!(writer).map_err(|e| PaddockError::WriterError { source: e })?;
    }
    writer
        .flush()
        .map_err(|e| PaddockError::WriterError { source: e })?;
    Ok(records.len())
}

/// Creates (or truncates) `file` and exports `records` to it as JSON lines.
pub fn export_records<T: Serialize>(file: &Path, records: &[T]) -> Result<(), PaddockError> {
    let export_file = File::create(file).map_err(|e| PaddockError::WriterError { source: e })?;
    let mut export_file_writer = BufWriter::new(export_file);
    let written = write_json_lines(&mut export_file_writer, records)?;
    info!("Exported {} records to {:?}", written, file);
    Ok(())
}
