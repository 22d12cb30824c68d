// varwatch - core/export.rs
//
// CSV serialisation of the extracted variable table.
// Core layer: writes to any Write trait object; file handling is a thin
// wrapper that always overwrites the target.

use crate::core::model::VariableTable;
use crate::util::constants::OUTPUT_HEADER;
use crate::util::error::ExportError;
use std::io::Write;
use std::path::Path;

/// Serialise the table as CSV to `writer`.
///
/// One row per variable in name order, preceded by the fixed three-column
/// header. Returns the number of data rows written.
pub fn write_table<W: Write>(
    table: &VariableTable,
    writer: W,
    export_path: &Path,
) -> Result<usize, ExportError> {
    let mut csv_writer = csv::Writer::from_writer(writer);

    csv_writer
        .write_record(OUTPUT_HEADER)
        .map_err(|e| ExportError::Csv {
            path: export_path.to_path_buf(),
            source: e,
        })?;

    let mut count = 0;
    for (name, record) in table.iter() {
        csv_writer
            .write_record([name, &record.var_type, &record.range.to_string()])
            .map_err(|e| ExportError::Csv {
                path: export_path.to_path_buf(),
                source: e,
            })?;
        count += 1;
    }

    csv_writer.flush().map_err(|e| ExportError::Io {
        path: export_path.to_path_buf(),
        source: e,
    })?;

    Ok(count)
}

/// Write the table to `path`, fully replacing any pre-existing file.
pub fn write_table_file(table: &VariableTable, path: &Path) -> Result<usize, ExportError> {
    let file = std::fs::File::create(path).map_err(|e| ExportError::Io {
        path: path.to_path_buf(),
        source: e,
    })?;
    let count = write_table(table, file, path)?;
    tracing::info!(path = %path.display(), variables = count, "Variable table written");
    Ok(count)
}
