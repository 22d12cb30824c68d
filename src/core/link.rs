// varwatch - core/link.rs
//
// Variable-to-source linker: a batch transform that cross-references the
// extracted variable table against a generated C source file and attaches
// the comment block found above each variable's assignment.
//
// Consumes the monitor's output table (documented column order) plus a C
// source file; produces linked_variables.csv. Independent of the monitor --
// it runs after the analyser has finished, on whatever table file exists.
//
// All state is local to one `link` invocation; nothing is shared across
// runs.

use crate::util::constants::{LINKED_OUTPUT_FILE_NAME, LINKED_OUTPUT_HEADER, MAX_SOURCE_FILE_SIZE};
use crate::util::error::LinkError;
use regex::Regex;
use std::path::{Path, PathBuf};

/// One row read back from the extracted variable table.
#[derive(Debug, Clone, PartialEq, Eq)]
struct TableRow {
    name: String,
    var_type: String,
    range: String,
}

/// Outcome of one linking run.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LinkSummary {
    /// Rows read from the variable table.
    pub variables: usize,
    /// Variables found assigned in the source and written to the output.
    pub linked: usize,
    /// Path of the linked output table.
    pub output: PathBuf,
}

/// Link the variable table at `table_path` against the C source at
/// `source_path`, writing `linked_variables.csv` into `output_dir`.
///
/// A variable counts as used when some line of the source assigns to it
/// (`<name> = ...` at the start of the trimmed line). For each used
/// variable the nearest `/* ... */` comment block above the first
/// assignment is attached; variables with no comment get an empty comment
/// column. Unused variables are omitted from the output entirely.
pub fn link(
    source_path: &Path,
    table_path: &Path,
    output_dir: &Path,
) -> Result<LinkSummary, LinkError> {
    // --- Input validation ---
    if !source_path.is_file() {
        return Err(LinkError::SourceNotFound {
            path: source_path.to_path_buf(),
        });
    }
    let source_size = std::fs::metadata(source_path)
        .map_err(|e| LinkError::Io {
            path: source_path.to_path_buf(),
            source: e,
        })?
        .len();
    if source_size > MAX_SOURCE_FILE_SIZE {
        return Err(LinkError::SourceTooLarge {
            path: source_path.to_path_buf(),
            size: source_size,
            max: MAX_SOURCE_FILE_SIZE,
        });
    }
    if !table_path.is_file() {
        return Err(LinkError::TableNotFound {
            path: table_path.to_path_buf(),
        });
    }

    let rows = read_table(table_path)?;
    let source = std::fs::read_to_string(source_path).map_err(|e| LinkError::Io {
        path: source_path.to_path_buf(),
        source: e,
    })?;
    let source_lines: Vec<&str> = source.lines().collect();

    tracing::info!(
        variables = rows.len(),
        source = %source_path.display(),
        "Linking variables against source"
    );

    // --- Match each variable against the source ---
    let mut linked: Vec<(TableRow, String)> = Vec::new();
    for row in &rows {
        let Some(assign_idx) = find_assignment(&source_lines, &row.name) else {
            tracing::debug!(variable = %row.name, "Not assigned in source; skipped");
            continue;
        };
        let comment = comment_above(&source_lines, assign_idx).unwrap_or_default();
        tracing::debug!(
            variable = %row.name,
            line = assign_idx + 1,
            has_comment = !comment.is_empty(),
            "Variable linked"
        );
        linked.push((row.clone(), comment));
    }

    // --- Write the linked table (full overwrite) ---
    std::fs::create_dir_all(output_dir).map_err(|e| LinkError::Io {
        path: output_dir.to_path_buf(),
        source: e,
    })?;
    let output = output_dir.join(LINKED_OUTPUT_FILE_NAME);
    write_linked(&linked, &output)?;

    tracing::info!(
        linked = linked.len(),
        output = %output.display(),
        "Linking complete"
    );

    Ok(LinkSummary {
        variables: rows.len(),
        linked: linked.len(),
        output,
    })
}

/// Read the extracted variable table back from CSV.
///
/// Names may carry an `@<context>` suffix from the analyser; everything
/// from the `@` on is stripped before matching against the source.
fn read_table(path: &Path) -> Result<Vec<TableRow>, LinkError> {
    let mut reader = csv::Reader::from_path(path).map_err(|e| LinkError::TableParse {
        path: path.to_path_buf(),
        source: e,
    })?;

    let mut rows = Vec::new();
    for record in reader.records() {
        let record = record.map_err(|e| LinkError::TableParse {
            path: path.to_path_buf(),
            source: e,
        })?;
        let raw_name = record.get(0).unwrap_or("").trim();
        let name = match raw_name.split_once('@') {
            Some((base, _context)) => base,
            None => raw_name,
        };
        if name.is_empty() {
            continue;
        }
        rows.push(TableRow {
            name: name.to_string(),
            var_type: record.get(1).unwrap_or("").trim().to_string(),
            range: record.get(2).unwrap_or("").trim().to_string(),
        });
    }
    Ok(rows)
}

/// Find the first line assigning to `name`: optional leading whitespace,
/// the exact name, then `=`. Returns the line index.
fn find_assignment(lines: &[&str], name: &str) -> Option<usize> {
    let pattern = format!(r"^\s*{}\s*=[^=]", regex::escape(name));
    let re = match Regex::new(&pattern) {
        Ok(re) => re,
        Err(e) => {
            tracing::warn!(variable = name, error = %e, "Cannot build assignment pattern");
            return None;
        }
    };
    lines.iter().position(|line| re.is_match(line))
}

/// Nearest `/* ... */` comment block above `assign_idx`.
///
/// Walks upward to the closest line containing `/*`, then collects forward
/// until the closing `*/` (inclusive). Lines are trimmed and joined with a
/// single space. Returns `None` when no comment opener exists above the
/// assignment.
fn comment_above(lines: &[&str], assign_idx: usize) -> Option<String> {
    let open = lines[..assign_idx].iter().rposition(|l| l.contains("/*"))?;

    let mut parts: Vec<&str> = Vec::new();
    for line in &lines[open..assign_idx] {
        let trimmed = line.trim();
        if !trimmed.is_empty() {
            parts.push(trimmed);
        }
        if line.contains("*/") {
            break;
        }
    }
    Some(parts.join(" "))
}

/// Write the linked rows as CSV, fully replacing any pre-existing file.
fn write_linked(linked: &[(TableRow, String)], path: &Path) -> Result<(), LinkError> {
    let file = std::fs::File::create(path).map_err(|e| LinkError::Io {
        path: path.to_path_buf(),
        source: e,
    })?;
    let mut writer = csv::Writer::from_writer(file);

    writer
        .write_record(LINKED_OUTPUT_HEADER)
        .map_err(|e| LinkError::TableParse {
            path: path.to_path_buf(),
            source: e,
        })?;
    for (row, comment) in linked {
        writer
            .write_record([&row.name, &row.var_type, &row.range, comment])
            .map_err(|e| LinkError::TableParse {
                path: path.to_path_buf(),
                source: e,
            })?;
    }
    writer.flush().map_err(|e| LinkError::Io {
        path: path.to_path_buf(),
        source: e,
    })?;
    Ok(())
}

// =============================================================================
// Tests
// =============================================================================
