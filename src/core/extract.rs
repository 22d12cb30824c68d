// varwatch - core/extract.rs
//
// The extraction engine: turns the raw line sequence of the analyser's log
// artifact into a structured variable table.
//
// Three stages, each pure text -> data:
//   1. Section isolation: find the data-dictionary block between its start
//      marker and either terminator.
//   2. Per-line parsing: split candidate declaration lines of the shape
//      `... # <name> of type <type> in <range> ...` into fields.
//   3. Range normalization: accept the interval form `[low, high]` and the
//      singleton-set form `{value}`, both restricted to finite floats.
//
// Malformed lines and unsupported range shapes are skipped silently so one
// bad declaration never aborts extraction of the rest; the skip counts are
// reported through `ExtractStats` for observability.

use crate::core::model::{ValueRange, VariableRecord, VariableTable};
use crate::util::constants::{
    ALARM_MARKER, DICT_START_MARKER, RANGE_TOKEN, SHARED_MEMORY_MARKER, TYPE_TOKEN,
};
use crate::util::error::ExtractError;

/// Counters describing what extraction did and did not keep.
///
/// Skipped lines are tolerated by design (the log is noisy and declarations
/// may repeat across analyser iterations); the counts exist so callers can
/// surface the silence at debug level instead of guessing stricter
/// semantics.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ExtractStats {
    /// Lines inside the dictionary section (marker lines excluded).
    pub section_lines: usize,
    /// Lines that did not have the declaration shape.
    pub invalid_lines: usize,
    /// Declaration lines whose range expression could not be normalised.
    pub unparsable_ranges: usize,
    /// Valid declarations dropped because their name was already present.
    pub duplicates: usize,
}

/// Result of a successful extraction pass.
#[derive(Debug, Clone, PartialEq)]
pub struct Extraction {
    pub table: VariableTable,
    pub stats: ExtractStats,
}

/// Extract the variable table from the full ordered line sequence of the
/// artifact.
///
/// Returns `Ok(None)` when no complete dictionary section is present (start
/// marker missing, or present but never terminated). Returns
/// `Err(ExtractError::EmptyInput)` when invoked with zero lines -- the
/// caller must not run extraction before confirming readiness, so an empty
/// input is a contract violation rather than a no-data condition.
///
/// Extraction is idempotent: the same line sequence always yields an
/// identical table.
pub fn extract<S: AsRef<str>>(lines: &[S]) -> Result<Option<Extraction>, ExtractError> {
    let section = match isolate_dictionary(lines)? {
        Some(section) => section,
        None => {
            tracing::debug!("No complete data-dictionary section in input");
            return Ok(None);
        }
    };

    let mut stats = ExtractStats {
        section_lines: section.len(),
        ..Default::default()
    };
    let mut table = VariableTable::new();

    for line in &section {
        let (name, var_type, raw_range) = match parse_declaration(line) {
            Some(parts) => parts,
            None => {
                stats.invalid_lines += 1;
                continue;
            }
        };

        let range = match parse_range(raw_range) {
            Some(range) => range,
            None => {
                tracing::debug!(
                    variable = %name,
                    range = raw_range.trim(),
                    "Skipping declaration with unsupported range"
                );
                stats.unparsable_ranges += 1;
                continue;
            }
        };

        if !table.insert_first(name.clone(), VariableRecord { var_type, range }) {
            tracing::debug!(variable = %name, "Duplicate declaration ignored");
            stats.duplicates += 1;
        }
    }

    tracing::debug!(
        variables = table.len(),
        section_lines = stats.section_lines,
        invalid = stats.invalid_lines,
        unparsable_ranges = stats.unparsable_ranges,
        duplicates = stats.duplicates,
        "Extraction complete"
    );

    Ok(Some(Extraction { table, stats }))
}

/// Isolate the data-dictionary section from the artifact's line sequence.
///
/// Scans lines in order; the first line containing the start marker enters
/// in-block mode (the marker line itself is not retained). Accumulation
/// stops at the first subsequent line containing either terminator; the
/// accumulated lines are returned in original order. If neither terminator
/// is ever seen the section is incomplete and `None` is returned.
pub fn isolate_dictionary<S: AsRef<str>>(
    lines: &[S],
) -> Result<Option<Vec<String>>, ExtractError> {
    if lines.is_empty() {
        return Err(ExtractError::EmptyInput);
    }

    let mut in_block = false;
    let mut section: Vec<String> = Vec::new();

    for line in lines {
        let line = line.as_ref();
        if !in_block {
            if line.contains(DICT_START_MARKER) {
                in_block = true;
            }
        } else if line.contains(SHARED_MEMORY_MARKER) || line.contains(ALARM_MARKER) {
            return Ok(Some(section));
        } else {
            section.push(line.to_string());
        }
    }

    // Start marker absent, or the section never terminated.
    Ok(None)
}

/// Split a candidate declaration line into (name, type, raw range).
///
/// A line is a declaration iff all three tokens can be extracted:
///   - name: text between the first `#` and the first `of type`;
///   - type: text between `of type` and the last `in` of the tail;
///   - range: text after that `in`.
///
/// The `in` separator is matched from the right so type names containing
/// the letters "in" (`int`, `uint8`) do not shift the boundary. This is a
/// containment check, not a grammar -- deliberately loose.
fn parse_declaration(line: &str) -> Option<(String, String, &str)> {
    let (head, tail) = line.split_once(TYPE_TOKEN)?;
    let (_, name) = head.split_once('#')?;
    let (var_type, raw_range) = tail.rsplit_once(RANGE_TOKEN)?;

    let name = name.trim();
    if name.is_empty() {
        return None;
    }

    Some((name.to_string(), var_type.trim().to_string(), raw_range))
}

/// Normalise a range expression to an inclusive `ValueRange`.
///
/// Exactly two notations are accepted:
///   - interval `[low, high]` -> `low..high`;
///   - singleton set `{value}` (trailing set-algebra annotations after the
///     closing brace are ignored) -> `value..value`.
///
/// Any other shape, or a bound failing the finite-float check, yields
/// `None` and the declaration is dropped.
pub(crate) fn parse_range(raw: &str) -> Option<ValueRange> {
    let trimmed = raw.trim();

    if trimmed.starts_with('[') {
        let (left, right) = trimmed.split_once(',')?;
        let strip = |s: &str| {
            s.trim_matches(|c: char| c == '[' || c == ']' || c.is_whitespace())
                .to_string()
        };
        let low = parse_finite(&strip(left))?;
        let high = parse_finite(&strip(right))?;
        Some(ValueRange::new(low, high))
    } else if let Some(inner) = trimmed.strip_prefix('{') {
        let (value, _annotations) = inner.split_once('}')?;
        Some(ValueRange::singleton(parse_finite(value.trim())?))
    } else {
        None
    }
}

/// Parse a finite float, rejecting any textual form containing `nan` or
/// `inf` (case-insensitive) before the numeric parse runs, so platform
/// spellings like `Infinity` or `-inf` never slip through.
fn parse_finite(text: &str) -> Option<f64> {
    let lower = text.to_ascii_lowercase();
    if lower.contains("nan") || lower.contains("inf") {
        return None;
    }
    text.parse::<f64>().ok().filter(|v| v.is_finite())
}

// =============================================================================
// Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    fn lines(raw: &[&str]) -> Vec<String> {
        raw.iter().map(|s| s.to_string()).collect()
    }

    // -------------------------------------------------------------------------
    // Section isolation
    // -------------------------------------------------------------------------

    #[test]
    fn test_no_start_marker_yields_none() {
        let input = lines(&["noise", "# X of type int in [0, 1]", "#shared memory usage:"]);
        assert_eq!(isolate_dictionary(&input).unwrap(), None);
        assert_eq!(extract(&input).unwrap(), None);
    }

    #[test]
    fn test_unterminated_section_yields_none() {
        let input = lines(&["#data-dictionary-start", "# X of type int in [0, 1]"]);
        assert_eq!(isolate_dictionary(&input).unwrap(), None);
    }

    #[test]
    fn test_empty_input_is_an_error() {
        let input: Vec<String> = Vec::new();
        assert!(matches!(
            isolate_dictionary(&input),
            Err(ExtractError::EmptyInput)
        ));
        assert!(matches!(extract(&input), Err(ExtractError::EmptyInput)));
    }

    #[test]
    fn test_marker_lines_are_not_retained() {
        let input = lines(&[
            "#data-dictionary-start",
            "payload",
            "#shared memory usage: 12kB",
        ]);
        let section = isolate_dictionary(&input).unwrap().unwrap();
        assert_eq!(section, vec!["payload".to_string()]);
    }

    #[test]
    fn test_alarm_also_terminates_the_section() {
        let input = lines(&["#data-dictionary-start", "payload", "#ALARM at 0x10"]);
        let section = isolate_dictionary(&input).unwrap().unwrap();
        assert_eq!(section, vec!["payload".to_string()]);
    }

    // -------------------------------------------------------------------------
    // Range normalization
    // -------------------------------------------------------------------------

    #[test]
    fn test_interval_form() {
        assert_eq!(parse_range("[0, 1]"), Some(ValueRange::new(0.0, 1.0)));
        assert_eq!(
            parse_range("  [ -3.5 , 12.25 ]  "),
            Some(ValueRange::new(-3.5, 12.25))
        );
    }

    #[test]
    fn test_singleton_form_ignores_trailing_annotations() {
        assert_eq!(parse_range("{40} /\\ != 0"), Some(ValueRange::singleton(40.0)));
        assert_eq!(parse_range("{ -1.5 }"), Some(ValueRange::singleton(-1.5)));
    }

    #[test]
    fn test_nan_and_inf_are_rejected_any_case() {
        for raw in [
            "[NaN, 1]",
            "[0, nan]",
            "[-inf, 0]",
            "[0, Inf]",
            "[0, INFINITY]",
            "{inf}",
            "{NAN} /\\ != 0",
        ] {
            assert_eq!(parse_range(raw), None, "expected rejection of {raw:?}");
        }
    }

    #[test]
    fn test_unsupported_shapes_yield_none() {
        for raw in ["", "0..1", "(0, 1)", "[0 1]", "{}", "{a}", "[a, b]"] {
            assert_eq!(parse_range(raw), None, "expected rejection of {raw:?}");
        }
    }

    // -------------------------------------------------------------------------
    // Declaration parsing (via extract)
    // -------------------------------------------------------------------------

    #[test]
    fn test_interval_declaration_with_timestamp_prefix() {
        // Scenario A from the analyser's real output shape.
        let input = lines(&[
            "#data-dictionary-start",
            "[00:00:01] #  Foo of type const boolean in [0, 1]",
            "#shared memory usage:",
        ]);
        let extraction = extract(&input).unwrap().unwrap();
        let record = extraction.table.get("Foo").expect("Foo extracted");
        assert_eq!(record.var_type, "const boolean");
        assert_eq!(record.range.to_string(), "0.0..1.0");
        assert_eq!(extraction.table.len(), 1);
    }

    #[test]
    fn test_singleton_declaration_with_alarm_terminator() {
        // Scenario B: type "int" must survive the embedded "in" letters.
        let input = lines(&[
            "#data-dictionary-start",
            "#  Bar of type int in {40} /\\ != 0",
            "#ALARM",
        ]);
        let extraction = extract(&input).unwrap().unwrap();
        let record = extraction.table.get("Bar").expect("Bar extracted");
        assert_eq!(record.var_type, "int");
        assert_eq!(record.range.to_string(), "40.0..40.0");
    }

    #[test]
    fn test_lines_missing_tokens_are_counted_invalid() {
        let input = lines(&[
            "#data-dictionary-start",
            "no tokens at all",
            "# Foo of type int [0, 1]",    // separator `in` only inside "int"
            "Foo of type int in [0, 1]",   // no '#'
            "# Baz of type int in [0, 1]", // the one valid line
            "#shared memory usage:",
        ]);
        let extraction = extract(&input).unwrap().unwrap();
        assert_eq!(extraction.table.len(), 1);
        assert!(extraction.table.contains("Baz"));
        assert_eq!(
            extraction.stats.invalid_lines + extraction.stats.unparsable_ranges,
            3
        );
    }

    #[test]
    fn test_bad_range_declaration_is_dropped_silently() {
        let input = lines(&[
            "#data-dictionary-start",
            "# Foo of type float in [0, inf]",
            "# Bar of type int in {40}",
            "#shared memory usage:",
        ]);
        let extraction = extract(&input).unwrap().unwrap();
        assert!(!extraction.table.contains("Foo"));
        assert!(extraction.table.contains("Bar"));
        assert_eq!(extraction.stats.unparsable_ranges, 1);
    }

    #[test]
    fn test_first_duplicate_wins() {
        let input = lines(&[
            "#data-dictionary-start",
            "# Foo of type int in [0, 1]",
            "# Foo of type float in [5, 9]",
            "#shared memory usage:",
        ]);
        let extraction = extract(&input).unwrap().unwrap();
        let record = extraction.table.get("Foo").unwrap();
        assert_eq!(record.var_type, "int");
        assert_eq!(record.range, ValueRange::new(0.0, 1.0));
        assert_eq!(extraction.stats.duplicates, 1);
    }

    #[test]
    fn test_extraction_is_idempotent() {
        let input = lines(&[
            "#data-dictionary-start",
            "# A of type int in [0, 10]",
            "# B of type const boolean in [0, 1]",
            "# C of type int in {7} /\\ != 0",
            "# A of type int in [0, 99]",
            "broken line",
            "#shared memory usage:",
        ]);
        let first = extract(&input).unwrap().unwrap();
        let second = extract(&input).unwrap().unwrap();
        assert_eq!(first, second);
        assert_eq!(first.table.len(), 3);
    }

    #[test]
    fn test_declarations_after_terminator_are_ignored() {
        let input = lines(&[
            "#data-dictionary-start",
            "# Foo of type int in [0, 1]",
            "#shared memory usage:",
            "# Late of type int in [0, 1]",
        ]);
        let extraction = extract(&input).unwrap().unwrap();
        assert_eq!(extraction.table.len(), 1);
        assert!(!extraction.table.contains("Late"));
    }
}
