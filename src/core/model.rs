// varwatch - core/model.rs
//
// Data model for extracted variable declarations.
// Core layer: standard library only, no I/O.

use std::collections::BTreeMap;
use std::fmt;

/// Inclusive value range of a variable, `low..high`.
///
/// Both bounds are always finite: range parsing rejects NaN and infinities
/// before a `ValueRange` can be constructed. A degenerate range (`low ==
/// high`) represents a singleton value.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ValueRange {
    pub low: f64,
    pub high: f64,
}

impl ValueRange {
    pub fn new(low: f64, high: f64) -> Self {
        Self { low, high }
    }

    /// A degenerate range containing exactly one value.
    pub fn singleton(value: f64) -> Self {
        Self {
            low: value,
            high: value,
        }
    }
}

impl fmt::Display for ValueRange {
    /// Renders as `<low>..<high>`.
    ///
    /// The `{:?}` float form keeps a trailing `.0` on integral values
    /// (`0.0..1.0`, not `0..1`), matching the table format consumers expect.
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:?}..{:?}", self.low, self.high)
    }
}

/// One extracted variable declaration.
///
/// Immutable after creation; the name acts as the unique key in the table,
/// so it lives there rather than here.
#[derive(Debug, Clone, PartialEq)]
pub struct VariableRecord {
    /// Declared type, free text as it appears in the log (e.g. "const boolean").
    pub var_type: String,

    /// Normalised inclusive value range.
    pub range: ValueRange,
}

/// Mapping from variable name to its extracted record.
///
/// Keys are unique; the first declaration of a name wins and later
/// duplicates are ignored. Iteration order is name order, which keeps the
/// serialized table deterministic.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct VariableTable {
    records: BTreeMap<String, VariableRecord>,
}

impl VariableTable {
    pub fn new() -> Self {
        Self::default()
    }

    /// Insert a record unless the name is already present.
    ///
    /// Returns `true` if the record was inserted, `false` if the name was a
    /// duplicate and the existing record was kept.
    pub fn insert_first(&mut self, name: String, record: VariableRecord) -> bool {
        match self.records.entry(name) {
            std::collections::btree_map::Entry::Vacant(e) => {
                e.insert(record);
                true
            }
            std::collections::btree_map::Entry::Occupied(_) => false,
        }
    }

    pub fn get(&self, name: &str) -> Option<&VariableRecord> {
        self.records.get(name)
    }

    pub fn contains(&self, name: &str) -> bool {
        self.records.contains_key(name)
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    /// Iterate entries in name order.
    pub fn iter(&self) -> impl Iterator<Item = (&String, &VariableRecord)> {
        self.records.iter()
    }
}
