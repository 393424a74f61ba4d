use std::collections::BTreeMap;
use std::fmt;

use super::profile::ColumnProfile;

/// Columns with at most this many distinct values are profiled as categories.
pub const DEFAULT_CATEGORY_THRESHOLD: usize = 10;

// ---------------------------------------------------------------------------
// CellValue – a single cell of a survey sheet
// ---------------------------------------------------------------------------

/// A dynamically-typed cell value as it comes out of a spreadsheet.
/// `CellValue` must be `Ord` so it can live in `BTreeSet`s downstream.
#[derive(Debug, Clone, PartialEq)]
pub enum CellValue {
    Text(String),
    Integer(i64),
    Float(f64),
    Bool(bool),
    Null,
}

// -- Manual Eq/Ord so we can put CellValue in BTreeSet --

impl Eq for CellValue {}

impl PartialOrd for CellValue {
    fn partial_cmp(&self, other: &Self) -> Option<std::cmp::Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for CellValue {
    fn cmp(&self, other: &Self) -> std::cmp::Ordering {
        use CellValue::*;
        fn discriminant(v: &CellValue) -> u8 {
            match v {
                Null => 0,
                Bool(_) => 1,
                Integer(_) => 2,
                Float(_) => 3,
                Text(_) => 4,
            }
        }
        let da = discriminant(self);
        let db = discriminant(other);
        if da != db {
            return da.cmp(&db);
        }
        match (self, other) {
            (Null, Null) => std::cmp::Ordering::Equal,
            (Bool(a), Bool(b)) => a.cmp(b),
            (Integer(a), Integer(b)) => a.cmp(b),
            (Float(a), Float(b)) => a.total_cmp(b),
            (Text(a), Text(b)) => a.cmp(b),
            _ => std::cmp::Ordering::Equal,
        }
    }
}

impl std::hash::Hash for CellValue {
    fn hash<H: std::hash::Hasher>(&self, state: &mut H) {
        std::mem::discriminant(self).hash(state);
        match self {
            CellValue::Text(s) => s.hash(state),
            CellValue::Integer(i) => i.hash(state),
            CellValue::Float(f) => f.to_bits().hash(state),
            CellValue::Bool(b) => b.hash(state),
            CellValue::Null => {}
        }
    }
}

/// The string form of a cell. `Null` renders as the empty string.
impl fmt::Display for CellValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            CellValue::Text(s) => write!(f, "{s}"),
            CellValue::Integer(i) => write!(f, "{i}"),
            CellValue::Float(v) => write!(f, "{v}"),
            CellValue::Bool(b) => write!(f, "{b}"),
            CellValue::Null => Ok(()),
        }
    }
}

impl From<&str> for CellValue {
    fn from(s: &str) -> Self {
        CellValue::Text(s.to_string())
    }
}

impl From<String> for CellValue {
    fn from(s: String) -> Self {
        CellValue::Text(s)
    }
}

impl From<i64> for CellValue {
    fn from(i: i64) -> Self {
        CellValue::Integer(i)
    }
}

impl From<i32> for CellValue {
    fn from(i: i32) -> Self {
        CellValue::Integer(i as i64)
    }
}

impl From<f64> for CellValue {
    fn from(v: f64) -> Self {
        CellValue::Float(v)
    }
}

impl CellValue {
    /// Interpret the value as an `f64` for range filtering.
    pub fn as_f64(&self) -> Option<f64> {
        match self {
            CellValue::Float(v) if !v.is_nan() => Some(*v),
            CellValue::Integer(i) => Some(*i as f64),
            _ => None,
        }
    }

    /// Whether the cell carries no information (null or blank text).
    pub fn is_absent(&self) -> bool {
        match self {
            CellValue::Null => true,
            CellValue::Text(s) => s.trim().is_empty(),
            CellValue::Float(v) => v.is_nan(),
            _ => false,
        }
    }

    pub fn is_numeric(&self) -> bool {
        self.as_f64().is_some()
    }
}

// ---------------------------------------------------------------------------
// Record – one row of the sheet
// ---------------------------------------------------------------------------

/// A single survey response (one row of the source sheet).
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Record {
    /// column_name → value.
    pub cells: BTreeMap<String, CellValue>,
}

impl Record {
    pub fn new() -> Self {
        Self::default()
    }

    /// Builder-style insert, handy for assembling rows by hand.
    pub fn with(mut self, column: &str, value: impl Into<CellValue>) -> Self {
        self.cells.insert(column.to_string(), value.into());
        self
    }

    pub fn get(&self, column: &str) -> Option<&CellValue> {
        self.cells.get(column)
    }
}

impl FromIterator<(String, CellValue)> for Record {
    fn from_iter<I: IntoIterator<Item = (String, CellValue)>>(iter: I) -> Self {
        Record {
            cells: iter.into_iter().collect(),
        }
    }
}

// ---------------------------------------------------------------------------
// Dataset – the complete loaded sheet
// ---------------------------------------------------------------------------

/// The full parsed sheet with one pre-computed profile per column.
///
/// Every record carries every column: missing cells of textual columns are
/// filled with empty text, missing cells of numeric columns with `Null`.
///
/// Records and columns are read-only once built, so the profiles always
/// describe the data they were inferred from:
///
/// ```compile_fail
/// use survey_filter::data::model::{Dataset, Record, DEFAULT_CATEGORY_THRESHOLD};
///
/// let mut ds = Dataset::from_records(
///     vec![Record::new().with("Idade", 30)],
///     DEFAULT_CATEGORY_THRESHOLD,
/// );
/// ds.records.push(Record::new().with("Idade", "trinta"));
/// ```
#[derive(Debug, Clone)]
pub struct Dataset {
    records: Vec<Record>,
    column_names: Vec<String>,
    profiles: BTreeMap<String, ColumnProfile>,
    category_threshold: usize,
}

impl Dataset {
    /// Build a dataset from records, keeping `column_names` order first and
    /// appending any column only seen in the records.
    pub fn new(column_names: Vec<String>, records: Vec<Record>, category_threshold: usize) -> Self {
        let mut columns = Vec::with_capacity(column_names.len());
        for name in column_names {
            if !columns.contains(&name) {
                columns.push(name);
            }
        }
        for record in &records {
            for col in record.cells.keys() {
                if !columns.contains(col) {
                    columns.push(col.clone());
                }
            }
        }

        let profiles: BTreeMap<String, ColumnProfile> = columns
            .iter()
            .map(|col| {
                let profile = ColumnProfile::infer(
                    records.iter().map(|r| r.get(col)),
                    category_threshold,
                );
                (col.clone(), profile)
            })
            .collect();

        let records = records
            .into_iter()
            .map(|mut record| {
                for (col, profile) in &profiles {
                    let cell = record.cells.entry(col.clone()).or_insert(CellValue::Null);
                    if !profile.is_numeric() && matches!(cell, CellValue::Null) {
                        *cell = CellValue::Text(String::new());
                    }
                }
                record
            })
            .collect();

        Dataset {
            records,
            column_names: columns,
            profiles,
            category_threshold,
        }
    }

    /// Build a dataset with columns in first-seen order.
    pub fn from_records(records: Vec<Record>, category_threshold: usize) -> Self {
        Self::new(Vec::new(), records, category_threshold)
    }

    /// Drop columns where no record holds a value, then re-profile.
    pub fn without_empty_columns(self) -> Self {
        let keep: Vec<String> = self
            .column_names
            .iter()
            .filter(|col| {
                self.records
                    .iter()
                    .any(|r| r.get(col).is_some_and(|v| !v.is_absent()))
            })
            .cloned()
            .collect();
        if keep.len() == self.column_names.len() {
            return self;
        }
        log::debug!(
            "dropping {} empty column(s)",
            self.column_names.len() - keep.len()
        );
        let records = self
            .records
            .into_iter()
            .map(|mut record| {
                record.cells.retain(|col, _| keep.contains(col));
                record
            })
            .collect();
        Self::new(keep, records, self.category_threshold)
    }

    /// All records (rows), in sheet order.
    pub fn records(&self) -> &[Record] {
        &self.records
    }

    /// Column names in sheet order.
    pub fn column_names(&self) -> &[String] {
        &self.column_names
    }

    /// Inferred type and distinct values / range of each column.
    pub fn profiles(&self) -> &BTreeMap<String, ColumnProfile> {
        &self.profiles
    }

    pub fn profile(&self, column: &str) -> Option<&ColumnProfile> {
        self.profiles.get(column)
    }

    pub fn has_column(&self, column: &str) -> bool {
        self.profiles.contains_key(column)
    }

    /// Number of records.
    pub fn len(&self) -> usize {
        self.records.len()
    }

    /// Whether the dataset is empty.
    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }
}
