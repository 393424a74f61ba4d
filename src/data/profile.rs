use std::collections::HashSet;

use super::model::CellValue;
use super::search::find_matches;

/// The semantic type of a column, inferred from its values.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ColumnKind {
    Text,
    Category,
    Number,
}

impl std::fmt::Display for ColumnKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ColumnKind::Text => write!(f, "text"),
            ColumnKind::Category => write!(f, "category"),
            ColumnKind::Number => write!(f, "number"),
        }
    }
}

/// Read-only summary of one column, computed once when a dataset is built.
///
/// Textual profiles keep the distinct values in first-seen order with their
/// original casing and accents; blank values are left out of the list.
#[derive(Debug, Clone, PartialEq)]
pub enum ColumnProfile {
    Text { values: Vec<String> },
    Category { values: Vec<String> },
    Number { min: f64, max: f64 },
}

impl ColumnProfile {
    /// Infer a profile from a column's cells (`None` = missing cell).
    ///
    /// A column is numeric when it has at least one value and every present
    /// value is a number. Otherwise it is a category when it has between one
    /// and `category_threshold` distinct values, and free text beyond that.
    pub fn infer<'a, I>(cells: I, category_threshold: usize) -> Self
    where
        I: IntoIterator<Item = Option<&'a CellValue>>,
    {
        let present: Vec<&CellValue> = cells
            .into_iter()
            .flatten()
            .filter(|v| !v.is_absent())
            .collect();

        let numbers: Vec<f64> = present.iter().filter_map(|v| v.as_f64()).collect();
        if !present.is_empty() && numbers.len() == present.len() {
            let min = numbers.iter().copied().fold(f64::INFINITY, f64::min);
            let max = numbers.iter().copied().fold(f64::NEG_INFINITY, f64::max);
            return ColumnProfile::Number { min, max };
        }

        let mut seen = HashSet::new();
        let values: Vec<String> = present
            .iter()
            .map(|v| v.to_string())
            .filter(|s| seen.insert(s.clone()))
            .collect();

        if !values.is_empty() && values.len() <= category_threshold {
            ColumnProfile::Category { values }
        } else {
            ColumnProfile::Text { values }
        }
    }

    pub fn kind(&self) -> ColumnKind {
        match self {
            ColumnProfile::Text { .. } => ColumnKind::Text,
            ColumnProfile::Category { .. } => ColumnKind::Category,
            ColumnProfile::Number { .. } => ColumnKind::Number,
        }
    }

    pub fn is_numeric(&self) -> bool {
        matches!(self, ColumnProfile::Number { .. })
    }

    /// Distinct display values; empty for numeric columns.
    pub fn distinct_values(&self) -> &[String] {
        match self {
            ColumnProfile::Text { values } | ColumnProfile::Category { values } => values,
            ColumnProfile::Number { .. } => &[],
        }
    }

    /// `(min, max)` of a numeric column.
    pub fn range(&self) -> Option<(f64, f64)> {
        match self {
            ColumnProfile::Number { min, max } => Some((*min, *max)),
            _ => None,
        }
    }

    /// A numeric column holding a single value cannot be usefully narrowed.
    pub fn is_range_filterable(&self) -> bool {
        matches!(self, ColumnProfile::Number { min, max } if min < max)
    }

    /// Case- and accent-insensitive search over the distinct values.
    pub fn search(&self, query: &str, limit: usize) -> Vec<&str> {
        find_matches(query, self.distinct_values(), limit)
    }
}
