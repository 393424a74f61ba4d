use std::collections::{BTreeMap, BTreeSet};
use std::fmt;

use thiserror::Error;

use super::model::{Dataset, Record};
use super::normalize::{normalize, normalize_value};
use super::view::FilteredView;

/// How many selected values the filter summary lists before eliding.
const SUMMARY_VALUES: usize = 3;

// ---------------------------------------------------------------------------
// Errors
// ---------------------------------------------------------------------------

/// A predicate that cannot be built against the current dataset.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum FilterError {
    #[error("unknown column '{column}'")]
    UnknownColumn { column: String },
    #[error("invalid range for '{column}': {low} > {high}")]
    InvalidRange { column: String, low: f64, high: f64 },
    #[error("column '{column}' is not numeric")]
    NotNumeric { column: String },
}

// ---------------------------------------------------------------------------
// Predicates
// ---------------------------------------------------------------------------

/// Admits records whose normalized value is one of the selected ones.
#[derive(Debug, Clone, PartialEq)]
pub struct MembershipFilter {
    pub column: String,
    /// Normalized forms used for comparison.
    pub selected: BTreeSet<String>,
    /// Values as the user picked them, for the active-filter summary.
    pub display: Vec<String>,
}

impl MembershipFilter {
    pub fn matches(&self, record: &Record) -> bool {
        let value = record.get(&self.column).map(normalize_value).unwrap_or_default();
        self.selected.contains(&value)
    }
}

/// Admits records whose numeric value lies in `[low, high]`.
#[derive(Debug, Clone, PartialEq)]
pub struct RangeFilter {
    pub column: String,
    pub low: f64,
    pub high: f64,
}

impl RangeFilter {
    pub fn matches(&self, record: &Record) -> bool {
        record
            .get(&self.column)
            .and_then(|v| v.as_f64())
            .is_some_and(|v| self.low <= v && v <= self.high)
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum Predicate {
    Membership(MembershipFilter),
    Range(RangeFilter),
}

impl Predicate {
    pub fn column(&self) -> &str {
        match self {
            Predicate::Membership(m) => &m.column,
            Predicate::Range(r) => &r.column,
        }
    }

    pub fn matches(&self, record: &Record) -> bool {
        match self {
            Predicate::Membership(m) => m.matches(record),
            Predicate::Range(r) => r.matches(record),
        }
    }
}

/// Short human summary: `Comunidade: A, B, C... (+2)` or `Idade: 18 to 60`.
impl fmt::Display for Predicate {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Predicate::Membership(m) => {
                let shown: Vec<&str> = m.display.iter().take(SUMMARY_VALUES).map(String::as_str).collect();
                write!(f, "{}: {}", m.column, shown.join(", "))?;
                if m.display.len() > SUMMARY_VALUES {
                    write!(f, "... (+{})", m.display.len() - SUMMARY_VALUES)?;
                }
                Ok(())
            }
            Predicate::Range(r) => write!(f, "{}: {} to {}", r.column, r.low, r.high),
        }
    }
}

// ---------------------------------------------------------------------------
// FilterSet: the active predicates, at most one per column
// ---------------------------------------------------------------------------

/// The active predicate set. A column without an entry is unconstrained.
///
/// A set is built against one dataset and replaced as a whole whenever the
/// selection changes; it is never patched in place.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct FilterSet {
    predicates: BTreeMap<String, Predicate>,
}

impl FilterSet {
    pub fn builder(dataset: &Dataset) -> FilterSetBuilder<'_> {
        FilterSetBuilder {
            dataset,
            predicates: BTreeMap::new(),
        }
    }

    pub fn len(&self) -> usize {
        self.predicates.len()
    }

    pub fn is_empty(&self) -> bool {
        self.predicates.is_empty()
    }

    pub fn get(&self, column: &str) -> Option<&Predicate> {
        self.predicates.get(column)
    }

    pub fn iter(&self) -> impl Iterator<Item = &Predicate> {
        self.predicates.values()
    }

    /// Whether `record` satisfies every active predicate.
    pub fn matches(&self, record: &Record) -> bool {
        self.predicates.values().all(|p| p.matches(record))
    }

    /// Evaluate the whole set against `dataset` in one pass.
    pub fn apply<'a>(&self, dataset: &'a Dataset) -> FilteredView<'a> {
        let indices = dataset
            .records()
            .iter()
            .enumerate()
            .filter(|(_, record)| self.matches(record))
            .map(|(i, _)| i)
            .collect();
        FilteredView::new(dataset, indices)
    }
}

/// Builds a [`FilterSet`], validating each predicate against the dataset's
/// columns. A failed call consumes the builder, so nothing is half-applied.
#[derive(Debug)]
pub struct FilterSetBuilder<'a> {
    dataset: &'a Dataset,
    predicates: BTreeMap<String, Predicate>,
}

impl<'a> FilterSetBuilder<'a> {
    /// Keep records whose `column` value matches one of `values`, ignoring
    /// case and accents. An empty selection leaves the column unconstrained.
    pub fn membership<I, S>(mut self, column: &str, values: I) -> Result<Self, FilterError>
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.known_column(column)?;
        let display: Vec<String> = values.into_iter().map(Into::into).collect();
        if display.is_empty() {
            self.predicates.remove(column);
            return Ok(self);
        }
        let selected = display.iter().map(|v| normalize(v)).collect();
        self.predicates.insert(
            column.to_string(),
            Predicate::Membership(MembershipFilter {
                column: column.to_string(),
                selected,
                display,
            }),
        );
        Ok(self)
    }

    /// Keep records whose numeric `column` value lies in `[low, high]`.
    ///
    /// Columns holding a single value get no range predicate at all.
    pub fn range(mut self, column: &str, low: f64, high: f64) -> Result<Self, FilterError> {
        let profile = self.known_column(column)?;
        if !profile.is_numeric() {
            return Err(FilterError::NotNumeric {
                column: column.to_string(),
            });
        }
        if low.is_nan() || high.is_nan() || low > high {
            return Err(FilterError::InvalidRange {
                column: column.to_string(),
                low,
                high,
            });
        }
        if !profile.is_range_filterable() {
            log::debug!("skipping range on single-valued column '{column}'");
            self.predicates.remove(column);
            return Ok(self);
        }
        self.predicates.insert(
            column.to_string(),
            Predicate::Range(RangeFilter {
                column: column.to_string(),
                low,
                high,
            }),
        );
        Ok(self)
    }

    pub fn build(self) -> FilterSet {
        FilterSet {
            predicates: self.predicates,
        }
    }

    fn known_column(&self, column: &str) -> Result<&'a super::profile::ColumnProfile, FilterError> {
        self.dataset
            .profile(column)
            .ok_or_else(|| FilterError::UnknownColumn {
                column: column.to_string(),
            })
    }
}
