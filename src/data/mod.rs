/// Data layer: core types, loading, profiling and filtering.
///
/// Architecture:
/// ```text
///  .csv / .json / .parquet / .xlsx
///        │
///        ▼
///   ┌──────────┐
///   │  loader   │  parse file → Dataset
///   └──────────┘
///        │
///        ▼
///   ┌──────────┐
///   │  Dataset  │  Vec<Record>, one ColumnProfile per column
///   └──────────┘
///        │
///        ▼
///   ┌──────────┐
///   │  filter   │  FilterSet (normalized membership / numeric range)
///   └──────────┘
///        │
///        ▼
///   ┌──────────────┐
///   │ FilteredView  │  matching records, stats, pages
///   └──────────────┘
/// ```

pub mod filter;
pub mod loader;
pub mod model;
pub mod normalize;
pub mod profile;
pub mod search;
pub mod view;

pub use filter::{FilterError, FilterSet, FilterSetBuilder, MembershipFilter, Predicate, RangeFilter};
pub use model::{CellValue, Dataset, Record};
pub use normalize::{normalize, normalize_value};
pub use profile::{ColumnKind, ColumnProfile};
pub use search::find_matches;
pub use view::{FilterStats, FilteredView, Page};
