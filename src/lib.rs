//! Accent- and case-insensitive filtering of community survey sheets.
//!
//! Load a sheet with [`data::loader::load_file`], build a [`FilterSet`]
//! against it and apply it to get a [`FilteredView`]:
//!
//! ```
//! use survey_filter::data::model::{Dataset, Record, DEFAULT_CATEGORY_THRESHOLD};
//! use survey_filter::FilterSet;
//!
//! let ds = Dataset::from_records(
//!     vec![
//!         Record::new().with("Comunidade", "Vila Aliança").with("Idade", 34),
//!         Record::new().with("Comunidade", "Centro").with("Idade", 52),
//!     ],
//!     DEFAULT_CATEGORY_THRESHOLD,
//! );
//! let filters = FilterSet::builder(&ds)
//!     .membership("Comunidade", ["vila alianca"])?
//!     .build();
//! assert_eq!(filters.apply(&ds).len(), 1);
//! # Ok::<(), survey_filter::FilterError>(())
//! ```

pub mod budget;
pub mod config;
pub mod data;
pub mod state;

pub use config::Config;
pub use data::{
    find_matches, normalize, CellValue, ColumnKind, ColumnProfile, Dataset, FilterError, FilterSet,
    FilterStats, FilteredView, Predicate, Record,
};
pub use state::{LoadState, Session, SessionStore};
