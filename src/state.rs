use std::collections::HashMap;
use std::path::Path;

use crate::config::Config;
use crate::data::filter::FilterSet;
use crate::data::model::Dataset;
use crate::data::view::{FilterStats, FilteredView};

// ---------------------------------------------------------------------------
// Load state
// ---------------------------------------------------------------------------

/// Outcome of the last load attempt.
#[derive(Debug, Clone, Default)]
pub enum LoadState {
    #[default]
    Empty,
    Loaded(Dataset),
    /// Error chain of the failed load, ready for display.
    Failed(String),
}

// ---------------------------------------------------------------------------
// Session
// ---------------------------------------------------------------------------

/// One user's query session: the loaded sheet plus the active filters.
///
/// Filters are replaced as a whole on every interaction, never patched.
#[derive(Debug, Clone, Default)]
pub struct Session {
    pub load_state: LoadState,
    filters: FilterSet,
}

impl Session {
    pub fn new() -> Self {
        Self::default()
    }

    /// Load a sheet, resetting filters. A failure is recorded, not returned.
    pub fn load(&mut self, path: &Path, config: &Config) {
        match crate::data::loader::load_file(path, &config.engine.load_options()) {
            Ok(dataset) => self.set_dataset(dataset),
            Err(e) => {
                log::error!("Failed to load file: {e:#}");
                self.load_state = LoadState::Failed(format!("{e:#}"));
                self.filters = FilterSet::default();
            }
        }
    }

    /// Ingest a newly loaded dataset and clear filters.
    pub fn set_dataset(&mut self, dataset: Dataset) {
        self.load_state = LoadState::Loaded(dataset);
        self.filters = FilterSet::default();
    }

    pub fn dataset(&self) -> Option<&Dataset> {
        match &self.load_state {
            LoadState::Loaded(ds) => Some(ds),
            _ => None,
        }
    }

    pub fn error(&self) -> Option<&str> {
        match &self.load_state {
            LoadState::Failed(msg) => Some(msg),
            _ => None,
        }
    }

    pub fn filters(&self) -> &FilterSet {
        &self.filters
    }

    /// Swap in a freshly built filter set.
    pub fn replace_filters(&mut self, filters: FilterSet) {
        self.filters = filters;
    }

    pub fn clear_filters(&mut self) {
        self.filters = FilterSet::default();
    }

    /// Records passing the current filters, if a dataset is loaded.
    pub fn view(&self) -> Option<FilteredView<'_>> {
        self.dataset().map(|ds| self.filters.apply(ds))
    }

    pub fn stats(&self) -> Option<FilterStats> {
        self.view().map(|v| v.stats())
    }
}

// ---------------------------------------------------------------------------
// Session store
// ---------------------------------------------------------------------------

/// Independent sessions keyed by an opaque session key.
#[derive(Debug, Default)]
pub struct SessionStore {
    sessions: HashMap<String, Session>,
}

impl SessionStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn get_or_create(&mut self, key: &str) -> &mut Session {
        self.sessions.entry(key.to_string()).or_default()
    }

    pub fn get(&self, key: &str) -> Option<&Session> {
        self.sessions.get(key)
    }

    pub fn remove(&mut self, key: &str) -> Option<Session> {
        self.sessions.remove(key)
    }

    pub fn len(&self) -> usize {
        self.sessions.len()
    }

    pub fn is_empty(&self) -> bool {
        self.sessions.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::data::model::{Record, DEFAULT_CATEGORY_THRESHOLD};

    fn dataset() -> Dataset {
        Dataset::from_records(
            vec![
                Record::new().with("Comunidade", "Centro"),
                Record::new().with("Comunidade", "Vila Aliança"),
            ],
            DEFAULT_CATEGORY_THRESHOLD,
        )
    }

    #[test]
    fn filters_are_replaced_wholesale() {
        let mut session = Session::new();
        assert!(session.view().is_none());
        session.set_dataset(dataset());
        assert_eq!(session.stats().map(|s| s.matched), Some(2));

        let filters = FilterSet::builder(session.dataset().unwrap())
            .membership("Comunidade", ["vila alianca"])
            .unwrap()
            .build();
        session.replace_filters(filters);
        assert_eq!(session.stats().map(|s| s.matched), Some(1));

        session.clear_filters();
        assert_eq!(session.stats().map(|s| s.ratio), Some(1.0));
    }

    #[test]
    fn failed_load_is_recorded() {
        let mut session = Session::new();
        session.set_dataset(dataset());
        session.load(Path::new("/nonexistent/escuta.csv"), &Config::default());
        assert!(session.dataset().is_none());
        assert!(session.error().is_some_and(|e| e.contains("escuta.csv")));
        assert!(session.filters().is_empty());
    }

    #[test]
    fn sessions_are_independent() {
        let mut store = SessionStore::new();
        store.get_or_create("a").set_dataset(dataset());
        store.get_or_create("b");
        assert_eq!(store.len(), 2);
        assert!(store.get("a").and_then(|s| s.dataset()).is_some());
        assert!(store.get("b").and_then(|s| s.dataset()).is_none());
        assert!(store.remove("a").is_some());
        assert_eq!(store.len(), 1);
    }
}
