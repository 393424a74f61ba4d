use std::fmt;

use super::model::{Dataset, Record};

// ---------------------------------------------------------------------------
// FilteredView – records passing the active filters
// ---------------------------------------------------------------------------

/// The records of a dataset that satisfy a filter set, in dataset order.
#[derive(Debug, Clone)]
pub struct FilteredView<'a> {
    dataset: &'a Dataset,
    indices: Vec<usize>,
}

impl<'a> FilteredView<'a> {
    pub(crate) fn new(dataset: &'a Dataset, indices: Vec<usize>) -> Self {
        FilteredView { dataset, indices }
    }

    /// View over every record.
    pub fn all(dataset: &'a Dataset) -> Self {
        Self::new(dataset, (0..dataset.len()).collect())
    }

    pub fn dataset(&self) -> &'a Dataset {
        self.dataset
    }

    /// Positions of the matching records in the dataset.
    pub fn indices(&self) -> &[usize] {
        &self.indices
    }

    pub fn len(&self) -> usize {
        self.indices.len()
    }

    pub fn is_empty(&self) -> bool {
        self.indices.is_empty()
    }

    pub fn records(&self) -> impl Iterator<Item = &'a Record> + '_ {
        self.indices.iter().map(move |&i| &self.dataset.records()[i])
    }

    pub fn stats(&self) -> FilterStats {
        FilterStats::new(self.dataset.len(), self.len())
    }

    /// Slice the view into pages of `page_size` records; `number` is 1-based
    /// and clamped into the valid range.
    pub fn page(&self, number: usize, page_size: usize) -> Page {
        let page_size = page_size.max(1);
        let total_pages = self.len().div_ceil(page_size).max(1);
        let number = number.clamp(1, total_pages);
        let start = ((number - 1) * page_size).min(self.len());
        let end = (start + page_size).min(self.len());
        Page {
            number,
            total_pages,
            start,
            end,
            total: self.len(),
        }
    }

    /// Records on `page`. A page cut from a longer view yields only the
    /// records this view has in that range.
    pub fn page_records(&self, page: &Page) -> impl Iterator<Item = &'a Record> + '_ {
        let start = page.start.min(self.len());
        let end = page.end.clamp(start, self.len());
        self.indices[start..end]
            .iter()
            .map(move |&i| &self.dataset.records()[i])
    }
}

// ---------------------------------------------------------------------------
// FilterStats
// ---------------------------------------------------------------------------

/// How much of the dataset survives the active filters.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct FilterStats {
    pub total: usize,
    pub matched: usize,
    /// `matched / total`, `0.0` for an empty dataset.
    pub ratio: f64,
}

impl FilterStats {
    pub fn new(total: usize, matched: usize) -> Self {
        let ratio = if total == 0 {
            0.0
        } else {
            matched as f64 / total as f64
        };
        FilterStats { total, matched, ratio }
    }

    pub fn percentage(&self) -> f64 {
        self.ratio * 100.0
    }
}

impl fmt::Display for FilterStats {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{} of {} records ({:.1}%)",
            self.matched,
            self.total,
            self.percentage()
        )
    }
}

// ---------------------------------------------------------------------------
// Page
// ---------------------------------------------------------------------------

/// One page of a filtered view: records `start..end` of the view.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Page {
    pub number: usize,
    pub total_pages: usize,
    pub start: usize,
    pub end: usize,
    pub total: usize,
}

impl Page {
    pub fn caption(&self) -> String {
        if self.total == 0 {
            return "No records".to_string();
        }
        format!("Showing records {} to {} of {}", self.start + 1, self.end, self.total)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::data::model::DEFAULT_CATEGORY_THRESHOLD;

    fn numbered(n: i64) -> Dataset {
        Dataset::from_records(
            (0..n).map(|i| Record::new().with("n", i)).collect(),
            DEFAULT_CATEGORY_THRESHOLD,
        )
    }

    #[test]
    fn stats_ratio() {
        assert_eq!(FilterStats::new(0, 0).ratio, 0.0);
        assert_eq!(FilterStats::new(4, 1).ratio, 0.25);
        assert_eq!(FilterStats::new(8, 3).to_string(), "3 of 8 records (37.5%)");
    }

    #[test]
    fn full_view_has_ratio_one() {
        let ds = numbered(7);
        let view = FilteredView::all(&ds);
        assert_eq!(view.len(), 7);
        assert_eq!(view.stats().ratio, 1.0);
    }

    #[test]
    fn paging_clamps_and_slices() {
        let ds = numbered(45);
        let view = FilteredView::all(&ds);
        let page = view.page(3, 20);
        assert_eq!((page.number, page.total_pages, page.start, page.end), (3, 3, 40, 45));
        assert_eq!(page.caption(), "Showing records 41 to 45 of 45");
        assert_eq!(view.page_records(&page).count(), 5);

        assert_eq!(view.page(0, 20).number, 1);
        assert_eq!(view.page(99, 20).number, 3);
    }

    #[test]
    fn empty_view_has_one_page() {
        let ds = numbered(0);
        let view = FilteredView::all(&ds);
        let page = view.page(5, 20);
        assert_eq!((page.number, page.total_pages, page.start, page.end), (1, 1, 0, 0));
        assert_eq!(page.caption(), "No records");
        assert_eq!(view.page_records(&page).count(), 0);
    }

    #[test]
    fn page_from_a_longer_view_is_clamped() {
        let big = numbered(50);
        let small = numbered(4);
        let page = FilteredView::all(&big).page(2, 20);
        let view = FilteredView::all(&small);
        assert_eq!(view.page_records(&page).count(), 0);

        let first = FilteredView::all(&big).page(1, 20);
        let shown: Vec<_> = view.page_records(&first).filter_map(|r| r.get("n")).collect();
        assert_eq!(shown.len(), 4);

        let backwards = Page { start: 3, end: 1, ..first };
        assert_eq!(view.page_records(&backwards).count(), 0);
    }
}
