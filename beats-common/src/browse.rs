use crate::catalog::CatalogItem;
use crate::filter::{FilterState, SortKey};

/// View-model over an in-memory catalog: raw items plus filter/sort state,
/// a cursor into the visible subsequence for swipe navigation, and the
/// single "currently previewing" flag.
///
/// Pure state, no I/O. The raw list is never mutated except for the
/// previewing flag, which this view owns exclusively. The cursor is always
/// either a valid index into the visible list or absent when the list is
/// empty.
#[derive(Debug, Default)]
pub struct CatalogView {
    items: Vec<CatalogItem>,
    filter: FilterState,
    cursor: usize,
}

impl CatalogView {
    pub fn new() -> Self {
        Self::default()
    }

    /// Replace the raw item list, e.g. after a catalog fetch.
    pub fn set_items(&mut self, items: Vec<CatalogItem>) {
        self.items = items;
        self.clamp_cursor();
    }

    pub fn items(&self) -> &[CatalogItem] {
        &self.items
    }

    pub fn filter(&self) -> &FilterState {
        &self.filter
    }

    /// The filtered, sorted subsequence in display order.
    pub fn visible(&self) -> Vec<CatalogItem> {
        self.filter.apply(&self.items)
    }

    pub fn visible_len(&self) -> usize {
        self.items.iter().filter(|i| self.filter.matches(i)).count()
    }

    // -- Filter mutation. Every mutation re-clamps the cursor. --

    pub fn set_search(&mut self, term: impl Into<String>) {
        self.filter.search = term.into();
        self.clamp_cursor();
    }

    pub fn set_genre(&mut self, genre: impl Into<String>) {
        self.filter.genre = genre.into();
        self.clamp_cursor();
    }

    /// Set the inclusive price range. A reversed pair is swapped so the
    /// low <= high invariant always holds.
    pub fn set_price_range(&mut self, low: f64, high: f64) {
        self.filter.price_range = if low <= high { (low, high) } else { (high, low) };
        self.clamp_cursor();
    }

    /// Set the inclusive secondary-attribute range (BPM / sound count).
    pub fn set_tempo_range(&mut self, low: f64, high: f64) {
        self.filter.tempo_range = if low <= high { (low, high) } else { (high, low) };
        self.clamp_cursor();
    }

    pub fn set_sort(&mut self, sort: SortKey) {
        self.filter.sort = sort;
        self.clamp_cursor();
    }

    pub fn clear_filters(&mut self) {
        self.filter.clear();
        self.clamp_cursor();
    }

    // -- Cursor --

    /// Current cursor position, or None when nothing is visible.
    pub fn cursor(&self) -> Option<usize> {
        if self.visible_len() == 0 {
            None
        } else {
            Some(self.cursor)
        }
    }

    /// The item under the cursor.
    pub fn current(&self) -> Option<CatalogItem> {
        let idx = self.cursor()?;
        self.visible().into_iter().nth(idx)
    }

    /// Step forward one position, wrapping to 0 past the end. No-op on an
    /// empty view.
    pub fn advance(&mut self) {
        let len = self.visible_len();
        if len == 0 {
            return;
        }
        self.cursor = if self.cursor + 1 >= len {
            0
        } else {
            self.cursor + 1
        };
    }

    /// Reset the cursor to 0 if it no longer indexes the visible list.
    fn clamp_cursor(&mut self) {
        if self.cursor >= self.visible_len() {
            self.cursor = 0;
        }
    }

    // -- Preview flag (at most one item previewing at any instant) --

    /// Mark `item_id` as previewing, clearing any other item's flag first.
    /// Returns false when the id is not in the raw list.
    pub fn start_preview(&mut self, item_id: &str) -> bool {
        let mut found = false;
        for item in &mut self.items {
            item.previewing = item.id == item_id;
            found |= item.previewing;
        }
        found
    }

    /// Clear the previewing flag. Returns the id that was previewing.
    pub fn stop_preview(&mut self) -> Option<String> {
        let mut stopped = None;
        for item in &mut self.items {
            if item.previewing {
                item.previewing = false;
                stopped = Some(item.id.clone());
            }
        }
        stopped
    }

    /// The id currently previewing, if any.
    pub fn previewing(&self) -> Option<&str> {
        self.items
            .iter()
            .find(|i| i.previewing)
            .map(|i| i.id.as_str())
    }
}
