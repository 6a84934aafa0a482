use std::cmp::Ordering;

use crate::catalog::CatalogItem;

/// Genre sentinel meaning "no genre filter".
pub const ALL_GENRES: &str = "All";

/// Default price range in USD, matching the store's slider bounds.
pub const DEFAULT_PRICE_RANGE: (f64, f64) = (0.0, 500.0);

/// Default range for the secondary attribute (BPM for beats).
pub const DEFAULT_TEMPO_RANGE: (f64, f64) = (60.0, 180.0);

/// Genres offered as filter choices, [`ALL_GENRES`] first. The genre
/// filter itself is an open string match, so items outside this list
/// still filter correctly.
pub const GENRE_CHOICES: &[&str] = &[
    ALL_GENRES,
    "Afrobeat",
    "Hip Hop",
    "Dancehall",
    "Electronic",
    "R&B",
    "Trap",
    "Pop",
    "Drill",
];

/// Sort order for the catalog view.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum SortKey {
    /// Server order, untouched.
    #[default]
    Featured,
    Newest,
    Popular,
    PriceLowToHigh,
    PriceHighToLow,
    Tempo,
}

impl SortKey {
    /// Parse a UI/wire sort name. Unknown names fall back to `Featured`
    /// (identity order) rather than failing.
    pub fn parse(s: &str) -> Self {
        match s {
            "newest" => SortKey::Newest,
            "popular" => SortKey::Popular,
            "price-low" => SortKey::PriceLowToHigh,
            "price-high" => SortKey::PriceHighToLow,
            "bpm" => SortKey::Tempo,
            _ => SortKey::Featured,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            SortKey::Featured => "featured",
            SortKey::Newest => "newest",
            SortKey::Popular => "popular",
            SortKey::PriceLowToHigh => "price-low",
            SortKey::PriceHighToLow => "price-high",
            SortKey::Tempo => "bpm",
        }
    }
}

/// Mutable filter/sort state for a catalog view.
///
/// Created with defaults on mount, mutated by user input, reset on clear.
/// Never persisted across sessions.
#[derive(Debug, Clone, PartialEq)]
pub struct FilterState {
    pub search: String,
    /// Selected genre, or [`ALL_GENRES`].
    pub genre: String,
    /// Inclusive [low, high], low <= high.
    pub price_range: (f64, f64),
    /// Inclusive [low, high] over the secondary attribute, low <= high.
    pub tempo_range: (f64, f64),
    pub sort: SortKey,
}

impl Default for FilterState {
    fn default() -> Self {
        Self {
            search: String::new(),
            genre: ALL_GENRES.to_string(),
            price_range: DEFAULT_PRICE_RANGE,
            tempo_range: DEFAULT_TEMPO_RANGE,
            sort: SortKey::Featured,
        }
    }
}

impl FilterState {
    /// Reset every field to its default.
    pub fn clear(&mut self) {
        *self = Self::default();
    }

    /// Whether `item` passes all four predicates: text search, genre,
    /// price range, and secondary-attribute range.
    pub fn matches(&self, item: &CatalogItem) -> bool {
        self.matches_search(item)
            && self.matches_genre(item)
            && self.matches_price(item)
            && self.matches_tempo(item)
    }

    /// Case-insensitive substring match against title, genre, producer name
    /// and musical key. An empty search term matches everything. A missing
    /// producer or key fails only the branch it would have contributed to.
    fn matches_search(&self, item: &CatalogItem) -> bool {
        if self.search.is_empty() {
            return true;
        }
        let needle = self.search.to_lowercase();
        item.title.to_lowercase().contains(&needle)
            || item.genre.to_lowercase().contains(&needle)
            || item
                .producer
                .as_ref()
                .is_some_and(|p| p.name.to_lowercase().contains(&needle))
            || item
                .musical_key
                .as_ref()
                .is_some_and(|k| k.to_lowercase().contains(&needle))
    }

    fn matches_genre(&self, item: &CatalogItem) -> bool {
        self.genre == ALL_GENRES || item.genre == self.genre
    }

    fn matches_price(&self, item: &CatalogItem) -> bool {
        item.price >= self.price_range.0 && item.price <= self.price_range.1
    }

    /// An item with no secondary attribute fails the range check.
    fn matches_tempo(&self, item: &CatalogItem) -> bool {
        match item.range_attr() {
            Some(v) => v >= self.tempo_range.0 && v <= self.tempo_range.1,
            None => false,
        }
    }

    /// Filter and sort `items` into the display order. Filtering preserves
    /// the incoming relative order; the sort is stable.
    pub fn apply(&self, items: &[CatalogItem]) -> Vec<CatalogItem> {
        let mut out: Vec<CatalogItem> = items.iter().filter(|i| self.matches(i)).cloned().collect();
        sort_items(&mut out, self.sort);
        out
    }
}

/// Stable sort by `key`. `Featured` leaves the incoming order untouched;
/// items with equal keys keep their relative order.
pub fn sort_items(items: &mut [CatalogItem], key: SortKey) {
    match key {
        SortKey::Featured => {}
        SortKey::PriceLowToHigh => items.sort_by(|a, b| total_cmp(a.price, b.price)),
        SortKey::PriceHighToLow => items.sort_by(|a, b| total_cmp(b.price, a.price)),
        SortKey::Tempo => items.sort_by(|a, b| {
            // Items without a tempo sort to the end.
            total_cmp(
                a.range_attr().unwrap_or(f64::MAX),
                b.range_attr().unwrap_or(f64::MAX),
            )
        }),
        SortKey::Newest => items.sort_by(|a, b| b.created_at.cmp(&a.created_at)),
        SortKey::Popular => items.sort_by(|a, b| b.popularity.cmp(&a.popularity)),
    }
}

fn total_cmp(a: f64, b: f64) -> Ordering {
    a.partial_cmp(&b).unwrap_or(Ordering::Equal)
}
