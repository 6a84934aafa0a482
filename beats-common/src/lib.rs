pub mod browse;
pub mod catalog;
pub mod filter;

pub use browse::CatalogView;
pub use catalog::{CatalogItem, ItemKind, Producer};
pub use filter::{FilterState, SortKey};
