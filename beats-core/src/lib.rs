pub mod auth;
pub mod client;
pub mod config;
pub mod discounts;
pub mod error;
pub mod loader;
pub mod preview;
pub mod purchase;
pub mod wishlist;

pub use client::StoreClient;
pub use config::StoreConfig;
pub use error::StoreError;
pub use wishlist::WishlistSync;
