pub mod catalog;
pub mod seen;
pub mod selection;
pub mod watchlist;

pub use catalog::{CatalogProvider, TmdbCatalog};
pub use seen::SeenSet;
pub use selection::{DiscoverySession, GenerationError, SelectionEngine};
pub use watchlist::{AccountWatchlists, WatchlistBackend, WatchlistStore};
